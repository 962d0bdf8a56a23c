//! Fragment templates with a single peer-label insertion point.

use bytes::{BufMut, BytesMut};

use super::{Fragment, LabelExpr};

/// Policy text with exactly one place where the peer's label goes.
///
/// The text is split at the insertion point when the template is written,
/// so rendering never searches the policy text for a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerTemplate {
    head: &'static str,
    tail: &'static str,
}

impl PeerTemplate {
    /// Create a template; the label is inserted between `head` and `tail`.
    #[must_use]
    pub const fn new(head: &'static str, tail: &'static str) -> Self {
        Self { head, tail }
    }

    /// Render the template for one peer.
    #[must_use]
    pub fn render(&self, peer: &LabelExpr) -> Fragment {
        let mut buf =
            BytesMut::with_capacity(self.head.len() + peer.as_bytes().len() + self.tail.len());
        buf.put_slice(self.head.as_bytes());
        buf.put_slice(peer.as_bytes());
        buf.put_slice(self.tail.as_bytes());
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEER: PeerTemplate = PeerTemplate::new("dbus (send)\n    peer=(label=", "),\n");

    #[test]
    fn render_inserts_label_once() {
        let fragment = PEER.render(&LabelExpr::unconfined());
        assert_eq!(&fragment[..], b"dbus (send)\n    peer=(label=unconfined),\n");
    }

    #[test]
    fn placeholder_lookalikes_are_left_alone() {
        const TEXT: PeerTemplate = PeerTemplate::new("# @PEER@ ", "\n");
        let fragment = TEXT.render(&LabelExpr::unconfined());
        assert_eq!(&fragment[..], b"# @PEER@ unconfined\n");
    }
}
