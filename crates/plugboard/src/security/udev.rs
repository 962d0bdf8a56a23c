//! udev rules rendering.

use bytes::Bytes;
use plugboard_common::SnapName;

/// udev rules file for one snap.
///
/// Device rules come only from slot declarations; they never depend on
/// which plugs are connected.
#[derive(Debug, Clone)]
pub struct UdevRules {
    /// Snap the rules belong to.
    pub snap: SnapName,
    /// Composed rules.
    pub body: Bytes,
}

impl UdevRules {
    /// Wrap composed rules.
    #[must_use]
    pub const fn new(snap: SnapName, body: Bytes) -> Self {
        Self { snap, body }
    }

    /// Render the rules file.
    #[must_use]
    pub fn render(&self) -> Vec<u8> {
        let mut out = format!("# udev rules for snap {}\n", self.snap).into_bytes();
        out.extend_from_slice(&self.body);
        if !self.body.ends_with(b"\n") {
            out.push(b'\n');
        }
        out
    }
}
