//! Label expressions.
//!
//! A label expression names one or more confinement domains of a snap in
//! AppArmor glob syntax, for use as a peer predicate in another snap's
//! policy:
//! - `"snap.ofono.ofonod"` for a single app
//! - `"snap.ofono.hook.configure"` for a single hook
//! - `"snap.ofono.*"` when every domain of the snap is bound
//! - `"snap.ofono.{cli,ofonod}"` for any other subset

use std::fmt;

use super::{Endpoint, Plug, Slot};

/// Label of processes running outside any snap.
const UNCONFINED: &str = "unconfined";

/// Textual peer predicate resolved by the security backend at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelExpr(String);

impl LabelExpr {
    /// Label matching unconfined system services.
    #[must_use]
    pub fn unconfined() -> Self {
        Self(UNCONFINED.to_string())
    }

    /// Get the expression as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the expression as bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for LabelExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Label of the domains bound to an endpoint.
///
/// Depends only on the snap's domains and the endpoint binding, so repeated
/// calls produce identical output.
#[must_use]
pub fn label_expr<E: Endpoint>(endpoint: &E) -> LabelExpr {
    let snap = endpoint.snap();
    let total = snap.apps.len() + snap.hooks.len();
    let mut names: Vec<String> = endpoint
        .bound()
        .iter()
        .filter(|d| snap.has_domain(d))
        .map(plugboard_common::Domain::tag_suffix)
        .collect();
    names.sort_unstable();

    let tail = if names.len() == 1 {
        names.remove(0)
    } else if names.len() == total {
        "*".to_string()
    } else {
        format!("{{{}}}", names.join(","))
    };
    LabelExpr(format!("\"snap.{}.{tail}\"", snap.name))
}

/// Label of the consumer domains using a plug.
#[must_use]
pub fn plug_label_expr(plug: &Plug) -> LabelExpr {
    label_expr(plug)
}

/// Label of the provider domains behind a slot.
#[must_use]
pub fn slot_label_expr(slot: &Slot) -> LabelExpr {
    label_expr(slot)
}
