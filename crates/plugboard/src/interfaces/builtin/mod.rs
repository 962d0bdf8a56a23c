//! Builtin capability interfaces.

mod ofono;

use std::sync::Arc;

use super::Interface;

pub use ofono::OfonoInterface;

/// Every builtin interface, in registration order.
#[must_use]
pub fn interfaces() -> Vec<Arc<dyn Interface>> {
    vec![Arc::new(OfonoInterface)]
}
