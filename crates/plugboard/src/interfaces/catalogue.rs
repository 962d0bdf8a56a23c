//! Interface catalogue.

use std::collections::BTreeMap;
use std::sync::Arc;

use plugboard_common::{InterfaceName, PlugboardError, PlugboardResult};

use super::{Endpoint, Interface, Plug, Slot, builtin};

/// Registry of capability interfaces, keyed by their unique name.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    interfaces: BTreeMap<String, Arc<dyn Interface>>,
}

impl Catalogue {
    /// Create an empty catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalogue holding every builtin interface.
    ///
    /// # Errors
    ///
    /// Returns an error if two builtin interfaces share a name.
    pub fn builtin() -> PlugboardResult<Self> {
        let mut catalogue = Self::new();
        for iface in builtin::interfaces() {
            catalogue.register(iface)?;
        }
        Ok(catalogue)
    }

    /// Register an interface.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or already registered.
    pub fn register(&mut self, iface: Arc<dyn Interface>) -> PlugboardResult<()> {
        let name = InterfaceName::new(iface.name())?;
        if self.interfaces.contains_key(name.as_str()) {
            return Err(PlugboardError::DuplicateInterface {
                name: name.to_string(),
            });
        }
        tracing::debug!(interface = %name, "Registered interface");
        self.interfaces.insert(name.into(), iface);
        Ok(())
    }

    /// Look up an interface by exact name.
    ///
    /// # Errors
    ///
    /// Returns [`PlugboardError::UnknownInterface`] if it is not registered.
    pub fn get(&self, name: &str) -> PlugboardResult<&Arc<dyn Interface>> {
        self.interfaces
            .get(name)
            .ok_or_else(|| PlugboardError::UnknownInterface {
                name: name.to_string(),
            })
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.interfaces.keys().map(String::as_str)
    }

    /// Number of registered interfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    /// Whether the catalogue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// Validate a freshly declared plug.
    ///
    /// # Errors
    ///
    /// Returns an error if the interface is unknown or rejects the plug.
    pub fn sanitize_plug(&self, plug: &mut Plug) -> PlugboardResult<()> {
        let iface = self.get(plug.interface.as_str())?;
        ensure_bound(plug)?;
        iface.sanitize_plug(plug).map_err(|e| as_validation(plug, e))
    }

    /// Validate a freshly declared slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the interface is unknown or rejects the slot.
    pub fn sanitize_slot(&self, slot: &mut Slot) -> PlugboardResult<()> {
        let iface = self.get(slot.interface.as_str())?;
        ensure_bound(slot)?;
        iface.sanitize_slot(slot).map_err(|e| as_validation(slot, e))
    }

    /// Slots the plug may be connected to without administrator action.
    ///
    /// Only slots of another snap speaking the same interface are candidates.
    ///
    /// # Errors
    ///
    /// Returns an error if the plug's interface is unknown.
    pub fn auto_connect_candidates<'s>(
        &self,
        plug: &Plug,
        slots: &'s [Slot],
    ) -> PlugboardResult<Vec<&'s Slot>> {
        let iface = self.get(plug.interface.as_str())?;
        Ok(slots
            .iter()
            .filter(|slot| slot.interface == plug.interface)
            .filter(|slot| slot.snap.name != plug.snap.name)
            .filter(|slot| iface.auto_connect(plug, slot))
            .collect())
    }
}

/// An endpoint must be usable by at least one domain of a snap that has any.
fn ensure_bound<E: Endpoint>(endpoint: &E) -> PlugboardResult<()> {
    let snap = endpoint.snap();
    let has_domains = !snap.apps.is_empty() || !snap.hooks.is_empty();
    if has_domains && endpoint.bound().is_empty() {
        return Err(PlugboardError::validation(
            snap.name.as_str(),
            endpoint.describe(),
            "not bound to any app or hook",
        ));
    }
    if let Some(stray) = endpoint.bound().iter().find(|d| !snap.has_domain(d)) {
        return Err(PlugboardError::validation(
            snap.name.as_str(),
            endpoint.describe(),
            format!("bound to unknown app or hook {stray}"),
        ));
    }
    Ok(())
}

/// Sanitizers may report any error; callers always see a validation error.
fn as_validation<E: Endpoint>(endpoint: &E, err: PlugboardError) -> PlugboardError {
    match err {
        PlugboardError::Validation { .. } => err,
        other => PlugboardError::validation(
            endpoint.snap().name.as_str(),
            endpoint.describe(),
            other.to_string(),
        ),
    }
}
