//! Capability interfaces.
//!
//! A snap declares plugs (capabilities it consumes) and slots (capabilities it
//! provides). Each capability kind is described once by an [`Interface`]
//! implementation which knows what every security backend must allow:
//! - permanently, for any snap declaring a plug or slot of that kind
//! - per connection, parameterized on the label of the peer snap
//! - on classic hosts, towards services running unconfined

pub mod builtin;
mod catalogue;
mod label;
mod template;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use plugboard_common::{
    AppName, Domain, HookName, InterfaceName, PlugboardError, PlugboardResult, SecurityTag,
    SnapName,
};

use crate::security::{BusNameOwnership, SecurityBackend};

pub use catalogue::Catalogue;
pub use label::{LabelExpr, label_expr, plug_label_expr, slot_label_expr};
pub use template::PeerTemplate;

/// Backend-native policy text contributed by one interface.
pub type Fragment = Bytes;

/// Kind-specific endpoint attributes.
pub type Attrs = BTreeMap<String, serde_json::Value>;

/// A snap and the confinement domains (apps and hooks) it is made of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapInfo {
    /// Snap name.
    pub name: SnapName,
    /// Applications.
    pub apps: BTreeSet<AppName>,
    /// Hooks.
    pub hooks: BTreeSet<HookName>,
}

impl SnapInfo {
    /// Create a snap with no apps or hooks.
    #[must_use]
    pub const fn new(name: SnapName) -> Self {
        Self {
            name,
            apps: BTreeSet::new(),
            hooks: BTreeSet::new(),
        }
    }

    /// Add an application.
    #[must_use]
    pub fn with_app(mut self, app: AppName) -> Self {
        self.apps.insert(app);
        self
    }

    /// Add a hook.
    #[must_use]
    pub fn with_hook(mut self, hook: HookName) -> Self {
        self.hooks.insert(hook);
        self
    }

    /// All domains, apps first.
    pub fn domains(&self) -> impl Iterator<Item = Domain> + '_ {
        self.apps
            .iter()
            .cloned()
            .map(Domain::App)
            .chain(self.hooks.iter().cloned().map(Domain::Hook))
    }

    /// Whether the snap has the given domain.
    #[must_use]
    pub fn has_domain(&self, domain: &Domain) -> bool {
        match domain {
            Domain::App(app) => self.apps.contains(app),
            Domain::Hook(hook) => self.hooks.contains(hook),
        }
    }

    /// Security tag of one domain of this snap.
    #[must_use]
    pub fn security_tag(&self, domain: &Domain) -> SecurityTag {
        SecurityTag::new(&self.name, domain)
    }
}

/// Shared behaviour of plugs and slots.
pub trait Endpoint {
    /// `"plug"` or `"slot"`.
    const KIND: &'static str;

    /// Snap declaring the endpoint.
    fn snap(&self) -> &SnapInfo;
    /// Endpoint name, unique within the snap and kind.
    fn name(&self) -> &InterfaceName;
    /// Interface the endpoint speaks.
    fn interface(&self) -> &InterfaceName;
    /// Domains entitled to use the endpoint.
    fn bound(&self) -> &BTreeSet<Domain>;

    /// Human readable reference, e.g. `plug "modem"`.
    fn describe(&self) -> String {
        format!("{} {:?}", Self::KIND, self.name().as_str())
    }
}

macro_rules! endpoint {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            /// Snap declaring the endpoint.
            pub snap: Arc<SnapInfo>,
            /// Endpoint name.
            pub name: InterfaceName,
            /// Interface the endpoint speaks.
            pub interface: InterfaceName,
            /// Kind-specific attributes, normalized by sanitization.
            pub attrs: Attrs,
            /// Domains entitled to use the endpoint.
            pub bound: BTreeSet<Domain>,
        }

        impl $name {
            /// Create an endpoint bound to every app and hook of its snap.
            #[must_use]
            pub fn new(snap: Arc<SnapInfo>, name: InterfaceName, interface: InterfaceName) -> Self {
                let bound = snap.domains().collect();
                Self {
                    snap,
                    name,
                    interface,
                    attrs: Attrs::new(),
                    bound,
                }
            }

            /// Restrict the endpoint to the given domains.
            #[must_use]
            pub fn bind(mut self, domains: impl IntoIterator<Item = Domain>) -> Self {
                self.bound = domains.into_iter().collect();
                self
            }

            /// Set an attribute.
            #[must_use]
            pub fn with_attr(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
                self.attrs.insert(key.into(), value);
                self
            }

            /// Whether the given domain may use the endpoint.
            #[must_use]
            pub fn is_bound_to(&self, domain: &Domain) -> bool {
                self.bound.contains(domain)
            }
        }

        impl Endpoint for $name {
            const KIND: &'static str = $kind;

            fn snap(&self) -> &SnapInfo {
                &self.snap
            }

            fn name(&self) -> &InterfaceName {
                &self.name
            }

            fn interface(&self) -> &InterfaceName {
                &self.interface
            }

            fn bound(&self) -> &BTreeSet<Domain> {
                &self.bound
            }
        }
    };
}

endpoint!(
    /// Consumer side of a capability.
    Plug,
    "plug"
);

endpoint!(
    /// Provider side of a capability. One slot may serve many plugs.
    Slot,
    "slot"
);

/// A snap together with its plugs and slots, in declaration order.
#[derive(Debug, Clone)]
pub struct SnapDeclaration {
    /// The snap.
    pub info: Arc<SnapInfo>,
    /// Declared plugs.
    pub plugs: Vec<Plug>,
    /// Declared slots.
    pub slots: Vec<Slot>,
}

impl SnapDeclaration {
    /// Create a declaration with no endpoints.
    #[must_use]
    pub const fn new(info: Arc<SnapInfo>) -> Self {
        Self {
            info,
            plugs: Vec::new(),
            slots: Vec::new(),
        }
    }

    /// Snap name.
    #[must_use]
    pub fn name(&self) -> &SnapName {
        &self.info.name
    }

    /// Declare a plug of the given interface.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a valid interface name.
    pub fn add_plug(&mut self, name: &str, interface: &str) -> PlugboardResult<&mut Plug> {
        let plug = Plug::new(
            Arc::clone(&self.info),
            InterfaceName::new(name)?,
            InterfaceName::new(interface)?,
        );
        self.plugs.push(plug);
        let last = self.plugs.len() - 1;
        Ok(&mut self.plugs[last])
    }

    /// Declare a slot of the given interface.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a valid interface name.
    pub fn add_slot(&mut self, name: &str, interface: &str) -> PlugboardResult<&mut Slot> {
        let slot = Slot::new(
            Arc::clone(&self.info),
            InterfaceName::new(name)?,
            InterfaceName::new(interface)?,
        );
        self.slots.push(slot);
        let last = self.slots.len() - 1;
        Ok(&mut self.slots[last])
    }

    /// Find a plug by name.
    #[must_use]
    pub fn plug(&self, name: &str) -> Option<&Plug> {
        self.plugs.iter().find(|p| p.name.as_str() == name)
    }

    /// Find a slot by name.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.name.as_str() == name)
    }
}

/// A live grant pairing one plug with one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    /// Consumer side.
    pub plug: Plug,
    /// Provider side.
    pub slot: Slot,
}

impl Connection {
    /// Pair a plug with a slot.
    #[must_use]
    pub const fn new(plug: Plug, slot: Slot) -> Self {
        Self { plug, slot }
    }

    /// Whether either side belongs to the given snap.
    #[must_use]
    pub fn touches(&self, snap: &SnapName) -> bool {
        &self.plug.snap.name == snap || &self.slot.snap.name == snap
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {}:{}",
            self.plug.snap.name, self.plug.name, self.slot.snap.name, self.slot.name
        )
    }
}

/// The contract implemented once per capability kind.
///
/// Fragment methods return `Ok(None)` when the kind contributes nothing to a
/// backend. Implementations must be pure: the same inputs always produce the
/// same bytes.
pub trait Interface: Send + Sync + fmt::Debug {
    /// Unique catalogue key.
    fn name(&self) -> &'static str;

    /// Validate and normalize a plug when it is declared.
    ///
    /// # Errors
    ///
    /// Returns [`PlugboardError::Validation`] naming the offending attribute.
    fn sanitize_plug(&self, plug: &mut Plug) -> PlugboardResult<()> {
        ensure_interface(self.name(), plug)
    }

    /// Validate and normalize a slot when it is declared.
    ///
    /// # Errors
    ///
    /// Returns [`PlugboardError::Validation`] naming the offending attribute.
    fn sanitize_slot(&self, slot: &mut Slot) -> PlugboardResult<()> {
        ensure_interface(self.name(), slot)
    }

    /// Access a consumer needs regardless of connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the fragment cannot be generated.
    fn permanent_plug_fragment(
        &self,
        _plug: &Plug,
        _backend: SecurityBackend,
    ) -> PlugboardResult<Option<Fragment>> {
        Ok(None)
    }

    /// Access a provider needs regardless of connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the fragment cannot be generated.
    fn permanent_slot_fragment(
        &self,
        _slot: &Slot,
        _backend: SecurityBackend,
    ) -> PlugboardResult<Option<Fragment>> {
        Ok(None)
    }

    /// Access a consumer needs because of this connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the fragment cannot be generated.
    fn connected_plug_fragment(
        &self,
        _plug: &Plug,
        _slot: &Slot,
        _backend: SecurityBackend,
    ) -> PlugboardResult<Option<Fragment>> {
        Ok(None)
    }

    /// Access a provider needs because of this connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the fragment cannot be generated.
    fn connected_slot_fragment(
        &self,
        _plug: &Plug,
        _slot: &Slot,
        _backend: SecurityBackend,
    ) -> PlugboardResult<Option<Fragment>> {
        Ok(None)
    }

    /// Extra consumer access appended on classic hosts, where the provider
    /// may run unconfined. `None` for kinds whose provider is always a snap.
    fn classic_plug_fragment(
        &self,
        _plug: &Plug,
        _slot: &Slot,
        _backend: SecurityBackend,
    ) -> Option<Fragment> {
        None
    }

    /// Well-known bus name owned by the snap providing the slot.
    ///
    /// Declaring one makes the D-Bus backend emit the ownership wrapper
    /// (allow for the owner, deny for everybody else) whether or not the
    /// slot is connected.
    fn bus_name_ownership(&self, _slot: &Slot) -> Option<BusNameOwnership> {
        None
    }

    /// Whether the pair may be connected without administrator action.
    fn auto_connect(&self, _plug: &Plug, _slot: &Slot) -> bool {
        true
    }
}

/// Reject endpoints handed to the wrong interface.
fn ensure_interface<E: Endpoint>(name: &str, endpoint: &E) -> PlugboardResult<()> {
    if endpoint.interface().as_str() == name {
        return Ok(());
    }
    Err(PlugboardError::validation(
        endpoint.snap().name.as_str(),
        endpoint.describe(),
        format!(
            "interface is {:?}, not {name:?}",
            endpoint.interface().as_str()
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(name: &str, apps: &[&str]) -> Arc<SnapInfo> {
        let mut info = SnapInfo::new(SnapName::new(name).unwrap());
        for app in apps {
            info = info.with_app(AppName::new(*app).unwrap());
        }
        Arc::new(info.with_hook(HookName::new("configure").unwrap()))
    }

    #[test]
    fn endpoints_bind_to_every_domain_by_default() {
        let mut decl = SnapDeclaration::new(snap("dialer", &["dialer", "helper"]));
        let plug = decl.add_plug("modem", "ofono").unwrap().clone();
        assert_eq!(plug.bound.len(), 3);
        assert!(plug.is_bound_to(&Domain::Hook(HookName::new("configure").unwrap())));
    }

    #[test]
    fn bind_restricts_domains() {
        let info = snap("dialer", &["dialer", "helper"]);
        let app = Domain::App(AppName::new("helper").unwrap());
        let plug = Plug::new(
            info,
            InterfaceName::new("modem").unwrap(),
            InterfaceName::new("ofono").unwrap(),
        )
        .bind([app.clone()]);
        assert!(plug.is_bound_to(&app));
        assert_eq!(plug.bound.len(), 1);
    }

    #[test]
    fn connection_touches_both_sides() {
        let mut provider = SnapDeclaration::new(snap("ofono", &["ofonod"]));
        let slot = provider.add_slot("ofono", "ofono").unwrap().clone();
        let mut consumer = SnapDeclaration::new(snap("dialer", &["dialer"]));
        let plug = consumer.add_plug("ofono", "ofono").unwrap().clone();

        let conn = Connection::new(plug, slot);
        assert!(conn.touches(provider.name()));
        assert!(conn.touches(consumer.name()));
        assert!(!conn.touches(&SnapName::new("other").unwrap()));
        assert_eq!(conn.to_string(), "dialer:ofono ofono:ofono");
    }

    #[test]
    fn default_sanitize_rejects_foreign_interface() {
        #[derive(Debug)]
        struct Bluetooth;
        impl Interface for Bluetooth {
            fn name(&self) -> &'static str {
                "bluetooth"
            }
        }

        let mut decl = SnapDeclaration::new(snap("dialer", &["dialer"]));
        let plug = decl.add_plug("modem", "ofono").unwrap();
        let err = Bluetooth.sanitize_plug(plug).unwrap_err();
        assert!(matches!(err, PlugboardError::Validation { .. }));
        assert!(err.to_string().contains("plug \"modem\""));
    }
}
