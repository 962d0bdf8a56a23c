//! Snapshot files.
//!
//! A snapshot describes installed snaps, their plugs and slots, and the live
//! connections between them:
//!
//! ```yaml
//! snaps:
//!   - name: ofono
//!     apps: [ofonod]
//!     slots:
//!       - name: ofono
//!   - name: dialer
//!     apps: [dialer, helper]
//!     hooks: [configure]
//!     plugs:
//!       - name: modem
//!         interface: ofono
//!         apps: [dialer]
//! connections:
//!   - plug: dialer:modem
//!     slot: ofono:ofono
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use plugboard_common::{
    AppName, Domain, HookName, InterfaceName, PlugboardError, PlugboardResult, SnapName,
};
use serde::{Deserialize, Serialize};

use crate::interfaces::{Attrs, Catalogue, Connection, Plug, SnapDeclaration, SnapInfo, Slot};

/// Parsed snapshot file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Installed snaps.
    #[serde(default)]
    pub snaps: Vec<SnapSpec>,
    /// Live connections.
    #[serde(default)]
    pub connections: Vec<ConnectionSpec>,
}

/// One installed snap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapSpec {
    /// Snap name.
    pub name: SnapName,
    /// Applications.
    #[serde(default)]
    pub apps: Vec<AppName>,
    /// Hooks.
    #[serde(default)]
    pub hooks: Vec<HookName>,
    /// Declared plugs.
    #[serde(default)]
    pub plugs: Vec<EndpointSpec>,
    /// Declared slots.
    #[serde(default)]
    pub slots: Vec<EndpointSpec>,
}

/// One plug or slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSpec {
    /// Endpoint name.
    pub name: InterfaceName,
    /// Interface; defaults to the endpoint name.
    #[serde(default)]
    pub interface: Option<InterfaceName>,
    /// Apps bound to the endpoint.
    #[serde(default)]
    pub apps: Option<Vec<AppName>>,
    /// Hooks bound to the endpoint.
    #[serde(default)]
    pub hooks: Option<Vec<HookName>>,
    /// Interface-specific attributes.
    #[serde(default)]
    pub attrs: Attrs,
}

impl EndpointSpec {
    fn interface(&self) -> &InterfaceName {
        self.interface.as_ref().unwrap_or(&self.name)
    }

    /// Explicit binding, if any. Without one the endpoint is bound to the
    /// whole snap.
    fn binding(&self) -> Option<BTreeSet<Domain>> {
        if self.apps.is_none() && self.hooks.is_none() {
            return None;
        }
        let apps = self.apps.iter().flatten().cloned().map(Domain::App);
        let hooks = self.hooks.iter().flatten().cloned().map(Domain::Hook);
        Some(apps.chain(hooks).collect())
    }
}

/// A live connection between two endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSpec {
    /// Consumer side.
    pub plug: EndpointRef,
    /// Provider side.
    pub slot: EndpointRef,
}

/// `<snap>:<endpoint>` reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EndpointRef {
    /// Snap name.
    pub snap: SnapName,
    /// Endpoint name.
    pub name: InterfaceName,
}

impl FromStr for EndpointRef {
    type Err = PlugboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (snap, name) = s.split_once(':').ok_or_else(|| PlugboardError::Snapshot {
            message: format!("endpoint reference {s:?} is not of the form snap:name"),
        })?;
        Ok(Self {
            snap: snap.parse()?,
            name: name.parse()?,
        })
    }
}

impl TryFrom<String> for EndpointRef {
    type Error = PlugboardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EndpointRef> for String {
    fn from(value: EndpointRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.snap, self.name)
    }
}

/// Declarations and connections ready for composition.
#[derive(Debug, Default)]
pub struct Resolved {
    /// Snaps whose every endpoint passed sanitization.
    pub declarations: Vec<SnapDeclaration>,
    /// Connections between accepted snaps.
    pub connections: Vec<Connection>,
    /// Per-snap rejections. Rejected snaps are left out of `declarations`
    /// together with every connection touching them.
    pub rejected: Vec<PlugboardError>,
}

impl Resolved {
    /// Find an accepted declaration.
    #[must_use]
    pub fn declaration(&self, snap: &str) -> Option<&SnapDeclaration> {
        self.declarations.iter().find(|d| d.name().as_str() == snap)
    }
}

impl Snapshot {
    /// Parse from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a valid snapshot.
    pub fn from_yaml(yaml: &str) -> PlugboardResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| PlugboardError::Serialization(e.to_string()))
    }

    /// Load from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> PlugboardResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot = Self::from_yaml(&content)?;
        tracing::debug!(
            path = %path.display(),
            snaps = snapshot.snaps.len(),
            connections = snapshot.connections.len(),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Build declarations, sanitizing every endpoint through the catalogue.
    ///
    /// A snap with an endpoint its interface rejects is left out and
    /// reported in [`Resolved::rejected`].
    ///
    /// # Errors
    ///
    /// Returns [`PlugboardError::Snapshot`] for structural problems: a snap
    /// listed twice, an endpoint declared twice, or a connection naming a
    /// snap or endpoint that does not exist.
    pub fn resolve(&self, catalogue: &Catalogue) -> PlugboardResult<Resolved> {
        let mut resolved = Resolved::default();
        let mut known: BTreeMap<&SnapName, bool> = BTreeMap::new();

        for spec in &self.snaps {
            if known.contains_key(&spec.name) {
                return Err(snapshot_error(format!("snap {} is listed twice", spec.name)));
            }
            match declare(spec, catalogue)? {
                Ok(decl) => {
                    known.insert(&spec.name, true);
                    resolved.declarations.push(decl);
                }
                Err(err) => {
                    tracing::warn!(snap = %spec.name, error = %err, "Rejected snap declaration");
                    known.insert(&spec.name, false);
                    resolved.rejected.push(err);
                }
            }
        }

        for spec in &self.connections {
            let plug_ok = known.get(&spec.plug.snap).copied().ok_or_else(|| {
                snapshot_error(format!("connection names unknown snap {}", spec.plug.snap))
            })?;
            let slot_ok = known.get(&spec.slot.snap).copied().ok_or_else(|| {
                snapshot_error(format!("connection names unknown snap {}", spec.slot.snap))
            })?;
            if !(plug_ok && slot_ok) {
                tracing::debug!(
                    plug = %spec.plug,
                    slot = %spec.slot,
                    "Skipping connection of rejected snap"
                );
                continue;
            }
            let plug = resolved
                .declaration(spec.plug.snap.as_str())
                .and_then(|d| d.plug(spec.plug.name.as_str()))
                .ok_or_else(|| snapshot_error(format!("no plug {}", spec.plug)))?
                .clone();
            let slot = resolved
                .declaration(spec.slot.snap.as_str())
                .and_then(|d| d.slot(spec.slot.name.as_str()))
                .ok_or_else(|| snapshot_error(format!("no slot {}", spec.slot)))?
                .clone();
            resolved.connections.push(Connection::new(plug, slot));
        }

        tracing::info!(
            snaps = resolved.declarations.len(),
            rejected = resolved.rejected.len(),
            connections = resolved.connections.len(),
            "Resolved snapshot"
        );
        Ok(resolved)
    }
}

/// Outer error: structural. Inner error: the snap was rejected.
fn declare(
    spec: &SnapSpec,
    catalogue: &Catalogue,
) -> PlugboardResult<PlugboardResult<SnapDeclaration>> {
    let mut info = SnapInfo::new(spec.name.clone());
    for app in &spec.apps {
        info = info.with_app(app.clone());
    }
    for hook in &spec.hooks {
        info = info.with_hook(hook.clone());
    }
    let info = Arc::new(info);
    let mut decl = SnapDeclaration::new(Arc::clone(&info));

    ensure_unique(&spec.name, "plug", &spec.plugs)?;
    ensure_unique(&spec.name, "slot", &spec.slots)?;

    for endpoint in &spec.plugs {
        let mut plug = Plug::new(
            Arc::clone(&info),
            endpoint.name.clone(),
            endpoint.interface().clone(),
        );
        plug.attrs.clone_from(&endpoint.attrs);
        if let Some(bound) = endpoint.binding() {
            plug = plug.bind(bound);
        }
        if let Err(err) = catalogue.sanitize_plug(&mut plug) {
            return Ok(Err(err));
        }
        decl.plugs.push(plug);
    }
    for endpoint in &spec.slots {
        let mut slot = Slot::new(
            Arc::clone(&info),
            endpoint.name.clone(),
            endpoint.interface().clone(),
        );
        slot.attrs.clone_from(&endpoint.attrs);
        if let Some(bound) = endpoint.binding() {
            slot = slot.bind(bound);
        }
        if let Err(err) = catalogue.sanitize_slot(&mut slot) {
            return Ok(Err(err));
        }
        decl.slots.push(slot);
    }
    Ok(Ok(decl))
}

fn ensure_unique(snap: &SnapName, kind: &str, endpoints: &[EndpointSpec]) -> PlugboardResult<()> {
    let mut seen = BTreeSet::new();
    for endpoint in endpoints {
        if !seen.insert(&endpoint.name) {
            return Err(snapshot_error(format!(
                "snap {snap} declares {kind} {} twice",
                endpoint.name
            )));
        }
    }
    Ok(())
}

fn snapshot_error(message: String) -> PlugboardError {
    PlugboardError::Snapshot { message }
}
