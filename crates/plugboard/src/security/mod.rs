//! Security backends.
//!
//! Each backend enforces policy written in its own language:
//! - AppArmor profiles (mandatory access control)
//! - Seccomp syscall whitelists
//! - D-Bus system bus policy
//! - udev rules tagging device nodes
//!
//! This module turns composed documents into the files each backend's loader
//! consumes. Loading them into the kernel is left to those loaders.

mod apparmor;
mod dbus;
mod seccomp;
mod udev;
mod writer;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use bytes::Bytes;
use plugboard_common::{PlugboardError, PlugboardPaths, PlugboardResult, RuntimeMode, SnapName};
use serde::{Deserialize, Serialize};

use crate::compose::Composer;
use crate::interfaces::{Connection, SnapDeclaration};

pub use apparmor::AppArmorProfile;
pub use dbus::{BusConfig, BusNameOwnership, BusPrincipal};
pub use seccomp::SeccompProfile;
pub use udev::UdevRules;
pub use writer::{PolicyWriter, WriteReport};

/// Enforcement subsystem a fragment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityBackend {
    /// AppArmor profiles.
    AppArmor,
    /// Seccomp whitelists.
    SecComp,
    /// D-Bus bus policy.
    DBus,
    /// udev rules.
    UDev,
}

impl SecurityBackend {
    /// Every backend, in rendering order.
    pub const ALL: [Self; 4] = [Self::AppArmor, Self::SecComp, Self::DBus, Self::UDev];

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AppArmor => "apparmor",
            Self::SecComp => "seccomp",
            Self::DBus => "dbus",
            Self::UDev => "udev",
        }
    }

    /// Whether the backend confines each app and hook separately.
    #[must_use]
    pub const fn is_per_domain(self) -> bool {
        matches!(self, Self::AppArmor | Self::SecComp)
    }

    /// Whether connections contribute to the backend's documents.
    ///
    /// Device rules follow slot declarations only; they never name a peer.
    #[must_use]
    pub const fn is_connection_scoped(self) -> bool {
        !matches!(self, Self::UDev)
    }

    /// Directory the backend's loader reads from.
    #[must_use]
    pub fn directory(self, paths: &PlugboardPaths) -> PathBuf {
        match self {
            Self::AppArmor => paths.apparmor_profiles(),
            Self::SecComp => paths.seccomp_profiles(),
            Self::DBus => paths.dbus_policy(),
            Self::UDev => paths.udev_rules(),
        }
    }

    /// Glob matching every file this backend writes for a snap.
    #[must_use]
    pub fn file_pattern(self, snap: &SnapName) -> String {
        match self {
            Self::AppArmor => format!("snap.{snap}.*"),
            Self::SecComp => format!("snap.{snap}.*.src"),
            Self::DBus => format!("snap.{snap}.conf"),
            Self::UDev => format!("70-snap.{snap}.rules"),
        }
    }
}

impl fmt::Display for SecurityBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurityBackend {
    type Err = PlugboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| PlugboardError::Config {
                message: format!(
                    "unknown security backend {s:?}, expected one of apparmor, seccomp, dbus, udev"
                ),
            })
    }
}

/// One rendered file, named relative to its backend directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyFile {
    /// File name.
    pub name: String,
    /// File content.
    pub content: Bytes,
}

impl PolicyFile {
    /// Create a file.
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Render every file a backend needs for one snap.
///
/// Per-domain backends get one file per app and hook, snap-wide backends get
/// at most one file, omitted when the snap contributes nothing.
///
/// # Errors
///
/// Returns an error if composition fails.
pub fn render_files(
    composer: &Composer<'_>,
    decl: &SnapDeclaration,
    connections: &[Connection],
    backend: SecurityBackend,
    mode: RuntimeMode,
) -> PlugboardResult<Vec<PolicyFile>> {
    let snap = decl.name();
    match backend {
        SecurityBackend::AppArmor | SecurityBackend::SecComp => decl
            .info
            .domains()
            .map(|domain| -> PlugboardResult<PolicyFile> {
                let doc = composer.compose_domain(decl, &domain, connections, backend, mode)?;
                let tag = decl.info.security_tag(&domain);
                Ok(match backend {
                    SecurityBackend::AppArmor => {
                        let profile = AppArmorProfile::new(tag.clone(), doc.content);
                        PolicyFile::new(tag.as_str(), profile.render(snap))
                    }
                    _ => {
                        let profile = SeccompProfile::new(tag.clone(), doc.content);
                        PolicyFile::new(format!("{tag}.src"), profile.render())
                    }
                })
            })
            .collect(),
        SecurityBackend::DBus => {
            let doc = composer.compose(decl, connections, backend, mode)?;
            if doc.is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![PolicyFile::new(
                format!("snap.{snap}.conf"),
                BusConfig::new(doc.content).render(),
            )])
        }
        SecurityBackend::UDev => {
            let doc = composer.compose(decl, connections, backend, mode)?;
            if doc.is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![PolicyFile::new(
                format!("70-snap.{snap}.rules"),
                UdevRules::new(snap.clone(), doc.content).render(),
            )])
        }
    }
}
