//! Host identification.
//!
//! Whether the host is a general-purpose ("classic") system or a locked-down
//! appliance image decides if confined apps may talk to services running
//! outside any snap. The mode is detected once at startup and then passed
//! explicitly to the compiler.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PlugboardError, PlugboardResult};

/// Environment variable overriding host detection.
pub const MODE_ENV: &str = "PLUGBOARD_MODE";

/// `ID` values in os-release that denote a locked-down image.
const CORE_IDS: &[&str] = &["ubuntu-core"];

/// Runtime mode of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    /// General-purpose system; system services may run unconfined.
    Classic,
    /// Locked-down image; every service is confined.
    Core,
}

impl RuntimeMode {
    /// Detect the mode of the running host.
    ///
    /// `PLUGBOARD_MODE` wins when set; otherwise `/etc/os-release` decides.
    ///
    /// # Errors
    ///
    /// Returns an error if the override holds an unknown mode.
    pub fn detect() -> PlugboardResult<Self> {
        if let Ok(value) = std::env::var(MODE_ENV) {
            let mode = value.parse()?;
            tracing::debug!(%mode, "Runtime mode taken from {MODE_ENV}");
            return Ok(mode);
        }
        let mode = Self::from_os_release_file(Path::new("/etc/os-release"));
        tracing::debug!(%mode, "Runtime mode detected from os-release");
        Ok(mode)
    }

    /// Read the mode from an os-release file. A missing file means classic.
    #[must_use]
    pub fn from_os_release_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_os_release(&content),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Cannot read os-release, assuming classic"
                );
                Self::Classic
            }
        }
    }

    /// Derive the mode from os-release content.
    #[must_use]
    pub fn from_os_release(content: &str) -> Self {
        let id = content.lines().find_map(|line| {
            line.trim()
                .strip_prefix("ID=")
                .map(|v| v.trim_matches(|c| c == '"' || c == '\''))
        });
        match id {
            Some(id) if CORE_IDS.contains(&id) => Self::Core,
            _ => Self::Classic,
        }
    }

    /// Whether the host is a general-purpose system.
    #[must_use]
    pub const fn is_classic(self) -> bool {
        matches!(self, Self::Classic)
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classic => f.write_str("classic"),
            Self::Core => f.write_str("core"),
        }
    }
}

impl FromStr for RuntimeMode {
    type Err = PlugboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classic" => Ok(Self::Classic),
            "core" => Ok(Self::Core),
            other => Err(PlugboardError::Config {
                message: format!("unknown runtime mode {other:?}, expected classic or core"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_image() {
        let content = "NAME=\"Ubuntu Core\"\nVERSION=\"16\"\nID=ubuntu-core\n";
        assert_eq!(RuntimeMode::from_os_release(content), RuntimeMode::Core);
    }

    #[test]
    fn quoted_id() {
        let content = "ID=\"ubuntu-core\"\n";
        assert_eq!(RuntimeMode::from_os_release(content), RuntimeMode::Core);
    }

    #[test]
    fn classic_distributions() {
        assert_eq!(
            RuntimeMode::from_os_release("ID=ubuntu\nID_LIKE=debian\n"),
            RuntimeMode::Classic
        );
        assert_eq!(RuntimeMode::from_os_release(""), RuntimeMode::Classic);
    }

    #[test]
    fn missing_file_is_classic() {
        let temp = tempfile::tempdir().unwrap();
        let mode = RuntimeMode::from_os_release_file(&temp.path().join("os-release"));
        assert!(mode.is_classic());
    }

    #[test]
    fn parse_mode() {
        assert_eq!("core".parse::<RuntimeMode>().unwrap(), RuntimeMode::Core);
        assert!("appliance".parse::<RuntimeMode>().is_err());
    }
}
