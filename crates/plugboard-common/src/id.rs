//! Validated identifiers for snaps, their confinement domains and interfaces.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PlugboardError, PlugboardResult};

static SNAP_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[a-z0-9]+-?)*[a-z](?:-?[a-z0-9])*$").expect("valid regex"));
static APP_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9](?:-?[a-zA-Z0-9])*$").expect("valid regex"));
static HOOK_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z](?:-?[a-z0-9])*$").expect("valid regex"));

macro_rules! validated_name {
    ($(#[$meta:meta])* $name:ident, $kind:literal, $pattern:expr, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Maximum length of the name.
            pub const MAX_LENGTH: usize = $max;

            /// Create a new name, validating the format.
            ///
            /// # Errors
            ///
            /// Returns an error if the name format is invalid.
            pub fn new(name: impl Into<String>) -> PlugboardResult<Self> {
                let name = name.into();
                if name.is_empty() || name.len() > Self::MAX_LENGTH || !$pattern.is_match(&name) {
                    return Err(PlugboardError::InvalidName { kind: $kind, name });
                }
                Ok(Self(name))
            }

            /// Get the name as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = PlugboardError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = PlugboardError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

validated_name!(
    /// Name of an installed snap package.
    SnapName,
    "snap",
    SNAP_NAME,
    40
);

validated_name!(
    /// Name of an application inside a snap.
    AppName,
    "app",
    APP_NAME,
    64
);

validated_name!(
    /// Name of a hook inside a snap.
    HookName,
    "hook",
    HOOK_NAME,
    64
);

validated_name!(
    /// Name of a capability interface, plug or slot.
    ///
    /// Interface names are the catalogue keys: lookups are exact matches.
    InterfaceName,
    "interface",
    HOOK_NAME,
    64
);

/// One confinement domain inside a snap: an app or a hook.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Domain {
    /// An application.
    App(AppName),
    /// A hook.
    Hook(HookName),
}

impl Domain {
    /// The part of the security tag following `snap.<snap>.`.
    #[must_use]
    pub fn tag_suffix(&self) -> String {
        match self {
            Self::App(app) => app.to_string(),
            Self::Hook(hook) => format!("hook.{hook}"),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag_suffix())
    }
}

/// Name of a confinement domain as seen by the security backends.
///
/// `snap.<snap>.<app>` for apps, `snap.<snap>.hook.<hook>` for hooks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityTag(String);

impl SecurityTag {
    /// Build the tag of one domain of a snap.
    #[must_use]
    pub fn new(snap: &SnapName, domain: &Domain) -> Self {
        Self(format!("snap.{snap}.{}", domain.tag_suffix()))
    }

    /// Get the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecurityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SecurityTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
