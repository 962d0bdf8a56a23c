//! Common error types for the plugboard policy compiler.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`PlugboardError`].
pub type PlugboardResult<T> = Result<T, PlugboardError>;

/// Errors raised while declaring, cataloguing or composing interface policy.
#[derive(Error, Diagnostic, Debug)]
pub enum PlugboardError {
    /// A plug or slot was rejected by its interface.
    #[error("Invalid {endpoint} in snap {snap}: {reason}")]
    #[diagnostic(
        code(plugboard::declaration::invalid),
        help("Fix the plug or slot attributes in the snap declaration")
    )]
    Validation {
        /// Snap owning the endpoint.
        snap: String,
        /// Endpoint description, e.g. `plug "modem"`.
        endpoint: String,
        /// Why the interface rejected it.
        reason: String,
    },

    /// Malformed identifier.
    #[error("Invalid {kind} name: {name:?}")]
    #[diagnostic(
        code(plugboard::name::invalid),
        help("Names use lowercase letters, digits and single hyphens")
    )]
    InvalidName {
        /// What kind of identifier was being parsed.
        kind: &'static str,
        /// The rejected value.
        name: String,
    },

    /// A connection references an interface the catalogue does not know.
    #[error("Unknown interface: {name}")]
    #[diagnostic(
        code(plugboard::catalogue::unknown),
        help("The catalogue and the declared connections have drifted apart")
    )]
    UnknownInterface {
        /// The interface name.
        name: String,
    },

    /// An interface name was registered twice.
    #[error("Interface registered twice: {name}")]
    #[diagnostic(code(plugboard::catalogue::duplicate))]
    DuplicateInterface {
        /// The interface name.
        name: String,
    },

    /// Policy for one snap could not be composed.
    #[error("Cannot compose {backend} policy for snap {snap}: {message}")]
    #[diagnostic(code(plugboard::compose))]
    Composition {
        /// Snap whose policy was being composed.
        snap: String,
        /// Target security backend.
        backend: String,
        /// The error message.
        message: String,
    },

    /// An input snapshot is inconsistent.
    #[error("Invalid snapshot: {message}")]
    #[diagnostic(code(plugboard::snapshot))]
    Snapshot {
        /// The error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(plugboard::io))]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    #[diagnostic(code(plugboard::serialization))]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(plugboard::config))]
    Config {
        /// The error message.
        message: String,
    },
}

impl PlugboardError {
    /// Shorthand for a [`PlugboardError::Validation`].
    pub fn validation(
        snap: impl Into<String>,
        endpoint: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation {
            snap: snap.into(),
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`PlugboardError::Composition`].
    pub fn composition(
        snap: impl Into<String>,
        backend: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        Self::Composition {
            snap: snap.into(),
            backend: backend.to_string(),
            message: message.into(),
        }
    }

    /// Whether the error is confined to a single snap's policy.
    ///
    /// Catalogue drift and configuration errors are not: they affect every
    /// snap that touches the same interface.
    #[must_use]
    pub const fn is_per_snap(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Composition { .. })
    }
}

impl From<serde_json::Error> for PlugboardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PlugboardError::UnknownInterface {
            name: "ofono".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown interface: ofono");
    }

    #[test]
    fn validation_display() {
        let err = PlugboardError::validation("dialer", "plug \"modem\"", "bad attribute");
        assert_eq!(
            err.to_string(),
            "Invalid plug \"modem\" in snap dialer: bad attribute"
        );
        assert!(err.is_per_snap());
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PlugboardError = io_err.into();
        assert!(matches!(err, PlugboardError::Io(_)));
        assert!(!err.is_per_snap());
    }
}
