//! # plugboard-common
//!
//! Shared types for the plugboard interface policy compiler:
//! - Validated snap, app, hook and interface names
//! - Security tags naming confinement domains
//! - Host runtime-mode detection
//! - Standard output paths
//! - Common error types

#![warn(missing_docs)]

pub mod error;
pub mod id;
pub mod paths;
pub mod release;

pub use error::{PlugboardError, PlugboardResult};
pub use id::{AppName, Domain, HookName, InterfaceName, SecurityTag, SnapName};
pub use paths::PlugboardPaths;
pub use release::RuntimeMode;
