//! # Plugboard
//!
//! Plugboard compiles capability interface declarations of confined snap
//! packages into the policy each security backend enforces.
//!
//! ## Features
//!
//! - **Interfaces**: one [`interfaces::Interface`] per capability kind,
//!   registered in a [`interfaces::Catalogue`]
//! - **Composition**: deterministic per-snap documents built from permanent
//!   and connection-specific fragments
//! - **Backends**: AppArmor profiles, seccomp whitelists, D-Bus bus policy
//!   and udev rules
//!
//! ## Usage
//!
//! ```no_run
//! use plugboard::compose::Composer;
//! use plugboard::interfaces::Catalogue;
//! use plugboard::security::SecurityBackend;
//! use plugboard::snapshot::Snapshot;
//! use plugboard_common::RuntimeMode;
//! use std::path::Path;
//!
//! # fn example() -> plugboard_common::PlugboardResult<()> {
//! let catalogue = Catalogue::builtin()?;
//! let resolved = Snapshot::load(Path::new("snapshot.yaml"))?.resolve(&catalogue)?;
//!
//! let composer = Composer::new(&catalogue);
//! for decl in &resolved.declarations {
//!     let doc = composer.compose(
//!         decl,
//!         &resolved.connections,
//!         SecurityBackend::AppArmor,
//!         RuntimeMode::detect()?,
//!     )?;
//!     println!("{}: {} bytes", doc.snap, doc.content.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod cli;
pub mod compose;
pub mod interfaces;
pub mod security;
pub mod snapshot;

pub use compose::{Composer, PolicyDocument};
pub use interfaces::{Catalogue, Connection, Interface, Plug, SnapDeclaration, Slot};
pub use security::SecurityBackend;
