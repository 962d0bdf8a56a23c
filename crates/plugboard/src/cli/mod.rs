//! CLI command definitions and handlers.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, bail, eyre};
use plugboard_common::{PlugboardPaths, RuntimeMode, SnapName};

use crate::compose::{self, Composer};
use crate::interfaces::Catalogue;
use crate::security::{self, AppArmorProfile, PolicyWriter, SecurityBackend};
use crate::snapshot::{Resolved, Snapshot};

/// Plugboard - Capability Interface Policy Compiler
#[derive(Parser)]
#[command(name = "plugboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Root directory for rendered policy
    #[arg(
        long,
        global = true,
        env = "PLUGBOARD_ROOT",
        default_value = "/var/lib/plugboard"
    )]
    pub root: PathBuf,

    /// Host mode (classic, core); detected from os-release when omitted
    #[arg(long, global = true, env = "PLUGBOARD_MODE")]
    pub mode: Option<RuntimeMode>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Plugboard commands.
#[derive(Subcommand)]
pub enum Commands {
    /// List known interfaces
    Interfaces,

    /// Load a snapshot and sanitize every declaration
    Check {
        /// Path to the snapshot file
        snapshot: PathBuf,
    },

    /// Print the composed policy of one snap
    Compose {
        /// Path to the snapshot file
        snapshot: PathBuf,

        /// Snap to compose
        #[arg(short, long)]
        snap: SnapName,

        /// Security backend (apparmor, seccomp, dbus, udev)
        #[arg(short, long, default_value = "apparmor")]
        backend: SecurityBackend,
    },

    /// Write policy files of every snap in a snapshot
    Render {
        /// Path to the snapshot file
        snapshot: PathBuf,

        /// Only render this backend
        #[arg(short, long)]
        backend: Option<SecurityBackend>,

        /// Number of snaps composed in parallel
        #[arg(short, long, default_value = "4")]
        jobs: usize,
    },

    /// Remove every policy file of a snap
    Remove {
        /// Snap whose files are removed
        snap: SnapName,
    },
}

impl Cli {
    /// Execute the CLI command.
    pub fn execute(self) -> Result<()> {
        let paths = PlugboardPaths::with_root(&self.root);
        let catalogue = Catalogue::builtin()?;

        match self.command {
            Commands::Interfaces => {
                for name in catalogue.names() {
                    println!("{name}");
                }
                Ok(())
            }

            Commands::Check { snapshot } => {
                let resolved = load(&snapshot, &catalogue)?;
                for err in &resolved.rejected {
                    eprintln!("error: {err}");
                }
                println!(
                    "{} snaps, {} connections, {} rejected",
                    resolved.declarations.len(),
                    resolved.connections.len(),
                    resolved.rejected.len()
                );
                if !resolved.rejected.is_empty() {
                    bail!("{} snap declarations rejected", resolved.rejected.len());
                }
                Ok(())
            }

            Commands::Compose {
                snapshot,
                snap,
                backend,
            } => {
                let mode = resolve_mode(self.mode)?;
                let resolved = load(&snapshot, &catalogue)?;
                let decl = resolved
                    .declaration(snap.as_str())
                    .ok_or_else(|| eyre!("Snap {snap} not found or rejected"))?;
                let doc = Composer::new(&catalogue).compose(
                    decl,
                    &resolved.connections,
                    backend,
                    mode,
                )?;
                tracing::info!(%snap, %backend, %mode, sha256 = %doc.digest(), "Composed");
                std::io::stdout().write_all(doc.as_bytes())?;
                Ok(())
            }

            Commands::Render {
                snapshot,
                backend,
                jobs,
            } => {
                let mode = resolve_mode(self.mode)?;
                let resolved = load(&snapshot, &catalogue)?;
                let backends = backend.map_or_else(|| SecurityBackend::ALL.to_vec(), |b| vec![b]);
                render(&catalogue, &resolved, &paths, &backends, mode, jobs)
            }

            Commands::Remove { snap } => {
                for backend in SecurityBackend::ALL {
                    let writer = PolicyWriter::new(backend.directory(&paths), backend);
                    let report = writer.remove(&snap)?;
                    for name in &report.removed {
                        println!("{backend}: removed {name}");
                    }
                }
                Ok(())
            }
        }
    }
}

fn resolve_mode(flag: Option<RuntimeMode>) -> Result<RuntimeMode> {
    match flag {
        Some(mode) => Ok(mode),
        None => Ok(RuntimeMode::detect()?),
    }
}

fn load(path: &Path, catalogue: &Catalogue) -> Result<Resolved> {
    let snapshot = Snapshot::load(path)
        .map_err(|e| eyre!("Failed to load snapshot {}: {e}", path.display()))?;
    Ok(snapshot.resolve(catalogue)?)
}

fn render(
    catalogue: &Catalogue,
    resolved: &Resolved,
    paths: &PlugboardPaths,
    backends: &[SecurityBackend],
    mode: RuntimeMode,
    jobs: usize,
) -> Result<()> {
    if backends.contains(&SecurityBackend::AppArmor) && !AppArmorProfile::is_enabled() {
        tracing::warn!(
            "AppArmor is not enabled on this host, profiles are written but not enforced"
        );
    }

    let composer = Composer::new(catalogue);
    let mut failed = resolved.rejected.len();
    for &backend in backends {
        let writer = PolicyWriter::new(backend.directory(paths), backend);
        let results = compose::batch(&resolved.declarations, jobs, |decl| {
            let files =
                security::render_files(&composer, decl, &resolved.connections, backend, mode)?;
            writer.ensure(decl.name(), &files)
        });

        for (decl, result) in resolved.declarations.iter().zip(results) {
            match result {
                Ok(report) if report.is_modified() => {
                    tracing::info!(
                        snap = %decl.name(),
                        %backend,
                        changed = report.changed.len(),
                        removed = report.removed.len(),
                        "Policy updated"
                    );
                    for name in &report.changed {
                        println!("{backend}: wrote {name}");
                    }
                    for name in &report.removed {
                        println!("{backend}: removed {name}");
                    }
                }
                Ok(_) => {
                    tracing::debug!(snap = %decl.name(), %backend, "Policy unchanged");
                }
                Err(e) => {
                    tracing::error!(
                        snap = %decl.name(),
                        %backend,
                        error = %e,
                        "Cannot render policy"
                    );
                    failed += 1;
                }
            }
        }
    }

    if failed > 0 {
        bail!("{failed} snaps could not be rendered");
    }
    Ok(())
}
