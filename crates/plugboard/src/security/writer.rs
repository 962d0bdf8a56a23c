//! Writing rendered policy to disk.
//!
//! Files are only rewritten when their bytes change, so the caller can tell
//! from the report whether a backend needs to reload anything.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use plugboard_common::{PlugboardError, PlugboardResult, SnapName};
use sha2::{Digest, Sha256};

use super::{PolicyFile, SecurityBackend};

/// Outcome of synchronizing one snap's files for one backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Files created or rewritten.
    pub changed: Vec<String>,
    /// Stale files deleted.
    pub removed: Vec<String>,
    /// Files already up to date.
    pub unchanged: usize,
}

impl WriteReport {
    /// Whether anything on disk changed.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        !self.changed.is_empty() || !self.removed.is_empty()
    }
}

/// Keeps a backend directory in sync with rendered files.
#[derive(Debug, Clone)]
pub struct PolicyWriter {
    dir: PathBuf,
    backend: SecurityBackend,
}

impl PolicyWriter {
    /// Create a writer for one backend directory.
    pub fn new(dir: impl Into<PathBuf>, backend: SecurityBackend) -> Self {
        Self {
            dir: dir.into(),
            backend,
        }
    }

    /// Directory written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Make the snap's files in the directory exactly `files`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or written.
    pub fn ensure(&self, snap: &SnapName, files: &[PolicyFile]) -> PlugboardResult<WriteReport> {
        std::fs::create_dir_all(&self.dir)?;
        let mut report = WriteReport::default();
        let mut wanted = BTreeSet::new();

        for file in files {
            if file.name.contains('/') || file.name.starts_with('.') {
                return Err(PlugboardError::Config {
                    message: format!("refusing to write policy file {:?}", file.name),
                });
            }
            wanted.insert(file.name.as_str());
            let path = self.dir.join(&file.name);
            if std::fs::read(&path).is_ok_and(|existing| existing == file.content) {
                report.unchanged += 1;
                continue;
            }
            self.write_atomic(&path, &file.content)?;
            tracing::debug!(
                backend = %self.backend,
                file = %file.name,
                sha256 = %hex::encode(Sha256::digest(&file.content)),
                "Policy file written"
            );
            report.changed.push(file.name.clone());
        }

        for stale in self.existing(snap)? {
            let Some(name) = stale.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if wanted.contains(name) {
                continue;
            }
            std::fs::remove_file(&stale)?;
            tracing::debug!(backend = %self.backend, file = %name, "Stale policy file removed");
            report.removed.push(name.to_string());
        }

        Ok(report)
    }

    /// Remove every file of the snap.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or a file removed.
    pub fn remove(&self, snap: &SnapName) -> PlugboardResult<WriteReport> {
        if !self.dir.exists() {
            return Ok(WriteReport::default());
        }
        self.ensure(snap, &[])
    }

    fn existing(&self, snap: &SnapName) -> PlugboardResult<Vec<PathBuf>> {
        let pattern = format!(
            "{}/{}",
            glob::Pattern::escape(&self.dir.to_string_lossy()),
            self.backend.file_pattern(snap)
        );
        let paths = glob::glob(&pattern).map_err(|e| PlugboardError::Config {
            message: format!("invalid policy file pattern {pattern:?}: {e}"),
        })?;
        paths
            .map(|entry| entry.map_err(|e| PlugboardError::Io(e.into())))
            .collect()
    }

    fn write_atomic(&self, path: &Path, content: &[u8]) -> PlugboardResult<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| PlugboardError::Io(e.error))?;
        Ok(())
    }
}
