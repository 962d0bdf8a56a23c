//! Standard output paths for rendered policy.

use std::path::PathBuf;

use once_cell::sync::Lazy;

/// Default root directory for rendered policy.
pub static PLUGBOARD_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("PLUGBOARD_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/var/lib/plugboard"))
});

/// Directories the enforcement loaders pick rendered policy up from.
#[derive(Debug, Clone)]
pub struct PlugboardPaths {
    /// Root directory (default: /var/lib/plugboard).
    pub root: PathBuf,
}

impl PlugboardPaths {
    /// Create paths with default locations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create paths with a custom root directory.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// AppArmor profiles, one per security tag.
    #[must_use]
    pub fn apparmor_profiles(&self) -> PathBuf {
        self.root.join("apparmor").join("profiles")
    }

    /// Seccomp whitelists, one per security tag.
    #[must_use]
    pub fn seccomp_profiles(&self) -> PathBuf {
        self.root.join("seccomp").join("profiles")
    }

    /// D-Bus system bus policy, one file per snap.
    #[must_use]
    pub fn dbus_policy(&self) -> PathBuf {
        self.root.join("dbus")
    }

    /// udev rules, one file per snap.
    #[must_use]
    pub fn udev_rules(&self) -> PathBuf {
        self.root.join("udev")
    }

    /// Create all backend directories.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn create_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.apparmor_profiles())?;
        std::fs::create_dir_all(self.seccomp_profiles())?;
        std::fs::create_dir_all(self.dbus_policy())?;
        std::fs::create_dir_all(self.udev_rules())?;
        Ok(())
    }
}

impl Default for PlugboardPaths {
    fn default() -> Self {
        Self {
            root: PLUGBOARD_ROOT.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_root() {
        let paths = PlugboardPaths::with_root("/tmp/plugboard-test");
        assert_eq!(
            paths.apparmor_profiles(),
            PathBuf::from("/tmp/plugboard-test/apparmor/profiles")
        );
        assert_eq!(
            paths.seccomp_profiles(),
            PathBuf::from("/tmp/plugboard-test/seccomp/profiles")
        );
        assert_eq!(paths.dbus_policy(), PathBuf::from("/tmp/plugboard-test/dbus"));
        assert_eq!(paths.udev_rules(), PathBuf::from("/tmp/plugboard-test/udev"));
    }

    #[test]
    fn create_dirs() {
        let temp = tempfile::tempdir().unwrap();
        let paths = PlugboardPaths::with_root(temp.path());
        paths.create_dirs().unwrap();
        assert!(paths.seccomp_profiles().is_dir());
        assert!(paths.udev_rules().is_dir());
    }
}
