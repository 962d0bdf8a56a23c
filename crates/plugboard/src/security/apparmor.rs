//! AppArmor profile rendering.
//!
//! Every app and hook of a snap runs under its own profile, named after its
//! security tag. The profile grants the snap access to its own files; the
//! rest comes from the interfaces it is connected through.

#[cfg(target_os = "linux")]
use std::path::Path;

use bytes::Bytes;
use plugboard_common::{SecurityTag, SnapName};

/// AppArmor profile for one confinement domain.
#[derive(Debug, Clone)]
pub struct AppArmorProfile {
    /// Profile name.
    pub name: SecurityTag,
    /// Interface fragments for the domain.
    pub body: Bytes,
}

impl AppArmorProfile {
    /// Create a profile around composed fragments.
    #[must_use]
    pub const fn new(name: SecurityTag, body: Bytes) -> Self {
        Self { name, body }
    }

    /// Render the complete profile text.
    #[must_use]
    pub fn render(&self, snap: &SnapName) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.body.len() + 512);
        out.extend_from_slice(b"#include <tunables/global>\n\n");
        out.extend_from_slice(
            format!("profile \"{}\" (attach_disconnected) {{\n", self.name).as_bytes(),
        );
        out.extend_from_slice(b"  #include <abstractions/base>\n");
        out.extend_from_slice(b"  #include <abstractions/consoles>\n\n");
        out.extend_from_slice(format!("  /snap/{snap}/** mrklix,\n").as_bytes());
        out.extend_from_slice(format!("  /var/snap/{snap}/** rwk,\n").as_bytes());
        out.extend_from_slice(format!("  owner @{{HOME}}/snap/{snap}/** rwk,\n").as_bytes());
        out.extend_from_slice(&self.body);
        if !self.body.is_empty() && !self.body.ends_with(b"\n") {
            out.push(b'\n');
        }
        out.extend_from_slice(b"}\n");
        out
    }

    /// Check if AppArmor is enabled on the system.
    #[cfg(target_os = "linux")]
    #[must_use]
    pub fn is_enabled() -> bool {
        Path::new("/sys/module/apparmor").exists()
            && Path::new("/sys/kernel/security/apparmor").exists()
    }

    /// Check if AppArmor is enabled on the system.
    #[cfg(not(target_os = "linux"))]
    #[must_use]
    pub const fn is_enabled() -> bool {
        false
    }
}
