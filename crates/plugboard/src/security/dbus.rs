//! D-Bus bus policy rendering.

use std::fmt::Write as _;

use bytes::Bytes;

use crate::interfaces::Fragment;

const HEADER: &str = r#"<?xml version="1.0"?>
<!DOCTYPE busconfig PUBLIC "-//freedesktop//DTD D-BUS Bus Configuration 1.0//EN"
 "http://www.freedesktop.org/standards/dbus/1.0/busconfig.dtd">
<busconfig>
"#;

const FOOTER: &str = "</busconfig>\n";

/// Principal a bus policy block applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusPrincipal {
    /// A unix user.
    User(String),
    /// A unix group.
    Group(String),
}

/// Well-known bus name owned by the service behind a slot.
///
/// Rendered as an allow block for the owner and a deny block for the
/// default context, so that no other process can own or be addressed under
/// the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusNameOwnership {
    /// Well-known bus name.
    pub name: String,
    /// Principal allowed to own the name.
    pub owner: BusPrincipal,
    /// Interfaces the owner may additionally send to.
    pub send_interfaces: Vec<String>,
}

impl BusNameOwnership {
    /// Ownership by root.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: BusPrincipal::User("root".to_string()),
            send_interfaces: Vec::new(),
        }
    }

    /// Allow the owner to send to these interfaces.
    #[must_use]
    pub fn with_send_interfaces<I, S>(mut self, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send_interfaces
            .extend(interfaces.into_iter().map(Into::into));
        self
    }

    /// Render the owner and default-context policy blocks.
    #[must_use]
    pub fn render(&self) -> Fragment {
        let name = escape(&self.name);
        let mut out = String::new();
        let _ = match &self.owner {
            BusPrincipal::User(user) => writeln!(out, "<policy user=\"{}\">", escape(user)),
            BusPrincipal::Group(group) => writeln!(out, "<policy group=\"{}\">", escape(group)),
        };
        let _ = writeln!(out, "  <allow own=\"{name}\"/>");
        let _ = writeln!(out, "  <allow send_destination=\"{name}\"/>");
        for iface in &self.send_interfaces {
            let _ = writeln!(out, "  <allow send_interface=\"{}\"/>", escape(iface));
        }
        out.push_str("</policy>\n\n");
        out.push_str("<policy context=\"default\">\n");
        let _ = writeln!(out, "  <deny own=\"{name}\"/>");
        let _ = writeln!(out, "  <deny send_destination=\"{name}\"/>");
        out.push_str("</policy>\n");
        Bytes::from(out)
    }
}

/// Complete bus configuration file for one snap.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Policy blocks.
    pub body: Bytes,
}

impl BusConfig {
    /// Wrap composed policy blocks.
    #[must_use]
    pub const fn new(body: Bytes) -> Self {
        Self { body }
    }

    /// Render the configuration file.
    #[must_use]
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER.len() + self.body.len() + FOOTER.len() + 1);
        out.extend_from_slice(HEADER.as_bytes());
        out.extend_from_slice(&self.body);
        if !self.body.is_empty() && !self.body.ends_with(b"\n") {
            out.push(b'\n');
        }
        out.extend_from_slice(FOOTER.as_bytes());
        out
    }
}

/// Escape a value for use inside an XML attribute.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
