//! Nameservers from the system stub resolver configuration.
//!
//! Only `nameserver` lines are honoured; every other keyword is ignored.

use std::net::IpAddr;
use std::path::Path;

pub const RESOLV_CONF_PATH: &str = "/etc/resolv.conf";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemResolvConf {
    pub nameservers: Vec<IpAddr>,
}

impl SystemResolvConf {
    /// Reads `/etc/resolv.conf`, yielding an empty configuration when the
    /// file is missing or unreadable.
    pub fn load() -> Self {
        Self::from_path(RESOLV_CONF_PATH).unwrap_or_default()
    }

    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut nameservers = Vec::new();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            let mut words = line.split_whitespace();
            if words.next() != Some("nameserver") {
                continue;
            }

            // Zone-scoped addresses (fe80::1%eth0) are dropped.
            if let Some(ip) = words.next().and_then(|w| w.parse::<IpAddr>().ok()) {
                nameservers.push(ip);
            }
        }

        Self { nameservers }
    }
}
