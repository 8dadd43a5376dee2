use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use super::errors::ConfigError;
use super::system::SystemResolvConf;

/// Environment variable holding whitespace separated nameserver addresses.
pub const NAMESERVERS_ENV: &str = "NAMESERVERS";

/// Upper bound on the number of upstream servers a resolver talks to.
pub const MAX_SERVERS: usize = 6;

pub const DEFAULT_DNS_PORT: u16 = 53;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Upstream servers as `ip` or `ip:port`. Empty means "use the
    /// environment, then the system configuration".
    #[serde(default)]
    pub nameservers: Vec<String>,

    /// Port used for entries that do not carry one.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Time to wait for an answer before retransmitting.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Number of passes over the server list before giving up.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            nameservers: Vec::new(),
            port: default_port(),
            timeout_ms: default_timeout_ms(),
            attempts: default_attempts(),
        }
    }
}

impl ResolverConfig {
    /// Effective upstream servers, consulting `NAMESERVERS` and
    /// `/etc/resolv.conf` when none are configured.
    pub fn server_addrs(&self) -> Result<Vec<SocketAddr>, ConfigError> {
        let env = std::env::var(NAMESERVERS_ENV).ok();
        let system = SystemResolvConf::load();
        self.server_addrs_from(env.as_deref(), &system)
    }

    pub fn server_addrs_from(
        &self,
        env: Option<&str>,
        system: &SystemResolvConf,
    ) -> Result<Vec<SocketAddr>, ConfigError> {
        let mut servers = if !self.nameservers.is_empty() {
            self.nameservers
                .iter()
                .map(|s| parse_server(s, self.port))
                .collect::<Result<Vec<_>, _>>()?
        } else if let Some(env) = env.filter(|e| !e.trim().is_empty()) {
            env.split_whitespace()
                .map(|s| parse_server(s, self.port))
                .collect::<Result<Vec<_>, _>>()?
        } else if !system.nameservers.is_empty() {
            system
                .nameservers
                .iter()
                .map(|ip| SocketAddr::new(*ip, self.port))
                .collect()
        } else {
            vec![SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), self.port)]
        };

        servers.truncate(MAX_SERVERS);
        Ok(servers)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Validation(
                "Resolver port cannot be 0".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "Resolver timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.attempts == 0 {
            return Err(ConfigError::Validation(
                "Resolver attempts must be greater than 0".to_string(),
            ));
        }
        for server in &self.nameservers {
            parse_server(server, self.port)?;
        }
        Ok(())
    }
}

/// Parses `ip`, `ip:port` or `[ipv6]:port`.
pub fn parse_server(value: &str, default_port: u16) -> Result<SocketAddr, ConfigError> {
    let value = value.trim();
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Ok(addr);
    }
    value
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, default_port))
        .map_err(|_| ConfigError::Validation(format!("Invalid nameserver address: {}", value)))
}

fn default_port() -> u16 {
    DEFAULT_DNS_PORT
}

fn default_timeout_ms() -> u64 {
    4000
}

fn default_attempts() -> u32 {
    3
}
