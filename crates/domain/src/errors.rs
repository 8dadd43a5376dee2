use thiserror::Error;

/// Per-query failure, delivered to the query handle that failed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveError {
    #[error("Temporary failure in name resolution")]
    TempFail,

    #[error("Malformed or unexpected DNS response")]
    ProtocolError,

    #[error("Domain name does not exist (NXDOMAIN)")]
    NameDoesNotExist,

    #[error("Domain exists but has no records of the requested type")]
    NoData,

    #[error("Out of memory while building the query")]
    OutOfMemory,

    #[error("Invalid query (malformed domain name or IP address)")]
    BadQuery,

    #[error("Unknown resolver error")]
    Unknown,
}

impl ResolveError {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveError::TempFail => "TEMPFAIL",
            ResolveError::ProtocolError => "PROTOCOL",
            ResolveError::NameDoesNotExist => "NXDOMAIN",
            ResolveError::NoData => "NODATA",
            ResolveError::OutOfMemory => "NOMEM",
            ResolveError::BadQuery => "BADQUERY",
            ResolveError::Unknown => "UNKNOWN",
        }
    }
}

/// Failure of the session itself, reported at construction or
/// reconfiguration time rather than through a query handle.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Resolver engine creation failed: {0}")]
    EngineCreation(String),

    #[error("Resolver engine open failed: {0}")]
    EngineOpen(String),

    #[error("Invalid server configuration: {0}")]
    ServerConfig(String),
}
