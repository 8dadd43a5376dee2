//! loopdns Domain Layer
pub mod config;
pub mod dns_record;
pub mod errors;

pub use config::{CliOverrides, Config, LoggingConfig, ResolverConfig};
pub use dns_record::{MxRecord, NaptrRecord, RecordKind, RecordSet, SrvRecord};
pub use errors::{ResolveError, SessionError};
