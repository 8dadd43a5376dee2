use loopdns_domain::ResolveError;

use crate::ports::EngineStatus;

/// Maps engine status codes onto the resolution error taxonomy.
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Unrecognized codes map to [`ResolveError::Unknown`].
    pub fn classify(status: EngineStatus) -> ResolveError {
        match status {
            EngineStatus::TEMPFAIL => ResolveError::TempFail,
            EngineStatus::PROTOCOL => ResolveError::ProtocolError,
            EngineStatus::NXDOMAIN => ResolveError::NameDoesNotExist,
            EngineStatus::NODATA => ResolveError::NoData,
            EngineStatus::NOMEM => ResolveError::OutOfMemory,
            EngineStatus::BADQUERY => ResolveError::BadQuery,
            _ => ResolveError::Unknown,
        }
    }
}
