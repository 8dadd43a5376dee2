//! Query lifecycle core: submission, in-flight tracking, cancellation and
//! completion dispatch for a non-blocking resolver engine driven by an
//! external event loop.
pub mod ports;
pub mod query;
pub mod services;
pub mod session;

pub use ports::{
    Completion, EngineEvents, EngineRequest, EngineStatus, RawRecords, RequestContext,
    ResolverEngine, TimerControl, TimerRequest,
};
pub use query::{Deliveries, Outcome, Query};
pub use session::Session;
