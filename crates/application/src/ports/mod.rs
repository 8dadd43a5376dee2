mod resolver_engine;
mod timer_control;

pub use resolver_engine::{
    Completion, EngineEvents, EngineRequest, EngineStatus, QueryToken, RawMx, RawNaptr,
    RawRecords, RawSrv, RequestContext, ResolverEngine,
};
pub use timer_control::{TimerControl, TimerRequest};
