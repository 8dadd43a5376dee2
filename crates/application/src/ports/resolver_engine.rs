use loopdns_domain::{RecordKind, SessionError};
use smallvec::SmallVec;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::os::fd::RawFd;

use super::timer_control::TimerRequest;

/// Status code reported by the engine for a submission or a completion.
///
/// Non-negative values mean success. The named negative codes are the ones
/// the error classifier recognizes; engines may report others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineStatus(pub i32);

impl EngineStatus {
    pub const OK: EngineStatus = EngineStatus(0);
    pub const TEMPFAIL: EngineStatus = EngineStatus(-1);
    pub const PROTOCOL: EngineStatus = EngineStatus(-2);
    pub const NXDOMAIN: EngineStatus = EngineStatus(-3);
    pub const NODATA: EngineStatus = EngineStatus(-4);
    pub const NOMEM: EngineStatus = EngineStatus(-5);
    pub const BADQUERY: EngineStatus = EngineStatus(-6);

    pub fn code(&self) -> i32 {
        self.0
    }

    pub fn is_failure(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one registry slot. The generation distinguishes successive
/// occupants of the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryToken {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// Opaque context bound to a submission and handed back, unchanged, with its
/// completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestContext {
    pub(crate) token: QueryToken,
    kind: RecordKind,
}

impl RequestContext {
    pub(crate) fn new(token: QueryToken, kind: RecordKind) -> Self {
        Self { token, kind }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }
}

/// A request as handed to the engine. Caller input has already been
/// validated: PTR targets are parsed addresses and SRV service/protocol are
/// either both present or both absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineRequest {
    A { name: String },
    AAAA { name: String },
    PtrV4(Ipv4Addr),
    PtrV6(Ipv6Addr),
    MX { name: String },
    TXT { name: String },
    SRV {
        name: String,
        service: Option<(String, String)>,
    },
    NAPTR { name: String },
    NS { name: String },
}

impl EngineRequest {
    pub fn kind(&self) -> RecordKind {
        match self {
            EngineRequest::A { .. } => RecordKind::A,
            EngineRequest::AAAA { .. } => RecordKind::AAAA,
            EngineRequest::PtrV4(_) | EngineRequest::PtrV6(_) => RecordKind::PTR,
            EngineRequest::MX { .. } => RecordKind::MX,
            EngineRequest::TXT { .. } => RecordKind::TXT,
            EngineRequest::SRV { .. } => RecordKind::SRV,
            EngineRequest::NAPTR { .. } => RecordKind::NAPTR,
            EngineRequest::NS { .. } => RecordKind::NS,
        }
    }

    /// Owner name for named lookups; `None` for reverse lookups.
    pub fn name(&self) -> Option<&str> {
        match self {
            EngineRequest::A { name }
            | EngineRequest::AAAA { name }
            | EngineRequest::MX { name }
            | EngineRequest::TXT { name }
            | EngineRequest::SRV { name, .. }
            | EngineRequest::NAPTR { name }
            | EngineRequest::NS { name } => Some(name),
            EngineRequest::PtrV4(_) | EngineRequest::PtrV6(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMx {
    pub name: String,
    pub priority: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSrv {
    pub name: String,
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
}

/// NAPTR as the engine reports it: absent regexp and replacement are empty
/// strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNaptr {
    pub order: u16,
    pub preference: u16,
    pub flags: String,
    pub service: String,
    pub regexp: String,
    pub replacement: String,
}

/// Engine-native answer buffer. Ownership moves to the dispatcher with the
/// completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRecords {
    A(Vec<Ipv4Addr>),
    AAAA(Vec<Ipv6Addr>),
    PTR(Vec<String>),
    MX(Vec<RawMx>),
    TXT(Vec<Vec<u8>>),
    SRV(Vec<RawSrv>),
    NAPTR(Vec<RawNaptr>),
    NS(Vec<String>),
}

impl RawRecords {
    pub fn kind(&self) -> RecordKind {
        match self {
            RawRecords::A(_) => RecordKind::A,
            RawRecords::AAAA(_) => RecordKind::AAAA,
            RawRecords::PTR(_) => RecordKind::PTR,
            RawRecords::MX(_) => RecordKind::MX,
            RawRecords::TXT(_) => RecordKind::TXT,
            RawRecords::SRV(_) => RecordKind::SRV,
            RawRecords::NAPTR(_) => RecordKind::NAPTR,
            RawRecords::NS(_) => RecordKind::NS,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RawRecords::A(v) => v.len(),
            RawRecords::AAAA(v) => v.len(),
            RawRecords::PTR(v) | RawRecords::NS(v) => v.len(),
            RawRecords::MX(v) => v.len(),
            RawRecords::TXT(v) => v.len(),
            RawRecords::SRV(v) => v.len(),
            RawRecords::NAPTR(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One resolved (or failed) query, as reported by the engine.
#[derive(Debug)]
pub struct Completion {
    pub context: RequestContext,
    pub status: EngineStatus,
    pub records: Option<RawRecords>,
}

/// Sink the engine reports into while the session calls it. Completions are
/// dispatched in the order they were reported, after the engine call
/// returns.
#[derive(Debug, Default)]
pub struct EngineEvents {
    completions: SmallVec<[Completion; 4]>,
    timer: Option<TimerRequest>,
}

impl EngineEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn complete(
        &mut self,
        context: RequestContext,
        status: EngineStatus,
        records: Option<RawRecords>,
    ) {
        self.completions.push(Completion {
            context,
            status,
            records,
        });
    }

    /// Asks the event loop to replace its timer. Only the latest request
    /// made during one engine call is applied.
    pub fn reprogram_timer(&mut self, request: TimerRequest) {
        self.timer = Some(request);
    }

    pub fn take_completions(&mut self) -> SmallVec<[Completion; 4]> {
        std::mem::take(&mut self.completions)
    }

    pub fn take_timer_request(&mut self) -> Option<TimerRequest> {
        self.timer.take()
    }
}

/// The non-blocking resolver engine the session drives.
///
/// Engine construction is context creation and `Drop` is its release. Every
/// accepted submission must eventually be reported exactly once through
/// [`EngineEvents::complete`] from `pump_io` or `pump_timeouts`.
pub trait ResolverEngine {
    fn open(&mut self) -> Result<(), SessionError>;

    /// Socket the event loop watches for readability.
    fn descriptor(&self) -> RawFd;

    /// Accepts a request or rejects it with a failure status.
    fn submit(
        &mut self,
        request: &EngineRequest,
        context: RequestContext,
        events: &mut EngineEvents,
    ) -> Result<(), EngineStatus>;

    fn pump_io(&mut self, events: &mut EngineEvents);

    /// Drives retransmissions and expiries. Must report the next timer
    /// request before returning.
    fn pump_timeouts(&mut self, events: &mut EngineEvents);

    /// Queries the engine still considers outstanding.
    fn active(&self) -> usize;

    /// `None` restores the engine's default server list.
    fn add_server(&mut self, server: Option<SocketAddr>) -> Result<(), SessionError>;
}
