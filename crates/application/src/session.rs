use loopdns_domain::config::resolver::DEFAULT_DNS_PORT;
use loopdns_domain::{RecordKind, ResolveError, SessionError};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, trace};

use crate::ports::{EngineEvents, EngineRequest, ResolverEngine, TimerControl, TimerRequest};
use crate::query::{Deliveries, Outcome, Query};
use crate::services::{CompletionDispatcher, ErrorClassifier, Registry};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Asynchronous DNS session over one resolver engine.
///
/// The host event loop calls [`Session::readiness_pump`] whenever
/// [`Session::descriptor`] is readable and [`Session::timeout_pump`] when the
/// timer armed through `T` fires. Both settle outcomes right away but return
/// the continuations as [`Deliveries`], to be flushed once the caller no
/// longer borrows the session. Continuations may then submit or cancel
/// queries on the same session.
///
/// Dropping the session releases the engine and silently orphans every
/// query still in flight.
pub struct Session<E: ResolverEngine, T: TimerControl> {
    id: u64,
    engine: E,
    timers: T,
    timer: Option<T::Timer>,
    registry: Registry,
    events: EngineEvents,
    ready: Deliveries,
}

impl<E: ResolverEngine, T: TimerControl> Session<E, T> {
    pub fn new(mut engine: E, timers: T) -> Result<Self, SessionError> {
        engine.open()?;

        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        info!(
            session = id,
            descriptor = engine.descriptor(),
            "Resolver session opened"
        );

        Ok(Self {
            id,
            engine,
            timers,
            timer: None,
            registry: Registry::new(),
            events: EngineEvents::new(),
            ready: Deliveries::default(),
        })
    }

    pub fn submit_a(&mut self, domain: &str) -> Query {
        self.submit(EngineRequest::A {
            name: domain.to_string(),
        })
    }

    pub fn submit_aaaa(&mut self, domain: &str) -> Query {
        self.submit(EngineRequest::AAAA {
            name: domain.to_string(),
        })
    }

    /// Reverse lookup of an IPv4 or IPv6 literal. Anything else fails with
    /// [`ResolveError::BadQuery`] before reaching the engine.
    pub fn submit_ptr(&mut self, ip: &str) -> Query {
        match parse_ptr_target(ip) {
            Some(request) => self.submit(request),
            None => {
                debug!(session = self.id, ip, "Rejecting PTR target that is not an IP literal");
                self.reject(RecordKind::PTR, ResolveError::BadQuery)
            }
        }
    }

    pub fn submit_mx(&mut self, domain: &str) -> Query {
        self.submit(EngineRequest::MX {
            name: domain.to_string(),
        })
    }

    pub fn submit_txt(&mut self, domain: &str) -> Query {
        self.submit(EngineRequest::TXT {
            name: domain.to_string(),
        })
    }

    /// SRV lookup. Without service and protocol `domain` is queried as is;
    /// giving only one of them fails with [`ResolveError::BadQuery`].
    pub fn submit_srv(
        &mut self,
        domain: &str,
        service: Option<&str>,
        protocol: Option<&str>,
    ) -> Query {
        let service = match (service, protocol) {
            (Some(service), Some(protocol)) => Some((service.to_string(), protocol.to_string())),
            (None, None) => None,
            _ => {
                debug!(
                    session = self.id,
                    domain,
                    "Rejecting SRV query with only one of service/protocol"
                );
                return self.reject(RecordKind::SRV, ResolveError::BadQuery);
            }
        };

        self.submit(EngineRequest::SRV {
            name: domain.to_string(),
            service,
        })
    }

    pub fn submit_naptr(&mut self, domain: &str) -> Query {
        self.submit(EngineRequest::NAPTR {
            name: domain.to_string(),
        })
    }

    pub fn submit_ns(&mut self, domain: &str) -> Query {
        self.submit(EngineRequest::NS {
            name: domain.to_string(),
        })
    }

    /// Hands an already validated request to the engine.
    ///
    /// The returned handle is unsettled when the engine accepted the
    /// request, and already failed when it rejected it. Completions the
    /// engine reports during the call are settled too; their continuations
    /// wait for [`Session::take_deliveries`] or the next pump.
    pub fn submit(&mut self, request: EngineRequest) -> Query {
        let kind = request.kind();
        let query = Query::new(self.id, kind);
        let token = self.registry.next_token();
        let context = crate::ports::RequestContext::new(token, kind);

        match self.engine.submit(&request, context, &mut self.events) {
            Ok(()) => {
                let inserted = self.registry.insert(query.clone());
                debug_assert_eq!(inserted, token);
                query.bind(inserted);
                debug!(
                    session = self.id,
                    kind = %kind,
                    name = request.name().unwrap_or_default(),
                    in_flight = self.registry.len(),
                    "Query submitted"
                );
            }
            Err(status) => {
                let error = ErrorClassifier::classify(status);
                debug!(
                    session = self.id,
                    kind = %kind,
                    status = status.code(),
                    error = error.as_str(),
                    "Engine rejected query"
                );
                Self::settle_now(&query, Err(error));
            }
        }

        self.process_events();
        query
    }

    /// Suppresses delivery of a pending query's outcome. The engine keeps
    /// resolving it; its answer is dropped when it arrives.
    ///
    /// Returns `true` only for the first call on a pending query.
    pub fn cancel(&mut self, query: &Query) -> bool {
        if query.session_id() != self.id {
            return false;
        }

        let cancelled = query
            .token()
            .map(|token| self.registry.cancel(token))
            .unwrap_or(false);

        if cancelled {
            debug!(session = self.id, kind = %query.kind(), "Query cancelled");
        }
        cancelled
    }

    /// Call when the descriptor is readable.
    pub fn readiness_pump(&mut self) -> Deliveries {
        self.engine.pump_io(&mut self.events);
        self.process_events();
        self.take_deliveries()
    }

    /// Call when the timer armed for this session fires.
    pub fn timeout_pump(&mut self) -> Deliveries {
        self.engine.pump_timeouts(&mut self.events);
        self.process_events();
        self.take_deliveries()
    }

    /// Continuations settled since the last pump, e.g. by completions the
    /// engine reported while accepting a submission.
    pub fn take_deliveries(&mut self) -> Deliveries {
        std::mem::take(&mut self.ready)
    }

    pub fn descriptor(&self) -> RawFd {
        self.engine.descriptor()
    }

    /// Queries the engine still works on, cancelled ones included.
    pub fn active_count(&self) -> usize {
        self.engine.active()
    }

    /// Queries whose completion has not been dispatched yet.
    pub fn pending_count(&self) -> usize {
        self.registry.len()
    }

    /// Adds an upstream server, or restores the engine defaults when `ip`
    /// is `None`. Queries already in flight are unaffected.
    pub fn add_server(
        &mut self,
        ip: Option<IpAddr>,
        port: Option<u16>,
    ) -> Result<(), SessionError> {
        let server = ip.map(|ip| SocketAddr::new(ip, port.unwrap_or(DEFAULT_DNS_PORT)));
        self.engine.add_server(server)?;
        info!(
            session = self.id,
            server = ?server,
            "Resolver servers updated"
        );
        Ok(())
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn reject(&mut self, kind: RecordKind, error: ResolveError) -> Query {
        let query = Query::new(self.id, kind);
        Self::settle_now(&query, Err(error));
        query
    }

    /// For handles nobody has seen yet, so no continuation can be attached.
    fn settle_now(query: &Query, outcome: Outcome) {
        if let Some(delivery) = query.settle(outcome) {
            delivery.run();
        }
    }

    fn process_events(&mut self) {
        for completion in self.events.take_completions() {
            CompletionDispatcher::dispatch(&mut self.registry, completion, &mut self.ready);
        }

        if let Some(request) = self.events.take_timer_request() {
            self.reprogram_timer(request);
        }
    }

    fn reprogram_timer(&mut self, request: TimerRequest) {
        if let Some(timer) = self.timer.take() {
            self.timers.cancel(timer);
        }

        if let TimerRequest::Arm(delay) = request {
            trace!(session = self.id, delay_ms = delay.as_millis() as u64, "Timer armed");
            self.timer = Some(self.timers.arm(delay));
        } else {
            trace!(session = self.id, "Timer cancelled");
        }
    }
}

impl<E: ResolverEngine, T: TimerControl> Drop for Session<E, T> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            self.timers.cancel(timer);
        }
        debug!(
            session = self.id,
            orphaned = self.registry.len(),
            unflushed = self.ready.len(),
            "Resolver session closed"
        );
        // Settled outcomes still owe their continuations a run.
        std::mem::take(&mut self.ready).flush();
    }
}

/// IPv4 is tried before IPv6.
fn parse_ptr_target(ip: &str) -> Option<EngineRequest> {
    if let Ok(v4) = ip.parse::<Ipv4Addr>() {
        return Some(EngineRequest::PtrV4(v4));
    }
    ip.parse::<Ipv6Addr>().ok().map(EngineRequest::PtrV6)
}
