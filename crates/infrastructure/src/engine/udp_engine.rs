use loopdns_application::{
    EngineEvents, EngineRequest, EngineStatus, RequestContext, ResolverEngine, TimerRequest,
};
use loopdns_domain::config::resolver::MAX_SERVERS;
use loopdns_domain::config::ConfigError;
use loopdns_domain::{ResolverConfig, SessionError};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::os::fd::{AsRawFd, RawFd};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::message_builder::MessageBuilder;
use super::response_parser::{ParsedResponse, ResponseParser};
use super::socket::ResolverSocket;

const RECV_BUFFER_SIZE: usize = 4096;

/// Server list and retry policy of a [`UdpEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub servers: Vec<SocketAddr>,
    /// Wait per transmission before moving on to the next server.
    pub timeout: Duration,
    /// Passes over the server list before a query fails with TEMPFAIL.
    pub attempts: u32,
}

impl EngineSettings {
    pub fn from_config(config: &ResolverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            servers: config.server_addrs()?,
            timeout: Duration::from_millis(config.timeout_ms),
            attempts: config.attempts,
        })
    }
}

struct InFlight {
    context: RequestContext,
    qname: String,
    packet: Vec<u8>,
    /// Server list as it was at submission; later `add_server` calls leave
    /// it alone.
    servers: Rc<[SocketAddr]>,
    server: usize,
    sent: u32,
    deadline: Instant,
}

/// Stub resolver over a single non-blocking UDP socket.
///
/// Queries are matched to responses by message ID, source address and
/// question. Each transmission waits `timeout`; a timeout or a server
/// failure moves the query on to the next server until every server was
/// tried `attempts` times. A query keeps the server list it was submitted
/// with, so `add_server` only affects later submissions.
pub struct UdpEngine {
    settings: EngineSettings,
    servers: Rc<[SocketAddr]>,
    custom_servers: bool,
    socket: Option<ResolverSocket>,
    inflight: HashMap<u16, InFlight>,
    recv_buf: Vec<u8>,
}

impl UdpEngine {
    pub fn new(settings: EngineSettings) -> Result<Self, SessionError> {
        if settings.servers.is_empty() {
            return Err(SessionError::EngineCreation(
                "no nameservers configured".to_string(),
            ));
        }
        if settings.attempts == 0 || settings.timeout.is_zero() {
            return Err(SessionError::EngineCreation(
                "timeout and attempts must be non-zero".to_string(),
            ));
        }

        let servers = Self::default_servers(&settings);

        Ok(Self {
            settings,
            servers,
            custom_servers: false,
            socket: None,
            inflight: HashMap::new(),
            recv_buf: vec![0u8; RECV_BUFFER_SIZE],
        })
    }

    pub fn from_config(config: &ResolverConfig) -> Result<Self, SessionError> {
        let settings = EngineSettings::from_config(config)
            .map_err(|e| SessionError::EngineCreation(e.to_string()))?;
        Self::new(settings)
    }

    pub fn servers(&self) -> &[SocketAddr] {
        &self.servers
    }

    fn default_servers(settings: &EngineSettings) -> Rc<[SocketAddr]> {
        let count = settings.servers.len().min(MAX_SERVERS);
        Rc::from(&settings.servers[..count])
    }

    fn allocate_id(&self) -> Result<u16, EngineStatus> {
        if self.inflight.len() > u16::MAX as usize {
            return Err(EngineStatus::NOMEM);
        }
        loop {
            let id = fastrand::u16(..);
            if !self.inflight.contains_key(&id) {
                return Ok(id);
            }
        }
    }

    fn try_budget(&self, server_count: usize) -> u32 {
        self.settings
            .attempts
            .saturating_mul(server_count.max(1) as u32)
    }

    fn transmit(&self, id: u16, query: &mut InFlight, now: Instant) {
        let server = query.servers[query.server % query.servers.len()];
        query.sent += 1;
        query.deadline = now + self.settings.timeout;

        let Some(socket) = &self.socket else {
            return;
        };
        match socket.send_to(&query.packet, server) {
            Ok(_) => debug!(
                id,
                server = %server,
                attempt = query.sent,
                kind = %query.context.kind(),
                "Query sent"
            ),
            // Left for the deadline to retry.
            Err(e) => debug!(id, server = %server, error = %e, "Query send failed"),
        }
    }

    /// Moves the query on to the next server, or reports TEMPFAIL once the
    /// budget is spent.
    fn retry_or_fail(
        &mut self,
        id: u16,
        mut query: InFlight,
        now: Instant,
        events: &mut EngineEvents,
    ) {
        if query.sent >= self.try_budget(query.servers.len()) {
            debug!(id, qname = %query.qname, tries = query.sent, "Query exhausted all servers");
            events.complete(query.context, EngineStatus::TEMPFAIL, None);
            return;
        }

        query.server += 1;
        self.transmit(id, &mut query, now);
        self.inflight.insert(id, query);
    }

    fn next_timer(&self, now: Instant) -> TimerRequest {
        match self.inflight.values().map(|q| q.deadline).min() {
            Some(deadline) => TimerRequest::Arm(deadline.saturating_duration_since(now)),
            None => TimerRequest::Cancel,
        }
    }

    fn handle_datagram(
        &mut self,
        len: usize,
        from: SocketAddr,
        now: Instant,
        events: &mut EngineEvents,
    ) {
        if len < 12 {
            warn!(from = %from, len, "Ignoring runt datagram");
            return;
        }

        let id = u16::from_be_bytes([self.recv_buf[0], self.recv_buf[1]]);
        let Some(query) = self.inflight.get(&id) else {
            debug!(id, from = %from, "Ignoring response for unknown query");
            return;
        };

        // Late answers from a server tried earlier are as good as any.
        if !query.servers.contains(&from) {
            warn!(id, from = %from, "Ignoring response from unexpected source");
            return;
        }

        let parsed =
            ResponseParser::parse(&self.recv_buf[..len], &query.qname, query.context.kind());

        if parsed == ParsedResponse::Mismatch {
            warn!(id, from = %from, "Ignoring response to a different question");
            return;
        }

        let Some(query) = self.inflight.remove(&id) else {
            return;
        };

        match parsed {
            ParsedResponse::Answer(records) => {
                events.complete(query.context, EngineStatus::OK, Some(records))
            }
            ParsedResponse::NxDomain => events.complete(query.context, EngineStatus::NXDOMAIN, None),
            ParsedResponse::NoData => events.complete(query.context, EngineStatus::NODATA, None),
            ParsedResponse::Malformed => {
                events.complete(query.context, EngineStatus::PROTOCOL, None)
            }
            ParsedResponse::ServerFailure(rcode) => {
                debug!(id, from = %from, rcode = ?rcode, "Server failure, trying next server");
                self.retry_or_fail(id, query, now, events);
            }
            ParsedResponse::Mismatch => {}
        }
    }
}

impl ResolverEngine for UdpEngine {
    fn open(&mut self) -> Result<(), SessionError> {
        if self.socket.is_some() {
            return Ok(());
        }

        let socket =
            ResolverSocket::bind().map_err(|e| SessionError::EngineOpen(e.to_string()))?;
        info!(
            servers = ?self.servers,
            timeout_ms = self.settings.timeout.as_millis() as u64,
            attempts = self.settings.attempts,
            "UDP resolver engine opened"
        );
        self.socket = Some(socket);
        Ok(())
    }

    fn descriptor(&self) -> RawFd {
        self.socket
            .as_ref()
            .map(|s| s.get_ref().as_raw_fd())
            .unwrap_or(-1)
    }

    fn submit(
        &mut self,
        request: &EngineRequest,
        context: RequestContext,
        events: &mut EngineEvents,
    ) -> Result<(), EngineStatus> {
        if self.socket.is_none() {
            return Err(EngineStatus::TEMPFAIL);
        }

        let qname = MessageBuilder::query_name(request);
        let id = self.allocate_id()?;
        let packet = MessageBuilder::build_query(id, &qname, request.kind())?;

        let now = Instant::now();
        let mut query = InFlight {
            context,
            qname,
            packet,
            servers: Rc::clone(&self.servers),
            server: 0,
            sent: 0,
            deadline: now,
        };
        self.transmit(id, &mut query, now);
        self.inflight.insert(id, query);

        events.reprogram_timer(self.next_timer(now));
        Ok(())
    }

    fn pump_io(&mut self, events: &mut EngineEvents) {
        let now = Instant::now();

        loop {
            let received = match &self.socket {
                Some(socket) => socket.recv_from(&mut self.recv_buf),
                None => return,
            };

            match received {
                Ok((len, from)) => self.handle_datagram(len, from, now, events),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // ICMP errors surface here on some platforms; the deadline
                // takes care of the affected query.
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset
                    ) =>
                {
                    debug!(error = %e, "UDP receive error");
                    continue;
                }
                Err(e) => {
                    debug!(error = %e, "UDP receive error");
                    break;
                }
            }
        }

        events.reprogram_timer(self.next_timer(now));
    }

    fn pump_timeouts(&mut self, events: &mut EngineEvents) {
        let now = Instant::now();

        let expired: Vec<u16> = self
            .inflight
            .iter()
            .filter(|(_, q)| q.deadline <= now)
            .map(|(id, _)| *id)
            .collect();

        for id in expired {
            if let Some(query) = self.inflight.remove(&id) {
                debug!(id, qname = %query.qname, "Query timed out");
                self.retry_or_fail(id, query, now, events);
            }
        }

        events.reprogram_timer(self.next_timer(now));
    }

    fn active(&self) -> usize {
        self.inflight.len()
    }

    fn add_server(&mut self, server: Option<SocketAddr>) -> Result<(), SessionError> {
        let Some(server) = server else {
            self.servers = Self::default_servers(&self.settings);
            self.custom_servers = false;
            return Ok(());
        };

        let mut servers = if self.custom_servers {
            self.servers.to_vec()
        } else {
            Vec::new()
        };
        if servers.len() >= MAX_SERVERS {
            return Err(SessionError::ServerConfig(format!(
                "at most {} servers are supported",
                MAX_SERVERS
            )));
        }

        servers.push(server);
        self.servers = servers.into();
        self.custom_servers = true;
        Ok(())
    }
}
