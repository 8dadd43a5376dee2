use loopdns_application::{ResolverEngine, Session};
use loopdns_domain::{ResolverConfig, SessionError};
use std::cell::RefCell;
use std::future::Future;
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::rc::Rc;
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tracing::{debug, info};

use super::timer::LoopTimer;
use crate::engine::UdpEngine;

pub type LoopSession = Session<UdpEngine, LoopTimer>;

/// Borrowed descriptor; the engine owns and closes the socket, so the
/// session must outlive the [`EventLoop`] registered on it.
struct Descriptor(RawFd);

impl AsRawFd for Descriptor {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

/// Drives one session from a tokio `LocalSet`.
///
/// Each turn waits for the first of: the session descriptor turning
/// readable, the [`LoopTimer`] deadline passing, or the timer being
/// re-armed. Deliveries are flushed after the session borrow is released,
/// so continuations may submit or cancel queries on the same session.
///
/// The loop watches the session's descriptor without owning it. Drop the
/// loop first: a session dropped earlier closes the socket while the reactor
/// still has it registered. Bindings from [`EventLoop::connect`] already drop
/// in that order.
pub struct EventLoop {
    fd: AsyncFd<Descriptor>,
    timer: LoopTimer,
}

impl EventLoop {
    /// Registers the session's descriptor with the reactor. `timer` must be
    /// the one the session was built with, and the session must stay alive
    /// for as long as the returned loop.
    pub fn new<E: ResolverEngine>(
        session: &Session<E, LoopTimer>,
        timer: LoopTimer,
    ) -> io::Result<Self> {
        let fd = AsyncFd::with_interest(Descriptor(session.descriptor()), Interest::READABLE)?;
        Ok(Self { fd, timer })
    }

    /// Opens a UDP-engine session from `config` together with its loop.
    pub fn connect(
        config: &ResolverConfig,
    ) -> Result<(Rc<RefCell<LoopSession>>, Self), SessionError> {
        let engine = UdpEngine::from_config(config)?;
        let timer = LoopTimer::new();
        let session = Session::new(engine, timer.clone())?;
        let event_loop =
            Self::new(&session, timer).map_err(|e| SessionError::EngineOpen(e.to_string()))?;

        info!(
            descriptor = session.descriptor(),
            servers = ?session.engine().servers(),
            "Event loop attached"
        );
        Ok((Rc::new(RefCell::new(session)), event_loop))
    }

    /// Pumps the session until `shutdown` completes.
    pub async fn run<E, F>(
        &self,
        session: &RefCell<Session<E, LoopTimer>>,
        shutdown: F,
    ) -> io::Result<()>
    where
        E: ResolverEngine,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            let deliveries = session.borrow_mut().take_deliveries();
            deliveries.flush();
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Event loop shutting down");
                    return Ok(());
                }
                result = self.turn(session) => result?,
            }
        }
    }

    /// Pumps the session until no completion is outstanding, cancelled
    /// queries included, and every continuation has run.
    pub async fn run_until_idle<E: ResolverEngine>(
        &self,
        session: &RefCell<Session<E, LoopTimer>>,
    ) -> io::Result<()> {
        loop {
            // Continuations may submit more work.
            let deliveries = session.borrow_mut().take_deliveries();
            if !deliveries.is_empty() {
                deliveries.flush();
                continue;
            }
            if session.borrow().pending_count() == 0 {
                return Ok(());
            }
            self.turn(session).await?;
        }
    }

    async fn turn<E: ResolverEngine>(
        &self,
        session: &RefCell<Session<E, LoopTimer>>,
    ) -> io::Result<()> {
        let deadline = self.timer.deadline();
        let expired = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            guard = self.fd.readable() => {
                let mut guard = guard?;
                let deliveries = session.borrow_mut().readiness_pump();
                guard.clear_ready();
                deliveries.flush();
            }
            _ = expired => {
                self.timer.fire();
                let deliveries = session.borrow_mut().timeout_pump();
                deliveries.flush();
            }
            _ = self.timer.changed() => {}
        }
        Ok(())
    }
}
