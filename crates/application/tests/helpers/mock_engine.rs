#![allow(dead_code)]

use loopdns_application::{
    EngineEvents, EngineRequest, EngineStatus, RawRecords, RequestContext, ResolverEngine,
    TimerRequest,
};
use loopdns_domain::SessionError;
use std::cell::RefCell;
use std::net::SocketAddr;
use std::os::fd::RawFd;
use std::rc::Rc;

pub const MOCK_DESCRIPTOR: RawFd = 42;

#[derive(Default)]
struct EngineState {
    open_error: Option<String>,
    reject_with: Option<EngineStatus>,
    complete_on_submit: Option<(EngineStatus, Option<RawRecords>)>,
    timer_on_submit: Option<TimerRequest>,
    timer_on_pump: Option<TimerRequest>,
    submissions: Vec<(EngineRequest, RequestContext)>,
    queued: Vec<(RequestContext, EngineStatus, Option<RawRecords>)>,
    outstanding: Vec<RequestContext>,
    servers: Vec<Option<SocketAddr>>,
    io_pumps: usize,
    timeout_pumps: usize,
    dropped: bool,
}

/// Scripted engine. Completions are queued through the paired
/// [`EngineHandle`] and reported on the next `pump_io`; `pump_timeouts`
/// expires everything still outstanding with TEMPFAIL.
pub struct MockEngine {
    state: Rc<RefCell<EngineState>>,
}

/// Test-side view of a [`MockEngine`] that survives the session owning it.
#[derive(Clone)]
pub struct EngineHandle {
    state: Rc<RefCell<EngineState>>,
}

impl MockEngine {
    pub fn new() -> (Self, EngineHandle) {
        let state = Rc::new(RefCell::new(EngineState::default()));
        (
            Self {
                state: state.clone(),
            },
            EngineHandle { state },
        )
    }
}

impl Drop for MockEngine {
    fn drop(&mut self) {
        self.state.borrow_mut().dropped = true;
    }
}

impl ResolverEngine for MockEngine {
    fn open(&mut self) -> Result<(), SessionError> {
        match self.state.borrow().open_error.clone() {
            Some(reason) => Err(SessionError::EngineOpen(reason)),
            None => Ok(()),
        }
    }

    fn descriptor(&self) -> RawFd {
        MOCK_DESCRIPTOR
    }

    fn submit(
        &mut self,
        request: &EngineRequest,
        context: RequestContext,
        events: &mut EngineEvents,
    ) -> Result<(), EngineStatus> {
        let mut state = self.state.borrow_mut();
        state.submissions.push((request.clone(), context));

        if let Some(status) = state.reject_with {
            return Err(status);
        }

        if let Some(timer) = state.timer_on_submit {
            events.reprogram_timer(timer);
        }

        match state.complete_on_submit.clone() {
            Some((status, records)) => events.complete(context, status, records),
            None => state.outstanding.push(context),
        }
        Ok(())
    }

    fn pump_io(&mut self, events: &mut EngineEvents) {
        let mut state = self.state.borrow_mut();
        state.io_pumps += 1;

        for (context, status, records) in std::mem::take(&mut state.queued) {
            state.outstanding.retain(|c| *c != context);
            events.complete(context, status, records);
        }

        if let Some(timer) = state.timer_on_pump {
            events.reprogram_timer(timer);
        }
    }

    fn pump_timeouts(&mut self, events: &mut EngineEvents) {
        let mut state = self.state.borrow_mut();
        state.timeout_pumps += 1;

        for context in std::mem::take(&mut state.outstanding) {
            events.complete(context, EngineStatus::TEMPFAIL, None);
        }
        events.reprogram_timer(TimerRequest::Cancel);
    }

    fn active(&self) -> usize {
        self.state.borrow().outstanding.len()
    }

    fn add_server(&mut self, server: Option<SocketAddr>) -> Result<(), SessionError> {
        self.state.borrow_mut().servers.push(server);
        Ok(())
    }
}

impl EngineHandle {
    pub fn fail_open(&self, reason: &str) {
        self.state.borrow_mut().open_error = Some(reason.to_string());
    }

    pub fn reject_submissions(&self, status: EngineStatus) {
        self.state.borrow_mut().reject_with = Some(status);
    }

    pub fn complete_on_submit(&self, status: EngineStatus, records: Option<RawRecords>) {
        self.state.borrow_mut().complete_on_submit = Some((status, records));
    }

    pub fn timer_on_submit(&self, request: TimerRequest) {
        self.state.borrow_mut().timer_on_submit = Some(request);
    }

    pub fn timer_on_pump(&self, request: TimerRequest) {
        self.state.borrow_mut().timer_on_pump = Some(request);
    }

    /// Queues a completion for the `index`-th submission.
    pub fn respond(&self, index: usize, status: EngineStatus, records: Option<RawRecords>) {
        let mut state = self.state.borrow_mut();
        let context = state.submissions[index].1;
        state.queued.push((context, status, records));
    }

    pub fn submissions(&self) -> Vec<EngineRequest> {
        self.state
            .borrow()
            .submissions
            .iter()
            .map(|(request, _)| request.clone())
            .collect()
    }

    pub fn context(&self, index: usize) -> RequestContext {
        self.state.borrow().submissions[index].1
    }

    pub fn servers(&self) -> Vec<Option<SocketAddr>> {
        self.state.borrow().servers.clone()
    }

    pub fn io_pumps(&self) -> usize {
        self.state.borrow().io_pumps
    }

    pub fn timeout_pumps(&self) -> usize {
        self.state.borrow().timeout_pumps
    }

    pub fn is_dropped(&self) -> bool {
        self.state.borrow().dropped
    }
}
