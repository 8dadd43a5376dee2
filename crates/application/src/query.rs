use loopdns_domain::{RecordKind, RecordSet, ResolveError};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::ports::QueryToken;

pub type Outcome = Result<RecordSet, ResolveError>;

type SuccessFn = Box<dyn FnOnce(&RecordSet)>;
type FailureFn = Box<dyn FnOnce(ResolveError)>;

/// Caller-visible handle of one submitted query.
///
/// Clones share the same outcome slot, which is written at most once. The
/// outcome can be polled with [`Query::outcome`], observed through
/// continuations, or awaited. A cancelled query never settles.
#[derive(Clone)]
pub struct Query {
    inner: Rc<QueryInner>,
}

struct QueryInner {
    session: u64,
    kind: RecordKind,
    token: Cell<Option<QueryToken>>,
    slot: RefCell<Slot>,
}

#[derive(Default)]
struct Slot {
    outcome: Option<Outcome>,
    on_success: Vec<SuccessFn>,
    on_failure: Vec<FailureFn>,
    wakers: Vec<Waker>,
}

impl Query {
    pub(crate) fn new(session: u64, kind: RecordKind) -> Self {
        Self {
            inner: Rc::new(QueryInner {
                session,
                kind,
                token: Cell::new(None),
                slot: RefCell::new(Slot::default()),
            }),
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.inner.kind
    }

    pub fn is_settled(&self) -> bool {
        self.inner.slot.borrow().outcome.is_some()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.inner.slot.borrow().outcome.clone()
    }

    /// Runs `f` with the records once the query succeeds, or right away if
    /// it already has.
    pub fn on_success(&self, f: impl FnOnce(&RecordSet) + 'static) -> &Self {
        let mut slot = self.inner.slot.borrow_mut();
        match &slot.outcome {
            Some(Ok(records)) => {
                let records = records.clone();
                drop(slot);
                f(&records);
            }
            Some(Err(_)) => {}
            None => slot.on_success.push(Box::new(f)),
        }
        self
    }

    /// Runs `f` with the error once the query fails, or right away if it
    /// already has.
    pub fn on_failure(&self, f: impl FnOnce(ResolveError) + 'static) -> &Self {
        let mut slot = self.inner.slot.borrow_mut();
        match &slot.outcome {
            Some(Err(error)) => {
                let error = *error;
                drop(slot);
                f(error);
            }
            Some(Ok(_)) => {}
            None => slot.on_failure.push(Box::new(f)),
        }
        self
    }

    pub(crate) fn session_id(&self) -> u64 {
        self.inner.session
    }

    pub(crate) fn token(&self) -> Option<QueryToken> {
        self.inner.token.get()
    }

    pub(crate) fn bind(&self, token: QueryToken) {
        self.inner.token.set(Some(token));
    }

    /// Writes the outcome slot and hands back the continuations and wakers
    /// to run. Returns `None`, leaving the slot untouched, when an outcome
    /// was already delivered.
    pub(crate) fn settle(&self, outcome: Outcome) -> Option<Delivery> {
        let mut slot = self.inner.slot.borrow_mut();
        if slot.outcome.is_some() {
            return None;
        }
        slot.outcome = Some(outcome.clone());
        Some(Delivery {
            outcome,
            on_success: std::mem::take(&mut slot.on_success),
            on_failure: std::mem::take(&mut slot.on_failure),
            wakers: std::mem::take(&mut slot.wakers),
        })
    }
}

/// Continuations and wakers of one settled query.
pub(crate) struct Delivery {
    outcome: Outcome,
    on_success: Vec<SuccessFn>,
    on_failure: Vec<FailureFn>,
    wakers: Vec<Waker>,
}

impl Delivery {
    pub(crate) fn run(self) {
        match &self.outcome {
            Ok(records) => self.on_success.into_iter().for_each(|f| f(records)),
            Err(error) => self.on_failure.into_iter().for_each(|f| f(*error)),
        }
        self.wakers.into_iter().for_each(Waker::wake);
    }
}

/// Outcomes settled during a session call whose continuations have not run
/// yet.
///
/// The session hands these out instead of running continuations itself, so
/// callers flush them once they no longer borrow the session. Continuations
/// are then free to submit or cancel queries.
#[must_use = "continuations and awaiting tasks only run when the deliveries are flushed"]
#[derive(Default)]
pub struct Deliveries {
    ready: Vec<Delivery>,
}

impl Deliveries {
    pub(crate) fn push(&mut self, delivery: Delivery) {
        self.ready.push(delivery);
    }

    pub fn len(&self) -> usize {
        self.ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }

    /// Runs continuations in settlement order, then wakes awaiting tasks.
    pub fn flush(self) {
        for delivery in self.ready {
            delivery.run();
        }
    }
}

impl fmt::Debug for Deliveries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deliveries")
            .field("ready", &self.ready.len())
            .finish()
    }
}

impl Future for Query {
    type Output = Outcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.inner.slot.borrow_mut();
        match &slot.outcome {
            Some(outcome) => Poll::Ready(outcome.clone()),
            None => {
                // Every clone awaiting the outcome gets woken.
                if !slot.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    slot.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("kind", &self.inner.kind)
            .field("token", &self.inner.token.get())
            .field("outcome", &self.inner.slot.borrow().outcome)
            .finish()
    }
}
