use loopdns_domain::ResolveError;
use tracing::{debug, trace};

use super::classifier::ErrorClassifier;
use super::decoder::RecordDecoder;
use super::registry::{EntryState, Registry};
use crate::ports::Completion;
use crate::query::{Deliveries, Outcome, Query};

/// What happened to one engine completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Succeeded,
    Failed(ResolveError),
    /// The query is no longer tracked.
    Stale,
    /// The query was cancelled while in flight.
    Discarded,
}

/// Routes engine completions to the query handles they belong to.
pub struct CompletionDispatcher;

impl CompletionDispatcher {
    /// Settles the query a completion belongs to, at most once, and queues
    /// its continuations on `ready`. Stale and cancelled completions are
    /// dropped without touching any handle.
    pub fn dispatch(
        registry: &mut Registry,
        completion: Completion,
        ready: &mut Deliveries,
    ) -> Dispatch {
        let Completion {
            context,
            status,
            records,
        } = completion;

        let (state, query) = match registry.remove(context.token) {
            Some(entry) => entry,
            None => {
                trace!(kind = %context.kind(), "Dropping completion for untracked query");
                drop(records);
                return Dispatch::Stale;
            }
        };

        if state == EntryState::Cancelled {
            trace!(kind = %context.kind(), "Dropping completion for cancelled query");
            drop(records);
            return Dispatch::Discarded;
        }

        if status.is_failure() {
            drop(records);
            let error = ErrorClassifier::classify(status);
            debug!(
                kind = %context.kind(),
                status = status.code(),
                error = error.as_str(),
                "Query failed"
            );
            settle(&query, Err(error), ready);
            return Dispatch::Failed(error);
        }

        match records {
            Some(raw) if raw.kind() == context.kind() => {
                let records = RecordDecoder::decode(raw);
                debug_assert!(records.matches_kind(context.kind()));
                debug!(
                    kind = %context.kind(),
                    records = records.len(),
                    "Query resolved"
                );
                settle(&query, Ok(records), ready);
                Dispatch::Succeeded
            }
            other => {
                debug!(
                    kind = %context.kind(),
                    raw_kind = ?other.as_ref().map(|r| r.kind()),
                    "Successful completion without matching records"
                );
                drop(other);
                settle(&query, Err(ResolveError::ProtocolError), ready);
                Dispatch::Failed(ResolveError::ProtocolError)
            }
        }
    }
}

fn settle(query: &Query, outcome: Outcome, ready: &mut Deliveries) {
    if let Some(delivery) = query.settle(outcome) {
        ready.push(delivery);
    }
}
