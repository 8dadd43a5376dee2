use loopdns_application::TimerControl;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Identifies one arming of a [`LoopTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

struct TimerState {
    deadline: Cell<Option<Instant>>,
    generation: Cell<u64>,
    changed: Notify,
}

/// The event loop's single one-shot timer.
///
/// Clones share one deadline: the session arms and cancels it through
/// [`TimerControl`] while the [`EventLoop`](super::EventLoop) sleeps on it.
#[derive(Clone)]
pub struct LoopTimer {
    state: Rc<TimerState>,
}

impl LoopTimer {
    pub fn new() -> Self {
        Self {
            state: Rc::new(TimerState {
                deadline: Cell::new(None),
                generation: Cell::new(0),
                changed: Notify::new(),
            }),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.state.deadline.get()
    }

    pub fn is_armed(&self) -> bool {
        self.state.deadline.get().is_some()
    }

    /// Disarms the timer once its deadline has been acted on.
    pub(crate) fn fire(&self) {
        self.state.deadline.set(None);
    }

    /// Resolves after the next arm or cancel.
    pub(crate) async fn changed(&self) {
        self.state.changed.notified().await;
    }
}

impl Default for LoopTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerControl for LoopTimer {
    type Timer = TimerToken;

    fn arm(&mut self, delay: Duration) -> TimerToken {
        let generation = self.state.generation.get().wrapping_add(1);
        self.state.generation.set(generation);
        self.state.deadline.set(Some(Instant::now() + delay));
        self.state.changed.notify_one();
        TimerToken(generation)
    }

    fn cancel(&mut self, timer: TimerToken) {
        // A token from an earlier arming must not disarm the current one.
        if timer.0 == self.state.generation.get() {
            self.state.deadline.set(None);
            self.state.changed.notify_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_and_cancel() {
        let mut timer = LoopTimer::new();
        assert!(!timer.is_armed());

        let token = timer.arm(Duration::from_millis(50));
        assert!(timer.is_armed());

        timer.cancel(token);
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_stale_cancel_keeps_new_deadline() {
        let mut timer = LoopTimer::new();
        let old = timer.arm(Duration::from_secs(1));
        let current = timer.arm(Duration::from_millis(10));
        assert_ne!(old, current);

        timer.cancel(old);
        assert!(timer.is_armed());
    }

    #[test]
    fn test_clones_share_deadline() {
        let mut timer = LoopTimer::new();
        let observer = timer.clone();

        timer.arm(Duration::from_millis(5));
        assert_eq!(observer.deadline(), timer.deadline());

        observer.fire();
        assert!(!timer.is_armed());
    }
}
