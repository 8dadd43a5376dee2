use std::time::Duration;

/// What the engine wants the event loop's one-shot timer to become.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerRequest {
    Arm(Duration),
    Cancel,
}

impl TimerRequest {
    /// Negative delays cancel the timer.
    pub fn from_millis(delay: i64) -> Self {
        if delay < 0 {
            TimerRequest::Cancel
        } else {
            TimerRequest::Arm(Duration::from_millis(delay as u64))
        }
    }
}

/// One-shot timers owned by the host event loop. Firing a timer must end in
/// a call to `Session::timeout_pump`.
pub trait TimerControl {
    type Timer;

    fn arm(&mut self, delay: Duration) -> Self::Timer;

    /// Cancelling a timer that already fired is a no-op.
    fn cancel(&mut self, timer: Self::Timer);
}
