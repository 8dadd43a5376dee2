#![allow(dead_code)]

use loopdns_application::TimerControl;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Armed(u32, Duration),
    Cancelled(u32),
}

pub type TimerLog = Rc<RefCell<Vec<TimerEvent>>>;

/// Timer control that only records what the session asks of it.
pub struct RecordingTimer {
    next_id: u32,
    log: TimerLog,
}

impl RecordingTimer {
    pub fn new() -> (Self, TimerLog) {
        let log = TimerLog::default();
        (
            Self {
                next_id: 0,
                log: log.clone(),
            },
            log,
        )
    }
}

impl TimerControl for RecordingTimer {
    type Timer = u32;

    fn arm(&mut self, delay: Duration) -> u32 {
        self.next_id += 1;
        self.log
            .borrow_mut()
            .push(TimerEvent::Armed(self.next_id, delay));
        self.next_id
    }

    fn cancel(&mut self, timer: u32) {
        self.log.borrow_mut().push(TimerEvent::Cancelled(timer));
    }
}
