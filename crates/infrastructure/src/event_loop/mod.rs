pub mod driver;
pub mod timer;

pub use driver::{EventLoop, LoopSession};
pub use timer::{LoopTimer, TimerToken};
