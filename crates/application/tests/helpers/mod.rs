pub mod mock_engine;
pub mod recording_timer;

pub use mock_engine::{EngineHandle, MockEngine};
pub use recording_timer::{RecordingTimer, TimerEvent, TimerLog};
