//! Adapters: a non-blocking UDP resolver engine built on `hickory-proto`
//! and a tokio event loop that drives a session over it.
pub mod engine;
pub mod event_loop;

pub use engine::{EngineSettings, UdpEngine};
pub use event_loop::{EventLoop, LoopSession, LoopTimer};
