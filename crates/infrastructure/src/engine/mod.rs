pub mod message_builder;
pub mod record_type_map;
pub mod response_parser;
pub mod socket;
pub mod udp_engine;

pub use message_builder::MessageBuilder;
pub use record_type_map::RecordTypeMapper;
pub use response_parser::{ParsedResponse, ResponseParser};
pub use udp_engine::{EngineSettings, UdpEngine};
