pub mod dns_server_mock;
pub mod responses;

pub use dns_server_mock::MockDnsServer;
pub use responses::{answer, query_message, rcode_only};
