pub mod record_kind;
pub mod record_set;

pub use record_kind::RecordKind;
pub use record_set::{MxRecord, NaptrRecord, RecordSet, SrvRecord};
