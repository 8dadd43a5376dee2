//! Mapping between `loopdns_domain::RecordKind` and `hickory_proto::rr::RecordType`

use hickory_proto::rr::RecordType as HickoryRecordType;
use loopdns_domain::RecordKind;

pub struct RecordTypeMapper;

impl RecordTypeMapper {
    pub fn to_hickory(kind: RecordKind) -> HickoryRecordType {
        match kind {
            RecordKind::A => HickoryRecordType::A,
            RecordKind::AAAA => HickoryRecordType::AAAA,
            RecordKind::PTR => HickoryRecordType::PTR,
            RecordKind::MX => HickoryRecordType::MX,
            RecordKind::TXT => HickoryRecordType::TXT,
            RecordKind::SRV => HickoryRecordType::SRV,
            RecordKind::NAPTR => HickoryRecordType::NAPTR,
            RecordKind::NS => HickoryRecordType::NS,
        }
    }
}
