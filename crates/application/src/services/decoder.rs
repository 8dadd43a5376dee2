use loopdns_domain::{MxRecord, NaptrRecord, RecordSet, SrvRecord};

use crate::ports::RawRecords;

/// Turns engine answer buffers into typed record sets.
///
/// Records keep the order the engine reported them in; callers that need
/// priority or weight ordering sort explicitly.
pub struct RecordDecoder;

impl RecordDecoder {
    /// Consumes the buffer; it is released when decoding returns.
    pub fn decode(raw: RawRecords) -> RecordSet {
        match raw {
            RawRecords::A(addrs) => {
                RecordSet::Addresses(addrs.iter().map(ToString::to_string).collect())
            }
            RawRecords::AAAA(addrs) => {
                RecordSet::Addresses(addrs.iter().map(ToString::to_string).collect())
            }
            RawRecords::PTR(names) | RawRecords::NS(names) => {
                RecordSet::Names(names.iter().map(|n| n.to_string()).collect())
            }
            RawRecords::TXT(texts) => RecordSet::Texts(texts.iter().map(|t| t.to_vec()).collect()),
            RawRecords::MX(entries) => RecordSet::Mx(
                entries
                    .iter()
                    .map(|mx| MxRecord {
                        domain: mx.name.clone(),
                        priority: mx.priority,
                    })
                    .collect(),
            ),
            RawRecords::SRV(entries) => RecordSet::Srv(
                entries
                    .iter()
                    .map(|srv| SrvRecord {
                        domain: srv.name.clone(),
                        priority: srv.priority,
                        weight: srv.weight,
                        port: srv.port,
                    })
                    .collect(),
            ),
            RawRecords::NAPTR(entries) => RecordSet::Naptr(
                entries
                    .iter()
                    .map(|naptr| NaptrRecord {
                        order: naptr.order,
                        preference: naptr.preference,
                        flags: naptr.flags.clone(),
                        service: naptr.service.clone(),
                        regexp: non_empty(&naptr.regexp),
                        replacement: non_empty(&naptr.replacement),
                    })
                    .collect(),
            ),
        }
    }
}

fn non_empty(field: &str) -> Option<String> {
    if field.is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}
