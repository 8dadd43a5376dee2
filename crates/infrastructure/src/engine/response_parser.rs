use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::{Name, RData, Record};
use loopdns_application::ports::{RawMx, RawNaptr, RawSrv};
use loopdns_application::RawRecords;
use loopdns_domain::RecordKind;
use tracing::debug;

use super::record_type_map::RecordTypeMapper;

/// What one datagram means for the query it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResponse {
    Answer(RawRecords),
    NxDomain,
    NoData,
    /// SERVFAIL, REFUSED, NOTIMP or a truncated answer: worth asking the
    /// next server.
    ServerFailure(ResponseCode),
    /// FORMERR, an unexpected rcode, or undecodable answer data.
    Malformed,
    /// Not a response to the question that was asked.
    Mismatch,
}

pub struct ResponseParser;

impl ResponseParser {
    /// Interprets `bytes` as the answer to `qname`/`kind`. Answers of other
    /// types (CNAME chains, for instance) are skipped.
    pub fn parse(bytes: &[u8], qname: &str, kind: RecordKind) -> ParsedResponse {
        let message = match Message::from_vec(bytes) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, "Failed to parse DNS response");
                return ParsedResponse::Malformed;
            }
        };

        if message.message_type() != MessageType::Response
            || !Self::question_matches(&message, qname, kind)
        {
            return ParsedResponse::Mismatch;
        }

        let rcode = message.response_code();
        match rcode {
            ResponseCode::NoError => {}
            ResponseCode::NXDomain => return ParsedResponse::NxDomain,
            ResponseCode::ServFail | ResponseCode::Refused | ResponseCode::NotImp => {
                return ParsedResponse::ServerFailure(rcode)
            }
            _ => return ParsedResponse::Malformed,
        }

        let wanted = RecordTypeMapper::to_hickory(kind);
        let answers: Vec<&Record> = message
            .answers()
            .iter()
            .filter(|record| record.record_type() == wanted)
            .collect();

        debug!(
            rcode = ?rcode,
            kind = %kind,
            total = message.answers().len(),
            matching = answers.len(),
            truncated = message.truncated(),
            "DNS response parsed"
        );

        if answers.is_empty() {
            return if message.truncated() {
                ParsedResponse::ServerFailure(rcode)
            } else {
                ParsedResponse::NoData
            };
        }

        match Self::collect(kind, &answers) {
            Some(records) => ParsedResponse::Answer(records),
            None => ParsedResponse::Malformed,
        }
    }

    fn question_matches(message: &Message, qname: &str, kind: RecordKind) -> bool {
        message.queries().first().is_some_and(|query| {
            query.query_type() == RecordTypeMapper::to_hickory(kind)
                && name_text(query.name()).eq_ignore_ascii_case(qname.trim_end_matches('.'))
        })
    }

    /// `None` when an answer of the requested type carries other data.
    fn collect(kind: RecordKind, answers: &[&Record]) -> Option<RawRecords> {
        let records = match kind {
            RecordKind::A => RawRecords::A(
                answers
                    .iter()
                    .map(|r| match r.data() {
                        RData::A(a) => Some(a.0),
                        _ => None,
                    })
                    .collect::<Option<_>>()?,
            ),
            RecordKind::AAAA => RawRecords::AAAA(
                answers
                    .iter()
                    .map(|r| match r.data() {
                        RData::AAAA(aaaa) => Some(aaaa.0),
                        _ => None,
                    })
                    .collect::<Option<_>>()?,
            ),
            RecordKind::PTR => RawRecords::PTR(
                answers
                    .iter()
                    .map(|r| match r.data() {
                        RData::PTR(ptr) => Some(name_text(ptr)),
                        _ => None,
                    })
                    .collect::<Option<_>>()?,
            ),
            RecordKind::NS => RawRecords::NS(
                answers
                    .iter()
                    .map(|r| match r.data() {
                        RData::NS(ns) => Some(name_text(ns)),
                        _ => None,
                    })
                    .collect::<Option<_>>()?,
            ),
            RecordKind::MX => RawRecords::MX(
                answers
                    .iter()
                    .map(|r| match r.data() {
                        RData::MX(mx) => Some(RawMx {
                            name: name_text(mx.exchange()),
                            priority: mx.preference(),
                        }),
                        _ => None,
                    })
                    .collect::<Option<_>>()?,
            ),
            RecordKind::TXT => RawRecords::TXT(
                answers
                    .iter()
                    .map(|r| match r.data() {
                        RData::TXT(txt) => Some(
                            txt.txt_data()
                                .iter()
                                .flat_map(|chunk| chunk.iter().copied())
                                .collect(),
                        ),
                        _ => None,
                    })
                    .collect::<Option<_>>()?,
            ),
            RecordKind::SRV => RawRecords::SRV(
                answers
                    .iter()
                    .map(|r| match r.data() {
                        RData::SRV(srv) => Some(RawSrv {
                            name: name_text(srv.target()),
                            priority: srv.priority(),
                            weight: srv.weight(),
                            port: srv.port(),
                        }),
                        _ => None,
                    })
                    .collect::<Option<_>>()?,
            ),
            RecordKind::NAPTR => RawRecords::NAPTR(
                answers
                    .iter()
                    .map(|r| match r.data() {
                        RData::NAPTR(naptr) => Some(RawNaptr {
                            order: naptr.order(),
                            preference: naptr.preference(),
                            flags: String::from_utf8_lossy(naptr.flags()).into_owned(),
                            service: String::from_utf8_lossy(naptr.services()).into_owned(),
                            regexp: String::from_utf8_lossy(naptr.regexp()).into_owned(),
                            replacement: name_text(naptr.replacement()),
                        }),
                        _ => None,
                    })
                    .collect::<Option<_>>()?,
            ),
        };
        Some(records)
    }
}

/// Presentation form without the trailing dot; the root name is empty.
fn name_text(name: &Name) -> String {
    name.to_utf8().trim_end_matches('.').to_string()
}
