mod helpers;

use helpers::{answer, query_message, rcode_only};
use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA, CNAME, MX, NAPTR, NS, PTR, SRV, TXT};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use hickory_proto::serialize::binary::BinEncodable;
use loopdns_application::ports::{RawMx, RawNaptr, RawSrv};
use loopdns_application::RawRecords;
use loopdns_domain::RecordKind;
use loopdns_infrastructure::engine::{ParsedResponse, ResponseParser};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

fn name(s: &str) -> Name {
    Name::from_str(s).unwrap()
}

fn wire(message: &Message) -> Vec<u8> {
    message.to_vec().unwrap()
}

fn parse(response: &Message, qname: &str, kind: RecordKind) -> ParsedResponse {
    ResponseParser::parse(&wire(response), qname, kind)
}

// ── answers ────────────────────────────────────────────────────────────────

#[test]
fn test_a_answer() {
    let query = query_message(1, "example.com", RecordType::A);
    let response = answer(
        &query,
        vec![
            RData::A(A(Ipv4Addr::new(192, 0, 2, 1))),
            RData::A(A(Ipv4Addr::new(192, 0, 2, 2))),
        ],
    );

    assert_eq!(
        parse(&response, "example.com", RecordKind::A),
        ParsedResponse::Answer(RawRecords::A(vec![
            Ipv4Addr::new(192, 0, 2, 1),
            Ipv4Addr::new(192, 0, 2, 2),
        ]))
    );
}

#[test]
fn test_question_match_ignores_case_and_trailing_dot() {
    let query = query_message(1, "Example.COM", RecordType::AAAA);
    let response = answer(&query, vec![RData::AAAA(AAAA(Ipv6Addr::LOCALHOST))]);

    assert_eq!(
        parse(&response, "example.com.", RecordKind::AAAA),
        ParsedResponse::Answer(RawRecords::AAAA(vec![Ipv6Addr::LOCALHOST]))
    );
}

#[test]
fn test_cname_chain_is_skipped() {
    let query = query_message(1, "www.example.com", RecordType::A);
    let mut response = answer(&query, vec![]);
    response.add_answer(Record::from_rdata(
        name("www.example.com."),
        300,
        RData::CNAME(CNAME(name("cdn.example.net."))),
    ));
    response.add_answer(Record::from_rdata(
        name("cdn.example.net."),
        300,
        RData::A(A(Ipv4Addr::new(198, 51, 100, 7))),
    ));

    assert_eq!(
        parse(&response, "www.example.com", RecordKind::A),
        ParsedResponse::Answer(RawRecords::A(vec![Ipv4Addr::new(198, 51, 100, 7)]))
    );
}

#[test]
fn test_mx_answer() {
    let query = query_message(1, "example.com", RecordType::MX);
    let response = answer(
        &query,
        vec![
            RData::MX(MX::new(20, name("mx2.example.com."))),
            RData::MX(MX::new(10, name("mx1.example.com."))),
        ],
    );

    assert_eq!(
        parse(&response, "example.com", RecordKind::MX),
        ParsedResponse::Answer(RawRecords::MX(vec![
            RawMx {
                name: "mx2.example.com".to_string(),
                priority: 20,
            },
            RawMx {
                name: "mx1.example.com".to_string(),
                priority: 10,
            },
        ]))
    );
}

#[test]
fn test_txt_strings_are_joined_per_record() {
    let query = query_message(1, "example.com", RecordType::TXT);
    let response = answer(
        &query,
        vec![
            RData::TXT(TXT::new(vec!["v=spf1 ".to_string(), "-all".to_string()])),
            RData::TXT(TXT::new(vec!["hello".to_string()])),
        ],
    );

    assert_eq!(
        parse(&response, "example.com", RecordKind::TXT),
        ParsedResponse::Answer(RawRecords::TXT(vec![
            b"v=spf1 -all".to_vec(),
            b"hello".to_vec(),
        ]))
    );
}

#[test]
fn test_srv_answer() {
    let query = query_message(1, "_sip._udp.example.com", RecordType::SRV);
    let response = answer(
        &query,
        vec![RData::SRV(SRV::new(1, 50, 5060, name("sip.example.com.")))],
    );

    assert_eq!(
        parse(&response, "_sip._udp.example.com", RecordKind::SRV),
        ParsedResponse::Answer(RawRecords::SRV(vec![RawSrv {
            name: "sip.example.com".to_string(),
            priority: 1,
            weight: 50,
            port: 5060,
        }]))
    );
}

#[test]
fn test_naptr_root_replacement_is_empty() {
    let query = query_message(1, "4.3.2.1.e164.arpa", RecordType::NAPTR);
    let response = answer(
        &query,
        vec![RData::NAPTR(NAPTR::new(
            100,
            10,
            b"u".to_vec().into_boxed_slice(),
            b"E2U+sip".to_vec().into_boxed_slice(),
            b"!^.*$!sip:info@example.com!".to_vec().into_boxed_slice(),
            Name::root(),
        ))],
    );

    assert_eq!(
        parse(&response, "4.3.2.1.e164.arpa", RecordKind::NAPTR),
        ParsedResponse::Answer(RawRecords::NAPTR(vec![RawNaptr {
            order: 100,
            preference: 10,
            flags: "u".to_string(),
            service: "E2U+sip".to_string(),
            regexp: "!^.*$!sip:info@example.com!".to_string(),
            replacement: String::new(),
        }]))
    );
}

#[test]
fn test_ptr_and_ns_answers() {
    let query = query_message(1, "1.2.0.192.in-addr.arpa", RecordType::PTR);
    let response = answer(&query, vec![RData::PTR(PTR(name("host.example.com.")))]);
    assert_eq!(
        parse(&response, "1.2.0.192.in-addr.arpa", RecordKind::PTR),
        ParsedResponse::Answer(RawRecords::PTR(vec!["host.example.com".to_string()]))
    );

    let query = query_message(2, "example.com", RecordType::NS);
    let response = answer(&query, vec![RData::NS(NS(name("ns1.example.com.")))]);
    assert_eq!(
        parse(&response, "example.com", RecordKind::NS),
        ParsedResponse::Answer(RawRecords::NS(vec!["ns1.example.com".to_string()]))
    );
}

// ── negative answers ───────────────────────────────────────────────────────

#[test]
fn test_noerror_without_matching_answers_is_nodata() {
    let query = query_message(1, "example.com", RecordType::AAAA);
    let response = answer(&query, vec![]);

    assert_eq!(
        parse(&response, "example.com", RecordKind::AAAA),
        ParsedResponse::NoData
    );
}

#[test]
fn test_truncated_without_answers_is_server_failure() {
    let query = query_message(1, "example.com", RecordType::TXT);
    let mut response = answer(&query, vec![]);
    response.set_truncated(true);

    assert!(matches!(
        parse(&response, "example.com", RecordKind::TXT),
        ParsedResponse::ServerFailure(_)
    ));
}

#[test]
fn test_rcode_mapping() {
    let query = query_message(1, "example.com", RecordType::A);
    let cases = [
        (ResponseCode::NXDomain, ParsedResponse::NxDomain),
        (
            ResponseCode::ServFail,
            ParsedResponse::ServerFailure(ResponseCode::ServFail),
        ),
        (
            ResponseCode::Refused,
            ParsedResponse::ServerFailure(ResponseCode::Refused),
        ),
        (
            ResponseCode::NotImp,
            ParsedResponse::ServerFailure(ResponseCode::NotImp),
        ),
        (ResponseCode::FormErr, ParsedResponse::Malformed),
    ];

    for (rcode, expected) in cases {
        let response = rcode_only(&query, rcode);
        assert_eq!(
            parse(&response, "example.com", RecordKind::A),
            expected,
            "{rcode:?}"
        );
    }
}

// ── rejects ────────────────────────────────────────────────────────────────

#[test]
fn test_garbage_is_malformed() {
    let bytes = [0x12, 0x34, 0x81, 0x80, 0x00, 0x01, 0x00, 0x01, 0x00];
    assert_eq!(
        ResponseParser::parse(&bytes, "example.com", RecordKind::A),
        ParsedResponse::Malformed
    );
}

#[test]
fn test_other_question_is_mismatch() {
    let query = query_message(1, "other.example", RecordType::A);
    let response = answer(&query, vec![RData::A(A(Ipv4Addr::LOCALHOST))]);
    assert_eq!(
        parse(&response, "example.com", RecordKind::A),
        ParsedResponse::Mismatch
    );

    let query = query_message(1, "example.com", RecordType::AAAA);
    let response = answer(&query, vec![]);
    assert_eq!(
        parse(&response, "example.com", RecordKind::A),
        ParsedResponse::Mismatch
    );
}

#[test]
fn test_query_is_not_a_response() {
    let query = query_message(1, "example.com", RecordType::A);
    assert_eq!(
        parse(&query, "example.com", RecordKind::A),
        ParsedResponse::Mismatch
    );
}
