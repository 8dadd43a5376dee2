#![allow(dead_code)]

use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use std::str::FromStr;

/// A query as the engine would send it.
pub fn query_message(id: u16, qname: &str, record_type: RecordType) -> Message {
    let mut query = Query::new();
    query.set_name(Name::from_str(&format!("{}.", qname)).unwrap());
    query.set_query_type(record_type);
    query.set_query_class(DNSClass::IN);

    let mut message = Message::new(id, MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(query);
    message
}

/// NOERROR response to `query` carrying `answers` under the question name.
pub fn answer(query: &Message, answers: Vec<RData>) -> Message {
    let mut response = rcode_only(query, ResponseCode::NoError);
    let owner = query.queries()[0].name().clone();
    for rdata in answers {
        response.add_answer(Record::from_rdata(owner.clone(), 300, rdata));
    }
    response
}

/// Response to `query` with no records and the given rcode.
pub fn rcode_only(query: &Message, rcode: ResponseCode) -> Message {
    let mut response = Message::new(query.id(), MessageType::Response, OpCode::Query);
    response.set_recursion_desired(true);
    response.set_recursion_available(true);
    response.set_response_code(rcode);
    response.add_queries(query.queries().to_vec());
    response
}
