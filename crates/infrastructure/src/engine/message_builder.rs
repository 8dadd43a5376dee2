//! DNS Message Builder
//!
//! Turns engine requests into wire-format queries using `hickory-proto`.

use super::record_type_map::RecordTypeMapper;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use loopdns_application::{EngineRequest, EngineStatus};
use loopdns_domain::RecordKind;
use std::net::IpAddr;
use std::str::FromStr;
use tracing::debug;

pub struct MessageBuilder;

impl MessageBuilder {
    /// Owner name the request resolves: reverse names for PTR and
    /// `_service._protocol.domain` for fully specified SRV.
    pub fn query_name(request: &EngineRequest) -> String {
        match request {
            EngineRequest::PtrV4(ip) => Self::reverse_domain(&IpAddr::V4(*ip)),
            EngineRequest::PtrV6(ip) => Self::reverse_domain(&IpAddr::V6(*ip)),
            EngineRequest::SRV {
                name,
                service: Some((service, protocol)),
            } => format!("_{}._{}.{}", service, protocol, name),
            EngineRequest::A { name }
            | EngineRequest::AAAA { name }
            | EngineRequest::MX { name }
            | EngineRequest::TXT { name }
            | EngineRequest::SRV { name, .. }
            | EngineRequest::NAPTR { name }
            | EngineRequest::NS { name } => name.clone(),
        }
    }

    pub fn reverse_domain(ip: &IpAddr) -> String {
        match ip {
            IpAddr::V4(ipv4) => {
                let octets = ipv4.octets();
                format!(
                    "{}.{}.{}.{}.in-addr.arpa",
                    octets[3], octets[2], octets[1], octets[0]
                )
            }
            IpAddr::V6(ipv6) => {
                let mut nibbles = Vec::with_capacity(32);
                for byte in ipv6.octets().iter().rev() {
                    nibbles.push(format!("{:x}", byte & 0x0f));
                    nibbles.push(format!("{:x}", (byte >> 4) & 0x0f));
                }
                format!("{}.ip6.arpa", nibbles.join("."))
            }
        }
    }

    /// Builds a recursive query for `domain` with message ID `id`.
    ///
    /// Names hickory cannot parse (empty, oversized labels, etc.) are
    /// rejected with [`EngineStatus::BADQUERY`].
    pub fn build_query(id: u16, domain: &str, kind: RecordKind) -> Result<Vec<u8>, EngineStatus> {
        let name = Self::parse_name(domain)?;

        let mut query = Query::new();
        query.set_name(name);
        query.set_query_type(RecordTypeMapper::to_hickory(kind));
        query.set_query_class(DNSClass::IN);

        let mut message = Message::new(id, MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(query);

        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);
        message.emit(&mut encoder).map_err(|e| {
            debug!(domain, error = %e, "Failed to serialize DNS query");
            EngineStatus::BADQUERY
        })?;

        Ok(buf)
    }

    fn parse_name(domain: &str) -> Result<Name, EngineStatus> {
        let trimmed = domain.trim_end_matches('.');
        if trimmed.is_empty() {
            return Err(EngineStatus::BADQUERY);
        }

        let mut name = Name::from_str(trimmed).map_err(|e| {
            debug!(domain, error = %e, "Rejecting malformed domain name");
            EngineStatus::BADQUERY
        })?;
        name.set_fqdn(true);
        Ok(name)
    }
}
