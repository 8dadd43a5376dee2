use std::fmt;
use std::str::FromStr;

/// The record kinds a session can be asked to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    A,
    AAAA,
    PTR,
    MX,
    TXT,
    SRV,
    NAPTR,
    NS,
}

impl RecordKind {
    pub const ALL: [RecordKind; 8] = [
        RecordKind::A,
        RecordKind::AAAA,
        RecordKind::PTR,
        RecordKind::MX,
        RecordKind::TXT,
        RecordKind::SRV,
        RecordKind::NAPTR,
        RecordKind::NS,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::A => "A",
            RecordKind::AAAA => "AAAA",
            RecordKind::PTR => "PTR",
            RecordKind::MX => "MX",
            RecordKind::TXT => "TXT",
            RecordKind::SRV => "SRV",
            RecordKind::NAPTR => "NAPTR",
            RecordKind::NS => "NS",
        }
    }

    pub fn to_u16(&self) -> u16 {
        match self {
            RecordKind::A => 1,
            RecordKind::NS => 2,
            RecordKind::PTR => 12,
            RecordKind::MX => 15,
            RecordKind::TXT => 16,
            RecordKind::AAAA => 28,
            RecordKind::SRV => 33,
            RecordKind::NAPTR => 35,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "A" => Ok(RecordKind::A),
            "AAAA" => Ok(RecordKind::AAAA),
            "PTR" => Ok(RecordKind::PTR),
            "MX" => Ok(RecordKind::MX),
            "TXT" => Ok(RecordKind::TXT),
            "SRV" => Ok(RecordKind::SRV),
            "NAPTR" => Ok(RecordKind::NAPTR),
            "NS" => Ok(RecordKind::NS),
            _ => Err(format!("Unknown record kind: {}", s)),
        }
    }
}
