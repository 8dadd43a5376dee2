use super::RecordKind;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecord {
    pub domain: String,

    pub priority: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvRecord {
    pub domain: String,

    pub priority: u16,

    pub weight: u16,

    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaptrRecord {
    pub order: u16,

    pub preference: u16,

    pub flags: String,

    pub service: String,

    /// `None` when the record carries an empty regexp.
    pub regexp: Option<String>,

    /// `None` when the record carries an empty replacement.
    pub replacement: Option<String>,
}

/// Decoded answer of a successful query, in the order the engine reported
/// the records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSet {
    /// A and AAAA answers, rendered as textual addresses.
    Addresses(Vec<String>),

    /// PTR and NS answers.
    Names(Vec<String>),

    /// TXT answers, one entry per record with its character-strings joined.
    Texts(Vec<Vec<u8>>),

    Mx(Vec<MxRecord>),

    Srv(Vec<SrvRecord>),

    Naptr(Vec<NaptrRecord>),
}

impl RecordSet {
    pub fn len(&self) -> usize {
        match self {
            RecordSet::Addresses(v) | RecordSet::Names(v) => v.len(),
            RecordSet::Texts(v) => v.len(),
            RecordSet::Mx(v) => v.len(),
            RecordSet::Srv(v) => v.len(),
            RecordSet::Naptr(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this payload shape is the one produced for `kind`.
    pub fn matches_kind(&self, kind: RecordKind) -> bool {
        matches!(
            (self, kind),
            (RecordSet::Addresses(_), RecordKind::A | RecordKind::AAAA)
                | (RecordSet::Names(_), RecordKind::PTR | RecordKind::NS)
                | (RecordSet::Texts(_), RecordKind::TXT)
                | (RecordSet::Mx(_), RecordKind::MX)
                | (RecordSet::Srv(_), RecordKind::SRV)
                | (RecordSet::Naptr(_), RecordKind::NAPTR)
        )
    }

    /// One human readable line per record.
    pub fn to_lines(&self) -> Vec<String> {
        match self {
            RecordSet::Addresses(v) | RecordSet::Names(v) => v.clone(),
            RecordSet::Texts(v) => v
                .iter()
                .map(|t| String::from_utf8_lossy(t).into_owned())
                .collect(),
            RecordSet::Mx(v) => v.iter().map(ToString::to_string).collect(),
            RecordSet::Srv(v) => v.iter().map(ToString::to_string).collect(),
            RecordSet::Naptr(v) => v.iter().map(ToString::to_string).collect(),
        }
    }
}

impl fmt::Display for MxRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.priority, self.domain)
    }
}

impl fmt::Display for SrvRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.priority, self.weight, self.port, self.domain
        )
    }
}

impl fmt::Display for NaptrRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} \"{}\" \"{}\" \"{}\" {}",
            self.order,
            self.preference,
            self.flags,
            self.service,
            self.regexp.as_deref().unwrap_or(""),
            self.replacement.as_deref().unwrap_or(".")
        )
    }
}
