use std::fmt;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::data_structs::typedef::PosType;

static VERSION_PRAGMA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^##gff-version\s+(\d+(?:\.\d+)*)\s*$")
        .expect("valid version pragma regex")
});

static NUCLEOTIDES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[acgtn]+$").expect("valid nucleotide regex")
});

const SEQUENCE_REGION_PREFIX: &str = "##sequence-region";
const FASTA_PRAGMA: &str = "##FASTA";
const N_COLUMNS: usize = 9;

/// The nine tab-separated columns of a feature line, untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGffRecord {
    pub seq_id:      String,
    pub source:      String,
    pub primary_tag: String,
    pub start:       String,
    pub end:         String,
    pub score:       String,
    pub strand:      String,
    pub phase:       String,
    pub attributes:  String,
}

impl RawGffRecord {
    fn from_fields(fields: Vec<&str>) -> Self {
        let mut it = fields.into_iter().map(str::to_string);
        let mut next = || it.next().unwrap_or_default();
        Self {
            seq_id:      next(),
            source:      next(),
            primary_tag: next(),
            start:       next(),
            end:         next(),
            score:       next(),
            strand:      next(),
            phase:       next(),
            attributes:  next(),
        }
    }
}

/// Reason a line could not be interpreted. The line is dropped and parsing
/// continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedLine {
    /// Feature line without exactly nine tab-separated columns.
    FieldCount(usize),
    /// `##sequence-region` with missing or non-numeric coordinates.
    SequenceRegion(String),
}

impl fmt::Display for MalformedLine {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            MalformedLine::FieldCount(n) => {
                write!(
                    f,
                    "expected {} tab-separated columns, found {}",
                    N_COLUMNS, n
                )
            },
            MalformedLine::SequenceRegion(line) => {
                write!(f, "malformed sequence-region pragma '{}'", line)
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GffLine {
    VersionPragma(String),
    /// `###`, all forward references so far are resolved.
    SubfeatureClose,
    SequenceRegion {
        seq_id: String,
        start:  PosType,
        end:    PosType,
    },
    Comment(String),
    Blank,
    FastaHeader,
    FastaSequence,
    Record(RawGffRecord),
    Malformed(MalformedLine),
}

impl GffLine {
    pub fn is_fasta_pragma(&self) -> bool {
        matches!(self, GffLine::Comment(text) if text.starts_with(FASTA_PRAGMA))
    }
}

/// Classifies one line with its line terminator already removed. The first
/// matching rule wins.
pub fn classify_line(line: &str) -> GffLine {
    let line = line.strip_suffix('\r').unwrap_or(line);

    if let Some(caps) = VERSION_PRAGMA.captures(line) {
        return GffLine::VersionPragma(caps[1].to_string());
    }
    if line == "###" {
        return GffLine::SubfeatureClose;
    }
    if line.starts_with(SEQUENCE_REGION_PREFIX) {
        return parse_sequence_region(line);
    }
    if line.starts_with('#') {
        return GffLine::Comment(line.to_string());
    }
    if line.is_empty() {
        return GffLine::Blank;
    }
    if line.starts_with('>') {
        return GffLine::FastaHeader;
    }
    if NUCLEOTIDES.is_match(line) {
        return GffLine::FastaSequence;
    }

    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != N_COLUMNS {
        return GffLine::Malformed(MalformedLine::FieldCount(fields.len()));
    }
    GffLine::Record(RawGffRecord::from_fields(fields))
}

fn parse_sequence_region(line: &str) -> GffLine {
    let malformed = || GffLine::Malformed(MalformedLine::SequenceRegion(line.to_string()));
    let mut parts = line[SEQUENCE_REGION_PREFIX.len()..].split_whitespace();
    let (Some(seq_id), Some(start), Some(end)) = (parts.next(), parts.next(), parts.next())
    else {
        return malformed();
    };
    match (start.parse::<PosType>(), end.parse::<PosType>()) {
        (Ok(start), Ok(end)) => {
            GffLine::SequenceRegion {
                seq_id: seq_id.to_string(),
                start,
                end,
            }
        },
        _ => malformed(),
    }
}
