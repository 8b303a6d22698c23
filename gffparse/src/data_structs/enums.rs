use std::convert::Infallible;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};

use crate::io::compression::Compression;

#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug, PartialOrd, Ord, Default)]
pub enum Strand {
    /// Forward strand.
    Forward,
    /// Reverse strand.
    Reverse,
    /// No strand.
    #[default]
    None,
}

impl FromStr for Strand {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            _ => Ok(Strand::None),
        }
    }
}

impl From<Strand> for char {
    fn from(value: Strand) -> Self {
        match value {
            Strand::Forward => '+',
            Strand::Reverse => '-',
            Strand::None => '.',
        }
    }
}

impl From<Strand> for Option<bool> {
    fn from(value: Strand) -> Option<bool> {
        match value {
            Strand::Forward => Some(true),
            Strand::Reverse => Some(false),
            Strand::None => None,
        }
    }
}

impl From<Option<bool>> for Strand {
    fn from(value: Option<bool>) -> Strand {
        match value {
            Some(true) => Strand::Forward,
            Some(false) => Strand::Reverse,
            None => Strand::None,
        }
    }
}

impl Display for Strand {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", char::from(*self))
    }
}

/// Annotation dialect. The attribute grammar and the hierarchy rules are
/// selected from this value.
#[derive(
    Eq, Hash, PartialEq, Copy, Clone, Debug, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum GffVersion {
    /// GFF1, flat group column.
    Gff1,
    /// GFF2, `tag value` attributes.
    Gff2,
    /// GTF, also known as GFF2.5.
    Gtf,
    /// GFF3, `tag=value` attributes with ID/Parent links.
    Gff3,
}

impl GffVersion {
    /// GFF1/GFF2 have no ID/Parent semantics.
    pub fn is_generic(&self) -> bool {
        matches!(self, GffVersion::Gff1 | GffVersion::Gff2)
    }

    /// Interprets the value of a `##gff-version` pragma. Any `3.x` release
    /// counts as GFF3.
    pub fn from_pragma(value: &str) -> Option<Self> {
        let mut parts = value.split('.');
        let major = parts.next()?;
        let minor = parts.next();
        match (major, minor) {
            ("1", None | Some("0")) => Some(GffVersion::Gff1),
            ("2", None | Some("0")) => Some(GffVersion::Gff2),
            ("2", Some("5")) => Some(GffVersion::Gtf),
            ("3", _) => Some(GffVersion::Gff3),
            _ => None,
        }
    }

    /// Guesses the dialect from the file name, ignoring a trailing
    /// compression suffix. `.gff` is ambiguous and yields `None`; an
    /// extension that is not an annotation file is an error.
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Option<Self>> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("Invalid file name: {}", path.display()))?
            .to_ascii_lowercase();
        let stem = match Compression::from_path(path) {
            Compression::None => name.as_str(),
            _ => name
                .rsplit_once('.')
                .map_or(name.as_str(), |(stem, _)| stem),
        };

        match stem.rsplit_once('.').map(|(_, ext)| ext) {
            Some("gtf") => Ok(Some(GffVersion::Gtf)),
            Some("gff3") => Ok(Some(GffVersion::Gff3)),
            Some("gff2") => Ok(Some(GffVersion::Gff2)),
            Some("gff") => Ok(None),
            Some(other) => {
                bail!("Unrecognized annotation file extension '.{}'", other)
            },
            None => bail!(
                "Annotation file {} has no extension",
                path.display()
            ),
        }
    }
}

impl FromStr for GffVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(GffVersion::Gff1),
            "2" => Ok(GffVersion::Gff2),
            "2.5" => Ok(GffVersion::Gtf),
            "3" => Ok(GffVersion::Gff3),
            other => bail!("Unsupported GFF version '{}'", other),
        }
    }
}

impl Display for GffVersion {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            GffVersion::Gff1 => write!(f, "1"),
            GffVersion::Gff2 => write!(f, "2"),
            GffVersion::Gtf => write!(f, "2.5"),
            GffVersion::Gff3 => write!(f, "3"),
        }
    }
}
