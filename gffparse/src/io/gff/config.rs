use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::data_structs::GffVersion;
use crate::{getter_fn, with_field_fn};

/// Options recognised by [`GffParser`](super::GffParser).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Dialect to assume. Overrides the file extension; an in-stream
    /// `##gff-version` pragma can still change it.
    pub version:    Option<GffVersion>,
    /// Features with one of these types are dropped silently.
    pub skip_types: HashSet<String>,
    /// Keep only the attributes needed to build the hierarchy.
    pub simplify:   bool,
}

impl ParserConfig {
    with_field_fn!(version, Option<GffVersion>);

    with_field_fn!(skip_types, HashSet<String>);

    with_field_fn!(simplify, bool);

    getter_fn!(skip_types, HashSet<String>);

    /// Adds one type to the skip set.
    pub fn with_skip_type<S: Into<String>>(
        mut self,
        primary_tag: S,
    ) -> Self {
        self.skip_types.insert(primary_tag.into());
        self
    }

    pub fn skips(
        &self,
        primary_tag: Option<&str>,
    ) -> bool {
        primary_tag.is_some_and(|t| self.skip_types.contains(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_setters() {
        let config = ParserConfig::default()
            .with_version(Some(GffVersion::Gtf))
            .with_simplify(true)
            .with_skip_type("start_codon")
            .with_skip_type("stop_codon");
        assert_eq!(config.version, Some(GffVersion::Gtf));
        assert!(config.simplify);
        assert_eq!(config.skip_types().len(), 2);
        assert!(config.skips(Some("stop_codon")));
        assert!(!config.skips(Some("exon")));
        assert!(!config.skips(None));
    }

    #[test]
    fn test_config_from_json() {
        let config: ParserConfig = serde_json::from_str(
            r#"{"version": "Gff3", "skip_types": ["chromosome"]}"#,
        )
        .unwrap();
        assert_eq!(config.version, Some(GffVersion::Gff3));
        assert!(config.skips(Some("chromosome")));
        assert!(!config.simplify);
    }
}
