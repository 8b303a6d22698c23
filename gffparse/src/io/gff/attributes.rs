//! Column 9 grammars of the three annotation dialects.
//!
//! Each dialect has a single parsing function; [`ParsedAttributes::parse`]
//! picks one from the resolved [`GffVersion`].

use crate::data_structs::GffVersion;

/// Tags kept by GFF3 parsing in simplify mode.
const GFF3_ESSENTIAL: [&str; 3] = ["ID", "Name", "Parent"];
/// Tags kept by GTF parsing in simplify mode.
const GTF_ESSENTIAL: [&str; 6] = [
    "gene_id",
    "transcript_id",
    "gene_name",
    "transcript_name",
    "gene_source",
    "transcript_biotype",
];

/// Decodes GFF3 escapes: `%XX` becomes the byte `XX` and `+` becomes a
/// space. A `%` that is not followed by two hex digits is kept as is.
pub fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => decoded.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        decoded.push((hi << 4) | lo);
                        i += 2;
                    },
                    _ => decoded.push(b'%'),
                }
            },
            other => decoded.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

/// Escapes the characters that are reserved in column 9 (`;`, `=`, `&`,
/// `,`), `%`, `+` and control characters, so that [`percent_decode`]
/// restores the value.
pub fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            ';' | '=' | '&' | ',' | '%' | '+' => {
                encoded.push_str(&format!("%{:02X}", c as u32));
            },
            c if c.is_ascii_control() => {
                encoded.push_str(&format!("%{:02X}", c as u32));
            },
            c => encoded.push(c),
        }
    }
    encoded
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// GFF3 attributes with `ID` and `Name` pulled out.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Gff3Attributes {
    pub id:   Option<String>,
    pub name: Option<String>,
    /// Every other tag with its decoded values, in file order. A tag may
    /// appear more than once.
    pub tags: Vec<(String, Vec<String>)>,
}

impl Gff3Attributes {
    pub fn parse(
        text: &str,
        simplify: bool,
    ) -> Self {
        let mut attributes = Self::default();
        for clause in text
            .split(';')
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            let (tag, value) = clause
                .split_once('=')
                .unwrap_or((clause, ""));
            let tag = percent_decode(tag.trim());
            if simplify && !GFF3_ESSENTIAL.contains(&tag.as_str()) {
                continue;
            }
            let values: Vec<String> = if value.is_empty() {
                Vec::new()
            }
            else {
                value.split(',').map(percent_decode).collect()
            };

            match tag.as_str() {
                "ID" => attributes.id = values.into_iter().next(),
                "Name" => attributes.name = values.into_iter().next(),
                _ => attributes.tags.push((tag, values)),
            }
        }
        attributes
    }
}

/// GTF attributes with the identity and biotype fields pulled out.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GtfAttributes {
    pub gene_id:            Option<String>,
    pub gene_name:          Option<String>,
    pub transcript_id:      Option<String>,
    pub transcript_name:    Option<String>,
    pub gene_source:        Option<String>,
    pub transcript_biotype: Option<String>,
    pub gene_biotype:       Option<String>,
    /// Remaining `tag value` pairs in file order.
    pub other:              Vec<(String, String)>,
}

impl GtfAttributes {
    pub fn parse(
        text: &str,
        simplify: bool,
    ) -> Self {
        let mut attributes = Self::default();
        for clause in text.split("; ") {
            let mut tokens = clause.split_whitespace();
            let Some(tag) = tokens.next() else {
                continue;
            };
            let tag = tag.trim_end_matches(';');
            if tag.is_empty() {
                continue;
            }
            if simplify && !GTF_ESSENTIAL.contains(&tag) {
                continue;
            }
            let value: String = tokens
                .collect::<Vec<_>>()
                .join(" ")
                .chars()
                .filter(|c| *c != '"' && *c != ';')
                .collect();

            let slot = match tag {
                "gene_id" => &mut attributes.gene_id,
                "gene_name" => &mut attributes.gene_name,
                "transcript_id" => &mut attributes.transcript_id,
                "transcript_name" => &mut attributes.transcript_name,
                "gene_source" => &mut attributes.gene_source,
                "transcript_biotype" => &mut attributes.transcript_biotype,
                "gene_biotype" => &mut attributes.gene_biotype,
                _ => {
                    attributes
                        .other
                        .push((tag.to_string(), value));
                    continue;
                },
            };
            *slot = Some(value);
        }
        attributes
    }
}

/// Attribute column parsed with the grammar of one dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAttributes {
    /// GFF1/GFF2 `tag value` pairs, stored verbatim. A clause without
    /// whitespace has no value.
    Generic(Vec<(String, Option<String>)>),
    Gtf(GtfAttributes),
    Gff3(Gff3Attributes),
}

impl ParsedAttributes {
    /// Parses column 9. An unresolved version falls back to the generic
    /// grammar.
    pub fn parse(
        version: Option<GffVersion>,
        text: &str,
        simplify: bool,
    ) -> Self {
        match version {
            Some(GffVersion::Gff3) => {
                ParsedAttributes::Gff3(Gff3Attributes::parse(text, simplify))
            },
            Some(GffVersion::Gtf) => {
                ParsedAttributes::Gtf(GtfAttributes::parse(text, simplify))
            },
            Some(GffVersion::Gff1) | Some(GffVersion::Gff2) | None => {
                ParsedAttributes::Generic(parse_generic(text))
            },
        }
    }
}

fn parse_generic(text: &str) -> Vec<(String, Option<String>)> {
    text.split(';')
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != ".")
        .map(|clause| {
            match clause.split_once(char::is_whitespace) {
                Some((tag, value)) => {
                    (tag.to_string(), Some(value.trim().to_string()))
                },
                None => (clause.to_string(), None),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::escapes("a%3Bb+c", "a;b c")]
    #[case::lower_hex("x%2cy", "x,y")]
    #[case::plain("gene-1", "gene-1")]
    #[case::dangling("100%", "100%")]
    #[case::bad_hex("%zz1", "%zz1")]
    #[case::utf8("%C3%A9t%C3%A9", "été")]
    fn test_percent_decode(
        #[case] encoded: &str,
        #[case] decoded: &str,
    ) {
        assert_eq!(percent_decode(encoded), decoded);
    }

    #[rstest]
    #[case::reserved("EDEN;1", "EDEN%3B1")]
    #[case::list("a,b=c", "a%2Cb%3Dc")]
    #[case::percent_plus("50% +1", "50%25 %2B1")]
    #[case::tab("x\ty", "x%09y")]
    #[case::plain("Gene name-2", "Gene name-2")]
    fn test_percent_encode(
        #[case] raw: &str,
        #[case] encoded: &str,
    ) {
        assert_eq!(percent_encode(raw), encoded);
        assert_eq!(percent_decode(encoded), raw);
    }

    #[test]
    fn test_gff3_attributes() {
        let attrs = Gff3Attributes::parse(
            "ID=tx1 ; Name=My%20tx,other; Parent=g1,g2;Note=a+b%2Cc;Dbxref=x:1",
            false,
        );
        assert_eq!(attrs.id.as_deref(), Some("tx1"));
        assert_eq!(attrs.name.as_deref(), Some("My tx"));
        assert_eq!(
            attrs.tags,
            vec![
                ("Parent".to_string(), vec!["g1".to_string(), "g2".to_string()]),
                ("Note".to_string(), vec!["a b,c".to_string()]),
                ("Dbxref".to_string(), vec!["x:1".to_string()]),
            ]
        );
    }

    #[test]
    fn test_gff3_simplify() {
        let attrs = Gff3Attributes::parse("ID=e1;Parent=t1;Note=dropped;", true);
        assert_eq!(attrs.id.as_deref(), Some("e1"));
        assert_eq!(
            attrs.tags,
            vec![("Parent".to_string(), vec!["t1".to_string()])]
        );
    }

    #[test]
    fn test_gff3_valueless_tag() {
        let attrs = Gff3Attributes::parse("Is_circular", false);
        assert_eq!(attrs.tags, vec![("Is_circular".to_string(), vec![])]);
    }

    #[test]
    fn test_gtf_attributes() {
        let attrs = GtfAttributes::parse(
            r#"gene_id "G1"; transcript_id "T1"; gene_name "Abc 1"; tag "basic"; tag "CCDS"; transcript_biotype "protein_coding";"#,
            false,
        );
        assert_eq!(attrs.gene_id.as_deref(), Some("G1"));
        assert_eq!(attrs.transcript_id.as_deref(), Some("T1"));
        assert_eq!(attrs.gene_name.as_deref(), Some("Abc 1"));
        assert_eq!(attrs.transcript_biotype.as_deref(), Some("protein_coding"));
        assert_eq!(
            attrs.other,
            vec![
                ("tag".to_string(), "basic".to_string()),
                ("tag".to_string(), "CCDS".to_string()),
            ]
        );
    }

    #[test]
    fn test_gtf_simplify() {
        let attrs = GtfAttributes::parse(
            r#"gene_id "G1"; gene_biotype "lncRNA"; exon_number "2";"#,
            true,
        );
        assert_eq!(attrs.gene_id.as_deref(), Some("G1"));
        assert_eq!(attrs.gene_biotype, None);
        assert!(attrs.other.is_empty());
    }

    #[test]
    fn test_generic_attributes() {
        let parsed = ParsedAttributes::parse(
            Some(GffVersion::Gff2),
            "Sequence \"AC3.3\" ; Note  \"clone end\"; Confirmed",
            false,
        );
        assert_eq!(
            parsed,
            ParsedAttributes::Generic(vec![
                ("Sequence".to_string(), Some("\"AC3.3\"".to_string())),
                ("Note".to_string(), Some("\"clone end\"".to_string())),
                ("Confirmed".to_string(), None),
            ])
        );
    }

    #[test]
    fn test_unresolved_version_is_generic() {
        assert!(matches!(
            ParsedAttributes::parse(None, "ID=x", false),
            ParsedAttributes::Generic(_)
        ));
    }
}
