use std::str::FromStr;

use arcstr::ArcStr;
use log::debug;
use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::attributes::{Gff3Attributes, GtfAttributes, ParsedAttributes};
use super::line::RawGffRecord;
use crate::data_structs::annotation::{GffFeature, PARENT_TAG};
use crate::data_structs::Strand;
use crate::data_structs::typedef::PosType;
use crate::utils::non_placeholder;

/// Biotype names that denote a non-coding or otherwise specific RNA class.
static RNA_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)rna|antisense|nonsense_mediated|non_stop_decay|retained_intron|processed_transcript",
    )
    .expect("valid RNA biotype regex")
});

const GENERIC_TRANSCRIPT: &str = "transcript";
const CODING_BIOTYPE: &str = "protein_coding";
const MRNA: &str = "mRNA";

pub(crate) fn is_gene_like(primary_tag: &str) -> bool {
    primary_tag
        .to_ascii_lowercase()
        .contains("gene")
}

pub(crate) fn is_transcript_like(primary_tag: &str) -> bool {
    let lower = primary_tag.to_ascii_lowercase();
    lower.contains("transcript") || lower.contains("rna")
}

/// Picks a specific type for a generic `transcript` from the transcript
/// biotype, the gene biotype or the original source column, in that order.
pub(crate) fn refine_transcript_type(
    transcript_biotype: Option<&str>,
    gene_biotype: Option<&str>,
    original_source: Option<&str>,
) -> Option<String> {
    let chosen = transcript_biotype
        .or(gene_biotype)
        .or(original_source)?;
    if chosen
        .to_ascii_lowercase()
        .contains(CODING_BIOTYPE)
    {
        Some(MRNA.to_string())
    }
    else if RNA_LIKE.is_match(chosen) {
        Some(chosen.to_string())
    }
    else {
        None
    }
}

/// GTF identity of a built feature, kept so that missing gene and
/// transcript records can be synthesized later.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GtfIdentity {
    pub gene_id:            Option<String>,
    pub gene_name:          Option<String>,
    pub transcript_id:      Option<String>,
    pub transcript_name:    Option<String>,
    pub transcript_biotype: Option<String>,
    pub gene_biotype:       Option<String>,
    /// Source column before `gene_source` replaced it.
    pub original_source:    Option<String>,
}

/// A feature fresh from one line, not yet attached to anything.
#[derive(Debug, Clone)]
pub struct BuiltFeature<F: GffFeature> {
    pub feature: F,
    /// Present only for GTF records.
    pub gtf:     Option<GtfIdentity>,
}

fn parse_coordinate(value: &str) -> PosType {
    value.trim().parse().unwrap_or_else(|_| {
        debug!("Non-numeric coordinate '{}' read as 0", value);
        0
    })
}

/// Builds a feature from the positional columns and the already parsed
/// attribute column.
pub fn build_feature<F: GffFeature>(
    record: &RawGffRecord,
    attributes: ParsedAttributes,
    simplify: bool,
) -> BuiltFeature<F> {
    let strand = Strand::from_str(record.strand.trim()).unwrap_or_default();
    let mut feature = F::new(
        ArcStr::from(record.seq_id.as_str()),
        parse_coordinate(&record.start),
        parse_coordinate(&record.end),
        strand,
        non_placeholder(&record.source).map(ArcStr::from),
        non_placeholder(&record.primary_tag).map(ArcStr::from),
    );
    feature.set_score(non_placeholder(&record.score).and_then(|s| s.parse().ok()));
    feature.set_phase(match record.phase.trim() {
        "0" => Some(0),
        "1" => Some(1),
        "2" => Some(2),
        _ => None,
    });

    let gtf = match attributes {
        ParsedAttributes::Generic(pairs) => {
            for (tag, value) in pairs {
                match value {
                    Some(value) => feature.add_tag_value(&tag, value),
                    None => feature.add_tag(&tag),
                }
            }
            None
        },
        ParsedAttributes::Gff3(attrs) => {
            apply_gff3(&mut feature, attrs);
            None
        },
        ParsedAttributes::Gtf(attrs) => {
            Some(apply_gtf(&mut feature, attrs, simplify))
        },
    };

    BuiltFeature { feature, gtf }
}

fn apply_gff3<F: GffFeature>(
    feature: &mut F,
    attrs: Gff3Attributes,
) {
    if let Some(id) = attrs.id {
        feature.set_primary_id(id);
    }
    if let Some(name) = attrs.name {
        feature.set_display_name(name);
    }
    for (tag, values) in attrs.tags {
        if values.is_empty() {
            feature.add_tag(&tag);
        }
        for value in values {
            feature.add_tag_value(&tag, value);
        }
    }
}

fn apply_gtf<F: GffFeature>(
    feature: &mut F,
    attrs: GtfAttributes,
    simplify: bool,
) -> GtfIdentity {
    let GtfAttributes {
        gene_id,
        gene_name,
        transcript_id,
        transcript_name,
        gene_source,
        transcript_biotype,
        gene_biotype,
        other,
    } = attrs;

    let original_source = feature.source().map(str::to_string);
    if let Some(gene_source) = gene_source {
        feature.set_source(ArcStr::from(gene_source.as_str()));
        if !simplify {
            feature.add_tag_value("gene_source", gene_source);
        }
    }

    let primary_tag = feature
        .primary_tag()
        .unwrap_or_default()
        .to_string();
    if is_gene_like(&primary_tag) {
        if let Some(id) = gene_id.as_ref() {
            feature.set_primary_id(id.clone());
        }
        if let Some(name) = gene_name.as_ref() {
            feature.set_display_name(name.clone());
        }
    }
    else if is_transcript_like(&primary_tag) {
        if let Some(id) = transcript_id.as_ref() {
            feature.set_primary_id(id.clone());
        }
        if let Some(name) = transcript_name.as_ref() {
            feature.set_display_name(name.clone());
        }
        if let Some(gene_id) = gene_id.as_ref() {
            feature.add_tag_value(PARENT_TAG, gene_id.clone());
        }
        if primary_tag == GENERIC_TRANSCRIPT {
            if let Some(refined) = refine_transcript_type(
                transcript_biotype.as_deref(),
                gene_biotype.as_deref(),
                original_source.as_deref(),
            ) {
                feature.set_primary_tag(ArcStr::from(refined.as_str()));
            }
        }
    }
    else if let Some(transcript_id) = transcript_id.as_ref() {
        feature.add_tag_value(PARENT_TAG, transcript_id.clone());
    }

    if !simplify {
        if let Some(biotype) = transcript_biotype.as_ref() {
            feature.add_tag_value("transcript_biotype", biotype.clone());
        }
        if let Some(biotype) = gene_biotype.as_ref() {
            feature.add_tag_value("gene_biotype", biotype.clone());
        }
    }
    for (tag, value) in other {
        feature.add_tag_value(&tag, value);
    }

    GtfIdentity {
        gene_id,
        gene_name,
        transcript_id,
        transcript_name,
        transcript_biotype,
        gene_biotype,
        original_source,
    }
}
