use std::fmt;

use arcstr::ArcStr;
use indexmap::IndexMap;
use itertools::Itertools;
use slotmap::new_key_type;

use crate::data_structs::enums::Strand;
use crate::data_structs::typedef::{PosType, ScoreType, SeqNameStr};
use crate::io::gff::attributes::percent_encode;

new_key_type! {
    /// Stable handle of a feature stored in the assembler's arena.
    pub struct FeatureId;
}

/// Attribute name linking a feature to its parents.
pub const PARENT_TAG: &str = "Parent";

/// Capabilities the parser needs from a feature object.
///
/// [`Feature`] is the default implementation. A downstream crate can plug
/// its own record type into [`GffParser`](crate::io::gff::GffParser) by
/// implementing this trait; the choice is made through the parser's type
/// parameter and cannot change for the lifetime of the parser.
pub trait GffFeature: Sized {
    fn new(
        seq_id: SeqNameStr,
        start: PosType,
        end: PosType,
        strand: Strand,
        source: Option<ArcStr>,
        primary_tag: Option<ArcStr>,
    ) -> Self;

    fn seq_id(&self) -> &str;
    fn start(&self) -> PosType;
    fn set_start(
        &mut self,
        start: PosType,
    );
    fn end(&self) -> PosType;
    fn set_end(
        &mut self,
        end: PosType,
    );
    fn strand(&self) -> Strand;

    fn source(&self) -> Option<&str>;
    fn set_source(
        &mut self,
        source: ArcStr,
    );
    fn primary_tag(&self) -> Option<&str>;
    fn set_primary_tag(
        &mut self,
        primary_tag: ArcStr,
    );

    fn primary_id(&self) -> Option<&str>;
    fn set_primary_id(
        &mut self,
        id: String,
    );
    fn display_name(&self) -> Option<&str>;
    fn set_display_name(
        &mut self,
        name: String,
    );

    fn score(&self) -> Option<ScoreType>;
    fn set_score(
        &mut self,
        score: Option<ScoreType>,
    );
    fn phase(&self) -> Option<u8>;
    fn set_phase(
        &mut self,
        phase: Option<u8>,
    );

    /// Registers a tag without adding a value to it.
    fn add_tag(
        &mut self,
        tag: &str,
    );
    fn add_tag_value(
        &mut self,
        tag: &str,
        value: String,
    );
    /// Values of `tag` in insertion order; empty if the tag is absent.
    fn tag_values(
        &self,
        tag: &str,
    ) -> &[String];
    fn has_tag(
        &self,
        tag: &str,
    ) -> bool;

    fn add_child(
        &mut self,
        child: FeatureId,
    );
    fn children(&self) -> &[FeatureId];

    /// Widens the span to cover `[start, end]`.
    fn widen(
        &mut self,
        start: PosType,
        end: PosType,
    ) {
        if start < self.start() {
            self.set_start(start);
        }
        if end > self.end() {
            self.set_end(end);
        }
    }
}

/// A single annotation record, possibly with children.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub seq_id:       SeqNameStr,
    pub start:        PosType,
    pub end:          PosType,
    pub strand:       Strand,
    pub source:       Option<ArcStr>,
    pub primary_tag:  Option<ArcStr>,
    pub primary_id:   Option<String>,
    pub display_name: Option<String>,
    pub score:        Option<ScoreType>,
    pub phase:        Option<u8>,
    pub tags:         IndexMap<String, Vec<String>>,
    pub children:     Vec<FeatureId>,
}

impl Feature {
    /// Iterates over `(tag, values)` pairs in insertion order.
    pub fn tags(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.tags
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn length(&self) -> PosType {
        self.end
            .saturating_sub(self.start)
            .saturating_add(1)
    }
}

impl GffFeature for Feature {
    fn new(
        seq_id: SeqNameStr,
        start: PosType,
        end: PosType,
        strand: Strand,
        source: Option<ArcStr>,
        primary_tag: Option<ArcStr>,
    ) -> Self {
        Self {
            seq_id,
            start,
            end,
            strand,
            source,
            primary_tag,
            primary_id: None,
            display_name: None,
            score: None,
            phase: None,
            tags: IndexMap::new(),
            children: Vec::new(),
        }
    }

    fn seq_id(&self) -> &str { &self.seq_id }

    fn start(&self) -> PosType { self.start }

    fn set_start(
        &mut self,
        start: PosType,
    ) {
        self.start = start;
    }

    fn end(&self) -> PosType { self.end }

    fn set_end(
        &mut self,
        end: PosType,
    ) {
        self.end = end;
    }

    fn strand(&self) -> Strand { self.strand }

    fn source(&self) -> Option<&str> { self.source.as_deref() }

    fn set_source(
        &mut self,
        source: ArcStr,
    ) {
        self.source = Some(source);
    }

    fn primary_tag(&self) -> Option<&str> { self.primary_tag.as_deref() }

    fn set_primary_tag(
        &mut self,
        primary_tag: ArcStr,
    ) {
        self.primary_tag = Some(primary_tag);
    }

    fn primary_id(&self) -> Option<&str> { self.primary_id.as_deref() }

    fn set_primary_id(
        &mut self,
        id: String,
    ) {
        self.primary_id = Some(id);
    }

    fn display_name(&self) -> Option<&str> { self.display_name.as_deref() }

    fn set_display_name(
        &mut self,
        name: String,
    ) {
        self.display_name = Some(name);
    }

    fn score(&self) -> Option<ScoreType> { self.score }

    fn set_score(
        &mut self,
        score: Option<ScoreType>,
    ) {
        self.score = score;
    }

    fn phase(&self) -> Option<u8> { self.phase }

    fn set_phase(
        &mut self,
        phase: Option<u8>,
    ) {
        self.phase = phase;
    }

    fn add_tag(
        &mut self,
        tag: &str,
    ) {
        if !self.tags.contains_key(tag) {
            self.tags.insert(tag.to_string(), Vec::new());
        }
    }

    fn add_tag_value(
        &mut self,
        tag: &str,
        value: String,
    ) {
        match self.tags.get_mut(tag) {
            Some(values) => values.push(value),
            None => {
                self.tags
                    .insert(tag.to_string(), vec![value]);
            },
        }
    }

    fn tag_values(
        &self,
        tag: &str,
    ) -> &[String] {
        self.tags
            .get(tag)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn has_tag(
        &self,
        tag: &str,
    ) -> bool {
        self.tags.contains_key(tag)
    }

    fn add_child(
        &mut self,
        child: FeatureId,
    ) {
        self.children.push(child);
    }

    fn children(&self) -> &[FeatureId] { &self.children }
}

impl fmt::Display for Feature {
    /// Writes the nine GFF3 columns with column 9 escaped. Children are not
    /// written.
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let score = self
            .score
            .map(|s| s.to_string())
            .unwrap_or_else(|| ".".into());
        let phase = self
            .phase
            .map(|p| p.to_string())
            .unwrap_or_else(|| ".".into());
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t",
            self.seq_id,
            self.source.as_deref().unwrap_or("."),
            self.primary_tag.as_deref().unwrap_or("."),
            self.start,
            self.end,
            score,
            self.strand,
            phase
        )?;

        let mut first = true;
        let mut write_attr = |f: &mut fmt::Formatter<'_>,
                              key: &str,
                              values: &[String]|
         -> fmt::Result {
            if !first {
                f.write_str(";")?;
            }
            first = false;
            write!(
                f,
                "{}={}",
                percent_encode(key),
                values
                    .iter()
                    .map(|v| percent_encode(v))
                    .join(",")
            )
        };
        if let Some(id) = self.primary_id.as_ref() {
            write_attr(f, "ID", std::slice::from_ref(id))?;
        }
        if let Some(name) = self.display_name.as_ref() {
            write_attr(f, "Name", std::slice::from_ref(name))?;
        }
        for (key, values) in self.tags.iter() {
            write_attr(f, key, values)?;
        }
        if first {
            f.write_str(".")?;
        }
        Ok(())
    }
}
