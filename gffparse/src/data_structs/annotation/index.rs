use indexmap::IndexMap;
use log::warn;
use multimap::MultiMap;

use super::assembler::FeatureAssembler;
use super::feature::{FeatureId, GffFeature};
use crate::data_structs::enums::Strand;
use crate::data_structs::typedef::{PosType, SeqNameStr};

/// Location used to pick one gene among several sharing a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneRegion {
    pub seq_id: String,
    pub start:  PosType,
    pub end:    PosType,
    pub strand: Strand,
}

/// Arguments of [`FeatureIndex::find_gene`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneQuery {
    pub name:   String,
    pub id:     Option<String>,
    pub region: Option<GeneRegion>,
}

impl GeneQuery {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name:   name.into(),
            id:     None,
            region: None,
        }
    }

    pub fn with_id<S: Into<String>>(
        mut self,
        id: S,
    ) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_region<S: Into<String>>(
        mut self,
        seq_id: S,
        start: PosType,
        end: PosType,
        strand: Strand,
    ) -> Self {
        self.region = Some(GeneRegion {
            seq_id: seq_id.into(),
            start,
            end,
            strand,
        });
        self
    }
}

/// Lookup tables derived from the top-level features after a full pass.
#[derive(Debug, Clone, Default)]
pub struct FeatureIndex {
    names:       MultiMap<String, FeatureId>,
    seq_lengths: IndexMap<SeqNameStr, PosType>,
}

impl FeatureIndex {
    /// Indexes the top-level features of `assembler`. `regions` holds the
    /// stop coordinates announced by `##sequence-region` pragmas.
    pub fn build<F: GffFeature>(
        assembler: &FeatureAssembler<F>,
        regions: &IndexMap<SeqNameStr, PosType>,
    ) -> Self {
        let mut names = MultiMap::new();
        let mut seq_lengths = regions.clone();

        for &id in assembler.top_level() {
            let Some(feature) = assembler.feature(id) else {
                continue;
            };
            if let Some(name) = feature.display_name() {
                names.insert(name.to_lowercase(), id);
            }
            let end = feature.end();
            match seq_lengths.get_mut(feature.seq_id()) {
                Some(length) => {
                    if end > *length {
                        *length = end;
                    }
                },
                None => {
                    seq_lengths.insert(SeqNameStr::from(feature.seq_id()), end);
                },
            }
        }

        Self { names, seq_lengths }
    }

    /// Top-level features whose display name matches `name`, ignoring case.
    pub fn by_name(
        &self,
        name: &str,
    ) -> &[FeatureId] {
        self.names
            .get_vec(&name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sequence length per seq_id: the `##sequence-region` stop raised to
    /// the furthest top-level feature end.
    pub fn seq_lengths(&self) -> &IndexMap<SeqNameStr, PosType> { &self.seq_lengths }

    /// Finds a top-level gene by name, optionally narrowed by primary id or
    /// by location. A given id must match exactly; there is no fallback to
    /// the name alone.
    pub fn find_gene<F: GffFeature>(
        &self,
        assembler: &FeatureAssembler<F>,
        query: &GeneQuery,
    ) -> Option<FeatureId> {
        let candidates = self.by_name(&query.name);
        if candidates.is_empty() {
            return None;
        }

        if let Some(id) = query.id.as_deref() {
            return candidates.iter().copied().find(|&c| {
                assembler
                    .feature(c)
                    .and_then(|f| f.primary_id())
                    == Some(id)
            });
        }

        if let Some(region) = query.region.as_ref() {
            return candidates.iter().copied().find(|&c| {
                assembler.feature(c).is_some_and(|f| {
                    f.seq_id() == region.seq_id
                        && f.strand() == region.strand
                        && f.start() <= region.end
                        && f.end() >= region.start
                })
            });
        }

        if candidates.len() > 1 {
            warn!(
                "{} genes are named '{}'; returning the first one",
                candidates.len(),
                query.name
            );
        }
        candidates.first().copied()
    }
}
