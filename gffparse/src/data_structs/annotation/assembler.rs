use arcstr::ArcStr;
use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use log::{debug, warn};
use slotmap::SlotMap;

use super::feature::{FeatureId, GffFeature, PARENT_TAG};
use crate::data_structs::enums::GffVersion;
use crate::io::gff::builder::{
    is_gene_like, is_transcript_like, refine_transcript_type, BuiltFeature,
    GtfIdentity,
};

const GENE_TYPE: &str = "gene";
const TRANSCRIPT_TYPE: &str = "transcript";
const CDS_TYPE: &str = "CDS";

/// A feature whose declared parents were not known when it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orphan {
    pub feature: FeatureId,
    /// Parent ids still waiting for a match. Empty for a duplicate-id
    /// feature without parents, which can never be resolved.
    pub pending_parents: Vec<String>,
}

/// Builds the feature forest from a stream of built features.
///
/// Features are owned by an arena and addressed by [`FeatureId`], so a child
/// listed under several parents is stored once.
pub struct FeatureAssembler<F: GffFeature> {
    arena:          SlotMap<FeatureId, F>,
    id_table:       HashMap<String, FeatureId>,
    orphans:        Vec<Orphan>,
    duplicates:     HashMap<String, usize>,
    top_level:      Vec<FeatureId>,
    unparented:     Vec<FeatureId>,
    /// Synthesized transcript -> synthesized or reused gene.
    synthesized_up: HashMap<FeatureId, FeatureId>,
}

impl<F: GffFeature> Default for FeatureAssembler<F> {
    fn default() -> Self { Self::new() }
}

impl<F: GffFeature> FeatureAssembler<F> {
    pub fn new() -> Self {
        Self {
            arena:          SlotMap::with_key(),
            id_table:       Default::default(),
            orphans:        Default::default(),
            duplicates:     Default::default(),
            top_level:      Default::default(),
            unparented:     Default::default(),
            synthesized_up: Default::default(),
        }
    }

    /// Stores one feature and links it into the forest as far as the
    /// features seen so far allow.
    pub fn push(
        &mut self,
        built: BuiltFeature<F>,
        version: Option<GffVersion>,
    ) -> FeatureId {
        let BuiltFeature { feature, gtf } = built;
        let generic = version.map_or(true, |v| v.is_generic());
        let primary_id = feature.primary_id().map(str::to_string);
        let mut parents = feature.tag_values(PARENT_TAG).to_vec();
        if let Some(id) = primary_id.as_deref() {
            let declared = parents.len();
            parents.retain(|p| p != id);
            if parents.len() < declared {
                debug!("Ignoring self-referencing parent link on '{}'", id);
            }
        }
        let is_cds = feature.primary_tag() == Some(CDS_TYPE);
        let key = self.arena.insert(feature);

        if generic {
            self.top_level.push(key);
            return key;
        }

        if let Some(id) = primary_id {
            if self.id_table.contains_key(&id) {
                if !is_cds {
                    *self.duplicates.entry(id).or_default() += 1;
                }
                if parents.is_empty() {
                    self.orphans.push(Orphan {
                        feature:         key,
                        pending_parents: Vec::new(),
                    });
                    return key;
                }
            }
            else {
                self.id_table.insert(id, key);
            }
        }

        if parents.is_empty() {
            self.top_level.push(key);
            return key;
        }

        let mut pending = Vec::new();
        for parent in parents {
            if let Some(&parent_key) = self.id_table.get(&parent) {
                self.attach(parent_key, key, true);
                self.widen_synthesized_ancestors(parent_key);
            }
            else if version == Some(GffVersion::Gtf) {
                self.synthesize_ancestry(key, &parent, gtf.as_ref());
            }
            else {
                pending.push(parent);
            }
        }
        if !pending.is_empty() {
            self.orphans.push(Orphan {
                feature:         key,
                pending_parents: pending,
            });
        }
        key
    }

    /// Appends `child` to `parent`'s children and optionally widens the
    /// parent's span.
    fn attach(
        &mut self,
        parent: FeatureId,
        child: FeatureId,
        widen: bool,
    ) {
        if parent == child {
            debug!("Ignoring self-referencing parent link");
            return;
        }
        let Some((start, end)) = self
            .arena
            .get(child)
            .map(|c| (c.start(), c.end()))
        else {
            return;
        };
        if let Some(parent) = self.arena.get_mut(parent) {
            parent.add_child(child);
            if widen {
                parent.widen(start, end);
            }
        }
    }

    /// Propagates the span of a synthesized transcript to the gene made or
    /// reused for it, which has no other way to learn about later exons.
    fn widen_synthesized_ancestors(
        &mut self,
        mut node: FeatureId,
    ) {
        while let Some(&up) = self.synthesized_up.get(&node) {
            let (start, end) = {
                let f = &self.arena[node];
                (f.start(), f.end())
            };
            self.arena[up].widen(start, end);
            node = up;
        }
    }

    /// Creates an ancestor spanning exactly `child`. An id already in the
    /// table keeps pointing at the earlier feature.
    fn make_ancestor(
        &mut self,
        child: FeatureId,
        primary_tag: &str,
        id: Option<&str>,
        name: Option<&str>,
    ) -> FeatureId {
        let template = &self.arena[child];
        let mut ancestor = F::new(
            ArcStr::from(template.seq_id()),
            template.start(),
            template.end(),
            template.strand(),
            template.source().map(ArcStr::from),
            Some(ArcStr::from(primary_tag)),
        );
        if let Some(id) = id {
            ancestor.set_primary_id(id.to_string());
        }
        if let Some(name) = name {
            ancestor.set_display_name(name.to_string());
        }
        let key = self.arena.insert(ancestor);
        if let Some(id) = id {
            if self.id_table.contains_key(id) {
                debug!(
                    "Synthesized {} '{}' shares its id with a known feature; keeping the first",
                    primary_tag, id
                );
                *self.duplicates.entry(id.to_string()).or_default() += 1;
            }
            else {
                self.id_table.insert(id.to_string(), key);
            }
        }
        key
    }

    /// Fills in the gene and transcript records a GTF file left out.
    fn synthesize_ancestry(
        &mut self,
        child: FeatureId,
        declared_parent: &str,
        gtf: Option<&GtfIdentity>,
    ) {
        let empty = GtfIdentity::default();
        let gtf = gtf.unwrap_or(&empty);
        let primary_tag = self.arena[child]
            .primary_tag()
            .unwrap_or_default()
            .to_string();

        if is_gene_like(&primary_tag) {
            debug!(
                "Gene-like '{}' feature references unknown parent '{}'; left unparented",
                primary_tag, declared_parent
            );
            self.unparented.push(child);
        }
        else if is_transcript_like(&primary_tag) {
            let gene_id = gtf
                .gene_id
                .as_deref()
                .unwrap_or(declared_parent);
            let gene = self.make_ancestor(
                child,
                GENE_TYPE,
                Some(gene_id),
                gtf.gene_name.as_deref(),
            );
            self.attach(gene, child, true);
            self.top_level.push(gene);
        }
        else {
            let existing_gene = gtf
                .gene_id
                .as_ref()
                .and_then(|id| self.id_table.get(id).copied());
            let gene = match existing_gene {
                Some(gene) => gene,
                None => {
                    let gene = self.make_ancestor(
                        child,
                        GENE_TYPE,
                        gtf.gene_id.as_deref(),
                        gtf.gene_name.as_deref(),
                    );
                    self.top_level.push(gene);
                    gene
                },
            };

            let transcript_type = refine_transcript_type(
                gtf.transcript_biotype.as_deref(),
                gtf.gene_biotype.as_deref(),
                gtf.original_source.as_deref(),
            )
            .unwrap_or_else(|| TRANSCRIPT_TYPE.to_string());
            let transcript = self.make_ancestor(
                child,
                &transcript_type,
                Some(declared_parent),
                gtf.transcript_name.as_deref(),
            );
            if let Some(gene_id) = gtf.gene_id.as_ref() {
                self.arena[transcript].add_tag_value(PARENT_TAG, gene_id.clone());
            }
            self.attach(transcript, child, true);
            self.attach(gene, transcript, true);
            self.synthesized_up.insert(transcript, gene);
        }
    }

    /// Retries every orphan against the complete id table. An orphan is
    /// attached under each declared parent that is now known, without
    /// widening, and leaves the list once any parent matched. Returns the
    /// number of orphans resolved.
    pub fn resolve_orphans(&mut self) -> usize {
        let orphans = std::mem::take(&mut self.orphans);
        let mut resolved = 0;
        for orphan in orphans {
            let found: Vec<FeatureId> = orphan
                .pending_parents
                .iter()
                .filter_map(|parent| self.id_table.get(parent).copied())
                .filter(|parent_key| *parent_key != orphan.feature)
                .collect();
            if found.is_empty() {
                self.orphans.push(orphan);
                continue;
            }
            for parent_key in found {
                self.attach(parent_key, orphan.feature, false);
            }
            resolved += 1;
        }
        resolved
    }

    /// Logs the aggregate problems found during a full pass.
    pub fn report(&self) {
        if !self.orphans.is_empty() {
            warn!(
                "{} feature(s) have unresolved parents and were left as orphans",
                self.orphans.len()
            );
        }
        if !self.duplicates.is_empty() {
            warn!(
                "Duplicate feature ids found: {}",
                self.duplicates
                    .keys()
                    .sorted()
                    .join(", ")
            );
        }
        if !self.unparented.is_empty() {
            debug!(
                "{} gene-like feature(s) reference unknown parents",
                self.unparented.len()
            );
        }
    }

    pub fn feature(
        &self,
        id: FeatureId,
    ) -> Option<&F> {
        self.arena.get(id)
    }

    pub fn feature_mut(
        &mut self,
        id: FeatureId,
    ) -> Option<&mut F> {
        self.arena.get_mut(id)
    }

    /// Looks a feature up by its primary id.
    pub fn get_by_id(
        &self,
        primary_id: &str,
    ) -> Option<FeatureId> {
        self.id_table.get(primary_id).copied()
    }

    /// Features in the order they were stored, synthesized ancestors
    /// included.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, &F)> {
        self.arena.iter()
    }

    /// All features below `root`, depth first in child order. Each feature
    /// is listed once even when it is reachable through several parents.
    pub fn descendants(
        &self,
        root: FeatureId,
    ) -> Vec<FeatureId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut stack: Vec<FeatureId> = self
            .arena
            .get(root)
            .map(|f| f.children().iter().rev().copied().collect())
            .unwrap_or_default();
        seen.insert(root);
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            out.push(id);
            if let Some(f) = self.arena.get(id) {
                stack.extend(f.children().iter().rev().copied());
            }
        }
        out
    }

    pub fn top_level(&self) -> &[FeatureId] { &self.top_level }

    pub fn orphans(&self) -> &[Orphan] { &self.orphans }

    /// GTF gene-like features whose parent was unknown; they are neither
    /// top-level nor orphans.
    pub fn unparented(&self) -> &[FeatureId] { &self.unparented }

    /// Ids seen more than once (CDS excluded) and how many extra times.
    pub fn duplicates(&self) -> &HashMap<String, usize> { &self.duplicates }

    pub fn len(&self) -> usize { self.arena.len() }

    pub fn is_empty(&self) -> bool { self.arena.is_empty() }
}

