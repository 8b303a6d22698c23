//! Core data structures of the crate.
//!
//! - [`annotation`]: the [`Feature`](annotation::Feature) record and the
//!   [`GffFeature`](annotation::GffFeature) capability trait, the
//!   [`FeatureAssembler`](annotation::FeatureAssembler) that turns a stream of
//!   features into a gene → transcript → exon forest, and the
//!   [`FeatureIndex`](annotation::FeatureIndex) lookups derived from it.
//! - [`Strand`] and [`GffVersion`], the enumerations shared by the parser and
//!   the records.
//! - [`typedef`]: aliases for coordinates, scores and shared sequence names.

pub mod annotation;
mod enums;
pub mod typedef;

pub use enums::{GffVersion, Strand};
