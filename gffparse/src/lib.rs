//! # gffparse
//!
//! `gffparse` reads genome annotation files in the GFF1/GFF2, GTF (GFF 2.5)
//! and GFF3 dialects and assembles their features into a forest of
//! gene → transcript → exon/CDS hierarchies.
//!
//! ## Key Features
//!
//! * **Dialect detection**: the dialect is taken from the file extension
//!   (`.gff3`, `.gtf`, `.gff2`), the configuration and the `##gff-version`
//!   pragma, in increasing order of precedence.
//! * **Streaming or assembled**: features can be pulled one by one without
//!   hierarchy ([`GffParser::next_feature`]), or the whole file can be
//!   assembled into top-level features with their descendants
//!   ([`GffParser::top_features`]).
//! * **Forward references**: children listed before their parents are kept
//!   as orphans and linked after the whole file has been read.
//! * **GTF gene models**: gene and transcript records missing from GTF files
//!   are synthesized from `gene_id`/`transcript_id` attributes.
//! * **Pluggable records**: the parser builds any type implementing
//!   [`GffFeature`]; [`Feature`] is the provided one.
//! * **Compression**: gzip, bzip2, xz and zstd inputs are decoded
//!   transparently with the `compression` feature.
//!
//! ## Structure
//!
//! * [`data_structs`]: feature records, the hierarchy assembler and the
//!   lookup index.
//! * [`io`]: line classification, attribute decoding, the [`GffParser`]
//!   session and compression helpers.
//!
//! ## Usage
//!
//! ```no_run
//! use gffparse::prelude::*;
//!
//! let mut parser: GffParser = GffParser::from_path(
//!     "annotation.gff3",
//!     ParserConfig::default().with_skip_type("chromosome"),
//! )?;
//! let top = parser.top_features()?.to_vec();
//! for id in top {
//!     let gene = parser.feature(id).unwrap();
//!     let n_children = parser.assembler().descendants(id).len();
//!     println!("{} {} ({} descendants)", gene.seq_id, gene, n_children);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Logging goes through the [`log`] facade; install any logger to see
//! warnings about malformed lines, orphans and duplicate ids.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod data_structs;
pub mod io;
pub mod prelude;
pub mod utils;
