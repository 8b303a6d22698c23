//! GFF/GTF reading.
//!
//! Lines are classified by [`line::classify_line`], attributes decoded by
//! [`attributes::ParsedAttributes`] and turned into features by
//! [`builder::build_feature`]. [`GffParser`] drives the whole pipeline and
//! assembles the feature hierarchy.

pub mod attributes;
pub mod builder;
mod config;
pub mod line;
mod reader;

pub use config::ParserConfig;
pub use reader::GffParser;
