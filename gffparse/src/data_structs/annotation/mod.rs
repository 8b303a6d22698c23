mod assembler;
mod feature;
mod index;

pub use assembler::{FeatureAssembler, Orphan};
pub use feature::{Feature, FeatureId, GffFeature, PARENT_TAG};
pub use index::{FeatureIndex, GeneQuery, GeneRegion};
