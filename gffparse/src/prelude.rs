pub use crate::data_structs::annotation::{
    Feature,
    FeatureAssembler,
    FeatureId,
    FeatureIndex,
    GeneQuery,
    GeneRegion,
    GffFeature,
    Orphan,
    PARENT_TAG,
};
pub use crate::data_structs::typedef::{PosType, ScoreType, SeqNameStr};
pub use crate::data_structs::{GffVersion, Strand};
pub use crate::io::compression::Compression;
pub use crate::io::gff::{GffParser, ParserConfig};
