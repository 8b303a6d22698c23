use arcstr::ArcStr;

/// 1-based inclusive genomic coordinate.
pub type PosType = u32;
pub type ScoreType = f64;
/// Shared string used for the sequence name, source and type columns, which
/// repeat heavily across a file.
pub type SeqNameStr = ArcStr;
