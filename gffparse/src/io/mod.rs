pub mod compression;
pub mod gff;
