use std::fs::File;
use std::io::Read;
use std::path::Path;

#[cfg(not(feature = "compression"))]
use anyhow::bail;

/// Compression codec of an annotation file, detected from its extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    Gz,
    Bzip2,
    Xz2,
    Zstd,
}

impl Compression {
    pub fn name(&self) -> &str {
        match self {
            Compression::None => "none",
            Compression::Gz => "gzip",
            Compression::Bzip2 => "bzip2",
            Compression::Xz2 => "xz2",
            Compression::Zstd => "zstd",
        }
    }

    /// File extension (without the dot) this codec is recognized by.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Compression::None => None,
            Compression::Gz => Some("gz"),
            Compression::Bzip2 => Some("bz2"),
            Compression::Xz2 => Some("xz"),
            Compression::Zstd => Some("zst"),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("gz") | Some("gzip") => Compression::Gz,
            Some("bz2") => Compression::Bzip2,
            Some("xz") => Compression::Xz2,
            Some("zst") => Compression::Zstd,
            _ => Compression::None,
        }
    }

    /// Wraps the opened file in a streaming decoder.
    #[cfg(feature = "compression")]
    pub fn get_decoder(
        &self,
        handle: File,
    ) -> anyhow::Result<Box<dyn Read>> {
        let decoder: Box<dyn Read> = match self {
            // Multi-member gzip is common for bgzipped annotation files
            Compression::Gz => Box::new(flate2::read::MultiGzDecoder::new(handle)),
            Compression::Bzip2 => {
                Box::new(bzip2::read::MultiBzDecoder::new(handle))
            },
            Compression::Xz2 => Box::new(xz2::read::XzDecoder::new_multi_decoder(handle)),
            Compression::Zstd => Box::new(zstd::Decoder::new(handle)?),
            Compression::None => Box::new(handle),
        };
        Ok(decoder)
    }

    #[cfg(not(feature = "compression"))]
    pub fn get_decoder(
        &self,
        handle: File,
    ) -> anyhow::Result<Box<dyn Read>> {
        match self {
            Compression::None => Ok(Box::new(handle)),
            other => bail!(
                "Reading {} compressed input requires the `compression` feature",
                other.name()
            ),
        }
    }
}
