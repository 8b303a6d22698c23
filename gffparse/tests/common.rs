#![allow(dead_code)]
use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

#[ctor::ctor]
fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

pub fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Writes `contents` to a temporary file whose name ends with `suffix`.
pub fn write_temp(
    contents: &str,
    suffix: &str,
) -> anyhow::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}
