//! Reading a single model file from disk

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use rmdl_format::Endian;
use rmdl_runtime::{DEFAULT_MAX_FILE_BYTES, Model};

/// Model file selection shared by the inspection commands
#[derive(Args)]
pub struct ModelFileArgs {
    /// Model file (.rmdl)
    pub file: PathBuf,

    /// Read the file as big-endian (default: little-endian)
    #[arg(long)]
    pub big_endian: bool,
}

impl ModelFileArgs {
    pub fn endian(&self) -> Endian {
        if self.big_endian {
            Endian::Big
        } else {
            Endian::Little
        }
    }
}

/// Read a model file into memory, refusing files over `max_bytes`.
pub fn read_file_with_limit(path: &Path, max_bytes: u64) -> Result<Vec<u8>> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat model file: {}", path.display()))?;
    let len = metadata.len();
    if len > max_bytes {
        anyhow::bail!(
            "Model file too large: {} ({} bytes, max {} bytes)",
            path.display(),
            len,
            max_bytes
        );
    }
    std::fs::read(path).with_context(|| format!("Failed to read model file: {}", path.display()))
}

/// Read and build the model named by `args`.
pub fn read_model(args: &ModelFileArgs) -> Result<Model> {
    let bytes = read_file_with_limit(&args.file, DEFAULT_MAX_FILE_BYTES)?;
    Model::from_slice(&bytes, args.endian())
        .with_context(|| format!("Invalid model: {}", args.file.display()))
}
