//! Model cache configuration (TOML)
//!
//! ```toml
//! [cache]
//! models_dir = "assets/models"
//! extension = "rmdl"
//! alignment = 64
//! max_file_bytes = 268435456
//! ```
//!
//! Every field is optional and falls back to its default.

use std::path::{Path, PathBuf};

use rmdl_format::{Endian, VERTEX_ALIGNMENT};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default size cap for a single model file.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 256 * 1024 * 1024; // 256 MiB

/// How the cache derives and reads model files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory prefix for model paths (default: "models")
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,
    /// File extension, without the dot (default: "rmdl")
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Alignment requested from the file device (default: 64)
    #[serde(default = "default_alignment")]
    pub alignment: usize,
    /// Largest model file that will be read (default: 256 MiB)
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    cache: CacheConfig,
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}
fn default_extension() -> String {
    "rmdl".to_string()
}
fn default_alignment() -> usize {
    VERTEX_ALIGNMENT
}
fn default_max_file_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            extension: default_extension(),
            alignment: default_alignment(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

impl CacheConfig {
    /// Load the `[cache]` section of a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.cache)
    }

    /// Path of the `endian` variant of model `base`, e.g. `models/crate_LE.rmdl`.
    pub fn model_path(&self, base: &str, endian: Endian) -> PathBuf {
        self.models_dir.join(format!(
            "{base}_{}.{}",
            endian.file_suffix(),
            self.extension
        ))
    }
}
