//! Runtime load errors

use std::io;
use std::path::PathBuf;

use rmdl_format::{Corruption, FormatError};

/// Failure to turn a model source into a runtime model.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("Model source unavailable: {}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to allocate {bytes} bytes aligned to {alignment}")]
    AllocationFailure { bytes: usize, alignment: usize },
}

/// Broad category of a [`LoadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedFormat,
    UnsupportedVersion,
    SizeMismatch,
    CorruptAsset,
    SourceUnavailable,
    AllocationFailure,
}

impl LoadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            // A buffer too short to hold a header cannot carry a valid signature
            LoadError::Format(FormatError::Truncated { .. }) => ErrorKind::MalformedFormat,
            LoadError::Format(FormatError::MalformedFormat { .. }) => ErrorKind::MalformedFormat,
            LoadError::Format(FormatError::UnsupportedVersion { .. }) => {
                ErrorKind::UnsupportedVersion
            }
            LoadError::Format(FormatError::SizeMismatch { .. }) => ErrorKind::SizeMismatch,
            LoadError::Format(FormatError::CorruptAsset(_)) => ErrorKind::CorruptAsset,
            LoadError::SourceUnavailable { .. } => ErrorKind::SourceUnavailable,
            LoadError::AllocationFailure { .. } => ErrorKind::AllocationFailure,
        }
    }

    pub(crate) fn source_unavailable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LoadError::SourceUnavailable {
            path: path.into(),
            source,
        }
    }
}

impl From<Corruption> for LoadError {
    fn from(corruption: Corruption) -> Self {
        LoadError::Format(FormatError::CorruptAsset(corruption))
    }
}

/// Failure to read a cache configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
