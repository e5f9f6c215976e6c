//! File device abstraction
//!
//! The cache never touches the filesystem directly. It asks a [`FileDevice`]
//! for the bytes behind a relative path, which keeps the load path testable
//! and lets embedders serve models from archives or memory.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use hashbrown::HashMap;

use crate::bytes::ModelBytes;
use crate::config::DEFAULT_MAX_FILE_BYTES;
use crate::error::LoadError;

/// Source of raw model bytes.
pub trait FileDevice {
    /// Whether `path` can be loaded.
    fn exists(&self, path: &Path) -> bool;

    /// Read the whole file at `path` into a buffer aligned to `alignment`.
    fn load(&self, path: &Path, alignment: usize) -> Result<ModelBytes, LoadError>;
}

/// Reads files below a root directory.
#[derive(Debug, Clone)]
pub struct StdFileDevice {
    root: PathBuf,
    max_bytes: u64,
}

impl StdFileDevice {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    /// Reject files larger than `max_bytes`.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl FileDevice for StdFileDevice {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn load(&self, path: &Path, alignment: usize) -> Result<ModelBytes, LoadError> {
        let full = self.resolve(path);
        let unavailable = |source: io::Error| LoadError::source_unavailable(&full, source);

        let mut file = File::open(&full).map_err(unavailable)?;
        let len = file.metadata().map_err(unavailable)?.len();
        if len > self.max_bytes {
            return Err(unavailable(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("file too large ({len} bytes, max {} bytes)", self.max_bytes),
            )));
        }

        let mut bytes = ModelBytes::zeroed(len as usize, alignment)?;
        file.read_exact(bytes.as_mut_slice()).map_err(unavailable)?;
        tracing::trace!(path = %full.display(), len, "Read model file");
        Ok(bytes)
    }
}

/// In-memory file table. Counts every successful load.
#[derive(Debug, Default)]
pub struct MemoryFileDevice {
    files: HashMap<PathBuf, Vec<u8>>,
    reads: AtomicUsize,
}

impl MemoryFileDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, bytes: Vec<u8>) {
        self.files.insert(path.into(), bytes);
    }

    pub fn remove(&mut self, path: &Path) -> Option<Vec<u8>> {
        self.files.remove(path)
    }

    /// Number of loads served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl FileDevice for MemoryFileDevice {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn load(&self, path: &Path, alignment: usize) -> Result<ModelBytes, LoadError> {
        let Some(source) = self.files.get(path) else {
            return Err(LoadError::source_unavailable(
                path,
                io::Error::from(io::ErrorKind::NotFound),
            ));
        };
        let bytes = ModelBytes::copy_from(source, alignment)?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(bytes)
    }
}
