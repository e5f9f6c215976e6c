//! Model cache
//!
//! Maps caller-chosen keys to loaded models. A key is loaded at most once:
//! later requests return the same [`Model`] without touching the file device.
//! Entries live until the cache is destroyed; there is no eviction.
//!
//! The cache is not synchronised. Callers that share one across threads must
//! wrap it in their own lock.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hashbrown::HashMap;
use rmdl_format::Endian;

use crate::config::CacheConfig;
use crate::error::LoadError;
use crate::file_device::{FileDevice, StdFileDevice};
use crate::model::Model;

/// Keyed registry of loaded models.
pub struct ModelCache<D: FileDevice = StdFileDevice> {
    device: D,
    config: CacheConfig,
    // Boxed so a model's address is stable while the map grows
    models: HashMap<String, Box<Model>>,
}

impl ModelCache<StdFileDevice> {
    /// Cache reading from `root` on disk, honouring the config's size cap.
    pub fn with_root(root: impl Into<PathBuf>, config: CacheConfig) -> Self {
        let device = StdFileDevice::new(root).with_max_bytes(config.max_file_bytes);
        Self::new(device, config)
    }
}

impl<D: FileDevice> ModelCache<D> {
    pub fn new(device: D, config: CacheConfig) -> Self {
        tracing::debug!(models_dir = %config.models_dir.display(), "Model cache created");
        Self {
            device,
            config,
            models: HashMap::new(),
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Path that [`ModelCache::load_or_fetch`] reads for `base` on this target.
    pub fn model_path(&self, base: &str) -> PathBuf {
        self.config.model_path(base, Endian::NATIVE)
    }

    pub fn get(&self, key: &str) -> Option<&Model> {
        self.models.get(key).map(|model| &**model)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Model> {
        self.models.get_mut(key).map(|model| &mut **model)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.models.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Return the model cached under `key`, loading the native byte-order
    /// variant of `base` if the key is new.
    ///
    /// A failed load leaves the cache unchanged.
    pub fn load_or_fetch(&mut self, base: &str, key: &str) -> Result<&Model, LoadError> {
        if self.models.contains_key(key) {
            tracing::trace!(key, "Model cache hit");
            return Ok(&self.models[key]);
        }

        let path = self.model_path(base);
        tracing::debug!(key, path = %path.display(), "Model cache miss");

        let model = self.load(&path).inspect_err(|e| {
            tracing::warn!(key, path = %path.display(), "Failed to load model: {e}");
        })?;

        tracing::info!(
            key,
            path = %path.display(),
            meshes = model.meshes().len(),
            materials = model.materials().len(),
            bones = model.skeleton().num_bones(),
            "Model loaded"
        );
        let entry = self.models.entry(key.to_owned()).or_insert(Box::new(model));
        Ok(entry)
    }

    fn load(&self, path: &Path) -> Result<Model, LoadError> {
        if !self.device.exists(path) {
            return Err(LoadError::source_unavailable(
                path,
                io::Error::from(io::ErrorKind::NotFound),
            ));
        }
        let bytes = self.device.load(path, self.config.alignment)?;
        Model::build(Arc::new(bytes), Endian::NATIVE)
    }

    /// Release every cached model.
    pub fn destroy(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.models.is_empty() {
            return;
        }
        tracing::debug!(count = self.models.len(), "Releasing cached models");
        self.models.clear();
    }
}

impl<D: FileDevice> Drop for ModelCache<D> {
    fn drop(&mut self) {
        self.release();
    }
}
