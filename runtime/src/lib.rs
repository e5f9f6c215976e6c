//! Runtime model graph and model cache
//!
//! A [`Model`] is built over a validated [`rmdl_format::ResModel`]: meshes,
//! materials and bones become runtime objects addressed by typed indices
//! ([`MeshId`], [`MaterialId`], [`BoneId`]), and every cross-reference stored
//! in the file is resolved and range-checked once, at build time.
//!
//! [`ModelCache`] owns loaded models by key and reads each source at most
//! once through a [`FileDevice`].
//!
//! ```
//! use rmdl_format::{Endian, ModelWriter};
//! use rmdl_runtime::{CacheConfig, MemoryFileDevice, ModelCache};
//!
//! let config = CacheConfig::default();
//! let mut device = MemoryFileDevice::new();
//! device.insert(
//!     config.model_path("empty", Endian::NATIVE),
//!     ModelWriter::new().to_bytes(Endian::NATIVE),
//! );
//!
//! let mut cache = ModelCache::new(device, config);
//! let model = cache.load_or_fetch("empty", "empty").unwrap();
//! assert!(model.meshes().is_empty());
//! assert!(model.skeleton().root().is_none());
//! ```

pub mod bytes;
pub mod cache;
pub mod config;
pub mod error;
pub mod file_device;
pub mod material;
pub mod mesh;
pub mod model;
pub mod skeleton;

pub use bytes::{MAX_ALIGNMENT, ModelBytes};
pub use cache::ModelCache;
pub use config::{CacheConfig, DEFAULT_MAX_FILE_BYTES};
pub use error::{ConfigError, ErrorKind, LoadError};
pub use file_device::{FileDevice, MemoryFileDevice, StdFileDevice};
pub use material::{Material, MaterialId, TextureRef};
pub use mesh::{Mesh, MeshId};
pub use model::{Model, ModelId};
pub use skeleton::{Bone, BoneId, Skeleton, Walk};
