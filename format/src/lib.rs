//! Binary model resource format (.rmdl)
//!
//! This crate turns a contiguous model file into a validated, read-only
//! overlay. Nothing is copied: every array in the file is exposed as a
//! [`ResourceView`] (start offset + element count) and all element access goes
//! through bounds-checked, byte-order-aware accessors over the caller's buffer.
//!
//! # Modules
//!
//! - [`model`] - File header, format constants and [`ResModel::parse`]
//! - [`view`] - Typed array views and the [`Record`] trait
//! - [`mesh`], [`material`], [`skeleton`], [`animation`] - Descriptor records
//! - [`writer`] - [`ModelWriter`] for producing model files
//!
//! # Example
//!
//! ```
//! use rmdl_format::{Endian, ModelWriter, ResModel};
//!
//! let bytes = ModelWriter::new().to_bytes(Endian::NATIVE);
//! let model = ResModel::parse(&bytes, Endian::NATIVE).unwrap();
//! assert_eq!(model.num_meshes(), 0);
//! assert_eq!(model.skeleton().num_bones(), 0);
//! ```

pub mod animation;
pub mod endian;
pub mod error;
pub mod material;
pub mod mesh;
pub mod model;
pub mod skeleton;
pub mod view;
pub mod writer;

pub use animation::{AnimationDesc, BoneAnimationDesc, KeyFrameQuat, KeyFrameVec3};
pub use endian::{Data, Endian};
pub use error::{Corruption, FormatError};
pub use material::{MaterialDesc, MaterialFlags, RenderFlags, TextureRefDesc};
pub use mesh::{MeshBoneDesc, MeshDesc, Vertex};
pub use model::{
    FORMAT_MAGIC, HEADER_SIZE, ModelHeader, ResModel, VERSION_CURRENT, VERSION_MIN,
};
pub use skeleton::{BoneDesc, SkeletonDesc};
pub use view::{Record, ResourceView, StringView, VERTEX_ALIGNMENT, VIEW_SIZE, ViewIter};
pub use writer::{
    AnimationSource, BoneAnimationSource, BoneSource, MaterialSource, MeshBoneSource, MeshSource,
    ModelWriter, TextureSource,
};
