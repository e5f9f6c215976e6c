//! Model file header and the validated resource model
//!
//! # Layout
//! ```text
//! 0x00: magic "riomodel"
//! 0x08: version u32
//! 0x0C: file size u32 (must equal the buffer length)
//! 0x10: mesh view          -> MeshDesc[]
//! 0x18: material view      -> MaterialDesc[]
//! 0x20: skeleton root s32
//! 0x24: bone view          -> BoneDesc[]
//! 0x2C: animation view     -> AnimationDesc[]
//! ```
//!
//! Every view is an `s32` offset relative to its own field plus a `u32`
//! count. Record layouts are documented on the descriptor types.

use crate::animation::AnimationDesc;
use crate::endian::{Data, Endian};
use crate::error::FormatError;
use crate::material::MaterialDesc;
use crate::mesh::MeshDesc;
use crate::skeleton::SkeletonDesc;
use crate::view::{Record, ResourceView, ViewIter};

/// File signature.
pub const FORMAT_MAGIC: [u8; 8] = *b"riomodel";

/// Oldest version this crate reads.
pub const VERSION_MIN: u32 = 0x0100_0000;

/// Version written by [`ModelWriter`](crate::ModelWriter).
pub const VERSION_CURRENT: u32 = 0x0100_0000;

/// Size of the fixed header.
pub const HEADER_SIZE: usize = 0x34;

/// Decoded model header. Views are absolute offsets into the model buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelHeader {
    pub version: u32,
    pub file_size: u32,
    pub meshes: ResourceView<MeshDesc>,
    pub materials: ResourceView<MaterialDesc>,
    pub skeleton: SkeletonDesc,
    pub animations: ResourceView<AnimationDesc>,
}

impl ModelHeader {
    fn read(data: Data<'_>) -> Self {
        Self {
            version: data.u32(0x08),
            file_size: data.u32(0x0C),
            meshes: ResourceView::read(data, 0x10),
            materials: ResourceView::read(data, 0x18),
            skeleton: SkeletonDesc::read(data, 0x20),
            animations: ResourceView::read(data, 0x2C),
        }
    }
}

/// A validated, read-only overlay of a model buffer.
///
/// Parsing copies nothing and allocates nothing. Element accessors read
/// straight from the borrowed bytes.
#[derive(Debug, Clone, Copy)]
pub struct ResModel<'a> {
    data: Data<'a>,
    header: ModelHeader,
}

impl<'a> ResModel<'a> {
    /// Validate `bytes` as a model stored in `endian` byte order.
    ///
    /// Checks run in order: header length, signature, version, declared size,
    /// then every view reachable from the header (bounds, alignment, strings).
    pub fn parse(bytes: &'a [u8], endian: Endian) -> Result<Self, FormatError> {
        if bytes.len() < HEADER_SIZE {
            return Err(FormatError::Truncated {
                actual: bytes.len(),
                minimum: HEADER_SIZE,
            });
        }

        let mut magic = [0u8; 8];
        magic.copy_from_slice(&bytes[..8]);
        if magic != FORMAT_MAGIC {
            return Err(FormatError::MalformedFormat { found: magic });
        }

        let data = Data::new(bytes, endian);
        let version = data.u32(0x08);
        if !(VERSION_MIN..=VERSION_CURRENT).contains(&version) {
            return Err(FormatError::UnsupportedVersion {
                found: version,
                min: VERSION_MIN,
                max: VERSION_CURRENT,
            });
        }

        let file_size = data.u32(0x0C);
        if file_size as usize != bytes.len() {
            return Err(FormatError::SizeMismatch {
                declared: file_size,
                actual: bytes.len(),
            });
        }

        ResourceView::<MeshDesc>::parse(data, 0x10)?;
        ResourceView::<MaterialDesc>::parse(data, 0x18)?;
        SkeletonDesc::validate(data, 0x20)?;
        ResourceView::<AnimationDesc>::parse(data, 0x2C)?;

        Ok(Self {
            data,
            header: ModelHeader::read(data),
        })
    }

    /// Rebuild an overlay from a header previously returned by
    /// [`ResModel::header`] for these same bytes, skipping validation.
    ///
    /// # Panics
    /// If the header's declared size differs from `data.len()`. A header taken
    /// from a different buffer of the same size is not detected, and element
    /// accessors may then panic.
    #[doc(hidden)]
    pub fn with_header(data: Data<'a>, header: ModelHeader) -> Self {
        assert_eq!(
            header.file_size as usize,
            data.len(),
            "model header does not belong to this buffer"
        );
        Self { data, header }
    }

    pub fn data(&self) -> Data<'a> {
        self.data
    }

    pub fn header(&self) -> &ModelHeader {
        &self.header
    }

    pub fn endian(&self) -> Endian {
        self.data.endian()
    }

    pub fn version(&self) -> u32 {
        self.header.version
    }

    pub fn file_size(&self) -> u32 {
        self.header.file_size
    }

    pub fn num_meshes(&self) -> usize {
        self.header.meshes.len()
    }

    pub fn mesh(&self, index: usize) -> MeshDesc {
        self.header.meshes.get(self.data, index)
    }

    pub fn meshes(&self) -> ViewIter<'a, MeshDesc> {
        self.header.meshes.iter(self.data)
    }

    pub fn num_materials(&self) -> usize {
        self.header.materials.len()
    }

    pub fn material(&self, index: usize) -> MaterialDesc {
        self.header.materials.get(self.data, index)
    }

    pub fn materials(&self) -> ViewIter<'a, MaterialDesc> {
        self.header.materials.iter(self.data)
    }

    pub fn skeleton(&self) -> &SkeletonDesc {
        &self.header.skeleton
    }

    pub fn num_animations(&self) -> usize {
        self.header.animations.len()
    }

    pub fn animation(&self, index: usize) -> AnimationDesc {
        self.header.animations.get(self.data, index)
    }

    pub fn animations(&self) -> ViewIter<'a, AnimationDesc> {
        self.header.animations.iter(self.data)
    }

    /// Resolve a string view against this model's bytes.
    pub fn str(&self, view: crate::StringView) -> &'a str {
        view.as_str(self.data)
    }
}
