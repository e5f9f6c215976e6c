//! Skeleton and bone descriptors
//!
//! The skeleton is stored flat: every bone names its parent by index and
//! lists its children as an index view. Indices are not checked here; the
//! runtime skeleton resolves them and reports anything out of range.

use glam::Affine3A;

use crate::endian::Data;
use crate::error::Corruption;
use crate::view::{Record, ResourceView, StringView};

/// Bone record (0x44 bytes).
///
/// | Offset | Field |
/// |--------|-------|
/// | 0x00 | name |
/// | 0x08 | parent index (`-1` = none) |
/// | 0x0C | child index view (`s32`) |
/// | 0x14 | local transform, 3x4 row-major |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneDesc {
    pub name: StringView,
    pub parent_index: i32,
    pub children: ResourceView<i32>,
    pub local_transform: Affine3A,
}

impl Record for BoneDesc {
    const SIZE: usize = 0x44;
    const NAME: &'static str = "bone";

    fn read(data: Data<'_>, pos: usize) -> Self {
        Self {
            name: StringView::read(data, pos),
            parent_index: data.i32(pos + 0x08),
            children: ResourceView::read(data, pos + 0x0C),
            local_transform: data.mtx34(pos + 0x14),
        }
    }

    fn validate(data: Data<'_>, pos: usize) -> Result<(), Corruption> {
        StringView::parse(data, pos, "bone name")?;
        ResourceView::<i32>::parse(data, pos + 0x0C)?;
        Ok(())
    }
}

/// Skeleton block embedded in the model header: root index, then bone view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkeletonDesc {
    pub root_index: i32,
    pub bones: ResourceView<BoneDesc>,
}

impl SkeletonDesc {
    pub fn num_bones(&self) -> usize {
        self.bones.len()
    }

    pub fn bone(&self, data: Data<'_>, index: usize) -> BoneDesc {
        self.bones.get(data, index)
    }
}

impl Record for SkeletonDesc {
    const SIZE: usize = 0x0C;
    const NAME: &'static str = "skeleton";

    fn read(data: Data<'_>, pos: usize) -> Self {
        Self {
            root_index: data.i32(pos),
            bones: ResourceView::read(data, pos + 0x04),
        }
    }

    fn validate(data: Data<'_>, pos: usize) -> Result<(), Corruption> {
        ResourceView::<BoneDesc>::parse(data, pos + 0x04)?;
        Ok(())
    }
}
