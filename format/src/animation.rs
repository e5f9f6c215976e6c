//! Skeletal animation descriptors
//!
//! Only the data layout lives here. Sampling and blending keys belongs to
//! whoever plays the animation back.

use glam::{Quat, Vec3};

use crate::endian::Data;
use crate::error::Corruption;
use crate::view::{Record, ResourceView, StringView};

/// Scale or translation key (0x10 bytes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyFrameVec3 {
    pub frame: f32,
    pub value: Vec3,
}

impl Record for KeyFrameVec3 {
    const SIZE: usize = 0x10;
    const NAME: &'static str = "vector key";

    fn read(data: Data<'_>, pos: usize) -> Self {
        Self {
            frame: data.f32(pos),
            value: data.vec3(pos + 0x04),
        }
    }
}

/// Rotation key (0x14 bytes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyFrameQuat {
    pub frame: f32,
    pub value: Quat,
}

impl Record for KeyFrameQuat {
    const SIZE: usize = 0x14;
    const NAME: &'static str = "rotation key";

    fn read(data: Data<'_>, pos: usize) -> Self {
        Self {
            frame: data.f32(pos),
            value: data.quat(pos + 0x04),
        }
    }
}

/// Key tracks for one bone (0x1C bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoneAnimationDesc {
    /// Index into the skeleton's bone array
    pub bone_index: u32,
    pub scale_keys: ResourceView<KeyFrameVec3>,
    pub rotation_keys: ResourceView<KeyFrameQuat>,
    pub translation_keys: ResourceView<KeyFrameVec3>,
}

impl Record for BoneAnimationDesc {
    const SIZE: usize = 0x1C;
    const NAME: &'static str = "bone animation";

    fn read(data: Data<'_>, pos: usize) -> Self {
        Self {
            bone_index: data.u32(pos),
            scale_keys: ResourceView::read(data, pos + 0x04),
            rotation_keys: ResourceView::read(data, pos + 0x0C),
            translation_keys: ResourceView::read(data, pos + 0x14),
        }
    }

    fn validate(data: Data<'_>, pos: usize) -> Result<(), Corruption> {
        ResourceView::<KeyFrameVec3>::parse(data, pos + 0x04)?;
        ResourceView::<KeyFrameQuat>::parse(data, pos + 0x0C)?;
        ResourceView::<KeyFrameVec3>::parse(data, pos + 0x14)?;
        Ok(())
    }
}

/// A named skeletal animation (0x18 bytes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationDesc {
    pub name: StringView,
    pub fps: f32,
    /// Length in frames
    pub duration: f32,
    pub bones: ResourceView<BoneAnimationDesc>,
}

impl Record for AnimationDesc {
    const SIZE: usize = 0x18;
    const NAME: &'static str = "animation";

    fn read(data: Data<'_>, pos: usize) -> Self {
        Self {
            name: StringView::read(data, pos),
            fps: data.f32(pos + 0x08),
            duration: data.f32(pos + 0x0C),
            bones: ResourceView::read(data, pos + 0x10),
        }
    }

    fn validate(data: Data<'_>, pos: usize) -> Result<(), Corruption> {
        StringView::parse(data, pos, "animation name")?;
        ResourceView::<BoneAnimationDesc>::parse(data, pos + 0x10)?;
        Ok(())
    }
}
