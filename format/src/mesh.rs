//! Mesh descriptors and vertex records

use glam::{Affine3A, EulerRot, Quat, UVec4, Vec2, Vec3, Vec4};

use crate::endian::Data;
use crate::error::Corruption;
use crate::view::{Record, ResourceView, VERTEX_ALIGNMENT};

/// One vertex: position, texture coordinate, normal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub position: Vec3,
    pub tex_coord: Vec2,
    pub normal: Vec3,
}

impl Record for Vertex {
    const SIZE: usize = 0x20;
    const ALIGN: usize = VERTEX_ALIGNMENT;
    const NAME: &'static str = "vertex";

    fn read(data: Data<'_>, pos: usize) -> Self {
        Self {
            position: data.vec3(pos),
            tex_coord: data.vec2(pos + 0x0C),
            normal: data.vec3(pos + 0x14),
        }
    }
}

/// Per-vertex skinning slots. A slot whose weight is zero is unused.
impl Record for UVec4 {
    const SIZE: usize = 0x10;
    const NAME: &'static str = "blend index";

    fn read(data: Data<'_>, pos: usize) -> Self {
        UVec4::new(
            data.u32(pos),
            data.u32(pos + 4),
            data.u32(pos + 8),
            data.u32(pos + 12),
        )
    }
}

impl Record for Vec4 {
    const SIZE: usize = 0x10;
    const NAME: &'static str = "blend weight";

    fn read(data: Data<'_>, pos: usize) -> Self {
        data.vec4(pos)
    }
}

/// A skeleton bone that deforms a mesh (0x34 bytes).
///
/// Blend indices in the mesh's vertex streams refer to these entries, not to
/// the skeleton directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBoneDesc {
    pub skeleton_bone_index: u32,
    /// Model space to bone space at bind time, 3x4 row-major
    pub offset_mtx: Affine3A,
}

impl Record for MeshBoneDesc {
    const SIZE: usize = 0x34;
    const NAME: &'static str = "mesh bone";

    fn read(data: Data<'_>, pos: usize) -> Self {
        Self {
            skeleton_bone_index: data.u32(pos),
            offset_mtx: data.mtx34(pos + 0x04),
        }
    }
}

/// Mesh record (0x50 bytes).
///
/// | Offset | Field |
/// |--------|-------|
/// | 0x00 | vertex view |
/// | 0x08 | index view (`u32`) |
/// | 0x10 | blend index view (`u32` x4 per vertex) |
/// | 0x18 | blend weight view (`f32` x4 per vertex) |
/// | 0x20 | mesh bone view |
/// | 0x28 | scale |
/// | 0x34 | rotation (Euler radians) |
/// | 0x40 | translation |
/// | 0x4C | material index |
///
/// The blend streams are either both empty or both one entry per vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshDesc {
    pub vertices: ResourceView<Vertex>,
    pub indices: ResourceView<u32>,
    pub blend_indices: ResourceView<UVec4>,
    pub blend_weights: ResourceView<Vec4>,
    pub bones: ResourceView<MeshBoneDesc>,
    pub scale: Vec3,
    pub rotation: Vec3,
    pub translation: Vec3,
    pub material_index: u32,
}

impl MeshDesc {
    /// Local transform: scale, then rotate about X, Y and Z in that order,
    /// then translate.
    pub fn local_transform(&self) -> Affine3A {
        let r = self.rotation;
        let rotation = Quat::from_euler(EulerRot::ZYX, r.z, r.y, r.x);
        Affine3A::from_scale_rotation_translation(self.scale, rotation, self.translation)
    }

    pub fn is_skinned(&self) -> bool {
        !self.bones.is_empty()
    }
}

impl Record for MeshDesc {
    const SIZE: usize = 0x50;
    const NAME: &'static str = "mesh";

    fn read(data: Data<'_>, pos: usize) -> Self {
        Self {
            vertices: ResourceView::read(data, pos),
            indices: ResourceView::read(data, pos + 0x08),
            blend_indices: ResourceView::read(data, pos + 0x10),
            blend_weights: ResourceView::read(data, pos + 0x18),
            bones: ResourceView::read(data, pos + 0x20),
            scale: data.vec3(pos + 0x28),
            rotation: data.vec3(pos + 0x34),
            translation: data.vec3(pos + 0x40),
            material_index: data.u32(pos + 0x4C),
        }
    }

    fn validate(data: Data<'_>, pos: usize) -> Result<(), Corruption> {
        let vertices = ResourceView::<Vertex>::parse(data, pos)?;
        ResourceView::<u32>::parse(data, pos + 0x08)?;
        let blend_indices = ResourceView::<UVec4>::parse(data, pos + 0x10)?;
        let blend_weights = ResourceView::<Vec4>::parse(data, pos + 0x18)?;
        let bones = ResourceView::<MeshBoneDesc>::parse(data, pos + 0x20)?;

        if blend_indices.is_empty() && blend_weights.is_empty() {
            return Ok(());
        }
        for (what, count) in [
            (UVec4::NAME, blend_indices.len()),
            (Vec4::NAME, blend_weights.len()),
        ] {
            if count != vertices.len() {
                return Err(Corruption::BlendStreamLength {
                    what,
                    count,
                    vertices: vertices.len(),
                });
            }
        }

        let slots = blend_indices.iter(data).zip(blend_weights.iter(data));
        for (vertex, (index, weight)) in slots.enumerate() {
            for slot in 0..4 {
                if weight[slot] != 0.0 && index[slot] as usize >= bones.len() {
                    return Err(Corruption::BlendIndexOutOfRange {
                        vertex,
                        index: index[slot],
                        count: bones.len(),
                    });
                }
            }
        }
        Ok(())
    }
}
