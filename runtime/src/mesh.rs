//! Runtime meshes

use glam::{Affine3A, UVec4, Vec4};
use rmdl_format::{MeshBoneDesc, MeshDesc, ResourceView, Vertex, ViewIter};

use crate::material::MaterialId;
use crate::model::{ModelId, ModelSource};
use crate::skeleton::{Bone, Skeleton};

/// Index of a mesh within its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub(crate) u32);

impl MeshId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A mesh of a loaded model: its descriptor, transforms and material.
#[derive(Debug)]
pub struct Mesh {
    id: MeshId,
    model: ModelId,
    source: ModelSource,
    desc: MeshDesc,
    local_mtx: Affine3A,
    world_mtx: Affine3A,
    material: Option<MaterialId>,
    bone_transforms: Vec<Affine3A>,
}

impl Mesh {
    pub(crate) fn new(id: MeshId, model: ModelId, source: ModelSource, desc: MeshDesc) -> Self {
        let local_mtx = desc.local_transform();
        Self {
            id,
            model,
            source,
            desc,
            local_mtx,
            world_mtx: local_mtx,
            material: None,
            bone_transforms: Vec::new(),
        }
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    /// Model that owns this mesh.
    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn desc(&self) -> &MeshDesc {
        &self.desc
    }

    pub fn local_mtx(&self) -> &Affine3A {
        &self.local_mtx
    }

    /// Model-to-world transform times the local transform.
    pub fn world_mtx(&self) -> &Affine3A {
        &self.world_mtx
    }

    /// Material assigned at build time.
    pub fn material(&self) -> Option<MaterialId> {
        self.material
    }

    pub(crate) fn set_material(&mut self, material: MaterialId) {
        debug_assert!(self.material.is_none(), "mesh material assigned twice");
        self.material = Some(material);
    }

    pub(crate) fn update_world_mtx(&mut self, model_world_mtx: &Affine3A) {
        self.world_mtx = *model_world_mtx * self.local_mtx;
    }

    pub fn vertex_view(&self) -> ResourceView<Vertex> {
        self.desc.vertices
    }

    pub fn index_view(&self) -> ResourceView<u32> {
        self.desc.indices
    }

    pub fn num_vertices(&self) -> usize {
        self.desc.vertices.len()
    }

    pub fn num_indices(&self) -> usize {
        self.desc.indices.len()
    }

    pub fn vertices(&self) -> ViewIter<'_, Vertex> {
        self.desc.vertices.iter(self.source.data())
    }

    pub fn indices(&self) -> ViewIter<'_, u32> {
        self.desc.indices.iter(self.source.data())
    }

    /// Raw vertex data in file byte order, 64-byte aligned.
    pub fn vertex_bytes(&self) -> &[u8] {
        let view = self.desc.vertices;
        self.source.data().slice(view.start(), view.byte_len())
    }

    /// Raw index data in file byte order.
    pub fn index_bytes(&self) -> &[u8] {
        let view = self.desc.indices;
        self.source.data().slice(view.start(), view.byte_len())
    }

    pub fn is_skinned(&self) -> bool {
        self.desc.is_skinned()
    }

    pub fn num_bones(&self) -> usize {
        self.desc.bones.len()
    }

    /// Skeleton bones deforming this mesh, in blend-index order.
    pub fn bones(&self) -> ViewIter<'_, MeshBoneDesc> {
        self.desc.bones.iter(self.source.data())
    }

    /// Per-vertex mesh bone slots. Empty for unskinned meshes.
    pub fn blend_indices(&self) -> ViewIter<'_, UVec4> {
        self.desc.blend_indices.iter(self.source.data())
    }

    /// Per-vertex slot weights. Empty for unskinned meshes.
    pub fn blend_weights(&self) -> ViewIter<'_, Vec4> {
        self.desc.blend_weights.iter(self.source.data())
    }

    /// Position of `bone` in this mesh's bone list, or `None` if the bone does
    /// not deform the mesh or belongs to another model's skeleton.
    pub fn mesh_bone_index(&self, skeleton: &Skeleton, bone: &Bone) -> Option<usize> {
        if skeleton.owner() != self.model {
            return None;
        }
        let id = skeleton.bone_index(bone)?;
        self.bones()
            .position(|mesh_bone| mesh_bone.skeleton_bone_index as usize == id.index())
    }

    /// Bind-pose skinning matrices, one per mesh bone: the bone's model-space
    /// bind transform times its offset matrix.
    pub fn bone_transforms(&self) -> &[Affine3A] {
        &self.bone_transforms
    }

    /// `bind_pose` is [`Skeleton::bind_pose`] of the owning model, whose bone
    /// count every mesh bone index has been checked against.
    pub(crate) fn calc_bone_base_transforms(&mut self, bind_pose: &[Affine3A]) {
        let transforms = self
            .bones()
            .map(|bone| bind_pose[bone.skeleton_bone_index as usize] * bone.offset_mtx)
            .collect();
        self.bone_transforms = transforms;
    }
}
