//! Runtime models
//!
//! [`Model::build`] turns a validated buffer into meshes, materials and a
//! skeleton. Every runtime object shares the buffer through an [`Arc`], so
//! descriptors and strings stay readable for as long as any of them lives.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Affine3A;
use rmdl_format::{Corruption, Data, Endian, ModelHeader, ResModel, VERTEX_ALIGNMENT};

use crate::bytes::ModelBytes;
use crate::error::LoadError;
use crate::material::{Material, MaterialId};
use crate::mesh::{Mesh, MeshId};
use crate::skeleton::Skeleton;

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a built model, unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(u64);

impl ModelId {
    fn next() -> Self {
        Self(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Shared handle on the bytes a model was built from.
#[derive(Debug, Clone)]
pub(crate) struct ModelSource {
    bytes: Arc<ModelBytes>,
    endian: Endian,
}

impl ModelSource {
    pub(crate) fn data(&self) -> Data<'_> {
        Data::new(self.bytes.as_slice(), self.endian)
    }
}

/// Reserve room for `len` elements, reporting failure instead of aborting.
pub(crate) fn try_vec<T>(len: usize) -> Result<Vec<T>, LoadError> {
    let mut items = Vec::new();
    items
        .try_reserve_exact(len)
        .map_err(|_| LoadError::AllocationFailure {
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
            alignment: std::mem::align_of::<T>(),
        })?;
    Ok(items)
}

/// A loaded model: meshes wired to materials, plus its skeleton.
#[derive(Debug)]
pub struct Model {
    id: ModelId,
    // Declaration order is drop order: meshes go before the materials they use
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
    skeleton: Skeleton,
    header: ModelHeader,
    source: ModelSource,
    model_world_mtx: Affine3A,
}

impl Model {
    /// Validate `bytes` and build the runtime graph over them.
    pub fn build(bytes: Arc<ModelBytes>, endian: Endian) -> Result<Self, LoadError> {
        let source = ModelSource { bytes, endian };
        let res = ResModel::parse(source.bytes.as_slice(), endian)?;
        let id = ModelId::next();

        let mut meshes = try_vec::<Mesh>(res.num_meshes())?;
        for (index, desc) in res.meshes().enumerate() {
            meshes.push(Mesh::new(MeshId(index as u32), id, source.clone(), desc));
        }

        let mut materials = try_vec::<Material>(res.num_materials())?;
        for (index, desc) in res.materials().enumerate() {
            materials.push(Material::new(
                MaterialId(index as u32),
                id,
                source.clone(),
                desc,
            ));
        }

        let count = materials.len();
        for mesh in &mut meshes {
            let index = mesh.desc().material_index;
            let material = materials.get_mut(index as usize).ok_or(
                Corruption::MaterialIndexOutOfRange {
                    mesh: mesh.id().index(),
                    index,
                    count,
                },
            )?;
            mesh.set_material(material.id());
            material.push_mesh(mesh.id());
        }

        let skeleton = Skeleton::build(&res, id, &source)?;

        let bone_count = skeleton.num_bones();
        for (animation, desc) in res.animations().enumerate() {
            for track in desc.bones.iter(res.data()) {
                if track.bone_index as usize >= bone_count {
                    return Err(Corruption::AnimationBoneOutOfRange {
                        animation,
                        index: track.bone_index,
                        count: bone_count,
                    }
                    .into());
                }
            }
        }

        for mesh in &meshes {
            for (slot, bone) in mesh.bones().enumerate() {
                if bone.skeleton_bone_index as usize >= bone_count {
                    return Err(Corruption::MeshBoneOutOfRange {
                        mesh: mesh.id().index(),
                        slot,
                        index: bone.skeleton_bone_index,
                        count: bone_count,
                    }
                    .into());
                }
            }
        }
        if meshes.iter().any(Mesh::is_skinned) {
            let bind_pose = skeleton.bind_pose();
            for mesh in &mut meshes {
                mesh.calc_bone_base_transforms(&bind_pose);
            }
        }

        let header = *res.header();
        tracing::debug!(
            model = id.get(),
            meshes = meshes.len(),
            materials = materials.len(),
            bones = bone_count,
            animations = res.num_animations(),
            "Model built"
        );

        Ok(Self {
            id,
            meshes,
            materials,
            skeleton,
            header,
            source,
            model_world_mtx: Affine3A::IDENTITY,
        })
    }

    /// Copy `bytes` into an aligned buffer and build from it.
    pub fn from_slice(bytes: &[u8], endian: Endian) -> Result<Self, LoadError> {
        let bytes = ModelBytes::copy_from(bytes, VERTEX_ALIGNMENT)?;
        Self::build(Arc::new(bytes), endian)
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    /// The validated resource view this model was built from.
    pub fn res(&self) -> ResModel<'_> {
        ResModel::with_header(self.source.data(), self.header)
    }

    pub fn bytes(&self) -> &Arc<ModelBytes> {
        &self.source.bytes
    }

    pub fn endian(&self) -> Endian {
        self.source.endian
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// # Panics
    /// If `id` does not belong to this model.
    pub fn mesh(&self, id: MeshId) -> &Mesh {
        &self.meshes[id.index()]
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// # Panics
    /// If `id` does not belong to this model.
    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.index()]
    }

    /// The material assigned to `mesh`.
    pub fn mesh_material(&self, mesh: &Mesh) -> Option<&Material> {
        mesh.material().map(|id| self.material(id))
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn num_animations(&self) -> usize {
        self.header.animations.len()
    }

    /// Index of the skeletal animation called `name`.
    pub fn skeletal_animation_index(&self, name: &str) -> Option<usize> {
        let res = self.res();
        res.animations()
            .position(|animation| res.str(animation.name) == name)
    }

    pub fn model_world_mtx(&self) -> &Affine3A {
        &self.model_world_mtx
    }

    /// Set the model-to-world transform and refresh every mesh's world
    /// transform.
    pub fn set_model_world_mtx(&mut self, mtx: Affine3A) {
        self.model_world_mtx = mtx;
        for mesh in &mut self.meshes {
            mesh.update_world_mtx(&mtx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use glam::{Quat, Vec3};
    use glam::{UVec4, Vec4};
    use rmdl_format::{
        AnimationSource, BoneAnimationSource, BoneSource, FormatError, MaterialFlags,
        MaterialSource, MeshBoneSource, MeshSource, ModelWriter, RenderFlags, TextureSource,
        Vertex,
    };

    fn material(name: &str) -> MaterialSource {
        MaterialSource {
            name: name.into(),
            shader_name: "lit".into(),
            flags: MaterialFlags::VISIBLE,
            ..MaterialSource::default()
        }
    }

    fn mesh(material_index: u32) -> MeshSource {
        MeshSource {
            vertices: vec![Vertex::default(); 3],
            indices: vec![0, 1, 2],
            material_index,
            ..MeshSource::default()
        }
    }

    #[test]
    fn test_empty_model() {
        let bytes = ModelWriter::new().to_bytes(Endian::NATIVE);
        let model = Model::from_slice(&bytes, Endian::NATIVE).unwrap();
        assert!(model.meshes().is_empty());
        assert!(model.materials().is_empty());
        assert!(model.skeleton().is_empty());
        assert!(model.skeleton().root().is_none());
        assert_eq!(model.num_animations(), 0);
    }

    #[test]
    fn test_meshes_wired_to_materials() {
        let mut writer = ModelWriter::new();
        writer.push_material(material("body"));
        writer.push_material(material("glass"));
        writer.push_mesh(mesh(1));
        writer.push_mesh(mesh(0));
        writer.push_mesh(mesh(1));
        let model = Model::from_slice(&writer.to_bytes(Endian::Little), Endian::Little).unwrap();

        for mesh in model.meshes() {
            let assigned = model.mesh_material(mesh).unwrap();
            assert_eq!(assigned.id().index() as u32, mesh.desc().material_index);
            assert_eq!(
                assigned.meshes().iter().filter(|&&id| id == mesh.id()).count(),
                1
            );
            assert_eq!(mesh.model(), model.id());
        }

        let glass = model.material(MaterialId(1));
        assert_eq!(glass.name(), "glass");
        assert_eq!(glass.meshes(), &[MeshId(0), MeshId(2)]);
        assert_eq!(model.material(MaterialId(0)).meshes(), &[MeshId(1)]);
    }

    #[test]
    fn test_material_index_one_past_end() {
        let mut writer = ModelWriter::new();
        writer.push_material(material("only"));
        writer.push_mesh(mesh(0));
        writer.push_mesh(mesh(1));

        let err = Model::from_slice(&writer.to_bytes(Endian::Little), Endian::Little).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptAsset);
        assert!(matches!(
            err,
            LoadError::Format(FormatError::CorruptAsset(Corruption::MaterialIndexOutOfRange {
                mesh: 1,
                index: 1,
                count: 1
            }))
        ));
    }

    #[test]
    fn test_mesh_without_materials_is_corrupt() {
        let mut writer = ModelWriter::new();
        writer.push_mesh(mesh(0));
        let err = Model::from_slice(&writer.to_bytes(Endian::Little), Endian::Little).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptAsset);
    }

    #[test]
    fn test_header_errors_surface() {
        let mut bytes = ModelWriter::new().to_bytes(Endian::Little);
        bytes[0] = b'x';
        let err = Model::from_slice(&bytes, Endian::Little).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedFormat);

        let mut bytes = ModelWriter::new().to_bytes(Endian::Little);
        bytes.push(0);
        let err = Model::from_slice(&bytes, Endian::Little).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SizeMismatch);

        let bytes = ModelWriter::new().version(0x0200_0000).to_bytes(Endian::Little);
        let err = Model::from_slice(&bytes, Endian::Little).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedVersion);

        let err = Model::from_slice(&[0; 8], Endian::Little).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedFormat);
    }

    #[test]
    fn test_world_mtx_follows_model() {
        let mut writer = ModelWriter::new();
        writer.push_material(material("m"));
        writer.push_mesh(MeshSource {
            translation: Vec3::new(0.0, 1.0, 0.0),
            ..mesh(0)
        });
        let mut model = Model::from_slice(&writer.to_bytes(Endian::Big), Endian::Big).unwrap();

        let mesh = &model.meshes()[0];
        assert_eq!(mesh.world_mtx(), mesh.local_mtx());

        model.set_model_world_mtx(Affine3A::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        let origin = model.meshes()[0].world_mtx().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(10.0, 1.0, 0.0), 1e-6));

        model.set_model_world_mtx(Affine3A::from_scale(Vec3::splat(2.0)));
        let origin = model.meshes()[0].world_mtx().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-6));
    }

    #[test]
    fn test_mesh_data_access() {
        let mut writer = ModelWriter::new();
        writer.push_material(MaterialSource {
            textures: vec![TextureSource {
                name: "albedo".into(),
                sampler_name: "nearest".into(),
            }],
            render_flags: RenderFlags::TRANSLUCENT,
            ..material("m")
        });
        writer.push_mesh(MeshSource {
            vertices: vec![
                Vertex {
                    position: Vec3::X,
                    ..Vertex::default()
                },
                Vertex {
                    position: Vec3::Y,
                    ..Vertex::default()
                },
            ],
            indices: vec![1, 0],
            ..mesh(0)
        });
        let model = Model::from_slice(&writer.to_bytes(Endian::NATIVE), Endian::NATIVE).unwrap();

        let mesh = &model.meshes()[0];
        assert_eq!(mesh.num_vertices(), 2);
        assert_eq!(mesh.vertices().map(|v| v.position).collect::<Vec<_>>(), vec![Vec3::X, Vec3::Y]);
        assert_eq!(mesh.indices().collect::<Vec<_>>(), vec![1, 0]);
        assert_eq!(mesh.vertex_bytes().len(), 2 * 0x20);
        assert_eq!(mesh.vertex_bytes().as_ptr() as usize % VERTEX_ALIGNMENT, 0);
        assert_eq!(mesh.index_bytes().len(), 8);

        let material = model.mesh_material(mesh).unwrap();
        assert_eq!(material.shader_name(), "lit");
        assert!(material.is_visible());
        assert!(material.is_translucent());
        let textures: Vec<_> = material.textures().collect();
        assert_eq!(textures.len(), 1);
        assert_eq!(textures[0].name, "albedo");
        assert_eq!(textures[0].sampler_name, "nearest");
    }

    #[test]
    fn test_skeletal_animation_lookup() {
        let mut writer = ModelWriter::new();
        writer.push_bone(BoneSource {
            name: "root".into(),
            ..BoneSource::default()
        });
        writer.set_root_index(0);
        for name in ["idle", "walk"] {
            writer.push_animation(AnimationSource {
                name: name.into(),
                fps: 30.0,
                duration: 10.0,
                bones: vec![BoneAnimationSource {
                    bone_index: 0,
                    rotation_keys: vec![rmdl_format::KeyFrameQuat {
                        frame: 0.0,
                        value: Quat::IDENTITY,
                    }],
                    ..BoneAnimationSource::default()
                }],
            });
        }
        let model = Model::from_slice(&writer.to_bytes(Endian::Little), Endian::Little).unwrap();

        assert_eq!(model.num_animations(), 2);
        assert_eq!(model.skeletal_animation_index("walk"), Some(1));
        assert_eq!(model.skeletal_animation_index("idle"), Some(0));
        assert_eq!(model.skeletal_animation_index("run"), None);
    }

    #[test]
    fn test_animation_bone_index_checked() {
        let mut writer = ModelWriter::new();
        writer.push_animation(AnimationSource {
            name: "stray".into(),
            bones: vec![BoneAnimationSource {
                bone_index: 0,
                ..BoneAnimationSource::default()
            }],
            ..AnimationSource::default()
        });
        let err = Model::from_slice(&writer.to_bytes(Endian::Little), Endian::Little).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Format(FormatError::CorruptAsset(Corruption::AnimationBoneOutOfRange {
                animation: 0,
                index: 0,
                count: 0
            }))
        ));
    }

    #[test]
    fn test_models_get_distinct_ids() {
        let bytes = ModelWriter::new().to_bytes(Endian::Little);
        let a = Model::from_slice(&bytes, Endian::Little).unwrap();
        let b = Model::from_slice(&bytes, Endian::Little).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.skeleton().owner(), a.id());
    }

    /// Two bones (hip at y=1, knee 1 above it) and one mesh deformed by
    /// `skeleton_bones`, each with an offset that undoes the bone's bind pose.
    fn skinned(skeleton_bones: &[u32]) -> ModelWriter {
        let mut writer = ModelWriter::new();
        writer.push_material(material("skin"));
        writer.push_bone(BoneSource {
            name: "hip".into(),
            children: vec![1],
            local_transform: Affine3A::from_translation(Vec3::Y),
            ..BoneSource::default()
        });
        writer.push_bone(BoneSource {
            name: "knee".into(),
            parent_index: 0,
            local_transform: Affine3A::from_translation(Vec3::Y),
            ..BoneSource::default()
        });
        writer.set_root_index(0);
        writer.push_mesh(MeshSource {
            blend_indices: vec![UVec4::ZERO; 3],
            blend_weights: vec![Vec4::X; 3],
            bones: skeleton_bones
                .iter()
                .map(|&index| MeshBoneSource {
                    skeleton_bone_index: index,
                    offset_mtx: Affine3A::from_translation(Vec3::NEG_Y * (index as f32 + 1.0)),
                })
                .collect(),
            ..mesh(0)
        });
        writer
    }

    #[test]
    fn test_skinned_mesh_bind_transforms() {
        let model = Model::from_slice(&skinned(&[1, 0]).to_bytes(Endian::Little), Endian::Little)
            .unwrap();
        let mesh = &model.meshes()[0];

        assert!(mesh.is_skinned());
        assert_eq!(mesh.num_bones(), 2);
        assert_eq!(
            mesh.bones().map(|bone| bone.skeleton_bone_index).collect::<Vec<_>>(),
            vec![1, 0]
        );
        assert_eq!(mesh.blend_indices().len(), 3);
        assert_eq!(mesh.blend_weights().next(), Some(Vec4::X));

        // Offsets cancel the bind pose exactly
        assert_eq!(mesh.bone_transforms().len(), 2);
        for transform in mesh.bone_transforms() {
            assert!(transform.abs_diff_eq(Affine3A::IDENTITY, 1e-6));
        }
    }

    #[test]
    fn test_mesh_bone_index_lookup() {
        let bytes = skinned(&[1]).to_bytes(Endian::Little);
        let model = Model::from_slice(&bytes, Endian::Little).unwrap();
        let other = Model::from_slice(&bytes, Endian::Little).unwrap();
        let mesh = &model.meshes()[0];
        let skeleton = model.skeleton();

        let knee = skeleton.find_bone("knee").unwrap();
        let hip = skeleton.find_bone("hip").unwrap();
        assert_eq!(mesh.mesh_bone_index(skeleton, knee), Some(0));
        assert_eq!(mesh.mesh_bone_index(skeleton, hip), None);

        let foreign_knee = other.skeleton().find_bone("knee").unwrap();
        assert_eq!(mesh.mesh_bone_index(skeleton, foreign_knee), None);
        assert_eq!(mesh.mesh_bone_index(other.skeleton(), foreign_knee), None);
    }

    #[test]
    fn test_unskinned_mesh_has_no_bone_transforms() {
        let mut writer = ModelWriter::new();
        writer.push_material(material("m"));
        writer.push_mesh(mesh(0));
        let model = Model::from_slice(&writer.to_bytes(Endian::Little), Endian::Little).unwrap();
        let mesh = &model.meshes()[0];
        assert!(!mesh.is_skinned());
        assert!(mesh.bone_transforms().is_empty());
        assert_eq!(mesh.blend_indices().len(), 0);
    }

    #[test]
    fn test_mesh_bone_one_past_last_bone() {
        let err = Model::from_slice(&skinned(&[0, 2]).to_bytes(Endian::Little), Endian::Little)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptAsset);
        assert!(matches!(
            err,
            LoadError::Format(FormatError::CorruptAsset(Corruption::MeshBoneOutOfRange {
                mesh: 0,
                slot: 1,
                index: 2,
                count: 2
            }))
        ));
    }

    #[test]
    fn test_mesh_bone_without_skeleton() {
        let mut writer = ModelWriter::new();
        writer.push_material(material("m"));
        writer.push_mesh(MeshSource {
            bones: vec![MeshBoneSource::default()],
            ..mesh(0)
        });
        let err = Model::from_slice(&writer.to_bytes(Endian::Little), Endian::Little).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Format(FormatError::CorruptAsset(Corruption::MeshBoneOutOfRange {
                index: 0,
                count: 0,
                ..
            }))
        ));
    }
}
