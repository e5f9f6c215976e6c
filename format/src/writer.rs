//! Model file writer
//!
//! Produces a complete model buffer in either byte order. Cross-reference
//! indices (material, parent, child, root, animated bone) are written exactly
//! as given, so the writer can also produce deliberately broken assets.
//!
//! Output order: header, record tables, vertex data (each block 64-byte
//! aligned), index data, blend streams, mesh bones, child indices, animation
//! keys, strings.

use std::marker::PhantomData;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use glam::{Affine3A, Quat, UVec4, Vec3, Vec4};

use crate::animation::{KeyFrameQuat, KeyFrameVec3};
use crate::endian::Endian;
use crate::material::{MaterialFlags, RenderFlags};
use crate::mesh::Vertex;
use crate::model::{FORMAT_MAGIC, VERSION_CURRENT};
use crate::view::{VERTEX_ALIGNMENT, VIEW_SIZE};

/// Skeleton bone that deforms a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBoneSource {
    pub skeleton_bone_index: u32,
    pub offset_mtx: Affine3A,
}

impl Default for MeshBoneSource {
    fn default() -> Self {
        Self {
            skeleton_bone_index: 0,
            offset_mtx: Affine3A::IDENTITY,
        }
    }
}

/// Mesh to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSource {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Mesh bone slots per vertex; empty or one entry per vertex
    pub blend_indices: Vec<UVec4>,
    /// Slot weights per vertex; empty or one entry per vertex
    pub blend_weights: Vec<Vec4>,
    pub bones: Vec<MeshBoneSource>,
    pub scale: Vec3,
    /// Euler angles in radians
    pub rotation: Vec3,
    pub translation: Vec3,
    pub material_index: u32,
}

impl Default for MeshSource {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            blend_indices: Vec::new(),
            blend_weights: Vec::new(),
            bones: Vec::new(),
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
            translation: Vec3::ZERO,
            material_index: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextureSource {
    pub name: String,
    pub sampler_name: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialSource {
    pub name: String,
    pub shader_name: String,
    pub textures: Vec<TextureSource>,
    pub flags: MaterialFlags,
    pub render_flags: RenderFlags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoneSource {
    pub name: String,
    /// `-1` for no parent
    pub parent_index: i32,
    pub children: Vec<i32>,
    pub local_transform: Affine3A,
}

impl Default for BoneSource {
    fn default() -> Self {
        Self {
            name: String::new(),
            parent_index: -1,
            children: Vec::new(),
            local_transform: Affine3A::IDENTITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoneAnimationSource {
    pub bone_index: u32,
    pub scale_keys: Vec<KeyFrameVec3>,
    pub rotation_keys: Vec<KeyFrameQuat>,
    pub translation_keys: Vec<KeyFrameVec3>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnimationSource {
    pub name: String,
    pub fps: f32,
    pub duration: f32,
    pub bones: Vec<BoneAnimationSource>,
}

/// Builder for model files.
#[derive(Debug, Clone)]
pub struct ModelWriter {
    version: u32,
    meshes: Vec<MeshSource>,
    materials: Vec<MaterialSource>,
    bones: Vec<BoneSource>,
    root_index: i32,
    animations: Vec<AnimationSource>,
}

impl Default for ModelWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelWriter {
    /// An empty model: no meshes, no materials, no bones (root `-1`).
    pub fn new() -> Self {
        Self {
            version: VERSION_CURRENT,
            meshes: Vec::new(),
            materials: Vec::new(),
            bones: Vec::new(),
            root_index: -1,
            animations: Vec::new(),
        }
    }

    /// Override the version field.
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Append a mesh and return its index.
    pub fn push_mesh(&mut self, mesh: MeshSource) -> u32 {
        self.meshes.push(mesh);
        self.meshes.len() as u32 - 1
    }

    /// Append a material and return its index.
    pub fn push_material(&mut self, material: MaterialSource) -> u32 {
        self.materials.push(material);
        self.materials.len() as u32 - 1
    }

    /// Append a bone and return its index.
    pub fn push_bone(&mut self, bone: BoneSource) -> i32 {
        self.bones.push(bone);
        self.bones.len() as i32 - 1
    }

    pub fn set_root_index(&mut self, root_index: i32) {
        self.root_index = root_index;
    }

    pub fn push_animation(&mut self, animation: AnimationSource) -> u32 {
        self.animations.push(animation);
        self.animations.len() as u32 - 1
    }

    /// Encode the model in the requested byte order.
    pub fn to_bytes(&self, endian: Endian) -> Vec<u8> {
        match endian {
            Endian::Little => self.write::<LittleEndian>(),
            Endian::Big => self.write::<BigEndian>(),
        }
    }

    fn write<E: ByteOrder>(&self) -> Vec<u8> {
        let mut w = ByteWriter::<E>::new();
        let mut strings: Vec<(usize, &str)> = Vec::new();

        // Header
        w.bytes(&FORMAT_MAGIC);
        w.u32(self.version);
        w.u32(0); // file size, patched last
        let meshes_slot = w.view_slot();
        let materials_slot = w.view_slot();
        w.i32(self.root_index);
        let bones_slot = w.view_slot();
        let animations_slot = w.view_slot();

        // Record tables
        w.point_view(meshes_slot, self.meshes.len());
        let mut mesh_slots = Vec::with_capacity(self.meshes.len());
        for mesh in &self.meshes {
            let slots = MeshSlots {
                vertices: w.view_slot(),
                indices: w.view_slot(),
                blend_indices: w.view_slot(),
                blend_weights: w.view_slot(),
                bones: w.view_slot(),
            };
            w.vec3(mesh.scale);
            w.vec3(mesh.rotation);
            w.vec3(mesh.translation);
            w.u32(mesh.material_index);
            mesh_slots.push(slots);
        }

        w.point_view(materials_slot, self.materials.len());
        let mut texture_slots = Vec::with_capacity(self.materials.len());
        for material in &self.materials {
            strings.push((w.view_slot(), material.name.as_str()));
            strings.push((w.view_slot(), material.shader_name.as_str()));
            texture_slots.push(w.view_slot());
            w.u16(material.flags.bits());
            w.u16(material.render_flags.bits());
        }
        for (material, slot) in self.materials.iter().zip(texture_slots) {
            w.point_view(slot, material.textures.len());
            for texture in &material.textures {
                strings.push((w.view_slot(), texture.name.as_str()));
                strings.push((w.view_slot(), texture.sampler_name.as_str()));
            }
        }

        w.point_view(bones_slot, self.bones.len());
        let mut child_slots = Vec::with_capacity(self.bones.len());
        for bone in &self.bones {
            strings.push((w.view_slot(), bone.name.as_str()));
            w.i32(bone.parent_index);
            child_slots.push(w.view_slot());
            w.mtx34(&bone.local_transform);
        }

        w.point_view(animations_slot, self.animations.len());
        let mut track_slots = Vec::with_capacity(self.animations.len());
        for animation in &self.animations {
            strings.push((w.view_slot(), animation.name.as_str()));
            w.f32(animation.fps);
            w.f32(animation.duration);
            track_slots.push(w.view_slot());
        }
        let mut key_slots = Vec::new();
        for (animation, slot) in self.animations.iter().zip(track_slots) {
            w.point_view(slot, animation.bones.len());
            for track in &animation.bones {
                w.u32(track.bone_index);
                key_slots.push((w.view_slot(), w.view_slot(), w.view_slot()));
            }
        }

        // Payloads
        for (mesh, slots) in self.meshes.iter().zip(&mesh_slots) {
            if mesh.vertices.is_empty() {
                continue;
            }
            w.align(VERTEX_ALIGNMENT);
            w.point_view(slots.vertices, mesh.vertices.len());
            for vertex in &mesh.vertices {
                w.vec3(vertex.position);
                w.f32(vertex.tex_coord.x);
                w.f32(vertex.tex_coord.y);
                w.vec3(vertex.normal);
            }
        }
        for (mesh, slots) in self.meshes.iter().zip(&mesh_slots) {
            w.point_view(slots.indices, mesh.indices.len());
            for &index in &mesh.indices {
                w.u32(index);
            }
        }
        for (mesh, slots) in self.meshes.iter().zip(&mesh_slots) {
            w.point_view(slots.blend_indices, mesh.blend_indices.len());
            for index in &mesh.blend_indices {
                for slot in index.to_array() {
                    w.u32(slot);
                }
            }
            w.point_view(slots.blend_weights, mesh.blend_weights.len());
            for weight in &mesh.blend_weights {
                for slot in weight.to_array() {
                    w.f32(slot);
                }
            }
            w.point_view(slots.bones, mesh.bones.len());
            for bone in &mesh.bones {
                w.u32(bone.skeleton_bone_index);
                w.mtx34(&bone.offset_mtx);
            }
        }
        for (bone, slot) in self.bones.iter().zip(child_slots) {
            w.point_view(slot, bone.children.len());
            for &child in &bone.children {
                w.i32(child);
            }
        }
        let tracks = self.animations.iter().flat_map(|a| a.bones.iter());
        for (track, (scale, rotation, translation)) in tracks.zip(key_slots) {
            w.point_view(scale, track.scale_keys.len());
            for key in &track.scale_keys {
                w.f32(key.frame);
                w.vec3(key.value);
            }
            w.point_view(rotation, track.rotation_keys.len());
            for key in &track.rotation_keys {
                w.f32(key.frame);
                w.quat(key.value);
            }
            w.point_view(translation, track.translation_keys.len());
            for key in &track.translation_keys {
                w.f32(key.frame);
                w.vec3(key.value);
            }
        }
        for (slot, text) in strings {
            if text.is_empty() {
                continue;
            }
            w.point_view(slot, text.len() + 1);
            w.bytes(text.as_bytes());
            w.bytes(&[0]);
        }

        let size = w.buf.len() as u32;
        w.patch_u32(0x0C, size);
        w.buf
    }
}

/// View fields of one mesh record, filled once the payloads are placed.
struct MeshSlots {
    vertices: usize,
    indices: usize,
    blend_indices: usize,
    blend_weights: usize,
    bones: usize,
}

/// Append-only buffer with in-place patching of view fields.
struct ByteWriter<E> {
    buf: Vec<u8>,
    _order: PhantomData<E>,
}

impl<E: ByteOrder> ByteWriter<E> {
    fn new() -> Self {
        Self {
            buf: Vec::new(),
            _order: PhantomData,
        }
    }

    fn grow(&mut self, len: usize) -> &mut [u8] {
        let at = self.buf.len();
        self.buf.resize(at + len, 0);
        &mut self.buf[at..]
    }

    fn bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn u16(&mut self, value: u16) {
        E::write_u16(self.grow(2), value);
    }

    fn u32(&mut self, value: u32) {
        E::write_u32(self.grow(4), value);
    }

    fn i32(&mut self, value: i32) {
        E::write_i32(self.grow(4), value);
    }

    fn f32(&mut self, value: f32) {
        E::write_f32(self.grow(4), value);
    }

    fn vec3(&mut self, v: Vec3) {
        self.f32(v.x);
        self.f32(v.y);
        self.f32(v.z);
    }

    fn quat(&mut self, q: Quat) {
        self.f32(q.x);
        self.f32(q.y);
        self.f32(q.z);
        self.f32(q.w);
    }

    /// Row-major 3x4: three rows of (basis x, basis y, basis z, translation).
    fn mtx34(&mut self, m: &Affine3A) {
        for row in 0..3 {
            self.f32(m.matrix3.x_axis[row]);
            self.f32(m.matrix3.y_axis[row]);
            self.f32(m.matrix3.z_axis[row]);
            self.f32(m.translation[row]);
        }
    }

    fn align(&mut self, align: usize) {
        let padded = self.buf.len().next_multiple_of(align);
        self.buf.resize(padded, 0);
    }

    /// Reserve an empty view field and return its position.
    fn view_slot(&mut self) -> usize {
        let at = self.buf.len();
        self.grow(VIEW_SIZE);
        at
    }

    /// Point the view at `slot` to the current end of the buffer.
    fn point_view(&mut self, slot: usize, count: usize) {
        if count == 0 {
            return;
        }
        let rel = (self.buf.len() - slot) as i32;
        E::write_i32(&mut self.buf[slot..], rel);
        E::write_u32(&mut self.buf[slot + 4..], count as u32);
    }

    fn patch_u32(&mut self, at: usize, value: u32) {
        E::write_u32(&mut self.buf[at..], value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Corruption, FormatError};
    use crate::model::{HEADER_SIZE, ResModel};
    use glam::{Vec2, Vec3A};

    fn full_writer() -> ModelWriter {
        let mut writer = ModelWriter::new();
        writer.push_material(MaterialSource {
            name: "skin".into(),
            shader_name: "lit".into(),
            textures: vec![TextureSource {
                name: "skin_albedo".into(),
                sampler_name: "linear".into(),
            }],
            flags: MaterialFlags::VISIBLE,
            render_flags: RenderFlags::DEPTH_TEST | RenderFlags::TRANSLUCENT,
        });
        writer.push_mesh(MeshSource {
            vertices: vec![
                Vertex {
                    position: Vec3::new(0.0, 1.0, 2.0),
                    tex_coord: Vec2::new(0.5, 0.5),
                    normal: Vec3::Z,
                };
                3
            ],
            indices: vec![0, 1, 2],
            translation: Vec3::new(1.0, 0.0, 0.0),
            ..MeshSource::default()
        });
        writer.push_mesh(MeshSource {
            vertices: vec![Vertex::default(); 5],
            indices: vec![4, 3, 2],
            ..MeshSource::default()
        });
        writer.push_bone(BoneSource {
            name: "root".into(),
            children: vec![1],
            ..BoneSource::default()
        });
        writer.push_bone(BoneSource {
            name: "arm".into(),
            parent_index: 0,
            local_transform: Affine3A::from_translation(Vec3::new(0.0, 2.0, 0.0)),
            ..BoneSource::default()
        });
        writer.set_root_index(0);
        writer.push_animation(AnimationSource {
            name: "wave".into(),
            fps: 30.0,
            duration: 60.0,
            bones: vec![BoneAnimationSource {
                bone_index: 1,
                rotation_keys: vec![KeyFrameQuat {
                    frame: 0.0,
                    value: Quat::IDENTITY,
                }],
                translation_keys: vec![
                    KeyFrameVec3 {
                        frame: 0.0,
                        value: Vec3::ZERO,
                    },
                    KeyFrameVec3 {
                        frame: 60.0,
                        value: Vec3::Y,
                    },
                ],
                ..BoneAnimationSource::default()
            }],
        });
        writer
    }

    #[test]
    fn test_empty_model_is_header_only() {
        let bytes = ModelWriter::new().to_bytes(Endian::Little);
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[0..8], b"riomodel");
        assert_eq!(&bytes[0x20..0x24], &(-1i32).to_le_bytes());
    }

    #[test]
    fn test_full_model_reads_back() {
        let writer = full_writer();
        for endian in [Endian::Little, Endian::Big] {
            let bytes = writer.to_bytes(endian);
            let model = ResModel::parse(&bytes, endian).unwrap();
            let data = model.data();

            assert_eq!(model.num_meshes(), 2);
            let mesh = model.mesh(0);
            assert_eq!(mesh.vertices.start() % VERTEX_ALIGNMENT, 0);
            assert_eq!(mesh.vertices.get(data, 2).normal, Vec3::Z);
            assert_eq!(mesh.translation, Vec3::new(1.0, 0.0, 0.0));
            assert_eq!(model.mesh(1).vertices.start() % VERTEX_ALIGNMENT, 0);
            assert_eq!(model.mesh(1).indices.iter(data).collect::<Vec<_>>(), vec![4, 3, 2]);

            let material = model.material(0);
            assert_eq!(model.str(material.name), "skin");
            assert_eq!(model.str(material.shader_name), "lit");
            assert!(material.is_visible());
            assert!(material.is_translucent());
            let texture = material.textures.get(data, 0);
            assert_eq!(model.str(texture.name), "skin_albedo");
            assert_eq!(model.str(texture.sampler_name), "linear");

            let skeleton = model.skeleton();
            assert_eq!(skeleton.root_index, 0);
            assert_eq!(skeleton.num_bones(), 2);
            let root = skeleton.bone(data, 0);
            assert_eq!(model.str(root.name), "root");
            assert_eq!(root.parent_index, -1);
            assert_eq!(root.children.iter(data).collect::<Vec<_>>(), vec![1]);
            let arm = skeleton.bone(data, 1);
            assert_eq!(arm.parent_index, 0);
            assert_eq!(arm.local_transform.translation, Vec3A::new(0.0, 2.0, 0.0));

            let anim = model.animation(0);
            assert_eq!(model.str(anim.name), "wave");
            assert_eq!(anim.fps, 30.0);
            let track = anim.bones.get(data, 0);
            assert_eq!(track.bone_index, 1);
            assert!(track.scale_keys.is_empty());
            assert_eq!(track.rotation_keys.get(data, 0).value, Quat::IDENTITY);
            assert_eq!(track.translation_keys.get(data, 1).value, Vec3::Y);
        }
    }

    #[test]
    fn test_indices_written_verbatim() {
        let mut writer = ModelWriter::new();
        writer.push_mesh(MeshSource {
            material_index: 3,
            ..MeshSource::default()
        });
        writer.push_bone(BoneSource {
            parent_index: 12,
            children: vec![-7],
            ..BoneSource::default()
        });
        writer.set_root_index(5);

        let bytes = writer.to_bytes(Endian::Little);
        let model = ResModel::parse(&bytes, Endian::Little).unwrap();
        assert_eq!(model.mesh(0).material_index, 3);
        assert_eq!(model.skeleton().root_index, 5);
        let bone = model.skeleton().bone(model.data(), 0);
        assert_eq!(bone.parent_index, 12);
        assert_eq!(bone.children.get(model.data(), 0), -7);
    }

    #[test]
    fn test_version_override() {
        let bytes = ModelWriter::new().version(0x0200_0000).to_bytes(Endian::Little);
        assert_eq!(&bytes[8..12], &0x0200_0000u32.to_le_bytes());
    }

    fn skinned_mesh(blend_indices: Vec<UVec4>, blend_weights: Vec<Vec4>) -> MeshSource {
        MeshSource {
            vertices: vec![Vertex::default(); 2],
            indices: vec![0, 1, 0],
            blend_indices,
            blend_weights,
            bones: vec![
                MeshBoneSource {
                    skeleton_bone_index: 4,
                    offset_mtx: Affine3A::from_translation(Vec3::new(0.0, -1.0, 0.0)),
                },
                MeshBoneSource {
                    skeleton_bone_index: 2,
                    ..MeshBoneSource::default()
                },
            ],
            ..MeshSource::default()
        }
    }

    #[test]
    fn test_skinned_mesh_reads_back() {
        let mut writer = ModelWriter::new();
        writer.push_mesh(skinned_mesh(
            vec![UVec4::new(0, 1, 0, 0), UVec4::new(1, 0, 0, 0)],
            vec![Vec4::new(0.75, 0.25, 0.0, 0.0), Vec4::new(1.0, 0.0, 0.0, 0.0)],
        ));

        for endian in [Endian::Little, Endian::Big] {
            let bytes = writer.to_bytes(endian);
            let model = ResModel::parse(&bytes, endian).unwrap();
            let data = model.data();
            let mesh = model.mesh(0);

            assert!(mesh.is_skinned());
            assert_eq!(mesh.bones.len(), 2);
            let bone = mesh.bones.get(data, 0);
            assert_eq!(bone.skeleton_bone_index, 4);
            assert_eq!(bone.offset_mtx.translation, Vec3A::new(0.0, -1.0, 0.0));
            assert_eq!(mesh.bones.get(data, 1).skeleton_bone_index, 2);
            assert_eq!(mesh.blend_indices.get(data, 1), UVec4::new(1, 0, 0, 0));
            assert_eq!(mesh.blend_weights.get(data, 0), Vec4::new(0.75, 0.25, 0.0, 0.0));
            assert_eq!(mesh.indices.iter(data).collect::<Vec<_>>(), vec![0, 1, 0]);
        }
    }

    #[test]
    fn test_blend_streams_must_cover_every_vertex() {
        let mut writer = ModelWriter::new();
        writer.push_mesh(skinned_mesh(
            vec![UVec4::ZERO],
            vec![Vec4::X, Vec4::X],
        ));
        assert_eq!(
            ResModel::parse(&writer.to_bytes(Endian::Little), Endian::Little).unwrap_err(),
            FormatError::CorruptAsset(Corruption::BlendStreamLength {
                what: "blend index",
                count: 1,
                vertices: 2
            })
        );
    }

    #[test]
    fn test_weighted_slot_needs_mesh_bone() {
        // Slot 1 points past the two mesh bones but carries no weight
        let mut writer = ModelWriter::new();
        writer.push_mesh(skinned_mesh(
            vec![UVec4::new(0, 9, 0, 0), UVec4::ZERO],
            vec![Vec4::X, Vec4::X],
        ));
        assert!(ResModel::parse(&writer.to_bytes(Endian::Little), Endian::Little).is_ok());

        let mut writer = ModelWriter::new();
        writer.push_mesh(skinned_mesh(
            vec![UVec4::ZERO, UVec4::new(0, 2, 0, 0)],
            vec![Vec4::X, Vec4::new(0.5, 0.5, 0.0, 0.0)],
        ));
        assert_eq!(
            ResModel::parse(&writer.to_bytes(Endian::Little), Endian::Little).unwrap_err(),
            FormatError::CorruptAsset(Corruption::BlendIndexOutOfRange {
                vertex: 1,
                index: 2,
                count: 2
            })
        );
    }
}
