//! Model fixtures shared by the integration tests.

use glam::{Affine3A, UVec4, Vec3, Vec4};
use rmdl_format::{
    AnimationSource, BoneAnimationSource, BoneSource, KeyFrameVec3, MaterialFlags,
    MaterialSource, MeshBoneSource, MeshSource, ModelWriter, RenderFlags, Vertex,
};

/// A small character: three meshes over two materials, a five-bone rig and
/// one animation. The last mesh is skinned to `head` and `spine`, with offset
/// matrices that invert their bind poses.
pub fn character() -> ModelWriter {
    let mut writer = ModelWriter::new();

    writer.push_material(MaterialSource {
        name: "skin".into(),
        shader_name: "skinned".into(),
        flags: MaterialFlags::VISIBLE,
        render_flags: RenderFlags::DEPTH_TEST | RenderFlags::DEPTH_WRITE,
        ..MaterialSource::default()
    });
    writer.push_material(MaterialSource {
        name: "visor".into(),
        shader_name: "glass".into(),
        flags: MaterialFlags::VISIBLE,
        render_flags: RenderFlags::DEPTH_TEST | RenderFlags::BLEND | RenderFlags::TRANSLUCENT,
        ..MaterialSource::default()
    });

    for (material_index, height) in [(0, 0.0), (1, 1.8)] {
        writer.push_mesh(MeshSource {
            vertices: triangle(),
            indices: vec![0, 1, 2],
            translation: Vec3::new(0.0, height, 0.0),
            material_index,
            ..MeshSource::default()
        });
    }
    writer.push_mesh(MeshSource {
        vertices: triangle(),
        indices: vec![0, 1, 2],
        blend_indices: vec![UVec4::new(0, 1, 0, 0); 3],
        blend_weights: vec![Vec4::new(0.75, 0.25, 0.0, 0.0); 3],
        bones: vec![
            MeshBoneSource {
                skeleton_bone_index: 2,
                offset_mtx: Affine3A::from_translation(Vec3::Y * -1.5),
            },
            MeshBoneSource {
                skeleton_bone_index: 1,
                offset_mtx: Affine3A::from_translation(Vec3::Y * -1.0),
            },
        ],
        translation: Vec3::new(0.0, 0.9, 0.0),
        ..MeshSource::default()
    });

    // pelvis -> spine -> head, pelvis -> left_leg, pelvis -> right_leg
    let bones = [
        ("pelvis", -1, vec![1, 3, 4]),
        ("spine", 0, vec![2]),
        ("head", 1, vec![]),
        ("left_leg", 0, vec![]),
        ("right_leg", 0, vec![]),
    ];
    for (name, parent_index, children) in bones {
        writer.push_bone(BoneSource {
            name: name.into(),
            parent_index,
            children,
            local_transform: Affine3A::from_translation(Vec3::Y * 0.5),
        });
    }
    writer.set_root_index(0);

    writer.push_animation(AnimationSource {
        name: "nod".into(),
        fps: 24.0,
        duration: 48.0,
        bones: vec![BoneAnimationSource {
            bone_index: 2,
            translation_keys: vec![
                KeyFrameVec3 {
                    frame: 0.0,
                    value: Vec3::ZERO,
                },
                KeyFrameVec3 {
                    frame: 24.0,
                    value: Vec3::new(0.0, -0.1, 0.0),
                },
            ],
            ..BoneAnimationSource::default()
        }],
    });

    writer
}

fn triangle() -> Vec<Vertex> {
    [Vec3::ZERO, Vec3::X, Vec3::Y]
        .into_iter()
        .map(|position| Vertex {
            position,
            normal: Vec3::Z,
            ..Vertex::default()
        })
        .collect()
}
