//! Info command - summarize a model file

use std::fmt::Write;

use anyhow::Result;
use clap::Args;
use rmdl_runtime::Model;

use crate::source::{ModelFileArgs, read_model};

/// Arguments for the info command
#[derive(Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub source: ModelFileArgs,
}

/// Execute the info command
pub fn execute(args: InfoArgs) -> Result<()> {
    let model = read_model(&args.source)?;
    let title = args.source.file.display().to_string();
    print!("{}", describe(&model, &title)?);
    Ok(())
}

/// Render the summary printed by `rmdl info`.
pub fn describe(model: &Model, title: &str) -> Result<String> {
    let res = model.res();
    let mut out = String::new();

    writeln!(out, "=== {title} ===")?;
    writeln!(out, "  Version:    {:#010x}", res.version())?;
    writeln!(out, "  Size:       {} bytes", res.file_size())?;
    writeln!(out, "  Byte order: {:?}", model.endian())?;

    writeln!(out, "  Meshes:     {}", model.meshes().len())?;
    for mesh in model.meshes() {
        let material = model
            .mesh_material(mesh)
            .map(|material| material.name())
            .unwrap_or("-");
        writeln!(
            out,
            "    [{}] {} vertices, {} indices, material {} ({material})",
            mesh.id().index(),
            mesh.num_vertices(),
            mesh.num_indices(),
            mesh.desc().material_index,
        )?;
    }

    writeln!(out, "  Materials:  {}", model.materials().len())?;
    for material in model.materials() {
        let users: Vec<usize> = material.meshes().iter().map(|id| id.index()).collect();
        let mut state = Vec::new();
        if material.is_visible() {
            state.push("visible");
        }
        if material.is_translucent() {
            state.push("translucent");
        }
        writeln!(
            out,
            "    [{}] {} shader={} {} meshes={users:?}",
            material.id().index(),
            material.name(),
            material.shader_name(),
            state.join(" "),
        )?;
        for texture in material.textures() {
            writeln!(
                out,
                "        texture {} (sampler {})",
                texture.name, texture.sampler_name
            )?;
        }
    }

    let skeleton = model.skeleton();
    match skeleton.root() {
        Some(root) => writeln!(
            out,
            "  Bones:      {} (root: {})",
            skeleton.num_bones(),
            root.name()
        )?,
        None => writeln!(out, "  Bones:      0")?,
    }

    writeln!(out, "  Animations: {}", res.num_animations())?;
    for (index, animation) in res.animations().enumerate() {
        writeln!(
            out,
            "    [{index}] {}  {} fps, {} frames, {} bone tracks",
            res.str(animation.name),
            animation.fps,
            animation.duration,
            animation.bones.len(),
        )?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmdl_format::{
        AnimationSource, BoneSource, Endian, MaterialFlags, MaterialSource, MeshSource,
        ModelWriter, RenderFlags, TextureSource, Vertex,
    };

    #[test]
    fn test_describe_lists_everything() {
        let mut writer = ModelWriter::new();
        writer.push_material(MaterialSource {
            name: "paint".into(),
            shader_name: "lit".into(),
            textures: vec![TextureSource {
                name: "paint_albedo".into(),
                sampler_name: "linear".into(),
            }],
            flags: MaterialFlags::VISIBLE,
            render_flags: RenderFlags::TRANSLUCENT,
        });
        writer.push_mesh(MeshSource {
            vertices: vec![Vertex::default(); 4],
            indices: vec![0, 1, 2, 2, 3, 0],
            ..MeshSource::default()
        });
        writer.push_bone(BoneSource {
            name: "chassis".into(),
            ..BoneSource::default()
        });
        writer.set_root_index(0);
        writer.push_animation(AnimationSource {
            name: "idle".into(),
            fps: 30.0,
            duration: 15.0,
            bones: Vec::new(),
        });
        let model = Model::from_slice(&writer.to_bytes(Endian::Little), Endian::Little).unwrap();

        let text = describe(&model, "car.rmdl").unwrap();
        assert!(text.starts_with("=== car.rmdl ===\n"));
        assert!(text.contains("Version:    0x01000000"));
        assert!(text.contains("[0] 4 vertices, 6 indices, material 0 (paint)"));
        assert!(text.contains("[0] paint shader=lit visible translucent meshes=[0]"));
        assert!(text.contains("texture paint_albedo (sampler linear)"));
        assert!(text.contains("Bones:      1 (root: chassis)"));
        assert!(text.contains("[0] idle  30 fps, 15 frames, 0 bone tracks"));
    }

    #[test]
    fn test_describe_empty_model() {
        let model =
            Model::from_slice(&ModelWriter::new().to_bytes(Endian::Big), Endian::Big).unwrap();
        let text = describe(&model, "empty").unwrap();
        assert!(text.contains("Byte order: Big"));
        assert!(text.contains("Meshes:     0"));
        assert!(text.contains("Bones:      0"));
    }
}
