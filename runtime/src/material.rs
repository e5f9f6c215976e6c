//! Runtime materials

use rmdl_format::{MaterialDesc, MaterialFlags, RenderFlags};
use smallvec::SmallVec;

use crate::mesh::MeshId;
use crate::model::{ModelId, ModelSource};

/// Index of a material within its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub(crate) u32);

impl MaterialId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Texture binding requested by a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRef<'a> {
    pub name: &'a str,
    pub sampler_name: &'a str,
}

/// A material of a loaded model and the meshes that use it.
#[derive(Debug)]
pub struct Material {
    id: MaterialId,
    model: ModelId,
    source: ModelSource,
    desc: MaterialDesc,
    meshes: SmallVec<[MeshId; 4]>,
}

impl Material {
    pub(crate) fn new(
        id: MaterialId,
        model: ModelId,
        source: ModelSource,
        desc: MaterialDesc,
    ) -> Self {
        Self {
            id,
            model,
            source,
            desc,
            meshes: SmallVec::new(),
        }
    }

    pub fn id(&self) -> MaterialId {
        self.id
    }

    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn desc(&self) -> &MaterialDesc {
        &self.desc
    }

    pub fn name(&self) -> &str {
        self.desc.name.as_str(self.source.data())
    }

    pub fn shader_name(&self) -> &str {
        self.desc.shader_name.as_str(self.source.data())
    }

    pub fn flags(&self) -> MaterialFlags {
        self.desc.flags
    }

    pub fn render_flags(&self) -> RenderFlags {
        self.desc.render_flags
    }

    pub fn is_visible(&self) -> bool {
        self.desc.is_visible()
    }

    pub fn is_translucent(&self) -> bool {
        self.desc.is_translucent()
    }

    pub fn num_textures(&self) -> usize {
        self.desc.textures.len()
    }

    pub fn textures(&self) -> impl ExactSizeIterator<Item = TextureRef<'_>> {
        let data = self.source.data();
        self.desc.textures.iter(data).map(move |texture| TextureRef {
            name: texture.name.as_str(data),
            sampler_name: texture.sampler_name.as_str(data),
        })
    }

    /// Meshes that reference this material, in mesh order.
    pub fn meshes(&self) -> &[MeshId] {
        &self.meshes
    }

    pub(crate) fn push_mesh(&mut self, mesh: MeshId) {
        self.meshes.push(mesh);
    }
}
