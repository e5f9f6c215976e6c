//! Material descriptors

use crate::endian::Data;
use crate::error::Corruption;
use crate::view::{Record, ResourceView, StringView};

bitflags::bitflags! {
    /// Material state flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MaterialFlags: u16 {
        /// Material is drawn
        const VISIBLE = 1 << 0;
    }
}

bitflags::bitflags! {
    /// Render state requested by a material
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderFlags: u16 {
        const DEPTH_TEST = 1 << 0;
        const DEPTH_WRITE = 1 << 1;
        const BLEND = 1 << 2;
        const COLOR_MASK_R = 1 << 4;
        const COLOR_MASK_G = 1 << 5;
        const COLOR_MASK_B = 1 << 6;
        const COLOR_MASK_A = 1 << 7;
        const STENCIL = 1 << 8;
        const POLYGON_OFFSET = 1 << 9;
        const POLYGON_OFFSET_POINT_LINE = 1 << 10;
        /// Drawn in the translucent pass
        const TRANSLUCENT = 1 << 11;

        const COLOR_MASK = Self::COLOR_MASK_R.bits()
            | Self::COLOR_MASK_G.bits()
            | Self::COLOR_MASK_B.bits()
            | Self::COLOR_MASK_A.bits();
    }
}

/// Texture reference (0x10 bytes): texture name, sampler name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRefDesc {
    pub name: StringView,
    pub sampler_name: StringView,
}

impl Record for TextureRefDesc {
    const SIZE: usize = 0x10;
    const NAME: &'static str = "texture reference";

    fn read(data: Data<'_>, pos: usize) -> Self {
        Self {
            name: StringView::read(data, pos),
            sampler_name: StringView::read(data, pos + 0x08),
        }
    }

    fn validate(data: Data<'_>, pos: usize) -> Result<(), Corruption> {
        StringView::parse(data, pos, "texture name")?;
        StringView::parse(data, pos + 0x08, "sampler name")?;
        Ok(())
    }
}

/// Material record (0x1C bytes).
///
/// | Offset | Field |
/// |--------|-------|
/// | 0x00 | name |
/// | 0x08 | shader name |
/// | 0x10 | texture reference view |
/// | 0x18 | [`MaterialFlags`] |
/// | 0x1A | [`RenderFlags`] |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialDesc {
    pub name: StringView,
    pub shader_name: StringView,
    pub textures: ResourceView<TextureRefDesc>,
    pub flags: MaterialFlags,
    pub render_flags: RenderFlags,
}

impl MaterialDesc {
    pub fn is_visible(&self) -> bool {
        self.flags.contains(MaterialFlags::VISIBLE)
    }

    pub fn is_translucent(&self) -> bool {
        self.render_flags.contains(RenderFlags::TRANSLUCENT)
    }
}

impl Record for MaterialDesc {
    const SIZE: usize = 0x1C;
    const NAME: &'static str = "material";

    fn read(data: Data<'_>, pos: usize) -> Self {
        Self {
            name: StringView::read(data, pos),
            shader_name: StringView::read(data, pos + 0x08),
            textures: ResourceView::read(data, pos + 0x10),
            // Unknown bits are kept
            flags: MaterialFlags::from_bits_retain(data.u16(pos + 0x18)),
            render_flags: RenderFlags::from_bits_retain(data.u16(pos + 0x1A)),
        }
    }

    fn validate(data: Data<'_>, pos: usize) -> Result<(), Corruption> {
        StringView::parse(data, pos, "material name")?;
        StringView::parse(data, pos + 0x08, "shader name")?;
        ResourceView::<TextureRefDesc>::parse(data, pos + 0x10)?;
        Ok(())
    }
}
