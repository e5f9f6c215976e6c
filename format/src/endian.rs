//! Byte order selection and raw field access
//!
//! Model files ship in a little-endian and a big-endian variant. Rather than
//! reinterpreting memory, every multi-byte field is decoded through
//! [`byteorder`] in the order the file was written in, so either variant can
//! be inspected on any host.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use glam::{Affine3A, Mat3, Quat, Vec2, Vec3, Vec4};

/// Byte order of a model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Byte order of the running target.
    #[cfg(target_endian = "little")]
    pub const NATIVE: Endian = Endian::Little;

    /// Byte order of the running target.
    #[cfg(target_endian = "big")]
    pub const NATIVE: Endian = Endian::Big;

    /// Filename suffix that selects this variant (`"LE"` / `"BE"`).
    pub fn file_suffix(self) -> &'static str {
        match self {
            Endian::Little => "LE",
            Endian::Big => "BE",
        }
    }
}

/// A model byte buffer paired with the byte order its fields are stored in.
///
/// Readers index the buffer directly and panic when handed a position
/// outside it. Callers only read ranges that [`ResModel::parse`] has already
/// proven to be in bounds.
///
/// [`ResModel::parse`]: crate::ResModel::parse
#[derive(Debug, Clone, Copy)]
pub struct Data<'a> {
    bytes: &'a [u8],
    endian: Endian,
}

impl<'a> Data<'a> {
    pub fn new(bytes: &'a [u8], endian: Endian) -> Self {
        Self { bytes, endian }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether `len` bytes starting at `pos` lie inside the buffer.
    pub fn contains(&self, pos: usize, len: usize) -> bool {
        pos.checked_add(len).is_some_and(|end| end <= self.bytes.len())
    }

    pub fn slice(&self, pos: usize, len: usize) -> &'a [u8] {
        &self.bytes[pos..pos + len]
    }

    pub fn u8(&self, pos: usize) -> u8 {
        self.bytes[pos]
    }

    pub fn u16(&self, pos: usize) -> u16 {
        let field = self.slice(pos, 2);
        match self.endian {
            Endian::Little => LittleEndian::read_u16(field),
            Endian::Big => BigEndian::read_u16(field),
        }
    }

    pub fn u32(&self, pos: usize) -> u32 {
        let field = self.slice(pos, 4);
        match self.endian {
            Endian::Little => LittleEndian::read_u32(field),
            Endian::Big => BigEndian::read_u32(field),
        }
    }

    pub fn i32(&self, pos: usize) -> i32 {
        let field = self.slice(pos, 4);
        match self.endian {
            Endian::Little => LittleEndian::read_i32(field),
            Endian::Big => BigEndian::read_i32(field),
        }
    }

    pub fn f32(&self, pos: usize) -> f32 {
        let field = self.slice(pos, 4);
        match self.endian {
            Endian::Little => LittleEndian::read_f32(field),
            Endian::Big => BigEndian::read_f32(field),
        }
    }

    pub fn vec2(&self, pos: usize) -> Vec2 {
        Vec2::new(self.f32(pos), self.f32(pos + 4))
    }

    pub fn vec3(&self, pos: usize) -> Vec3 {
        Vec3::new(self.f32(pos), self.f32(pos + 4), self.f32(pos + 8))
    }

    pub fn vec4(&self, pos: usize) -> Vec4 {
        Vec4::new(
            self.f32(pos),
            self.f32(pos + 4),
            self.f32(pos + 8),
            self.f32(pos + 12),
        )
    }

    /// Quaternion stored as x, y, z, w.
    pub fn quat(&self, pos: usize) -> Quat {
        Quat::from_xyzw(
            self.f32(pos),
            self.f32(pos + 4),
            self.f32(pos + 8),
            self.f32(pos + 12),
        )
    }

    /// 3x4 row-major matrix (rotation/scale in the first three columns,
    /// translation in the fourth).
    pub fn mtx34(&self, pos: usize) -> Affine3A {
        let m = |row: usize, col: usize| self.f32(pos + (row * 4 + col) * 4);
        Affine3A::from_mat3_translation(
            Mat3::from_cols(
                Vec3::new(m(0, 0), m(1, 0), m(2, 0)),
                Vec3::new(m(0, 1), m(1, 1), m(2, 1)),
                Vec3::new(m(0, 2), m(1, 2), m(2, 2)),
            ),
            Vec3::new(m(0, 3), m(1, 3), m(2, 3)),
        )
    }
}
