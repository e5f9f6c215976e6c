//! Typed array views over a model buffer
//!
//! A view is the 8-byte pair stored in the file: an `s32` offset measured from
//! the view field's own position, followed by a `u32` element count. Once
//! decoded it becomes a [`ResourceView`] holding an absolute start offset into
//! the buffer, so it carries no borrow and can be stored inside runtime
//! objects. Elements are read back by handing the view the same [`Data`] it was
//! parsed from.

use std::fmt;
use std::marker::PhantomData;

use crate::endian::Data;
use crate::error::Corruption;

/// Size of an encoded view field (offset + count).
pub const VIEW_SIZE: usize = 8;

/// Alignment required of vertex data, relative to the buffer start.
pub const VERTEX_ALIGNMENT: usize = 64;

/// A fixed-size record that can appear as an element of a [`ResourceView`].
pub trait Record: Sized {
    /// Encoded size in bytes.
    const SIZE: usize;
    /// Required alignment of the first element.
    const ALIGN: usize = 4;
    /// Name used in corruption reports.
    const NAME: &'static str;

    /// Decode the record at `pos`. `pos..pos + SIZE` must be in bounds.
    fn read(data: Data<'_>, pos: usize) -> Self;

    /// Check every view nested inside the record at `pos`.
    fn validate(_data: Data<'_>, _pos: usize) -> Result<(), Corruption> {
        Ok(())
    }
}

impl Record for u8 {
    const SIZE: usize = 1;
    const ALIGN: usize = 1;
    const NAME: &'static str = "byte";

    fn read(data: Data<'_>, pos: usize) -> Self {
        data.u8(pos)
    }
}

impl Record for u32 {
    const SIZE: usize = 4;
    const NAME: &'static str = "index";

    fn read(data: Data<'_>, pos: usize) -> Self {
        data.u32(pos)
    }
}

impl Record for i32 {
    const SIZE: usize = 4;
    const NAME: &'static str = "bone index";

    fn read(data: Data<'_>, pos: usize) -> Self {
        data.i32(pos)
    }
}

/// A count + start offset describing `count` consecutive `T` records.
pub struct ResourceView<T> {
    start: usize,
    count: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceView<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ResourceView<T> {}

impl<T> PartialEq for ResourceView<T> {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.count == other.count
    }
}

impl<T> Eq for ResourceView<T> {}

impl<T> Default for ResourceView<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> fmt::Debug for ResourceView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceView")
            .field("start", &self.start)
            .field("count", &self.count)
            .finish()
    }
}

impl<T> ResourceView<T> {
    pub const fn empty() -> Self {
        Self {
            start: 0,
            count: 0,
            _marker: PhantomData,
        }
    }

    /// Absolute offset of the first element.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl<T: Record> ResourceView<T> {
    /// Decode the view field at `field_pos` without checking it.
    ///
    /// Only meaningful for views that [`ResourceView::parse`] has accepted.
    pub fn read(data: Data<'_>, field_pos: usize) -> Self {
        let rel = data.i32(field_pos);
        let count = data.u32(field_pos + 4);
        if count == 0 {
            return Self::empty();
        }
        Self {
            start: (field_pos as i64 + rel as i64) as usize,
            count,
            _marker: PhantomData,
        }
    }

    /// Decode and validate the view field at `field_pos`, then validate every
    /// element it covers.
    pub fn parse(data: Data<'_>, field_pos: usize) -> Result<Self, Corruption> {
        let view = Self::parse_range(data, field_pos, T::NAME)?;
        for index in 0..view.len() {
            T::validate(data, view.start + index * T::SIZE)?;
        }
        Ok(view)
    }

    fn parse_range(data: Data<'_>, field_pos: usize, what: &'static str) -> Result<Self, Corruption> {
        let rel = data.i32(field_pos);
        let count = data.u32(field_pos + 4);
        if count == 0 {
            return Ok(Self::empty());
        }
        if rel == 0 {
            return Err(Corruption::NullView {
                what,
                field: field_pos,
                count,
            });
        }

        let start = field_pos as i64 + rel as i64;
        let len = count as u64 * T::SIZE as u64;
        let in_bounds = start >= 0 && (start as u64).saturating_add(len) <= data.len() as u64;
        if !in_bounds {
            return Err(Corruption::ViewOutOfBounds {
                what,
                start,
                len,
                file_len: data.len(),
            });
        }

        let start = start as usize;
        if start % T::ALIGN != 0 {
            return Err(Corruption::MisalignedView {
                what,
                start,
                align: T::ALIGN,
            });
        }

        Ok(Self {
            start,
            count,
            _marker: PhantomData,
        })
    }

    /// Read element `index`.
    ///
    /// # Panics
    /// If `index >= len()`.
    pub fn get(&self, data: Data<'_>, index: usize) -> T {
        assert!(
            index < self.len(),
            "{} index {index} out of range for view of {}",
            T::NAME,
            self.count
        );
        T::read(data, self.start + index * T::SIZE)
    }

    pub fn iter<'a>(&self, data: Data<'a>) -> ViewIter<'a, T> {
        ViewIter {
            data,
            view: *self,
            index: 0,
        }
    }

    /// Number of bytes covered by the view.
    pub fn byte_len(&self) -> usize {
        self.len() * T::SIZE
    }
}

/// Iterator over the elements of a [`ResourceView`].
pub struct ViewIter<'a, T> {
    data: Data<'a>,
    view: ResourceView<T>,
    index: usize,
}

impl<T: Record> Iterator for ViewIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.index >= self.view.len() {
            return None;
        }
        let item = self.view.get(self.data, self.index);
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.view.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl<T: Record> ExactSizeIterator for ViewIter<'_, T> {}

/// A NUL-terminated UTF-8 string stored as a byte view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StringView(ResourceView<u8>);

impl StringView {
    pub fn read(data: Data<'_>, field_pos: usize) -> Self {
        Self(ResourceView::read(data, field_pos))
    }

    /// Decode the string field at `field_pos`, requiring a trailing NUL and
    /// valid UTF-8 before it. An empty view is the empty string.
    pub fn parse(data: Data<'_>, field_pos: usize, what: &'static str) -> Result<Self, Corruption> {
        let view = ResourceView::<u8>::parse_range(data, field_pos, what)?;
        if view.is_empty() {
            return Ok(Self(view));
        }

        let bytes = data.slice(view.start, view.len());
        let Some((&0, text)) = bytes.split_last() else {
            return Err(Corruption::UnterminatedString {
                what,
                start: view.start,
            });
        };
        if std::str::from_utf8(text).is_err() {
            return Err(Corruption::InvalidString {
                what,
                start: view.start,
            });
        }
        Ok(Self(view))
    }

    /// The string text, without its terminator.
    pub fn as_str<'a>(&self, data: Data<'a>) -> &'a str {
        if self.0.is_empty() {
            return "";
        }
        let bytes = data.slice(self.0.start, self.0.len() - 1);
        std::str::from_utf8(bytes).unwrap_or_default()
    }

    pub fn view(&self) -> ResourceView<u8> {
        self.0
    }
}
