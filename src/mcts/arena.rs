/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, marker::PhantomData, mem, ptr, sync::Arc};

use anyhow::{bail, Context, Result};
use memmap2::MmapMut;
use tracing::error;

/// Alignment, in bytes, of every allocation an [`Arena`] hands out.
pub const ALIGNMENT: usize = 8;

/// Size of the never-allocated region at the bottom of every arena mapping.
pub const GUARD_BYTES: usize = 4096;

/// Marker for types that may live in an [`Arena`].
///
/// # Safety
///
/// Implementors must have no drop glue, an alignment of at most [`ALIGNMENT`] and a size that is a
/// multiple of [`ALIGNMENT`]. Arenas never run destructors; reclaiming memory only moves a cursor.
/// The layout requirements are also checked at compile time on every allocation.
pub unsafe trait ArenaObject: Sized {}

unsafe impl ArenaObject for u64 {}

struct Layout<T>(PhantomData<T>);

impl<T> Layout<T> {
    const CHECK: () = assert!(
        !mem::needs_drop::<T>()
            && mem::align_of::<T>() <= ALIGNMENT
            && mem::size_of::<T>() % ALIGNMENT == 0,
        "type is not arena-allocatable"
    );
}

/// A typed reference to memory inside an [`Arena`], valid until the arena is rolled back or reset
/// past it.
pub struct Handle<T> {
    offset: usize,
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) const fn from_raw(offset: usize, len: usize) -> Self {
        Self {
            offset,
            len,
            _marker: PhantomData,
        }
    }

    /// Byte offset of this allocation from the start of its arena's mapping.
    #[inline(always)]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Number of `T`s in this allocation.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total size of this allocation, in bytes.
    #[inline(always)]
    pub const fn bytes(&self) -> usize {
        self.len * mem::size_of::<T>()
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}

/// An anonymous memory mapping shared between an [`Arena`] and the readers of what it allocated.
///
/// Only the owning [`Arena`] writes new allocations; everything else reads through handles.
pub struct Region {
    base: *mut u8,
    len: usize,
    _map: MmapMut,
}

// Writes go through the owning `Arena` only, and published allocations are read-only apart from
// their atomics.
unsafe impl Send for Region {}
unsafe impl Sync for Region {}

impl Region {
    /// Size of the whole mapping, guard included.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Borrows the first object of `handle`.
    ///
    /// # Safety
    ///
    /// `handle` must have been returned by the arena owning this region, and must not have been
    /// rolled back or reset since.
    #[inline(always)]
    pub unsafe fn get<T: ArenaObject>(&self, handle: Handle<T>) -> &T {
        &self.slice(Handle::from_raw(handle.offset, 1))[0]
    }

    /// Borrows every object of `handle`.
    ///
    /// The bounds are always checked; an out-of-range handle aborts the process.
    ///
    /// # Safety
    ///
    /// `handle` must have been returned by the arena owning this region, and must not have been
    /// rolled back or reset since.
    #[inline(always)]
    pub unsafe fn slice<T: ArenaObject>(&self, handle: Handle<T>) -> &[T] {
        let in_bounds = handle.offset >= GUARD_BYTES
            && handle.offset % ALIGNMENT == 0
            && handle
                .offset
                .checked_add(handle.bytes())
                .is_some_and(|end| end <= self.len);

        if !in_bounds {
            error!(?handle, len = self.len, "arena access out of bounds");
            std::process::abort();
        }

        std::slice::from_raw_parts(self.base.add(handle.offset).cast::<T>(), handle.len)
    }
}

/// A fixed-capacity bump allocator over an anonymous memory mapping.
///
/// Allocation moves a cursor from the top of the mapping down towards a guard region of
/// [`GUARD_BYTES`] at the bottom. Nothing is ever freed individually: [`Arena::rollback`] and
/// [`Arena::reset`] just move the cursor back up. Allocating into the guard region is a bug, and
/// aborts the process rather than returning an error.
///
/// The [`Default`] arena owns no memory. It has a size of zero and aborts on any allocation, which
/// is what [`std::mem::take`] leaves behind.
#[derive(Default)]
pub struct Arena {
    region: Option<Arc<Region>>,
    cursor: usize,
}

impl Arena {
    /// Maps a new arena able to hold `bytes` bytes of allocations.
    ///
    /// # Example
    /// ```
    /// # use prodigy::*;
    /// let mut arena = Arena::new(64).unwrap();
    /// arena.new_object(42u64);
    /// assert_eq!(arena.size(), 8);
    /// assert!(Arena::new(65).is_err());
    /// ```
    pub fn new(bytes: usize) -> Result<Self> {
        let len = GUARD_BYTES + bytes;
        let mut map = MmapMut::map_anon(len)
            .with_context(|| format!("Failed to map {len} bytes of anonymous memory"))?;
        let base = map.as_mut_ptr();

        if (base as usize + len) % ALIGNMENT != 0 {
            bail!("{len} byte arena at {base:p} doesn't support {ALIGNMENT} byte alignment");
        }

        Ok(Self {
            region: Some(Arc::new(Region {
                base,
                len,
                _map: map,
            })),
            cursor: len,
        })
    }

    /// The mapping this arena allocates from, shared with readers.
    #[inline(always)]
    pub fn region(&self) -> Option<&Arc<Region>> {
        self.region.as_ref()
    }

    /// Bytes currently allocated.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.region.as_ref().map_or(0, |region| region.len - self.cursor)
    }

    /// Bytes that can still be allocated before reaching the guard region.
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.cursor.saturating_sub(GUARD_BYTES)
    }

    /// Moves `value` into the arena.
    pub fn new_object<T: ArenaObject>(&mut self, value: T) -> Handle<T> {
        #[allow(clippy::let_unit_value)]
        let () = Layout::<T>::CHECK;

        let (base, offset) = self.bump(mem::size_of::<T>());
        // SAFETY: `bump` reserved `size_of::<T>()` aligned bytes at `offset`, inside the mapping.
        unsafe { ptr::write(base.add(offset).cast::<T>(), value) };
        Handle::from_raw(offset, 1)
    }

    /// Moves every value of `values` into one contiguous allocation.
    ///
    /// The iterator must yield exactly as many items as it reports.
    pub fn new_array<T, I>(&mut self, values: I) -> Handle<T>
    where
        T: ArenaObject,
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        #[allow(clippy::let_unit_value)]
        let () = Layout::<T>::CHECK;

        let values = values.into_iter();
        let len = values.len();
        let (base, offset) = self.bump(len * mem::size_of::<T>());

        let mut written = 0;
        for value in values.take(len) {
            // SAFETY: `bump` reserved `len` aligned slots starting at `offset`.
            unsafe {
                ptr::write(base.add(offset).cast::<T>().add(written), value);
            }
            written += 1;
        }

        if written != len {
            error!(written, len, "iterator yielded fewer items than it reported");
            std::process::abort();
        }

        Handle::from_raw(offset, len)
    }

    /// Discards `handle` and everything allocated after it.
    pub fn rollback<T>(&mut self, handle: Handle<T>) {
        let end = handle.offset + handle.bytes();
        debug_assert!(end >= self.cursor, "rolled back an allocation that was already freed");
        self.cursor = end.max(self.cursor);
    }

    /// Discards the most recent `bytes` bytes of allocations.
    pub fn reset(&mut self, bytes: usize) {
        debug_assert!(self.size() >= bytes, "reset more bytes than were allocated");
        self.cursor += bytes.min(self.size());
    }

    /// Discards every allocation, returning how many bytes were in use.
    pub fn reset_all(&mut self) -> usize {
        let size = self.size();
        self.reset(size);
        size
    }

    /// Reserves `bytes` below the cursor, returning the mapping base and the new cursor.
    #[inline(always)]
    fn bump(&mut self, bytes: usize) -> (*mut u8, usize) {
        let Some(region) = &self.region else {
            error!(bytes, "allocation from an empty arena");
            std::process::abort();
        };

        if bytes > self.remaining() {
            error!(
                bytes,
                remaining = self.remaining(),
                "arena allocation would enter the guard region"
            );
            std::process::abort();
        }

        self.cursor -= bytes;
        (region.base, self.cursor)
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("size", &self.size())
            .field("remaining", &self.remaining())
            .finish()
    }
}
