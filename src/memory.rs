//! Bump-pointer memory arenas
//!
//! An `Arena` owns a fixed block of bytes and hands out increasing offsets
//! until it runs out. There is no per-allocation free. Allocations come back
//! as typed `ArenaSlice<T>` handles that are resolved against the arena; a
//! `reset` bumps the arena's generation so stale handles resolve to `None`
//! instead of aliasing newer data.

use std::fmt;
use std::marker::PhantomData;
use std::mem::{align_of, size_of};

use bytemuck::Pod;

/// Backing storage is kept in 8-byte words so any `Pod` type up to 8-byte
/// alignment can be viewed in place.
type Word = u64;
const WORD_SIZE: usize = size_of::<Word>();

#[inline]
pub const fn kilobytes(n: usize) -> usize {
    n * 1024
}

#[inline]
pub const fn megabytes(n: usize) -> usize {
    kilobytes(n) * 1024
}

/// Arena allocation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// The request does not fit in what is left of the arena
    OutOfMemory {
        arena: &'static str,
        requested: usize,
        remaining: usize,
    },
    /// The element type needs more alignment than the arena guarantees
    Alignment { arena: &'static str, align: usize },
    /// The backing block itself could not be allocated
    Allocation { arena: &'static str, size: usize },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaError::OutOfMemory {
                arena,
                requested,
                remaining,
            } => write!(
                f,
                "{} arena exhausted: requested {} bytes, {} remaining",
                arena, requested, remaining
            ),
            ArenaError::Alignment { arena, align } => {
                write!(f, "{} arena cannot satisfy {}-byte alignment", arena, align)
            },
            ArenaError::Allocation { arena, size } => {
                write!(f, "cannot allocate {} arena of {} bytes", arena, size)
            },
        }
    }
}

impl std::error::Error for ArenaError {}

/// Typed handle to `len` elements of `T` inside an arena
#[derive(Debug)]
pub struct ArenaSlice<T> {
    offset: usize,
    len: usize,
    generation: u32,
    _marker: PhantomData<T>,
}

impl<T> Clone for ArenaSlice<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaSlice<T> {}

impl<T> PartialEq for ArenaSlice<T> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.len == other.len && self.generation == other.generation
    }
}

impl<T> ArenaSlice<T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte offset from the arena base
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    fn byte_len(&self) -> usize {
        self.len * size_of::<T>()
    }
}

/// Linear allocator over a fixed region
pub struct Arena {
    name: &'static str,
    words: Vec<Word>,
    size: usize,
    used: usize,
    generation: u32,
}

impl Arena {
    /// Create an arena of `size` bytes, zero-filled. Fails instead of
    /// aborting when the block cannot be allocated.
    pub fn new(name: &'static str, size: usize) -> Result<Self, ArenaError> {
        let mut words = Vec::new();
        words
            .try_reserve_exact(size.div_ceil(WORD_SIZE))
            .map_err(|_| ArenaError::Allocation { arena: name, size })?;
        words.resize(size.div_ceil(WORD_SIZE), 0);

        Ok(Self {
            name,
            words,
            size,
            used: 0,
            generation: 0,
        })
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn used(&self) -> usize {
        self.used
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.size - self.used
    }

    /// Reserve `size` bytes aligned to `align`, returning the byte offset
    pub fn push_size(&mut self, size: usize, align: usize) -> Result<usize, ArenaError> {
        if align == 0 || !align.is_power_of_two() || align > WORD_SIZE {
            return Err(ArenaError::Alignment {
                arena: self.name,
                align,
            });
        }

        let start = self.used.next_multiple_of(align);
        let end = start.checked_add(size).filter(|&end| end <= self.size);
        let Some(end) = end else {
            return Err(ArenaError::OutOfMemory {
                arena: self.name,
                requested: size,
                remaining: self.remaining(),
            });
        };

        self.used = end;
        Ok(start)
    }

    /// Allocate `count` zeroed elements of `T`
    pub fn push_slice<T: Pod>(&mut self, count: usize) -> Result<ArenaSlice<T>, ArenaError> {
        let bytes = count
            .checked_mul(size_of::<T>())
            .ok_or(ArenaError::OutOfMemory {
                arena: self.name,
                requested: usize::MAX,
                remaining: self.remaining(),
            })?;
        let offset = self.push_size(bytes, align_of::<T>())?;

        let slice = ArenaSlice {
            offset,
            len: count,
            generation: self.generation,
            _marker: PhantomData,
        };
        // Memory handed out after a reset still holds last frame's bytes
        self.bytes_mut()[offset..offset + bytes].fill(0);
        Ok(slice)
    }

    /// Allocate a slice and fill it from `values`
    pub fn push_copy<T: Pod>(&mut self, values: &[T]) -> Result<ArenaSlice<T>, ArenaError> {
        let slice = self.push_slice::<T>(values.len())?;
        if let Some(dst) = self.get_mut(slice) {
            dst.copy_from_slice(values);
        }
        Ok(slice)
    }

    /// Resolve a handle. `None` if it came from before the last reset.
    pub fn get<T: Pod>(&self, slice: ArenaSlice<T>) -> Option<&[T]> {
        let range = self.live_range(&slice)?;
        Some(bytemuck::cast_slice(&self.bytes()[range]))
    }

    pub fn get_mut<T: Pod>(&mut self, slice: ArenaSlice<T>) -> Option<&mut [T]> {
        let range = self.live_range(&slice)?;
        Some(bytemuck::cast_slice_mut(&mut self.bytes_mut()[range]))
    }

    /// Forget every allocation. Outstanding handles stop resolving.
    pub fn reset(&mut self) {
        self.used = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    fn live_range<T>(&self, slice: &ArenaSlice<T>) -> Option<std::ops::Range<usize>> {
        let end = slice.offset + slice.byte_len();
        (slice.generation == self.generation && end <= self.used).then_some(slice.offset..end)
    }

    #[inline]
    fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }

    #[inline]
    fn bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.words)
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("used", &self.used)
            .field("generation", &self.generation)
            .finish()
    }
}

/// The two arenas every game gets: `permanent` lives for the whole process,
/// `transient` is scratch space reset at the start of every frame.
#[derive(Debug)]
pub struct GameMemory {
    pub permanent: Arena,
    pub transient: Arena,
}

impl GameMemory {
    pub fn new(permanent_size: usize, transient_size: usize) -> Result<Self, ArenaError> {
        Ok(Self {
            permanent: Arena::new("permanent", permanent_size)?,
            transient: Arena::new("transient", transient_size)?,
        })
    }
}
