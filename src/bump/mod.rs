//! Linear allocation over one fixed-size buffer.

use allocator_api2::alloc::{
  AllocError,
  Allocator,
  Global,
};
use core::{
  alloc::Layout,
  cell::UnsafeCell,
  mem,
  ptr::{
    self,
    NonNull,
  },
};

use crate::error::{
  Error,
  Result,
};

/// Alignment of every bump buffer.
pub(crate) const BUFFER_ALIGN: usize = mem::align_of::<u64>();

struct BumpInner {
  buffer: NonNull<u8>,
  buffer_size: usize,
  end_index: usize,
}

/// Bump allocator owning a single buffer obtained from `A`.
///
/// Bytes `[0, end_index)` are in use. Only the most recent block can be
/// freed; everything else is reclaimed by [`reset`](Self::reset) or drop.
pub struct BumpAllocator<A: Allocator = Global> {
  allocator: A,
  inner: UnsafeCell<BumpInner>,
}

impl BumpAllocator<Global> {
  pub fn new(buffer_size: usize) -> Result<Self> {
    Self::new_in(Global, buffer_size)
  }
}

impl<A: Allocator> BumpAllocator<A> {
  /// Acquire a zeroed buffer of `buffer_size` bytes from `allocator`.
  pub fn new_in(allocator: A, buffer_size: usize) -> Result<Self> {
    if buffer_size == 0 {
      return Err(Error::InvalidArgument("buffer_size must be non-zero"));
    }
    let layout = buffer_layout(buffer_size)?;
    let buffer = allocator.allocate_zeroed(layout)?.cast::<u8>();
    Ok(Self {
      allocator,
      inner: UnsafeCell::new(BumpInner {
        buffer,
        buffer_size,
        end_index: 0,
      }),
    })
  }

  fn get(&self) -> &BumpInner {
    // SAFETY: no &mut to inner outlives a single method call
    unsafe { &*self.inner.get() }
  }

  fn get_mut(&self) -> &mut BumpInner {
    // SAFETY: single-threaded (UnsafeCell makes the type !Sync) and no
    // reference into inner is held across calls
    unsafe { &mut *self.inner.get() }
  }

  pub fn buffer_size(&self) -> usize {
    self.get().buffer_size
  }

  /// High-water mark: bytes handed out since creation or the last reset.
  pub fn end_index(&self) -> usize {
    self.get().end_index
  }

  pub fn available(&self) -> usize {
    let inner = self.get();
    inner.buffer_size - inner.end_index
  }

  /// Whether `ptr` points into this allocator's buffer.
  pub fn contains(&self, ptr: *const u8) -> bool {
    let inner = self.get();
    let start = inner.buffer.as_ptr() as usize;
    let addr = ptr as usize;
    addr >= start && addr < start + inner.buffer_size
  }

  /// Rewind the cursor without clearing the buffer.
  ///
  /// Taking `&mut self` proves no container still borrows this allocator,
  /// so no stale pointer into the buffer can be dereferenced afterwards.
  pub fn reset(&mut self) {
    self.inner.get_mut().end_index = 0;
  }

  fn offset_of(&self, ptr: NonNull<u8>) -> Option<usize> {
    if self.contains(ptr.as_ptr()) {
      Some(ptr.as_ptr() as usize - self.get().buffer.as_ptr() as usize)
    } else {
      None
    }
  }
}

fn buffer_layout(buffer_size: usize) -> Result<Layout> {
  Layout::from_size_align(buffer_size, BUFFER_ALIGN)
    .map_err(|_| Error::InvalidArgument("buffer_size overflows a layout"))
}

unsafe impl<A: Allocator> Allocator for BumpAllocator<A> {
  fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
    let inner = self.get_mut();

    let base = inner.buffer.as_ptr() as usize;
    let align = layout.align();
    let size = layout.size();

    let cursor = base.checked_add(inner.end_index).ok_or(AllocError)?;
    let aligned = cursor.checked_add(align - 1).ok_or(AllocError)? & !(align - 1);
    let aligned_start = aligned - base;
    let end = aligned_start.checked_add(size).ok_or(AllocError)?;

    if end > inner.buffer_size {
      return Err(AllocError);
    }

    inner.end_index = end;

    // SAFETY: aligned_start + size <= buffer_size
    let ptr = unsafe { NonNull::new_unchecked(inner.buffer.as_ptr().add(aligned_start)) };
    Ok(NonNull::slice_from_raw_parts(ptr, size))
  }

  unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
    let Some(offset) = self.offset_of(ptr) else {
      return;
    };
    let inner = self.get_mut();
    if offset + layout.size() == inner.end_index {
      inner.end_index = offset;
    }
  }

  unsafe fn grow(
    &self,
    ptr: NonNull<u8>,
    old_layout: Layout,
    new_layout: Layout,
  ) -> Result<NonNull<[u8]>, AllocError> {
    let offset = self.offset_of(ptr).ok_or(AllocError)?;
    let old_size = old_layout.size();
    let new_size = new_layout.size();

    let inner = self.get_mut();
    let aligned_in_place = (ptr.as_ptr() as usize) % new_layout.align() == 0;
    if aligned_in_place && offset + old_size == inner.end_index {
      if offset + new_size <= inner.buffer_size {
        inner.end_index = offset + new_size;
        return Ok(NonNull::slice_from_raw_parts(ptr, new_size));
      }
      return Err(AllocError);
    }

    let new_ptr = self.allocate(new_layout)?;
    // SAFETY: both blocks are live, distinct, and at least old_size long
    unsafe {
      ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.cast::<u8>().as_ptr(), old_size);
    }
    Ok(new_ptr)
  }

  unsafe fn grow_zeroed(
    &self,
    ptr: NonNull<u8>,
    old_layout: Layout,
    new_layout: Layout,
  ) -> Result<NonNull<[u8]>, AllocError> {
    // SAFETY: forwarded caller contract
    let new_ptr = unsafe { self.grow(ptr, old_layout, new_layout)? };
    let old_size = old_layout.size();
    // SAFETY: the new block is new_layout.size() bytes long
    unsafe {
      new_ptr
        .cast::<u8>()
        .as_ptr()
        .add(old_size)
        .write_bytes(0, new_layout.size() - old_size);
    }
    Ok(new_ptr)
  }

  unsafe fn shrink(
    &self,
    ptr: NonNull<u8>,
    old_layout: Layout,
    new_layout: Layout,
  ) -> Result<NonNull<[u8]>, AllocError> {
    let offset = self.offset_of(ptr).ok_or(AllocError)?;
    if (ptr.as_ptr() as usize) % new_layout.align() != 0 {
      return Err(AllocError);
    }
    let new_size = new_layout.size();
    debug_assert!(new_size <= old_layout.size());

    let inner = self.get_mut();
    if offset + old_layout.size() == inner.end_index {
      inner.end_index = offset + new_size;
    }
    Ok(NonNull::slice_from_raw_parts(ptr, new_size))
  }
}

impl<A: Allocator> Drop for BumpAllocator<A> {
  fn drop(&mut self) {
    let inner = self.inner.get_mut();
    if let Ok(layout) = buffer_layout(inner.buffer_size) {
      // SAFETY: buffer came from this allocator with this layout
      unsafe { self.allocator.deallocate(inner.buffer, layout) };
    }
  }
}
