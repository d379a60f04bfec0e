//! Growable pool of bump arenas.
//!
//! Arenas are acquired lazily from a backing allocator, filled in order and
//! never compacted. A single request must fit inside one arena.

use allocator_api2::{
  alloc::{
    AllocError,
    Allocator,
    Global,
  },
  vec::Vec,
};
use core::{
  alloc::Layout,
  cell::UnsafeCell,
  ptr::{
    self,
    NonNull,
  },
};
use log::{
  debug,
  trace,
  warn,
};

use crate::{
  bump::BumpAllocator,
  config::ArenaConfig,
  error::Result,
};

struct ArenaInner<A: Allocator + Clone> {
  allocator: A,
  config: ArenaConfig,
  arenas: Vec<BumpAllocator<A>, A>,
}

/// Allocator presenting a set of bump arenas as one growable pool.
///
/// Memory goes back to the backing allocator only when the arena is dropped.
pub struct ArenaAllocator<A: Allocator + Clone = Global> {
  inner: UnsafeCell<ArenaInner<A>>,
}

impl ArenaAllocator<Global> {
  pub fn new(config: ArenaConfig) -> Result<Self> {
    Self::new_in(Global, config)
  }
}

impl<A: Allocator + Clone> ArenaAllocator<A> {
  /// Create the arena and eagerly acquire its first bump arena.
  ///
  /// Failing to acquire that first arena is not an error: the arena starts
  /// empty and retries on the next allocation.
  pub fn new_in(allocator: A, config: ArenaConfig) -> Result<Self> {
    config.validate()?;

    let mut arenas = Vec::new_in(allocator.clone());
    if arenas.try_reserve_exact(config.max_arenas).is_err() {
      warn!(
        "arena: could not reserve slot table for {} arenas",
        config.max_arenas
      );
    }

    let mut inner = ArenaInner {
      allocator,
      config,
      arenas,
    };
    if inner.acquire().is_err() {
      warn!(
        "arena: initial arena of {} bytes unavailable, starting empty",
        config.arena_size
      );
    }

    Ok(Self {
      inner: UnsafeCell::new(inner),
    })
  }

  fn inner(&self) -> &ArenaInner<A> {
    // SAFETY: no &mut to inner outlives a single method call
    unsafe { &*self.inner.get() }
  }

  fn inner_mut(&self) -> &mut ArenaInner<A> {
    // SAFETY: the type is !Sync and the backing allocator never re-enters
    // this arena, so this is the only live reference
    unsafe { &mut *self.inner.get() }
  }

  pub fn config(&self) -> ArenaConfig {
    self.inner().config
  }

  pub fn arena_size(&self) -> usize {
    self.inner().config.arena_size
  }

  pub fn max_arenas(&self) -> usize {
    self.inner().config.max_arenas
  }

  /// Arenas acquired so far.
  pub fn num_arenas(&self) -> usize {
    self.inner().arenas.len()
  }

  /// Bytes currently handed out across all arenas.
  pub fn used_bytes(&self) -> usize {
    self.inner().arenas.iter().map(BumpAllocator::end_index).sum()
  }

  /// Rewind every arena. Buffers stay owned by the arena.
  pub fn reset(&mut self) {
    let inner = self.inner.get_mut();
    trace!("arena: reset {} arenas", inner.arenas.len());
    for arena in inner.arenas.iter_mut() {
      arena.reset();
    }
  }

  fn owner_of(&self, ptr: NonNull<u8>) -> Option<&BumpAllocator<A>> {
    self
      .inner()
      .arenas
      .iter()
      .find(|arena| arena.contains(ptr.as_ptr()))
  }

  fn alloc_impl(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
    let inner = self.inner_mut();
    if layout.size() > inner.config.arena_size {
      return Err(AllocError);
    }

    for arena in inner.arenas.iter() {
      if let Ok(block) = arena.allocate(layout) {
        return Ok(block);
      }
    }

    let fresh = inner.acquire()?;
    fresh.allocate(layout)
  }

  /// Move a block into fresh space, copying `copy_len` bytes.
  unsafe fn relocate(
    &self,
    ptr: NonNull<u8>,
    old_layout: Layout,
    new_layout: Layout,
    copy_len: usize,
  ) -> Result<NonNull<[u8]>, AllocError> {
    let new_block = self.alloc_impl(new_layout)?;
    // SAFETY: ptr is live for old_layout, new_block for new_layout, and
    // copy_len does not exceed either
    unsafe {
      ptr::copy_nonoverlapping(ptr.as_ptr(), new_block.cast::<u8>().as_ptr(), copy_len);
      self.deallocate(ptr, old_layout);
    }
    Ok(new_block)
  }
}

impl<A: Allocator + Clone> ArenaInner<A> {
  fn acquire(&mut self) -> Result<&BumpAllocator<A>, AllocError> {
    if self.arenas.len() >= self.config.max_arenas {
      return Err(AllocError);
    }
    self.arenas.try_reserve(1).map_err(|_| AllocError)?;

    let arena = BumpAllocator::new_in(self.allocator.clone(), self.config.arena_size)
      .map_err(|_| AllocError)?;
    self.arenas.push(arena);
    debug!(
      "arena: acquired arena {}/{} ({} bytes)",
      self.arenas.len(),
      self.config.max_arenas,
      self.config.arena_size
    );
    self.arenas.last().ok_or(AllocError)
  }
}

unsafe impl<A: Allocator + Clone> Allocator for ArenaAllocator<A> {
  fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
    self.alloc_impl(layout)
  }

  unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
    if let Some(arena) = self.owner_of(ptr) {
      // SAFETY: the block was handed out by this arena
      unsafe { arena.deallocate(ptr, layout) };
    }
  }

  unsafe fn grow(
    &self,
    ptr: NonNull<u8>,
    old_layout: Layout,
    new_layout: Layout,
  ) -> Result<NonNull<[u8]>, AllocError> {
    if new_layout.size() > self.arena_size() {
      return Err(AllocError);
    }
    if let Some(arena) = self.owner_of(ptr) {
      // SAFETY: forwarded caller contract
      if let Ok(block) = unsafe { arena.grow(ptr, old_layout, new_layout) } {
        return Ok(block);
      }
    }
    // SAFETY: forwarded caller contract
    unsafe { self.relocate(ptr, old_layout, new_layout, old_layout.size()) }
  }

  unsafe fn shrink(
    &self,
    ptr: NonNull<u8>,
    old_layout: Layout,
    new_layout: Layout,
  ) -> Result<NonNull<[u8]>, AllocError> {
    if let Some(arena) = self.owner_of(ptr) {
      // SAFETY: forwarded caller contract
      if let Ok(block) = unsafe { arena.shrink(ptr, old_layout, new_layout) } {
        return Ok(block);
      }
    }
    // SAFETY: forwarded caller contract
    unsafe { self.relocate(ptr, old_layout, new_layout, new_layout.size()) }
  }
}

impl<A: Allocator + Clone> Drop for ArenaAllocator<A> {
  fn drop(&mut self) {
    let inner = self.inner.get_mut();
    // newest first, then the slot table, so a LIFO backing allocator rewinds fully
    while let Some(arena) = inner.arenas.pop() {
      drop(arena);
    }
  }
}

#[cfg(test)]
mod tests;
