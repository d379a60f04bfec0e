//! C-shaped allocator capability table.
//!
//! [`AllocatorInterface`] carries three `extern "C"` function pointers and
//! implements [`Allocator`], so a table handed over from foreign code can
//! back any container in this crate.

use allocator_api2::alloc::{
  AllocError,
  Allocator,
};
use core::{
  alloc::Layout,
  ffi::c_void,
  mem,
  ptr::{
    self,
    NonNull,
  },
};

/// Largest alignment the table is assumed to honour.
pub const MAX_ALIGN: usize = mem::align_of::<u64>();

/// Returns null on failure.
pub type AllocateFn = unsafe extern "C" fn(size: u64) -> *mut c_void;
/// Preserves the first `min(old, new)` bytes and frees the old block.
/// Returns the old pointer, still valid, on failure.
pub type ResizeFn = unsafe extern "C" fn(ptr: *mut c_void, new_size: u64) -> *mut c_void;
pub type FreeFn = unsafe extern "C" fn(ptr: *mut c_void, size: u64);

/// Function-pointer allocator.
///
/// Blocks returned by `memory_allocate` must be aligned to [`MAX_ALIGN`];
/// requests for stricter alignment fail. Zero-sized requests ask for one
/// byte so every block has a real address.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AllocatorInterface {
  pub memory_allocate: AllocateFn,
  pub memory_resize: ResizeFn,
  pub memory_free: FreeFn,
}

impl AllocatorInterface {
  /// Table backed by the global heap.
  pub const fn system() -> Self {
    Self {
      memory_allocate: system_allocate,
      memory_resize: system_resize,
      memory_free: system_free,
    }
  }
}

impl Default for AllocatorInterface {
  fn default() -> Self {
    Self::system()
  }
}

fn request(layout: Layout) -> Result<u64, AllocError> {
  if layout.align() > MAX_ALIGN {
    return Err(AllocError);
  }
  u64::try_from(layout.size().max(1)).map_err(|_| AllocError)
}

fn accept(ptr: *mut c_void, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
  let ptr = NonNull::new(ptr.cast::<u8>()).ok_or(AllocError)?;
  Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
}

unsafe impl Allocator for AllocatorInterface {
  fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
    let size = request(layout)?;
    // SAFETY: memory_allocate accepts any non-zero size
    let ptr = unsafe { (self.memory_allocate)(size) };
    if (ptr as usize) % layout.align() != 0 {
      // SAFETY: ptr came from memory_allocate with this size
      unsafe { (self.memory_free)(ptr, size) };
      return Err(AllocError);
    }
    accept(ptr, layout)
  }

  unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
    let size = layout.size().max(1) as u64;
    // SAFETY: caller guarantees ptr was allocated by this table
    unsafe { (self.memory_free)(ptr.as_ptr().cast(), size) };
  }

  unsafe fn shrink(
    &self,
    ptr: NonNull<u8>,
    old_layout: Layout,
    new_layout: Layout,
  ) -> Result<NonNull<[u8]>, AllocError> {
    debug_assert!(new_layout.size() <= old_layout.size());
    let size = request(new_layout)?;
    // SAFETY: caller guarantees ptr was allocated by this table
    let resized = unsafe { (self.memory_resize)(ptr.as_ptr().cast(), size) };
    accept(resized, new_layout)
  }
}

const HEADER: usize = mem::size_of::<u64>();

fn header_layout(size: u64) -> Option<Layout> {
  let total = usize::try_from(size).ok()?.checked_add(HEADER)?;
  Layout::from_size_align(total, MAX_ALIGN).ok()
}

/// Heap allocation prefixed with its size.
///
/// # Safety
///
/// The returned pointer must only be released through [`system_free`] or
/// resized through [`system_resize`].
pub unsafe extern "C" fn system_allocate(size: u64) -> *mut c_void {
  let Some(layout) = header_layout(size) else {
    return ptr::null_mut();
  };
  // SAFETY: layout has a non-zero size
  unsafe {
    let base = alloc::alloc::alloc(layout);
    if base.is_null() {
      return ptr::null_mut();
    }
    base.cast::<u64>().write(size);
    base.add(HEADER).cast()
  }
}

/// # Safety
///
/// `ptr` must be null or come from [`system_allocate`] / [`system_resize`].
pub unsafe extern "C" fn system_resize(ptr: *mut c_void, new_size: u64) -> *mut c_void {
  if ptr.is_null() {
    // SAFETY: forwarding the same contract
    return unsafe { system_allocate(new_size) };
  }
  // SAFETY: ptr sits HEADER bytes past a block that starts with its size
  unsafe {
    let base = ptr.cast::<u8>().sub(HEADER);
    let old_size = base.cast::<u64>().read();
    let (Some(old_layout), Some(new_layout)) = (header_layout(old_size), header_layout(new_size))
    else {
      return ptr;
    };
    let resized = alloc::alloc::realloc(base, old_layout, new_layout.size());
    if resized.is_null() {
      return ptr;
    }
    resized.cast::<u64>().write(new_size);
    resized.add(HEADER).cast()
  }
}

/// # Safety
///
/// `ptr` must be null or come from [`system_allocate`] / [`system_resize`].
pub unsafe extern "C" fn system_free(ptr: *mut c_void, _size: u64) {
  if ptr.is_null() {
    return;
  }
  // SAFETY: ptr sits HEADER bytes past a block that starts with its size
  unsafe {
    let base = ptr.cast::<u8>().sub(HEADER);
    if let Some(layout) = header_layout(base.cast::<u64>().read()) {
      alloc::alloc::dealloc(base, layout);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    array::Array,
    dict::Dict,
    error::Error,
    list::List,
  };

  unsafe extern "C" fn refuse_allocate(_size: u64) -> *mut c_void {
    ptr::null_mut()
  }

  #[test]
  fn system_table_backs_containers() {
    let table = AllocatorInterface::system();
    let mut array = Array::new_in(table, 4, 8).unwrap();
    array.set_as(3, &99u64).unwrap();
    assert_eq!(array.get_as::<u64>(3), Ok(99));

    let mut dict = Dict::new_in(table, 8, 4, 4).unwrap();
    dict.set_as(&1u32, &2u32).unwrap();
    assert_eq!(dict.get_as::<u32, u32>(&1), Ok(Some(2)));
  }

  #[test]
  fn list_resize_through_table() {
    let mut list = List::new_in(AllocatorInterface::default(), 2, 4).unwrap();
    list.append_as(&1i32).unwrap();
    list.append_as(&2i32).unwrap();
    list.resize(64).unwrap();
    list.append_as(&3i32).unwrap();
    list.resize(2).unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list.get_as::<i32>(1), Ok(2));
  }

  #[test]
  fn failing_table_reports_alloc_error() {
    let table = AllocatorInterface {
      memory_allocate: refuse_allocate,
      ..AllocatorInterface::system()
    };
    assert_eq!(Array::new_in(table, 4, 4).err(), Some(Error::Alloc));
  }

  #[test]
  fn over_aligned_requests_fail() {
    let table = AllocatorInterface::system();
    let layout = Layout::from_size_align(32, 64).unwrap();
    assert!(table.allocate(layout).is_err());
  }

  #[test]
  fn resize_preserves_prefix() {
    unsafe {
      let ptr = system_allocate(4).cast::<u8>();
      ptr.copy_from_nonoverlapping([1u8, 2, 3, 4].as_ptr(), 4);
      let grown = system_resize(ptr.cast(), 1024).cast::<u8>();
      assert_eq!(core::slice::from_raw_parts(grown, 4), &[1, 2, 3, 4]);
      system_free(grown.cast(), 1024);
    }
  }
}
