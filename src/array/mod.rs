//! Fixed-length sequence of equal-size byte records.

use allocator_api2::alloc::{
  Allocator,
  Global,
};
use core::{
  alloc::Layout,
  cmp::Ordering,
  fmt,
  mem,
  ptr::NonNull,
  slice::{
    self,
    ChunksExact,
  },
};
use getset::{
  CopyGetters,
  Getters,
};

use crate::{
  error::{
    Error,
    Result,
  },
  record::{
    self,
    Record,
  },
};

pub(crate) mod ops;

/// Three-way result of a record comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
  FirstLarger,
  Equal,
  FirstSmaller,
}

impl From<Ordering> for Comparison {
  fn from(ordering: Ordering) -> Self {
    match ordering {
      Ordering::Greater => Comparison::FirstLarger,
      Ordering::Equal => Comparison::Equal,
      Ordering::Less => Comparison::FirstSmaller,
    }
  }
}

/// `member_count` records of `member_size` bytes each, in one contiguous
/// buffer obtained from `A`.
///
/// The shape is fixed at creation; the bytes are mutable.
#[derive(Getters, CopyGetters)]
pub struct Array<A: Allocator = Global> {
  /// Allocator that owns the buffer.
  #[getset(get = "pub")]
  allocator: A,
  data: NonNull<u8>,
  /// Number of records.
  #[getset(get_copy = "pub")]
  member_count: usize,
  /// Bytes per record.
  #[getset(get_copy = "pub")]
  member_size: usize,
}

impl Array<Global> {
  pub fn new(member_count: usize, member_size: usize) -> Result<Self> {
    Self::new_in(Global, member_count, member_size)
  }
}

impl<A: Allocator> Array<A> {
  /// Allocate a zeroed array. Both dimensions must be non-zero.
  pub fn new_in(allocator: A, member_count: usize, member_size: usize) -> Result<Self> {
    if member_count == 0 {
      return Err(Error::InvalidArgument("member_count must be non-zero"));
    }
    Self::with_shape(allocator, member_count, member_size)
  }

  /// Like [`new_in`](Self::new_in) but allows an empty array, which owns no
  /// memory. Derived arrays (filter, dict copies) can legitimately be empty.
  pub(crate) fn with_shape(allocator: A, member_count: usize, member_size: usize) -> Result<Self> {
    if member_size == 0 {
      return Err(Error::InvalidArgument("member_size must be non-zero"));
    }
    let bytes = member_count
      .checked_mul(member_size)
      .ok_or(Error::InvalidArgument("array size overflows"))?;
    let data = if bytes == 0 {
      NonNull::dangling()
    } else {
      allocator.allocate_zeroed(layout(bytes)?)?.cast::<u8>()
    };
    Ok(Self {
      allocator,
      data,
      member_count,
      member_size,
    })
  }

  /// Allocate an array holding a copy of `bytes`, which must be a whole
  /// number of `member_size` records.
  pub fn from_bytes_in(allocator: A, member_size: usize, bytes: &[u8]) -> Result<Self> {
    if member_size == 0 || bytes.len() % member_size != 0 {
      return Err(Error::InvalidArgument("bytes are not a whole number of records"));
    }
    let mut array = Self::with_shape(allocator, bytes.len() / member_size, member_size)?;
    array.as_bytes_mut().copy_from_slice(bytes);
    Ok(array)
  }

  /// Size of the record buffer in bytes.
  pub fn byte_len(&self) -> usize {
    self.member_count * self.member_size
  }

  pub fn is_empty(&self) -> bool {
    self.member_count == 0
  }

  pub fn as_bytes(&self) -> &[u8] {
    // SAFETY: data is live and initialised for byte_len bytes
    unsafe { slice::from_raw_parts(self.data.as_ptr(), self.byte_len()) }
  }

  pub fn as_bytes_mut(&mut self) -> &mut [u8] {
    // SAFETY: data is live and initialised for byte_len bytes
    unsafe { slice::from_raw_parts_mut(self.data.as_ptr(), self.byte_len()) }
  }

  pub fn get(&self, index: usize) -> Option<&[u8]> {
    ops::record(self.as_bytes(), self.member_size, index)
  }

  pub fn get_mut(&mut self, index: usize) -> Option<&mut [u8]> {
    let size = self.member_size;
    ops::record_mut(self.as_bytes_mut(), size, index)
  }

  /// Copy the record at `index` into `out`.
  pub fn get_into(&self, index: usize, out: &mut [u8]) -> Result<()> {
    ops::get_into(self.as_bytes(), self.member_size, index, out)
  }

  /// Overwrite the record at `index`.
  pub fn set(&mut self, index: usize, value: &[u8]) -> Result<()> {
    let size = self.member_size;
    ops::set(self.as_bytes_mut(), size, index, value)
  }

  pub fn get_as<T: Record>(&self, index: usize) -> Result<T> {
    self.check_record_type::<T>()?;
    let bytes = self.get(index).ok_or(Error::OutOfBounds {
      index,
      len: self.member_count,
    })?;
    record::read(bytes)
  }

  pub fn set_as<T: Record>(&mut self, index: usize, value: &T) -> Result<()> {
    self.set(index, record::bytes_of(value))
  }

  fn check_record_type<T: Record>(&self) -> Result<()> {
    crate::error::check_record(self.member_size, mem::size_of::<T>())
  }

  /// Overwrite from offset 0 with at most `max_length` bytes of `src`.
  ///
  /// Returns the number of bytes copied: the minimum of the buffer size,
  /// `max_length` and `src.len()`.
  pub fn copy_memory(&mut self, src: &[u8], max_length: usize) -> usize {
    let len = self.byte_len().min(max_length).min(src.len());
    self.as_bytes_mut()[..len].copy_from_slice(&src[..len]);
    len
  }

  /// Copy records `start..end` into a new array.
  ///
  /// `end` is exclusive and the range must satisfy `start < end < member_count`.
  pub fn create_slice<B: Allocator>(&self, allocator: B, start: usize, end: usize) -> Result<Array<B>> {
    ops::slice_in(self.as_bytes(), self.member_size, allocator, start, end)
  }

  pub fn iter(&self) -> ChunksExact<'_, u8> {
    self.as_bytes().chunks_exact(self.member_size)
  }

  /// Call `f` on every record in place.
  pub fn for_each<F: FnMut(&mut [u8])>(&mut self, f: F) {
    let size = self.member_size;
    self.as_bytes_mut().chunks_exact_mut(size).for_each(f);
  }

  /// Sort in place; not stable.
  pub fn sort<F>(&mut self, compare: F)
  where
    F: FnMut(&[u8], &[u8]) -> Comparison,
  {
    let size = self.member_size;
    ops::sort(self.as_bytes_mut(), size, compare);
  }

  /// Clone into a new array, then apply `f` to every record of the clone.
  pub fn map<B, F>(&self, allocator: B, f: F) -> Result<Array<B>>
  where
    B: Allocator,
    F: FnMut(&mut [u8]),
  {
    ops::map_in(self.as_bytes(), self.member_size, allocator, f)
  }

  /// New array holding, in order, the records matching `predicate`.
  pub fn filter<B, P>(&self, allocator: B, predicate: P) -> Result<Array<B>>
  where
    B: Allocator,
    P: FnMut(&[u8]) -> bool,
  {
    ops::filter_in(self.as_bytes(), self.member_size, allocator, predicate)
  }

  pub fn reverse<B: Allocator>(&self, allocator: B) -> Result<Array<B>> {
    ops::reverse_in(self.as_bytes(), self.member_size, allocator)
  }

  /// Index of the first record at or after `start` matching `predicate`.
  ///
  /// `Ok(None)` when nothing matches, `Err(OutOfBounds)` when `start` is
  /// not a valid index.
  pub fn find_index<P>(&self, start: usize, predicate: P) -> Result<Option<usize>>
  where
    P: FnMut(&[u8]) -> bool,
  {
    ops::find_index(self.as_bytes(), self.member_size, start, predicate)
  }

  pub fn find_item<P>(&self, start: usize, predicate: P) -> Result<Option<&[u8]>>
  where
    P: FnMut(&[u8]) -> bool,
  {
    ops::find_item(self.as_bytes(), self.member_size, start, predicate)
  }

  /// Left fold into `result`.
  ///
  /// `f(previous, current, result)` gets `None` as `previous` on the first
  /// record; the seed is whatever `result` already holds.
  pub fn reduce<F>(&self, f: F, result: &mut [u8])
  where
    F: FnMut(Option<&[u8]>, &[u8], &mut [u8]),
  {
    ops::reduce(self.as_bytes(), self.member_size, f, result);
  }

  pub fn try_clone_in<B: Allocator>(&self, allocator: B) -> Result<Array<B>> {
    Array::from_bytes_in(allocator, self.member_size, self.as_bytes())
  }
}

fn layout(bytes: usize) -> Result<Layout> {
  Layout::array::<u8>(bytes).map_err(|_| Error::InvalidArgument("array size overflows"))
}

impl<A: Allocator> fmt::Debug for Array<A> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Array")
      .field("member_count", &self.member_count)
      .field("member_size", &self.member_size)
      .finish()
  }
}

impl<A: Allocator> Drop for Array<A> {
  fn drop(&mut self) {
    let bytes = self.byte_len();
    if bytes == 0 {
      return;
    }
    if let Ok(layout) = layout(bytes) {
      // SAFETY: data was allocated by this allocator with this layout
      unsafe { self.allocator.deallocate(self.data, layout) };
    }
  }
}
