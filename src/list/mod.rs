//! Growable record sequence with explicit, caller-driven capacity.

use allocator_api2::alloc::{
  Allocator,
  Global,
};
use core::{
  alloc::Layout,
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
use log::{
  debug,
  trace,
};

use crate::{
  array::{
    Array,
    Comparison,
    ops,
  },
  error::{
    Error,
    Result,
    check_record,
  },
  record::{
    self,
    Record,
  },
};

/// Records `[0, member_count)` are live inside a buffer of
/// `allocated_space` bytes obtained from `A`.
///
/// Inserting never grows the buffer: once full, inserts fail with
/// [`Error::CapacityExhausted`] until the caller calls [`resize`](Self::resize).
#[derive(Getters, CopyGetters)]
pub struct List<A: Allocator = Global> {
  /// Allocator that owns the buffer.
  #[getset(get = "pub")]
  allocator: A,
  data: NonNull<u8>,
  /// Bytes reserved for records.
  #[getset(get_copy = "pub")]
  allocated_space: usize,
  /// Number of live records.
  #[getset(get_copy = "pub")]
  member_count: usize,
  /// Bytes per record.
  #[getset(get_copy = "pub")]
  member_size: usize,
}

impl List<Global> {
  pub fn new(max_members: usize, member_size: usize) -> Result<Self> {
    Self::new_in(Global, max_members, member_size)
  }
}

impl<A: Allocator> List<A> {
  /// Allocate a zeroed, empty list with room for `max_members` records.
  pub fn new_in(allocator: A, max_members: usize, member_size: usize) -> Result<Self> {
    if max_members == 0 || member_size == 0 {
      return Err(Error::InvalidArgument("list dimensions must be non-zero"));
    }
    let allocated_space = space_for(max_members, member_size)?;
    let data = allocator
      .allocate_zeroed(layout(allocated_space)?)?
      .cast::<u8>();
    Ok(Self {
      allocator,
      data,
      allocated_space,
      member_count: 0,
      member_size,
    })
  }

  /// Records the buffer can hold.
  pub fn capacity(&self) -> usize {
    self.allocated_space / self.member_size
  }

  /// Records that can still be inserted before the list is full.
  pub fn remaining(&self) -> usize {
    self.capacity() - self.member_count
  }

  pub fn len(&self) -> usize {
    self.member_count
  }

  pub fn is_empty(&self) -> bool {
    self.member_count == 0
  }

  fn used_space(&self) -> usize {
    self.member_count * self.member_size
  }

  fn buffer_mut(&mut self) -> &mut [u8] {
    // SAFETY: data is live and initialised for allocated_space bytes
    unsafe { slice::from_raw_parts_mut(self.data.as_ptr(), self.allocated_space) }
  }

  /// Bytes of the live records.
  pub fn as_bytes(&self) -> &[u8] {
    // SAFETY: used_space <= allocated_space, all of it initialised
    unsafe { slice::from_raw_parts(self.data.as_ptr(), self.used_space()) }
  }

  pub fn as_bytes_mut(&mut self) -> &mut [u8] {
    // SAFETY: used_space <= allocated_space, all of it initialised
    unsafe { slice::from_raw_parts_mut(self.data.as_ptr(), self.used_space()) }
  }

  pub fn get(&self, index: usize) -> Option<&[u8]> {
    ops::record(self.as_bytes(), self.member_size, index)
  }

  pub fn get_mut(&mut self, index: usize) -> Option<&mut [u8]> {
    let size = self.member_size;
    ops::record_mut(self.as_bytes_mut(), size, index)
  }

  pub fn first(&self) -> Option<&[u8]> {
    self.get(0)
  }

  pub fn last(&self) -> Option<&[u8]> {
    self.member_count.checked_sub(1).and_then(|index| self.get(index))
  }

  pub fn get_into(&self, index: usize, out: &mut [u8]) -> Result<()> {
    ops::get_into(self.as_bytes(), self.member_size, index, out)
  }

  /// Overwrite a live record without changing the count.
  pub fn set(&mut self, index: usize, value: &[u8]) -> Result<()> {
    let size = self.member_size;
    ops::set(self.as_bytes_mut(), size, index, value)
  }

  pub fn get_as<T: Record>(&self, index: usize) -> Result<T> {
    check_record(self.member_size, mem::size_of::<T>())?;
    let bytes = self.get(index).ok_or(Error::OutOfBounds {
      index,
      len: self.member_count,
    })?;
    record::read(bytes)
  }

  pub fn set_as<T: Record>(&mut self, index: usize, value: &T) -> Result<()> {
    self.set(index, record::bytes_of(value))
  }

  /// Insert `value` before `index`, shifting later records toward the tail.
  ///
  /// `index` is clamped to `member_count`. Fails without touching the list
  /// when it is full.
  pub fn insert(&mut self, index: usize, value: &[u8]) -> Result<()> {
    check_record(self.member_size, value.len())?;
    if self.remaining() == 0 {
      trace!("list: refused insert, {} records full", self.member_count);
      return Err(Error::CapacityExhausted {
        capacity: self.capacity(),
      });
    }

    let size = self.member_size;
    let used = self.used_space();
    let offset = index.min(self.member_count) * size;
    let buffer = self.buffer_mut();
    buffer.copy_within(offset..used, offset + size);
    buffer[offset..offset + size].copy_from_slice(value);
    self.member_count += 1;
    Ok(())
  }

  pub fn append(&mut self, value: &[u8]) -> Result<()> {
    self.insert(self.member_count, value)
  }

  pub fn append_as<T: Record>(&mut self, value: &T) -> Result<()> {
    self.append(record::bytes_of(value))
  }

  /// Remove the record at `index`, shifting later records toward the head.
  pub fn remove_at(&mut self, index: usize) -> Result<()> {
    ops::check_index(index, self.member_count)?;
    let size = self.member_size;
    let used = self.used_space();
    let offset = index * size;
    self.buffer_mut().copy_within(offset + size..used, offset);
    self.member_count -= 1;
    Ok(())
  }

  /// Drop every record; capacity is kept.
  pub fn clear(&mut self) {
    self.member_count = 0;
  }

  /// Reallocate to hold exactly `new_capacity` records.
  ///
  /// Shrinking below `member_count` discards the tail records. On
  /// allocation failure the list is left as it was.
  pub fn resize(&mut self, new_capacity: usize) -> Result<()> {
    if new_capacity == 0 {
      return Err(Error::InvalidArgument("list capacity must be non-zero"));
    }
    let new_space = space_for(new_capacity, self.member_size)?;
    let old_layout = layout(self.allocated_space)?;
    let new_layout = layout(new_space)?;

    if new_space != self.allocated_space {
      // SAFETY: data was allocated by this allocator with old_layout
      let block = unsafe {
        if new_space > self.allocated_space {
          self.allocator.grow_zeroed(self.data, old_layout, new_layout)?
        } else {
          self.allocator.shrink(self.data, old_layout, new_layout)?
        }
      };
      self.data = block.cast::<u8>();
      self.allocated_space = new_space;
    }

    debug!(
      "list: resized to {} records of {} bytes",
      new_capacity, self.member_size
    );
    self.member_count = self.member_count.min(new_capacity);
    Ok(())
  }

  /// Overwrite from offset 0 and make the copied bytes the live records.
  ///
  /// Copies `min(allocated_space, max_length, src.len())` bytes; the new
  /// `member_count` is that length divided by `member_size`, so a partial
  /// trailing record is not counted. Returns the bytes copied.
  pub fn copy_memory(&mut self, src: &[u8], max_length: usize) -> usize {
    let len = self.allocated_space.min(max_length).min(src.len());
    self.buffer_mut()[..len].copy_from_slice(&src[..len]);
    self.member_count = len / self.member_size;
    len
  }

  pub fn iter(&self) -> ChunksExact<'_, u8> {
    self.as_bytes().chunks_exact(self.member_size)
  }

  pub fn for_each<F: FnMut(&mut [u8])>(&mut self, f: F) {
    let size = self.member_size;
    self.as_bytes_mut().chunks_exact_mut(size).for_each(f);
  }

  pub fn sort<F>(&mut self, compare: F)
  where
    F: FnMut(&[u8], &[u8]) -> Comparison,
  {
    let size = self.member_size;
    ops::sort(self.as_bytes_mut(), size, compare);
  }

  /// Copy live records `start..end` (exclusive, `start < end < member_count`).
  pub fn create_slice<B: Allocator>(&self, allocator: B, start: usize, end: usize) -> Result<Array<B>> {
    ops::slice_in(self.as_bytes(), self.member_size, allocator, start, end)
  }

  pub fn map<B, F>(&self, allocator: B, f: F) -> Result<Array<B>>
  where
    B: Allocator,
    F: FnMut(&mut [u8]),
  {
    ops::map_in(self.as_bytes(), self.member_size, allocator, f)
  }

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

  pub fn reduce<F>(&self, f: F, result: &mut [u8])
  where
    F: FnMut(Option<&[u8]>, &[u8], &mut [u8]),
  {
    ops::reduce(self.as_bytes(), self.member_size, f, result);
  }

  /// Copy the live records into an exactly sized array.
  pub fn to_array_in<B: Allocator>(&self, allocator: B) -> Result<Array<B>> {
    Array::from_bytes_in(allocator, self.member_size, self.as_bytes())
  }
}

fn space_for(members: usize, member_size: usize) -> Result<usize> {
  members
    .checked_mul(member_size)
    .ok_or(Error::InvalidArgument("list size overflows"))
}

fn layout(bytes: usize) -> Result<Layout> {
  Layout::array::<u8>(bytes).map_err(|_| Error::InvalidArgument("list size overflows"))
}

impl<A: Allocator> fmt::Debug for List<A> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("List")
      .field("member_count", &self.member_count)
      .field("member_size", &self.member_size)
      .field("allocated_space", &self.allocated_space)
      .finish()
  }
}

impl<A: Allocator> Drop for List<A> {
  fn drop(&mut self) {
    if let Ok(layout) = layout(self.allocated_space) {
      // SAFETY: data was allocated by this allocator with this layout
      unsafe { self.allocator.deallocate(self.data, layout) };
    }
  }
}

#[cfg(test)]
mod tests;
