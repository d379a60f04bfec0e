//! Record algorithms shared by [`Array`](super::Array) and
//! [`List`](crate::list::List).
//!
//! Everything here works on a live byte range of `len * size` bytes.

use allocator_api2::alloc::Allocator;

use super::{
  Array,
  Comparison,
};
use crate::error::{
  Error,
  Result,
  check_record,
};

pub(crate) fn count(bytes: &[u8], size: usize) -> usize {
  bytes.len() / size
}

pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
  if index < len {
    Ok(())
  } else {
    Err(Error::OutOfBounds { index, len })
  }
}

pub(crate) fn record(bytes: &[u8], size: usize, index: usize) -> Option<&[u8]> {
  let start = index.checked_mul(size)?;
  bytes.get(start..start.checked_add(size)?)
}

pub(crate) fn record_mut(bytes: &mut [u8], size: usize, index: usize) -> Option<&mut [u8]> {
  let start = index.checked_mul(size)?;
  bytes.get_mut(start..start.checked_add(size)?)
}

pub(crate) fn get_into(bytes: &[u8], size: usize, index: usize, out: &mut [u8]) -> Result<()> {
  check_record(size, out.len())?;
  check_index(index, count(bytes, size))?;
  out.copy_from_slice(&bytes[index * size..(index + 1) * size]);
  Ok(())
}

pub(crate) fn set(bytes: &mut [u8], size: usize, index: usize, value: &[u8]) -> Result<()> {
  check_record(size, value.len())?;
  check_index(index, count(bytes, size))?;
  bytes[index * size..(index + 1) * size].copy_from_slice(value);
  Ok(())
}

fn swap_records(bytes: &mut [u8], size: usize, a: usize, b: usize) {
  if a == b {
    return;
  }
  let (low, high) = if a < b { (a, b) } else { (b, a) };
  let (head, tail) = bytes.split_at_mut(high * size);
  head[low * size..(low + 1) * size].swap_with_slice(&mut tail[..size]);
}

/// Lomuto partition of `[low, high]` around the record at `high`.
fn partition<F>(bytes: &mut [u8], size: usize, low: usize, high: usize, compare: &mut F) -> usize
where
  F: FnMut(&[u8], &[u8]) -> Comparison,
{
  let mut store = low;
  for i in low..high {
    let smaller = {
      let pivot = &bytes[high * size..(high + 1) * size];
      let candidate = &bytes[i * size..(i + 1) * size];
      compare(candidate, pivot) == Comparison::FirstSmaller
    };
    if smaller {
      swap_records(bytes, size, store, i);
      store += 1;
    }
  }
  swap_records(bytes, size, store, high);
  store
}

/// In-place quicksort, pivot on the last record of each partition.
///
/// Recurses into the smaller half only, so stack depth stays logarithmic.
pub(crate) fn sort<F>(bytes: &mut [u8], size: usize, mut compare: F)
where
  F: FnMut(&[u8], &[u8]) -> Comparison,
{
  let len = count(bytes, size);
  if len > 1 {
    quicksort(bytes, size, 0, len - 1, &mut compare);
  }
}

fn quicksort<F>(bytes: &mut [u8], size: usize, mut low: usize, mut high: usize, compare: &mut F)
where
  F: FnMut(&[u8], &[u8]) -> Comparison,
{
  while low < high {
    let pivot = partition(bytes, size, low, high, compare);
    if pivot - low < high - pivot {
      if pivot > low {
        quicksort(bytes, size, low, pivot - 1, compare);
      }
      low = pivot + 1;
    } else {
      if pivot < high {
        quicksort(bytes, size, pivot + 1, high, compare);
      }
      if pivot == 0 {
        return;
      }
      high = pivot - 1;
    }
  }
}

pub(crate) fn find_index<P>(bytes: &[u8], size: usize, start: usize, mut predicate: P) -> Result<Option<usize>>
where
  P: FnMut(&[u8]) -> bool,
{
  check_index(start, count(bytes, size))?;
  Ok(
    bytes[start * size..]
      .chunks_exact(size)
      .position(|item| predicate(item))
      .map(|offset| start + offset),
  )
}

pub(crate) fn find_item<P>(bytes: &[u8], size: usize, start: usize, predicate: P) -> Result<Option<&[u8]>>
where
  P: FnMut(&[u8]) -> bool,
{
  let found = find_index(bytes, size, start, predicate)?;
  Ok(found.and_then(|index| record(bytes, size, index)))
}

pub(crate) fn reduce<F>(bytes: &[u8], size: usize, mut f: F, result: &mut [u8])
where
  F: FnMut(Option<&[u8]>, &[u8], &mut [u8]),
{
  let mut previous: Option<&[u8]> = None;
  for current in bytes.chunks_exact(size) {
    f(previous, current, result);
    previous = Some(current);
  }
}

pub(crate) fn slice_in<B: Allocator>(
  bytes: &[u8],
  size: usize,
  allocator: B,
  start: usize,
  end: usize,
) -> Result<Array<B>> {
  let len = count(bytes, size);
  if start >= end || end >= len {
    return Err(Error::InvalidRange { start, end, len });
  }
  Array::from_bytes_in(allocator, size, &bytes[start * size..end * size])
}

pub(crate) fn map_in<B, F>(bytes: &[u8], size: usize, allocator: B, f: F) -> Result<Array<B>>
where
  B: Allocator,
  F: FnMut(&mut [u8]),
{
  let mut mapped = Array::from_bytes_in(allocator, size, bytes)?;
  mapped.for_each(f);
  Ok(mapped)
}

pub(crate) fn filter_in<B, P>(bytes: &[u8], size: usize, allocator: B, mut predicate: P) -> Result<Array<B>>
where
  B: Allocator,
  P: FnMut(&[u8]) -> bool,
{
  let passed = bytes.chunks_exact(size).filter(|item| predicate(*item)).count();
  let mut filtered = Array::with_shape(allocator, passed, size)?;
  let kept = bytes.chunks_exact(size).filter(|item| predicate(*item));
  for (slot, item) in filtered.as_bytes_mut().chunks_exact_mut(size).zip(kept) {
    slot.copy_from_slice(item);
  }
  Ok(filtered)
}

pub(crate) fn reverse_in<B: Allocator>(bytes: &[u8], size: usize, allocator: B) -> Result<Array<B>> {
  let mut reversed = Array::with_shape(allocator, count(bytes, size), size)?;
  let source = bytes.chunks_exact(size).rev();
  for (slot, item) in reversed.as_bytes_mut().chunks_exact_mut(size).zip(source) {
    slot.copy_from_slice(item);
  }
  Ok(reversed)
}
