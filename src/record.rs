//! Plain-data records and their byte views.
//!
//! Containers store opaque fixed-size byte records. [`Record`] marks the
//! types that can be moved in and out of those records by plain copy.

use core::{
  mem,
  ptr,
  slice,
};

use crate::error::{
  Result,
  check_record,
};

/// A type whose value is exactly its bytes.
///
/// # Safety
///
/// Implementors must have no padding and no invalid bit patterns: every
/// byte of a value is initialised and any byte sequence of
/// `size_of::<Self>()` is a valid value.
pub unsafe trait Record: Copy + 'static {}

macro_rules! impl_record {
  ($($ty:ty),* $(,)?) => {
    $(unsafe impl Record for $ty {})*
  };
}

impl_record!(
  u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
);

unsafe impl<T: Record, const N: usize> Record for [T; N] {}

/// View a record value as its bytes.
pub fn bytes_of<T: Record>(value: &T) -> &[u8] {
  // SAFETY: Record guarantees every byte of T is initialised
  unsafe { slice::from_raw_parts(value as *const T as *const u8, mem::size_of::<T>()) }
}

/// Read a record value out of a byte slice of exactly its size.
pub fn read<T: Record>(bytes: &[u8]) -> Result<T> {
  check_record(mem::size_of::<T>(), bytes.len())?;
  // SAFETY: length checked above, Record accepts any bit pattern
  Ok(unsafe { ptr::read_unaligned(bytes.as_ptr() as *const T) })
}
