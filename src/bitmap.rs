use allocator_api2::alloc::{
  Allocator,
  Global,
};
use core::{
  alloc::Layout,
  ptr::NonNull,
  slice,
};

use crate::error::{
  Error,
  Result,
};

/// Fixed-length bit set whose storage comes from `A`.
///
/// Used by [`Dict`](crate::dict::Dict) to track which entry handles are live.
pub struct Bitmap<A = Global>
where
  A: Allocator,
{
  allocator: A,
  map: NonNull<u8>,
  fields: usize,
  bits: usize,
}

impl<A> Bitmap<A>
where
  A: Allocator,
{
  /// Allocate a zeroed bitmap of `bits` bits, rounded up to whole bytes.
  pub fn new_in(allocator: A, bits: usize) -> Result<Self> {
    if bits == 0 {
      return Err(Error::InvalidArgument("bitmap must hold at least one bit"));
    }
    let fields = bits.div_ceil(8);
    let map = allocator.allocate_zeroed(layout(fields)?)?.cast::<u8>();
    Ok(Bitmap {
      allocator,
      map,
      fields,
      bits,
    })
  }

  fn bytes(&self) -> &[u8] {
    // SAFETY: map is live for fields initialised bytes
    unsafe { slice::from_raw_parts(self.map.as_ptr(), self.fields) }
  }

  fn bytes_mut(&mut self) -> &mut [u8] {
    // SAFETY: map is live for fields initialised bytes
    unsafe { slice::from_raw_parts_mut(self.map.as_ptr(), self.fields) }
  }

  fn check(&self, index: usize) -> Result<()> {
    if index >= self.bits {
      return Err(Error::OutOfBounds {
        index,
        len: self.bits,
      });
    }
    Ok(())
  }

  pub fn len(&self) -> usize {
    self.bits
  }

  pub fn is_empty(&self) -> bool {
    self.bits == 0
  }

  pub fn set(&mut self, index: usize) -> Result<()> {
    self.check(index)?;
    self.bytes_mut()[index / 8] |= 1 << (index % 8);
    Ok(())
  }

  pub fn get(&self, index: usize) -> Result<bool> {
    self.check(index)?;
    Ok((self.bytes()[index / 8] & (1 << (index % 8))) != 0)
  }

  pub fn clear(&mut self, index: usize) -> Result<()> {
    self.check(index)?;
    self.bytes_mut()[index / 8] &= !(1 << (index % 8));
    Ok(())
  }

  pub fn count_ones(&self) -> usize {
    self.bytes().iter().map(|b| b.count_ones() as usize).sum()
  }

  /// Change the number of bits. New bits start cleared; dropped bits are
  /// zeroed so a later grow does not resurrect them.
  pub fn resize(&mut self, new_bits: usize) -> Result<()> {
    if new_bits == 0 {
      return Err(Error::InvalidArgument("bitmap must hold at least one bit"));
    }
    let new_fields = new_bits.div_ceil(8);
    if new_fields > self.fields {
      let new_layout = layout(new_fields)?;
      // SAFETY: map was allocated by this allocator with the current layout
      let new_ptr = unsafe {
        self
          .allocator
          .grow_zeroed(self.map, layout(self.fields)?, new_layout)?
      };
      self.map = new_ptr.cast::<u8>();
      self.fields = new_fields;
    } else {
      for index in new_bits..self.bits {
        self.bytes_mut()[index / 8] &= !(1 << (index % 8));
      }
    }
    self.bits = new_bits;
    Ok(())
  }
}

fn layout(fields: usize) -> Result<Layout> {
  Layout::array::<u8>(fields).map_err(|_| Error::InvalidArgument("bitmap too large"))
}

impl<A> Drop for Bitmap<A>
where
  A: Allocator,
{
  fn drop(&mut self) {
    if let Ok(layout) = layout(self.fields) {
      // SAFETY: map was allocated by this allocator with this layout
      unsafe { self.allocator.deallocate(self.map, layout) };
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_bitmap() {
    let mut bitmap = Bitmap::new_in(Global, 64).unwrap();
    assert!(bitmap.set(10).is_ok());
    assert!(bitmap.get(10).unwrap());
    assert!(bitmap.clear(10).is_ok());
    assert!(!bitmap.get(10).unwrap());
  }

  #[test]
  fn test_out_of_bounds() {
    let mut bitmap = Bitmap::new_in(Global, 10).unwrap();
    assert!(bitmap.set(9).is_ok());
    assert_eq!(bitmap.set(10), Err(Error::OutOfBounds { index: 10, len: 10 }));
  }

  #[test]
  fn test_resize() {
    let mut bitmap = Bitmap::new_in(Global, 64).unwrap();
    assert!(bitmap.set(10).is_ok());
    assert!(bitmap.resize(128).is_ok());
    assert!(bitmap.get(10).unwrap());
    assert!(!bitmap.get(100).unwrap());
    assert_eq!(bitmap.count_ones(), 1);
  }

  #[test]
  fn test_shrink_clears_tail() {
    let mut bitmap = Bitmap::new_in(Global, 16).unwrap();
    bitmap.set(3).unwrap();
    bitmap.set(12).unwrap();
    bitmap.resize(8).unwrap();
    assert!(bitmap.get(12).is_err());
    bitmap.resize(16).unwrap();
    assert!(!bitmap.get(12).unwrap());
    assert!(bitmap.get(3).unwrap());
  }
}
