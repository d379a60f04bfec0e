use allocator_api2::alloc::{
  Allocator,
  Global,
};

use super::Dict;
use crate::{
  array::Array,
  error::Result,
};

const UNIT: [u8; 1] = [0];

/// Set of fixed-size byte items, stored as a [`Dict`] with a one-byte
/// placeholder value.
#[derive(Debug)]
pub struct Set<A: Allocator + Clone = Global> {
  dict: Dict<A>,
}

impl Set<Global> {
  pub fn new(num_slots: usize, item_size: usize) -> Result<Self> {
    Self::new_in(Global, num_slots, item_size)
  }
}

impl<A: Allocator + Clone> Set<A> {
  pub fn new_in(allocator: A, num_slots: usize, item_size: usize) -> Result<Self> {
    Ok(Self {
      dict: Dict::new_in(allocator, num_slots, item_size, UNIT.len())?,
    })
  }

  /// Returns `true` if `item` was not already present.
  pub fn add(&mut self, item: &[u8]) -> Result<bool> {
    if self.dict.contains_key(item)? {
      return Ok(false);
    }
    self.dict.set(item, &UNIT)?;
    Ok(true)
  }

  pub fn contains(&self, item: &[u8]) -> Result<bool> {
    self.dict.contains_key(item)
  }

  pub fn remove(&mut self, item: &[u8]) -> Result<bool> {
    self.dict.remove(item)
  }

  pub fn copy_items<B: Allocator>(&self, allocator: B) -> Result<Array<B>> {
    self.dict.copy_keys(allocator)
  }

  pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
    self.dict.iter().map(|(item, _)| item)
  }

  pub fn resize(&mut self, new_num_slots: usize) -> Result<()> {
    self.dict.resize(new_num_slots)
  }

  pub fn len(&self) -> usize {
    self.dict.len()
  }

  pub fn is_empty(&self) -> bool {
    self.dict.is_empty()
  }

  pub fn num_slots(&self) -> usize {
    self.dict.num_slots()
  }

  pub fn item_size(&self) -> usize {
    self.dict.key_size()
  }
}
