//! LIFO view over a [`List`].

use allocator_api2::alloc::{
  Allocator,
  Global,
};
use core::mem;

use crate::{
  error::{
    Result,
    check_record,
  },
  list::List,
  record::{
    self,
    Record,
  },
};

/// Records are pushed and popped at the tail of the underlying list.
#[derive(Debug)]
pub struct Stack<A: Allocator = Global> {
  list: List<A>,
}

impl Stack<Global> {
  pub fn new(max_members: usize, member_size: usize) -> Result<Self> {
    Self::new_in(Global, max_members, member_size)
  }
}

impl<A: Allocator> Stack<A> {
  pub fn new_in(allocator: A, max_members: usize, member_size: usize) -> Result<Self> {
    Ok(Self {
      list: List::new_in(allocator, max_members, member_size)?,
    })
  }

  pub fn len(&self) -> usize {
    self.list.len()
  }

  pub fn is_empty(&self) -> bool {
    self.list.is_empty()
  }

  pub fn capacity(&self) -> usize {
    self.list.capacity()
  }

  pub fn resize(&mut self, new_capacity: usize) -> Result<()> {
    self.list.resize(new_capacity)
  }

  pub fn push(&mut self, value: &[u8]) -> Result<()> {
    self.list.append(value)
  }

  pub fn peek(&self) -> Option<&[u8]> {
    self.list.last()
  }

  /// Move the top record into `out`. Returns `false` when empty.
  pub fn pop(&mut self, out: &mut [u8]) -> Result<bool> {
    check_record(self.list.member_size(), out.len())?;
    let Some(top) = self.list.last() else {
      return Ok(false);
    };
    out.copy_from_slice(top);
    self.list.remove_at(self.list.len() - 1)?;
    Ok(true)
  }

  pub fn push_as<T: Record>(&mut self, value: &T) -> Result<()> {
    self.push(record::bytes_of(value))
  }

  pub fn pop_as<T: Record>(&mut self) -> Result<Option<T>> {
    check_record(self.list.member_size(), mem::size_of::<T>())?;
    let Some(top) = self.list.last() else {
      return Ok(None);
    };
    let value = record::read(top)?;
    self.list.remove_at(self.list.len() - 1)?;
    Ok(Some(value))
  }

  pub fn as_list(&self) -> &List<A> {
    &self.list
  }

  pub fn into_list(self) -> List<A> {
    self.list
  }
}
