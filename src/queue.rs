//! FIFO view over a [`List`].

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

/// New records enter at index 0; the oldest record sits at the tail and is
/// the one peeked and popped.
#[derive(Debug)]
pub struct Queue<A: Allocator = Global> {
  list: List<A>,
}

impl Queue<Global> {
  pub fn new(max_members: usize, member_size: usize) -> Result<Self> {
    Self::new_in(Global, max_members, member_size)
  }
}

impl<A: Allocator> Queue<A> {
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
    self.list.insert(0, value)
  }

  pub fn peek(&self) -> Option<&[u8]> {
    self.list.last()
  }

  /// Move the oldest record into `out`. Returns `false` when empty.
  pub fn pop(&mut self, out: &mut [u8]) -> Result<bool> {
    check_record(self.list.member_size(), out.len())?;
    let Some(oldest) = self.list.last() else {
      return Ok(false);
    };
    out.copy_from_slice(oldest);
    self.list.remove_at(self.list.len() - 1)?;
    Ok(true)
  }

  pub fn push_as<T: Record>(&mut self, value: &T) -> Result<()> {
    self.push(record::bytes_of(value))
  }

  pub fn pop_as<T: Record>(&mut self) -> Result<Option<T>> {
    check_record(self.list.member_size(), mem::size_of::<T>())?;
    let Some(oldest) = self.list.last() else {
      return Ok(None);
    };
    let value = record::read(oldest)?;
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

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    bump::BumpAllocator,
    error::Error,
  };

  #[test]
  fn first_in_first_out() {
    let mut queue = Queue::new(4, 8).unwrap();
    for value in [10u64, 20, 30] {
      queue.push_as(&value).unwrap();
    }
    assert_eq!(queue.peek(), Some(&10u64.to_ne_bytes()[..]));
    assert_eq!(queue.pop_as::<u64>(), Ok(Some(10)));
    assert_eq!(queue.pop_as::<u64>(), Ok(Some(20)));
    queue.push_as(&40u64).unwrap();
    assert_eq!(queue.pop_as::<u64>(), Ok(Some(30)));
    assert_eq!(queue.pop_as::<u64>(), Ok(Some(40)));
    assert_eq!(queue.pop_as::<u64>(), Ok(None));
  }

  #[test]
  fn newest_record_is_at_head() {
    let mut queue = Queue::new(3, 1).unwrap();
    queue.push(&[1]).unwrap();
    queue.push(&[2]).unwrap();
    assert_eq!(queue.as_list().first(), Some(&[2u8][..]));
  }

  #[test]
  fn full_queue_refuses_push() {
    let bump = BumpAllocator::new(64).unwrap();
    let mut queue = Queue::new_in(&bump, 2, 4).unwrap();
    queue.push_as(&1i32).unwrap();
    queue.push_as(&2i32).unwrap();
    assert_eq!(
      queue.push_as(&3i32),
      Err(Error::CapacityExhausted { capacity: 2 })
    );
    let mut out = [0u8; 4];
    assert_eq!(queue.pop(&mut out), Ok(true));
    assert_eq!(i32::from_ne_bytes(out), 1);
    assert_eq!(queue.len(), 1);
  }
}
