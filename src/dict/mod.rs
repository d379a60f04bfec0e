//! Open-addressing dictionary of fixed-size byte keys and values.
//!
//! An index table of `num_slots` entries maps probe positions to entry
//! handles. Keys and values live at their handle in two parallel
//! [`List`]s that are never compacted: removing an entry frees its handle
//! for reuse instead of shifting later entries, so stored handles stay
//! valid.

mod probe;
mod set;

pub use set::Set;

use allocator_api2::alloc::{
  Allocator,
  Global,
};
use core::{
  fmt,
  mem,
};
use getset::{
  CopyGetters,
  Getters,
};
use log::debug;

use self::probe::{
  EMPTY_SLOT,
  REMOVED_SLOT,
  hash,
  probe_index,
};
use crate::{
  array::Array,
  bitmap::Bitmap,
  error::{
    Error,
    Result,
    check_record,
  },
  list::List,
  record::{
    self,
    Record,
  },
  stack::Stack,
};

enum Probe {
  Found { slot: usize, handle: usize },
  Vacant { slot: usize },
  Exhausted,
}

#[derive(Getters, CopyGetters)]
pub struct Dict<A: Allocator + Clone = Global> {
  #[getset(get = "pub")]
  allocator: A,
  slots: Array<A>,
  keys: List<A>,
  values: List<A>,
  live: Bitmap<A>,
  vacant: Stack<A>,
  /// Size of the index table.
  #[getset(get_copy = "pub")]
  num_slots: usize,
  /// Number of live entries.
  #[getset(get_copy = "pub")]
  member_count: usize,
  #[getset(get_copy = "pub")]
  key_size: usize,
  #[getset(get_copy = "pub")]
  value_size: usize,
}

impl Dict<Global> {
  pub fn new(num_slots: usize, key_size: usize, value_size: usize) -> Result<Self> {
    Self::new_in(Global, num_slots, key_size, value_size)
  }
}

impl<A: Allocator + Clone> Dict<A> {
  /// Create an empty dict whose index table has `num_slots` entries.
  ///
  /// At most `num_slots` entries fit; probe exhaustion usually comes
  /// first once the table is more than about two thirds full.
  pub fn new_in(allocator: A, num_slots: usize, key_size: usize, value_size: usize) -> Result<Self> {
    if num_slots == 0 || key_size == 0 || value_size == 0 {
      return Err(Error::InvalidArgument("dict dimensions must be non-zero"));
    }

    let mut slots = Array::new_in(allocator.clone(), num_slots, mem::size_of::<i64>())?;
    slots.for_each(|slot| slot.copy_from_slice(&EMPTY_SLOT.to_ne_bytes()));

    Ok(Self {
      keys: List::new_in(allocator.clone(), num_slots, key_size)?,
      values: List::new_in(allocator.clone(), num_slots, value_size)?,
      live: Bitmap::new_in(allocator.clone(), num_slots)?,
      vacant: Stack::new_in(allocator.clone(), num_slots, mem::size_of::<u64>())?,
      allocator,
      slots,
      num_slots,
      member_count: 0,
      key_size,
      value_size,
    })
  }

  pub fn len(&self) -> usize {
    self.member_count
  }

  pub fn is_empty(&self) -> bool {
    self.member_count == 0
  }

  fn probe(&self, key: &[u8]) -> Result<Probe> {
    let h = hash(key);
    let mut first_removed = None;
    for attempt in 0..self.num_slots as u64 {
      let slot = probe_index(h, attempt, self.num_slots);
      match self.slots.get_as::<i64>(slot)? {
        EMPTY_SLOT => {
          return Ok(Probe::Vacant {
            slot: first_removed.unwrap_or(slot),
          });
        }
        REMOVED_SLOT => {
          first_removed.get_or_insert(slot);
        }
        handle => {
          let handle = handle as usize;
          if self.keys.get(handle) == Some(key) {
            return Ok(Probe::Found { slot, handle });
          }
        }
      }
    }
    Ok(match first_removed {
      Some(slot) => Probe::Vacant { slot },
      None => Probe::Exhausted,
    })
  }

  fn find(&self, key: &[u8]) -> Result<Option<usize>> {
    check_record(self.key_size, key.len())?;
    Ok(match self.probe(key)? {
      Probe::Found { handle, .. } => Some(handle),
      _ => None,
    })
  }

  /// Store a new entry, reusing a freed handle when one is available.
  fn claim_handle(&mut self, key: &[u8], value: &[u8]) -> Result<usize> {
    let handle = match self.vacant.pop_as::<u64>()? {
      Some(handle) => {
        let handle = handle as usize;
        self.keys.set(handle, key)?;
        self.values.set(handle, value)?;
        handle
      }
      None => {
        let handle = self.keys.len();
        self.keys.append(key)?;
        self.values.append(value)?;
        handle
      }
    };
    self.live.set(handle)?;
    Ok(handle)
  }

  /// Insert or overwrite the value stored under `key`.
  pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
    check_record(self.key_size, key.len())?;
    check_record(self.value_size, value.len())?;

    match self.probe(key)? {
      Probe::Found { handle, .. } => self.values.set(handle, value),
      Probe::Vacant { slot } => {
        let handle = self.claim_handle(key, value)?;
        self.slots.set_as(slot, &(handle as i64))?;
        self.member_count += 1;
        Ok(())
      }
      Probe::Exhausted => {
        debug!(
          "dict: probe exhausted with {} of {} slots used",
          self.member_count, self.num_slots
        );
        Err(Error::ProbeExhausted {
          slots: self.num_slots,
        })
      }
    }
  }

  pub fn get(&self, key: &[u8]) -> Result<Option<&[u8]>> {
    Ok(self.find(key)?.and_then(|handle| self.values.get(handle)))
  }

  /// Copy the value for `key` into `out`. Returns `false` on a miss.
  pub fn get_into(&self, key: &[u8], out: &mut [u8]) -> Result<bool> {
    check_record(self.value_size, out.len())?;
    match self.get(key)? {
      Some(value) => {
        out.copy_from_slice(value);
        Ok(true)
      }
      None => Ok(false),
    }
  }

  pub fn contains_key(&self, key: &[u8]) -> Result<bool> {
    Ok(self.find(key)?.is_some())
  }

  /// Tombstone the slot for `key` and free its handle.
  fn take(&mut self, key: &[u8]) -> Result<Option<usize>> {
    check_record(self.key_size, key.len())?;
    let Probe::Found { slot, handle } = self.probe(key)? else {
      return Ok(None);
    };
    self.vacant.push_as(&(handle as u64))?;
    self.live.clear(handle)?;
    self.slots.set_as(slot, &REMOVED_SLOT)?;
    self.member_count -= 1;
    Ok(Some(handle))
  }

  /// Remove `key`, moving its value into `out`. Returns `false` on a miss.
  pub fn pop(&mut self, key: &[u8], out: &mut [u8]) -> Result<bool> {
    check_record(self.value_size, out.len())?;
    let Some(handle) = self.take(key)? else {
      return Ok(false);
    };
    // the freed record keeps its bytes until the handle is reused
    if let Some(value) = self.values.get(handle) {
      out.copy_from_slice(value);
    }
    Ok(true)
  }

  pub fn remove(&mut self, key: &[u8]) -> Result<bool> {
    Ok(self.take(key)?.is_some())
  }

  /// Live entries in handle order.
  pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
    self
      .keys
      .iter()
      .zip(self.values.iter())
      .enumerate()
      .filter(move |(handle, _)| self.live.get(*handle).unwrap_or(false))
      .map(|(_, entry)| entry)
  }

  fn collect_in<B, F>(&self, allocator: B, member_size: usize, mut fill: F) -> Result<Array<B>>
  where
    B: Allocator,
    F: FnMut(&mut [u8], &[u8], &[u8]),
  {
    let mut out = Array::with_shape(allocator, self.member_count, member_size)?;
    for (record, (key, value)) in out.as_bytes_mut().chunks_exact_mut(member_size).zip(self.iter()) {
      fill(record, key, value);
    }
    Ok(out)
  }

  pub fn copy_keys<B: Allocator>(&self, allocator: B) -> Result<Array<B>> {
    self.collect_in(allocator, self.key_size, |out, key, _| out.copy_from_slice(key))
  }

  pub fn copy_values<B: Allocator>(&self, allocator: B) -> Result<Array<B>> {
    self.collect_in(allocator, self.value_size, |out, _, value| {
      out.copy_from_slice(value)
    })
  }

  /// One record per entry: the key bytes followed by the value bytes.
  pub fn copy_items<B: Allocator>(&self, allocator: B) -> Result<Array<B>> {
    let key_size = self.key_size;
    self.collect_in(allocator, key_size + self.value_size, |out, key, value| {
      let (k, v) = out.split_at_mut(key_size);
      k.copy_from_slice(key);
      v.copy_from_slice(value);
    })
  }

  /// Rehash every entry into a fresh table of `new_num_slots` slots.
  ///
  /// Either every entry moves or the dict is left untouched.
  pub fn resize(&mut self, new_num_slots: usize) -> Result<()> {
    if new_num_slots < self.member_count {
      return Err(Error::InvalidArgument("dict resize would drop entries"));
    }
    let mut fresh = Self::new_in(
      self.allocator.clone(),
      new_num_slots,
      self.key_size,
      self.value_size,
    )?;
    for (key, value) in self.iter() {
      fresh.set(key, value)?;
    }
    debug!(
      "dict: rehashed {} entries from {} to {} slots",
      self.member_count, self.num_slots, new_num_slots
    );
    *self = fresh;
    Ok(())
  }

  pub fn set_as<K: Record, V: Record>(&mut self, key: &K, value: &V) -> Result<()> {
    self.set(record::bytes_of(key), record::bytes_of(value))
  }

  pub fn get_as<K: Record, V: Record>(&self, key: &K) -> Result<Option<V>> {
    check_record(self.value_size, mem::size_of::<V>())?;
    self
      .get(record::bytes_of(key))?
      .map(record::read)
      .transpose()
  }
}

impl<A: Allocator + Clone> fmt::Debug for Dict<A> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Dict")
      .field("num_slots", &self.num_slots)
      .field("member_count", &self.member_count)
      .field("key_size", &self.key_size)
      .field("value_size", &self.value_size)
      .finish()
  }
}
