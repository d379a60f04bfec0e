//! Arena configuration parameters.

use crate::error::{
  Error,
  Result,
};

/// Sizing for an [`ArenaAllocator`](crate::arena::ArenaAllocator).
///
/// Both values are fixed for the lifetime of the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
  /// Bytes in each bump arena. No single allocation may exceed this.
  pub arena_size: usize,

  /// Upper bound on the number of arenas acquired from the backing allocator.
  pub max_arenas: usize,
}

impl ArenaConfig {
  /// One page per arena.
  pub const DEFAULT_ARENA_SIZE: usize = 4096;

  pub const DEFAULT_MAX_ARENAS: usize = 16;

  pub fn new(arena_size: usize, max_arenas: usize) -> Self {
    Self {
      arena_size,
      max_arenas,
    }
  }

  /// Reject configurations that could never satisfy an allocation.
  pub fn validate(&self) -> Result<()> {
    if self.arena_size == 0 {
      return Err(Error::InvalidArgument("arena_size must be non-zero"));
    }
    if self.max_arenas == 0 {
      return Err(Error::InvalidArgument("max_arenas must be non-zero"));
    }
    Ok(())
  }

  /// Upper bound on bytes the arena can hand out, saturating on overflow.
  pub fn capacity_bytes(&self) -> usize {
    self.arena_size.saturating_mul(self.max_arenas)
  }
}

impl Default for ArenaConfig {
  fn default() -> Self {
    Self::new(Self::DEFAULT_ARENA_SIZE, Self::DEFAULT_MAX_ARENAS)
  }
}
