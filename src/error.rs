//! Crate-wide error type.

use allocator_api2::alloc::AllocError;
use thiserror::Error;

/// Failure reported by a container or allocator operation.
///
/// A mutator that returns an error leaves its container unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
  /// A size, count or configuration value was zero or overflowed.
  #[error("invalid argument: {0}")]
  InvalidArgument(&'static str),

  /// A caller-supplied record buffer has the wrong length.
  #[error("record is {actual} bytes, expected {expected}")]
  RecordSize { expected: usize, actual: usize },

  /// An index was not below the number of live records.
  #[error("index {index} out of bounds for length {len}")]
  OutOfBounds { index: usize, len: usize },

  /// A slice range did not satisfy `start < end < len`.
  #[error("invalid range {start}..{end} for length {len}")]
  InvalidRange { start: usize, end: usize, len: usize },

  /// The container has no room for another record.
  #[error("capacity of {capacity} records exhausted")]
  CapacityExhausted { capacity: usize },

  /// Every probe of the dict index table was used without resolution.
  #[error("probe sequence exhausted after {slots} slots")]
  ProbeExhausted { slots: usize },

  /// The allocator could not provide memory.
  #[error("allocation failed")]
  Alloc,
}

impl From<AllocError> for Error {
  fn from(_: AllocError) -> Self {
    Error::Alloc
  }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Check that a caller buffer holds exactly one record.
pub(crate) fn check_record(expected: usize, actual: usize) -> Result<()> {
  if expected == actual {
    Ok(())
  } else {
    Err(Error::RecordSize { expected, actual })
  }
}
