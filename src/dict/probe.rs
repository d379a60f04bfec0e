//! Index-table hashing and the quadratic probe sequence.

/// Slot never used; ends a probe.
pub(crate) const EMPTY_SLOT: i64 = -1;
/// Slot whose entry was removed; probing continues past it.
pub(crate) const REMOVED_SLOT: i64 = -2;

const SEED: u64 = 5381;
const LINEAR: u64 = 7841;
const QUADRATIC: u64 = 5903;

/// DJB2 over the raw key bytes.
pub(crate) fn hash(key: &[u8]) -> u64 {
  key
    .iter()
    .fold(SEED, |h, &b| h.wrapping_mul(33).wrapping_add(u64::from(b)))
}

/// Slot visited on probe `attempt` for a key hashing to `hash`.
pub(crate) fn probe_index(hash: u64, attempt: u64, num_slots: usize) -> usize {
  let offset = hash
    .wrapping_add(LINEAR.wrapping_mul(attempt))
    .wrapping_add(QUADRATIC.wrapping_mul(attempt.wrapping_mul(attempt)));
  (offset % num_slots as u64) as usize
}
