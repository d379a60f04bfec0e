use super::ArenaAllocator;
use crate::{
  bump::BumpAllocator,
  config::ArenaConfig,
  error::Error,
};
use allocator_api2::alloc::Allocator;
use core::alloc::Layout;

#[test]
fn uniform_allocations_fill_every_arena() {
  let arena = ArenaAllocator::new(ArenaConfig::new(1024, 4)).unwrap();
  assert_eq!(arena.num_arenas(), 1);

  let layout = Layout::new::<i32>();
  for i in 0..1024 {
    let block = arena.allocate(layout).expect("arena should have room");
    unsafe { block.cast::<i32>().as_ptr().write(i) };
  }

  assert!(arena.allocate(layout).is_err());
  assert_eq!(arena.num_arenas(), 4);
  assert_eq!(arena.used_bytes(), 4 * 1024);
}

#[test]
fn mixed_allocations_fill_every_arena() {
  let arena = ArenaAllocator::new(ArenaConfig::new(1024, 4)).unwrap();

  let mut allocated = 0;
  let mut count = 0;
  while allocated < 4 * 1024 {
    let size = (count & 0x03) + 1;
    let layout = Layout::array::<u8>(size).unwrap();
    if arena.allocate(layout).is_err() {
      break;
    }
    allocated += size;
    count += 1;
  }

  assert!(count >= 1024);
  assert_eq!(arena.num_arenas(), 4);
  assert!(arena.allocate(Layout::array::<u8>(4).unwrap()).is_err());
}

#[test]
fn request_larger_than_arena_fails_immediately() {
  let arena = ArenaAllocator::new(ArenaConfig::new(32, 4)).unwrap();
  assert!(arena.allocate(Layout::array::<u8>(64).unwrap()).is_err());
  assert_eq!(arena.num_arenas(), 1);
  assert!(arena.allocate(Layout::array::<u8>(32).unwrap()).is_ok());
}

#[test]
fn earlier_arenas_are_reused() {
  let arena = ArenaAllocator::new(ArenaConfig::new(16, 4)).unwrap();
  let _ = arena.allocate(Layout::array::<u8>(12).unwrap()).unwrap();
  let _ = arena.allocate(Layout::array::<u8>(12).unwrap()).unwrap();
  assert_eq!(arena.num_arenas(), 2);

  let _ = arena.allocate(Layout::array::<u8>(4).unwrap()).unwrap();
  assert_eq!(arena.num_arenas(), 2);
  assert_eq!(arena.used_bytes(), 28);
}

#[test]
fn reset_keeps_arenas() {
  let mut arena = ArenaAllocator::new(ArenaConfig::new(64, 2)).unwrap();
  let _ = arena.allocate(Layout::array::<u8>(64).unwrap()).unwrap();
  let _ = arena.allocate(Layout::array::<u8>(64).unwrap()).unwrap();
  assert!(arena.allocate(Layout::array::<u8>(1).unwrap()).is_err());

  arena.reset();
  assert_eq!(arena.num_arenas(), 2);
  assert_eq!(arena.used_bytes(), 0);
  assert!(arena.allocate(Layout::array::<u8>(64).unwrap()).is_ok());
}

#[test]
fn degenerate_start_recovers_lazily() {
  let backing = BumpAllocator::new(64).unwrap();
  let arena = ArenaAllocator::new_in(&backing, ArenaConfig::new(128, 2)).unwrap();
  assert_eq!(arena.num_arenas(), 0);
  assert!(arena.allocate(Layout::new::<u8>()).is_err());
}

#[test]
fn backing_allocator_gets_memory_back() {
  let backing = BumpAllocator::new(4096).unwrap();
  {
    let arena = ArenaAllocator::new_in(&backing, ArenaConfig::new(256, 2)).unwrap();
    let _ = arena.allocate(Layout::array::<u8>(200).unwrap()).unwrap();
    let _ = arena.allocate(Layout::array::<u8>(200).unwrap()).unwrap();
    assert_eq!(arena.num_arenas(), 2);
    assert!(backing.end_index() > 512);
  }
  assert_eq!(backing.end_index(), 0);
}

#[test]
fn grow_moves_to_next_arena() {
  let arena = ArenaAllocator::new(ArenaConfig::new(64, 2)).unwrap();
  let old = Layout::array::<u8>(16).unwrap();
  let block = arena.allocate(old).unwrap();
  unsafe { block.cast::<u8>().as_ptr().write(9) };
  let _pin = arena.allocate(Layout::array::<u8>(40).unwrap()).unwrap();

  let new = Layout::array::<u8>(48).unwrap();
  let grown = unsafe { arena.grow(block.cast(), old, new).unwrap() };
  assert_eq!(arena.num_arenas(), 2);
  assert_eq!(unsafe { grown.cast::<u8>().as_ptr().read() }, 9);

  let too_big = Layout::array::<u8>(65).unwrap();
  assert!(unsafe { arena.grow(grown.cast(), new, too_big) }.is_err());
}

#[test]
fn zero_config_rejected() {
  assert!(matches!(
    ArenaAllocator::new(ArenaConfig::new(0, 1)),
    Err(Error::InvalidArgument(_))
  ));
}
