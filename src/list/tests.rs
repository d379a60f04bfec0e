use super::List;
use crate::{
  array::Comparison,
  bump::BumpAllocator,
  error::Error,
  record,
};
use allocator_api2::alloc::Global;
use proptest::prelude::*;

fn int(bytes: &[u8]) -> i32 {
  record::read::<i32>(bytes).unwrap()
}

fn ints(list: &List) -> Vec<i32> {
  list.iter().map(int).collect()
}

fn list_of(capacity: usize, values: &[i32]) -> List {
  let mut list = List::new(capacity, 4).unwrap();
  for value in values {
    list.append_as(value).unwrap();
  }
  list
}

#[test]
fn starts_empty() {
  let list = List::new(4, 8).unwrap();
  assert!(list.is_empty());
  assert_eq!(list.capacity(), 4);
  assert_eq!(list.allocated_space(), 32);
  assert_eq!(list.remaining(), 4);
  assert!(list.first().is_none());
  assert!(list.last().is_none());
}

#[test]
fn zero_shapes_rejected() {
  assert!(matches!(List::new(0, 4), Err(Error::InvalidArgument(_))));
  assert!(matches!(List::new(4, 0), Err(Error::InvalidArgument(_))));
}

#[test]
fn fifth_append_fails_until_resized() {
  let mut list = list_of(4, &[1, 2, 3, 4]);
  assert_eq!(
    list.append_as(&5i32),
    Err(Error::CapacityExhausted { capacity: 4 })
  );
  assert_eq!(ints(&list), vec![1, 2, 3, 4]);

  list.resize(8).unwrap();
  assert_eq!(list.capacity(), 8);
  list.append_as(&5i32).unwrap();
  assert_eq!(ints(&list), vec![1, 2, 3, 4, 5]);
}

#[test]
fn insert_shifts_and_clamps() {
  let mut list = list_of(6, &[1, 2, 3]);
  list.insert(0, &0i32.to_ne_bytes()).unwrap();
  list.insert(2, &9i32.to_ne_bytes()).unwrap();
  list.insert(100, &7i32.to_ne_bytes()).unwrap();
  assert_eq!(ints(&list), vec![0, 1, 9, 2, 3, 7]);
  assert_eq!(list.first().map(int), Some(0));
  assert_eq!(list.last().map(int), Some(7));
}

#[test]
fn insert_rejects_wrong_record_size() {
  let mut list = list_of(4, &[1]);
  assert_eq!(
    list.append(&[1, 2]),
    Err(Error::RecordSize {
      expected: 4,
      actual: 2
    })
  );
  assert_eq!(list.len(), 1);
}

#[test]
fn remove_at_closes_gap() {
  let mut list = list_of(4, &[1, 2, 3, 4]);
  list.remove_at(1).unwrap();
  assert_eq!(ints(&list), vec![1, 3, 4]);
  list.remove_at(2).unwrap();
  assert_eq!(ints(&list), vec![1, 3]);
  assert_eq!(list.remove_at(2), Err(Error::OutOfBounds { index: 2, len: 2 }));
  assert_eq!(ints(&list), vec![1, 3]);
}

#[test]
fn set_only_touches_live_records() {
  let mut list = list_of(4, &[1, 2]);
  list.set_as(1, &20i32).unwrap();
  assert_eq!(list.get_as::<i32>(1), Ok(20));
  assert_eq!(list.set_as(2, &5i32), Err(Error::OutOfBounds { index: 2, len: 2 }));
  assert_eq!(list.get_as::<i32>(3), Err(Error::OutOfBounds { index: 3, len: 2 }));
}

#[test]
fn shrinking_resize_truncates() {
  let mut list = list_of(6, &[1, 2, 3, 4, 5]);
  list.resize(2).unwrap();
  assert_eq!(list.capacity(), 2);
  assert_eq!(ints(&list), vec![1, 2]);
  assert!(matches!(list.resize(0), Err(Error::InvalidArgument(_))));
  assert_eq!(list.capacity(), 2);
}

#[test]
fn copy_memory_sets_count() {
  let mut list = List::new(4, 4).unwrap();
  let src: Vec<u8> = [1i32, 2, 3]
    .iter()
    .flat_map(|v| v.to_ne_bytes())
    .collect();
  assert_eq!(list.copy_memory(&src, 10), 10);
  assert_eq!(list.len(), 2);
  assert_eq!(ints(&list), vec![1, 2]);

  assert_eq!(list.copy_memory(&src, usize::MAX), 12);
  assert_eq!(ints(&list), vec![1, 2, 3]);
}

#[test]
fn clear_keeps_capacity() {
  let mut list = list_of(4, &[1, 2, 3]);
  list.clear();
  assert!(list.is_empty());
  assert_eq!(list.capacity(), 4);
  assert_eq!(list.remaining(), 4);
}

#[test]
fn algorithms_see_only_live_records() {
  let mut list = list_of(8, &[5, 3, 9, 1]);
  list.sort(|a, b| int(a).cmp(&int(b)).into());
  assert_eq!(ints(&list), vec![1, 3, 5, 9]);

  let reversed = list.reverse(Global).unwrap();
  assert_eq!(reversed.member_count(), 4);
  assert_eq!(reversed.get_as::<i32>(0), Ok(9));

  let odd = list.filter(Global, |r| int(r) % 2 == 1).unwrap();
  assert_eq!(odd.member_count(), 4);

  let big = list.filter(Global, |r| int(r) > 3).unwrap();
  assert_eq!(big.member_count(), 2);

  let slice = list.create_slice(Global, 1, 3).unwrap();
  assert_eq!(slice.member_count(), 2);
  assert_eq!(slice.get_as::<i32>(0), Ok(3));
  assert!(matches!(
    list.create_slice(Global, 1, 4),
    Err(Error::InvalidRange { .. })
  ));

  assert_eq!(list.find_index(0, |r| int(r) == 5), Ok(Some(2)));
  assert_eq!(list.find_index(0, |r| int(r) == 4), Ok(None));

  let mut sum = [0u8; 4];
  list.reduce(
    |previous, item, out| {
      let total = match previous {
        None => int(item),
        Some(_) => int(out) + int(item),
      };
      out.copy_from_slice(&total.to_ne_bytes());
    },
    &mut sum,
  );
  assert_eq!(i32::from_ne_bytes(sum), 18);

  let doubled = list
    .map(Global, |r| {
      let v = int(r) * 2;
      r.copy_from_slice(&v.to_ne_bytes());
    })
    .unwrap();
  assert_eq!(doubled.get_as::<i32>(3), Ok(18));
  assert_eq!(ints(&list), vec![1, 3, 5, 9]);

  list.for_each(|r| r.copy_from_slice(&0i32.to_ne_bytes()));
  assert_eq!(ints(&list), vec![0, 0, 0, 0]);
}

#[test]
fn sort_comparison_direction() {
  let mut list = list_of(4, &[1, 2, 3]);
  list.sort(|a, b| match int(a).cmp(&int(b)) {
    core::cmp::Ordering::Less => Comparison::FirstLarger,
    core::cmp::Ordering::Equal => Comparison::Equal,
    core::cmp::Ordering::Greater => Comparison::FirstSmaller,
  });
  assert_eq!(ints(&list), vec![3, 2, 1]);
}

#[test]
fn to_array_copies_live_records() {
  let list = list_of(8, &[4, 5]);
  let array = list.to_array_in(Global).unwrap();
  assert_eq!(array.member_count(), 2);
  assert_eq!(array.get_as::<i32>(1), Ok(5));
}

#[test]
fn bump_backed_resize() {
  let bump = BumpAllocator::new(256).unwrap();
  {
    let mut list = List::new_in(&bump, 2, 4).unwrap();
    list.append_as(&1i32).unwrap();
    list.append_as(&2i32).unwrap();
    list.resize(16).unwrap();
    assert_eq!(bump.end_index(), 64);
    list.append_as(&3i32).unwrap();
    assert_eq!(list.get_as::<i32>(2), Ok(3));
    assert_eq!(list.resize(1024), Err(Error::Alloc));
    assert_eq!(list.capacity(), 16);
    assert_eq!(list.len(), 3);
  }
  assert_eq!(bump.end_index(), 0);
}

proptest! {
  #[test]
  fn count_never_exceeds_capacity(
    capacity in 1usize..16,
    ops in proptest::collection::vec((any::<bool>(), any::<i32>(), 0usize..20), 0..64),
  ) {
    let mut list = List::new(capacity, 4).unwrap();
    let mut model: Vec<i32> = Vec::new();
    for (insert, value, index) in ops {
      if insert {
        let result = list.insert(index, &value.to_ne_bytes());
        if model.len() < capacity {
          prop_assert!(result.is_ok());
          model.insert(index.min(model.len()), value);
        } else {
          prop_assert_eq!(result, Err(Error::CapacityExhausted { capacity }));
        }
      } else {
        let result = list.remove_at(index);
        if index < model.len() {
          prop_assert!(result.is_ok());
          model.remove(index);
        } else {
          prop_assert!(result.is_err());
        }
      }
      prop_assert!(list.len() <= list.capacity());
      prop_assert_eq!(ints(&list), model.clone());
    }
  }
}
