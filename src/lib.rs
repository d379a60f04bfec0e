//! Bump and arena allocators with type-erased containers on top.
//!
//! Every container stores opaque fixed-size byte records and takes its
//! memory from an [`Allocator`]: the global heap, a [`BumpAllocator`], an
//! [`ArenaAllocator`], or a C function-pointer table
//! ([`AllocatorInterface`]). Typed access goes through the [`Record`]
//! marker trait.
//!
//! Containers never grow on their own. A [`List`] refuses inserts once
//! full and a [`Dict`] reports probe exhaustion; callers resize
//! explicitly. Failed mutators return an [`Error`] and leave the
//! container as it was.

#![allow(clippy::mut_from_ref)]

extern crate alloc;

pub mod arena;
pub mod array;
pub mod bitmap;
pub mod bump;
pub mod config;
pub mod dict;
pub mod error;
pub mod ffi;
pub mod list;
pub mod queue;
pub mod record;
pub mod stack;

pub use allocator_api2::alloc::{
  AllocError,
  Allocator,
  Global,
};
pub use arena::ArenaAllocator;
pub use array::{
  Array,
  Comparison,
};
pub use bitmap::Bitmap;
pub use bump::BumpAllocator;
pub use config::ArenaConfig;
pub use dict::{
  Dict,
  Set,
};
pub use error::{
  Error,
  Result,
};
pub use ffi::AllocatorInterface;
pub use list::List;
pub use queue::Queue;
pub use record::Record;
pub use stack::Stack;
