#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A fixed-size object pool allocator.
//!
//! [`SlotPool<T>`] hands out and reclaims memory for one `T` at a time in constant time without
//! going back to the system allocator on every call. It requests memory in large blocks (4096
//! bytes by default), carves each block into slots sized and aligned for `T`, and keeps released
//! slots on an intrusive free list for immediate reuse.
//!
//! The crate also defines the seam that lets containers choose their allocation policy:
//!
//! * [`SlotAllocator<T>`] - the capability set of allocating, deallocating, constructing and
//!   destroying single values. Implemented by [`SlotPool`] and by the general-purpose
//!   [`SystemAllocator`].
//! * [`AllocationStrategy`] - a factory that produces a [`SlotAllocator`] for any element type
//!   under one policy. [`PoolStrategy`] produces pools with a fixed block size,
//!   [`SystemStrategy`] produces system allocators.
//!
//! This is part of the [Folo project](https://github.com/folo-rs/folo) that provides mechanisms for
//! high-performance hardware-aware programming in Rust.
//!
//! # Example
//!
//! ```
//! use slot_pool::{SlotAllocator, SlotPool};
//!
//! let mut pool = SlotPool::<u64>::builder().block_size(256).build().unwrap();
//!
//! let slot = pool.new_element(42).unwrap();
//!
//! // SAFETY: The slot holds a live value that nothing else references.
//! assert_eq!(unsafe { *slot.as_ref() }, 42);
//!
//! // SAFETY: The slot came from this pool and holds a live value.
//! unsafe { pool.delete_element(slot) };
//!
//! assert_eq!(pool.block_count(), 1);
//! ```
//!
//! # Thread safety
//!
//! None of the types synchronize access. A pool can be moved to another thread but never shared
//! between threads.

mod allocator;
mod builder;
mod error;
mod layout;
mod pool;
mod strategy;
mod system;

pub use allocator::*;
pub use builder::*;
pub use error::*;
pub(crate) use layout::*;
pub use pool::*;
pub use strategy::*;
pub use system::*;

/// The number of bytes a [`SlotPool`] requests per block unless configured otherwise.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;
