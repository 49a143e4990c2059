#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A singly linked LIFO stack with a pluggable node allocator.
//!
//! [`LinkedStack<T, S>`] stores every value in its own node. Nodes are obtained from an
//! allocator that the [`AllocationStrategy`] `S` produces for the stack's internal node type,
//! which makes the stack a convenient way to compare allocation strategies under a
//! node-per-element workload:
//!
//! * [`SystemStrategy`] (the default) requests every node from the system allocator.
//! * [`PoolStrategy`] keeps nodes in a [`SlotPool`][slot_pool::SlotPool], so steady-state
//!   push/pop cycles never reach the system allocator.
//!
//! This is part of the [Folo project](https://github.com/folo-rs/folo) that provides mechanisms for
//! high-performance hardware-aware programming in Rust.
//!
//! # Example
//!
//! ```
//! use linked_stack::{LinkedStack, PoolStrategy};
//!
//! let mut stack = LinkedStack::with_strategy(&PoolStrategy::new(1024)).unwrap();
//!
//! for value in 0..10 {
//!     stack.push(value).unwrap();
//! }
//!
//! for expected in (0..10).rev() {
//!     assert_eq!(stack.pop(), expected);
//! }
//!
//! assert!(stack.is_empty());
//! ```

mod stack;

pub use slot_pool::{AllocationStrategy, Error, PoolStrategy, Result, SystemStrategy};
pub use stack::*;
