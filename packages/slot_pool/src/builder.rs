use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use crate::{DEFAULT_BLOCK_SIZE, Result, SlotPool};

/// Builder for creating an instance of [`SlotPool`].
///
/// You only need to use this builder if you want to customize the pool configuration.
/// The default configuration used by [`SlotPool::new()`][1] is sufficient for most use cases.
///
/// # Examples
///
/// ```
/// use slot_pool::SlotPool;
///
/// let pool = SlotPool::<u64>::builder().block_size(1024).build().unwrap();
/// ```
///
/// [1]: SlotPool::new
#[must_use]
pub struct SlotPoolBuilder<T> {
    block_size: usize,

    _item: PhantomData<T>,
}

impl<T> fmt::Debug for SlotPoolBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotPoolBuilder")
            .field("element_type", &format_args!("{}", type_name::<T>()))
            .field("block_size", &self.block_size)
            .finish()
    }
}

impl<T> SlotPoolBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            _item: PhantomData,
        }
    }

    /// Sets the number of bytes the pool requests from the system allocator for each block.
    ///
    /// The block must be at least twice as large as one slot. This is validated by
    /// [`build()`][Self::build].
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_pool::SlotPool;
    ///
    /// let pool = SlotPool::<u32>::builder().block_size(128).build().unwrap();
    ///
    /// assert_eq!(pool.block_size(), 128);
    /// ```
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Builds the pool with the specified configuration.
    ///
    /// The pool is created empty; no memory is requested until the first allocation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockTooSmall`][crate::Error::BlockTooSmall] if a block cannot hold two
    /// slots of `T` and [`Error::InvalidBlockLayout`][crate::Error::InvalidBlockLayout] if the
    /// block size is too large to describe as a memory layout.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_pool::{Error, SlotPool};
    ///
    /// let result = SlotPool::<[u64; 8]>::builder().block_size(100).build();
    ///
    /// assert!(matches!(result, Err(Error::BlockTooSmall { .. })));
    /// ```
    pub fn build(self) -> Result<SlotPool<T>> {
        SlotPool::with_block_size(self.block_size)
    }
}
