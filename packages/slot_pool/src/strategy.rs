use crate::{AllocationStrategy, DEFAULT_BLOCK_SIZE, Result, SlotPool};

/// Allocation strategy that gives every element type its own [`SlotPool`] with the same block
/// size.
///
/// # Examples
///
/// ```
/// use slot_pool::{AllocationStrategy, PoolStrategy};
///
/// let strategy = PoolStrategy::new(256);
/// let pool = strategy.allocator_for::<u64>().unwrap();
///
/// assert_eq!(pool.block_size(), 256);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PoolStrategy {
    block_size: usize,
}

impl PoolStrategy {
    /// Creates a strategy whose pools request blocks of `block_size` bytes.
    ///
    /// The block size is validated against each element type separately, when a pool for that
    /// type is created.
    #[must_use]
    pub const fn new(block_size: usize) -> Self {
        Self { block_size }
    }

    /// The number of bytes each pool produced by this strategy requests per block.
    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }
}

impl Default for PoolStrategy {
    /// A strategy with the default block size of 4096 bytes.
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE)
    }
}

impl AllocationStrategy for PoolStrategy {
    type Allocator<U> = SlotPool<U>;

    fn allocator_for<U>(&self) -> Result<SlotPool<U>> {
        SlotPool::builder().block_size(self.block_size).build()
    }
}
