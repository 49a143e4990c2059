use thiserror::Error;

/// Errors that can occur when configuring a pool or obtaining memory for it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The configured block size cannot hold two slots, so after the block header and
    /// alignment padding there would not be room for even one slot.
    #[error("block size of {block_size} bytes is too small for {slot_size}-byte slots, at least twice the slot size is required")]
    BlockTooSmall {
        /// The block size that was requested.
        block_size: usize,

        /// The size of one slot for the element type of the pool.
        slot_size: usize,
    },

    /// The block size and alignment do not form a valid memory layout, typically because
    /// the block size exceeds `isize::MAX` once rounded up to the alignment.
    #[error("block size of {block_size} bytes with alignment {align} is not a valid memory layout")]
    InvalidBlockLayout {
        /// The block size that was requested.
        block_size: usize,

        /// The alignment required by the block.
        align: usize,
    },

    /// The system allocator could not provide the requested memory.
    #[error("the system allocator could not provide {size} bytes aligned to {align}")]
    OutOfMemory {
        /// Size of the failed request in bytes.
        size: usize,

        /// Alignment of the failed request in bytes.
        align: usize,
    },
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
