use std::alloc::Layout;
use std::mem::ManuallyDrop;
use std::ptr::NonNull;

use crate::{Error, Result};

/// One storage cell of a pool.
///
/// A slot is either holding a value of `T` (after the caller constructs one in it) or it is
/// vacant and threaded onto the free list through `next_free`. The pool never reads the value
/// interpretation, it only ever writes and reads the link of vacant slots.
#[repr(C)]
pub(crate) union Slot<T> {
    _value: ManuallyDrop<T>,
    pub(crate) next_free: Option<NonNull<Self>>,
}

/// The first word of every block, linking to the block obtained before it so that all blocks
/// can be released together when the pool is dropped.
#[derive(Debug)]
pub(crate) struct BlockHeader {
    pub(crate) previous: Option<NonNull<Self>>,
}

/// Layout calculations for the blocks of a pool of a specific element type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct BlockLayout {
    /// Layout of one whole block, as requested from the system allocator.
    block: Layout,

    /// Layout of one slot. The size is the stride between consecutive slots.
    slot: Layout,

    /// Byte offset from the start of a block to its first slot. This is the header size
    /// rounded up to the slot alignment.
    first_slot_offset: usize,

    /// How many whole slots fit between the first slot offset and the end of the block.
    slots_per_block: usize,
}

impl BlockLayout {
    /// Calculates the block layout for slots of `T` in blocks of `block_size` bytes.
    ///
    /// Fails if the block cannot hold two slots or if the block is not a valid layout.
    pub(crate) fn calculate<T>(block_size: usize) -> Result<Self> {
        let slot = Layout::new::<Slot<T>>();
        let header = Layout::new::<BlockHeader>();

        let too_small = Error::BlockTooSmall {
            block_size,
            slot_size: slot.size(),
        };

        let Some(minimum_block_size) = slot.size().checked_mul(2) else {
            return Err(too_small);
        };

        if block_size < minimum_block_size {
            return Err(too_small);
        }

        let align = header.align().max(slot.align());

        let Ok(block) = Layout::from_size_align(block_size, align) else {
            return Err(Error::InvalidBlockLayout { block_size, align });
        };

        let Ok((_, first_slot_offset)) = header.extend(slot) else {
            return Err(Error::InvalidBlockLayout { block_size, align });
        };

        // The header is one pointer and every slot is at least one pointer wide and a multiple
        // of its own alignment, so the padded header never exceeds one slot. With room for two
        // slots in the block, at least one slot always fits after the header.
        let usable = block_size
            .checked_sub(first_slot_offset)
            .expect("first slot offset cannot exceed one slot, and the block holds at least two");

        let slots_per_block = usable.div_euclid(slot.size());

        assert!(
            slots_per_block > 0,
            "a block of {block_size} bytes must hold at least one {}-byte slot",
            slot.size()
        );

        Ok(Self {
            block,
            slot,
            first_slot_offset,
            slots_per_block,
        })
    }

    #[must_use]
    pub(crate) fn block(&self) -> Layout {
        self.block
    }

    #[must_use]
    pub(crate) fn slot(&self) -> Layout {
        self.slot
    }

    #[must_use]
    pub(crate) fn first_slot_offset(&self) -> usize {
        self.first_slot_offset
    }

    #[must_use]
    pub(crate) fn slots_per_block(&self) -> usize {
        self.slots_per_block
    }

    /// Theoretical upper bound on simultaneously allocated slots: every possible block of the
    /// address space, each holding as many slots as fit after the header word.
    #[must_use]
    pub(crate) fn max_slots(&self) -> usize {
        let block_size = self.block.size();
        let max_blocks = usize::MAX.div_euclid(block_size);

        // Cannot underflow because the block holds at least two slots, each wider than a header.
        let per_block = block_size
            .wrapping_sub(size_of::<BlockHeader>())
            .div_euclid(self.slot.size());

        per_block.saturating_mul(max_blocks)
    }
}
