use std::alloc::{Layout, alloc, dealloc};
use std::any::type_name;
use std::fmt;
use std::mem;
use std::ptr::NonNull;

use tracing::{debug, trace};

use crate::{
    BlockHeader, BlockLayout, DEFAULT_BLOCK_SIZE, Error, PoolStrategy, Result, Slot, SlotAllocator,
    SlotPoolBuilder,
};

/// A pool allocator that hands out memory for one `T` at a time in constant time.
///
/// The pool obtains memory from the system allocator in blocks of a fixed size (4096 bytes
/// unless configured otherwise) and carves each block into slots that fit exactly one `T`
/// (or one pointer, if that is larger). Released slots are kept on an intrusive free list and
/// handed out again before any never-used slot, so alternating allocate/deallocate cycles never
/// reach the system allocator.
///
/// The pool starts out empty and obtains its first block on the first allocation. A new block is
/// obtained only when the free list is empty and every slot of the newest block has been handed
/// out. Blocks are never released individually; all of them are released when the pool is
/// dropped.
///
/// # Values are the caller's responsibility
///
/// The pool deals in memory, not values. It does not know which slots hold values and will not
/// drop any values when it is itself dropped. Destroy every constructed value (e.g. via
/// [`delete_element()`][1]) before dropping the pool if the values need to be dropped.
///
/// # Ownership
///
/// The pool is move-only. It cannot be cloned, as a clone could neither share the blocks nor
/// meaningfully duplicate memory whose contents the pool does not understand. Use
/// [`take()`][2] to move the blocks out of a pool you only have an exclusive reference to.
///
/// # Thread safety
///
/// The pool can be moved to another thread if `T` can, but it cannot be shared between threads.
///
/// # Examples
///
/// ```
/// use slot_pool::SlotPool;
///
/// let mut pool = SlotPool::<u64>::new();
///
/// let first = pool.allocate().unwrap();
/// // SAFETY: The slot came from this pool and holds no value.
/// unsafe { pool.deallocate(first) };
///
/// // The most recently released slot is reused first.
/// let second = pool.allocate().unwrap();
/// assert_eq!(first, second);
/// # // SAFETY: As above.
/// # unsafe { pool.deallocate(second) };
/// ```
///
/// [1]: SlotAllocator::delete_element
/// [2]: Self::take
pub struct SlotPool<T> {
    layout: BlockLayout,

    /// The most recently obtained block. Each block header links to the block obtained
    /// before it, so this is the head of a list of every block owned by the pool.
    newest_block: Option<NonNull<BlockHeader>>,

    /// The next never-used slot in the newest block.
    current_slot: NonNull<Slot<T>>,

    /// One past the last slot that fits in the newest block. When `current_slot` reaches this,
    /// the newest block is exhausted. Both cursors are equal (and dangling) while the pool owns
    /// no blocks.
    last_slot: NonNull<Slot<T>>,

    /// Head of the stack of released slots, linked through the slots themselves.
    free_slots: Option<NonNull<Slot<T>>>,

    block_count: usize,
}

impl<T> SlotPool<T> {
    /// Creates an empty pool with the default block size of 4096 bytes.
    ///
    /// # Panics
    ///
    /// Panics if a 4096-byte block cannot hold two slots of `T`. Use the
    /// [builder][Self::builder] to choose a larger block size for such types.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_pool::SlotPool;
    ///
    /// let pool = SlotPool::<String>::new();
    ///
    /// assert_eq!(pool.block_size(), 4096);
    /// assert_eq!(pool.block_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        match Self::builder().build() {
            Ok(pool) => pool,
            Err(e) => panic!(
                "default block size of {DEFAULT_BLOCK_SIZE} bytes is unusable for {}: {e}",
                type_name::<T>()
            ),
        }
    }

    /// Starts building a new [`SlotPool`] with a custom configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_pool::SlotPool;
    ///
    /// let pool = SlotPool::<u32>::builder().block_size(256).build().unwrap();
    ///
    /// assert_eq!(pool.block_size(), 256);
    /// ```
    pub fn builder() -> SlotPoolBuilder<T> {
        SlotPoolBuilder::new()
    }

    /// Creates an empty pool that will obtain blocks of the given size.
    pub(crate) fn with_block_size(block_size: usize) -> Result<Self> {
        Ok(Self::empty(BlockLayout::calculate::<T>(block_size)?))
    }

    fn empty(layout: BlockLayout) -> Self {
        Self {
            layout,
            newest_block: None,
            current_slot: NonNull::dangling(),
            last_slot: NonNull::dangling(),
            free_slots: None,
            block_count: 0,
        }
    }

    /// The number of bytes the pool requests from the system allocator for each block.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.layout.block().size()
    }

    /// The memory layout of one slot.
    ///
    /// The size is the larger of the sizes of `T` and a pointer, the alignment the larger of
    /// their alignments.
    #[must_use]
    pub fn slot_layout(&self) -> Layout {
        self.layout.slot()
    }

    /// How many slots each block provides after the block header and alignment padding.
    #[must_use]
    pub fn slots_per_block(&self) -> usize {
        self.layout.slots_per_block()
    }

    /// The number of blocks the pool currently owns.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_pool::SlotPool;
    ///
    /// let mut pool = SlotPool::<u64>::new();
    /// assert_eq!(pool.block_count(), 0);
    ///
    /// let slot = pool.allocate().unwrap();
    /// assert_eq!(pool.block_count(), 1);
    /// # // SAFETY: The slot came from this pool and holds no value.
    /// # unsafe { pool.deallocate(slot) };
    /// ```
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// A theoretical upper bound on the number of slots that could be allocated at the same
    /// time, derived from the block size and slot size. Informational only, not enforced.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.layout.max_slots()
    }

    /// The allocation strategy that produces pools configured like this one.
    #[must_use]
    pub fn strategy(&self) -> PoolStrategy {
        PoolStrategy::new(self.block_size())
    }

    /// Creates a new empty pool for element type `U` with the same block size as this pool.
    ///
    /// The new pool shares no state with this one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockTooSmall`] if the block size cannot hold two slots of `U`.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_pool::SlotPool;
    ///
    /// let numbers = SlotPool::<u32>::builder().block_size(512).build().unwrap();
    /// let names = numbers.rebind::<String>().unwrap();
    ///
    /// assert_eq!(names.block_size(), 512);
    /// assert_eq!(names.block_count(), 0);
    /// ```
    pub fn rebind<U>(&self) -> Result<SlotPool<U>> {
        SlotPool::with_block_size(self.block_size())
    }

    /// Moves all blocks and released slots out of this pool into a new pool, leaving this pool
    /// empty but with the same configuration.
    ///
    /// Slots allocated from this pool before the call belong to the returned pool afterwards.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_pool::SlotPool;
    ///
    /// let mut pool = SlotPool::<u64>::new();
    /// let slot = pool.allocate().unwrap();
    ///
    /// let mut new_home = pool.take();
    /// assert_eq!(pool.block_count(), 0);
    /// assert_eq!(new_home.block_count(), 1);
    ///
    /// // SAFETY: The slot now belongs to `new_home` and holds no value.
    /// unsafe { new_home.deallocate(slot) };
    /// ```
    #[must_use]
    pub fn take(&mut self) -> Self {
        let empty = Self::empty(self.layout);
        mem::replace(self, empty)
    }

    /// Obtains uninitialized memory for one `T`.
    ///
    /// Released slots are reused first, most recently released first. Otherwise the next
    /// never-used slot of the newest block is handed out, obtaining a new block first if the
    /// newest one is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if a new block was needed and the system allocator could
    /// not provide one. The pool remains usable.
    pub fn allocate(&mut self) -> Result<NonNull<T>> {
        if let Some(slot) = self.free_slots {
            // SAFETY: Every slot on the free list is a vacant slot inside one of our blocks.
            let vacant = unsafe { slot.as_ref() };

            // SAFETY: deallocate() wrote the link interpretation before pushing the slot.
            self.free_slots = unsafe { vacant.next_free };

            return Ok(slot.cast());
        }

        if self.current_slot >= self.last_slot {
            self.allocate_block()?;
        }

        let slot = self.current_slot;

        // SAFETY: `slot` is below `last_slot`, so advancing by one slot lands at most at
        // `last_slot`, which is within or one past the end of the newest block.
        self.current_slot = unsafe { slot.add(1) };

        Ok(slot.cast())
    }

    /// Returns a slot to the pool for reuse by a later allocation.
    ///
    /// This does not drop any value in the slot.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// 1. `slot` was returned by [`allocate()`][Self::allocate] on this pool (or on a pool whose
    ///    blocks were moved into this one via [`take()`][Self::take]).
    /// 2. `slot` has not already been returned since it was allocated.
    /// 3. `slot` does not hold a value that still needs to be dropped.
    /// 4. No references or pointers to `slot` are used after this call.
    pub unsafe fn deallocate(&mut self, slot: NonNull<T>) {
        let slot = slot.cast::<Slot<T>>();

        // SAFETY: The caller guarantees this is one of our slots and that it holds nothing we
        // could clobber, so we can switch it to the link interpretation.
        unsafe {
            slot.write(Slot {
                next_free: self.free_slots,
            });
        }

        self.free_slots = Some(slot);
    }

    /// Obtains a new block from the system allocator, links it in front of the existing blocks
    /// and points the cursors at its slots.
    fn allocate_block(&mut self) -> Result<()> {
        let block_layout = self.layout.block();

        // SAFETY: The layout is not zero-sized, as BlockLayout guarantees room for two slots.
        let block = unsafe { alloc(block_layout) };

        let Some(block) = NonNull::new(block) else {
            return Err(Error::OutOfMemory {
                size: block_layout.size(),
                align: block_layout.align(),
            });
        };

        let header = block.cast::<BlockHeader>();

        // SAFETY: The block is aligned for BlockHeader (its alignment is included in the block
        // alignment) and the header is smaller than one slot, so it fits.
        unsafe {
            header.write(BlockHeader {
                previous: self.newest_block,
            });
        }

        self.newest_block = Some(header);

        // SAFETY: BlockLayout guarantees the first slot offset plus at least one slot is within
        // the block.
        let first_slot = unsafe { block.byte_add(self.layout.first_slot_offset()) };
        let first_slot = first_slot.cast::<Slot<T>>();

        self.current_slot = first_slot;

        // SAFETY: BlockLayout guarantees this many whole slots fit after the first slot offset,
        // so this points within or one past the end of the block.
        self.last_slot = unsafe { first_slot.add(self.layout.slots_per_block()) };

        self.block_count = self
            .block_count
            .checked_add(1)
            .expect("every block occupies memory, so the count cannot exceed the address space");

        trace!(
            element_type = type_name::<T>(),
            block_size = block_layout.size(),
            slots_per_block = self.layout.slots_per_block(),
            block_count = self.block_count,
            "obtained new pool block"
        );

        #[cfg(test)]
        self.integrity_check();

        Ok(())
    }

    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(test)]
    pub(crate) fn integrity_check(&self) {
        let mut observed_blocks: usize = 0;
        let mut next = self.newest_block;

        while let Some(block) = next {
            observed_blocks = observed_blocks
                .checked_add(1)
                .expect("cannot have more blocks than fit in memory");

            // SAFETY: Every block in the list starts with a header we wrote.
            next = unsafe { block.as_ref() }.previous;
        }

        assert_eq!(
            observed_blocks,
            self.block_count,
            "block list length does not match block count in pool of {}",
            type_name::<T>()
        );

        assert!(
            self.current_slot <= self.last_slot,
            "current slot is beyond the last slot in pool of {}",
            type_name::<T>()
        );

        if self.newest_block.is_none() {
            assert!(
                self.free_slots.is_none(),
                "pool of {} without blocks has released slots",
                type_name::<T>()
            );
        }
    }
}

impl<T> Default for SlotPool<T> {
    /// Creates an empty pool with the default block size of 4096 bytes.
    ///
    /// # Panics
    ///
    /// Panics if a 4096-byte block cannot hold two slots of `T`.
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SlotAllocator<T> for SlotPool<T> {
    fn allocate(&mut self) -> Result<NonNull<T>> {
        Self::allocate(self)
    }

    unsafe fn deallocate(&mut self, slot: NonNull<T>) {
        // SAFETY: Forwarding guarantees from the caller.
        unsafe {
            Self::deallocate(self, slot);
        }
    }
}

impl<T> Drop for SlotPool<T> {
    fn drop(&mut self) {
        if self.block_count > 0 {
            debug!(
                element_type = type_name::<T>(),
                block_count = self.block_count,
                "releasing pool blocks"
            );
        }

        let block_layout = self.layout.block();
        let mut next = self.newest_block.take();

        while let Some(block) = next {
            // SAFETY: Every block in the list starts with a header we wrote and it is still
            // allocated, as we only release it below after reading the link.
            next = unsafe { block.as_ref() }.previous;

            // SAFETY: The block was allocated in allocate_block() with this exact layout and
            // nothing references it any more.
            unsafe {
                dealloc(block.as_ptr().cast(), block_layout);
            }
        }
    }
}

impl<T> fmt::Debug for SlotPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotPool")
            .field("element_type", &format_args!("{}", type_name::<T>()))
            .field("block_size", &self.block_size())
            .field("slot_layout", &self.slot_layout())
            .field("block_count", &self.block_count)
            .field("has_released_slots", &self.free_slots.is_some())
            .finish_non_exhaustive()
    }
}

// SAFETY: The pool exclusively owns its blocks and holds no thread-bound state, so it can move
// between threads as long as the values placed in its slots can.
unsafe impl<T: Send> Send for SlotPool<T> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::collections::HashSet;
    use std::rc::Rc;
    use std::thread;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(SlotPool<u64>: Send, fmt::Debug, Default);
    assert_not_impl_any!(SlotPool<u64>: Sync, Clone);
    assert_not_impl_any!(SlotPool<Rc<u64>>: Send);

    fn small_pool<T>() -> SlotPool<T> {
        SlotPool::builder().block_size(64).build().unwrap()
    }

    #[test]
    fn smoke_test() {
        let mut pool = SlotPool::<u64>::new();

        let a = pool.new_element(42).unwrap();
        let b = pool.new_element(43).unwrap();

        // SAFETY: Both slots hold live values.
        unsafe {
            assert_eq!(*a.as_ref(), 42);
        }
        // SAFETY: As above.
        unsafe {
            assert_eq!(*b.as_ref(), 43);
        }

        assert_ne!(a, b);

        // SAFETY: Both slots came from this pool and hold live values.
        unsafe {
            pool.delete_element(a);
        }
        // SAFETY: As above.
        unsafe {
            pool.delete_element(b);
        }

        pool.integrity_check();
    }

    #[test]
    fn new_pool_owns_no_blocks() {
        let pool = SlotPool::<u64>::new();

        assert_eq!(pool.block_count(), 0);
        pool.integrity_check();
    }

    #[test]
    fn released_slot_is_reused_first() {
        let mut pool = SlotPool::<u64>::new();

        let a = pool.allocate().unwrap();
        let b = pool.allocate().unwrap();

        // SAFETY: The slot came from this pool and holds no value.
        unsafe {
            pool.deallocate(a);
        }

        let c = pool.allocate().unwrap();
        assert_eq!(a, c);

        // SAFETY: As above.
        unsafe {
            pool.deallocate(b);
        }
        // SAFETY: As above.
        unsafe {
            pool.deallocate(c);
        }
    }

    #[test]
    fn released_slots_are_reused_in_lifo_order() {
        let mut pool = SlotPool::<u64>::new();

        let slots: Vec<_> = (0..5).map(|_| pool.allocate().unwrap()).collect();

        for slot in &slots {
            // SAFETY: The slot came from this pool and holds no value.
            unsafe {
                pool.deallocate(*slot);
            }
        }

        for expected in slots.iter().rev() {
            assert_eq!(pool.allocate().unwrap(), *expected);
        }

        for slot in slots {
            // SAFETY: As above.
            unsafe {
                pool.deallocate(slot);
            }
        }
    }

    #[test]
    fn slots_are_aligned_and_distinct() {
        #[repr(align(32))]
        struct Aligned {
            _value: u64,
        }

        let mut pool = SlotPool::<Aligned>::builder()
            .block_size(256)
            .build()
            .unwrap();

        let mut seen = HashSet::new();
        let slots: Vec<_> = (0..20).map(|_| pool.allocate().unwrap()).collect();

        for slot in &slots {
            assert_eq!(slot.as_ptr() as usize % 32, 0);
            assert!(seen.insert(slot.as_ptr() as usize));
        }

        for slot in slots {
            // SAFETY: The slot came from this pool and holds no value.
            unsafe {
                pool.deallocate(slot);
            }
        }

        pool.integrity_check();
    }

    #[test]
    fn new_block_only_when_exhausted() {
        let mut pool = small_pool::<u64>();
        let per_block = pool.slots_per_block();

        let mut slots = Vec::new();

        for _ in 0..per_block {
            slots.push(pool.allocate().unwrap());
        }

        assert_eq!(pool.block_count(), 1);

        slots.push(pool.allocate().unwrap());
        assert_eq!(pool.block_count(), 2);

        for slot in slots {
            // SAFETY: The slot came from this pool and holds no value.
            unsafe {
                pool.deallocate(slot);
            }
        }

        pool.integrity_check();
    }

    #[test]
    fn released_slot_prevents_new_block() {
        let mut pool = small_pool::<u64>();
        let per_block = pool.slots_per_block();

        let mut slots: Vec<_> = (0..per_block).map(|_| pool.allocate().unwrap()).collect();

        let released = slots.pop().unwrap();
        // SAFETY: The slot came from this pool and holds no value.
        unsafe {
            pool.deallocate(released);
        }

        slots.push(pool.allocate().unwrap());
        assert_eq!(pool.block_count(), 1);

        for slot in slots {
            // SAFETY: As above.
            unsafe {
                pool.deallocate(slot);
            }
        }
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn ten_words_in_small_blocks() {
        let mut pool = small_pool::<u64>();

        let slots: Vec<_> = (0..10).map(|_| pool.allocate().unwrap()).collect();
        assert_eq!(pool.block_count(), 2);

        for slot in &slots {
            // SAFETY: The slot came from this pool and holds no value.
            unsafe {
                pool.deallocate(*slot);
            }
        }

        let reused = pool.allocate().unwrap();
        assert_eq!(pool.block_count(), 2);
        assert_eq!(Some(&reused), slots.last());

        // SAFETY: As above.
        unsafe {
            pool.deallocate(reused);
        }
    }

    #[test]
    fn construct_and_destroy_run_once_each() {
        struct Counted {
            drops: Rc<Cell<usize>>,
        }

        impl Drop for Counted {
            fn drop(&mut self) {
                self.drops.set(self.drops.get() + 1);
            }
        }

        let drops = Rc::new(Cell::new(0));
        let mut pool = small_pool::<Counted>();

        let slots: Vec<_> = (0..25)
            .map(|_| {
                pool.new_element(Counted {
                    drops: Rc::clone(&drops),
                })
                .unwrap()
            })
            .collect();

        assert_eq!(drops.get(), 0);

        for slot in slots {
            // SAFETY: The slot came from this pool and holds a live value.
            unsafe {
                pool.delete_element(slot);
            }
        }

        assert_eq!(drops.get(), 25);
    }

    #[test]
    fn deallocate_does_not_drop() {
        struct Counted {
            drops: Rc<Cell<usize>>,
        }

        impl Drop for Counted {
            fn drop(&mut self) {
                self.drops.set(self.drops.get() + 1);
            }
        }

        let drops = Rc::new(Cell::new(0));
        let mut pool = SlotPool::<Counted>::new();
        let slot = pool
            .new_element(Counted {
                drops: Rc::clone(&drops),
            })
            .unwrap();

        // SAFETY: The slot holds a live value that we move out, leaving it vacant.
        let value = unsafe { slot.read() };

        // SAFETY: The slot came from this pool and its value was moved out above.
        unsafe {
            pool.deallocate(slot);
        }

        assert_eq!(drops.get(), 0);
        drop(value);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn take_moves_blocks_and_leaves_empty_pool() {
        let mut pool = small_pool::<u64>();

        let kept = pool.allocate().unwrap();
        let released = pool.allocate().unwrap();

        // SAFETY: The slot came from this pool and holds no value.
        unsafe {
            pool.deallocate(released);
        }

        let mut moved = pool.take();

        assert_eq!(pool.block_count(), 0);
        assert_eq!(pool.block_size(), 64);
        pool.integrity_check();

        assert_eq!(moved.block_count(), 1);
        moved.integrity_check();

        // The released slot travelled with the blocks.
        assert_eq!(moved.allocate().unwrap(), released);

        // The emptied pool starts over with a block of its own.
        let fresh = pool.allocate().unwrap();
        assert_eq!(pool.block_count(), 1);

        // SAFETY: Each slot is returned to the pool that owns its block and holds no value.
        unsafe {
            moved.deallocate(kept);
        }
        // SAFETY: As above.
        unsafe {
            moved.deallocate(released);
        }
        // SAFETY: As above.
        unsafe {
            pool.deallocate(fresh);
        }

        // Both pools are dropped here and each releases only its own blocks.
    }

    #[test]
    fn rebind_keeps_block_size_and_starts_empty() {
        let mut pool = SlotPool::<u8>::builder().block_size(512).build().unwrap();
        let slot = pool.allocate().unwrap();

        let rebound = pool.rebind::<[u64; 4]>().unwrap();

        assert_eq!(rebound.block_size(), 512);
        assert_eq!(rebound.block_count(), 0);
        assert_eq!(rebound.slot_layout(), Layout::new::<[u64; 4]>());
        assert_eq!(pool.block_count(), 1);

        // SAFETY: The slot came from this pool and holds no value.
        unsafe {
            pool.deallocate(slot);
        }
    }

    #[test]
    fn rebind_to_oversized_type_fails() {
        let pool = SlotPool::<u8>::builder().block_size(64).build().unwrap();

        let result = pool.rebind::<[u8; 33]>();

        assert!(matches!(result, Err(Error::BlockTooSmall { .. })));
    }

    #[test]
    fn strategy_reflects_block_size() {
        let pool = SlotPool::<u32>::builder().block_size(1024).build().unwrap();

        assert_eq!(pool.strategy(), PoolStrategy::new(1024));
    }

    #[test]
    #[should_panic]
    fn new_with_oversized_type_panics() {
        drop(SlotPool::<[u8; 4000]>::new());
    }

    #[test]
    fn zero_sized_type_gets_distinct_slots() {
        let mut pool = SlotPool::<()>::new();

        let a = pool.new_element(()).unwrap();
        let b = pool.new_element(()).unwrap();
        assert_ne!(a, b);

        // SAFETY: Both slots came from this pool and hold live values.
        unsafe {
            pool.delete_element(a);
        }
        // SAFETY: As above.
        unsafe {
            pool.delete_element(b);
        }
    }

    #[test]
    fn max_size_is_positive() {
        let pool = SlotPool::<u64>::new();

        assert!(pool.max_size() > 0);
    }

    #[test]
    fn debug_names_element_type() {
        let pool = SlotPool::<String>::new();

        let output = format!("{pool:?}");
        assert!(output.contains("SlotPool"));
        assert!(output.contains("String"));
    }

    #[test]
    fn moves_between_threads() {
        let mut pool = SlotPool::<u64>::new();
        let slot = pool.new_element(7).unwrap();
        let address = slot.as_ptr() as usize;

        let mut pool = thread::spawn(move || {
            let fresh = pool.allocate().unwrap();
            assert_ne!(fresh.as_ptr() as usize, address);

            // SAFETY: The slot came from this pool and holds no value.
            unsafe {
                pool.deallocate(fresh);
            }

            pool
        })
        .join()
        .unwrap();

        // SAFETY: The pool travelled back to us with its blocks, so the value is still alive.
        assert_eq!(unsafe { *slot.as_ref() }, 7);

        // SAFETY: The slot came from this pool and holds a live value.
        unsafe {
            pool.delete_element(slot);
        }
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn failed_block_allocation_leaves_pool_usable() {
        let mut pool = SlotPool::<u64>::builder()
            .block_size(1 << 62)
            .build()
            .unwrap();

        for _ in 0..2 {
            match pool.allocate() {
                Err(Error::OutOfMemory { size, align }) => {
                    assert_eq!(size, 1 << 62);
                    assert_eq!(align, align_of::<u64>().max(align_of::<usize>()));
                }
                other => panic!("expected OutOfMemory, got {other:?}"),
            }

            assert_eq!(pool.block_count(), 0);
            pool.integrity_check();
        }

        assert_eq!(pool.block_size(), 1 << 62);

        // Nothing was obtained, so there is nothing to release.
        drop(pool);
    }

    #[test]
    fn growing_many_blocks_keeps_block_list_consistent() {
        let mut pool = small_pool::<u64>();
        let per_block = pool.slots_per_block();

        let slots: Vec<_> = (0..per_block * 50).map(|_| pool.allocate().unwrap()).collect();

        assert_eq!(pool.block_count(), 50);
        pool.integrity_check();

        for slot in slots {
            // SAFETY: The slot came from this pool and holds no value.
            unsafe {
                pool.deallocate(slot);
            }
        }
    }

    #[test]
    fn many_alternating_cycles_stay_in_one_block() {
        let mut pool = SlotPool::<u64>::new();

        for i in 0..100_000_u64 {
            let slot = pool.new_element(i).unwrap();

            // SAFETY: The slot came from this pool and holds a live value.
            unsafe {
                pool.delete_element(slot);
            }
        }

        assert_eq!(pool.block_count(), 1);
    }
}
