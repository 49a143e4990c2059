use std::ptr::NonNull;

use crate::Result;

/// Allocates and releases memory for exactly one `T` at a time and constructs or destroys
/// values in that memory.
///
/// This is the capability set a container needs from its allocator. Memory and values are
/// managed in separate steps: [`allocate()`][1] hands out uninitialized memory,
/// [`construct()`][2] places a value into it, [`destroy()`][3] drops the value in place and
/// [`deallocate()`][4] returns the (by then uninitialized) memory to the allocator.
///
/// [`new_element()`][5] and [`delete_element()`][6] combine the two steps in each direction.
///
/// # Examples
///
/// ```
/// use slot_pool::{SlotAllocator, SlotPool};
///
/// let mut pool = SlotPool::<String>::new();
///
/// let slot = pool.new_element("Hello".to_string()).unwrap();
///
/// // SAFETY: The slot holds a constructed value that nothing else references.
/// assert_eq!(unsafe { slot.as_ref() }, "Hello");
///
/// // SAFETY: The slot came from this pool and holds a constructed value.
/// unsafe { pool.delete_element(slot) };
/// ```
///
/// [1]: Self::allocate
/// [2]: Self::construct
/// [3]: Self::destroy
/// [4]: Self::deallocate
/// [5]: Self::new_element
/// [6]: Self::delete_element
pub trait SlotAllocator<T> {
    /// Obtains uninitialized memory suitable for one `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`][crate::Error::OutOfMemory] if the allocator needed more
    /// memory from the system and the system could not provide it.
    fn allocate(&mut self) -> Result<NonNull<T>>;

    /// Returns memory previously obtained from [`allocate()`][Self::allocate].
    ///
    /// Does not drop anything. If the memory holds a value, call [`destroy()`][Self::destroy]
    /// first or use [`delete_element()`][Self::delete_element].
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// 1. `slot` was returned by `allocate()` on this same allocator instance.
    /// 2. `slot` has not already been deallocated since it was allocated.
    /// 3. `slot` does not hold a value that still needs to be dropped.
    /// 4. No references or pointers to `slot` are used after this call.
    unsafe fn deallocate(&mut self, slot: NonNull<T>);

    /// Moves `value` into the memory at `slot`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `slot` was returned by [`allocate()`][Self::allocate] on
    /// this allocator, has not been deallocated and does not currently hold a value.
    unsafe fn construct(&mut self, slot: NonNull<T>, value: T) {
        // SAFETY: Forwarding guarantees from the caller - the memory is valid for writes of T
        // and holds no value that would be leaked by overwriting it.
        unsafe {
            slot.write(value);
        }
    }

    /// Drops the value at `slot` in place, leaving the memory allocated but uninitialized.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `slot` holds a value constructed via
    /// [`construct()`][Self::construct] that has not been destroyed or moved out, and that no
    /// references to the value exist.
    unsafe fn destroy(&mut self, slot: NonNull<T>) {
        // SAFETY: Forwarding guarantees from the caller - the memory holds a live T that
        // nothing else will observe again.
        unsafe {
            slot.drop_in_place();
        }
    }

    /// Allocates memory for one `T` and moves `value` into it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`][crate::Error::OutOfMemory] if memory could not be
    /// obtained. The value is dropped in that case.
    fn new_element(&mut self, value: T) -> Result<NonNull<T>> {
        let slot = self.allocate()?;

        // SAFETY: The slot was just allocated by us and does not hold a value yet.
        unsafe {
            self.construct(slot, value);
        }

        Ok(slot)
    }

    /// Drops the value at `slot` and returns the memory to the allocator.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `slot` was obtained from this allocator, holds a live value
    /// and that no references or pointers to it are used after this call.
    unsafe fn delete_element(&mut self, slot: NonNull<T>) {
        // SAFETY: Forwarding guarantees from the caller.
        unsafe {
            self.destroy(slot);
        }

        // SAFETY: Forwarding guarantees from the caller and we just destroyed the value.
        unsafe {
            self.deallocate(slot);
        }
    }
}

/// Produces [`SlotAllocator`] instances for arbitrary element types under one allocation policy.
///
/// Containers are usually written against the type they expose (e.g. a stack of `T`) but
/// allocate an internal type (e.g. a node wrapping a `T`). A strategy lets the caller pick the
/// policy while the container picks the element type it actually allocates.
///
/// Every call produces an independent allocator that shares no state with any other.
///
/// # Examples
///
/// ```
/// use slot_pool::{AllocationStrategy, PoolStrategy, SlotAllocator};
///
/// let strategy = PoolStrategy::new(1024);
///
/// let mut numbers = strategy.allocator_for::<u64>().unwrap();
/// let mut names = strategy.allocator_for::<String>().unwrap();
///
/// let number = numbers.new_element(42).unwrap();
/// let name = names.new_element("Ferris".to_string()).unwrap();
///
/// // SAFETY: Both slots came from the respective allocators and hold live values.
/// unsafe {
///     numbers.delete_element(number);
/// }
/// // SAFETY: As above.
/// unsafe {
///     names.delete_element(name);
/// }
/// ```
pub trait AllocationStrategy {
    /// The allocator this strategy produces for element type `U`.
    type Allocator<U>: SlotAllocator<U>;

    /// Creates a new allocator for element type `U` under this strategy's policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the policy cannot accommodate `U`, for example
    /// [`Error::BlockTooSmall`][crate::Error::BlockTooSmall] if a pool block is too small to
    /// hold two `U`-sized slots.
    fn allocator_for<U>(&self) -> Result<Self::Allocator<U>>;
}
