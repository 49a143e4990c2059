use std::alloc::{Layout, alloc, dealloc};
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::{AllocationStrategy, Error, Result, SlotAllocator};

/// General-purpose [`SlotAllocator`] that sends every request straight to the system allocator.
///
/// This is the baseline that [`SlotPool`][crate::SlotPool] is measured against and the default
/// for containers that do not opt into pooling.
///
/// # Examples
///
/// ```
/// use slot_pool::{SlotAllocator, SystemAllocator};
///
/// let mut allocator = SystemAllocator::<u64>::new();
///
/// let slot = allocator.new_element(42).unwrap();
/// // SAFETY: The slot came from this allocator and holds a live value.
/// unsafe { allocator.delete_element(slot) };
/// ```
pub struct SystemAllocator<T> {
    _item: PhantomData<fn() -> T>,
}

impl<T> SystemAllocator<T> {
    /// Creates a new system allocator for `T`. This does not allocate anything.
    #[must_use]
    pub const fn new() -> Self {
        Self { _item: PhantomData }
    }
}

impl<T> Default for SystemAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SystemAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemAllocator")
            .field("element_type", &format_args!("{}", type_name::<T>()))
            .finish()
    }
}

impl<T> SlotAllocator<T> for SystemAllocator<T> {
    fn allocate(&mut self) -> Result<NonNull<T>> {
        let layout = Layout::new::<T>();

        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }

        // SAFETY: The layout is not zero-sized, guarded above.
        let ptr = unsafe { alloc(layout) };

        NonNull::new(ptr.cast::<T>()).ok_or(Error::OutOfMemory {
            size: layout.size(),
            align: layout.align(),
        })
    }

    unsafe fn deallocate(&mut self, slot: NonNull<T>) {
        let layout = Layout::new::<T>();

        if layout.size() == 0 {
            return;
        }

        // SAFETY: The caller guarantees the slot came from allocate(), which used this layout.
        unsafe {
            dealloc(slot.as_ptr().cast(), layout);
        }
    }
}

/// Allocation strategy that produces [`SystemAllocator`] instances.
///
/// This strategy never fails to produce an allocator.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub struct SystemStrategy;

impl SystemStrategy {
    /// Creates the system allocation strategy.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl AllocationStrategy for SystemStrategy {
    type Allocator<U> = SystemAllocator<U>;

    fn allocator_for<U>(&self) -> Result<SystemAllocator<U>> {
        Ok(SystemAllocator::new())
    }
}
