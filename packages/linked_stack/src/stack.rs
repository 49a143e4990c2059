use std::any::type_name;
use std::fmt;
use std::mem::ManuallyDrop;
use std::ptr::NonNull;

use slot_pool::{AllocationStrategy, Result, SlotAllocator, SystemAllocator, SystemStrategy};
use tracing::trace;

/// A last-in-first-out stack of `T` built from individually allocated nodes.
///
/// Each pushed value is placed in its own node that links to the node pushed before it. Nodes
/// are obtained from and returned to an allocator produced by the strategy `S`, so the stack can
/// run on the system allocator ([`SystemStrategy`], the default) or on a pool of same-sized slots
/// ([`PoolStrategy`][slot_pool::PoolStrategy]) without any change in behavior.
///
/// # Preconditions
///
/// [`pop()`][1] and [`top()`][2] require a non-empty stack and panic otherwise. Check
/// [`is_empty()`][3] first or use [`peek()`][4] when emptiness is an expected condition.
///
/// # Thread safety
///
/// The stack is neither thread-mobile nor thread-safe.
///
/// # Examples
///
/// ```
/// use linked_stack::{LinkedStack, PoolStrategy};
///
/// let mut stack = LinkedStack::with_strategy(&PoolStrategy::default()).unwrap();
///
/// stack.push(1).unwrap();
/// stack.push(2).unwrap();
/// stack.push(3).unwrap();
///
/// assert_eq!(stack.pop(), 3);
/// assert_eq!(stack.top(), 2);
/// assert_eq!(stack.len(), 2);
/// ```
///
/// [1]: Self::pop
/// [2]: Self::top
/// [3]: Self::is_empty
/// [4]: Self::peek
pub struct LinkedStack<T, S: AllocationStrategy = SystemStrategy> {
    allocator: S::Allocator<Node<T>>,

    /// The most recently pushed node, if any. Each node links to the one pushed before it.
    head: Option<NonNull<Node<T>>>,

    len: usize,
}

/// The value is dropped by whoever takes it out of the node, so destroying a node through the
/// allocator only ends the node itself.
struct Node<T> {
    data: ManuallyDrop<T>,
    prev: Option<NonNull<Self>>,
}

impl<T> LinkedStack<T> {
    /// Creates an empty stack whose nodes come from the system allocator.
    ///
    /// # Examples
    ///
    /// ```
    /// use linked_stack::LinkedStack;
    ///
    /// let stack = LinkedStack::<u32>::new();
    ///
    /// assert!(stack.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            allocator: SystemAllocator::new(),
            head: None,
            len: 0,
        }
    }
}

impl<T> Default for LinkedStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S: AllocationStrategy> LinkedStack<T, S> {
    /// Creates an empty stack whose nodes come from an allocator produced by `strategy`.
    ///
    /// # Errors
    ///
    /// Returns an error if the strategy cannot produce an allocator for the stack's nodes, e.g.
    /// [`Error::BlockTooSmall`][slot_pool::Error::BlockTooSmall] if a pool block is too small
    /// for two nodes.
    ///
    /// # Examples
    ///
    /// ```
    /// use linked_stack::{LinkedStack, PoolStrategy};
    ///
    /// let stack = LinkedStack::<String, _>::with_strategy(&PoolStrategy::new(1024)).unwrap();
    ///
    /// assert!(stack.is_empty());
    /// ```
    pub fn with_strategy(strategy: &S) -> Result<Self> {
        Ok(Self {
            allocator: strategy.allocator_for::<Node<T>>()?,
            head: None,
            len: 0,
        })
    }

    /// Whether the stack holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// The number of values in the stack.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Only informational, the stack itself relies on `head`.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Places a value on top of the stack.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`][slot_pool::Error::OutOfMemory] if memory for the node
    /// could not be obtained. The stack is unchanged and `value` is dropped in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use linked_stack::LinkedStack;
    ///
    /// let mut stack = LinkedStack::new();
    /// stack.push("first").unwrap();
    ///
    /// assert_eq!(stack.top(), "first");
    /// ```
    pub fn push(&mut self, value: T) -> Result<()> {
        let node = self.allocator.allocate()?;

        // SAFETY: The slot was just allocated by our allocator and holds no value yet.
        unsafe {
            self.allocator.construct(
                node,
                Node {
                    data: ManuallyDrop::new(value),
                    prev: self.head,
                },
            );
        }

        self.head = Some(node);

        // Cannot overflow because every value occupies a distinct node in memory.
        self.len = self.len.wrapping_add(1);

        Ok(())
    }

    /// Removes the top value from the stack and returns it.
    ///
    /// # Panics
    ///
    /// Panics if the stack is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use linked_stack::LinkedStack;
    ///
    /// let mut stack = LinkedStack::new();
    /// stack.push(1).unwrap();
    /// stack.push(2).unwrap();
    ///
    /// assert_eq!(stack.pop(), 2);
    /// assert_eq!(stack.pop(), 1);
    /// assert!(stack.is_empty());
    /// ```
    pub fn pop(&mut self) -> T {
        let Some(mut head) = self.head else {
            panic!("pop() called on an empty stack of {}", type_name::<T>());
        };

        // SAFETY: The head node was constructed in push() and is owned exclusively by us.
        let node = unsafe { head.as_mut() };

        self.head = node.prev;

        // SAFETY: The value is taken out exactly once, as the node is destroyed right after.
        let data = unsafe { ManuallyDrop::take(&mut node.data) };

        // SAFETY: The node came from our allocator, is constructed and no longer reachable from
        // the stack. Its value was taken out above, so destroying it does not touch the value.
        unsafe {
            self.allocator.destroy(head);
        }

        // SAFETY: The slot came from our allocator and its node was destroyed above.
        unsafe {
            self.allocator.deallocate(head);
        }

        // Cannot underflow because the stack was not empty.
        self.len = self.len.wrapping_sub(1);

        data
    }

    /// Returns a copy of the top value without removing it.
    ///
    /// # Panics
    ///
    /// Panics if the stack is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use linked_stack::LinkedStack;
    ///
    /// let mut stack = LinkedStack::new();
    /// stack.push(42).unwrap();
    ///
    /// assert_eq!(stack.top(), 42);
    /// assert_eq!(stack.len(), 1);
    /// ```
    #[must_use]
    pub fn top(&self) -> T
    where
        T: Clone,
    {
        match self.peek() {
            Some(value) => value.clone(),
            None => panic!("top() called on an empty stack of {}", type_name::<T>()),
        }
    }

    /// Returns a reference to the top value, or `None` if the stack is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use linked_stack::LinkedStack;
    ///
    /// let mut stack = LinkedStack::new();
    /// assert_eq!(stack.peek(), None);
    ///
    /// stack.push("Hello".to_string()).unwrap();
    /// assert_eq!(stack.peek().map(String::as_str), Some("Hello"));
    /// ```
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        self.head.map(|head| {
            // SAFETY: The head node is constructed and owned by us. The shared reference is
            // bound to the shared borrow of the stack, which prevents any mutation meanwhile.
            let node = unsafe { head.as_ref() };
            &*node.data
        })
    }

    /// Removes and drops all values, newest first.
    ///
    /// # Examples
    ///
    /// ```
    /// use linked_stack::LinkedStack;
    ///
    /// let mut stack = LinkedStack::new();
    /// stack.push(1).unwrap();
    /// stack.push(2).unwrap();
    ///
    /// stack.clear();
    ///
    /// assert!(stack.is_empty());
    /// ```
    pub fn clear(&mut self) {
        while !self.is_empty() {
            drop(self.pop());
        }
    }
}

impl<T, S: AllocationStrategy> Drop for LinkedStack<T, S> {
    fn drop(&mut self) {
        if !self.is_empty() {
            trace!(
                element_type = type_name::<T>(),
                len = self.len,
                "dropping non-empty stack"
            );
        }

        self.clear();
    }
}

impl<T, S: AllocationStrategy> fmt::Debug for LinkedStack<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedStack")
            .field("element_type", &format_args!("{}", type_name::<T>()))
            .field("strategy", &format_args!("{}", type_name::<S>()))
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}
