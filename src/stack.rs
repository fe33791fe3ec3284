//! LIFO adapter over [`LinkedList`]: the top of the stack is the front of the
//! list.

use std::fmt;

use crate::error::{Error, Result};
use crate::linked_list::LinkedList;

pub struct Stack<T> {
    list: LinkedList<T>,
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Self {
            list: LinkedList::new(),
        }
    }

    /// Makes a stack that can hold `capacity` items before it allocates.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            list: LinkedList::with_capacity(capacity),
        }
    }

    /// Puts an item on top of the stack.
    pub fn push(&mut self, item: T) {
        self.list.push_front(item);
    }

    /// Takes the top item off the stack, or [`Error::Empty`].
    pub fn pop(&mut self) -> Result<T> {
        self.list.pop_front().ok_or(Error::Empty)
    }

    /// The top item, left where it is.
    pub fn peek(&self) -> Option<&T> {
        self.list.front()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Stack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("len", &self.len())
            .field("top", &self.peek())
            .finish()
    }
}
