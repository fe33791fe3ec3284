//! FIFO adapter over [`LinkedList`]: items go in at the back and come out of
//! the front.

use std::fmt;

use crate::error::{Error, Result};
use crate::linked_list::LinkedList;

pub struct Queue<T> {
    list: LinkedList<T>,
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self {
            list: LinkedList::new(),
        }
    }

    /// Makes a queue that can hold `capacity` items before it allocates.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            list: LinkedList::with_capacity(capacity),
        }
    }

    /// Puts an item at the back of the queue.
    pub fn enqueue(&mut self, item: T) {
        self.list.push_back(item);
    }

    /// Takes the front item out of the queue, or [`Error::Empty`].
    pub fn dequeue(&mut self) -> Result<T> {
        self.list.pop_front().ok_or(Error::Empty)
    }

    /// The front item, left where it is.
    pub fn front(&self) -> Option<&T> {
        self.list.front()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("len", &self.len())
            .field("front", &self.front())
            .finish()
    }
}
