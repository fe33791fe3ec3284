//! A circular doubly linked list that flattens all its nodes onto a Vec for
//! storage, gaining data locality at the expense of O(n) positional access.
//! It backs both the [`Stack`](crate::Stack) and the [`Queue`](crate::Queue)
//! the tree traversals lean on.

use std::fmt;

use crate::error::{Error, Result};

/// Alias for the index of a node in the linked list's storage vec.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
struct NodeHandle(usize);

/// A node that lives in a linked list.
struct Node<T> {
    /// The value being stored. `None` only while the slot sits on the
    /// freelist.
    value: Option<T>,

    /// The index of the node previous to this one.
    prev: NodeHandle,

    /// The index of the next node in the list.
    next: NodeHandle,
}

/// Nodes are addressed by their position in a single contiguous Vec. Removed
/// slots are freelisted and reused by later pushes, and there is no
/// compaction, so a list that is drained and refilled (which is all a
/// traversal stack ever does) stops allocating once it has seen its high
/// water mark.
///
/// The list is circular: the head's `prev` is the tail, which makes both ends
/// O(1) without keeping a separate tail handle.
pub struct LinkedList<T> {
    /// The nodes in the list.
    store: Vec<Node<T>>,

    /// Entries in the list which aren't in use anymore. These will be reused.
    free: Vec<NodeHandle>,

    /// The first node in the list.
    head: Option<NodeHandle>,
}

impl<T> LinkedList<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new linked list with a specific capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            head: None,
        }
    }

    /// The length of this linked list.
    pub fn len(&self) -> usize {
        self.store.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Pushes t onto the front of the list.
    pub fn push_front(&mut self, t: T) {
        let idx = self.link(t);
        self.head = Some(idx);
    }

    /// Pushes t onto the back of the list.
    pub fn push_back(&mut self, t: T) {
        let idx = self.link(t);

        // the new node sits just before head, which in a ring is the back.
        // only an empty list has to point head at it.
        if self.head.is_none() {
            self.head = Some(idx);
        }
    }

    /// Pops the front node off the list if it exists.
    pub fn pop_front(&mut self) -> Option<T> {
        let head = self.head?;
        self.unlink(head)
    }

    /// Pops the back node off the list if it exists.
    pub fn pop_back(&mut self) -> Option<T> {
        let head = self.head?;
        let tail = self.store[head.0].prev;
        self.unlink(tail)
    }

    /// The head of this linked list.
    pub fn front(&self) -> Option<&T> {
        let head = self.head?;
        self.store[head.0].value.as_ref()
    }

    /// The tail of this linked list.
    pub fn back(&self) -> Option<&T> {
        let head = self.head?;
        self.store[self.store[head.0].prev.0].value.as_ref()
    }

    /// Walks `index` nodes from the front and returns what's there.
    pub fn get(&self, index: usize) -> Result<&T> {
        self.iter().nth(index).ok_or(Error::OutOfRange {
            index,
            len: self.len(),
        })
    }

    /// Iterates from front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            next: self.head,
            remaining: self.len(),
        }
    }

    /// Clears this linked list. Does not free the underlying buffers.
    pub fn clear(&mut self) {
        self.store.clear();
        self.free.clear();
        self.head = None;
    }

    /// Stores t in a free slot and links it in just before head. Leaves head
    /// itself alone.
    fn link(&mut self, t: T) -> NodeHandle {
        let mut n = Node {
            value: Some(t),
            prev: NodeHandle(0),
            next: NodeHandle(0),
        };

        // use the first available location in the storage vec, or infer what
        // the next location will be on push.
        let idx = self
            .free
            .pop()
            .unwrap_or_else(|| NodeHandle(self.store.len()));

        match self.head {
            Some(head) => {
                // link this node into the chain
                n.prev = self.store[head.0].prev;
                n.next = head;

                self.store[n.prev.0].next = idx;
                self.store[n.next.0].prev = idx;
            }
            None => {
                // a ring of one points at itself
                n.prev = idx;
                n.next = idx;
            }
        }

        if self.store.len() <= idx.0 {
            self.store.push(n);
        } else {
            self.store[idx.0] = n;
        }

        idx
    }

    /// Remove an arbitrary node from the list and hand back its value.
    fn unlink(&mut self, node: NodeHandle) -> Option<T> {
        if self.len() == 1 {
            // just reset head and freelist the node
            self.head = None;
        } else {
            if Some(node) == self.head {
                self.head = Some(self.store[node.0].next);
            }

            // link prev to next and next to prev so node doesn't exist in the
            // chain anymore; it'll get overwritten at some later push by
            // placing its handle on the freelist
            let prev = self.store[node.0].prev;
            let next = self.store[node.0].next;

            self.store[prev.0].next = next;
            self.store[next.0].prev = prev;
        }

        self.free.push(node);
        self.store[node.0].value.take()
    }
}

impl<T> Default for LinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for LinkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> FromIterator<T> for LinkedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = LinkedList::new();
        for t in iter {
            list.push_back(t);
        }
        list
    }
}

/// Front to back iterator over a [`LinkedList`].
pub struct Iter<'a, T> {
    list: &'a LinkedList<T>,
    next: Option<NodeHandle>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        // the ring never ends on its own, so count down instead
        if self.remaining == 0 {
            return None;
        }

        let node = &self.list.store[self.next?.0];
        self.remaining -= 1;
        self.next = Some(node.next);
        node.value.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
