//! Lazy, non-recursive traversals. The depth first orders keep their pending
//! nodes on a [`Stack`]; level order keeps them on a [`Queue`].

use std::ptr;

use super::{Link, Node};
use crate::queue::Queue;
use crate::stack::Stack;

/// Left subtree, node, right subtree: the entries in key order.
pub struct InOrder<'a, K, V> {
    stack: Stack<&'a Node<K, V>>,
    current: Option<&'a Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> InOrder<'a, K, V> {
    pub(crate) fn new(root: Option<&'a Node<K, V>>, len: usize) -> Self {
        Self {
            stack: Stack::new(),
            current: root,
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for InOrder<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        // run down the left spine, then take the deepest node we passed
        while let Some(node) = self.current {
            self.stack.push(node);
            self.current = node.left.as_deref();
        }

        let node = self.stack.pop().ok()?;
        self.current = node.right.as_deref();
        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Node, left subtree, right subtree.
pub struct PreOrder<'a, K, V> {
    stack: Stack<&'a Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> PreOrder<'a, K, V> {
    pub(crate) fn new(root: Option<&'a Node<K, V>>, len: usize) -> Self {
        let mut stack = Stack::new();
        if let Some(root) = root {
            stack.push(root);
        }

        Self {
            stack,
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for PreOrder<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop().ok()?;

        // right goes in first so left comes out first
        if let Some(right) = node.right.as_deref() {
            self.stack.push(right);
        }
        if let Some(left) = node.left.as_deref() {
            self.stack.push(left);
        }

        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Left subtree, right subtree, node.
///
/// A node can only be emitted once its right subtree is done. The node on top
/// of the stack has already had its left side handled, so it is emitted when
/// it has no right child or when the right child was the last thing emitted;
/// otherwise the walk heads into the right child first.
pub struct PostOrder<'a, K, V> {
    stack: Stack<&'a Node<K, V>>,
    current: Option<&'a Node<K, V>>,
    last: Option<&'a Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> PostOrder<'a, K, V> {
    pub(crate) fn new(root: Option<&'a Node<K, V>>, len: usize) -> Self {
        Self {
            stack: Stack::new(),
            current: root,
            last: None,
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for PostOrder<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some(node) = self.current {
                self.stack.push(node);
                self.current = node.left.as_deref();
            }

            let top = *self.stack.peek()?;
            let right_done = match (top.right.as_deref(), self.last) {
                (Some(right), Some(last)) => ptr::eq(right, last),
                (Some(_), None) => false,
                (None, _) => true,
            };

            if right_done {
                let node = self.stack.pop().ok()?;
                self.last = Some(node);
                self.remaining = self.remaining.saturating_sub(1);
                return Some((&node.key, &node.value));
            }

            self.current = top.right.as_deref();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Breadth first: the root, then everything one edge down, and so on, each
/// level left to right.
pub struct LevelOrder<'a, K, V> {
    queue: Queue<&'a Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> LevelOrder<'a, K, V> {
    pub(crate) fn new(root: Option<&'a Node<K, V>>, len: usize) -> Self {
        let mut queue = Queue::new();
        if let Some(root) = root {
            queue.enqueue(root);
        }

        Self {
            queue,
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for LevelOrder<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.dequeue().ok()?;

        if let Some(left) = node.left.as_deref() {
            self.queue.enqueue(left);
        }
        if let Some(right) = node.right.as_deref() {
            self.queue.enqueue(right);
        }

        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Owning in-order iterator. Takes the tree apart as it goes.
pub struct IntoIter<K, V> {
    stack: Stack<Box<Node<K, V>>>,
    remaining: usize,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(root: Link<K, V>, len: usize) -> Self {
        let mut iter = Self {
            stack: Stack::new(),
            remaining: len,
        };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut link: Link<K, V>) {
        while let Some(mut node) = link {
            link = node.left.take();
            self.stack.push(node);
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let mut node = self.stack.pop().ok()?;
        let right = node.right.take();
        self.push_left_spine(right);

        self.remaining = self.remaining.saturating_sub(1);
        Some(node.into_payload())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> Drop for IntoIter<K, V> {
    fn drop(&mut self) {
        // drain instead of letting the boxes drop recursively
        for _ in self.by_ref() {}
    }
}
