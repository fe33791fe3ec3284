//! An ordered map built on an unbalanced binary search tree.
//!
//! Nothing here rebalances, so a tree fed sorted keys degenerates into a list
//! and every operation becomes O(n). Everything that walks the whole tree
//! (traversal, height, clone, drop) therefore uses an explicit [`Stack`] or
//! [`Queue`] instead of the call stack. The recursive versions are still
//! around as `*_recursive` for when the tree is known to be shallow.

mod iter;

use std::{borrow::Borrow, cmp::Ordering, fmt, mem};

use tracing::trace;

use crate::error::{Error, Result};
use crate::queue::Queue;
use crate::stack::Stack;
use crate::store::Store;

pub use iter::{InOrder, IntoIter, LevelOrder, PostOrder, PreOrder};

pub(crate) type Link<K, V> = Option<Box<Node<K, V>>>;

/// One entry in the tree. Each node owns both of its children outright.
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) left: Link<K, V>,
    pub(crate) right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V) -> Box<Self> {
        Box::new(Node {
            key,
            value,
            left: None,
            right: None,
        })
    }

    /// Consumes a node that has already had its children taken away.
    pub(crate) fn into_payload(self: Box<Self>) -> (K, V) {
        let Node { key, value, .. } = *self;
        (key, value)
    }

    fn height_recursive(&self) -> isize {
        let left = self.left.as_ref().map_or(-1, |n| n.height_recursive());
        let right = self.right.as_ref().map_or(-1, |n| n.height_recursive());
        1 + left.max(right)
    }
}

/// The order a traversal visits nodes in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    /// Left subtree, node, right subtree. Sorted by key.
    InOrder,
    /// Node, left subtree, right subtree.
    PreOrder,
    /// Left subtree, right subtree, node.
    PostOrder,
    /// Breadth first, one depth at a time, left to right.
    LevelOrder,
}

/// An ordered key-value map backed by an unbalanced binary search tree.
///
/// Every key in a node's left subtree is smaller than the node's key and
/// every key in its right subtree is larger. Inserting a key that is already
/// present overwrites its value in place, so a key is never stored twice.
pub struct OrderedMap<K, V> {
    pub(crate) root: Link<K, V>,
    pub(crate) count: usize,
}

impl<K, V> OrderedMap<K, V> {
    /// Makes a new, empty map.
    pub const fn new() -> Self {
        Self {
            root: None,
            count: 0,
        }
    }

    /// The number of entries in the map.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        release(self.root.take());
        self.count = 0;
    }

    /// The number of edges on the longest path from the root down to a leaf.
    /// A single node has height 0 and an empty map has height -1.
    ///
    /// Counts levels breadth first, so it is safe on a degenerate tree.
    pub fn height(&self) -> isize {
        let mut queue = Queue::new();
        if let Some(root) = self.root.as_deref() {
            queue.enqueue((root, 0));
        }

        let mut height = -1;
        while let Ok((node, depth)) = queue.dequeue() {
            height = height.max(depth);
            if let Some(left) = node.left.as_deref() {
                queue.enqueue((left, depth + 1));
            }
            if let Some(right) = node.right.as_deref() {
                queue.enqueue((right, depth + 1));
            }
        }

        height
    }

    /// Same answer as [`height`](Self::height), worked out recursively. Uses
    /// one stack frame per level of the tree.
    pub fn height_recursive(&self) -> isize {
        self.root.as_ref().map_or(-1, |n| n.height_recursive())
    }

    /// Iterates the entries in key order.
    pub fn iter(&self) -> InOrder<'_, K, V> {
        InOrder::new(self.root.as_deref(), self.count)
    }

    /// Same as [`iter`](Self::iter).
    pub fn in_order(&self) -> InOrder<'_, K, V> {
        self.iter()
    }

    pub fn pre_order(&self) -> PreOrder<'_, K, V> {
        PreOrder::new(self.root.as_deref(), self.count)
    }

    pub fn post_order(&self) -> PostOrder<'_, K, V> {
        PostOrder::new(self.root.as_deref(), self.count)
    }

    pub fn level_order(&self) -> LevelOrder<'_, K, V> {
        LevelOrder::new(self.root.as_deref(), self.count)
    }

    /// Collects every entry in the given order, walking the tree iteratively.
    pub fn traverse(&self, order: Order) -> Vec<(&K, &V)> {
        match order {
            Order::InOrder => self.in_order().collect(),
            Order::PreOrder => self.pre_order().collect(),
            Order::PostOrder => self.post_order().collect(),
            Order::LevelOrder => self.level_order().collect(),
        }
    }

    /// Visits every entry in the given order by recursing down the tree.
    /// Level order is done one depth at a time, which costs O(n * height).
    pub fn traverse_recursive<'a, F>(&'a self, order: Order, mut visit: F)
    where
        F: FnMut(&'a K, &'a V),
    {
        let root = &self.root;
        match order {
            Order::InOrder => in_order_recursive(root, &mut visit),
            Order::PreOrder => pre_order_recursive(root, &mut visit),
            Order::PostOrder => post_order_recursive(root, &mut visit),
            Order::LevelOrder => {
                for depth in 0..=self.height_recursive() {
                    level_recursive(root, depth, &mut visit);
                }
            }
        }
    }

    /// Every entry, sorted by key.
    pub fn items_in_order(&self) -> Vec<(&K, &V)> {
        self.traverse(Order::InOrder)
    }

    /// The keys, in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// The values, in key order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

impl<K, V> OrderedMap<K, V>
where
    K: Ord,
{
    /// Inserts a new entry, returning the previous value if the key was
    /// already present. A repeated key keeps its node and its place in the
    /// tree; only the value changes.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut slot = &mut self.root;

        while let Some(node) = slot {
            match key.cmp(&node.key) {
                Ordering::Equal => {
                    return Some(mem::replace(&mut node.value, value))
                }
                Ordering::Less => slot = &mut node.left,
                Ordering::Greater => slot = &mut node.right,
            }
        }

        *slot = Some(Node::new(key, value));
        self.count += 1;
        None
    }

    /// Looks up the value stored at a key. A miss is just `None`.
    pub fn search<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.root.as_deref();

        while let Some(node) = cur {
            match key.cmp(node.key.borrow()) {
                Ordering::Equal => return Some(&node.value),
                Ordering::Less => cur = node.left.as_deref(),
                Ordering::Greater => cur = node.right.as_deref(),
            }
        }

        None
    }

    pub fn search_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.root.as_deref_mut();

        while let Some(node) = cur {
            match key.cmp(node.key.borrow()) {
                Ordering::Equal => return Some(&mut node.value),
                Ordering::Less => cur = node.left.as_deref_mut(),
                Ordering::Greater => cur = node.right.as_deref_mut(),
            }
        }

        None
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search(key).is_some()
    }

    /// Removes a key, handing back the entry that was stored there.
    ///
    /// One descent finds the slot that owns the node, so the parent never has
    /// to be searched for separately. If the node has two children its key
    /// and value are replaced by those of its in-order successor (the
    /// leftmost node of its right subtree), and the successor is unlinked
    /// instead.
    pub fn delete<Q>(&mut self, key: &Q) -> Result<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut slot = &mut self.root;

        // decide with a shared peek first so the slot is free to hand out
        // once the key matches
        loop {
            let ord = match slot.as_deref() {
                Some(node) => key.cmp(node.key.borrow()),
                None => return Err(Error::NotFound),
            };

            if ord == Ordering::Equal {
                break;
            }

            slot = match slot {
                Some(node) => {
                    if ord == Ordering::Less {
                        &mut node.left
                    } else {
                        &mut node.right
                    }
                }
                None => return Err(Error::NotFound),
            };
        }

        let Some(mut node) = slot.take() else {
            return Err(Error::NotFound);
        };

        let payload = match (node.left.take(), node.right.take()) {
            (None, None) => {
                trace!(case = "leaf", "deleted node");
                node.into_payload()
            }
            (Some(child), None) | (None, Some(child)) => {
                trace!(case = "one_child", "deleted node");
                *slot = Some(child);
                node.into_payload()
            }
            (Some(left), Some(right)) => {
                trace!(case = "two_children", "deleted node");
                let (successor, rest) = detach_min(right);
                node.left = Some(left);
                node.right = rest;

                let (next_key, next_value) = successor.into_payload();
                let payload = (
                    mem::replace(&mut node.key, next_key),
                    mem::replace(&mut node.value, next_value),
                );

                *slot = Some(node);
                payload
            }
        };

        self.count -= 1;
        Ok(payload)
    }

    /// Walks the whole tree checking the ordering invariant and the count.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let mut stack: Stack<(&Node<K, V>, Option<&K>, Option<&K>)> =
            Stack::new();
        if let Some(root) = self.root.as_deref() {
            stack.push((root, None, None));
        }

        let mut reachable = 0;
        while let Ok((node, lower, upper)) = stack.pop() {
            reachable += 1;

            if let Some(lower) = lower {
                assert!(&node.key > lower, "right subtree key out of order");
            }
            if let Some(upper) = upper {
                assert!(&node.key < upper, "left subtree key out of order");
            }

            if let Some(left) = node.left.as_deref() {
                stack.push((left, lower, Some(&node.key)));
            }
            if let Some(right) = node.right.as_deref() {
                stack.push((right, Some(&node.key), upper));
            }
        }

        assert_eq!(self.count, reachable, "count must match reachable nodes");
        assert_eq!(self.count, self.iter().count());
    }
}

/// Splits the leftmost node off `subtree`, returning it along with what is
/// left of the subtree. The leftmost node's right child takes its place.
fn detach_min<K, V>(
    mut subtree: Box<Node<K, V>>,
) -> (Box<Node<K, V>>, Link<K, V>) {
    let mut spine = Stack::new();
    while let Some(left) = subtree.left.take() {
        spine.push(subtree);
        subtree = left;
    }

    let mut rest = subtree.right.take();
    while let Ok(mut parent) = spine.pop() {
        parent.left = rest;
        rest = Some(parent);
    }

    (subtree, rest)
}

/// Tears a subtree down one node at a time so dropping a degenerate tree
/// can't blow the call stack.
fn release<K, V>(root: Link<K, V>) {
    let mut stack = Stack::new();
    if let Some(root) = root {
        stack.push(root);
    }

    while let Ok(mut node) = stack.pop() {
        if let Some(left) = node.left.take() {
            stack.push(left);
        }
        if let Some(right) = node.right.take() {
            stack.push(right);
        }
    }
}

fn in_order_recursive<'a, K, V, F>(link: &'a Link<K, V>, visit: &mut F)
where
    F: FnMut(&'a K, &'a V),
{
    if let Some(node) = link {
        in_order_recursive(&node.left, visit);
        visit(&node.key, &node.value);
        in_order_recursive(&node.right, visit);
    }
}

fn pre_order_recursive<'a, K, V, F>(link: &'a Link<K, V>, visit: &mut F)
where
    F: FnMut(&'a K, &'a V),
{
    if let Some(node) = link {
        visit(&node.key, &node.value);
        pre_order_recursive(&node.left, visit);
        pre_order_recursive(&node.right, visit);
    }
}

fn post_order_recursive<'a, K, V, F>(link: &'a Link<K, V>, visit: &mut F)
where
    F: FnMut(&'a K, &'a V),
{
    if let Some(node) = link {
        post_order_recursive(&node.left, visit);
        post_order_recursive(&node.right, visit);
        visit(&node.key, &node.value);
    }
}

/// Visits the nodes exactly `depth` edges below `link`, left to right.
fn level_recursive<'a, K, V, F>(link: &'a Link<K, V>, depth: isize, visit: &mut F)
where
    F: FnMut(&'a K, &'a V),
{
    if let Some(node) = link {
        if depth == 0 {
            visit(&node.key, &node.value);
        } else {
            level_recursive(&node.left, depth - 1, visit);
            level_recursive(&node.right, depth - 1, visit);
        }
    }
}

impl<K, V> Drop for OrderedMap<K, V> {
    fn drop(&mut self) {
        release(self.root.take());
    }
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for OrderedMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    /// Reinserting in pre-order rebuilds exactly the same shape.
    fn clone(&self) -> Self {
        self.pre_order()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K, V> fmt::Debug for OrderedMap<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> FromIterator<(K, V)> for OrderedMap<K, V>
where
    K: Ord,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        map.extend(iter);
        map
    }
}

impl<K, V> Extend<(K, V)> for OrderedMap<K, V>
where
    K: Ord,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a OrderedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = InOrder<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(mut self) -> Self::IntoIter {
        let count = mem::replace(&mut self.count, 0);
        IntoIter::new(self.root.take(), count)
    }
}

impl<K, V> Store<K, V> for OrderedMap<K, V>
where
    K: Ord,
{
    fn set(&mut self, k: K, v: V) -> Option<V> {
        self.insert(k, v)
    }

    fn get<'a>(&'a self, k: &K) -> Result<&'a V> {
        self.search(k).ok_or(Error::NotFound)
    }

    fn get_mut<'a>(&'a mut self, k: &K) -> Result<&'a mut V> {
        self.search_mut(k).ok_or(Error::NotFound)
    }

    fn contains(&self, k: &K) -> bool {
        OrderedMap::contains(self, k)
    }

    fn delete(&mut self, k: &K) -> Result<V> {
        OrderedMap::delete(self, k).map(|(_, v)| v)
    }

    fn clear(&mut self) {
        OrderedMap::clear(self)
    }

    fn len(&self) -> usize {
        self.count
    }
}
