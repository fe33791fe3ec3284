use crate::error::Result;

/// Describes what a key-value store is. Both a single [`OrderedMap`] and a
/// whole [`ShardTable`] are stores, so code that only needs to put things in
/// and take them out can be generic over which one it gets.
///
/// [`OrderedMap`]: crate::OrderedMap
/// [`ShardTable`]: crate::ShardTable
pub trait Store<K, V>
where
    K: Ord,
{
    /// Puts a value into the store. If the key already had a value it is
    /// replaced in place and handed back, and the length doesn't change.
    fn set(&mut self, k: K, v: V) -> Option<V>;

    /// Gets the value stored at a key, or [`Error::NotFound`].
    ///
    /// [`Error::NotFound`]: crate::Error::NotFound
    fn get<'a>(&'a self, k: &K) -> Result<&'a V>;

    /// Gets a mutable reference to the value stored at a key.
    fn get_mut<'a>(&'a mut self, k: &K) -> Result<&'a mut V>;

    /// Whether anything is stored at this key.
    fn contains(&self, k: &K) -> bool;

    /// Takes a key out of the store, returning its value. A miss leaves the
    /// store exactly as it was.
    fn delete(&mut self, k: &K) -> Result<V>;

    /// Empties the store.
    fn clear(&mut self);

    /// The number of entries stored right now.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
