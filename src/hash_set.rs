use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;

use crate::DefaultHashBuilder;
use crate::error::Error;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;
#[cfg(feature = "stats")]
use crate::hash_table::ProbeHistogram;
use crate::hash_table::Stats;

/// A fixed-capacity hash set backed by [`HashTable`].
///
/// `HashSet<T, S>` stores values directly in the table's slots and hashes
/// them with the `BuildHasher` it owns. Like [`HashMap`](crate::HashMap) it
/// never grows: inserting a new value into a full set returns
/// [`Error::TableFull`].
#[derive(Clone)]
pub struct HashSet<T, S = DefaultHashBuilder> {
    table: HashTable<T>,
    hash_builder: S,
}

impl<T, S> PartialEq for HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }
}

impl<T, S> Eq for HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
}

impl<T, S> Debug for HashSet<T, S>
where
    T: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S> HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Creates an empty set with the minimum capacity (8 slots, 7 values)
    /// and the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use stable_swiss::HashSet;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let set: HashSet<i32, _> = HashSet::with_hasher(SimpleHasher);
    /// assert!(set.is_empty());
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(0, hash_builder)
    }

    /// Creates an empty set sized from `capacity` with the given hasher
    /// builder.
    ///
    /// # Panics
    ///
    /// Panics if the slot count overflows. See
    /// [`try_with_capacity_and_hasher`](HashSet::try_with_capacity_and_hasher).
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            hash_builder,
        }
    }

    /// Fallible version of
    /// [`with_capacity_and_hasher`](HashSet::with_capacity_and_hasher).
    pub fn try_with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Result<Self, Error> {
        Ok(Self {
            table: HashTable::try_with_capacity(capacity)?,
            hash_builder,
        })
    }

    /// Returns how many slots fit in `bytes` of table storage for this value
    /// type.
    pub fn capacity_for_bytes(bytes: usize) -> usize {
        HashTable::<T>::capacity_for_bytes(bytes)
    }

    /// Returns the number of values in the set.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set contains no values.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the total number of slots.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the maximum number of values the set can hold.
    pub fn effective_capacity(&self) -> usize {
        self.table.effective_capacity()
    }

    /// Returns the number of tombstones awaiting compaction.
    pub fn tombstones(&self) -> usize {
        self.table.tombstones()
    }

    /// Returns `true` if inserting a new value would fail with
    /// [`Error::TableFull`].
    pub fn is_full(&self) -> bool {
        self.table.is_full()
    }

    /// Returns a reference to the set's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns a snapshot of the set's counters.
    pub fn stats(&self) -> Stats {
        self.table.stats()
    }

    /// Computes the probe-length distribution of the stored values.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self) -> ProbeHistogram {
        let hash_builder = &self.hash_builder;
        self.table.probe_histogram(|v| hash_builder.hash_one(v))
    }

    /// Removes every value, keeping the allocation and clearing all
    /// tombstones.
    #[doc(alias = "clear")]
    pub fn reset(&mut self) {
        self.table.reset();
    }

    /// Reclaims every tombstone in place, rehashing each value with the
    /// set's hasher builder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Inconsistent`] if the table's bookkeeping is
    /// corrupt.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stable_swiss::HashSet;
    /// #
    /// let mut set: HashSet<u32> = HashSet::with_capacity(64);
    /// for i in 0..50 {
    ///     set.insert(i).unwrap();
    /// }
    /// for i in 0..25 {
    ///     set.remove(&i);
    /// }
    /// assert_eq!(set.tombstones(), 25);
    ///
    /// set.compact().unwrap();
    /// assert_eq!(set.tombstones(), 0);
    /// assert!(set.contains(&30));
    /// ```
    pub fn compact(&mut self) -> Result<(), Error> {
        let hash_builder = &self.hash_builder;
        self.table.compact(|v| hash_builder.hash_one(v))
    }

    /// Adds a value if it is not already present.
    ///
    /// Returns `true` if the value was added. An equal value already in the
    /// set is left untouched and `value` is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableFull`] if the set is at its effective capacity,
    /// even when the value is already present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use stable_swiss::HashSet;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut set = HashSet::with_hasher(SimpleHasher);
    /// assert_eq!(set.insert(1), Ok(true));
    /// assert_eq!(set.insert(1), Ok(false));
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn insert(&mut self, value: T) -> Result<bool, Error> {
        let hash = self.hash_builder.hash_one(&value);
        match self.table.entry(hash, |v| v == &value)? {
            TableEntry::Occupied(_) => Ok(false),
            TableEntry::Vacant(entry) => {
                entry.insert(value);
                Ok(true)
            }
        }
    }

    /// Adds a value, replacing an equal value already in the set.
    ///
    /// Returns the replaced value, if any.
    ///
    /// # Errors
    ///
    /// Same as [`insert`](HashSet::insert).
    pub fn replace(&mut self, value: T) -> Result<Option<T>, Error> {
        let hash = self.hash_builder.hash_one(&value);
        match self.table.entry(hash, |v| v == &value)? {
            TableEntry::Occupied(mut entry) => Ok(Some(entry.insert(value))),
            TableEntry::Vacant(entry) => {
                entry.insert(value);
                Ok(None)
            }
        }
    }

    /// Returns `true` if the set contains the value.
    pub fn contains(&self, value: &T) -> bool {
        self.get(value).is_some()
    }

    /// Returns a reference to the stored value equal to `value`.
    pub fn get(&self, value: &T) -> Option<&T> {
        let hash = self.hash_builder.hash_one(value);
        self.table.find(hash, |v| v == value)
    }

    /// Removes a value, returning whether it was present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stable_swiss::HashSet;
    /// #
    /// let mut set: HashSet<&str> = HashSet::new();
    /// set.insert("a").unwrap();
    /// assert!(set.remove(&"a"));
    /// assert!(!set.remove(&"a"));
    /// ```
    pub fn remove(&mut self, value: &T) -> bool {
        self.take(value).is_some()
    }

    /// Removes and returns the stored value equal to `value`.
    pub fn take(&mut self, value: &T) -> Option<T> {
        let hash = self.hash_builder.hash_one(value);
        self.table.remove(hash, |v| v == value)
    }
}

impl<T, S> HashSet<T, S> {
    /// Returns an iterator over the values, in arbitrary order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter(),
        }
    }
}

impl<T, S> HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates an empty set with the minimum capacity and a default hasher
    /// builder.
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates an empty set sized from `capacity` with a default hasher
    /// builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stable_swiss::HashSet;
    /// #
    /// let set: HashSet<u64> = HashSet::with_capacity(1000);
    /// assert_eq!(set.capacity(), 1024);
    /// assert_eq!(set.effective_capacity(), 896);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<T, S> Default for HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T, S> IntoIterator for &'a HashSet<T, S> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the values of a `HashSet`.
pub struct Iter<'a, T> {
    inner: crate::hash_table::Iter<'a, T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}
