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

/// A fixed-capacity hash map backed by [`HashTable`].
///
/// `HashMap<K, V, S>` stores `(K, V)` records in a single Swiss table and
/// hashes keys with the `BuildHasher` it owns. The capacity is chosen at
/// construction and never changes: inserting a new key into a full map
/// returns [`Error::TableFull`] instead of reallocating.
///
/// Removed keys leave tombstones that are reused by later inserts and can
/// be cleared with [`compact`](HashMap::compact).
///
/// # Examples
///
/// ```rust
/// # use stable_swiss::Error;
/// # use stable_swiss::HashMap;
/// #
/// let mut map: HashMap<&str, u32> = HashMap::with_capacity(8);
/// for (i, name) in ["a", "b", "c", "d", "e", "f", "g"].into_iter().enumerate() {
///     map.insert(name, i as u32).unwrap();
/// }
/// assert_eq!(map.insert("h", 7), Err(Error::TableFull));
///
/// map.remove(&"a");
/// map.compact().unwrap();
/// assert_eq!(map.insert("h", 7), Ok(None));
/// ```
#[derive(Clone)]
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    table: HashTable<(K, V)>,
    hash_builder: S,
}

impl<K, V, S> Debug for HashMap<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates an empty map with the minimum capacity (8 slots, 7 entries)
    /// and the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use stable_swiss::HashMap;
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
    /// let map: HashMap<i32, String, _> = HashMap::with_hasher(SimpleHasher);
    /// assert!(map.is_empty());
    /// assert_eq!(map.effective_capacity(), 7);
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(0, hash_builder)
    }

    /// Creates an empty map sized from `capacity` with the given hasher
    /// builder.
    ///
    /// The slot count is `capacity` rounded up to a power of two (at least
    /// 8), and the map holds at most 7/8 of that.
    ///
    /// # Panics
    ///
    /// Panics if the slot count overflows. See
    /// [`try_with_capacity_and_hasher`](HashMap::try_with_capacity_and_hasher).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use stable_swiss::HashMap;
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
    /// let map: HashMap<i32, String, _> = HashMap::with_capacity_and_hasher(100, SimpleHasher);
    /// assert_eq!(map.capacity(), 128);
    /// assert_eq!(map.effective_capacity(), 112);
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            hash_builder,
        }
    }

    /// Fallible version of
    /// [`with_capacity_and_hasher`](HashMap::with_capacity_and_hasher).
    pub fn try_with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Result<Self, Error> {
        Ok(Self {
            table: HashTable::try_with_capacity(capacity)?,
            hash_builder,
        })
    }

    /// Returns how many slots fit in `bytes` of table storage for this
    /// key/value pair.
    ///
    /// Useful for sizing a map from a memory budget:
    ///
    /// ```rust
    /// # use stable_swiss::HashMap;
    /// #
    /// let slots = <HashMap<u64, u64>>::capacity_for_bytes(64 * 1024);
    /// let map: HashMap<u64, u64> = HashMap::with_capacity(slots);
    /// assert!(map.capacity() >= slots);
    /// ```
    pub fn capacity_for_bytes(bytes: usize) -> usize {
        HashTable::<(K, V)>::capacity_for_bytes(bytes)
    }

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the total number of slots.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the maximum number of entries the map can hold.
    pub fn effective_capacity(&self) -> usize {
        self.table.effective_capacity()
    }

    /// Returns the number of tombstones awaiting compaction.
    pub fn tombstones(&self) -> usize {
        self.table.tombstones()
    }

    /// Returns `true` if inserting a new key would fail with
    /// [`Error::TableFull`].
    pub fn is_full(&self) -> bool {
        self.table.is_full()
    }

    /// Returns a reference to the map's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns a snapshot of the map's counters.
    pub fn stats(&self) -> Stats {
        self.table.stats()
    }

    /// Computes the probe-length distribution of the stored keys.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self) -> ProbeHistogram {
        let hash_builder = &self.hash_builder;
        self.table
            .probe_histogram(|(k, _)| hash_builder.hash_one(k))
    }

    /// Removes every entry, keeping the allocation and clearing all
    /// tombstones.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stable_swiss::HashMap;
    /// #
    /// let mut map: HashMap<i32, &str> = HashMap::with_capacity(16);
    /// map.insert(1, "a").unwrap();
    /// map.insert(2, "b").unwrap();
    /// map.remove(&1);
    ///
    /// map.reset();
    /// assert!(map.is_empty());
    /// assert_eq!(map.tombstones(), 0);
    /// assert_eq!(map.capacity(), 16);
    /// ```
    #[doc(alias = "clear")]
    pub fn reset(&mut self) {
        self.table.reset();
    }

    /// Reclaims every tombstone in place.
    ///
    /// Each stored key is rehashed with the map's hasher builder. Entries
    /// and their values are unchanged, only their slots move.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Inconsistent`] if the table's bookkeeping is
    /// corrupt.
    pub fn compact(&mut self) -> Result<(), Error> {
        let hash_builder = &self.hash_builder;
        self.table.compact(|(k, _)| hash_builder.hash_one(k))
    }

    /// Inserts a key-value pair, replacing the value of an existing key.
    ///
    /// Returns the previous value if the key was present. The stored key is
    /// kept, not replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableFull`] if the map is at its effective capacity.
    /// This is checked before the key is looked up, so it also applies to
    /// keys that are already present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use stable_swiss::HashMap;
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
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// assert_eq!(map.insert(37, "a"), Ok(None));
    /// assert_eq!(map.insert(37, "b"), Ok(Some("a")));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, Error> {
        let hash = self.hash_builder.hash_one(&key);
        match self.table.entry(hash, |(k, _)| k == &key)? {
            TableEntry::Occupied(mut entry) => {
                let old_value = core::mem::replace(&mut entry.get_mut().1, value);
                Ok(Some(old_value))
            }
            TableEntry::Vacant(entry) => {
                entry.insert((key, value));
                Ok(None)
            }
        }
    }

    /// Inserts a key-value pair only if the key is absent.
    ///
    /// Returns `true` if the pair was inserted and `false` if the key was
    /// already present, in which case the stored value is untouched.
    ///
    /// # Errors
    ///
    /// Same as [`insert`](HashMap::insert).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stable_swiss::HashMap;
    /// #
    /// let mut map: HashMap<u8, &str> = HashMap::new();
    /// assert_eq!(map.insert_if_absent(1, "first"), Ok(true));
    /// assert_eq!(map.insert_if_absent(1, "second"), Ok(false));
    /// assert_eq!(map.get(&1), Some(&"first"));
    /// ```
    pub fn insert_if_absent(&mut self, key: K, value: V) -> Result<bool, Error> {
        let hash = self.hash_builder.hash_one(&key);
        match self.table.entry(hash, |(k, _)| k == &key)? {
            TableEntry::Occupied(_) => Ok(false),
            TableEntry::Vacant(entry) => {
                entry.insert((key, value));
                Ok(true)
            }
        }
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stable_swiss::HashMap;
    /// #
    /// let mut map: HashMap<i32, &str> = HashMap::new();
    /// map.insert(1, "a").unwrap();
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        let hash = self.hash_builder.hash_one(key);
        self.table.find(hash, |(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns the stored key and value for `key`.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let hash = self.hash_builder.hash_one(key);
        self.table.find(hash, |(k, _)| k == key).map(|(k, v)| (k, v))
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find_mut(hash, |(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Returns `true` if the map contains the key.
    pub fn contains_key(&self, key: &K) -> bool {
        let hash = self.hash_builder.hash_one(key);
        self.table.find(hash, |(k, _)| k == key).is_some()
    }

    /// Removes a key, returning its value if it was present.
    ///
    /// The freed slot becomes a tombstone.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stable_swiss::HashMap;
    /// #
    /// let mut map: HashMap<i32, &str> = HashMap::new();
    /// map.insert(1, "a").unwrap();
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// assert_eq!(map.tombstones(), 1);
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes a key, returning the stored key and value if it was present.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let hash = self.hash_builder.hash_one(key);
        self.table.remove(hash, |(k, _)| k == key)
    }

    /// Gets the entry for `key` for in-place manipulation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableFull`] when the map is at its effective
    /// capacity, whether or not `key` is present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stable_swiss::HashMap;
    /// #
    /// let mut counts: HashMap<&str, u32> = HashMap::with_capacity(16);
    /// for word in ["a", "b", "a", "c", "a"] {
    ///     *counts.entry(word).unwrap().or_insert(0) += 1;
    /// }
    /// assert_eq!(counts.get(&"a"), Some(&3));
    /// ```
    pub fn entry(&mut self, key: K) -> Result<Entry<'_, K, V>, Error> {
        let hash = self.hash_builder.hash_one(&key);
        Ok(match self.table.entry(hash, |(k, _)| k == &key)? {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry { entry }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry { entry, key }),
        })
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Returns an iterator over the key-value pairs, in arbitrary order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the keys, in arbitrary order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values, in arbitrary order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates an empty map with the minimum capacity and a default hasher
    /// builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use stable_swiss::HashMap;
    /// #
    /// # #[derive(Default)]
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, SimpleHasher> = HashMap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates an empty map sized from `capacity` with a default hasher
    /// builder.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A view into a single entry in the map, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashMap`].
///
/// [`entry`]: HashMap::entry
pub enum Entry<'a, K, V> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V>),
}

impl<'a, K, V> Entry<'a, K, V> {
    /// Inserts a default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V> Entry<'a, K, V>
where
    V: Default,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the map.
///
/// A slot has already been reserved, so inserting cannot fail.
pub struct VacantEntry<'a, K, V> {
    entry: crate::hash_table::VacantEntry<'a, (K, V)>,
    key: K,
}

impl<'a, K, V> VacantEntry<'a, K, V> {
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value into the map and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        &mut self.entry.insert((self.key, value)).1
    }
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, K, V> {
    entry: crate::hash_table::OccupiedEntry<'a, (K, V)>,
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.entry.get().0
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.entry.get().1
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.entry.get_mut().1
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.entry.into_mut().1
    }

    /// Replaces the value in the entry and returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(&mut self.entry.get_mut().1, value)
    }

    /// Removes the entry from the map, leaving a tombstone, and returns the
    /// value.
    pub fn remove(self) -> V {
        self.entry.remove().1
    }

    /// Removes the entry from the map and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.entry.remove()
    }
}

/// An iterator over the key-value pairs of a `HashMap`.
pub struct Iter<'a, K, V> {
    inner: crate::hash_table::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// An iterator over the keys of a `HashMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// An iterator over the values of a `HashMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}
