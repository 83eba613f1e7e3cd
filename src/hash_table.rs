//! The fixed-capacity table engine.
//!
//! [`HashTable<T>`] stores records of type `T` in groups of eight slots and
//! never reallocates after construction. Like a raw table, it does not hash
//! anything itself: every operation takes the record's hash and an equality
//! predicate, and compaction takes a function that recomputes a record's
//! hash. [`HashMap`](crate::HashMap) and [`HashSet`](crate::HashSet) wrap it
//! with a `BuildHasher`.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::alloc::Layout;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::mem::MaybeUninit;

use crate::control::BitMask;
use crate::control::ControlWord;
use crate::control::DELETED;
use crate::control::EMPTY;
use crate::control::GROUP_SIZE;
use crate::control::is_full;
use crate::error::Error;
use crate::probe::ProbeSeq;
use crate::probe::split_hash;

#[cold]
#[inline(never)]
fn capacity_overflow() -> ! {
    panic!("capacity overflow")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Capacity {
    slots: usize,
}

impl TryFrom<usize> for Capacity {
    type Error = Error;

    fn try_from(hint: usize) -> Result<Self, Error> {
        let slots = hint
            .max(GROUP_SIZE)
            .checked_next_power_of_two()
            .ok_or(Error::CapacityOverflow)?;
        Ok(Capacity { slots })
    }
}

impl Capacity {
    #[inline(always)]
    fn group_count(self) -> usize {
        self.slots / GROUP_SIZE
    }

    /// The insert ceiling: 87.5% of the slots. `slots` is a multiple of 8, so
    /// this is exactly `slots * 7 / 8` without the overflow.
    #[inline(always)]
    fn effective(self) -> usize {
        self.slots / 8 * 7
    }
}

/// Eight control bytes followed by eight slots.
///
/// A slot is initialized exactly when its control byte is a full tag.
#[repr(C, align(8))]
struct Group<T> {
    ctrl: [u8; GROUP_SIZE],
    slots: [MaybeUninit<T>; GROUP_SIZE],
}

impl<T> Group<T> {
    fn new() -> Self {
        Self {
            ctrl: [EMPTY; GROUP_SIZE],
            slots: [const { MaybeUninit::uninit() }; GROUP_SIZE],
        }
    }

    #[inline(always)]
    fn control(&self) -> ControlWord {
        ControlWord::load(&self.ctrl)
    }

    /// # Safety
    ///
    /// The slot at `lane` must be initialized: its tag is full, or it is
    /// marked for relocation during compaction.
    #[inline(always)]
    unsafe fn value(&self, lane: usize) -> &T {
        // SAFETY: Caller guarantees the slot is initialized.
        unsafe { self.slots[lane].assume_init_ref() }
    }

    /// # Safety
    ///
    /// Same as [`Group::value`].
    #[inline(always)]
    unsafe fn value_mut(&mut self, lane: usize) -> &mut T {
        // SAFETY: Caller guarantees the slot is initialized.
        unsafe { self.slots[lane].assume_init_mut() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SlotIndex {
    group: usize,
    lane: usize,
}

impl SlotIndex {
    #[inline(always)]
    fn from_absolute(index: usize) -> Self {
        Self {
            group: index / GROUP_SIZE,
            lane: index % GROUP_SIZE,
        }
    }

    #[inline(always)]
    fn absolute(self) -> usize {
        self.group * GROUP_SIZE + self.lane
    }
}

/// How [`HashTable::insert`] treats a record that is already present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertMode {
    /// Leave the stored record alone and hand the new one back.
    IfAbsent,
    /// Replace the stored record and hand the old one back.
    Upsert,
}

/// The outcome of a successful [`HashTable::insert`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inserted<T> {
    /// The record was not present and now occupies a new slot.
    New,
    /// The record was present and has been replaced. Holds the old record.
    Replaced(T),
    /// The record was present and [`InsertMode::IfAbsent`] was requested.
    /// Holds the record that was passed in.
    Rejected(T),
}

impl<T> Inserted<T> {
    /// Returns `true` if a new slot was filled.
    pub fn is_new(&self) -> bool {
        matches!(self, Inserted::New)
    }
}

/// Point-in-time counters for a table.
///
/// Ratios are computed from the counters when the snapshot is taken and are
/// `0.0` when their denominator is zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stats {
    /// Number of live entries.
    pub size: usize,
    /// Number of removed entries whose slots have not been reclaimed yet.
    pub tombstones: usize,
    /// `tombstones / capacity`.
    pub tombstones_capacity_ratio: f32,
    /// `tombstones / size`.
    pub tombstones_size_ratio: f32,
    /// Total number of slots.
    pub capacity: usize,
    /// Maximum number of live entries.
    pub effective_capacity: usize,
    /// Number of eight-slot groups.
    pub group_count: usize,
    /// Bytes owned by the group array.
    pub allocation_bytes: usize,
}

impl Stats {
    /// Pretty-print the statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Table Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% of effective capacity)",
            self.size,
            self.effective_capacity,
            if self.effective_capacity == 0 {
                0.0
            } else {
                self.size as f64 / self.effective_capacity as f64 * 100.0
            }
        );
        println!(
            "Tombstones: {} ({:.2}% of capacity, {:.2}% of size)",
            self.tombstones,
            self.tombstones_capacity_ratio * 100.0,
            self.tombstones_size_ratio * 100.0
        );
        println!(
            "Layout: {} slots in {} groups, {} bytes",
            self.capacity, self.group_count, self.allocation_bytes
        );
    }
}

/// Distribution of probe lengths over the live entries of a table.
///
/// `bins[p]` counts the entries found in the `p`-th group of their probe
/// sequence (`0` meaning the ideal group).
#[cfg(feature = "stats")]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeHistogram {
    /// Entry counts indexed by probe length.
    pub bins: Vec<usize>,
}

#[cfg(feature = "stats")]
impl ProbeHistogram {
    /// Total number of entries counted.
    pub fn total(&self) -> usize {
        self.bins.iter().sum()
    }

    /// Longest probe length with at least one entry.
    pub fn max_probe_length(&self) -> Option<usize> {
        self.bins.iter().rposition(|&count| count != 0)
    }

    /// Pretty-prints the histogram horizontally using stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.bins.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!("probe histogram ({} entries):", self.total());

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = match units % 8 {
                1 => Some('▏'),
                2 => Some('▎'),
                3 => Some('▍'),
                4 => Some('▌'),
                5 => Some('▋'),
                6 => Some('▊'),
                7 => Some('▉'),
                _ => None,
            };
            if let Some(ch) = partial {
                bar.push(ch);
            }
            bar
        };

        for (length, &count) in self.bins.iter().enumerate() {
            println!("{:>3} | {} ({})", length, make_bar(count), count);
        }
    }
}

/// A fixed-capacity Swiss table.
///
/// The table is sized once from a capacity hint, rounded up to a power of
/// two of at least eight slots, and holds at most 87.5% of that many
/// records. It never grows: inserting beyond the ceiling fails with
/// [`Error::TableFull`].
///
/// Removal leaves a tombstone so that probe chains running through the slot
/// stay intact. Tombstones are reused by later inserts and can be reclaimed
/// all at once with [`compact`](HashTable::compact).
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use siphasher::sip::SipHasher;
/// # use stable_swiss::hash_table::HashTable;
/// # use stable_swiss::hash_table::InsertMode;
/// #
/// # fn hash_id(id: u64) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     id.hash(&mut hasher);
/// #     hasher.finish()
/// # }
/// #
/// #[derive(Debug, PartialEq)]
/// struct Person {
///     id: u64,
///     name: &'static str,
/// }
///
/// let mut table = HashTable::with_capacity(64);
/// let alice = Person { id: 1, name: "Alice" };
/// table
///     .insert(hash_id(1), alice, |p: &Person| p.id == 1, InsertMode::IfAbsent)
///     .unwrap();
///
/// assert_eq!(table.find(hash_id(1), |p| p.id == 1).map(|p| p.name), Some("Alice"));
/// assert_eq!(table.effective_capacity(), 56);
/// ```
pub struct HashTable<T> {
    groups: Box<[Group<T>]>,
    group_mask: usize,
    effective_capacity: usize,

    populated: usize,
    tombstones: usize,
}

impl<T> Debug for HashTable<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::format;
        use alloc::string::String;
        use alloc::string::ToString;

        f.debug_struct("HashTable")
            .field(
                "control",
                &self
                    .groups
                    .iter()
                    .map(|group| {
                        group
                            .ctrl
                            .iter()
                            .map(|&tag| match tag {
                                EMPTY => "..".to_string(),
                                DELETED => "xx".to_string(),
                                tag if is_full(tag) => format!("{tag:02x}"),
                                tag => format!("?{tag:02x}"),
                            })
                            .collect::<Vec<String>>()
                            .join(", ")
                    })
                    .collect::<Vec<_>>(),
            )
            .field("populated", &self.populated)
            .field("tombstones", &self.tombstones)
            .field("effective_capacity", &self.effective_capacity)
            .finish()
    }
}

impl<T> Clone for HashTable<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        let mut groups: Box<[Group<T>]> = (0..self.groups.len()).map(|_| Group::new()).collect();

        for (dst, src) in groups.iter_mut().zip(self.groups.iter()) {
            for lane in src.control().match_full() {
                // SAFETY: `match_full` only yields initialized slots.
                dst.slots[lane] = MaybeUninit::new(unsafe { src.value(lane) }.clone());
            }
            dst.ctrl = src.ctrl;
        }

        Self {
            groups,
            group_mask: self.group_mask,
            effective_capacity: self.effective_capacity,
            populated: self.populated,
            tombstones: self.tombstones,
        }
    }
}

impl<T> Drop for HashTable<T> {
    fn drop(&mut self) {
        if core::mem::needs_drop::<T>() && self.populated > 0 {
            for group in self.groups.iter_mut() {
                for lane in group.control().match_full() {
                    // SAFETY: `match_full` only yields initialized slots, and each is
                    // dropped once.
                    unsafe { group.slots[lane].assume_init_drop() };
                }
            }
        }
    }
}

impl<T> HashTable<T> {
    /// Creates a table able to hold at least `capacity * 7 / 8` records.
    ///
    /// The slot count is `capacity` rounded up to a power of two, and never
    /// less than eight.
    ///
    /// # Panics
    ///
    /// Panics if the rounded slot count overflows `usize` or the allocation
    /// size overflows `isize`. Use [`try_with_capacity`] to handle this.
    ///
    /// [`try_with_capacity`]: HashTable::try_with_capacity
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stable_swiss::hash_table::HashTable;
    /// #
    /// let table: HashTable<u64> = HashTable::with_capacity(100);
    /// assert_eq!(table.capacity(), 128);
    /// assert_eq!(table.effective_capacity(), 112);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        match Self::try_with_capacity(capacity) {
            Ok(table) => table,
            Err(_) => capacity_overflow(),
        }
    }

    /// Fallible version of [`with_capacity`](HashTable::with_capacity).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stable_swiss::Error;
    /// # use stable_swiss::hash_table::HashTable;
    /// #
    /// let err = HashTable::<u8>::try_with_capacity(usize::MAX).unwrap_err();
    /// assert_eq!(err, Error::CapacityOverflow);
    /// ```
    pub fn try_with_capacity(capacity: usize) -> Result<Self, Error> {
        let capacity = Capacity::try_from(capacity)?;
        Layout::array::<Group<T>>(capacity.group_count()).map_err(|_| Error::CapacityOverflow)?;

        let groups = (0..capacity.group_count()).map(|_| Group::new()).collect();

        Ok(Self {
            groups,
            group_mask: capacity.group_count() - 1,
            effective_capacity: capacity.effective(),
            populated: 0,
            tombstones: 0,
        })
    }

    /// Returns how many slots fit in `bytes` of group storage.
    ///
    /// The result is a multiple of eight but not necessarily a power of two;
    /// passing it to [`with_capacity`](HashTable::with_capacity) rounds it
    /// up.
    pub fn capacity_for_bytes(bytes: usize) -> usize {
        bytes / core::mem::size_of::<Group<T>>() * GROUP_SIZE
    }

    /// Returns the number of records in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the total number of slots.
    pub fn capacity(&self) -> usize {
        self.groups.len() * GROUP_SIZE
    }

    /// Returns the maximum number of records, `capacity() * 7 / 8`.
    pub fn effective_capacity(&self) -> usize {
        self.effective_capacity
    }

    /// Returns the number of eight-slot groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Returns the number of tombstones left by removals since the last
    /// compaction or reset.
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Returns `true` if the next insert would fail with
    /// [`Error::TableFull`].
    pub fn is_full(&self) -> bool {
        self.populated >= self.effective_capacity
    }

    /// Returns the number of bytes owned by the group array.
    pub fn allocation_size(&self) -> usize {
        self.groups.len() * core::mem::size_of::<Group<T>>()
    }

    /// Returns a snapshot of the table's counters.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stable_swiss::hash_table::HashTable;
    /// #
    /// let table: HashTable<u32> = HashTable::with_capacity(8);
    /// let stats = table.stats();
    /// assert_eq!(stats.size, 0);
    /// assert_eq!(stats.tombstones, 0);
    /// assert_eq!(stats.tombstones_size_ratio, 0.0);
    /// ```
    pub fn stats(&self) -> Stats {
        let capacity = self.capacity();
        Stats {
            size: self.populated,
            tombstones: self.tombstones,
            tombstones_capacity_ratio: if capacity == 0 {
                0.0
            } else {
                self.tombstones as f32 / capacity as f32
            },
            tombstones_size_ratio: if self.populated == 0 {
                0.0
            } else {
                self.tombstones as f32 / self.populated as f32
            },
            capacity,
            effective_capacity: self.effective_capacity,
            group_count: self.groups.len(),
            allocation_bytes: self.allocation_size(),
        }
    }

    #[inline(always)]
    fn probe_seq(&self, h1: usize) -> ProbeSeq {
        ProbeSeq::new(h1, self.group_mask)
    }

    #[inline(always)]
    fn tag(&self, slot: SlotIndex) -> u8 {
        self.groups[slot.group].ctrl[slot.lane]
    }

    #[inline(always)]
    fn set_tag(&mut self, slot: SlotIndex, tag: u8) {
        self.groups[slot.group].ctrl[slot.lane] = tag;
    }

    /// Walks the probe chain of `hash` and returns the slot holding the
    /// record accepted by `eq`.
    ///
    /// The walk stops at the first group with an empty lane: inserts always
    /// fill the first free slot on the chain, so nothing beyond that group
    /// can belong to this chain.
    #[inline]
    fn find_index(&self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<SlotIndex> {
        if self.populated == 0 {
            return None;
        }

        let (h1, h2) = split_hash(hash);
        for group_index in self.probe_seq(h1) {
            let group = &self.groups[group_index];
            let control = group.control();

            for lane in control.match_fingerprint(h2) {
                // SAFETY: Fingerprint matches only report lanes with a full tag.
                if eq(unsafe { group.value(lane) }) {
                    return Some(SlotIndex {
                        group: group_index,
                        lane,
                    });
                }
            }

            if control.match_empty().any() {
                return None;
            }
        }

        None
    }

    /// Finds a record by hash and equality predicate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use siphasher::sip::SipHasher;
    /// # use stable_swiss::hash_table::HashTable;
    /// # use stable_swiss::hash_table::InsertMode;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::with_capacity(16);
    /// table
    ///     .insert(hash_u64(42), 42u64, |&n| n == 42, InsertMode::IfAbsent)
    ///     .unwrap();
    ///
    /// assert_eq!(table.find(hash_u64(42), |&n| n == 42), Some(&42));
    /// assert_eq!(table.find(hash_u64(99), |&n| n == 99), None);
    /// ```
    #[inline]
    pub fn find(&self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<&T> {
        let slot = self.find_index(hash, eq)?;
        // SAFETY: `find_index` only returns slots with a full tag.
        Some(unsafe { self.groups[slot.group].value(slot.lane) })
    }

    /// Finds a record by hash and equality predicate, returning a mutable
    /// reference.
    ///
    /// The part of the record that feeds `hash` must not be changed through
    /// the returned reference.
    #[inline]
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<&mut T> {
        let slot = self.find_index(hash, eq)?;
        // SAFETY: `find_index` only returns slots with a full tag.
        Some(unsafe { self.groups[slot.group].value_mut(slot.lane) })
    }

    /// Locates the slot for a record, for inspection or insertion.
    ///
    /// Fails with [`Error::TableFull`] when the table is at its effective
    /// capacity, even if the record is already present, and when the probe
    /// chain has no free slot. The table is never modified by this call.
    ///
    /// A vacant entry points at the first empty or deleted slot of the probe
    /// chain; the whole chain is still checked for an existing record, since
    /// a tombstone does not prove absence.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stable_swiss::hash_table::Entry;
    /// # use stable_swiss::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<(u32, &str)> = HashTable::with_capacity(8);
    /// match table.entry(7, |&(k, _)| k == 7).unwrap() {
    ///     Entry::Vacant(entry) => {
    ///         entry.insert((7, "seven"));
    ///     }
    ///     Entry::Occupied(_) => unreachable!(),
    /// }
    ///
    /// let value = table.entry(7, |&(k, _)| k == 7).unwrap().or_insert((7, "other"));
    /// assert_eq!(value.1, "seven");
    /// ```
    pub fn entry(&mut self, hash: u64, eq: impl Fn(&T) -> bool) -> Result<Entry<'_, T>, Error> {
        if self.populated >= self.effective_capacity {
            return Err(Error::TableFull);
        }

        let (h1, h2) = split_hash(hash);
        let mut candidate = None;

        for group_index in self.probe_seq(h1) {
            let group = &self.groups[group_index];
            let control = group.control();

            for lane in control.match_fingerprint(h2) {
                // SAFETY: Fingerprint matches only report lanes with a full tag.
                if eq(unsafe { group.value(lane) }) {
                    return Ok(Entry::Occupied(OccupiedEntry {
                        table: self,
                        slot: SlotIndex {
                            group: group_index,
                            lane,
                        },
                    }));
                }
            }

            if candidate.is_none() {
                candidate = control
                    .match_empty_or_deleted()
                    .first()
                    .map(|lane| SlotIndex {
                        group: group_index,
                        lane,
                    });
            }

            if control.match_empty().any() {
                break;
            }
        }

        match candidate {
            Some(slot) => Ok(Entry::Vacant(VacantEntry {
                table: self,
                slot,
                h2,
            })),
            None => Err(Error::TableFull),
        }
    }

    /// Inserts `value`, or resolves a collision with an equal record
    /// according to `mode`.
    ///
    /// On error the table is unchanged and `value` is dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stable_swiss::Error;
    /// # use stable_swiss::hash_table::HashTable;
    /// # use stable_swiss::hash_table::InsertMode;
    /// # use stable_swiss::hash_table::Inserted;
    /// #
    /// let mut table: HashTable<(u8, u32)> = HashTable::with_capacity(8);
    /// let eq = |r: &(u8, u32)| r.0 == 1;
    ///
    /// assert_eq!(table.insert(1, (1, 10), eq, InsertMode::IfAbsent), Ok(Inserted::New));
    /// assert_eq!(
    ///     table.insert(1, (1, 20), eq, InsertMode::IfAbsent),
    ///     Ok(Inserted::Rejected((1, 20)))
    /// );
    /// assert_eq!(
    ///     table.insert(1, (1, 30), eq, InsertMode::Upsert),
    ///     Ok(Inserted::Replaced((1, 10)))
    /// );
    ///
    /// for k in 2..=7u8 {
    ///     table.insert(k as u64, (k, 0), |r| r.0 == k, InsertMode::IfAbsent).unwrap();
    /// }
    /// assert_eq!(
    ///     table.insert(8, (8, 0), |r| r.0 == 8, InsertMode::IfAbsent),
    ///     Err(Error::TableFull)
    /// );
    /// ```
    pub fn insert(
        &mut self,
        hash: u64,
        value: T,
        eq: impl Fn(&T) -> bool,
        mode: InsertMode,
    ) -> Result<Inserted<T>, Error> {
        Ok(match self.entry(hash, eq)? {
            Entry::Vacant(entry) => {
                entry.insert(value);
                Inserted::New
            }
            Entry::Occupied(mut entry) => match mode {
                InsertMode::Upsert => Inserted::Replaced(entry.insert(value)),
                InsertMode::IfAbsent => Inserted::Rejected(value),
            },
        })
    }

    /// Removes and returns the record accepted by `eq`.
    ///
    /// The slot becomes a tombstone rather than empty so that other records
    /// whose probe chains pass through it stay reachable.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stable_swiss::hash_table::HashTable;
    /// # use stable_swiss::hash_table::InsertMode;
    /// #
    /// let mut table = HashTable::with_capacity(8);
    /// table.insert(5, 5u8, |&n| n == 5, InsertMode::IfAbsent).unwrap();
    ///
    /// assert_eq!(table.remove(5, |&n| n == 5), Some(5));
    /// assert_eq!(table.remove(5, |&n| n == 5), None);
    /// assert_eq!(table.tombstones(), 1);
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<T> {
        let slot = self.find_index(hash, eq)?;
        Some(self.remove_at(slot))
    }

    fn remove_at(&mut self, slot: SlotIndex) -> T {
        let group = &mut self.groups[slot.group];
        group.ctrl[slot.lane] = DELETED;
        self.populated -= 1;
        self.tombstones += 1;
        // SAFETY: The slot had a full tag and is now a tombstone, so the value is
        // read out exactly once.
        unsafe { group.slots[slot.lane].assume_init_read() }
    }

    /// Removes every record, keeping the allocation.
    ///
    /// All control bytes return to empty and both counters go to zero.
    /// Records are dropped in place; their slots are not otherwise cleared.
    #[doc(alias = "clear")]
    pub fn reset(&mut self) {
        let drop_values = core::mem::needs_drop::<T>() && self.populated > 0;
        for group in self.groups.iter_mut() {
            let full = group.control().match_full();
            group.ctrl = [EMPTY; GROUP_SIZE];
            if drop_values {
                for lane in full {
                    // SAFETY: The lane was full before its tag was cleared above.
                    unsafe { group.slots[lane].assume_init_drop() };
                }
            }
        }

        self.populated = 0;
        self.tombstones = 0;
    }

    /// Reclaims every tombstone in place, without allocating.
    ///
    /// `hasher` must return the same hash that was used to insert each
    /// record. Afterwards the table has no tombstones, the same records, and
    /// every record sits at the first free position of its own probe chain
    /// as of its relocation.
    ///
    /// The algorithm first retags every group (full becomes "needs
    /// relocation", tombstones become empty), then walks the slots in order.
    /// Each marked record is sent to the first empty or still-marked slot on
    /// its probe chain. If that slot is marked, the two records are swapped
    /// and the one brought back is processed next, without advancing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Inconsistent`] if a marked record finds no free or
    /// marked slot on its chain, which can only happen if the table was
    /// already corrupt.
    ///
    /// # Panics
    ///
    /// Panics if `hasher` panics. Records that were not relocated yet are
    /// dropped, since their hashes are lost. Every record already relocated
    /// stays reachable and the counters are recomputed, so the table remains
    /// usable. The same cleanup runs when [`Error::Inconsistent`] is
    /// returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stable_swiss::hash_table::HashTable;
    /// # use stable_swiss::hash_table::InsertMode;
    /// #
    /// let hash = |n: &u64| n.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    /// let mut table = HashTable::with_capacity(64);
    /// for n in 0..50u64 {
    ///     table.insert(hash(&n), n, |&v| v == n, InsertMode::IfAbsent).unwrap();
    /// }
    /// for n in 0..40u64 {
    ///     table.remove(hash(&n), |&v| v == n);
    /// }
    /// assert_eq!(table.tombstones(), 40);
    ///
    /// table.compact(hash).unwrap();
    /// assert_eq!(table.tombstones(), 0);
    /// assert_eq!(table.len(), 10);
    /// assert_eq!(table.find(hash(&45), |&v| v == 45), Some(&45));
    /// ```
    pub fn compact(&mut self, hasher: impl Fn(&T) -> u64) -> Result<(), Error> {
        if self.tombstones == 0 {
            return Ok(());
        }

        for group in self.groups.iter_mut() {
            group
                .control()
                .prepare_for_compaction()
                .store(&mut group.ctrl);
        }

        let mut guard = CompactionGuard { table: self };
        guard.table.relocate_marked(&hasher)?;
        guard.table.tombstones = 0;
        core::mem::forget(guard);
        Ok(())
    }

    /// Sends every marked record to the first free or marked slot on its
    /// chain. A marked tag means "live, not yet relocated" here.
    fn relocate_marked(&mut self, hasher: &impl Fn(&T) -> u64) -> Result<(), Error> {
        let capacity = self.capacity();
        let mut index = 0;
        while index < capacity {
            let slot = SlotIndex::from_absolute(index);
            if self.tag(slot) != DELETED {
                index += 1;
                continue;
            }

            // SAFETY: After retagging, a deleted tag marks a slot that still holds
            // the record it held when compaction began (or one swapped into it).
            let hash = hasher(unsafe { self.groups[slot.group].value(slot.lane) });
            let (h1, h2) = split_hash(hash);
            let target = self
                .find_reclaimable(h1)
                .ok_or(Error::Inconsistent {
                    slot: slot.absolute(),
                })?;

            if target == slot {
                self.set_tag(slot, h2);
                index += 1;
            } else if self.tag(target) == EMPTY {
                self.move_slot(slot, target);
                self.set_tag(target, h2);
                self.set_tag(slot, EMPTY);
                index += 1;
            } else {
                self.swap_slots(slot, target);
                self.set_tag(target, h2);
            }
        }

        Ok(())
    }

    /// First empty-or-deleted slot on the probe chain of `h1`.
    fn find_reclaimable(&self, h1: usize) -> Option<SlotIndex> {
        self.probe_seq(h1).find_map(|group_index| {
            self.groups[group_index]
                .control()
                .match_empty_or_deleted()
                .first()
                .map(|lane| SlotIndex {
                    group: group_index,
                    lane,
                })
        })
    }

    /// Moves the bits of `from` into `to`. Tags are left to the caller.
    fn move_slot(&mut self, from: SlotIndex, to: SlotIndex) {
        let value = core::mem::replace(
            &mut self.groups[from.group].slots[from.lane],
            MaybeUninit::uninit(),
        );
        self.groups[to.group].slots[to.lane] = value;
    }

    /// Swaps the bits of two slots. Tags are left to the caller.
    fn swap_slots(&mut self, a: SlotIndex, b: SlotIndex) {
        if a.group == b.group {
            self.groups[a.group].slots.swap(a.lane, b.lane);
            return;
        }

        let (low, high) = if a.group < b.group { (a, b) } else { (b, a) };
        let (head, tail) = self.groups.split_at_mut(high.group);
        core::mem::swap(
            &mut head[low.group].slots[low.lane],
            &mut tail[0].slots[high.lane],
        );
    }

    /// Returns an iterator over all records, in slot order.
    ///
    /// Slot order is unrelated to insertion order and changes on
    /// compaction.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            groups: self.groups.iter(),
            current: None,
            remaining: self.populated,
        }
    }

    /// Computes the probe-length distribution of the live records.
    ///
    /// `hasher` must return the hash each record was inserted with.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self, hasher: impl Fn(&T) -> u64) -> ProbeHistogram {
        let mut bins = Vec::new();

        for (group_index, group) in self.groups.iter().enumerate() {
            for lane in group.control().match_full() {
                // SAFETY: `match_full` only yields initialized slots.
                let (h1, _) = split_hash(hasher(unsafe { group.value(lane) }));
                let length = self
                    .probe_seq(h1)
                    .position(|g| g == group_index)
                    .unwrap_or(self.groups.len());
                if bins.len() <= length {
                    bins.resize(length + 1, 0);
                }
                bins[length] += 1;
            }
        }

        ProbeHistogram { bins }
    }

    #[cfg(test)]
    fn control_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.groups.iter().flat_map(|group| group.ctrl)
    }
}

/// Restores a usable table if compaction stops early.
///
/// Relocated records sit at the first free slot of their chain as of their
/// relocation, and every group ahead of that slot was fully relocated at the
/// time, so emptying the still-marked slots cannot cut a chain short.
struct CompactionGuard<'a, T> {
    table: &'a mut HashTable<T>,
}

impl<T> Drop for CompactionGuard<'_, T> {
    fn drop(&mut self) {
        let mut populated = 0;
        for group in self.table.groups.iter_mut() {
            for lane in 0..GROUP_SIZE {
                if group.ctrl[lane] == DELETED {
                    group.ctrl[lane] = EMPTY;
                    if core::mem::needs_drop::<T>() {
                        // SAFETY: A marked slot still holds a live record that
                        // was never relocated.
                        unsafe { group.slots[lane].assume_init_drop() };
                    }
                }
            }
            populated += group.control().match_full().count();
        }
        self.table.populated = populated;
        self.table.tombstones = 0;
    }
}

impl<'a, T> IntoIterator for &'a HashTable<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A view into a single slot of the table, which may be vacant or occupied.
///
/// Constructed by [`HashTable::entry`].
pub enum Entry<'a, T> {
    /// The record is present.
    Occupied(OccupiedEntry<'a, T>),
    /// The record is absent and a free slot has been reserved for it.
    Vacant(VacantEntry<'a, T>),
}

impl<'a, T> Entry<'a, T> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the stored record.
    pub fn or_insert(self, default: T) -> &'a mut T {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Like [`or_insert`](Entry::or_insert), building the record lazily.
    pub fn or_insert_with(self, default: impl FnOnce() -> T) -> &'a mut T {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Calls `f` on the stored record if the entry is occupied.
    pub fn and_modify(self, f: impl FnOnce(&mut T)) -> Self {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }
}

/// A view into an occupied slot.
pub struct OccupiedEntry<'a, T> {
    table: &'a mut HashTable<T>,
    slot: SlotIndex,
}

impl<'a, T> OccupiedEntry<'a, T> {
    /// Gets a reference to the stored record.
    pub fn get(&self) -> &T {
        // SAFETY: An occupied entry always points at a full slot.
        unsafe { self.table.groups[self.slot.group].value(self.slot.lane) }
    }

    /// Gets a mutable reference to the stored record.
    pub fn get_mut(&mut self) -> &mut T {
        // SAFETY: An occupied entry always points at a full slot.
        unsafe { self.table.groups[self.slot.group].value_mut(self.slot.lane) }
    }

    /// Converts the entry into a mutable reference bound to the table's
    /// borrow.
    pub fn into_mut(self) -> &'a mut T {
        // SAFETY: An occupied entry always points at a full slot.
        unsafe { self.table.groups[self.slot.group].value_mut(self.slot.lane) }
    }

    /// Replaces the stored record, returning the old one.
    pub fn insert(&mut self, value: T) -> T {
        core::mem::replace(self.get_mut(), value)
    }

    /// Removes the record, leaving a tombstone.
    pub fn remove(self) -> T {
        self.table.remove_at(self.slot)
    }
}

/// A view into a vacant slot reserved for a new record.
pub struct VacantEntry<'a, T> {
    table: &'a mut HashTable<T>,
    slot: SlotIndex,
    h2: u8,
}

impl<'a, T> VacantEntry<'a, T> {
    /// Stores `value` in the reserved slot and returns a mutable reference
    /// to it.
    pub fn insert(self, value: T) -> &'a mut T {
        let table = self.table;
        if table.tag(self.slot) == DELETED {
            table.tombstones -= 1;
        }
        table.populated += 1;

        let group = &mut table.groups[self.slot.group];
        group.ctrl[self.slot.lane] = self.h2;
        group.slots[self.slot.lane].write(value)
    }
}

/// An iterator over the records of a [`HashTable`], in slot order.
pub struct Iter<'a, T> {
    groups: core::slice::Iter<'a, Group<T>>,
    current: Option<(&'a Group<T>, BitMask)>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((group, full)) = &mut self.current {
                if let Some(lane) = full.next() {
                    self.remaining -= 1;
                    let group: &'a Group<T> = *group;
                    // SAFETY: `match_full` only yields initialized slots.
                    return Some(unsafe { group.value(lane) });
                }
            }

            let group = self.groups.next()?;
            self.current = Some((group, group.control().match_full()));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}
