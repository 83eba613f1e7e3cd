#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod control;
mod error;
mod probe;

/// A fixed-capacity hash map over the Swiss table engine.
///
/// This module provides a `HashMap` that wraps the `HashTable` with a
/// `BuildHasher` and a key-value interface whose inserts can fail with
/// [`Error::TableFull`].
pub mod hash_map;

pub mod hash_table;

/// A fixed-capacity hash set over the Swiss table engine.
///
/// This module provides a `HashSet` that wraps the `HashTable` with a
/// `BuildHasher` and a set interface.
pub mod hash_set;

#[cfg(all(test, feature = "std"))]
mod proptests;

pub use error::Error;
pub use hash_map::Entry;
pub use hash_map::HashMap;
pub use hash_set::HashSet;
pub use hash_table::HashTable;
pub use hash_table::Stats;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used when none is named: foldhash's randomly
        /// seeded fast hasher.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used when none is named: the standard
        /// library's randomly seeded SipHash.
        pub type DefaultHashBuilder = std::hash::RandomState;
    } else {
        /// Placeholder hasher builder for builds without `foldhash` or
        /// `std`.
        ///
        /// It cannot be constructed, so maps and sets must be created with
        /// an explicit hasher through `with_hasher` or
        /// `with_capacity_and_hasher`.
        #[derive(Clone, Copy, Debug)]
        pub enum DefaultHashBuilder {}

        impl core::hash::BuildHasher for DefaultHashBuilder {
            type Hasher = Self;

            fn build_hasher(&self) -> Self::Hasher {
                match *self {}
            }
        }

        impl core::hash::Hasher for DefaultHashBuilder {
            fn finish(&self) -> u64 {
                match *self {}
            }

            fn write(&mut self, _bytes: &[u8]) {
                match *self {}
            }
        }
    }
}
