use core::fmt;

/// Errors reported by the fixed-capacity table and its wrappers.
///
/// None of these are raised for a missing key; lookups and removals report
/// absence through `Option` or `bool`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The table already holds its effective capacity (87.5% of its slots),
    /// or no reusable slot exists on the key's probe chain.
    ///
    /// The table never grows on its own. Remove entries or call `compact`
    /// to reclaim tombstones, then retry.
    TableFull,

    /// Compaction could not find a reclaimable slot for the live entry at
    /// `slot`.
    ///
    /// This means the table's bookkeeping has been corrupted and cannot be
    /// fixed by retrying.
    Inconsistent {
        /// Absolute slot index of the entry being relocated.
        slot: usize,
    },

    /// The requested capacity rounds up to a power of two that does not fit
    /// in `usize`.
    CapacityOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TableFull => f.write_str("table is full, compaction required"),
            Error::Inconsistent { slot } => {
                write!(f, "no reclaimable slot found while relocating slot {slot}")
            }
            Error::CapacityOverflow => f.write_str("capacity overflow"),
        }
    }
}

impl core::error::Error for Error {}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            Error::TableFull.to_string(),
            "table is full, compaction required"
        );
        assert_eq!(
            Error::Inconsistent { slot: 17 }.to_string(),
            "no reclaimable slot found while relocating slot 17"
        );
        assert_eq!(Error::CapacityOverflow.to_string(), "capacity overflow");
    }
}
