//! Control bytes and whole-group matching.
//!
//! Each slot owns one control byte. A group's eight control bytes are loaded
//! as a single little-endian `u64` so that lane `i` always lives in bits
//! `8*i..8*i+8`, and every query against the group becomes a handful of
//! word operations.

/// Number of slots in a group. The control word is exactly one `u64`.
pub(crate) const GROUP_SIZE: usize = 8;

/// Tag for a slot that has never held a value since the last reset or
/// compaction. Only this tag terminates a probe.
///
/// Shares the sign bit with [`DELETED`] so both sentinels are found by a
/// single mask, and has bit 1 clear so it can be told apart from it.
pub(crate) const EMPTY: u8 = 0x80;

/// Tag for a removed entry (a tombstone).
///
/// During compaction the same tag temporarily marks live entries that still
/// have to be relocated.
pub(crate) const DELETED: u8 = 0xFE;

const LSB: u64 = 0x0101_0101_0101_0101;
const MSB: u64 = 0x8080_8080_8080_8080;

#[inline(always)]
pub(crate) fn is_full(tag: u8) -> bool {
    tag & 0x80 == 0
}

/// The eight control bytes of a group viewed as one word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ControlWord(u64);

impl ControlWord {
    #[inline(always)]
    pub(crate) fn load(ctrl: &[u8; GROUP_SIZE]) -> Self {
        Self(u64::from_le_bytes(*ctrl))
    }

    #[inline(always)]
    pub(crate) fn store(self, ctrl: &mut [u8; GROUP_SIZE]) {
        *ctrl = self.0.to_le_bytes();
    }

    /// Lanes whose tag equals the fingerprint `h2`.
    ///
    /// This is the classic "has zero byte" trick applied to `word ^
    /// broadcast(h2)`. A borrow out of a matching lane can flag the lane
    /// above it as well, so the result may contain false positives, but only
    /// on full lanes: a sentinel lane keeps its sign bit after the XOR and is
    /// masked out by `& !v`. Callers confirm every hit with a key
    /// comparison.
    #[inline(always)]
    pub(crate) fn match_fingerprint(self, h2: u8) -> BitMask {
        debug_assert!(h2 < 0x80);
        let v = self.0 ^ LSB.wrapping_mul(h2 as u64);
        BitMask(v.wrapping_sub(LSB) & !v & MSB)
    }

    /// Lanes tagged [`EMPTY`]: sign bit set and bit 1 clear.
    #[inline(always)]
    pub(crate) fn match_empty(self) -> BitMask {
        BitMask(self.0 & !(self.0 << 6) & MSB)
    }

    /// Lanes tagged [`EMPTY`] or [`DELETED`].
    #[inline(always)]
    pub(crate) fn match_empty_or_deleted(self) -> BitMask {
        BitMask(self.0 & MSB)
    }

    /// Lanes holding a fingerprint.
    #[inline(always)]
    pub(crate) fn match_full(self) -> BitMask {
        BitMask(!self.0 & MSB)
    }

    /// Retags the whole group for in-place compaction: full lanes become
    /// [`DELETED`] (live, awaiting relocation) and both sentinels become
    /// [`EMPTY`].
    ///
    /// Per lane, `!msb + (msb >> 7)` is `0x7F + 0x01 = 0x80` for a sentinel
    /// and `0xFF + 0x00` for a full tag, so no carry crosses a lane boundary.
    /// Clearing bit 0 then yields `0x80` and `0xFE` respectively.
    #[inline(always)]
    pub(crate) fn prepare_for_compaction(self) -> Self {
        let msbs = self.0 & MSB;
        Self((!msbs).wrapping_add(msbs >> 7) & !LSB)
    }
}

/// A set of lanes within one group, one bit (the lane's sign bit) per lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BitMask(u64);

impl BitMask {
    #[inline(always)]
    pub(crate) fn any(self) -> bool {
        self.0 != 0
    }

    /// Lowest-addressed lane in the set.
    #[inline(always)]
    pub(crate) fn first(self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as usize / 8)
        }
    }

    /// The set without its lowest-addressed lane.
    #[inline(always)]
    pub(crate) fn remove_first(self) -> Self {
        Self(self.0 & self.0.wrapping_sub(1))
    }
}

impl Iterator for BitMask {
    type Item = usize;

    #[inline(always)]
    fn next(&mut self) -> Option<usize> {
        let lane = self.first()?;
        *self = self.remove_first();
        Some(lane)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}
