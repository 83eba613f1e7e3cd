use crate::control::GROUP_SIZE;

/// Splits a 64-bit hash into the group selector `h1` and the 7-bit
/// fingerprint `h2`.
#[inline(always)]
pub(crate) fn split_hash(hash: u64) -> (usize, u8) {
    ((hash >> 7) as usize, (hash & 0x7F) as u8)
}

/// Triangular probing over group indices.
///
/// Step `p` visits `(start + p * (p + 1) / 2) & mask`. With a power-of-two
/// group count this visits every group exactly once, so the iterator ends
/// after `mask + 1` groups.
#[derive(Clone, Debug)]
pub(crate) struct ProbeSeq {
    pos: usize,
    stride: usize,
    mask: usize,
}

impl ProbeSeq {
    #[inline(always)]
    pub(crate) fn new(h1: usize, group_mask: usize) -> Self {
        Self {
            pos: (h1 / GROUP_SIZE) & group_mask,
            stride: 0,
            mask: group_mask,
        }
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline(always)]
    fn next(&mut self) -> Option<usize> {
        if self.stride > self.mask {
            return None;
        }
        let pos = self.pos;
        self.stride += 1;
        self.pos = self.pos.wrapping_add(self.stride) & self.mask;
        Some(pos)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.mask + 1).saturating_sub(self.stride);
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn split_hash_parts() {
        assert_eq!(split_hash(0), (0, 0));
        assert_eq!(split_hash(0x7F), (0, 0x7F));
        assert_eq!(split_hash(0x80), (1, 0));
        assert_eq!(split_hash(u64::MAX).1, 0x7F);
        assert_eq!(split_hash(0xABCD_EF01), (0xABCD_EF01 >> 7, 0x01));
    }

    #[test]
    fn start_group_uses_h1_over_group_size() {
        let (h1, _) = split_hash(0b1010_1010_1000_0000_0000);
        let mut seq = ProbeSeq::new(h1, 0xF);
        assert_eq!(seq.next(), Some((h1 / GROUP_SIZE) & 0xF));
    }

    #[test]
    fn triangular_offsets() {
        let mask = 63;
        let start = 5;
        let seq: Vec<usize> = ProbeSeq::new(start * GROUP_SIZE, mask).take(8).collect();
        let expected: Vec<usize> = (0..8).map(|p| (start + p * (p + 1) / 2) & mask).collect();
        assert_eq!(seq, expected);
    }

    #[test]
    fn visits_every_group_once() {
        for shift in 0..12 {
            let group_count = 1usize << shift;
            let mask = group_count - 1;
            for start in [0, 1, group_count / 2, mask] {
                let mut seen = vec![false; group_count];
                let seq = ProbeSeq::new(start * GROUP_SIZE, mask);
                assert_eq!(seq.size_hint(), (group_count, Some(group_count)));
                let mut steps = 0;
                for group in seq {
                    assert!(!seen[group], "group {group} repeated for count {group_count}");
                    seen[group] = true;
                    steps += 1;
                }
                assert_eq!(steps, group_count);
                assert!(seen.iter().all(|&s| s));
            }
        }
    }
}
