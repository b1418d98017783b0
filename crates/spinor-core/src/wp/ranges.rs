//! Kind/shift → protected-extent decoding (§4.7).

use super::types::{WpRange, WpRangeKind};

/// A protected byte extent: `[start, start+len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectedExtent {
    /// Offset of the first protected byte.
    pub start: u64,
    /// Number of protected bytes.
    pub len: u64,
}

impl ProtectedExtent {
    /// No bytes protected.
    pub const NONE: Self = Self { start: 0, len: 0 };

    /// Every byte protected.
    pub const fn all(size: u64) -> Self {
        Self { start: 0, len: size }
    }

    /// True if `addr` falls within this extent.
    pub const fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.start + self.len
    }

    /// The complement of this extent within `[0, size)`. Only well-defined
    /// for a single contiguous extent anchored at one end of the die,
    /// which is the only shape `decode` ever produces.
    fn complement(self, size: u64) -> Self {
        if self.len == 0 {
            return Self::all(size);
        }
        if self.start == 0 {
            Self { start: self.len, len: size - self.len }
        } else {
            Self { start: 0, len: size - self.len }
        }
    }

    /// Same-sized extent anchored at the opposite end of the die (used by
    /// `SpCmpf*`: complement measured from the far end rather than the near
    /// one).
    fn mirrored(self, size: u64) -> Self {
        if self.start == 0 {
            Self { start: size - self.len, len: self.len }
        } else {
            Self { start: 0, len: self.len }
        }
    }
}

const BP_BASE_UNIT: u64 = 64 * 1024;
const SP_BASE_UNIT: u64 = 4 * 1024;

/// Decode a `WpRange` row into the protected extent it describes for a die
/// of `size` bytes (§4.7). Lookup itself (`mask_value` → row) happens in
/// [`WpInfo::lookup`](super::WpInfo::lookup); this function only interprets
/// the row once found.
pub fn decode(range: WpRange, size: u64) -> ProtectedExtent {
    let shift = range.shift as u32;
    match range.kind {
        WpRangeKind::None => ProtectedExtent::NONE,
        WpRangeKind::All => ProtectedExtent::all(size),
        WpRangeKind::BpUpper => {
            let len = (BP_BASE_UNIT << shift).min(size);
            ProtectedExtent { start: size - len, len }
        }
        WpRangeKind::BpLower => {
            let len = (BP_BASE_UNIT << shift).min(size);
            ProtectedExtent { start: 0, len }
        }
        WpRangeKind::BpCmpUpper => decode(WpRange::new(WpRangeKind::BpUpper, range.shift, 0), size).complement(size),
        WpRangeKind::BpCmpLower => decode(WpRange::new(WpRangeKind::BpLower, range.shift, 0), size).complement(size),
        WpRangeKind::RpUpper => {
            let len = size >> shift;
            ProtectedExtent { start: size - len, len }
        }
        WpRangeKind::RpLower => {
            let len = size >> shift;
            ProtectedExtent { start: 0, len }
        }
        WpRangeKind::RpCmpUpper => decode(WpRange::new(WpRangeKind::RpUpper, range.shift, 0), size).complement(size),
        WpRangeKind::RpCmpLower => decode(WpRange::new(WpRangeKind::RpLower, range.shift, 0), size).complement(size),
        WpRangeKind::SpUpper => {
            let len = (SP_BASE_UNIT << shift).min(size);
            ProtectedExtent { start: size - len, len }
        }
        WpRangeKind::SpLower => {
            let len = (SP_BASE_UNIT << shift).min(size);
            ProtectedExtent { start: 0, len }
        }
        WpRangeKind::SpCmpUpper => decode(WpRange::new(WpRangeKind::SpUpper, range.shift, 0), size).complement(size),
        WpRangeKind::SpCmpLower => decode(WpRange::new(WpRangeKind::SpLower, range.shift, 0), size).complement(size),
        WpRangeKind::SpCmpfUpper => {
            decode(WpRange::new(WpRangeKind::SpUpper, range.shift, 0), size).complement(size).mirrored(size)
        }
        WpRangeKind::SpCmpfLower => {
            decode(WpRange::new(WpRangeKind::SpLower, range.shift, 0), size).complement(size).mirrored(size)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: u64 = 16 * 1024 * 1024;

    #[test]
    fn bp_upper_shift_zero_is_one_block() {
        let r = WpRange::new(WpRangeKind::BpUpper, 0, 0);
        let e = decode(r, SIZE);
        assert_eq!(e.len, BP_BASE_UNIT);
        assert_eq!(e.start, SIZE - BP_BASE_UNIT);
    }

    #[test]
    fn bp_cmp_upper_protects_everything_but_the_top() {
        let r = WpRange::new(WpRangeKind::BpCmpUpper, 2, 0);
        let e = decode(r, SIZE);
        assert_eq!(e.start, 0);
        assert_eq!(e.len, SIZE - (BP_BASE_UNIT << 2));
    }

    #[test]
    fn all_and_none_cover_the_extremes() {
        assert_eq!(decode(WpRange::new(WpRangeKind::None, 0, 0), SIZE), ProtectedExtent::NONE);
        assert_eq!(decode(WpRange::new(WpRangeKind::All, 0, 0), SIZE), ProtectedExtent::all(SIZE));
    }

    #[test]
    fn rp_upper_is_a_power_of_two_fraction() {
        let r = WpRange::new(WpRangeKind::RpUpper, 2, 0);
        let e = decode(r, SIZE);
        assert_eq!(e.len, SIZE / 4);
        assert_eq!(e.start, SIZE - SIZE / 4);
    }
}
