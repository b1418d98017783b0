//! Erase-capability description: sector types and the regions that group
//! them across a die.

/// Maximum number of distinct erase-sector types a part declares (4 KiB,
/// 32 KiB, 64 KiB, 256 KiB and a handful of vendor-specific sizes).
pub const MAX_ERASE_SECTORS: usize = 8;

/// One erasable unit size a part supports: an opcode, the number of bytes
/// it erases, and the worst-case time to complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EraseSector {
    /// The erase opcode.
    pub opcode: u8,
    /// Size in bytes, always a power of two.
    pub size_bytes: u32,
    /// Worst-case completion time in milliseconds.
    pub max_time_ms: u32,
}

impl EraseSector {
    /// Construct an erase sector descriptor.
    pub const fn new(opcode: u8, size_bytes: u32, max_time_ms: u32) -> Self {
        Self { opcode, size_bytes, max_time_ms }
    }
}

/// A contiguous span of the die in which a fixed subset of the part's
/// `EraseSector` entries apply. Most parts have one uniform region covering
/// the whole die; some (notably parts with a 4 KiB "parameter" sector
/// region at the top or bottom) have two or three.
#[derive(Debug, Clone, Copy)]
pub struct EraseRegion {
    /// Size of this region in bytes.
    pub size_bytes: u64,
    /// Bitset of indices into the part's `sector_info` array that are valid
    /// within this region (bit `i` set means `sector_info[i]` applies).
    pub erasesizes_mask: u8,
    /// Smallest erase granularity usable in this region, in bytes.
    pub min_erasesize: u32,
    /// Largest erase granularity usable in this region, in bytes.
    pub max_erasesize: u32,
}

impl EraseRegion {
    /// Construct a region descriptor.
    pub const fn new(size_bytes: u64, erasesizes_mask: u8, min_erasesize: u32, max_erasesize: u32) -> Self {
        Self { size_bytes, erasesizes_mask, min_erasesize, max_erasesize }
    }

    /// True if sector index `i` (0-based into `sector_info`) is enabled in
    /// this region.
    pub const fn allows_sector(&self, i: usize) -> bool {
        i < 8 && (self.erasesizes_mask & (1 << i)) != 0
    }
}

/// A full erase-capability description for one address width (3B or 4B):
/// the sector type table plus the ordered regions that partition the die.
#[derive(Debug, Clone)]
pub struct EraseInfo {
    /// Up to [`MAX_ERASE_SECTORS`] sector-size entries; unused slots are
    /// zeroed and never referenced by a region's mask.
    pub sector_info: [EraseSector; MAX_ERASE_SECTORS],
    /// How many of `sector_info`'s entries are meaningful.
    pub sector_count: u8,
    /// Ordered regions summing to the die size.
    #[cfg(feature = "alloc")]
    pub regions: alloc::vec::Vec<EraseRegion>,
    /// Ordered regions summing to the die size (no_std, non-alloc build:
    /// a fixed-capacity slice is supplied by static-parts codegen instead).
    #[cfg(not(feature = "alloc"))]
    pub regions: &'static [EraseRegion],
}

const EMPTY_SECTOR: EraseSector = EraseSector::new(0, 0, 0);

impl EraseInfo {
    /// Build a uniform erase layout: a single region covering `total_size`
    /// with the given sector types, smallest-first.
    #[cfg(feature = "alloc")]
    pub fn uniform(total_size: u64, sectors: &[EraseSector]) -> Self {
        let mut sector_info = [EMPTY_SECTOR; MAX_ERASE_SECTORS];
        let count = sectors.len().min(MAX_ERASE_SECTORS);
        sector_info[..count].copy_from_slice(&sectors[..count]);
        let mask = ((1u16 << count) - 1) as u8;
        let min = sectors.iter().map(|s| s.size_bytes).min().unwrap_or(0);
        let max = sectors.iter().map(|s| s.size_bytes).max().unwrap_or(0);
        Self {
            sector_info,
            sector_count: count as u8,
            regions: alloc::vec![EraseRegion::new(total_size, mask, min, max)],
        }
    }

    /// The part's built-in default when neither `erase_info_4b` nor
    /// `erase_info_3b` is declared for the requested address width (§9
    /// Open Question 2): a uniform 4 KiB / 32 KiB / 64 KiB table.
    #[cfg(feature = "alloc")]
    pub fn default_3byte(total_size: u64, sector_opcode_4k: u8, sector_opcode_32k: u8, sector_opcode_64k: u8) -> Self {
        Self::uniform(
            total_size,
            &[
                EraseSector::new(sector_opcode_4k, 4 * 1024, 400),
                EraseSector::new(sector_opcode_32k, 32 * 1024, 1600),
                EraseSector::new(sector_opcode_64k, 64 * 1024, 2000),
            ],
        )
    }
}
