//! Vendor registry: the builtin vendor set plus per-vendor defaults applied
//! to parts that don't override them (§4.2).

use crate::part::{FixupHooks, OpsOverride};

/// One registered vendor: its JEDEC manufacturer ID, display name, and the
/// defaults its parts fall back to when they don't declare their own.
#[derive(Clone, Copy)]
pub struct Vendor {
    /// Display name, e.g. `"Winbond"`.
    pub name: &'static str,
    /// JEDEC manufacturer ID byte.
    pub mfr_id: u8,
    /// Run once when the vendor is registered (reserved for vendors that
    /// need to prepare derived tables; none of the builtin vendors need one
    /// today).
    pub init: Option<fn()>,
    /// Fixup hooks applied to parts of this vendor that don't declare their
    /// own.
    pub default_part_fixups: Option<FixupHooks>,
    /// Per-operation overrides applied to parts of this vendor that don't
    /// declare their own.
    pub default_part_ops: Option<OpsOverride>,
}

impl core::fmt::Debug for Vendor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Vendor").field("name", &self.name).field("mfr_id", &self.mfr_id).finish()
    }
}

impl Vendor {
    const fn new(name: &'static str, mfr_id: u8) -> Self {
        Self { name, mfr_id, init: None, default_part_fixups: None, default_part_ops: None }
    }
}

/// JEDEC manufacturer ID bytes, named for readability in `parts.rs`.
pub mod mfr_id {
    pub const WINBOND: u8 = 0xEF;
    pub const MACRONIX: u8 = 0xC2;
    pub const GIGADEVICE: u8 = 0xC8;
    pub const ATMEL_ADESTO: u8 = 0x1F;
    pub const MICROCHIP_SST: u8 = 0xBF;
    pub const ISSI: u8 = 0x9D;
    pub const SPANSION_CYPRESS: u8 = 0x01;
    pub const MICRON: u8 = 0x20;
    pub const EON: u8 = 0x1C;
    pub const FUDAN: u8 = 0xA1;
    pub const XTX: u8 = 0x0B;
    pub const XMC: u8 = 0x20;
    pub const PUYA: u8 = 0x85;
    pub const BOYA: u8 = 0x68;
}

/// The builtin vendor set, registered at startup ahead of any
/// externally-loaded vendors (§4.8 external vendors may shadow these by
/// `mfr_id`).
pub const BUILTIN_VENDORS: &[Vendor] = &[
    Vendor::new("Winbond", mfr_id::WINBOND),
    Vendor::new("Macronix", mfr_id::MACRONIX),
    Vendor::new("GigaDevice", mfr_id::GIGADEVICE),
    Vendor::new("Adesto/Atmel", mfr_id::ATMEL_ADESTO),
    Vendor::new("Microchip/SST", mfr_id::MICROCHIP_SST),
    Vendor::new("ISSI", mfr_id::ISSI),
    Vendor::new("Cypress/Spansion", mfr_id::SPANSION_CYPRESS),
    Vendor::new("Micron", mfr_id::MICRON),
    Vendor::new("EON", mfr_id::EON),
    Vendor::new("XTX", mfr_id::XTX),
    Vendor::new("Puya", mfr_id::PUYA),
    Vendor::new("Boya", mfr_id::BOYA),
];

/// Look up a builtin vendor by manufacturer ID.
pub fn find_by_mfr_id(mfr_id: u8) -> Option<&'static Vendor> {
    BUILTIN_VENDORS.iter().find(|v| v.mfr_id == mfr_id)
}

/// Look up a builtin vendor by display name.
pub fn find_by_name(name: &str) -> Option<&'static Vendor> {
    BUILTIN_VENDORS.iter().find(|v| v.name.eq_ignore_ascii_case(name))
}
