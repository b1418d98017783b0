//! The built-in part catalog: vendor registry plus part table, looked up
//! by probed JEDEC ID or by name (§4.2).
//!
//! Parts can't be `'static const` values (`EraseInfo` owns a heap `Vec` of
//! regions), so the table is built once, lazily, the first time it's
//! needed. This backs the default catalog on `std` targets; `no_std`
//! targets use the `static-parts` build-time-generated table instead.

#[cfg(feature = "alloc")]
mod parts;
mod vendors;

pub use vendors::{find_by_mfr_id as find_vendor_by_mfr_id, find_by_name as find_vendor_by_name, Vendor, BUILTIN_VENDORS};

#[cfg(feature = "std")]
use once_cell::sync::{Lazy, OnceCell};

#[cfg(feature = "std")]
static BUILTIN_PARTS: Lazy<alloc::vec::Vec<crate::part::Part>> = Lazy::new(parts::all);

#[cfg(feature = "std")]
static EXTERNAL_PARTS: OnceCell<alloc::vec::Vec<crate::part::Part>> = OnceCell::new();

/// Run `f` over every catalog part: the built-in table first, then any
/// parts registered via [`register_external_parts`] (§4.8 - external
/// entries never replace a built-in, they only add to the search).
#[cfg(feature = "std")]
pub fn for_each_part(mut f: impl FnMut(&'static crate::part::Part)) {
    for part in BUILTIN_PARTS.iter() {
        f(part);
    }
    if let Some(external) = EXTERNAL_PARTS.get() {
        for part in external.iter() {
            f(part);
        }
    }
}

/// Find the catalog part whose [`PartId`](crate::part::PartId) matches
/// `probed_id`, preferring the candidate with the strictest (most mask
/// bits set) match (§4.2).
#[cfg(feature = "std")]
pub fn find_by_id(probed_id: &[u8]) -> Option<&'static crate::part::Part> {
    let mut best: Option<&'static crate::part::Part> = None;
    for_each_part(|part| {
        if part.id.matches(probed_id) {
            let better = match best {
                Some(b) => part.id.mask_bit_count() > b.id.mask_bit_count(),
                None => true,
            };
            if better {
                best = Some(part);
            }
        }
    });
    best
}

/// Find a catalog part by exact model name, checking aliases too.
#[cfg(feature = "std")]
pub fn find_by_name(name: &str) -> Option<&'static crate::part::Part> {
    let mut found = None;
    for_each_part(|part| {
        if found.is_some() {
            return;
        }
        if part.model.eq_ignore_ascii_case(name) || part.alias.iter().any(|a| a.model.eq_ignore_ascii_case(name)) {
            found = Some(part);
        }
    });
    found
}

/// Register additional parts at runtime (§4.8 external-ID loader). Can
/// only be called once; later calls are ignored.
#[cfg(feature = "std")]
pub fn register_external_parts(parts: alloc::vec::Vec<crate::part::Part>) {
    let _ = EXTERNAL_PARTS.set(parts);
}
