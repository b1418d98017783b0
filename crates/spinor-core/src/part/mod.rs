//! The part catalog's entry type and supporting vocabulary: `PartId`,
//! erase/OTP descriptors, negotiation strategies, and `Part` itself.

mod erase;
mod fixups;
mod id;
mod ops_override;
mod otp;
mod part;
mod strategies;

pub use erase::{EraseInfo, EraseRegion, EraseSector, MAX_ERASE_SECTORS};
pub use fixups::{FixupHooks, MAX_REPROBE_DEPTH};
pub use id::{PartId, MAX_ID_LEN};
pub use ops_override::OpsOverride;
pub use otp::{OtpFamily, OtpLayout};
pub use part::{erase_info_for, Alias, IoOpcodeTable, Part, PartBuilder, RegisterLayoutInfo, VendorRef};
pub use strategies::{
    A4bDisType, A4bEnType, A4bFlags, Drive4ioClocks, PartFlags, QeType, QpiDisType, QpiEnType, SoftResetFlags,
};
