//! Build-time-generated part table (§4.9): an alternative to
//! [`crate::catalog`]'s runtime `Lazy` table for targets that want the
//! representative catalog without doing JSON/file I/O at startup. The RON
//! fixtures under `chips/vendors/` are compiled by `spinor-chips-codegen`'s
//! build script into `all()` below.

#![allow(unused_imports)]

use crate::part::{
    A4bDisType, A4bEnType, A4bFlags, Alias, EraseInfo, EraseSector, IoOpcodeTable, OtpFamily, OtpLayout, Part,
    PartBuilder, PartFlags, PartId, QeType,
};
use crate::spi::{IoCaps, IoMode, IoOpcode};

include!(concat!(env!("OUT_DIR"), "/parts_static.rs"));
