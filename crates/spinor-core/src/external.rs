//! External-ID loader (§4.8): reads a JSON config file describing extra
//! vendors/parts and registers them with [`crate::catalog`] alongside the
//! built-in table.
//!
//! The file format mirrors the built-in catalog's own shape closely enough
//! that `io-opcodes`/`erase-groups` entries can be referenced by name from a
//! part, or declared inline - the same `IoOpcodeTable`/`EraseInfo::uniform`
//! building blocks the built-in parts use. Any error anywhere in the file
//! aborts the whole load; the process is left with the built-in catalog
//! only, and every rejection is logged with the vendor/part/field name that
//! caused it.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use std::collections::HashMap;
use std::path::Path;

use log::warn;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::part::{
    Alias, EraseInfo, EraseSector, IoOpcodeTable, OtpFamily, OtpLayout, Part, PartFlags, PartId, VendorRef,
    A4bDisType, A4bEnType, A4bFlags, QeType, QpiDisType, QpiEnType, SoftResetFlags,
};
use crate::spi::{IoCaps, IoMode, IoOpcode};

/// Default filename searched for at process start (§4.8).
pub const DEFAULT_FILENAME: &str = "spi-nor-ids";

#[derive(Deserialize)]
struct ExternalFile {
    #[serde(default, rename = "io-opcodes")]
    io_opcodes: HashMap<String, HashMap<String, IoOpcodeJson>>,
    #[serde(default, rename = "erase-groups")]
    erase_groups: HashMap<String, Vec<EraseEntryJson>>,
    #[serde(default)]
    vendors: HashMap<String, VendorJson>,
}

#[derive(Deserialize, Clone, Copy)]
struct IoOpcodeJson {
    opcode: u8,
    #[serde(default, rename = "dummy-cycles")]
    dummy_cycles: u8,
    #[serde(default, rename = "mode-cycles")]
    mode_cycles: u8,
}

#[derive(Deserialize, Clone)]
struct EraseEntryJson {
    opcode: u8,
    size: SizeJson,
    #[serde(rename = "max-erase-time-ms")]
    max_erase_time_ms: u32,
}

#[derive(Deserialize, Clone)]
#[serde(untagged)]
enum SizeJson {
    Number(u64),
    Text(String),
}

impl SizeJson {
    fn resolve(&self, context: &str) -> Result<u64> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => {
                let (digits, mult) = match s.chars().last() {
                    Some('k') | Some('K') => (&s[..s.len() - 1], 1024u64),
                    Some('m') | Some('M') => (&s[..s.len() - 1], 1024 * 1024),
                    Some('g') | Some('G') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
                    _ => (s.as_str(), 1),
                };
                let n: u64 = digits.parse().map_err(|_| {
                    warn!("external-id: {context}: invalid size {s:?}");
                    Error::JsonDataInvalid
                })?;
                Ok(n * mult)
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EraseRef {
    Named(String),
    Inline(Vec<EraseEntryJson>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OpcodesRef {
    Named(String),
    Inline(HashMap<String, IoOpcodeJson>),
}

#[derive(Deserialize)]
struct OtpJson {
    size: u32,
    #[serde(rename = "start-index")]
    start_index: u32,
    count: u32,
}

#[derive(Deserialize)]
struct AliasJson {
    #[serde(default)]
    vendor: Option<String>,
    model: String,
}

#[derive(Deserialize)]
struct VendorJson {
    #[serde(rename = "mfr-id")]
    mfr_id: u8,
    name: String,
    #[serde(default)]
    parts: HashMap<String, PartJson>,
}

#[derive(Deserialize)]
struct PartJson {
    id: Vec<u8>,
    size: SizeJson,
    #[serde(default)]
    flags: Vec<String>,
    #[serde(default, rename = "vendor-flags")]
    vendor_flags: u32,
    #[serde(default, rename = "4b-flags")]
    a4b_flags: Vec<String>,
    #[serde(default, rename = "soft-reset-flags")]
    soft_reset_flags: Vec<String>,
    #[serde(default, rename = "qe-type")]
    qe_type: Option<String>,
    #[serde(default, rename = "qpi-en-type")]
    qpi_en_type: Option<String>,
    #[serde(default, rename = "qpi-dis-type")]
    qpi_dis_type: Option<String>,
    #[serde(default, rename = "4b-en-type")]
    a4b_en_type: Option<String>,
    #[serde(default, rename = "4b-dis-type")]
    a4b_dis_type: Option<String>,
    #[serde(default, rename = "max-speed-spi-mhz")]
    max_speed_spi_mhz: u32,
    #[serde(default, rename = "max-speed-dual-mhz")]
    max_speed_dual_mhz: u32,
    #[serde(default, rename = "max-speed-quad-mhz")]
    max_speed_quad_mhz: u32,
    #[serde(default, rename = "page-size")]
    page_size: Option<u32>,
    #[serde(default, rename = "max-pp-time-us")]
    max_pp_time_us: u32,
    #[serde(default, rename = "num-dies")]
    num_dies: Option<u32>,
    #[serde(default, rename = "read-io-caps")]
    read_io_caps: Vec<String>,
    #[serde(default, rename = "pp-io-caps")]
    pp_io_caps: Vec<String>,
    #[serde(default, rename = "erase-info-3b")]
    erase_info_3b: Option<EraseRef>,
    #[serde(default, rename = "erase-info-4b")]
    erase_info_4b: Option<EraseRef>,
    #[serde(default, rename = "read-opcodes-3b")]
    read_opcodes_3b: Option<OpcodesRef>,
    #[serde(default, rename = "read-opcodes-4b")]
    read_opcodes_4b: Option<OpcodesRef>,
    #[serde(default, rename = "pp-opcodes-3b")]
    pp_opcodes_3b: Option<OpcodesRef>,
    #[serde(default, rename = "pp-opcodes-4b")]
    pp_opcodes_4b: Option<OpcodesRef>,
    #[serde(default)]
    otp: Option<OtpJson>,
    /// Named write-protect range table reference. No registry of named
    /// `WpInfo` tables exists yet (the built-in catalog declares them inline
    /// per part); a part naming one here is accepted but logs a warning and
    /// loads without write-protect support rather than rejecting the file.
    #[serde(default)]
    wp: Option<String>,
    #[serde(default)]
    alias: Vec<AliasJson>,
}

fn leak_str(s: &str) -> &'static str {
    Box::leak(s.to_string().into_boxed_str())
}

fn parse_part_flags(names: &[String], ctx: &str) -> Result<PartFlags> {
    let mut out = PartFlags::empty();
    for name in names {
        let bit = match name.as_str() {
            "meta" => PartFlags::META,
            "no-sfdp" => PartFlags::NO_SFDP,
            "sect-4k" => PartFlags::SECT_4K,
            "sect-32k" => PartFlags::SECT_32K,
            "sect-64k" => PartFlags::SECT_64K,
            "sect-256k" => PartFlags::SECT_256K,
            "sr-volatile" => PartFlags::SR_VOLATILE,
            "sr-nonvolatile" => PartFlags::SR_NONVOLATILE,
            "sr-volatile-wren-50h" => PartFlags::SR_VOLATILE_WREN_50H,
            "unique-id" => PartFlags::UNIQUE_ID,
            "full-dpi-opcodes" => PartFlags::FULL_DPI_OPCODES,
            "full-qpi-opcodes" => PartFlags::FULL_QPI_OPCODES,
            "sfdp-4b-mode" => PartFlags::SFDP_4B_MODE,
            "global-block-unlock" => PartFlags::GLOBAL_BLOCK_UNLOCK,
            "aai-word-program" => PartFlags::AAI_WORD_PROGRAM,
            "no-wren" => PartFlags::NO_WREN,
            "no-op" => PartFlags::NO_OP,
            "pp-dual-input" => PartFlags::PP_DUAL_INPUT,
            other => {
                warn!("external-id: {ctx}: unknown flag {other:?}");
                return Err(Error::JsonDataInvalid);
            }
        };
        out |= bit;
    }
    Ok(out)
}

fn parse_a4b_flags(names: &[String], ctx: &str) -> Result<A4bFlags> {
    let mut out = A4bFlags::empty();
    for name in names {
        let bit = match name.as_str() {
            "always-4b" => A4bFlags::ALWAYS_4B,
            "dedicated-4b-opcodes" => A4bFlags::DEDICATED_4B_OPCODES,
            "b7h-e9h" => A4bFlags::B7H_E9H,
            "wren-required" => A4bFlags::WREN_REQUIRED,
            "bank-register" => A4bFlags::BANK_REGISTER,
            "nvcr-bit" => A4bFlags::NVCR_BIT,
            other => {
                warn!("external-id: {ctx}: unknown 4b-flag {other:?}");
                return Err(Error::JsonDataInvalid);
            }
        };
        out |= bit;
    }
    Ok(out)
}

fn parse_soft_reset_flags(names: &[String], ctx: &str) -> Result<SoftResetFlags> {
    let mut out = SoftResetFlags::empty();
    for name in names {
        let bit = match name.as_str() {
            "rsten-rst" => SoftResetFlags::RSTEN_RST,
            "f0h" => SoftResetFlags::F0H,
            "drive-4io-fh" => SoftResetFlags::DRIVE_4IO_FH,
            other => {
                warn!("external-id: {ctx}: unknown soft-reset-flag {other:?}");
                return Err(Error::JsonDataInvalid);
            }
        };
        out |= bit;
    }
    Ok(out)
}

fn parse_qe_type(name: Option<&str>, ctx: &str) -> Result<QeType> {
    Ok(match name {
        None | Some("dont-care") => QeType::DontCare,
        Some("sr1-bit6") => QeType::Sr1Bit6,
        Some("sr2-bit1") => QeType::Sr2Bit1,
        Some("sr2-bit1-wrsr1") => QeType::Sr2Bit1WrSr1,
        Some("sr2-bit7") => QeType::Sr2Bit7,
        Some("nvcr-bit4") => QeType::NvcrBit4,
        Some("unknown") => QeType::Unknown,
        Some(other) => {
            warn!("external-id: {ctx}: unknown qe-type {other:?}");
            return Err(Error::JsonDataInvalid);
        }
    })
}

fn parse_qpi_en_type(name: Option<&str>, ctx: &str) -> Result<QpiEnType> {
    Ok(match name {
        None | Some("none") => QpiEnType::None,
        Some("qer-38h") => QpiEnType::Qer38h,
        Some("opcode-38h") => QpiEnType::Opcode38h,
        Some("opcode-35h") => QpiEnType::Opcode35h,
        Some("addr-800003h") => QpiEnType::Addr800003h,
        Some("vecr-bit7-clr") => QpiEnType::VecrBit7Clr,
        Some("vendor") => QpiEnType::Vendor,
        Some(other) => {
            warn!("external-id: {ctx}: unknown qpi-en-type {other:?}");
            return Err(Error::JsonDataInvalid);
        }
    })
}

fn parse_qpi_dis_type(name: Option<&str>, ctx: &str) -> Result<QpiDisType> {
    Ok(match name {
        None | Some("none") => QpiDisType::None,
        Some("opcode-ffh") => QpiDisType::OpcodeFfh,
        Some("opcode-f5h") => QpiDisType::OpcodeF5h,
        Some("addr-800003h") => QpiDisType::Addr800003h,
        Some("reset-6699h") => QpiDisType::Reset6699h,
        Some("vendor") => QpiDisType::Vendor,
        Some(other) => {
            warn!("external-id: {ctx}: unknown qpi-dis-type {other:?}");
            return Err(Error::JsonDataInvalid);
        }
    })
}

fn parse_a4b_en_type(name: Option<&str>, ctx: &str) -> Result<A4bEnType> {
    Ok(match name {
        None | Some("none") => A4bEnType::None,
        Some("opcode-b7h") => A4bEnType::Opcode_B7h,
        Some("wren-then-b7h") => A4bEnType::WrenThenB7h,
        Some("bank") => A4bEnType::Bank,
        Some("nvcr") => A4bEnType::Nvcr,
        Some(other) => {
            warn!("external-id: {ctx}: unknown 4b-en-type {other:?}");
            return Err(Error::JsonDataInvalid);
        }
    })
}

fn parse_a4b_dis_type(name: Option<&str>, ctx: &str) -> Result<A4bDisType> {
    Ok(match name {
        None | Some("none") => A4bDisType::None,
        Some("opcode-e9h") => A4bDisType::Opcode_E9h,
        Some("wren-then-e9h") => A4bDisType::WrenThenE9h,
        Some("bank") => A4bDisType::Bank,
        Some("nvcr") => A4bDisType::Nvcr,
        Some(other) => {
            warn!("external-id: {ctx}: unknown 4b-dis-type {other:?}");
            return Err(Error::JsonDataInvalid);
        }
    })
}

fn parse_io_mode_name(name: &str, ctx: &str) -> Result<IoMode> {
    Ok(match name {
        "single" => IoMode::Single,
        "dual-output" => IoMode::DualOutput,
        "dual-io" => IoMode::DualIo,
        "dual-all" => IoMode::DualAll,
        "quad-output" => IoMode::QuadOutput,
        "quad-io" => IoMode::QuadIo,
        "quad-all" => IoMode::QuadAll,
        "octal-output" => IoMode::OctalOutput,
        "octal-io" => IoMode::OctalIo,
        "octal-all" => IoMode::OctalAll,
        other => {
            warn!("external-id: {ctx}: unknown io-mode {other:?}");
            return Err(Error::JsonDataInvalid);
        }
    })
}

fn parse_io_caps(names: &[String], ctx: &str) -> Result<IoCaps> {
    let mut out = IoCaps::empty();
    for name in names {
        out |= IoCaps::of(parse_io_mode_name(name, ctx)?);
    }
    Ok(out)
}

/// Opcode-table key shape, e.g. `"1-4-4"` -> `IoMode::QuadIo`.
fn parse_io_mode_key(key: &str, ctx: &str) -> Result<IoMode> {
    let mut parts = key.split('-');
    let (cmd, addr, data) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(c), Some(a), Some(d), None) => (c, a, d),
        _ => {
            warn!("external-id: {ctx}: malformed opcode-table key {key:?}");
            return Err(Error::JsonDataInvalid);
        }
    };
    let bw = |s: &str| -> Result<u8> {
        s.parse().map_err(|_| {
            warn!("external-id: {ctx}: malformed bus-width in key {key:?}");
            Error::JsonDataInvalid
        })
    };
    Ok(match (bw(cmd)?, bw(addr)?, bw(data)?) {
        (1, 1, 1) => IoMode::Single,
        (1, 1, 2) => IoMode::DualOutput,
        (1, 2, 2) => IoMode::DualIo,
        (2, 2, 2) => IoMode::DualAll,
        (1, 1, 4) => IoMode::QuadOutput,
        (1, 4, 4) => IoMode::QuadIo,
        (4, 4, 4) => IoMode::QuadAll,
        (1, 1, 8) => IoMode::OctalOutput,
        (1, 8, 8) => IoMode::OctalIo,
        (8, 8, 8) => IoMode::OctalAll,
        _ => {
            warn!("external-id: {ctx}: no io-mode matches key {key:?}");
            return Err(Error::JsonDataInvalid);
        }
    })
}

fn build_opcode_table(
    map: &HashMap<String, IoOpcodeJson>,
    ctx: &str,
) -> Result<IoOpcodeTable> {
    let mut pairs = Vec::with_capacity(map.len());
    for (key, op) in map {
        let mode = parse_io_mode_key(key, ctx)?;
        pairs.push((mode, IoOpcode { opcode: op.opcode, dummy_cycles: op.dummy_cycles, mode_cycles: op.mode_cycles }));
    }
    Ok(IoOpcodeTable::build(&pairs))
}

fn resolve_opcodes(
    table: &ExternalFile,
    r: &Option<OpcodesRef>,
    ctx: &str,
) -> Result<IoOpcodeTable> {
    match r {
        None => Ok(IoOpcodeTable::EMPTY),
        Some(OpcodesRef::Inline(map)) => build_opcode_table(map, ctx),
        Some(OpcodesRef::Named(name)) => {
            let map = table.io_opcodes.get(name).ok_or_else(|| {
                warn!("external-id: {ctx}: no such io-opcodes group {name:?}");
                Error::NotExist
            })?;
            build_opcode_table(map, ctx)
        }
    }
}

fn build_erase_info(entries: &[EraseEntryJson], total_size: u64, ctx: &str) -> Result<EraseInfo> {
    let mut sectors = Vec::with_capacity(entries.len());
    for e in entries {
        let size = e.size.resolve(ctx)?;
        sectors.push(EraseSector::new(e.opcode, size as u32, e.max_erase_time_ms));
    }
    Ok(EraseInfo::uniform(total_size, &sectors))
}

fn resolve_erase_info(table: &ExternalFile, r: &Option<EraseRef>, total_size: u64, ctx: &str) -> Result<Option<EraseInfo>> {
    match r {
        None => Ok(None),
        Some(EraseRef::Inline(entries)) => Ok(Some(build_erase_info(entries, total_size, ctx)?)),
        Some(EraseRef::Named(name)) => {
            let entries = table.erase_groups.get(name).ok_or_else(|| {
                warn!("external-id: {ctx}: no such erase-groups entry {name:?}");
                Error::NotExist
            })?;
            Ok(Some(build_erase_info(entries, total_size, ctx)?))
        }
    }
}

fn build_part(table: &ExternalFile, model: &str, vendor: &VendorJson, json: &PartJson) -> Result<Part> {
    let ctx_owned = alloc::format!("{}/{}", vendor.name, model);
    let ctx = ctx_owned.as_str();

    let size = json.size.resolve(ctx)?;
    let id = PartId::exact(&json.id);
    let read_io_caps = parse_io_caps(&json.read_io_caps, ctx)?;
    let pp_io_caps = parse_io_caps(&json.pp_io_caps, ctx)?;

    if json.wp.is_some() {
        warn!("external-id: {ctx}: named write-protect tables are not supported by the loader; loading without write-protect");
    }

    let otp = json.otp.as_ref().map(|o| OtpLayout::new(o.start_index, o.count, o.size, OtpFamily::Secr));

    let mut alias = Vec::with_capacity(json.alias.len());
    for a in &json.alias {
        alias.push(Alias { vendor: a.vendor.as_deref().map(leak_str), model: leak_str(&a.model) });
    }

    Ok(Part {
        model: leak_str(model),
        display_vendor: Some(VendorRef { name: leak_str(&vendor.name), mfr_id: vendor.mfr_id }),
        id,
        size,
        ndies: json.num_dies.unwrap_or(1),
        page_size: json.page_size.unwrap_or(256),
        flags: parse_part_flags(&json.flags, ctx)?,
        vendor_flags: json.vendor_flags,
        qe_type: parse_qe_type(json.qe_type.as_deref(), ctx)?,
        qpi_en_type: parse_qpi_en_type(json.qpi_en_type.as_deref(), ctx)?,
        qpi_dis_type: parse_qpi_dis_type(json.qpi_dis_type.as_deref(), ctx)?,
        a4b_en_type: parse_a4b_en_type(json.a4b_en_type.as_deref(), ctx)?,
        a4b_dis_type: parse_a4b_dis_type(json.a4b_dis_type.as_deref(), ctx)?,
        a4b_flags: parse_a4b_flags(&json.a4b_flags, ctx)?,
        soft_reset_flags: parse_soft_reset_flags(&json.soft_reset_flags, ctx)?,
        max_speed_spi_mhz: json.max_speed_spi_mhz,
        max_speed_dual_mhz: json.max_speed_dual_mhz,
        max_speed_quad_mhz: json.max_speed_quad_mhz,
        max_pp_time_us: json.max_pp_time_us,
        read_io_caps,
        pp_io_caps,
        erase_info_3b: resolve_erase_info(table, &json.erase_info_3b, size, ctx)?,
        erase_info_4b: resolve_erase_info(table, &json.erase_info_4b, size, ctx)?,
        read_opcodes_3b: resolve_opcodes(table, &json.read_opcodes_3b, ctx)?,
        read_opcodes_4b: resolve_opcodes(table, &json.read_opcodes_4b, ctx)?,
        pp_opcodes_3b: resolve_opcodes(table, &json.pp_opcodes_3b, ctx)?,
        pp_opcodes_4b: resolve_opcodes(table, &json.pp_opcodes_4b, ctx)?,
        otp,
        wp_ranges: None,
        regs: None,
        alias: Vec::leak(alias),
        fixups: None,
        ops: None,
    })
}

/// Parse a JSON document in the §4.8 external-ID format into catalog
/// `Part`s, rejecting the whole file on the first error (malformed field, a
/// dangling named reference, or a model name already present in the
/// built-in catalog).
pub fn parse_external_ids(json: &str) -> Result<Vec<Part>> {
    let file: ExternalFile = serde_json::from_str(json).map_err(|e| {
        warn!("external-id: JSON parse error: {e}");
        Error::JsonTypeInvalid
    })?;

    let mut parts = Vec::new();
    for vendor in file.vendors.values() {
        for (model, part_json) in &vendor.parts {
            if crate::catalog::find_by_name(model).is_some() {
                warn!("external-id: {}/{model}: collides with a built-in catalog part", vendor.name);
                return Err(Error::AlreadyExist);
            }
            parts.push(build_part(&file, model, vendor, part_json)?);
        }
    }
    Ok(parts)
}

/// Read `path` and register its parts with the catalog (§4.8). Any error
/// (file missing, unreadable, malformed, colliding) is logged and leaves
/// the built-in catalog untouched; the return value is the number of parts
/// actually registered.
pub fn load_and_register(path: impl AsRef<Path>) -> usize {
    let path = path.as_ref();
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
        Err(e) => {
            warn!("external-id: failed to read {}: {e}", path.display());
            return 0;
        }
    };
    match parse_external_ids(&contents) {
        Ok(parts) => {
            let count = parts.len();
            crate::catalog::register_external_parts(parts);
            count
        }
        Err(e) => {
            warn!("external-id: {} rejected ({e}); using built-in catalog only", path.display());
            0
        }
    }
}

/// Look for [`DEFAULT_FILENAME`] in the current directory and register it
/// if present (§4.8 "at process start").
pub fn load_default() -> usize {
    load_and_register(DEFAULT_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_part_loads() {
        let json = r#"{
            "vendors": {
                "test-vendor": {
                    "mfr-id": 222,
                    "name": "TestVendor",
                    "parts": {
                        "TV25Q64": {
                            "id": [222, 64, 23],
                            "size": "8m",
                            "flags": ["sect-4k", "unique-id"],
                            "read-io-caps": ["single"],
                            "pp-io-caps": ["single"]
                        }
                    }
                }
            }
        }"#;
        let parts = parse_external_ids(json).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].model, "TV25Q64");
        assert_eq!(parts[0].size, 8 * 1024 * 1024);
        assert!(parts[0].flags.contains(PartFlags::UNIQUE_ID));
    }

    #[test]
    fn unknown_flag_rejects_whole_file() {
        let json = r#"{
            "vendors": {
                "v": { "mfr-id": 1, "name": "V", "parts": {
                    "P": { "id": [1,2,3], "size": 1024, "flags": ["not-a-real-flag"],
                           "read-io-caps": [], "pp-io-caps": [] }
                }}
            }
        }"#;
        assert!(parse_external_ids(json).is_err());
    }

    #[test]
    fn named_erase_group_resolves() {
        let json = r#"{
            "erase-groups": { "std-4k": [{"opcode": 32, "size": 4096, "max-erase-time-ms": 400}] },
            "vendors": {
                "v": { "mfr-id": 1, "name": "V", "parts": {
                    "P": { "id": [1,2,3], "size": 4096, "erase-info-3b": "std-4k",
                           "read-io-caps": [], "pp-io-caps": [] }
                }}
            }
        }"#;
        let parts = parse_external_ids(json).unwrap();
        let erase = parts[0].erase_info_3b.as_ref().unwrap();
        assert_eq!(erase.sector_info[0].size_bytes, 4096);
    }
}
