//! spinor-chips-codegen - build-time code generator for the static flash
//! part database.
//!
//! Parses RON part definitions (the same catalog shape as the hand-written
//! entries in `spinor-core::catalog::parts`, minus the vendor-specific
//! write-protect tables and resolver hooks that aren't representable as
//! data) and emits a `pub fn all() -> Vec<Part>` that `spinor-core`'s build
//! script includes for the `static-parts` feature.

use proc_macro2::{Literal, TokenStream};
use quote::quote;
use serde::Deserialize;

use std::fs;
use std::io;
use std::path::Path;

/// Error type for codegen operations
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Ron(ron::error::SpannedError),
    Validation(String),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ron::error::SpannedError> for Error {
    fn from(e: ron::error::SpannedError) -> Self {
        Error::Ron(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Ron(e) => write!(f, "RON parse error: {}", e),
            Error::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Size specification with human-readable units
#[derive(Debug, Clone, Copy, Deserialize)]
pub enum Size {
    B(u64),
    KiB(u64),
    MiB(u64),
}

impl Size {
    pub fn to_bytes(self) -> u64 {
        match self {
            Size::B(n) => n,
            Size::KiB(n) => n * 1024,
            Size::MiB(n) => n * 1024 * 1024,
        }
    }
}

/// One erase sector type: opcode, size, worst-case time.
#[derive(Debug, Clone, Deserialize)]
pub struct EraseSectorDef {
    pub opcode: u8,
    pub size: Size,
    pub max_erase_time_ms: u32,
}

impl EraseSectorDef {
    fn to_tokens(&self) -> TokenStream {
        let opcode = Literal::u8_unsuffixed(self.opcode);
        let size = Literal::u32_unsuffixed(self.size.to_bytes() as u32);
        let ms = Literal::u32_unsuffixed(self.max_erase_time_ms);
        quote!(EraseSector::new(#opcode, #size, #ms))
    }
}

fn erase_info_tokens(total_size: u64, sectors: &[EraseSectorDef]) -> TokenStream {
    let total = Literal::u64_unsuffixed(total_size);
    let entries: Vec<_> = sectors.iter().map(EraseSectorDef::to_tokens).collect();
    quote!(EraseInfo::uniform(#total, &[#(#entries),*]))
}

/// One `(opcode, dummy-cycles, mode-cycles)` binding for an `IoMode`.
#[derive(Debug, Clone, Deserialize)]
pub struct OpcodeEntryDef {
    pub mode: String,
    pub opcode: u8,
    #[serde(default)]
    pub dummy_cycles: u8,
    #[serde(default)]
    pub mode_cycles: u8,
}

fn io_mode_tokens(name: &str) -> Result<TokenStream, Error> {
    Ok(match name {
        "single" => quote!(IoMode::Single),
        "dual-output" => quote!(IoMode::DualOutput),
        "dual-io" => quote!(IoMode::DualIo),
        "dual-all" => quote!(IoMode::DualAll),
        "quad-output" => quote!(IoMode::QuadOutput),
        "quad-io" => quote!(IoMode::QuadIo),
        "quad-all" => quote!(IoMode::QuadAll),
        "octal-output" => quote!(IoMode::OctalOutput),
        "octal-io" => quote!(IoMode::OctalIo),
        "octal-all" => quote!(IoMode::OctalAll),
        other => return Err(Error::Validation(format!("unknown io-mode {other:?}"))),
    })
}

fn io_caps_tokens(modes: &[String]) -> Result<TokenStream, Error> {
    if modes.is_empty() {
        return Ok(quote!(IoCaps::empty()));
    }
    let bits: Vec<_> = modes.iter().map(|m| io_mode_tokens(m).map(|t| quote!(IoCaps::of(#t)))).collect::<Result<_, _>>()?;
    Ok(quote!(#(#bits)|*))
}

fn opcode_table_tokens(entries: &[OpcodeEntryDef]) -> Result<TokenStream, Error> {
    let pairs: Vec<_> = entries
        .iter()
        .map(|e| {
            let mode = io_mode_tokens(&e.mode)?;
            let opcode = Literal::u8_unsuffixed(e.opcode);
            let dummy = Literal::u8_unsuffixed(e.dummy_cycles);
            let mode_cycles = Literal::u8_unsuffixed(e.mode_cycles);
            Ok(quote!((#mode, IoOpcode { opcode: #opcode, dummy_cycles: #dummy, mode_cycles: #mode_cycles })))
        })
        .collect::<Result<_, Error>>()?;
    Ok(quote!(IoOpcodeTable::build(&[#(#pairs),*])))
}

fn part_flags_tokens(names: &[String]) -> Result<TokenStream, Error> {
    if names.is_empty() {
        return Ok(quote!(PartFlags::empty()));
    }
    let bits: Vec<_> = names
        .iter()
        .map(|n| {
            let tok = match n.as_str() {
                "meta" => quote!(PartFlags::META),
                "no-sfdp" => quote!(PartFlags::NO_SFDP),
                "sect-4k" => quote!(PartFlags::SECT_4K),
                "sect-32k" => quote!(PartFlags::SECT_32K),
                "sect-64k" => quote!(PartFlags::SECT_64K),
                "sect-256k" => quote!(PartFlags::SECT_256K),
                "sr-volatile" => quote!(PartFlags::SR_VOLATILE),
                "sr-nonvolatile" => quote!(PartFlags::SR_NONVOLATILE),
                "sr-volatile-wren-50h" => quote!(PartFlags::SR_VOLATILE_WREN_50H),
                "unique-id" => quote!(PartFlags::UNIQUE_ID),
                "full-dpi-opcodes" => quote!(PartFlags::FULL_DPI_OPCODES),
                "full-qpi-opcodes" => quote!(PartFlags::FULL_QPI_OPCODES),
                "sfdp-4b-mode" => quote!(PartFlags::SFDP_4B_MODE),
                "global-block-unlock" => quote!(PartFlags::GLOBAL_BLOCK_UNLOCK),
                "aai-word-program" => quote!(PartFlags::AAI_WORD_PROGRAM),
                "no-wren" => quote!(PartFlags::NO_WREN),
                "no-op" => quote!(PartFlags::NO_OP),
                "pp-dual-input" => quote!(PartFlags::PP_DUAL_INPUT),
                other => return Err(Error::Validation(format!("unknown flag {other:?}"))),
            };
            Ok(tok)
        })
        .collect::<Result<_, Error>>()?;
    Ok(quote!(#(#bits)|*))
}

fn qe_type_tokens(name: Option<&str>) -> Result<TokenStream, Error> {
    Ok(match name {
        None | Some("dont-care") => quote!(QeType::DontCare),
        Some("sr1-bit6") => quote!(QeType::Sr1Bit6),
        Some("sr2-bit1") => quote!(QeType::Sr2Bit1),
        Some("sr2-bit1-wrsr1") => quote!(QeType::Sr2Bit1WrSr1),
        Some("sr2-bit7") => quote!(QeType::Sr2Bit7),
        Some("nvcr-bit4") => quote!(QeType::NvcrBit4),
        Some("unknown") => quote!(QeType::Unknown),
        Some(other) => return Err(Error::Validation(format!("unknown qe-type {other:?}"))),
    })
}

fn a4b_en_type_tokens(name: Option<&str>) -> Result<TokenStream, Error> {
    Ok(match name {
        None | Some("none") => quote!(A4bEnType::None),
        Some("opcode-b7h") => quote!(A4bEnType::Opcode_B7h),
        Some("wren-then-b7h") => quote!(A4bEnType::WrenThenB7h),
        Some("bank") => quote!(A4bEnType::Bank),
        Some("nvcr") => quote!(A4bEnType::Nvcr),
        Some(other) => return Err(Error::Validation(format!("unknown 4b-en-type {other:?}"))),
    })
}

fn a4b_dis_type_tokens(name: Option<&str>) -> Result<TokenStream, Error> {
    Ok(match name {
        None | Some("none") => quote!(A4bDisType::None),
        Some("opcode-e9h") => quote!(A4bDisType::Opcode_E9h),
        Some("wren-then-e9h") => quote!(A4bDisType::WrenThenE9h),
        Some("bank") => quote!(A4bDisType::Bank),
        Some("nvcr") => quote!(A4bDisType::Nvcr),
        Some(other) => return Err(Error::Validation(format!("unknown 4b-dis-type {other:?}"))),
    })
}

fn a4b_flags_tokens(names: &[String]) -> Result<TokenStream, Error> {
    if names.is_empty() {
        return Ok(quote!(A4bFlags::empty()));
    }
    let bits: Vec<_> = names
        .iter()
        .map(|n| {
            let tok = match n.as_str() {
                "always-4b" => quote!(A4bFlags::ALWAYS_4B),
                "dedicated-4b-opcodes" => quote!(A4bFlags::DEDICATED_4B_OPCODES),
                "b7h-e9h" => quote!(A4bFlags::B7H_E9H),
                "wren-required" => quote!(A4bFlags::WREN_REQUIRED),
                "bank-register" => quote!(A4bFlags::BANK_REGISTER),
                "nvcr-bit" => quote!(A4bFlags::NVCR_BIT),
                other => return Err(Error::Validation(format!("unknown 4b-flag {other:?}"))),
            };
            Ok(tok)
        })
        .collect::<Result<_, Error>>()?;
    Ok(quote!(#(#bits)|*))
}

fn otp_family_tokens(name: &str) -> Result<TokenStream, Error> {
    Ok(match name {
        "secr" => quote!(OtpFamily::Secr),
        "scur" => quote!(OtpFamily::Scur),
        "paged" => quote!(OtpFamily::Paged),
        "eon1" => quote!(OtpFamily::Eon1),
        "eon2" => quote!(OtpFamily::Eon2),
        "eon3" => quote!(OtpFamily::Eon3),
        "eon4" => quote!(OtpFamily::Eon4),
        "atmel-raw" => quote!(OtpFamily::AtmelRaw),
        other => return Err(Error::Validation(format!("unknown otp family {other:?}"))),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpDef {
    pub start_index: u32,
    pub count: u32,
    pub size: u32,
    pub family: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AliasDef {
    #[serde(default)]
    pub vendor: Option<String>,
    pub model: String,
}

/// Single part definition in RON format.
#[derive(Debug, Clone, Deserialize)]
pub struct PartDef {
    pub name: String,
    pub id: Vec<u8>,
    pub total_size: Size,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub qe_type: Option<String>,
    #[serde(default)]
    pub a4b_en_type: Option<String>,
    #[serde(default)]
    pub a4b_dis_type: Option<String>,
    #[serde(default)]
    pub a4b_flags: Vec<String>,
    #[serde(default)]
    pub max_speed_spi_mhz: u32,
    #[serde(default)]
    pub max_speed_dual_mhz: u32,
    #[serde(default)]
    pub max_speed_quad_mhz: u32,
    #[serde(default)]
    pub max_pp_time_us: u32,
    #[serde(default)]
    pub read_io_caps: Vec<String>,
    #[serde(default)]
    pub pp_io_caps: Vec<String>,
    #[serde(default)]
    pub read_opcodes_3b: Vec<OpcodeEntryDef>,
    #[serde(default)]
    pub read_opcodes_4b: Vec<OpcodeEntryDef>,
    #[serde(default)]
    pub pp_opcodes_3b: Vec<OpcodeEntryDef>,
    #[serde(default)]
    pub pp_opcodes_4b: Vec<OpcodeEntryDef>,
    pub erase_sectors_3b: Vec<EraseSectorDef>,
    #[serde(default)]
    pub erase_sectors_4b: Option<Vec<EraseSectorDef>>,
    #[serde(default)]
    pub otp: Option<OtpDef>,
    #[serde(default)]
    pub alias: Vec<AliasDef>,
}

fn default_page_size() -> u32 {
    256
}

/// Vendor definition containing multiple parts
#[derive(Debug, Clone, Deserialize)]
pub struct VendorDef {
    pub vendor: String,
    pub manufacturer_id: u8,
    pub parts: Vec<PartDef>,
}

/// Complete part database
#[derive(Debug, Clone)]
pub struct PartDatabase {
    pub vendors: Vec<VendorDef>,
}

impl PartDatabase {
    /// Load part database from a directory containing RON files
    pub fn load_from_dir(dir: &Path) -> Result<Self, Error> {
        let mut vendors = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "ron") {
                let content = fs::read_to_string(&path)?;
                let vendor: VendorDef = ron::from_str(&content)?;
                vendors.push(vendor);
            }
        }

        vendors.sort_by(|a, b| a.vendor.cmp(&b.vendor));

        Ok(PartDatabase { vendors })
    }

    /// Validate the part database
    pub fn validate(&self) -> Result<(), Error> {
        for vendor in &self.vendors {
            for part in &vendor.parts {
                if part.erase_sectors_3b.is_empty() {
                    return Err(Error::Validation(format!("part {} has no erase sectors defined", part.name)));
                }
                if part.id.is_empty() {
                    return Err(Error::Validation(format!("part {} has an empty id", part.name)));
                }
            }
        }
        Ok(())
    }

    /// Generate Rust code for the part database: a `pub fn all() -> Vec<Part>`.
    pub fn generate_code(&self) -> Result<String, Error> {
        let mut part_defs = Vec::new();

        for vendor in &self.vendors {
            for part in &vendor.parts {
                let name = &part.name;
                let id_bytes: Vec<_> = part.id.iter().map(|b| Literal::u8_unsuffixed(*b)).collect();
                let vendor_name = &vendor.vendor;
                let mfr_id = Literal::u8_unsuffixed(vendor.manufacturer_id);
                let size = Literal::u64_unsuffixed(part.total_size.to_bytes());
                let page_size = Literal::u32_unsuffixed(part.page_size);
                let flags = part_flags_tokens(&part.flags)?;
                let qe_type = qe_type_tokens(part.qe_type.as_deref())?;
                let a4b_en = a4b_en_type_tokens(part.a4b_en_type.as_deref())?;
                let a4b_dis = a4b_dis_type_tokens(part.a4b_dis_type.as_deref())?;
                let a4b_flags = a4b_flags_tokens(&part.a4b_flags)?;
                let spi_mhz = Literal::u32_unsuffixed(part.max_speed_spi_mhz);
                let dual_mhz = Literal::u32_unsuffixed(part.max_speed_dual_mhz);
                let quad_mhz = Literal::u32_unsuffixed(part.max_speed_quad_mhz);
                let pp_us = Literal::u32_unsuffixed(part.max_pp_time_us);
                let read_caps = io_caps_tokens(&part.read_io_caps)?;
                let pp_caps = io_caps_tokens(&part.pp_io_caps)?;
                let read_3b = opcode_table_tokens(&part.read_opcodes_3b)?;
                let read_4b = opcode_table_tokens(&part.read_opcodes_4b)?;
                let pp_3b = opcode_table_tokens(&part.pp_opcodes_3b)?;
                let pp_4b = opcode_table_tokens(&part.pp_opcodes_4b)?;
                let erase_3b = erase_info_tokens(part.total_size.to_bytes(), &part.erase_sectors_3b);
                let erase_4b = match &part.erase_sectors_4b {
                    Some(sectors) => {
                        let tokens = erase_info_tokens(part.total_size.to_bytes(), sectors);
                        quote!(Some(#tokens))
                    }
                    None => quote!(None),
                };
                // `PartBuilder::otp` takes a bare `OtpLayout`, not an `Option`,
                // so a part without one simply omits the `.otp(...)` call
                // rather than passing `None`.
                let otp_call = match &part.otp {
                    Some(o) => {
                        let start = Literal::u32_unsuffixed(o.start_index);
                        let count = Literal::u32_unsuffixed(o.count);
                        let size = Literal::u32_unsuffixed(o.size);
                        let family = otp_family_tokens(&o.family)?;
                        quote!(.otp(OtpLayout::new(#start, #count, #size, #family)))
                    }
                    None => quote!(),
                };
                let alias: Vec<_> = part
                    .alias
                    .iter()
                    .map(|a| {
                        let model = &a.model;
                        match &a.vendor {
                            Some(v) => quote!(Alias { vendor: Some(#v), model: #model }),
                            None => quote!(Alias { vendor: None, model: #model }),
                        }
                    })
                    .collect();
                let alias_slice = if alias.is_empty() { quote!(&[]) } else { quote!(&[#(#alias),*]) };

                part_defs.push(quote! {
                    PartBuilder::new(#name, PartId::exact(&[#(#id_bytes),*]), #size)
                        .vendor(#vendor_name, #mfr_id)
                        .flags(#flags)
                        .qe_type(#qe_type)
                        .a4b(#a4b_en, #a4b_dis, #a4b_flags)
                        .speeds(#spi_mhz, #dual_mhz, #quad_mhz)
                        .max_pp_time_us(#pp_us)
                        .page_size(#page_size)
                        .io_caps(#read_caps, #pp_caps)
                        .read_opcodes_3b(#read_3b)
                        .read_opcodes_4b(#read_4b)
                        .pp_opcodes_3b(#pp_3b)
                        .pp_opcodes_4b(#pp_4b)
                        .erase_info(#erase_3b, #erase_4b)
                        #otp_call
                        .alias(#alias_slice)
                        .build()
                });
            }
        }

        let tokens = quote! {
            // Generated by spinor-chips-codegen. Do not edit manually.

            /// Parts declared in the build-time RON fixtures (`static-parts`).
            pub fn all() -> alloc::vec::Vec<Part> {
                alloc::vec![
                    #(#part_defs),*
                ]
            }
        };

        let syntax_tree = syn::parse2(tokens.clone()).map_err(|e| Error::Validation(format!("generated code failed to parse: {e}")))?;
        Ok(prettyplease::unparse(&syntax_tree))
    }

    pub fn part_count(&self) -> usize {
        self.vendors.iter().map(|v| v.parts.len()).sum()
    }
}

/// Generate code from a RON fixtures directory and write it to `output_file`.
pub fn generate(chips_dir: &Path, output_file: &Path) -> Result<(), Error> {
    let db = PartDatabase::load_from_dir(chips_dir)?;
    db.validate()?;
    let code = db.generate_code()?;
    fs::write(output_file, code)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_vendor() {
        let ron = r#"
        (
            vendor: "Winbond",
            manufacturer_id: 0xEF,
            parts: [
                (
                    name: "W25Q128JV",
                    id: [0xEF, 0x40, 0x18],
                    total_size: MiB(16),
                    flags: ["sect-4k", "sect-32k", "sect-64k"],
                    qe_type: Some("sr2-bit1"),
                    max_pp_time_us: 3000,
                    read_io_caps: ["single", "quad-io"],
                    pp_io_caps: ["single"],
                    read_opcodes_3b: [(mode: "single", opcode: 0x0B, dummy_cycles: 8)],
                    pp_opcodes_3b: [(mode: "single", opcode: 0x02)],
                    erase_sectors_3b: [
                        (opcode: 0x20, size: KiB(4), max_erase_time_ms: 400),
                        (opcode: 0xD8, size: KiB(64), max_erase_time_ms: 2000),
                    ],
                ),
            ],
        )
        "#;
        let vendor: VendorDef = ron::from_str(ron).unwrap();
        assert_eq!(vendor.vendor, "Winbond");
        assert_eq!(vendor.parts.len(), 1);
        assert_eq!(vendor.parts[0].id, vec![0xEF, 0x40, 0x18]);
        assert_eq!(vendor.parts[0].total_size.to_bytes(), 16 * 1024 * 1024);
    }

    #[test]
    fn generates_parseable_rust_code() {
        let db = PartDatabase {
            vendors: vec![VendorDef {
                vendor: "Winbond".into(),
                manufacturer_id: 0xEF,
                parts: vec![PartDef {
                    name: "W25Q128JV".into(),
                    id: vec![0xEF, 0x40, 0x18],
                    total_size: Size::MiB(16),
                    page_size: 256,
                    flags: vec!["sect-4k".into()],
                    qe_type: Some("sr2-bit1".into()),
                    a4b_en_type: None,
                    a4b_dis_type: None,
                    a4b_flags: vec![],
                    max_speed_spi_mhz: 104,
                    max_speed_dual_mhz: 104,
                    max_speed_quad_mhz: 104,
                    max_pp_time_us: 3000,
                    read_io_caps: vec!["single".into()],
                    pp_io_caps: vec!["single".into()],
                    read_opcodes_3b: vec![OpcodeEntryDef { mode: "single".into(), opcode: 0x0B, dummy_cycles: 8, mode_cycles: 0 }],
                    read_opcodes_4b: vec![],
                    pp_opcodes_3b: vec![OpcodeEntryDef { mode: "single".into(), opcode: 0x02, dummy_cycles: 0, mode_cycles: 0 }],
                    pp_opcodes_4b: vec![],
                    erase_sectors_3b: vec![EraseSectorDef { opcode: 0x20, size: Size::KiB(4), max_erase_time_ms: 400 }],
                    erase_sectors_4b: None,
                    otp: None,
                    alias: vec![],
                }],
            }],
        };
        let code = db.generate_code().unwrap();
        assert!(code.contains("pub fn all"));
        assert!(code.contains("W25Q128JV"));
    }

    #[test]
    fn rejects_unknown_flag_names() {
        assert!(part_flags_tokens(&["not-a-real-flag".to_string()]).is_err());
    }
}
