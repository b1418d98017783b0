//! Representative catalog entries (§4.2), one `const`-style builder chain
//! per part, grouped by vendor. Not exhaustive - a production deployment
//! adds further parts as one function each, or loads them at runtime via
//! the external-ID loader.

use crate::part::{
    A4bDisType, A4bEnType, A4bFlags, Alias, EraseInfo, EraseSector, IoOpcodeTable, OtpFamily, OtpLayout, Part,
    PartBuilder, PartFlags, PartId, QeType,
};
use crate::spi::opcodes::*;
use crate::spi::{IoCaps, IoMode, IoOpcode};
use crate::wp::{RegisterAccess, WpInfo, WpRange, WpRangeKind};

use super::vendors::mfr_id::{ATMEL_ADESTO, GIGADEVICE, ISSI, MACRONIX, MICROCHIP_SST, MICRON, WINBOND};

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;

fn winbond_bp_table() -> &'static [WpRange] {
    // BP2-0 block-count ranges, upper half of the die protected; TB/CMP
    // variants are declared per-part where a datasheet calls for them.
    // A representative (not exhaustive) slice of the real 3-bit BP table.
    &[
        WpRange::new(WpRangeKind::None, 0, 0b0000_0000),
        WpRange::new(WpRangeKind::BpUpper, 0, 0b0000_0100),
        WpRange::new(WpRangeKind::BpUpper, 1, 0b0000_1000),
        WpRange::new(WpRangeKind::BpUpper, 2, 0b0000_1100),
        WpRange::new(WpRangeKind::BpUpper, 3, 0b0001_0000),
        WpRange::new(WpRangeKind::BpUpper, 4, 0b0001_0100),
        WpRange::new(WpRangeKind::BpUpper, 5, 0b0001_1000),
        WpRange::new(WpRangeKind::All, 0, 0b0001_1100),
    ]
}

/// Winbond W25Q128JV: 16 MiB, SR2-bit-1 quad enable, no 4-byte addressing
/// needed (scenario 1: must resolve to this exact model, not a sibling
/// silicon revision).
pub fn w25q128jv() -> Part {
    PartBuilder::new("W25Q128JV", PartId::exact(&[0xEF, 0x40, 0x18]), 16 * MIB)
        .vendor("Winbond", WINBOND)
        .flags(
            PartFlags::SECT_4K
                | PartFlags::SECT_32K
                | PartFlags::SECT_64K
                | PartFlags::SR_NONVOLATILE
                | PartFlags::GLOBAL_BLOCK_UNLOCK,
        )
        .qe_type(QeType::Sr2Bit1)
        .speeds(104, 104, 104)
        .max_pp_time_us(3_000)
        .io_caps(
            IoCaps::SINGLE | IoCaps::DUAL_OUTPUT | IoCaps::DUAL_IO | IoCaps::QUAD_OUTPUT | IoCaps::QUAD_IO,
            IoCaps::SINGLE | IoCaps::QUAD_OUTPUT,
        )
        .read_opcodes_3b(IoOpcodeTable::build(&[
            (IoMode::Single, IoOpcode::with_dummy(FAST_READ, 8)),
            (IoMode::DualOutput, IoOpcode::with_dummy(DOR, 8)),
            (IoMode::DualIo, IoOpcode::with_dummy(DIOR, 4)),
            (IoMode::QuadOutput, IoOpcode::with_dummy(QOR, 8)),
            (IoMode::QuadIo, IoOpcode::with_dummy(QIOR, 4)),
        ]))
        .pp_opcodes_3b(IoOpcodeTable::build(&[
            (IoMode::Single, IoOpcode::simple(PP)),
            (IoMode::QuadOutput, IoOpcode::simple(QPP)),
        ]))
        .erase_info(
            EraseInfo::uniform(
                16 * MIB,
                &[
                    EraseSector::new(SE_20, 4 * 1024, 400),
                    EraseSector::new(BE_52, 32 * 1024, 1600),
                    EraseSector::new(BE_D8, 64 * 1024, 2000),
                ],
            ),
            None,
        )
        .wp_ranges(WpInfo { ranges: winbond_bp_table(), access: RegisterAccess::winbond_standard(RDSR, WRSR) })
        .build()
}

/// Winbond W25Q256JV: 32 MiB, requires 4-byte addressing past 16 MiB.
/// Supports both dedicated 4B opcodes and the B7h/E9h mode switch; the
/// negotiator picks dedicated opcodes first (scenario 5: `0x6C` QOR_4B).
pub fn w25q256jv() -> Part {
    PartBuilder::new("W25Q256JV", PartId::exact(&[0xEF, 0x40, 0x19]), 32 * MIB)
        .vendor("Winbond", WINBOND)
        .flags(PartFlags::SECT_4K | PartFlags::SECT_32K | PartFlags::SECT_64K | PartFlags::SR_NONVOLATILE)
        .qe_type(QeType::Sr2Bit1)
        .a4b(A4bEnType::Opcode_B7h, A4bDisType::Opcode_E9h, A4bFlags::DEDICATED_4B_OPCODES | A4bFlags::B7H_E9H)
        .speeds(104, 104, 104)
        .max_pp_time_us(3_000)
        .io_caps(
            IoCaps::SINGLE | IoCaps::DUAL_OUTPUT | IoCaps::DUAL_IO | IoCaps::QUAD_OUTPUT | IoCaps::QUAD_IO,
            IoCaps::SINGLE | IoCaps::QUAD_OUTPUT,
        )
        .read_opcodes_3b(IoOpcodeTable::build(&[
            (IoMode::Single, IoOpcode::with_dummy(FAST_READ, 8)),
            (IoMode::QuadIo, IoOpcode::with_dummy(QIOR, 4)),
        ]))
        .read_opcodes_4b(IoOpcodeTable::build(&[
            (IoMode::Single, IoOpcode::with_dummy(FAST_READ_4B, 8)),
            (IoMode::DualOutput, IoOpcode::with_dummy(DOR_4B, 8)),
            (IoMode::DualIo, IoOpcode::with_dummy(DIOR_4B, 4)),
            (IoMode::QuadOutput, IoOpcode::with_dummy(QOR_4B, 8)),
            (IoMode::QuadIo, IoOpcode::with_dummy(QIOR_4B, 4)),
        ]))
        .pp_opcodes_3b(IoOpcodeTable::build(&[(IoMode::Single, IoOpcode::simple(PP))]))
        .pp_opcodes_4b(IoOpcodeTable::build(&[
            (IoMode::Single, IoOpcode::simple(PP_4B)),
            (IoMode::QuadOutput, IoOpcode::simple(QPP_4B)),
        ]))
        .erase_info(
            EraseInfo::uniform(
                32 * MIB,
                &[
                    EraseSector::new(SE_20, 4 * 1024, 400),
                    EraseSector::new(BE_52, 32 * 1024, 1600),
                    EraseSector::new(BE_D8, 64 * 1024, 2000),
                ],
            ),
            Some(EraseInfo::uniform(
                32 * MIB,
                &[
                    EraseSector::new(SE_21, 4 * 1024, 400),
                    EraseSector::new(BE_5C, 32 * 1024, 1600),
                    EraseSector::new(BE_DC, 64 * 1024, 2000),
                ],
            )),
        )
        .wp_ranges(WpInfo { ranges: winbond_bp_table(), access: RegisterAccess::winbond_standard(RDSR, WRSR) })
        .build()
}

/// Macronix MX25L25645G: 32 MiB, dedicated 4-byte opcodes only (no B7h
/// mode switch needed - scenario 2: `erase_at` at the 16 MiB boundary
/// issues `DCh` with a 4-byte address and never touches EAR).
pub fn mx25l25645g() -> Part {
    PartBuilder::new("MX25L25645G", PartId::exact(&[0xC2, 0x20, 0x19]), 32 * MIB)
        .vendor("Macronix", MACRONIX)
        .flags(PartFlags::SECT_4K | PartFlags::SECT_32K | PartFlags::SECT_64K | PartFlags::SR_NONVOLATILE)
        .qe_type(QeType::Sr1Bit6)
        .a4b(A4bEnType::None, A4bDisType::None, A4bFlags::DEDICATED_4B_OPCODES)
        .speeds(86, 86, 86)
        .max_pp_time_us(3_000)
        .io_caps(
            IoCaps::SINGLE | IoCaps::DUAL_OUTPUT | IoCaps::QUAD_OUTPUT | IoCaps::QUAD_IO,
            IoCaps::SINGLE | IoCaps::QUAD_OUTPUT,
        )
        .read_opcodes_3b(IoOpcodeTable::build(&[
            (IoMode::Single, IoOpcode::with_dummy(FAST_READ, 8)),
            (IoMode::QuadIo, IoOpcode::with_dummy(QIOR, 6)),
        ]))
        .read_opcodes_4b(IoOpcodeTable::build(&[
            (IoMode::Single, IoOpcode::with_dummy(FAST_READ_4B, 8)),
            (IoMode::DualOutput, IoOpcode::with_dummy(DOR_4B, 8)),
            (IoMode::QuadOutput, IoOpcode::with_dummy(QOR_4B, 8)),
            (IoMode::QuadIo, IoOpcode::with_dummy(QIOR_4B, 6)),
        ]))
        .pp_opcodes_3b(IoOpcodeTable::build(&[(IoMode::Single, IoOpcode::simple(PP))]))
        .pp_opcodes_4b(IoOpcodeTable::build(&[(IoMode::Single, IoOpcode::simple(PP_4B))]))
        .erase_info(
            EraseInfo::uniform(
                32 * MIB,
                &[
                    EraseSector::new(SE_20, 4 * 1024, 400),
                    EraseSector::new(BE_52, 32 * 1024, 1600),
                    EraseSector::new(BE_D8, 64 * 1024, 2000),
                ],
            ),
            Some(EraseInfo::uniform(
                32 * MIB,
                &[
                    EraseSector::new(SE_21, 4 * 1024, 400),
                    EraseSector::new(BE_5C, 32 * 1024, 1600),
                    EraseSector::new(BE_DC, 64 * 1024, 2000),
                ],
            )),
        )
        .build()
}

/// GigaDevice GD25Q128C: quad enable via the combined 2-byte WRSR starting
/// at opcode `01h` (scenario 3).
pub fn gd25q128c() -> Part {
    PartBuilder::new("GD25Q128C", PartId::exact(&[0xC8, 0x40, 0x18]), 16 * MIB)
        .vendor("GigaDevice", GIGADEVICE)
        .flags(PartFlags::SECT_4K | PartFlags::SECT_32K | PartFlags::SECT_64K | PartFlags::SR_NONVOLATILE)
        .qe_type(QeType::Sr2Bit1WrSr1)
        .speeds(104, 104, 104)
        .max_pp_time_us(3_000)
        .io_caps(
            IoCaps::SINGLE | IoCaps::DUAL_OUTPUT | IoCaps::DUAL_IO | IoCaps::QUAD_OUTPUT | IoCaps::QUAD_IO,
            IoCaps::SINGLE | IoCaps::QUAD_OUTPUT,
        )
        .read_opcodes_3b(IoOpcodeTable::build(&[
            (IoMode::Single, IoOpcode::with_dummy(FAST_READ, 8)),
            (IoMode::QuadIo, IoOpcode::with_dummy(QIOR, 4)),
        ]))
        .pp_opcodes_3b(IoOpcodeTable::build(&[
            (IoMode::Single, IoOpcode::simple(PP)),
            (IoMode::QuadOutput, IoOpcode::simple(QPP)),
        ]))
        .erase_info(
            EraseInfo::uniform(
                16 * MIB,
                &[
                    EraseSector::new(SE_20, 4 * 1024, 400),
                    EraseSector::new(BE_52, 32 * 1024, 1600),
                    EraseSector::new(BE_D8, 64 * 1024, 2000),
                ],
            ),
            None,
        )
        .wp_ranges(WpInfo { ranges: winbond_bp_table(), access: RegisterAccess::winbond_standard(RDSR, WRSR) })
        .build()
}

/// Adesto/Atmel AT25DF321A: 4 MiB, raw linear OTP accessed via the
/// Atmel-style 77h/9Bh opcodes (scenario 4: `otp_read` issues `77h`).
pub fn at25df321a() -> Part {
    PartBuilder::new("AT25DF321A", PartId::exact(&[0x1F, 0x47, 0x01]), 4 * MIB)
        .vendor("Adesto/Atmel", ATMEL_ADESTO)
        .flags(PartFlags::SECT_4K | PartFlags::SECT_32K | PartFlags::SECT_64K | PartFlags::SR_NONVOLATILE)
        .speeds(70, 70, 0)
        .max_pp_time_us(4_000)
        .io_caps(IoCaps::SINGLE | IoCaps::DUAL_OUTPUT, IoCaps::SINGLE)
        .read_opcodes_3b(IoOpcodeTable::build(&[
            (IoMode::Single, IoOpcode::with_dummy(FAST_READ, 8)),
            (IoMode::DualOutput, IoOpcode::with_dummy(DOR, 8)),
        ]))
        .pp_opcodes_3b(IoOpcodeTable::build(&[(IoMode::Single, IoOpcode::simple(PP))]))
        .erase_info(
            EraseInfo::uniform(
                4 * MIB,
                &[
                    EraseSector::new(SE_20, 4 * 1024, 400),
                    EraseSector::new(BE_52, 32 * 1024, 1000),
                    EraseSector::new(BE_D8, 64 * 1024, 1500),
                ],
            ),
            None,
        )
        .otp(OtpLayout::new(0, 1, 128, OtpFamily::AtmelRaw))
        .build()
}

/// Microchip/SST SST25VF040B: 512 KiB, legacy AAI auto-address-increment
/// word program instead of page program (scenario 6).
pub fn sst25vf040b() -> Part {
    PartBuilder::new("SST25VF040B", PartId::exact(&[0xBF, 0x25, 0x8D]), 512 * KIB)
        .vendor("Microchip/SST", MICROCHIP_SST)
        .flags(PartFlags::SECT_4K | PartFlags::AAI_WORD_PROGRAM | PartFlags::SR_VOLATILE_WREN_50H)
        .speeds(66, 0, 0)
        .max_pp_time_us(50)
        .io_caps(IoCaps::SINGLE, IoCaps::SINGLE)
        .read_opcodes_3b(IoOpcodeTable::build(&[(IoMode::Single, IoOpcode::with_dummy(FAST_READ, 8))]))
        .pp_opcodes_3b(IoOpcodeTable::build(&[(IoMode::Single, IoOpcode::simple(PP))]))
        .erase_info(EraseInfo::uniform(512 * KIB, &[EraseSector::new(SE_20, 4 * 1024, 25)]), None)
        .build()
}

/// ISSI IS25LP064A: 8 MiB, breadth part exercising the SR2-bit-7 quad
/// enable procedure.
pub fn is25lp064a() -> Part {
    PartBuilder::new("IS25LP064A", PartId::exact(&[0x9D, 0x60, 0x17]), 8 * MIB)
        .vendor("ISSI", ISSI)
        .flags(PartFlags::SECT_4K | PartFlags::SECT_32K | PartFlags::SECT_64K | PartFlags::SR_NONVOLATILE)
        .qe_type(QeType::Sr2Bit7)
        .speeds(104, 104, 104)
        .max_pp_time_us(1_500)
        .io_caps(
            IoCaps::SINGLE | IoCaps::DUAL_OUTPUT | IoCaps::QUAD_OUTPUT | IoCaps::QUAD_IO,
            IoCaps::SINGLE | IoCaps::QUAD_OUTPUT,
        )
        .read_opcodes_3b(IoOpcodeTable::build(&[
            (IoMode::Single, IoOpcode::with_dummy(FAST_READ, 8)),
            (IoMode::QuadIo, IoOpcode::with_dummy(QIOR, 4)),
        ]))
        .pp_opcodes_3b(IoOpcodeTable::build(&[(IoMode::Single, IoOpcode::simple(PP))]))
        .erase_info(
            EraseInfo::uniform(
                8 * MIB,
                &[
                    EraseSector::new(SE_20, 4 * 1024, 300),
                    EraseSector::new(BE_52, 32 * 1024, 1200),
                    EraseSector::new(BE_D8, 64 * 1024, 1500),
                ],
            ),
            None,
        )
        .build()
}

/// Micron N25Q128A: 16 MiB, breadth part exercising the NVCR-bit-4 quad
/// enable and non-volatile configuration register 4B strategy.
pub fn n25q128a() -> Part {
    PartBuilder::new("N25Q128A", PartId::exact(&[0x20, 0xBA, 0x18]), 16 * MIB)
        .vendor("Micron", MICRON)
        .flags(PartFlags::SECT_4K | PartFlags::SECT_32K | PartFlags::SECT_64K | PartFlags::SR_NONVOLATILE)
        .qe_type(QeType::NvcrBit4)
        .speeds(108, 108, 108)
        .max_pp_time_us(2_000)
        .io_caps(
            IoCaps::SINGLE | IoCaps::DUAL_OUTPUT | IoCaps::DUAL_IO | IoCaps::QUAD_OUTPUT | IoCaps::QUAD_IO,
            IoCaps::SINGLE | IoCaps::QUAD_OUTPUT,
        )
        .read_opcodes_3b(IoOpcodeTable::build(&[
            (IoMode::Single, IoOpcode::with_dummy(FAST_READ, 8)),
            (IoMode::QuadIo, IoOpcode::with_dummy(QIOR, 10)),
        ]))
        .pp_opcodes_3b(IoOpcodeTable::build(&[(IoMode::Single, IoOpcode::simple(PP))]))
        .erase_info(
            EraseInfo::uniform(
                16 * MIB,
                &[
                    EraseSector::new(SE_20, 4 * 1024, 400),
                    EraseSector::new(BE_52, 32 * 1024, 1600),
                    EraseSector::new(BE_D8, 64 * 1024, 2000),
                ],
            ),
            None,
        )
        .alias(&[Alias { vendor: None, model: "N25Q128A13" }])
        .build()
}

/// All builtin parts, in catalog order.
pub fn all() -> alloc::vec::Vec<Part> {
    alloc::vec![
        w25q128jv(),
        w25q256jv(),
        mx25l25645g(),
        gd25q128c(),
        at25df321a(),
        sst25vf040b(),
        is25lp064a(),
        n25q128a(),
    ]
}
