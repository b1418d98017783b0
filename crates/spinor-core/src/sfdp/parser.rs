//! SFDP header-chain walk: read the 8-byte header, follow each parameter
//! header to its table, and parse the Basic Flash Parameter Table and (if
//! present) the 4-Byte Address Instruction Table (§4.3).
//!
//! The sector map table and vendor tables are detected (their presence is
//! reported) but not decoded into typed structures - no caller in this
//! crate needs more than "is a sector map present" today.
//!
//! DWORD decoding is split into plain sync functions (`decode_bfpt`,
//! `decode_4b_table`) so it can be unit tested without a Transport; the
//! `async fn`s here only own the header-chain walk and the bus reads.

use crate::spi::{opcodes, AddrPhase, AddressWidth, CmdPhase, DataPhase, DummyPhase, Op, PhaseWidth};
use crate::transport::Transport;

use super::types::{
    AddressMode, BasicFlashParams, FastReadParams, FourByteAddrEraseOpcodes, FourByteAddrInstructions,
    FourByteAddrTable, FourByteEntryMethods, ParameterHeader, QuadEnableRequirement, SfdpEraseType, SfdpHeader,
    SfdpInfo, SfdpRevision, SoftResetSupport, WriteEnableForVolatileSr, MAX_PARAMETER_HEADERS, PARAM_ID_4BYTE_ADDR,
    PARAM_ID_BASIC, PARAM_ID_SECTOR_MAP,
};

/// Read `buf.len()` bytes starting at SFDP byte offset `addr` using opcode
/// 5Ah, a 3-byte address and 8 dummy cycles, all at `cmd_bw` lines.
#[maybe_async::maybe_async]
async fn read_sfdp(transport: &mut dyn Transport, addr: u32, buf: &mut [u8], cmd_bw: u8) -> bool {
    let width = PhaseWidth::sdr(cmd_bw);
    let mut op = Op {
        cmd: CmdPhase { len: 1, width, opcode: opcodes::RDSFDP },
        addr: AddrPhase { len: AddressWidth::ThreeByte.bytes(), width, val: addr },
        dummy: DummyPhase { len: 8, width },
        data: DataPhase::read(buf, width),
    };
    if !transport.supports_op(&op) {
        return false;
    }
    transport.exec_op(&mut op).await.into_result().is_ok()
}

#[maybe_async::maybe_async]
async fn read_dword(transport: &mut dyn Transport, addr: u32, cmd_bw: u8) -> Option<u32> {
    let mut buf = [0u8; 4];
    if !read_sfdp(transport, addr, &mut buf, cmd_bw).await {
        return None;
    }
    Some(u32::from_le_bytes(buf))
}

#[maybe_async::maybe_async]
async fn read_table_dwords(
    transport: &mut dyn Transport,
    ph: &ParameterHeader,
    cmd_bw: u8,
    out: &mut [u32],
) -> usize {
    let n = out.len().min(ph.length_dwords as usize);
    for (i, slot) in out.iter_mut().enumerate().take(n) {
        match read_dword(transport, ph.table_pointer + (i as u32) * 4, cmd_bw).await {
            Some(d) => *slot = d,
            None => return i,
        }
    }
    n
}

/// Probe for SFDP at the given command bus width. Returns `Some(info)` iff
/// the header signature and basic table both parse as sane (§4.3 failure
/// semantics: this is the boolean the resolver branches on).
#[maybe_async::maybe_async]
pub async fn probe_sfdp(transport: &mut dyn Transport, cmd_bw: u8) -> Option<SfdpInfo> {
    let mut header_bytes = [0u8; 8];
    if !read_sfdp(transport, 0, &mut header_bytes, cmd_bw).await {
        return None;
    }
    let header = SfdpHeader::parse(&header_bytes);
    if !header.is_valid() {
        return None;
    }

    let mut basic_params = None;
    let mut four_byte_addr_table = None;
    let mut num_param_headers = 0usize;

    let nph = header.num_param_headers().min(MAX_PARAMETER_HEADERS);
    for i in 0..nph {
        let mut raw = [0u8; 8];
        let offset = 8 + (i as u32) * 8;
        if !read_sfdp(transport, offset, &mut raw, cmd_bw).await {
            break;
        }
        let ph = ParameterHeader::parse(&raw);
        num_param_headers += 1;

        match ph.id {
            PARAM_ID_BASIC => {
                let mut dw = [0u32; 20];
                let n = read_table_dwords(transport, &ph, cmd_bw, &mut dw).await;
                basic_params = decode_bfpt(&dw[..n], ph.revision);
            }
            PARAM_ID_4BYTE_ADDR => {
                let mut dw = [0u32; 2];
                let n = read_table_dwords(transport, &ph, cmd_bw, &mut dw).await;
                four_byte_addr_table = decode_4b_table(&dw[..n], ph.revision);
            }
            PARAM_ID_SECTOR_MAP => {
                // Presence noted; no typed decode - no caller needs the
                // per-region map today.
            }
            _ => {}
        }
    }

    let basic_params = basic_params?;
    let info = SfdpInfo { header, basic_params, num_param_headers, four_byte_addr_table };
    if info.is_valid() {
        Some(info)
    } else {
        None
    }
}

/// Decode the Basic Flash Parameter Table DWORDs. Handles the 9-DWORD
/// (JESD216), 16-DWORD (JESD216B) and 20-DWORD (JESD216D) revisions,
/// degrading gracefully when fewer DWORDs were read.
fn decode_bfpt(dw: &[u32], revision: SfdpRevision) -> Option<BasicFlashParams> {
    if dw.len() < 9 {
        return None;
    }

    let mut params = BasicFlashParams { revision, ..Default::default() };

    // DWORD 1
    params.address_mode = AddressMode::from_bfpt(((dw[0] >> 17) & 0x03) as u8);
    params.write_granularity_64 = (dw[0] >> 2) & 1 != 0;
    params.volatile_sr_write_enable =
        if (dw[0] >> 3) & 1 != 0 { WriteEnableForVolatileSr::Ewsr } else { WriteEnableForVolatileSr::Wren };
    params.fast_read_112 = (dw[0] >> 21) & 1 != 0;
    params.fast_read_122 = (dw[0] >> 20) & 1 != 0;
    params.fast_read_144 = (dw[0] >> 22) & 1 != 0;
    params.fast_read_114 = (dw[0] >> 23) & 1 != 0;

    // DWORD 2: density - bit 31 set means "bit count - 1" encoding,
    // otherwise the field holds the size in bits directly.
    params.density_bytes =
        if dw[1] & 0x8000_0000 != 0 { 1u64 << ((dw[1] & 0x7FFF_FFFF) - 3) } else { ((dw[1] as u64) + 1) / 8 };

    // DWORDs 3-4: fast read instruction parameters
    params.fast_read_144_params = FastReadParams::from_low_half(dw[2]);
    params.fast_read_114_params = FastReadParams::from_high_half(dw[2]);
    params.fast_read_122_params = FastReadParams::from_low_half(dw[3]);
    params.fast_read_112_params = FastReadParams::from_high_half(dw[3]);

    // DWORDs 7-8: 2-2-2 / 4-4-4 fast read parameters
    params.fast_read_222_params = FastReadParams::from_high_half(dw[6]);
    params.fast_read_444_params = FastReadParams::from_high_half(dw[7]);

    // DWORD 9: erase types {size exponent, opcode} x2 (types 3-4 live in
    // the extended DWORD 10, not present before JESD216B's wider table).
    let dw9 = dw[8];
    params.erase_types[0] = SfdpEraseType::from_raw((dw9 & 0xFF) as u8, ((dw9 >> 8) & 0xFF) as u8);
    params.erase_types[1] = SfdpEraseType::from_raw(((dw9 >> 16) & 0xFF) as u8, ((dw9 >> 24) & 0xFF) as u8);

    if dw.len() >= 10 {
        let dw10 = dw[9];
        params.erase_types[2] = SfdpEraseType::from_raw((dw10 & 0xFF) as u8, ((dw10 >> 8) & 0xFF) as u8);
        params.erase_types[3] = SfdpEraseType::from_raw(((dw10 >> 16) & 0xFF) as u8, ((dw10 >> 24) & 0xFF) as u8);
    }

    if dw.len() >= 11 {
        // DWORD 11: page size exponent in bits [7:4].
        let page_exp = ((dw[10] >> 4) & 0x0F) as u32;
        params.page_size = 1u32 << page_exp;
    } else {
        params.page_size = 256;
    }

    if dw.len() >= 16 {
        let dw15 = dw[14];
        params.quad_enable = QuadEnableRequirement::from_bfpt(((dw15 >> 20) & 0x07) as u8);
        params.status_reg_volatile = (dw15 >> 31) & 1 != 0;

        let dw16 = dw[15];
        params.four_byte_entry = FourByteEntryMethods::from_bfpt(((dw16 >> 24) & 0xFF) as u8);
        params.soft_reset = SoftResetSupport::from_bfpt(((dw16 >> 8) & 0x3F) as u8);
        params.erase_4k_opcode = (dw16 & 0xFF) as u8;
    } else {
        params.erase_4k_opcode = 0x20;
    }

    Some(params)
}

fn decode_4b_table(dw: &[u32], revision: SfdpRevision) -> Option<FourByteAddrTable> {
    if dw.len() < 2 {
        return None;
    }
    Some(FourByteAddrTable {
        revision,
        instructions: FourByteAddrInstructions::from_dword1(dw[0]),
        erase_opcodes: FourByteAddrEraseOpcodes::from_dword2(dw[1]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_bfpt_dwords() -> [u32; 9] {
        let mut dw = [0u32; 9];
        dw[0] = 0; // 3-byte addressing only
        dw[1] = (128 * 1024 * 1024) - 1; // bit-count density: 16 MiB
        dw[8] = 12 | (0x20 << 8); // erase type 1: 4 KiB at opcode 0x20
        dw
    }

    #[test]
    fn nine_dword_bfpt_decodes_density_and_erase_type() {
        let params = decode_bfpt(&minimal_bfpt_dwords(), SfdpRevision::JESD216).unwrap();
        assert_eq!(params.density_bytes, 16 * 1024 * 1024);
        assert_eq!(params.address_mode, AddressMode::ThreeByteOnly);
        assert_eq!(params.page_size, 256);
        assert!(params.erase_for_size(4096).is_some());
    }

    #[test]
    fn short_table_is_rejected() {
        assert!(decode_bfpt(&[0u32; 4], SfdpRevision::JESD216).is_none());
    }

    #[test]
    fn sixteen_dword_bfpt_decodes_quad_enable_and_four_byte_entry() {
        let mut dw = [0u32; 16];
        dw[..9].copy_from_slice(&minimal_bfpt_dwords());
        dw[14] = 0b010 << 20; // Sr1Bit6_WriteCmd01
        dw[15] = (FourByteEntryMethods::INSTR_B7_E9 as u32) << 24;
        let params = decode_bfpt(&dw, SfdpRevision::JESD216B).unwrap();
        assert_eq!(params.quad_enable, QuadEnableRequirement::Sr1Bit6_WriteCmd01);
        assert!(params.four_byte_entry.supports(FourByteEntryMethods::INSTR_B7_E9));
    }

    #[test]
    fn four_byte_table_decodes_instructions_and_erase_opcodes() {
        let dw = [FourByteAddrInstructions::READ_1S_1S_1S, 0x21u32];
        let table = decode_4b_table(&dw, SfdpRevision::JESD216A).unwrap();
        assert!(table.instructions.supports_4ba_read());
        assert_eq!(table.erase_opcodes.erase_type_1, 0x21);
    }
}
