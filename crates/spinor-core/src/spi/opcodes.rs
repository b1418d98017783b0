//! Named SPI-NOR opcode and register-bit constants (C1).
//!
//! Standard JEDEC commands plus the vendor-common variants the catalog and
//! operation engine dispatch on. Grouped by function, not by vendor — a part
//! picks whichever subset applies to it.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before any write/erase operation
pub const WREN: u8 = 0x06;
/// Write Disable - clears WEL bit in status register
pub const WRDI: u8 = 0x04;
/// Enable Write Status Register (legacy SST command, used for volatile writes)
pub const EWSR: u8 = 0x50;
/// Global block unlock (clears all BP bits in one shot on some Winbond/GD parts)
pub const ULBPR: u8 = 0x98;

// ============================================================================
// Status / configuration register operations
// ============================================================================

/// Read Status Register 1
pub const RDSR: u8 = 0x05;
/// Read Status Register 2 (often holds QE, CMP, SRL)
pub const RDSR2: u8 = 0x35;
/// Read Status Register 3 (drive strength, WPS on some parts)
pub const RDSR3: u8 = 0x15;
/// Write Status Register 1 (also accepts a 2-byte SR1|SR2 combined write)
pub const WRSR: u8 = 0x01;
/// Write Status Register 2
pub const WRSR2: u8 = 0x31;
/// Write Status Register 3
pub const WRSR3: u8 = 0x11;
/// Read Non-Volatile Configuration Register (Micron/GigaDevice-style)
pub const RDNVCR: u8 = 0xB5;
/// Write Non-Volatile Configuration Register
pub const WRNVCR: u8 = 0xB1;
/// Read Volatile (Enhanced) Configuration Register
pub const RDVECR: u8 = 0x85;
/// Write Volatile (Enhanced) Configuration Register
pub const WRVECR: u8 = 0x81;
/// Read Bank/Extended-Address Register (Spansion/Cypress "bank" style)
pub const RDBR: u8 = 0x16;
/// Write Bank/Extended-Address Register
pub const WRBR: u8 = 0x17;

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC ID (manufacturer + device ID)
pub const RDID: u8 = 0x9F;
/// Read JEDEC ID, multi-I/O variant used during the QPI/DPI retry ladder
pub const RDID_MULTI: u8 = 0xAF;
/// Read Electronic Manufacturer & Device ID (legacy)
pub const REMS: u8 = 0x90;
/// Read Electronic Signature / Release from Deep Power Down
pub const RES: u8 = 0xAB;
/// Read Unique ID
pub const RDUID: u8 = 0x4B;

// ============================================================================
// Read commands - 3-byte address
// ============================================================================

/// Read Data (no dummy cycles, up to ~33 MHz)
pub const READ: u8 = 0x03;
/// Fast Read (with dummy byte, up to part's max frequency)
pub const FAST_READ: u8 = 0x0B;
/// Dual Output Read (1-1-2)
pub const DOR: u8 = 0x3B;
/// Dual I/O Read (1-2-2)
pub const DIOR: u8 = 0xBB;
/// Quad Output Read (1-1-4)
pub const QOR: u8 = 0x6B;
/// Quad I/O Read (1-4-4)
pub const QIOR: u8 = 0xEB;
/// Octal Output Read (1-1-8)
pub const OOR: u8 = 0x8B;
/// Octal I/O Read (1-8-8)
pub const OIOR: u8 = 0xCB;

// ============================================================================
// Read commands - 4-byte address
// ============================================================================

/// Read Data with 4-byte address
pub const READ_4B: u8 = 0x13;
/// Fast Read with 4-byte address
pub const FAST_READ_4B: u8 = 0x0C;
/// Dual Output Read with 4-byte address
pub const DOR_4B: u8 = 0x3C;
/// Dual I/O Read with 4-byte address
pub const DIOR_4B: u8 = 0xBC;
/// Quad Output Read with 4-byte address
pub const QOR_4B: u8 = 0x6C;
/// Quad I/O Read with 4-byte address
pub const QIOR_4B: u8 = 0xEC;

// ============================================================================
// Page Program
// ============================================================================

/// Page Program with 3-byte address
pub const PP: u8 = 0x02;
/// Page Program with 4-byte address
pub const PP_4B: u8 = 0x12;
/// Quad Page Program, data phase only, 3-byte address (1-1-4)
pub const QPP: u8 = 0x32;
/// Quad Page Program, data phase only, 4-byte address
pub const QPP_4B: u8 = 0x34;
/// Quad I/O Page Program, address+data on 4 lines (1-4-4), 3-byte address
pub const QIOPP: u8 = 0x38;

// ============================================================================
// AAI word program (SST legacy)
// ============================================================================

/// Auto Address Increment Word Program
pub const AAI_WP: u8 = 0xAD;

// ============================================================================
// Erase commands - 3-byte address
// ============================================================================

/// Sector Erase 4KB with 3-byte address
pub const SE_20: u8 = 0x20;
/// Block Erase 32KB with 3-byte address
pub const BE_52: u8 = 0x52;
/// Block Erase 64KB with 3-byte address
pub const BE_D8: u8 = 0xD8;
/// Chip Erase (entire chip), common opcode
pub const CE_60: u8 = 0x60;
/// Chip Erase (entire chip), alternate opcode
pub const CE_C7: u8 = 0xC7;

// ============================================================================
// Erase commands - 4-byte address
// ============================================================================

/// Sector Erase 4KB with 4-byte address
pub const SE_21: u8 = 0x21;
/// Block Erase 32KB with 4-byte address
pub const BE_5C: u8 = 0x5C;
/// Block Erase 64KB with 4-byte address
pub const BE_DC: u8 = 0xDC;

// ============================================================================
// 4-byte address mode control
// ============================================================================

/// Enter 4-Byte Address Mode
pub const EN4B: u8 = 0xB7;
/// Exit 4-Byte Address Mode
pub const EX4B: u8 = 0xE9;
/// Read Extended Address Register
pub const RDEAR: u8 = 0xC8;
/// Write Extended Address Register
pub const WREAR: u8 = 0xC5;

// ============================================================================
// Power management
// ============================================================================

/// Deep Power Down
pub const DP: u8 = 0xB9;
/// Release from Deep Power Down (same opcode as RES)
pub const RDP: u8 = 0xAB;

// ============================================================================
// Security / OTP register operations
// ============================================================================

/// Read Security Register (status of the security/OTP region, SECR-style)
pub const RDSCUR: u8 = 0x2B;
/// Write Security Register
pub const WRSCUR: u8 = 0x2F;
/// Erase Security Register / OTP region
pub const ERASE_OTP: u8 = 0x44;
/// Program Security Register / OTP region
pub const PROGRAM_OTP: u8 = 0x42;
/// Read Security Register / OTP region
pub const READ_OTP: u8 = 0x48;
/// Enter secured OTP window (Macronix/GigaDevice ENSO)
pub const ENSO: u8 = 0xB1;
/// Exit secured OTP window (EXSO)
pub const EXSO: u8 = 0xC1;
/// Atmel/Renesas raw OTP read
pub const ATMEL_READ_OTP: u8 = 0x77;
/// Atmel/Renesas raw OTP program
pub const ATMEL_PROGRAM_OTP: u8 = 0x9B;

// ============================================================================
// Multi-die parts
// ============================================================================

/// Select Die (multi-die stacked parts)
pub const SELECT_DIE: u8 = 0xC2;

// ============================================================================
// QPI / DPI mode control
// ============================================================================

/// Enter QPI Mode
pub const EQIO_38H: u8 = 0x38;
/// Enter QPI Mode, alternate opcode used by some vendors
pub const EQIO_35H: u8 = 0x35;
/// Exit QPI Mode / reset to 1-1-1
pub const RSTQIO_FFH: u8 = 0xFF;
/// Exit QPI Mode, alternate opcode
pub const RSTQIO_F5H: u8 = 0xF5;
/// Read/Write Volatile Enhanced Configuration Register opcode pair used by
/// the `800003h`-style QPI strategy (address `0x800003`)
pub const QPI_VECR_ADDR: u32 = 0x800003;

// ============================================================================
// Software Reset
// ============================================================================

/// Reset Enable
pub const RSTEN: u8 = 0x66;
/// Reset Device
pub const RST: u8 = 0x99;
/// Legacy single-opcode soft reset used by a handful of parts
pub const RST_F0H: u8 = 0xF0;

// ============================================================================
// SFDP (Serial Flash Discoverable Parameters)
// ============================================================================

/// Read SFDP (JEDEC JESD216)
pub const RDSFDP: u8 = 0x5A;

// ============================================================================
// Suspend/Resume
// ============================================================================

/// Erase/Program Suspend
pub const SUSPEND: u8 = 0x75;
/// Erase/Program Resume
pub const RESUME: u8 = 0x7A;

// ============================================================================
// Status register bit definitions
// ============================================================================

/// Status Register 1: Write In Progress / Busy
pub const SR1_WIP: u8 = 0x01;
/// Status Register 1: Write Enable Latch
pub const SR1_WEL: u8 = 0x02;
/// Status Register 1: Block Protect bit 0
pub const SR1_BP0: u8 = 0x04;
/// Status Register 1: Block Protect bit 1
pub const SR1_BP1: u8 = 0x08;
/// Status Register 1: Block Protect bit 2
pub const SR1_BP2: u8 = 0x10;
/// Status Register 1: Top/Bottom Protect
pub const SR1_TB: u8 = 0x20;
/// Status Register 1: Sector/Block Protect
pub const SR1_SEC: u8 = 0x40;
/// Status Register 1: Status Register Protect 0 (SRP0)
pub const SR1_SRP0: u8 = 0x80;

/// Status Register 2: Status Register Protect 1 (SRL)
pub const SR2_SRP1: u8 = 0x01;
/// Status Register 2: Quad Enable (Winbond/GigaDevice-style, bit 1)
pub const SR2_QE_BIT1: u8 = 0x02;
/// Status Register 2: Block Protect bit 3 (parts with 4 BP bits)
pub const SR2_BP3: u8 = 0x04;
/// Status Register 2: Complement Protect bit
pub const SR2_CMP: u8 = 0x40;
/// Status Register 2: Suspend Status
pub const SR2_SUS: u8 = 0x80;
/// Status Register 1: Quad Enable, Macronix-style bit 6
pub const SR1_QE_BIT6: u8 = 0x40;
/// Status Register 2: Quad Enable, ISSI/Micron-style bit 7
pub const SR2_QE_BIT7: u8 = 0x80;
/// Non-Volatile Configuration Register: Quad Enable bit 4 (Micron/GigaDevice)
pub const NVCR_QE_BIT4: u8 = 0x10;
