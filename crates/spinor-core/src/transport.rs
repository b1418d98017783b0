//! The `Transport` contract: the single seam between this crate and the
//! SPI controller driver that actually wiggles wires.
//!
//! A Transport advertises what it can do (`if_caps`, `supports_op`), and the
//! resolver/negotiator never build an `Op` it hasn't agreed to first. This
//! mirrors the teacher's `SpiMaster: &mut M` borrow discipline: the core
//! takes `&mut dyn Transport` everywhere rather than owning the bus.

use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::spi::Op;

bitflags! {
    /// Capability bits a Transport advertises up front, independent of any
    /// one `Op`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IfCaps: u32 {
        /// The controller cannot do a bulk (multi-byte) quad-I/O read;
        /// reads must be chunked to one beat at a time.
        const NO_QPI_BULK_READ = 1 << 0;
        /// The controller can drive all I/O lines high for N clocks before
        /// a QPI/DPI exit sequence, needed by parts that sample the lines
        /// during their soft-reset precedence window.
        const DRIVE_4IO_ONES = 1 << 1;
        /// The controller supports double data rate transfers.
        const SUPPORTS_DTR = 1 << 2;
        /// The controller serializes calls itself; `bus_lock`/`bus_unlock`
        /// are no-ops and safe to call from multiple threads.
        const THREAD_SAFE = 1 << 3;
    }
}

/// SPI clock polarity/phase. SPI-NOR parts only ever use MODE_0 or MODE_3;
/// both sample on the rising edge and idle the clock the same level data
/// is driven on reset, differing only in idle clock level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiMode {
    /// CPOL=0, CPHA=0 - clock idles low.
    Mode0,
    /// CPOL=1, CPHA=1 - clock idles high.
    Mode3,
}

/// Outcome of a Transport-level operation, finer grained than `Error`
/// lets the engine tell a bus fault (retryable via soft-reset) apart from
/// a capability rejection (never retried, mapped straight to `Unsupported`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The operation completed.
    Ok,
    /// The Transport does not support this op shape; never attempted.
    Unsupported,
    /// The bus reported a fault mid-transfer (short transfer, NACK, ...).
    IoFault,
    /// The operation exceeded its configured deadline.
    Timeout,
}

impl Status {
    /// Convert into the crate's `Result<()>`.
    pub fn into_result(self) -> Result<()> {
        match self {
            Status::Ok => Ok(()),
            Status::Unsupported => Err(Error::Unsupported),
            Status::IoFault => Err(Error::DeviceIoError),
            Status::Timeout => Err(Error::Timeout),
        }
    }
}

/// The seam between the core and a concrete SPI controller driver.
///
/// Implementations live outside this crate (a Linux spidev backend, a USB
/// bridge, a microcontroller's QSPI peripheral, or a mock for tests). The
/// core only ever calls these methods with `Op`s it has already checked
/// via `supports_op`.
#[maybe_async::maybe_async]
pub trait Transport {
    /// Capability bitset, queried once at attach time.
    fn if_caps(&self) -> IfCaps;

    /// True if this exact op shape (phase widths, DTR, lengths) can be
    /// executed as-is. The negotiator only ever selects an `IoMode` for
    /// which every candidate op passes this check.
    fn supports_op(&self, op: &Op<'_>) -> bool;

    /// Shrink `op`'s data-phase length in place to whatever chunk size the
    /// controller can do in one transfer (DMA buffer size, FIFO depth).
    /// The engine loops calling `exec_op` until the full request is done.
    fn adjust_op_size(&self, op: &mut Op<'_>);

    /// Execute one transaction.
    async fn exec_op(&mut self, op: &mut Op<'_>) -> Status;

    /// Set the SPI clock frequency in Hz. Returns the Transport's best
    /// effort; the caller should re-read with `get_speed`.
    async fn set_speed(&mut self, hz: u32) -> Status;

    /// Current SPI clock frequency in Hz.
    fn get_speed(&self) -> u32;

    /// Set clock polarity/phase.
    async fn set_mode(&mut self, mode: SpiMode) -> Status;

    /// Set chip-select polarity: `true` selects active-high.
    async fn set_cs_pol(&mut self, positive: bool) -> Status;

    /// Drive every I/O line high for `clocks` cycles with chip-select
    /// deasserted, used by the soft-reset precedence window on parts that
    /// need it. Returns `Status::Unsupported` if the controller lacks
    /// `IfCaps::DRIVE_4IO_ONES`.
    async fn drive_4io_ones(&mut self, clocks: u32) -> Status {
        let _ = clocks;
        Status::Unsupported
    }

    /// Acquire the bus lock. A no-op for Transports that advertise
    /// `IfCaps::THREAD_SAFE` and serialize internally.
    fn bus_lock(&mut self);

    /// Release the bus lock acquired by `bus_lock`.
    fn bus_unlock(&mut self);
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::vec::Vec;

    /// In-memory Transport used by every scenario test: backs reads/writes
    /// against a flat byte array and records every opcode issued so tests
    /// can assert exact command sequences.
    pub struct MockTransport {
        pub storage: Vec<u8>,
        pub log: Vec<LoggedOp>,
        pub if_caps: IfCaps,
        pub speed_hz: u32,
        pub jedec_id: [u8; 3],
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct LoggedOp {
        pub opcode: u8,
        pub addr: Option<u32>,
        pub addr_width: u8,
        pub cmd_bw: u8,
        pub addr_bw: u8,
        pub data_bw: u8,
        pub data_len: usize,
        pub write: bool,
    }

    impl MockTransport {
        pub fn new(size: usize, jedec_id: [u8; 3]) -> Self {
            Self {
                storage: std::vec![0xFF; size],
                log: Vec::new(),
                if_caps: IfCaps::empty(),
                speed_hz: 1_000_000,
                jedec_id,
            }
        }
    }

    #[maybe_async::maybe_async]
    impl Transport for MockTransport {
        fn if_caps(&self) -> IfCaps {
            self.if_caps
        }

        fn supports_op(&self, _op: &Op<'_>) -> bool {
            true
        }

        fn adjust_op_size(&self, _op: &mut Op<'_>) {}

        async fn exec_op(&mut self, op: &mut Op<'_>) -> Status {
            use crate::spi::{opcodes, DataBuf, DataDir};

            let addr = if op.has_address() { Some(op.addr.val) } else { None };
            self.log.push(LoggedOp {
                opcode: op.cmd.opcode,
                addr,
                addr_width: op.addr.len,
                cmd_bw: op.cmd.width.buswidth,
                addr_bw: op.addr.width.buswidth,
                data_bw: op.data.width.buswidth,
                data_len: op.data.len,
                write: matches!(op.data.dir, DataDir::Write),
            });

            match op.cmd.opcode {
                opcodes::RDID => {
                    if let DataBuf::Read(buf) = &mut op.data.buf {
                        let n = buf.len().min(3);
                        buf[..n].copy_from_slice(&self.jedec_id[..n]);
                    }
                }
                opcodes::READ | opcodes::FAST_READ | opcodes::READ_4B | opcodes::FAST_READ_4B => {
                    if let (Some(addr), DataBuf::Read(buf)) = (addr, &mut op.data.buf) {
                        let start = addr as usize;
                        let end = (start + buf.len()).min(self.storage.len());
                        if start < end {
                            buf[..end - start].copy_from_slice(&self.storage[start..end]);
                        }
                    }
                }
                opcodes::PP | opcodes::PP_4B => {
                    if let (Some(addr), DataBuf::Write(data)) = (addr, &op.data.buf) {
                        let start = addr as usize;
                        let end = (start + data.len()).min(self.storage.len());
                        for (i, b) in self.storage[start..end].iter_mut().enumerate() {
                            *b &= data[i];
                        }
                    }
                }
                opcodes::SE_20 | opcodes::SE_21 => {
                    if let Some(addr) = addr {
                        let start = (addr as usize) & !(4096 - 1);
                        let end = (start + 4096).min(self.storage.len());
                        self.storage[start..end].fill(0xFF);
                    }
                }
                _ => {}
            }
            Status::Ok
        }

        async fn set_speed(&mut self, hz: u32) -> Status {
            self.speed_hz = hz;
            Status::Ok
        }

        fn get_speed(&self) -> u32 {
            self.speed_hz
        }

        async fn set_mode(&mut self, _mode: SpiMode) -> Status {
            Status::Ok
        }

        async fn set_cs_pol(&mut self, _positive: bool) -> Status {
            Status::Ok
        }

        fn bus_lock(&mut self) {}
        fn bus_unlock(&mut self) {}
    }
}
