//! SFDP (Serial Flash Discoverable Parameters) parsing
//!
//! This module implements parsing of SFDP data structures as defined by
//! JEDEC JESD216 (through revision H). SFDP provides a standardized way
//! for flash chips to describe their capabilities.
//!
//! # Overview
//!
//! SFDP data is stored in a reserved area of the flash chip and can be
//! read using the RDSFDP command (0x5A). The structure contains:
//!
//! - An SFDP header with signature and revision info
//! - One or more parameter headers describing available tables
//! - Parameter tables containing capability information
//!
//! # Usage
//!
//! ```ignore
//! use spinor_core::sfdp::probe_sfdp;
//! use spinor_core::transport::Transport;
//!
//! async fn probe(transport: &mut dyn Transport) {
//!     if let Some(info) = probe_sfdp(transport, 1).await {
//!         println!("Flash size: {} bytes", info.total_size());
//!         println!("Page size: {} bytes", info.page_size());
//!     }
//! }
//! ```

mod parser;
mod types;

pub use parser::*;
pub use types::*;
