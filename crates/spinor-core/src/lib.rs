//! Vendor-agnostic identification and operation engine for SPI-NOR flash
//! memory devices.
//!
//! The crate never talks to hardware directly - it drives an
//! implementation of [`transport::Transport`] supplied by the caller and,
//! from that, identifies the attached part, negotiates its fastest
//! correctly-supported I/O mode, and exposes read/program/erase/OTP/
//! write-protect/unique-ID operations through [`flash::Flash`].
//!
//! # Features
//!
//! - `std` - enables the JSON external-ID loader and `alloc`
//! - `alloc` - heap allocation for owned part/vendor strings
//! - `static-parts` - pull in a build-time-generated part table instead of
//!   (or alongside) the `alloc`-backed built-in catalog, for `no_std` targets
//! - `is_sync` - compile the Transport trait and engine as synchronous

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod error;
#[cfg(feature = "std")]
pub mod external;
#[cfg(feature = "std")]
pub mod flash;
#[cfg(feature = "std")]
pub mod negotiate;
pub mod part;
pub mod resolved;
#[cfg(feature = "std")]
pub mod resolver;
pub mod sfdp;
#[cfg(feature = "static-parts")]
pub mod static_catalog;
pub mod spi;
pub mod transport;
pub mod wp;

#[cfg(feature = "std")]
pub(crate) mod catalog;
#[cfg(feature = "std")]
pub(crate) mod engine;

pub use error::{Error, Result};
#[cfg(feature = "std")]
pub use flash::Flash;
pub use transport::Transport;
