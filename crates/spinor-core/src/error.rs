//! Bit-stable error taxonomy shared by every public entry point.
//!
//! The discriminants are part of the wire contract with external callers
//! (logged, compared against by name) so existing variants are never
//! renumbered or renamed; only append. Each is classified in the crate docs
//! as a caller error, identification error, bus error, unsupported-capability
//! error, or catalog/config error.

use core::fmt;

/// Errors returned by the core library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A parameter was out of range or self-contradictory. Caller error, no
    /// side effects.
    InvalidParameter,
    /// The requested capability does not apply to the probed part (OTP erase,
    /// die select, UID read, …). Never escalated to `Fail`.
    Unsupported,
    /// Generic failure with no more specific classification available.
    Fail,
    /// Allocation failed while building a `ResolvedFlash`.
    NoMem,
    /// A wait-busy deadline elapsed before the device reported ready.
    Timeout,
    /// The external-ID loader found a part colliding with the catalog.
    AlreadyExist,
    /// A named lookup (vendor, model, erase group, opcode table) found nothing.
    NotExist,
    /// The Transport reported a bus-level I/O failure. Recoverable by
    /// issuing a soft-reset.
    DeviceIoError,
    /// No Transport is attached to this handle.
    DeviceNotFound,
    /// The Transport is attached but missing required configuration.
    DeviceMissingConfig,
    /// An operation was attempted before `probe_init`/`part_init` succeeded.
    FlashNotProbed,
    /// The requested address/length range exceeds the part's size.
    FlashAddressOutOfRange,
    /// `part_init` was called without naming a model and no forced part applies.
    FlashPartNotSpecified,
    /// Neither JEDEC ID matching nor SFDP produced a catalog match.
    FlashPartNotRecognised,
    /// `part_init` was forced to a model whose ID does not match the probed ID.
    FlashPartMismatch,
    /// A write-protect configuration change did not take effect (verify failed).
    LockFail,
    /// A JSON field had the wrong type.
    JsonTypeInvalid,
    /// A JSON field had the right type but an invalid value.
    JsonDataInvalid,
    /// The external-ID file does not exist.
    FileNotExist,
    /// The external-ID file exists but could not be read.
    FileReadFailure,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidParameter => "invalid parameter",
            Self::Unsupported => "operation not supported by this part",
            Self::Fail => "operation failed",
            Self::NoMem => "out of memory",
            Self::Timeout => "operation timed out",
            Self::AlreadyExist => "already exists",
            Self::NotExist => "does not exist",
            Self::DeviceIoError => "device I/O error",
            Self::DeviceNotFound => "device not found",
            Self::DeviceMissingConfig => "device missing configuration",
            Self::FlashNotProbed => "flash has not been probed",
            Self::FlashAddressOutOfRange => "address out of range",
            Self::FlashPartNotSpecified => "no part specified",
            Self::FlashPartNotRecognised => "flash part not recognised",
            Self::FlashPartMismatch => "flash part mismatch",
            Self::LockFail => "write-protect lock failed",
            Self::JsonTypeInvalid => "invalid JSON type",
            Self::JsonDataInvalid => "invalid JSON data",
            Self::FileNotExist => "file does not exist",
            Self::FileReadFailure => "file read failure",
        };
        f.write_str(s)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl From<crate::wp::WpError> for Error {
    fn from(e: crate::wp::WpError) -> Self {
        match e {
            crate::wp::WpError::ChipUnsupported => Self::Unsupported,
            crate::wp::WpError::ReadFailed | crate::wp::WpError::WriteFailed => Self::DeviceIoError,
            crate::wp::WpError::VerifyFailed => Self::LockFail,
            crate::wp::WpError::RangeUnsupported => Self::InvalidParameter,
            crate::wp::WpError::ModeUnsupported => Self::Unsupported,
            crate::wp::WpError::SpiError(inner) => inner,
        }
    }
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
