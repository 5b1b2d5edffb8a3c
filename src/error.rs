//! Error types

use core::fmt;

/// Every failure a key operation can report.
///
/// Success is `Ok(..)`; in [`crate::ExtraInfo`] it is an empty error code.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HssError {
    /// The storage could not deliver the private key
    PrivateKeyReadFailed,
    /// Format tag or checksum mismatch, or a write that did not stick
    BadPrivateKey,
    /// The storage refused to persist the private key
    PrivateKeyWriteFailed,
    /// The working key could not be allocated
    OutOfMemory,
    /// A diagnostics accessor was handed no info structure
    NullInfo,
    /// Unknown or unsupported parameter set
    BadParamSet,
    /// SHAKE parameter sets need the `shake` feature
    ShakeNotEnabled,
    /// Output buffer too short
    BufferOverflow,
    /// All signatures of the key have been used
    PrivateKeyExpired,
    /// More signatures requested than the key can ever produce
    NotThatManySigsLeft,
}

impl fmt::Display for HssError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            HssError::PrivateKeyReadFailed => "private key read failed",
            HssError::BadPrivateKey => "bad private key",
            HssError::PrivateKeyWriteFailed => "private key write failed",
            HssError::OutOfMemory => "out of memory",
            HssError::NullInfo => "no extra info given",
            HssError::BadParamSet => "bad parameter set",
            HssError::ShakeNotEnabled => "SHAKE parameter sets are not enabled",
            HssError::BufferOverflow => "buffer overflow",
            HssError::PrivateKeyExpired => "private key expired",
            HssError::NotThatManySigsLeft => "not that many signatures left",
        };
        f.write_str(message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HssError {}

impl From<HssError> for signature::Error {
    fn from(_: HssError) -> Self {
        signature::Error::new()
    }
}
