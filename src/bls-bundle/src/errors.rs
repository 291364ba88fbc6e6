use alloy_primitives::Address;
use thiserror::Error;

/// Shape violations detected while encoding. Nothing is emitted when one occurs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("registry index {0} does not fit in 3 bytes")]
    IndexOutOfRange(u64),
    #[error("bit stream holds at most 256 flags, got {0}")]
    TooManyFlags(usize),
    #[error("bundle has {keys} sender keys but {operations} operations")]
    LengthMismatch { keys: usize, operations: usize },
}

/// Errors while reading a compressed payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("payload truncated")]
    Truncated,
    #[error("integer does not fit in 256 bits")]
    Overflow,
    #[error("malformed pseudo-float header {0:#04x}")]
    MalformedPseudoFloat(u8),
    #[error("no expander registered at index {0}")]
    UnknownExpander(u64),
    #[error("unknown method tag {0}")]
    UnknownMethod(u64),
    #[error("registry has no entry at index {0}")]
    MissingRegistryEntry(u64),
    #[error("operation declares {0} actions, which this expander cannot produce")]
    UnexpectedActionCount(u64),
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),
    #[error("registry read failed: {0}")]
    Registry(#[from] RegistryError),
}

/// Errors raised by registry reads and writes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry backend failed: {0}")]
    Backend(String),
    #[error("registration transaction reverted")]
    Reverted,
    #[error("registration confirmed but the value has no id")]
    MissingAfterRegistration,
    #[error("registry id does not fit in 64 bits")]
    IdOutOfRange,
}

/// Errors surfaced by the compressors and the bundle compressor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompressError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("no compressor could handle this operation")]
    NoCompressorApplies {
        /// Error from the last compressor that failed rather than declined.
        #[source]
        last_error: Option<Box<CompressError>>,
    },
    #[error("expander {0} is not registered")]
    ExpanderNotRegistered(Address),
}

/// Errors raised by key handling in the signer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignerError {
    #[error("private key is zero")]
    ZeroPrivateKey,
    #[error("private key must be 32 bytes, got {0}")]
    InvalidPrivateKeyLength(usize),
    #[error("value is not a valid curve point")]
    InvalidPoint,
    #[error("private key is not valid hex: {0}")]
    InvalidHex(String),
}

/// Errors loading a [`NetworkConfig`](crate::config::NetworkConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed reading config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed parsing config: {0}")]
    Json(#[from] serde_json::Error),
}
