//! Aggregate-signed operation bundles and their compressed calldata form.
//!
//! - [`signer`]: BN254 BLS keys, signing, aggregation and verification
//! - [`compressors`]: per-operation strategies, each paired with an on-chain expander
//! - [`bundle_compressor`]: strategy selection and bundle framing
//! - [`registry`]: value ⇄ id registries that let payloads reference keys and addresses by index

pub mod bundle_compressor;
pub mod compressors;
pub mod config;
pub mod encoding;
pub mod errors;
pub mod interfaces;
pub mod registry;
pub mod signer;
pub mod wallet;

#[cfg(test)]
mod tests;

pub use bls_bundle_types::{ActionData, Bundle, Operation, PublicKey, Signature};
pub use bundle_compressor::BundleCompressor;
pub use compressors::{
    BlsRegistrationCompressor, CompressorContext, Erc20Compressor, FallbackCompressor,
    OperationCompressor,
};
pub use config::{ContractAddresses, NetworkConfig};
pub use errors::{CompressError, ConfigError, DecodeError, EncodeError, RegistryError, SignerError};
pub use registry::{AddressRegistry, BlsPublicKeyRegistry, ExpanderRegistry, Registry};
pub use signer::{aggregate, BlsSigner, PrivateKey};
pub use wallet::BlsWallet;
