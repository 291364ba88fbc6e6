//! Network configuration: chain id, signing domain and well-known contract addresses.

use std::{fs, path::Path};

use alloy_primitives::{keccak256, Address, B256};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Default BLS signing domain, `keccak256(0xfeedbee5)`.
pub fn default_bls_domain() -> B256 {
    keccak256([0xfe, 0xed, 0xbe, 0xe5])
}

/// Deployment-specific parameters shared by the signer and the compressors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    pub chain_id: u64,
    #[serde(default = "default_bls_domain")]
    pub bls_domain: B256,
    pub addresses: ContractAddresses,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAddresses {
    pub bls_public_key_registry: Address,
    pub address_registry: Address,
    pub expander_delegator: Address,
    /// Target of the `sendEthToTxOrigin()` fee payment.
    pub aggregator_utilities: Address,
    pub fallback_expander: Address,
    pub erc20_expander: Address,
    pub bls_registration_expander: Address,
}

impl NetworkConfig {
    pub fn new(chain_id: u64, addresses: ContractAddresses) -> Self {
        Self {
            chain_id,
            bls_domain: default_bls_domain(),
            addresses,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}
