use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::keys::{PublicKey, Signature};

/// One on-chain call made by a wallet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionData {
    /// Wei sent along with the call.
    pub eth_value: U256,
    pub contract_address: Address,
    /// ABI calldata; empty for a plain value transfer.
    pub encoded_function: Bytes,
}

/// One signer's unit of work. Actions execute atomically as a group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Wallet-scoped replay nonce.
    pub nonce: U256,
    /// Gas budget for the whole operation.
    pub gas: U256,
    pub actions: Vec<ActionData>,
}

/// Operations from one or more signers plus a single aggregate signature.
///
/// `sender_public_keys[i]` signed `operations[i]`; the two vectors are parallel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub signature: Signature,
    pub sender_public_keys: Vec<PublicKey>,
    pub operations: Vec<Operation>,
}

impl Bundle {
    /// Bundle with no operations, carrying the identity signature.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the sender and operation vectors are parallel.
    pub fn is_well_formed(&self) -> bool {
        self.sender_public_keys.len() == self.operations.len()
    }
}
