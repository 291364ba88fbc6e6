use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use bls_bundle_types::{ActionData, Bundle, Operation, PublicKey};

use crate::{
    interfaces::IBLSPublicKeyRegistry,
    signer::{BlsSigner, PrivateKey},
};

/// A smart-contract wallet controlled by one BLS key.
///
/// The wallet address is supplied by the caller (it comes from the wallet factory); the
/// nonce tracks the next operation this wrapper will sign.
#[derive(Clone, Debug)]
pub struct BlsWallet {
    private_key: PrivateKey,
    public_key: PublicKey,
    address: Address,
    nonce: U256,
    signer: BlsSigner,
}

impl BlsWallet {
    pub fn new(private_key: PrivateKey, address: Address, signer: BlsSigner) -> Self {
        let public_key = private_key.public_key();
        Self {
            private_key,
            public_key,
            address,
            nonce: U256::ZERO,
            signer,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn nonce(&self) -> U256 {
        self.nonce
    }

    /// Resynchronise with the on-chain nonce.
    pub fn set_nonce(&mut self, nonce: U256) {
        self.nonce = nonce;
    }

    /// Sign an already-built operation. The tracked nonce is left untouched.
    pub fn sign(&self, operation: &Operation) -> Bundle {
        self.signer.sign(operation, &self.private_key)
    }

    /// Sign `actions` at the current nonce, then advance it.
    pub fn sign_actions(&mut self, actions: Vec<ActionData>, gas: U256) -> Bundle {
        let operation = Operation {
            nonce: self.nonce,
            gas,
            actions,
        };
        self.nonce += U256::from(1u64);
        self.sign(&operation)
    }

    /// Action registering this wallet's key with the key registry at `registry`.
    pub fn registration_action(&self, registry: Address) -> ActionData {
        ActionData {
            eth_value: U256::ZERO,
            contract_address: registry,
            encoded_function: Bytes::from(
                IBLSPublicKeyRegistry::registerCall {
                    blsPublicKey: self.public_key.0,
                }
                .abi_encode(),
            ),
        }
    }
}
