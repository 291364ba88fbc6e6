//! Registry backend over an `ethers` middleware.
//!
//! Reads go through `eth_call`, reverse lookups through `eth_getLogs` filtered on the
//! registration event and the value topic, and registrations through a sent transaction
//! that is awaited until a receipt is available.

use std::{marker::PhantomData, sync::Arc};

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use bls_bundle_types::PublicKey;
use ethers::{
    providers::Middleware,
    types::{BlockNumber, Filter, TransactionRequest, H160, H256, U64},
};

use crate::{
    encoding::u256_to_u64,
    errors::RegistryError,
    interfaces::{IAddressRegistry, IBLSExpanderDelegator, IBLSPublicKeyRegistry},
    registry::{RegistryContract, RegistryValue},
};

/// Calldata and event shape of one registry contract.
pub trait RegistryAbi: Send + Sync + 'static {
    type Value: RegistryValue;

    /// Signature hash of the registration event: `(uint256 indexed id, <value> indexed)`.
    const REGISTERED_EVENT: B256;

    fn lookup_calldata(id: u64) -> Vec<u8>;

    /// Decode the lookup return data; unassigned ids read back as the zero value.
    fn decode_lookup(data: &[u8]) -> Result<Option<Self::Value>, RegistryError>;

    fn register_calldata(value: &Self::Value) -> Vec<u8>;
}

pub struct BlsPublicKeyRegistryAbi;

impl RegistryAbi for BlsPublicKeyRegistryAbi {
    type Value = PublicKey;

    const REGISTERED_EVENT: B256 = IBLSPublicKeyRegistry::BLSPublicKeyRegistered::SIGNATURE_HASH;

    fn lookup_calldata(id: u64) -> Vec<u8> {
        IBLSPublicKeyRegistry::lookupCall { id: U256::from(id) }.abi_encode()
    }

    fn decode_lookup(data: &[u8]) -> Result<Option<PublicKey>, RegistryError> {
        let words = IBLSPublicKeyRegistry::lookupCall::abi_decode_returns(data, true)
            .map_err(abi_error)?
            ._0;
        Ok((words != [U256::ZERO; 4]).then_some(PublicKey(words)))
    }

    fn register_calldata(value: &PublicKey) -> Vec<u8> {
        IBLSPublicKeyRegistry::registerCall { blsPublicKey: value.0 }.abi_encode()
    }
}

pub struct AddressRegistryAbi;

impl RegistryAbi for AddressRegistryAbi {
    type Value = Address;

    const REGISTERED_EVENT: B256 = IAddressRegistry::AddressRegistered::SIGNATURE_HASH;

    fn lookup_calldata(id: u64) -> Vec<u8> {
        IAddressRegistry::addressesCall { id: U256::from(id) }.abi_encode()
    }

    fn decode_lookup(data: &[u8]) -> Result<Option<Address>, RegistryError> {
        let addr = IAddressRegistry::addressesCall::abi_decode_returns(data, true)
            .map_err(abi_error)?
            ._0;
        Ok((addr != Address::ZERO).then_some(addr))
    }

    fn register_calldata(value: &Address) -> Vec<u8> {
        IAddressRegistry::registerCall { addr: *value }.abi_encode()
    }
}

pub struct ExpanderDelegatorAbi;

impl RegistryAbi for ExpanderDelegatorAbi {
    type Value = Address;

    const REGISTERED_EVENT: B256 = IBLSExpanderDelegator::ExpanderRegistered::SIGNATURE_HASH;

    fn lookup_calldata(id: u64) -> Vec<u8> {
        IBLSExpanderDelegator::expandersCall { id: U256::from(id) }.abi_encode()
    }

    fn decode_lookup(data: &[u8]) -> Result<Option<Address>, RegistryError> {
        let addr = IBLSExpanderDelegator::expandersCall::abi_decode_returns(data, true)
            .map_err(abi_error)?
            ._0;
        Ok((addr != Address::ZERO).then_some(addr))
    }

    fn register_calldata(value: &Address) -> Vec<u8> {
        IBLSExpanderDelegator::registerExpanderCall {
            expanderAddress: *value,
        }
        .abi_encode()
    }
}

/// Registry contract deployed at `address`, reached through `client`.
pub struct OnchainRegistryContract<M, A> {
    client: Arc<M>,
    address: Address,
    _abi: PhantomData<fn() -> A>,
}

impl<M: Middleware, A: RegistryAbi> OnchainRegistryContract<M, A> {
    pub fn new(client: Arc<M>, address: Address) -> Self {
        Self {
            client,
            address,
            _abi: PhantomData,
        }
    }

    fn eth_address(&self) -> H160 {
        H160(self.address.0 .0)
    }
}

#[async_trait]
impl<M, A> RegistryContract for OnchainRegistryContract<M, A>
where
    M: Middleware + 'static,
    A: RegistryAbi,
{
    type Value = A::Value;

    async fn entry(&self, id: u64) -> Result<Option<A::Value>, RegistryError> {
        let tx = TransactionRequest::new()
            .to(self.eth_address())
            .data(A::lookup_calldata(id));
        let out = self
            .client
            .call(&tx.into(), None)
            .await
            .map_err(backend_error)?;
        A::decode_lookup(&out)
    }

    async fn registered_ids(&self, topic: B256) -> Result<Vec<u64>, RegistryError> {
        let filter = Filter::new()
            .address(self.eth_address())
            .topic0(H256(A::REGISTERED_EVENT.0))
            .topic2(H256(topic.0))
            .from_block(BlockNumber::Earliest);
        let logs = self
            .client
            .get_logs(&filter)
            .await
            .map_err(backend_error)?;

        logs.iter()
            .map(|log| {
                let id_topic = log.topics.get(1).ok_or_else(|| {
                    RegistryError::Backend("registration log without id topic".into())
                })?;
                u256_to_u64(U256::from_be_bytes(id_topic.0)).ok_or(RegistryError::IdOutOfRange)
            })
            .collect()
    }

    async fn submit_registration(&self, value: &A::Value) -> Result<(), RegistryError> {
        let tx = TransactionRequest::new()
            .to(self.eth_address())
            .data(A::register_calldata(value));
        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(backend_error)?;
        let receipt = pending
            .await
            .map_err(backend_error)?
            .ok_or_else(|| RegistryError::Backend("registration transaction dropped".into()))?;
        if receipt.status != Some(U64::from(1u64)) {
            return Err(RegistryError::Reverted);
        }
        Ok(())
    }
}

fn backend_error(err: impl std::fmt::Display) -> RegistryError {
    RegistryError::Backend(err.to_string())
}

fn abi_error(err: alloy_sol_types::Error) -> RegistryError {
    RegistryError::Backend(format!("malformed registry return data: {err}"))
}
