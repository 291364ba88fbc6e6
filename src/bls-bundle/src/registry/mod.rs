//! Off-chain wrappers over the on-chain value ⇄ id registries.
//!
//! A registry assigns sequential ids from 0 and never reassigns them. There is no forward
//! reverse index on-chain, so [`Registry::reverse_lookup`] scans registration events
//! filtered by the value's indexed topic. Nothing is cached: every call re-queries the
//! backend so new registrations are visible immediately.

pub mod memory;
pub mod onchain;

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use bls_bundle_types::PublicKey;
use log::info;

use crate::errors::RegistryError;

pub use memory::{MemoryRegistryContract, RegistrySnapshot};
pub use onchain::{
    AddressRegistryAbi, BlsPublicKeyRegistryAbi, ExpanderDelegatorAbi, OnchainRegistryContract,
    RegistryAbi,
};

/// A value that can be registered.
pub trait RegistryValue: Clone + PartialEq + Send + Sync + 'static {
    /// Indexed event topic under which registrations of this value are logged.
    fn topic(&self) -> B256;
}

impl RegistryValue for PublicKey {
    fn topic(&self) -> B256 {
        self.hash()
    }
}

impl RegistryValue for Address {
    fn topic(&self) -> B256 {
        self.into_word()
    }
}

/// Backend abstraction over one registry contract, implemented on-chain and in memory.
#[async_trait]
pub trait RegistryContract: Send + Sync {
    type Value: RegistryValue;

    /// Value stored under `id`, or `None` if the id was never assigned.
    async fn entry(&self, id: u64) -> Result<Option<Self::Value>, RegistryError>;

    /// Ids of every registration event whose value topic equals `topic`, in log order.
    async fn registered_ids(&self, topic: B256) -> Result<Vec<u64>, RegistryError>;

    /// Submit a registration and wait until it is included.
    async fn submit_registration(&self, value: &Self::Value) -> Result<(), RegistryError>;
}

/// Read/write wrapper over a registry backend.
pub struct Registry<V: RegistryValue> {
    contract: Arc<dyn RegistryContract<Value = V>>,
}

pub type BlsPublicKeyRegistry = Registry<PublicKey>;
pub type AddressRegistry = Registry<Address>;
/// Expander contract address ⇄ expander index, held by the expander delegator.
pub type ExpanderRegistry = Registry<Address>;

impl<V: RegistryValue> Clone for Registry<V> {
    fn clone(&self) -> Self {
        Self {
            contract: Arc::clone(&self.contract),
        }
    }
}

impl<V: RegistryValue> Registry<V> {
    pub fn new(contract: impl RegistryContract<Value = V> + 'static) -> Self {
        Self {
            contract: Arc::new(contract),
        }
    }

    pub fn from_arc(contract: Arc<dyn RegistryContract<Value = V>>) -> Self {
        Self { contract }
    }

    pub async fn lookup(&self, id: u64) -> Result<Option<V>, RegistryError> {
        self.contract.entry(id).await
    }

    /// Id of `value`, if registered. When a race registered it twice the earliest id wins.
    pub async fn reverse_lookup(&self, value: &V) -> Result<Option<u64>, RegistryError> {
        let ids = self.contract.registered_ids(value.topic()).await?;
        Ok(ids.into_iter().min())
    }

    /// Register `value` and return its id.
    ///
    /// Concurrent registrations of the same value are not de-duplicated; the returned id is
    /// whichever [`Self::reverse_lookup`] resolves after inclusion.
    pub async fn register(&self, value: &V) -> Result<u64, RegistryError> {
        self.contract.submit_registration(value).await?;
        let id = self
            .reverse_lookup(value)
            .await?
            .ok_or(RegistryError::MissingAfterRegistration)?;
        info!("registered value with topic {} as id {id}", value.topic());
        Ok(id)
    }

    /// Register only if `value` has no id yet. At most one write per call.
    pub async fn register_if_needed(&self, value: &V) -> Result<u64, RegistryError> {
        match self.reverse_lookup(value).await? {
            Some(id) => Ok(id),
            None => self.register(value).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, U256};
    use assert_matches::assert_matches;

    /// Backend whose registrations are accepted but never show up in the logs.
    struct LosingBackend;

    #[async_trait]
    impl RegistryContract for LosingBackend {
        type Value = Address;

        async fn entry(&self, _id: u64) -> Result<Option<Address>, RegistryError> {
            Ok(None)
        }

        async fn registered_ids(&self, _topic: B256) -> Result<Vec<u64>, RegistryError> {
            Ok(vec![])
        }

        async fn submit_registration(&self, _value: &Address) -> Result<(), RegistryError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn register_if_needed_writes_once() {
        let backend = Arc::new(MemoryRegistryContract::<Address>::new());
        let registry = AddressRegistry::from_arc(backend.clone());
        let value = address!("00000000000000000000000000000000000000aa");

        let first = registry.register_if_needed(&value).await.unwrap();
        let second = registry.register_if_needed(&value).await.unwrap();
        assert_eq!(first, 0);
        assert_eq!(first, second);
        assert_eq!(backend.write_count(), 1);
        assert_eq!(registry.lookup(first).await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn ids_are_sequential_and_visible_immediately() {
        let registry = BlsPublicKeyRegistry::new(MemoryRegistryContract::new());
        let a = PublicKey([U256::from(1u64); 4]);
        let b = PublicKey([U256::from(2u64); 4]);

        assert_eq!(registry.reverse_lookup(&a).await.unwrap(), None);
        assert_eq!(registry.register(&a).await.unwrap(), 0);
        assert_eq!(registry.reverse_lookup(&a).await.unwrap(), Some(0));
        assert_eq!(registry.register(&b).await.unwrap(), 1);
        assert_eq!(registry.lookup(1).await.unwrap(), Some(b));
        assert_eq!(registry.lookup(2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_registration_resolves_to_earliest_id() {
        let backend = Arc::new(MemoryRegistryContract::<Address>::new());
        let registry = AddressRegistry::from_arc(backend.clone());
        let value = address!("00000000000000000000000000000000000000bb");

        registry.register(&address!("00000000000000000000000000000000000000cc")).await.unwrap();
        assert_eq!(registry.register(&value).await.unwrap(), 1);
        assert_eq!(registry.register(&value).await.unwrap(), 1);
        assert_eq!(backend.write_count(), 3);
    }

    #[tokio::test]
    async fn missing_after_registration_is_a_consistency_fault() {
        let registry = AddressRegistry::new(LosingBackend);
        let err = registry
            .register(&address!("00000000000000000000000000000000000000dd"))
            .await
            .unwrap_err();
        assert_matches!(err, RegistryError::MissingAfterRegistration);
    }
}
