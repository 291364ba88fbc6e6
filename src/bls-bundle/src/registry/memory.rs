//! In-memory registry backend, used by the tool's snapshot files and in tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use bls_bundle_types::PublicKey;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{
    errors::RegistryError,
    registry::{
        AddressRegistry, BlsPublicKeyRegistry, ExpanderRegistry, Registry, RegistryContract,
        RegistryValue,
    },
};

/// Registry contract held in memory. Index in the vector is the id.
pub struct MemoryRegistryContract<V> {
    entries: RwLock<Vec<V>>,
    writes: AtomicUsize,
}

impl<V: RegistryValue> Default for MemoryRegistryContract<V> {
    fn default() -> Self {
        Self::with_entries(Vec::new())
    }
}

impl<V: RegistryValue> MemoryRegistryContract<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated registry; `entries[i]` gets id `i`.
    pub fn with_entries(entries: Vec<V>) -> Self {
        Self {
            entries: RwLock::new(entries),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn entries(&self) -> Vec<V> {
        self.entries.read().clone()
    }

    /// Number of registrations submitted since construction.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<V: RegistryValue> RegistryContract for MemoryRegistryContract<V> {
    type Value = V;

    async fn entry(&self, id: u64) -> Result<Option<V>, RegistryError> {
        let entries = self.entries.read();
        Ok(usize::try_from(id).ok().and_then(|i| entries.get(i).cloned()))
    }

    async fn registered_ids(&self, topic: B256) -> Result<Vec<u64>, RegistryError> {
        Ok(self
            .entries
            .read()
            .iter()
            .enumerate()
            .filter(|(_, value)| value.topic() == topic)
            .map(|(id, _)| id as u64)
            .collect())
    }

    async fn submit_registration(&self, value: &V) -> Result<(), RegistryError> {
        self.entries.write().push(value.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Serializable registry contents: ids are positions in each list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub bls_public_keys: Vec<PublicKey>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub expanders: Vec<Address>,
}

impl RegistrySnapshot {
    pub fn into_registries(self) -> (BlsPublicKeyRegistry, AddressRegistry, ExpanderRegistry) {
        (
            Registry::new(MemoryRegistryContract::with_entries(self.bls_public_keys)),
            Registry::new(MemoryRegistryContract::with_entries(self.addresses)),
            Registry::new(MemoryRegistryContract::with_entries(self.expanders)),
        )
    }
}
