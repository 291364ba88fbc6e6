use alloy_primitives::{keccak256, B256, U256};
use serde::{Deserialize, Serialize};

/// BLS public key: a BN254 G2 point as four base-field words.
///
/// Word order is `[x.c1, x.c0, y.c1, y.c0]`, the layout the pairing precompile consumes,
/// so the on-chain verifier can forward keys without reshuffling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(pub [U256; 4]);

impl PublicKey {
    /// `abi.encode(uint256[4])`: four big-endian 32-byte words.
    pub fn to_abi_bytes(&self) -> [u8; 128] {
        let mut out = [0u8; 128];
        for (chunk, word) in out.chunks_exact_mut(32).zip(self.0.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes::<32>());
        }
        out
    }

    pub fn from_abi_bytes(bytes: &[u8; 128]) -> Self {
        let mut words = [U256::ZERO; 4];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(32)) {
            *word = U256::from_be_slice(chunk);
        }
        Self(words)
    }

    /// `keccak256(abi.encode(uint256[4]))`.
    ///
    /// This is the indexed topic of registry events and the per-key hash bound into messages.
    pub fn hash(&self) -> B256 {
        keccak256(self.to_abi_bytes())
    }
}

/// BLS signature: a BN254 G1 point `[x, y]`. The identity is `[0, 0]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(pub [U256; 2]);

impl Signature {
    /// Signature of an aggregate over zero operations.
    pub const EMPTY: Signature = Signature([U256::ZERO; 2]);

    /// `abi.encode(uint256[2])`.
    pub fn to_abi_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.0[0].to_be_bytes::<32>());
        out[32..].copy_from_slice(&self.0[1].to_be_bytes::<32>());
        out
    }

    pub fn from_abi_bytes(bytes: &[u8; 64]) -> Self {
        Self([
            U256::from_be_slice(&bytes[..32]),
            U256::from_be_slice(&bytes[32..]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_key_abi_layout() {
        let key = PublicKey([
            U256::from(1u64),
            U256::from(2u64),
            U256::from(3u64),
            U256::MAX,
        ]);
        let bytes = key.to_abi_bytes();
        assert_eq!(bytes[31], 1);
        assert_eq!(bytes[63], 2);
        assert_eq!(bytes[95], 3);
        assert!(bytes[96..].iter().all(|b| *b == 0xff));
        assert_eq!(PublicKey::from_abi_bytes(&bytes), key);
    }

    #[test]
    fn equality_is_numeric() {
        let a: PublicKey =
            serde_json::from_str(r#"["0x01", "0x0002", "0x3", "0x00"]"#).unwrap();
        let b = PublicKey([
            U256::from(1u64),
            U256::from(2u64),
            U256::from(3u64),
            U256::ZERO,
        ]);
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn empty_signature_is_zero_words() {
        assert_eq!(Signature::EMPTY.to_abi_bytes(), [0u8; 64]);
    }
}
