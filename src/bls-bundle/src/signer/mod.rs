//! BLS signatures over BN254 with aggregation across operations and signers.
//!
//! Signatures live in G1 and public keys in G2. A bundle verifies when
//! `e(-sig, g2) * prod(e(H(m_i), pk_i)) == 1`.

pub mod hash_to_point;
pub mod keys;
pub mod message;

use alloy_primitives::B256;
use ark_bn254::{Bn254, G1Affine, G1Projective, G2Affine};
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup};
use ark_ff::One;
use bls_bundle_types::{Bundle, Operation, PublicKey};
use log::debug;

use crate::{config::NetworkConfig, errors::SignerError};

pub use hash_to_point::hash_to_point;
pub use keys::PrivateKey;
pub use message::encode_message;

use keys::{g1_to_signature, public_key_to_g2, signature_to_g1};

/// Signs and verifies operations for one chain under one domain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlsSigner {
    domain: B256,
    chain_id: u64,
}

impl BlsSigner {
    pub fn new(domain: B256, chain_id: u64) -> Self {
        Self { domain, chain_id }
    }

    pub fn from_config(config: &NetworkConfig) -> Self {
        Self::new(config.bls_domain, config.chain_id)
    }

    pub fn domain(&self) -> B256 {
        self.domain
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Message point signed for `operation` by `public_key`.
    pub fn message_point(&self, public_key: &PublicKey, operation: &Operation) -> G1Affine {
        hash_to_point(
            &self.domain,
            &encode_message(self.chain_id, public_key, operation),
        )
    }

    /// Single-operation bundle signed by `private_key`.
    ///
    /// The message binds `keccak256(abi.encode(publicKey))` where a wallet address would go,
    /// so no address is taken here and [`verify`](Self::verify) needs only the bundle.
    pub fn sign(&self, operation: &Operation, private_key: &PrivateKey) -> Bundle {
        let public_key = private_key.public_key();
        let point = self.message_point(&public_key, operation);
        let signature = (point * private_key.scalar()).into_affine();
        Bundle {
            signature: g1_to_signature(&signature),
            sender_public_keys: vec![public_key],
            operations: vec![operation.clone()],
        }
    }

    /// Whether the aggregate signature covers every `(key, operation)` pair in order.
    ///
    /// Malformed bundles and invalid points verify as `false` rather than erroring.
    pub fn verify(&self, bundle: &Bundle) -> bool {
        if !bundle.is_well_formed() {
            debug!(
                "verify: {} keys for {} operations",
                bundle.sender_public_keys.len(),
                bundle.operations.len()
            );
            return false;
        }
        if bundle.is_empty() {
            return true;
        }
        let Ok(signature) = signature_to_g1(&bundle.signature) else {
            debug!("verify: signature is not a curve point");
            return false;
        };

        let mut g1: Vec<G1Affine> = Vec::with_capacity(bundle.len() + 1);
        let mut g2: Vec<G2Affine> = Vec::with_capacity(bundle.len() + 1);
        g1.push(-signature);
        g2.push(G2Affine::generator());

        for (public_key, operation) in bundle.sender_public_keys.iter().zip(&bundle.operations) {
            let Ok(key_point) = public_key_to_g2(public_key) else {
                debug!("verify: public key is not a G2 point");
                return false;
            };
            g1.push(self.message_point(public_key, operation));
            g2.push(key_point);
        }

        Bn254::multi_pairing(g1, g2).0.is_one()
    }
}

/// Concatenate bundles and sum their signatures.
///
/// Empty bundles contribute nothing; with no non-empty input the result is the empty
/// bundle carrying the identity signature.
pub fn aggregate(bundles: &[Bundle]) -> Result<Bundle, SignerError> {
    let mut out = Bundle::empty();
    let mut sum = G1Projective::default();
    for bundle in bundles.iter().filter(|b| !b.is_empty()) {
        sum += signature_to_g1(&bundle.signature)?;
        out.sender_public_keys
            .extend_from_slice(&bundle.sender_public_keys);
        out.operations.extend_from_slice(&bundle.operations);
    }
    out.signature = g1_to_signature(&sum.into_affine());
    Ok(out)
}
