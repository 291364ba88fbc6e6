//! Private keys and conversions between wire words and BN254 points.

use std::fmt;

use alloy_primitives::U256;
use ark_bn254::{Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{BigInt, PrimeField, Zero};
use bls_bundle_types::{PublicKey, Signature};

use crate::errors::SignerError;

/// BN254 scalar used for signing. `Debug` never prints the scalar.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(Fr);

impl PrivateKey {
    /// 32 big-endian bytes, reduced modulo the group order. Zero is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignerError> {
        if bytes.len() != 32 {
            return Err(SignerError::InvalidPrivateKeyLength(bytes.len()));
        }
        let scalar = Fr::from_be_bytes_mod_order(bytes);
        if scalar.is_zero() {
            return Err(SignerError::ZeroPrivateKey);
        }
        Ok(Self(scalar))
    }

    /// Hex form, with or without `0x`.
    pub fn from_hex(text: &str) -> Result<Self, SignerError> {
        let text = text.trim();
        let digits = text.strip_prefix("0x").unwrap_or(text);
        let bytes = hex::decode(digits).map_err(|e| SignerError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn public_key(&self) -> PublicKey {
        g2_to_public_key(&(G2Affine::generator() * self.0).into_affine())
    }

    pub(crate) fn scalar(&self) -> Fr {
        self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

pub(crate) fn fq_to_u256(value: Fq) -> U256 {
    U256::from_limbs(value.into_bigint().0)
}

/// `None` if `value` is not below the field modulus.
pub(crate) fn u256_to_fq(value: U256) -> Option<Fq> {
    Fq::from_bigint(BigInt::new(*value.as_limbs()))
}

pub(crate) fn g2_to_public_key(point: &G2Affine) -> PublicKey {
    PublicKey([
        fq_to_u256(point.x.c1),
        fq_to_u256(point.x.c0),
        fq_to_u256(point.y.c1),
        fq_to_u256(point.y.c0),
    ])
}

/// Public keys must be non-identity points of the prime-order G2 subgroup.
pub(crate) fn public_key_to_g2(key: &PublicKey) -> Result<G2Affine, SignerError> {
    let [x1, x0, y1, y0] = key.0.map(u256_to_fq);
    let (Some(x1), Some(x0), Some(y1), Some(y0)) = (x1, x0, y1, y0) else {
        return Err(SignerError::InvalidPoint);
    };
    let point = G2Affine::new_unchecked(Fq2::new(x0, x1), Fq2::new(y0, y1));
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(SignerError::InvalidPoint);
    }
    Ok(point)
}

pub(crate) fn g1_to_signature(point: &G1Affine) -> Signature {
    if point.infinity {
        return Signature::EMPTY;
    }
    Signature([fq_to_u256(point.x), fq_to_u256(point.y)])
}

/// `[0, 0]` decodes to the identity; anything else must lie on the curve.
pub(crate) fn signature_to_g1(signature: &Signature) -> Result<G1Affine, SignerError> {
    if *signature == Signature::EMPTY {
        return Ok(G1Affine::identity());
    }
    let [x, y] = signature.0.map(u256_to_fq);
    let (Some(x), Some(y)) = (x, y) else {
        return Err(SignerError::InvalidPoint);
    };
    let point = G1Affine::new_unchecked(x, y);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(SignerError::InvalidPoint);
    }
    Ok(point)
}
