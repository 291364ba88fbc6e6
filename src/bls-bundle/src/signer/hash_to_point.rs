//! Hash to G1 on BN254 (`y^2 = x^3 + 3`).
//!
//! `expand_message_xmd` over keccak256 stretches the message to 96 bytes, the halves become
//! two field elements, and each is mapped with the Fouque-Tibouchi encoding. The map and its
//! constants match the on-chain verifier, so points must agree bit-for-bit.

use alloy_primitives::{B256, U256};
use ark_bn254::{Fq, G1Affine};
use ark_ec::CurveGroup;
use ark_ff::{Field, MontFp, One, PrimeField, Zero};
use sha3::{Digest, Keccak256};

/// `sqrt(-3)` as computed by `a^((p + 1) / 4)`.
const Z0: Fq = MontFp!("4407920970296243842837207485651524041948558517760411303933");
/// `(Z0 - 1) / 2`.
const Z1: Fq = MontFp!("2203960485148121921418603742825762020974279258880205651966");

const CURVE_B: Fq = MontFp!("3");

const EXPANDED_LEN: usize = 96;
/// Input block size of the zero prefix in `expand_message_xmd`.
const ZERO_PAD_LEN: usize = 64;

pub fn hash_to_point(domain: &B256, message: &[u8]) -> G1Affine {
    let [u0, u1] = hash_to_field(domain, message);
    (map_to_point(u0) + map_to_point(u1)).into_affine()
}

pub fn hash_to_field(domain: &B256, message: &[u8]) -> [Fq; 2] {
    let expanded = expand_message_xmd(domain, message);
    let (lo, hi) = expanded.split_at(EXPANDED_LEN / 2);
    [
        Fq::from_be_bytes_mod_order(lo),
        Fq::from_be_bytes_mod_order(hi),
    ]
}

/// `expand_message_xmd` with keccak256, fixed to 96 output bytes.
pub fn expand_message_xmd(domain: &B256, message: &[u8]) -> [u8; EXPANDED_LEN] {
    let dst_suffix = |hasher: &mut Keccak256| {
        hasher.update(domain);
        hasher.update([domain.len() as u8]);
    };

    let mut hasher = Keccak256::new();
    hasher.update([0u8; ZERO_PAD_LEN]);
    hasher.update(message);
    hasher.update([0x00, EXPANDED_LEN as u8, 0x00]);
    dst_suffix(&mut hasher);
    let b0: [u8; 32] = hasher.finalize().into();

    let mut out = [0u8; EXPANDED_LEN];
    let mut prev = [0u8; 32];
    for (i, chunk) in out.chunks_exact_mut(32).enumerate() {
        let mut hasher = Keccak256::new();
        let mut mixed = b0;
        if i > 0 {
            for (m, p) in mixed.iter_mut().zip(prev.iter()) {
                *m ^= p;
            }
        }
        hasher.update(mixed);
        hasher.update([i as u8 + 1]);
        dst_suffix(&mut hasher);
        prev = hasher.finalize().into();
        chunk.copy_from_slice(&prev);
    }
    out
}

/// Fouque-Tibouchi map of one field element to a curve point.
pub fn map_to_point(u: Fq) -> G1Affine {
    let (_, decision) = sqrt(u);

    let a0 = u.square() + Fq::from(4u64);
    let mut a1 = u * Z0;
    // inverse of zero reads as zero, as with the modexp precompile
    let a2 = (a1 * a0).inverse().unwrap_or_else(Fq::zero);
    a1 = a1.square() * a2;
    a1 *= u;

    let x1 = Z1 - a1;
    let x2 = -(x1 + Fq::one());

    // one of the three candidates always yields a square
    let (x, y) = [x1, x2]
        .into_iter()
        .find_map(|x| {
            let (y, found) = sqrt(curve_rhs(x));
            found.then_some((x, y))
        })
        .unwrap_or_else(|| {
            let x3 = a0.square().square() * a2.square() + Fq::one();
            (x3, sqrt(curve_rhs(x3)).0)
        });

    let y = if decision { y } else { -y };
    G1Affine::new_unchecked(x, y)
}

fn curve_rhs(x: Fq) -> Fq {
    x.square() * x + CURVE_B
}

/// `a^((p + 1) / 4)` and whether it squares back to `a`.
fn sqrt(a: Fq) -> (Fq, bool) {
    let p = U256::from_limbs(Fq::MODULUS.0);
    let exponent: U256 = (p + U256::from(1u64)) >> 2usize;
    let root = a.pow(exponent.as_limbs());
    (root, root.square() == a)
}
