//! Minimal bounds-checked readers for fixed-width payload fields.

use alloy_primitives::Address;
use bls_bundle_types::{PublicKey, Signature};

use crate::errors::DecodeError;

pub fn read_u8(bytes: &[u8], i: &mut usize) -> Result<u8, DecodeError> {
    let b = *bytes.get(*i).ok_or(DecodeError::Truncated)?;
    *i += 1;
    Ok(b)
}

pub fn read_vec(bytes: &[u8], i: &mut usize, len: usize) -> Result<Vec<u8>, DecodeError> {
    let end = i.checked_add(len).ok_or(DecodeError::Truncated)?;
    if bytes.len() < end {
        return Err(DecodeError::Truncated);
    }
    let out = bytes[*i..end].to_vec();
    *i = end;
    Ok(out)
}

pub fn read_array<const N: usize>(bytes: &[u8], i: &mut usize) -> Result<[u8; N], DecodeError> {
    if bytes.len() < *i + N {
        return Err(DecodeError::Truncated);
    }
    let mut buf = [0u8; N];
    buf.copy_from_slice(&bytes[*i..*i + N]);
    *i += N;
    Ok(buf)
}

pub fn read_address(bytes: &[u8], i: &mut usize) -> Result<Address, DecodeError> {
    Ok(Address::from(read_array::<20>(bytes, i)?))
}

pub fn read_public_key(bytes: &[u8], i: &mut usize) -> Result<PublicKey, DecodeError> {
    Ok(PublicKey::from_abi_bytes(&read_array::<128>(bytes, i)?))
}

pub fn read_signature(bytes: &[u8], i: &mut usize) -> Result<Signature, DecodeError> {
    Ok(Signature::from_abi_bytes(&read_array::<64>(bytes, i)?))
}
