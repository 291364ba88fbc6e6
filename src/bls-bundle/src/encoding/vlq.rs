use alloy_primitives::U256;

use crate::{encoding::u256_to_u64, errors::DecodeError};

/// Encode `value` as 7-bit groups, most significant first, continuation bit on every byte
/// but the last.
pub fn encode_vlq(value: U256) -> Vec<u8> {
    let mut groups = Vec::new();
    let mut x = value;
    loop {
        groups.push((x.as_limbs()[0] & 0x7f) as u8);
        x >>= 7;
        if x.is_zero() {
            break;
        }
    }
    groups.reverse();
    let last = groups.len() - 1;
    for group in &mut groups[..last] {
        *group |= 0x80;
    }
    groups
}

pub fn read_vlq(bytes: &[u8], i: &mut usize) -> Result<U256, DecodeError> {
    let mut acc = U256::ZERO;
    loop {
        let byte = *bytes.get(*i).ok_or(DecodeError::Truncated)?;
        *i += 1;
        if acc.leading_zeros() < 7 {
            return Err(DecodeError::Overflow);
        }
        acc = (acc << 7) | U256::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            return Ok(acc);
        }
    }
}

/// VLQ for counts, lengths and expander indices, which must fit in a `u64`.
pub fn read_vlq_u64(bytes: &[u8], i: &mut usize) -> Result<u64, DecodeError> {
    u256_to_u64(read_vlq(bytes, i)?).ok_or(DecodeError::Overflow)
}
