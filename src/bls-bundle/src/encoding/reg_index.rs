use crate::errors::{DecodeError, EncodeError};

/// Largest id addressable by the 3-byte registry index.
pub const MAX_REG_INDEX: u64 = (1 << 24) - 1;

pub fn encode_reg_index(id: u64) -> Result<[u8; 3], EncodeError> {
    if id > MAX_REG_INDEX {
        return Err(EncodeError::IndexOutOfRange(id));
    }
    let be = id.to_be_bytes();
    Ok([be[5], be[6], be[7]])
}

pub fn read_reg_index(bytes: &[u8], i: &mut usize) -> Result<u64, DecodeError> {
    if bytes.len() < *i + 3 {
        return Err(DecodeError::Truncated);
    }
    let mut buf = [0u8; 8];
    buf[5..].copy_from_slice(&bytes[*i..*i + 3]);
    *i += 3;
    Ok(u64::from_be_bytes(buf))
}
