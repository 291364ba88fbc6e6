//! Flag word: flag `i` is bit `i` of an integer (least significant first), carried as VLQ.
//!
//! The expander pulls flags one at a time as it meets the fields they describe; flags past
//! the highest set bit read as `false`, so trailing `false` flags cost nothing.

use alloy_primitives::U256;

use crate::{
    encoding::vlq::{encode_vlq, read_vlq},
    errors::{DecodeError, EncodeError},
};

const MAX_FLAGS: usize = 256;

pub fn encode_bit_stream(bits: &[bool]) -> Result<Vec<u8>, EncodeError> {
    if bits.len() > MAX_FLAGS {
        return Err(EncodeError::TooManyFlags(bits.len()));
    }
    let mut stream = U256::ZERO;
    for (index, bit) in bits.iter().enumerate() {
        if *bit {
            stream.set_bit(index, true);
        }
    }
    Ok(encode_vlq(stream))
}

/// Reader side of the flag word.
#[derive(Clone, Debug)]
pub struct BitStream {
    value: U256,
    position: usize,
}

impl BitStream {
    pub fn read(bytes: &[u8], i: &mut usize) -> Result<Self, DecodeError> {
        Ok(Self {
            value: read_vlq(bytes, i)?,
            position: 0,
        })
    }

    pub fn next_bit(&mut self) -> bool {
        let bit = self.position < MAX_FLAGS && self.value.bit(self.position);
        self.position += 1;
        bit
    }

    /// Read exactly `len` flags.
    pub fn take(&mut self, len: usize) -> Vec<bool> {
        (0..len).map(|_| self.next_bit()).collect()
    }
}
