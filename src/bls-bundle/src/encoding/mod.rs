//! Byte-level primitives shared by every compressor and its expander.
//!
//! All multi-byte integers are big-endian and nothing is padded; the on-chain expanders
//! decode these shapes bit-for-bit, so changing any of them requires a new expander.

pub mod bit_stream;
pub mod buffer;
pub mod pseudo_float;
pub mod reader;
pub mod reg_index;
pub mod vlq;

pub use bit_stream::{encode_bit_stream, BitStream};
pub use buffer::{hex_join, ByteBuffer, Slot};
pub use pseudo_float::{encode_pseudo_float, read_pseudo_float};
pub use reg_index::{encode_reg_index, read_reg_index, MAX_REG_INDEX};
pub use vlq::{encode_vlq, read_vlq, read_vlq_u64};

use alloy_primitives::U256;

/// Narrow a 256-bit word to `u64`, or `None` if any high limb is set.
pub fn u256_to_u64(value: U256) -> Option<u64> {
    let limbs = value.as_limbs();
    limbs[1..].iter().all(|l| *l == 0).then_some(limbs[0])
}
