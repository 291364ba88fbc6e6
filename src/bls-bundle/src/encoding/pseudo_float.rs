//! Decimal pseudo-float for wei amounts.
//!
//! Layout: `0x00` for zero, otherwise a header byte `((e + 1) << 3) | (m & 7)` followed by
//! `VLQ(m >> 3)`, where `value = m * 10^e` and `e <= 30` counts stripped trailing zeros.
//! Round amounts such as 1 ETH cost two bytes; arbitrary amounts cost about one byte per
//! seven bits of mantissa.

use alloy_primitives::U256;

use crate::{
    encoding::vlq::{encode_vlq, read_vlq},
    errors::DecodeError,
};

const MAX_EXPONENT: u8 = 30;

pub fn encode_pseudo_float(value: U256) -> Vec<u8> {
    if value.is_zero() {
        return vec![0];
    }

    let ten = U256::from(10u64);
    let mut mantissa = value;
    let mut exponent = 0u8;
    while exponent < MAX_EXPONENT && (mantissa % ten).is_zero() {
        mantissa /= ten;
        exponent += 1;
    }

    let low_bits = (mantissa.as_limbs()[0] & 0b111) as u8;
    let mut out = vec![((exponent + 1) << 3) | low_bits];
    out.extend(encode_vlq(mantissa >> 3));
    out
}

pub fn read_pseudo_float(bytes: &[u8], i: &mut usize) -> Result<U256, DecodeError> {
    let header = *bytes.get(*i).ok_or(DecodeError::Truncated)?;
    *i += 1;
    if header == 0 {
        return Ok(U256::ZERO);
    }

    let exponent_bits = header >> 3;
    if exponent_bits == 0 {
        return Err(DecodeError::MalformedPseudoFloat(header));
    }

    let high = read_vlq(bytes, i)?;
    if high.leading_zeros() < 3 {
        return Err(DecodeError::Overflow);
    }
    let mantissa: U256 = (high << 3usize) | U256::from(header & 0b111);
    let scale = U256::from(10u64).pow(U256::from(exponent_bits - 1));
    mantissa.checked_mul(scale).ok_or(DecodeError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn decode(bytes: &[u8]) -> Result<U256, DecodeError> {
        let mut i = 0;
        let value = read_pseudo_float(bytes, &mut i)?;
        assert_eq!(i, bytes.len());
        Ok(value)
    }

    #[test_case(U256::ZERO, &[0x00]; "zero")]
    #[test_case(U256::from(1u64), &[0x09, 0x00]; "one wei")]
    #[test_case(U256::from(10u64).pow(U256::from(18u64)), &[0x99, 0x00]; "one ether")]
    #[test_case(U256::from(30_000_000u64), &[0x43, 0x00]; "thirty million gas")]
    #[test_case(U256::from(13u64), &[0x0d, 0x01]; "thirteen")]
    fn known_encodings(value: U256, expected: &[u8]) {
        assert_eq!(encode_pseudo_float(value), expected);
        assert_eq!(decode(expected).unwrap(), value);
    }

    #[test]
    fn exponent_caps_at_thirty() {
        let value = U256::from(10u64).pow(U256::from(40u64));
        let bytes = encode_pseudo_float(value);
        assert_eq!(bytes[0] >> 3, 31);
        assert_eq!(decode(&bytes).unwrap(), value);
    }

    #[test]
    fn rejects_malformed_header() {
        assert_eq!(decode(&[0x05, 0x00]), Err(DecodeError::MalformedPseudoFloat(0x05)));
    }

    #[test]
    fn rejects_overflowing_value() {
        let mut bytes = vec![0xff];
        bytes.extend(encode_vlq(U256::MAX >> 3));
        assert_eq!(decode(&bytes), Err(DecodeError::Overflow));
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(limbs in any::<[u64; 4]>()) {
            let value = U256::from_limbs(limbs);
            prop_assert_eq!(decode(&encode_pseudo_float(value)).unwrap(), value);
        }

        #[test]
        fn round_amounts_are_small(digit in 1u64..8, exponent in 0u64..=30) {
            let value = U256::from(digit) * U256::from(10u64).pow(U256::from(exponent));
            prop_assert_eq!(encode_pseudo_float(value).len(), 2);
        }
    }
}
