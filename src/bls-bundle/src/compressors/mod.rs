//! Per-operation compression strategies.
//!
//! Every strategy emits the same frame around its action encoding:
//!
//! - flag bit stream (slot reserved first, written last)
//! - public key: registry index or raw `uint256[4]`
//! - nonce (VLQ), gas (pseudo-float)
//! - action count (VLQ), excluding a trailing fee payment
//! - strategy-specific actions
//! - fee payment value (pseudo-float), when flagged
//!
//! Flags are consumed in the order public key, fee payment, then per-action flags.

pub mod bls_registration;
pub mod erc20;
pub mod fallback;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use bls_bundle_types::{ActionData, Operation, PublicKey};

use crate::{
    config::ContractAddresses,
    encoding::{
        encode_bit_stream, encode_pseudo_float, encode_reg_index, encode_vlq,
        reader::{read_address, read_public_key},
        read_pseudo_float, read_reg_index, read_vlq, read_vlq_u64, BitStream, ByteBuffer, Slot,
    },
    errors::{CompressError, DecodeError, EncodeError},
    interfaces::IAggregatorUtilities,
    registry::{AddressRegistry, BlsPublicKeyRegistry},
};

pub use bls_registration::BlsRegistrationCompressor;
pub use erc20::Erc20Compressor;
pub use fallback::FallbackCompressor;

/// One compression strategy, paired on-chain with the expander that reverses it.
#[async_trait]
pub trait OperationCompressor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Expander contract able to decode this strategy's output.
    fn expander_address(&self) -> Address;

    /// Compressed bytes for `operation`, or `None` if this strategy does not apply.
    async fn compress(
        &self,
        public_key: &PublicKey,
        operation: &Operation,
    ) -> Result<Option<Vec<u8>>, CompressError>;

    /// Inverse of [`Self::compress`], mirroring the expander contract.
    async fn decompress(
        &self,
        bytes: &[u8],
        i: &mut usize,
    ) -> Result<(PublicKey, Operation), DecodeError>;
}

/// Registries and well-known addresses shared by every strategy.
#[derive(Clone)]
pub struct CompressorContext {
    pub bls_public_key_registry: BlsPublicKeyRegistry,
    pub address_registry: AddressRegistry,
    pub addresses: ContractAddresses,
}

/// Action paying the aggregator: `sendEthToTxOrigin()` on the utilities contract.
pub fn fee_payment_action(aggregator_utilities: Address, value: U256) -> ActionData {
    ActionData {
        eth_value: value,
        contract_address: aggregator_utilities,
        encoded_function: Bytes::from(IAggregatorUtilities::sendEthToTxOriginCall {}.abi_encode()),
    }
}

/// Output under construction: byte chunks plus the flags that will prefix them.
pub(crate) struct FlaggedPayload {
    buf: ByteBuffer,
    flags_slot: Slot,
    flags: Vec<bool>,
}

impl FlaggedPayload {
    pub(crate) fn new() -> Self {
        let mut buf = ByteBuffer::new();
        let flags_slot = buf.reserve();
        Self {
            buf,
            flags_slot,
            flags: Vec::new(),
        }
    }

    pub(crate) fn flag(&mut self, bit: bool) {
        self.flags.push(bit);
    }

    pub(crate) fn push(&mut self, bytes: impl AsRef<[u8]>) {
        self.buf.push(bytes);
    }

    /// Registry index if `id` is known, else the raw bytes; one flag records which.
    pub(crate) fn push_indexed(&mut self, id: Option<u64>, raw: &[u8]) -> Result<(), EncodeError> {
        match id {
            Some(id) => {
                self.flag(true);
                self.push(encode_reg_index(id)?);
            }
            None => {
                self.flag(false);
                self.push(raw);
            }
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<Vec<u8>, EncodeError> {
        let Self {
            mut buf,
            flags_slot,
            flags,
        } = self;
        buf.fill(flags_slot, encode_bit_stream(&flags)?);
        Ok(buf.join())
    }
}

/// Common fields read back by [`CompressorContext::read_header`].
pub(crate) struct Header {
    pub flags: BitStream,
    pub public_key: PublicKey,
    pub nonce: U256,
    pub gas: U256,
    pub has_fee: bool,
    pub action_count: u64,
}

impl CompressorContext {
    pub fn new(
        bls_public_key_registry: BlsPublicKeyRegistry,
        address_registry: AddressRegistry,
        addresses: ContractAddresses,
    ) -> Self {
        Self {
            bls_public_key_registry,
            address_registry,
            addresses,
        }
    }

    /// Split a trailing `sendEthToTxOrigin()` call off `actions`.
    pub(crate) fn split_fee_payment<'a>(
        &self,
        actions: &'a [ActionData],
    ) -> (&'a [ActionData], Option<U256>) {
        match actions.split_last() {
            Some((last, rest))
                if last.contract_address == self.addresses.aggregator_utilities
                    && last.encoded_function[..]
                        == IAggregatorUtilities::sendEthToTxOriginCall::SELECTOR =>
            {
                (rest, Some(last.eth_value))
            }
            _ => (actions, None),
        }
    }

    pub(crate) async fn push_public_key(
        &self,
        payload: &mut FlaggedPayload,
        public_key: &PublicKey,
    ) -> Result<(), CompressError> {
        let id = self.bls_public_key_registry.reverse_lookup(public_key).await?;
        payload.push_indexed(id, &public_key.to_abi_bytes())?;
        Ok(())
    }

    pub(crate) async fn push_address(
        &self,
        payload: &mut FlaggedPayload,
        address: &Address,
    ) -> Result<(), CompressError> {
        let id = self.address_registry.reverse_lookup(address).await?;
        payload.push_indexed(id, address.as_slice())?;
        Ok(())
    }

    /// Public key, nonce, gas, fee flag and action count.
    pub(crate) async fn write_header(
        &self,
        payload: &mut FlaggedPayload,
        public_key: &PublicKey,
        operation: &Operation,
        fee: Option<U256>,
        action_count: usize,
    ) -> Result<(), CompressError> {
        self.push_public_key(payload, public_key).await?;
        payload.push(encode_vlq(operation.nonce));
        payload.push(encode_pseudo_float(operation.gas));
        payload.flag(fee.is_some());
        payload.push(encode_vlq(U256::from(action_count)));
        Ok(())
    }

    /// Trailing fee value, then the flags are written into their slot.
    pub(crate) fn finish(
        &self,
        mut payload: FlaggedPayload,
        fee: Option<U256>,
    ) -> Result<Vec<u8>, CompressError> {
        if let Some(value) = fee {
            payload.push(encode_pseudo_float(value));
        }
        Ok(payload.finish()?)
    }

    pub(crate) async fn read_public_key(
        &self,
        bytes: &[u8],
        i: &mut usize,
        flags: &mut BitStream,
    ) -> Result<PublicKey, DecodeError> {
        if flags.next_bit() {
            let id = read_reg_index(bytes, i)?;
            self.bls_public_key_registry
                .lookup(id)
                .await?
                .ok_or(DecodeError::MissingRegistryEntry(id))
        } else {
            read_public_key(bytes, i)
        }
    }

    pub(crate) async fn read_address(
        &self,
        bytes: &[u8],
        i: &mut usize,
        flags: &mut BitStream,
    ) -> Result<Address, DecodeError> {
        if flags.next_bit() {
            let id = read_reg_index(bytes, i)?;
            self.address_registry
                .lookup(id)
                .await?
                .ok_or(DecodeError::MissingRegistryEntry(id))
        } else {
            read_address(bytes, i)
        }
    }

    pub(crate) async fn read_header(
        &self,
        bytes: &[u8],
        i: &mut usize,
    ) -> Result<Header, DecodeError> {
        let mut flags = BitStream::read(bytes, i)?;
        let public_key = self.read_public_key(bytes, i, &mut flags).await?;
        let nonce = read_vlq(bytes, i)?;
        let gas = read_pseudo_float(bytes, i)?;
        let has_fee = flags.next_bit();
        let action_count = read_vlq_u64(bytes, i)?;
        Ok(Header {
            flags,
            public_key,
            nonce,
            gas,
            has_fee,
            action_count,
        })
    }

    /// Append the fee payment (if flagged) and assemble the operation.
    pub(crate) fn read_footer(
        &self,
        bytes: &[u8],
        i: &mut usize,
        header: Header,
        mut actions: Vec<ActionData>,
    ) -> Result<(PublicKey, Operation), DecodeError> {
        if header.has_fee {
            let value = read_pseudo_float(bytes, i)?;
            actions.push(fee_payment_action(self.addresses.aggregator_utilities, value));
        }
        Ok((
            header.public_key,
            Operation {
                nonce: header.nonce,
                gas: header.gas,
                actions,
            },
        ))
    }
}


#[cfg(test)]
mod tests {
    use super::{test_support::*, *};

    #[test]
    fn fee_payment_is_split_only_when_last() {
        let ctx = empty_context();
        let utilities = ctx.addresses.aggregator_utilities;
        let other = ActionData {
            eth_value: U256::from(1u64),
            contract_address: ctx.addresses.address_registry,
            encoded_function: Bytes::new(),
        };
        let fee = fee_payment_action(utilities, U256::from(5u64));

        let actions = vec![other.clone(), fee.clone()];
        let (rest, value) = ctx.split_fee_payment(&actions);
        assert_eq!(rest, &[other.clone()][..]);
        assert_eq!(value, Some(U256::from(5u64)));

        let actions = vec![fee, other];
        let (rest, value) = ctx.split_fee_payment(&actions);
        assert_eq!(rest.len(), 2);
        assert_eq!(value, None);
    }

    #[test]
    fn fee_payment_needs_exact_calldata() {
        let ctx = empty_context();
        let mut fee = fee_payment_action(ctx.addresses.aggregator_utilities, U256::ZERO);
        let mut calldata = fee.encoded_function.to_vec();
        calldata.push(0);
        fee.encoded_function = calldata.into();
        let actions = [fee];
        assert_eq!(ctx.split_fee_payment(&actions).1, None);
    }
}
