//! Compact encoding for operations made only of plain ERC-20 calls.
//!
//! The expander re-creates calldata from a method tag and its arguments, so the
//! strategy only applies when that re-creation is byte-exact.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use bls_bundle_types::{ActionData, Operation, PublicKey};
use log::debug;

use crate::{
    compressors::{CompressorContext, FlaggedPayload, OperationCompressor},
    encoding::{encode_pseudo_float, encode_vlq, read_pseudo_float, read_vlq_u64, BitStream},
    errors::{CompressError, DecodeError},
    interfaces::IERC20,
};

/// A decoded ERC-20 call the expander can rebuild.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Erc20Call {
    Transfer { to: Address, amount: U256 },
    TransferFrom { from: Address, to: Address, amount: U256 },
    Approve { spender: Address, amount: U256 },
    /// `approve(spender, type(uint256).max)`; the amount is implied by the tag.
    ApproveMax { spender: Address },
    Mint { to: Address, amount: U256 },
}

impl Erc20Call {
    pub const TAG_TRANSFER: u64 = 0;
    pub const TAG_TRANSFER_FROM: u64 = 1;
    pub const TAG_APPROVE: u64 = 2;
    pub const TAG_APPROVE_MAX: u64 = 3;
    pub const TAG_MINT: u64 = 4;

    /// Recognise `calldata`. Returns `None` unless re-encoding the result yields the
    /// same bytes (selector, length and clean words all checked).
    pub fn parse(calldata: &[u8]) -> Option<Self> {
        let selector: [u8; 4] = calldata.get(..4)?.try_into().ok()?;

        let call = if selector == IERC20::transferCall::SELECTOR {
            let c = IERC20::transferCall::abi_decode(calldata, true).ok()?;
            Self::Transfer {
                to: c.to,
                amount: c.amount,
            }
        } else if selector == IERC20::transferFromCall::SELECTOR {
            let c = IERC20::transferFromCall::abi_decode(calldata, true).ok()?;
            Self::TransferFrom {
                from: c.from,
                to: c.to,
                amount: c.amount,
            }
        } else if selector == IERC20::approveCall::SELECTOR {
            let c = IERC20::approveCall::abi_decode(calldata, true).ok()?;
            if c.amount == U256::MAX {
                Self::ApproveMax { spender: c.spender }
            } else {
                Self::Approve {
                    spender: c.spender,
                    amount: c.amount,
                }
            }
        } else if selector == IERC20::mintCall::SELECTOR {
            let c = IERC20::mintCall::abi_decode(calldata, true).ok()?;
            Self::Mint {
                to: c.to,
                amount: c.amount,
            }
        } else {
            return None;
        };

        (call.calldata() == calldata).then_some(call)
    }

    pub fn tag(&self) -> u64 {
        match self {
            Self::Transfer { .. } => Self::TAG_TRANSFER,
            Self::TransferFrom { .. } => Self::TAG_TRANSFER_FROM,
            Self::Approve { .. } => Self::TAG_APPROVE,
            Self::ApproveMax { .. } => Self::TAG_APPROVE_MAX,
            Self::Mint { .. } => Self::TAG_MINT,
        }
    }

    pub fn calldata(&self) -> Vec<u8> {
        match *self {
            Self::Transfer { to, amount } => IERC20::transferCall { to, amount }.abi_encode(),
            Self::TransferFrom { from, to, amount } => {
                IERC20::transferFromCall { from, to, amount }.abi_encode()
            }
            Self::Approve { spender, amount } => {
                IERC20::approveCall { spender, amount }.abi_encode()
            }
            Self::ApproveMax { spender } => IERC20::approveCall {
                spender,
                amount: U256::MAX,
            }
            .abi_encode(),
            Self::Mint { to, amount } => IERC20::mintCall { to, amount }.abi_encode(),
        }
    }

    /// Address arguments in encode order.
    fn addresses(&self) -> Vec<Address> {
        match *self {
            Self::Transfer { to, .. } | Self::Mint { to, .. } => vec![to],
            Self::TransferFrom { from, to, .. } => vec![from, to],
            Self::Approve { spender, .. } | Self::ApproveMax { spender } => vec![spender],
        }
    }

    fn amount(&self) -> Option<U256> {
        match *self {
            Self::Transfer { amount, .. }
            | Self::TransferFrom { amount, .. }
            | Self::Approve { amount, .. }
            | Self::Mint { amount, .. } => Some(amount),
            Self::ApproveMax { .. } => None,
        }
    }
}

pub struct Erc20Compressor {
    ctx: CompressorContext,
    expander: Address,
}

impl Erc20Compressor {
    pub fn new(ctx: CompressorContext) -> Self {
        let expander = ctx.addresses.erc20_expander;
        Self { ctx, expander }
    }

    async fn read_call(
        &self,
        bytes: &[u8],
        i: &mut usize,
        flags: &mut BitStream,
    ) -> Result<Erc20Call, DecodeError> {
        let tag = read_vlq_u64(bytes, i)?;
        let call = match tag {
            Erc20Call::TAG_TRANSFER => Erc20Call::Transfer {
                to: self.ctx.read_address(bytes, i, flags).await?,
                amount: read_pseudo_float(bytes, i)?,
            },
            Erc20Call::TAG_TRANSFER_FROM => Erc20Call::TransferFrom {
                from: self.ctx.read_address(bytes, i, flags).await?,
                to: self.ctx.read_address(bytes, i, flags).await?,
                amount: read_pseudo_float(bytes, i)?,
            },
            Erc20Call::TAG_APPROVE => Erc20Call::Approve {
                spender: self.ctx.read_address(bytes, i, flags).await?,
                amount: read_pseudo_float(bytes, i)?,
            },
            Erc20Call::TAG_APPROVE_MAX => Erc20Call::ApproveMax {
                spender: self.ctx.read_address(bytes, i, flags).await?,
            },
            Erc20Call::TAG_MINT => Erc20Call::Mint {
                to: self.ctx.read_address(bytes, i, flags).await?,
                amount: read_pseudo_float(bytes, i)?,
            },
            other => return Err(DecodeError::UnknownMethod(other)),
        };
        Ok(call)
    }
}

#[async_trait]
impl OperationCompressor for Erc20Compressor {
    fn name(&self) -> &'static str {
        "erc20"
    }

    fn expander_address(&self) -> Address {
        self.expander
    }

    async fn compress(
        &self,
        public_key: &PublicKey,
        operation: &Operation,
    ) -> Result<Option<Vec<u8>>, CompressError> {
        let (actions, fee) = self.ctx.split_fee_payment(&operation.actions);

        let mut calls = Vec::with_capacity(actions.len());
        for (n, action) in actions.iter().enumerate() {
            if !action.eth_value.is_zero() {
                debug!("erc20: action {n} sends value");
                return Ok(None);
            }
            match Erc20Call::parse(&action.encoded_function) {
                Some(call) => calls.push((action.contract_address, call)),
                None => {
                    debug!("erc20: action {n} is not a plain ERC-20 call");
                    return Ok(None);
                }
            }
        }

        let mut payload = FlaggedPayload::new();
        self.ctx
            .write_header(&mut payload, public_key, operation, fee, calls.len())
            .await?;

        for (token, call) in &calls {
            self.ctx.push_address(&mut payload, token).await?;
            payload.push(encode_vlq(U256::from(call.tag())));
            for address in call.addresses() {
                self.ctx.push_address(&mut payload, &address).await?;
            }
            if let Some(amount) = call.amount() {
                payload.push(encode_pseudo_float(amount));
            }
        }

        self.ctx.finish(payload, fee).map(Some)
    }

    async fn decompress(
        &self,
        bytes: &[u8],
        i: &mut usize,
    ) -> Result<(PublicKey, Operation), DecodeError> {
        let mut header = self.ctx.read_header(bytes, i).await?;
        let mut actions = Vec::new();
        for _ in 0..header.action_count {
            let token = self.ctx.read_address(bytes, i, &mut header.flags).await?;
            let call = self.read_call(bytes, i, &mut header.flags).await?;
            actions.push(ActionData {
                eth_value: U256::ZERO,
                contract_address: token,
                encoded_function: Bytes::from(call.calldata()),
            });
        }
        self.ctx.read_footer(bytes, i, header, actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressors::{fee_payment_action, test_support::*};
    use alloy_primitives::address;
    use assert_matches::assert_matches;
    use test_case::test_case;

    const TOKEN: Address = address!("00000000000000000000000000000000000000c0");
    const ALICE: Address = address!("00000000000000000000000000000000000000a1");
    const BOB: Address = address!("00000000000000000000000000000000000000b0");

    fn token_action(call: &Erc20Call) -> ActionData {
        ActionData {
            eth_value: U256::ZERO,
            contract_address: TOKEN,
            encoded_function: Bytes::from(call.calldata()),
        }
    }

    fn operation(actions: Vec<ActionData>) -> Operation {
        Operation {
            nonce: U256::from(7u64),
            gas: U256::from(500_000u64),
            actions,
        }
    }

    #[test_case(Erc20Call::Transfer { to: BOB, amount: U256::from(1_000u64) } ; "transfer")]
    #[test_case(Erc20Call::TransferFrom { from: ALICE, to: BOB, amount: U256::from(5u64) } ; "transfer from")]
    #[test_case(Erc20Call::Approve { spender: BOB, amount: U256::from(42u64) } ; "approve")]
    #[test_case(Erc20Call::ApproveMax { spender: BOB } ; "approve max")]
    #[test_case(Erc20Call::Mint { to: ALICE, amount: U256::from(10u64).pow(U256::from(18u64)) } ; "mint")]
    fn parse_recognises_calldata(call: Erc20Call) {
        assert_eq!(Erc20Call::parse(&call.calldata()), Some(call));
    }

    #[test]
    fn parse_rejects_extra_bytes_and_dirty_words() {
        let mut long = Erc20Call::Transfer {
            to: BOB,
            amount: U256::from(1u64),
        }
        .calldata();
        long.push(0);
        assert_eq!(Erc20Call::parse(&long), None);

        let mut dirty = Erc20Call::Transfer {
            to: BOB,
            amount: U256::from(1u64),
        }
        .calldata();
        // high bytes of the address word must be zero
        dirty[4] = 0xff;
        assert_eq!(Erc20Call::parse(&dirty), None);

        assert_eq!(Erc20Call::parse(&[0xa9, 0x05]), None);
        assert_eq!(Erc20Call::parse(&[]), None);
    }

    #[tokio::test]
    async fn round_trips_every_method() {
        let compressor = Erc20Compressor::new(empty_context());
        let op = operation(vec![
            token_action(&Erc20Call::Transfer {
                to: BOB,
                amount: U256::from(1_000u64),
            }),
            token_action(&Erc20Call::TransferFrom {
                from: ALICE,
                to: BOB,
                amount: U256::from(123_456u64),
            }),
            token_action(&Erc20Call::Approve {
                spender: BOB,
                amount: U256::ZERO,
            }),
            token_action(&Erc20Call::ApproveMax { spender: ALICE }),
            token_action(&Erc20Call::Mint {
                to: ALICE,
                amount: U256::from(3u64) * U256::from(10u64).pow(U256::from(20u64)),
            }),
        ]);
        round_trip(&compressor, &sample_key(20), &op).await;
    }

    #[tokio::test]
    async fn registered_transfer_is_tiny() {
        let ctx = empty_context();
        let key = sample_key(21);
        ctx.bls_public_key_registry.register(&key).await.unwrap();
        ctx.address_registry.register(&TOKEN).await.unwrap();
        ctx.address_registry.register(&BOB).await.unwrap();
        let compressor = Erc20Compressor::new(ctx);

        let op = operation(vec![token_action(&Erc20Call::Transfer {
            to: BOB,
            amount: U256::from(10u64).pow(U256::from(18u64)),
        })]);
        let bytes = round_trip(&compressor, &key, &op).await;
        // flags, key index, nonce, gas (2), count, token index, tag, recipient index, amount (2)
        assert_eq!(bytes.len(), 1 + 3 + 1 + 2 + 1 + 3 + 1 + 3 + 2);
    }

    #[tokio::test]
    async fn fee_payment_is_allowed_after_token_calls() {
        let ctx = empty_context();
        let utilities = ctx.addresses.aggregator_utilities;
        let compressor = Erc20Compressor::new(ctx);
        let op = operation(vec![
            token_action(&Erc20Call::ApproveMax { spender: BOB }),
            fee_payment_action(utilities, U256::from(1_000u64)),
        ]);
        round_trip(&compressor, &sample_key(22), &op).await;
    }

    #[tokio::test]
    async fn declines_value_transfers() {
        let compressor = Erc20Compressor::new(empty_context());
        let mut action = token_action(&Erc20Call::Transfer {
            to: BOB,
            amount: U256::from(1u64),
        });
        action.eth_value = U256::from(1u64);
        let op = operation(vec![action]);
        assert_eq!(compressor.compress(&sample_key(23), &op).await.unwrap(), None);
    }

    #[tokio::test]
    async fn declines_when_any_action_is_foreign() {
        let compressor = Erc20Compressor::new(empty_context());
        let op = operation(vec![
            token_action(&Erc20Call::Transfer {
                to: BOB,
                amount: U256::from(1u64),
            }),
            ActionData {
                eth_value: U256::ZERO,
                contract_address: TOKEN,
                encoded_function: Bytes::from(vec![0x12, 0x34, 0x56, 0x78]),
            },
        ]);
        assert_eq!(compressor.compress(&sample_key(24), &op).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_tag_is_rejected() {
        let compressor = Erc20Compressor::new(empty_context());
        let mut bytes = vec![0x00];
        bytes.extend_from_slice(&sample_key(25).to_abi_bytes());
        // nonce 0, gas 0, one action, raw token, tag 9
        bytes.extend_from_slice(&[0, 0, 1]);
        bytes.extend_from_slice(TOKEN.as_slice());
        bytes.push(9);
        let mut i = 0;
        let err = compressor.decompress(&bytes, &mut i).await.unwrap_err();
        assert_matches!(err, DecodeError::UnknownMethod(9));
    }

    #[tokio::test]
    async fn oversized_action_count_runs_out_of_input() {
        let compressor = Erc20Compressor::new(empty_context());
        let mut bytes = raw_key_header(1 << 40);
        // one complete transfer, then nothing
        bytes.extend_from_slice(TOKEN.as_slice());
        bytes.push(Erc20Call::TAG_TRANSFER as u8);
        bytes.extend_from_slice(&[0xbb; 20]);
        bytes.push(0x00);
        let mut i = 0;
        let err = compressor.decompress(&bytes, &mut i).await.unwrap_err();
        assert_matches!(err, DecodeError::Truncated);
    }
}
