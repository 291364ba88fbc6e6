use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use bls_bundle_types::{ActionData, Operation, PublicKey};

use crate::{
    compressors::{CompressorContext, FlaggedPayload, OperationCompressor},
    encoding::{encode_pseudo_float, encode_vlq, read_pseudo_float, read_vlq_u64, reader::read_vec},
    errors::{CompressError, DecodeError},
};

/// Encodes any operation: each action is value, target and raw calldata.
pub struct FallbackCompressor {
    ctx: CompressorContext,
    expander: Address,
}

impl FallbackCompressor {
    pub fn new(ctx: CompressorContext) -> Self {
        let expander = ctx.addresses.fallback_expander;
        Self { ctx, expander }
    }
}

#[async_trait]
impl OperationCompressor for FallbackCompressor {
    fn name(&self) -> &'static str {
        "fallback"
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
        let mut payload = FlaggedPayload::new();
        self.ctx
            .write_header(&mut payload, public_key, operation, fee, actions.len())
            .await?;

        for action in actions {
            payload.push(encode_pseudo_float(action.eth_value));
            self.ctx
                .push_address(&mut payload, &action.contract_address)
                .await?;
            payload.push(encode_vlq(U256::from(action.encoded_function.len())));
            payload.push(&action.encoded_function);
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
            let eth_value = read_pseudo_float(bytes, i)?;
            let contract_address = self.ctx.read_address(bytes, i, &mut header.flags).await?;
            let len = usize::try_from(read_vlq_u64(bytes, i)?).map_err(|_| DecodeError::Truncated)?;
            let encoded_function = Bytes::from(read_vec(bytes, i, len)?);
            actions.push(ActionData {
                eth_value,
                contract_address,
                encoded_function,
            });
        }
        self.ctx.read_footer(bytes, i, header, actions)
    }
}
