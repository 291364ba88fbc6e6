use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use bls_bundle_types::{ActionData, Operation, PublicKey};
use log::debug;

use crate::{
    compressors::{CompressorContext, FlaggedPayload, OperationCompressor},
    errors::{CompressError, DecodeError},
    interfaces::IBLSPublicKeyRegistry,
};

/// Operation registering the sender's own key, optionally followed by a fee payment.
///
/// The registration action carries no bytes: the expander rebuilds
/// `register(senderKey)` against the key registry.
pub struct BlsRegistrationCompressor {
    ctx: CompressorContext,
    expander: Address,
}

impl BlsRegistrationCompressor {
    pub fn new(ctx: CompressorContext) -> Self {
        let expander = ctx.addresses.bls_registration_expander;
        Self { ctx, expander }
    }

    fn registration_action(&self, public_key: &PublicKey) -> ActionData {
        ActionData {
            eth_value: U256::ZERO,
            contract_address: self.ctx.addresses.bls_public_key_registry,
            encoded_function: Bytes::from(
                IBLSPublicKeyRegistry::registerCall {
                    blsPublicKey: public_key.0,
                }
                .abi_encode(),
            ),
        }
    }
}

#[async_trait]
impl OperationCompressor for BlsRegistrationCompressor {
    fn name(&self) -> &'static str {
        "bls-registration"
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
        match actions {
            [action] if *action == self.registration_action(public_key) => {}
            _ => {
                debug!("bls-registration: not a self-registration");
                return Ok(None);
            }
        }

        let mut payload = FlaggedPayload::new();
        self.ctx
            .write_header(&mut payload, public_key, operation, fee, actions.len())
            .await?;
        self.ctx.finish(payload, fee).map(Some)
    }

    async fn decompress(
        &self,
        bytes: &[u8],
        i: &mut usize,
    ) -> Result<(PublicKey, Operation), DecodeError> {
        let header = self.ctx.read_header(bytes, i).await?;
        if header.action_count != 1 {
            return Err(DecodeError::UnexpectedActionCount(header.action_count));
        }
        let actions = vec![self.registration_action(&header.public_key)];
        self.ctx.read_footer(bytes, i, header, actions)
    }
}
