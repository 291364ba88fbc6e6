//! Bundle-level framing around the per-operation compressors.
//!
//! Payload layout: `VLQ(n)`, then `n` times `VLQ(expanderIndex) || compressed op`, then the
//! 64-byte `abi.encode(uint256[2])` aggregate signature.

use alloy_primitives::U256;
use bls_bundle_types::{Bundle, Operation, PublicKey};
use log::{debug, warn};

use crate::{
    compressors::{
        BlsRegistrationCompressor, CompressorContext, Erc20Compressor, FallbackCompressor,
        OperationCompressor,
    },
    encoding::{encode_vlq, reader::read_signature, read_vlq_u64, ByteBuffer},
    errors::{CompressError, DecodeError, EncodeError},
    registry::ExpanderRegistry,
};

pub struct BundleCompressor {
    expander_registry: ExpanderRegistry,
    compressors: Vec<(u64, Box<dyn OperationCompressor>)>,
}

impl BundleCompressor {
    pub fn new(expander_registry: ExpanderRegistry) -> Self {
        Self {
            expander_registry,
            compressors: Vec::new(),
        }
    }

    /// Compressor list used by aggregators: registration, ERC-20, then fallback.
    pub async fn with_default_compressors(
        expander_registry: ExpanderRegistry,
        ctx: CompressorContext,
    ) -> Result<Self, CompressError> {
        let mut bundle_compressor = Self::new(expander_registry);
        bundle_compressor
            .add_compressor(Box::new(BlsRegistrationCompressor::new(ctx.clone())))
            .await?;
        bundle_compressor
            .add_compressor(Box::new(Erc20Compressor::new(ctx.clone())))
            .await?;
        bundle_compressor
            .add_compressor(Box::new(FallbackCompressor::new(ctx)))
            .await?;
        Ok(bundle_compressor)
    }

    /// Append `compressor`, tried after every compressor added before it.
    pub async fn add_compressor(
        &mut self,
        compressor: Box<dyn OperationCompressor>,
    ) -> Result<(), CompressError> {
        let expander = compressor.expander_address();
        let index = self
            .expander_registry
            .reverse_lookup(&expander)
            .await?
            .ok_or(CompressError::ExpanderNotRegistered(expander))?;
        debug!("compressor {} uses expander index {index}", compressor.name());
        self.compressors.push((index, compressor));
        Ok(())
    }

    pub async fn compress_operation(
        &self,
        public_key: &PublicKey,
        operation: &Operation,
    ) -> Result<Vec<u8>, CompressError> {
        let mut last_error = None;
        for (index, compressor) in &self.compressors {
            match compressor.compress(public_key, operation).await {
                Ok(Some(bytes)) => {
                    let mut out = encode_vlq(U256::from(*index));
                    out.extend_from_slice(&bytes);
                    return Ok(out);
                }
                Ok(None) => debug!("compressor {} declined operation", compressor.name()),
                Err(err) => {
                    warn!("compressor {} failed: {err}", compressor.name());
                    last_error = Some(Box::new(err));
                }
            }
        }
        Err(CompressError::NoCompressorApplies { last_error })
    }

    pub async fn compress(&self, bundle: &Bundle) -> Result<Vec<u8>, CompressError> {
        if !bundle.is_well_formed() {
            return Err(EncodeError::LengthMismatch {
                keys: bundle.sender_public_keys.len(),
                operations: bundle.operations.len(),
            }
            .into());
        }

        let mut buf = ByteBuffer::new();
        buf.push(encode_vlq(U256::from(bundle.operations.len())));
        for (public_key, operation) in bundle.sender_public_keys.iter().zip(&bundle.operations) {
            buf.push(self.compress_operation(public_key, operation).await?);
        }
        buf.push(bundle.signature.to_abi_bytes());
        Ok(buf.join())
    }

    pub async fn decompress(&self, bytes: &[u8]) -> Result<Bundle, DecodeError> {
        let mut i = 0;
        let count = read_vlq_u64(bytes, &mut i)?;

        let mut bundle = Bundle::empty();
        for _ in 0..count {
            let index = read_vlq_u64(bytes, &mut i)?;
            let compressor = self
                .compressors
                .iter()
                .find(|(id, _)| *id == index)
                .map(|(_, c)| c)
                .ok_or(DecodeError::UnknownExpander(index))?;
            let (public_key, operation) = compressor.decompress(bytes, &mut i).await?;
            bundle.sender_public_keys.push(public_key);
            bundle.operations.push(operation);
        }
        bundle.signature = read_signature(bytes, &mut i)?;

        if i != bytes.len() {
            return Err(DecodeError::TrailingBytes(bytes.len() - i));
        }
        Ok(bundle)
    }
}
