use alloy_primitives::{keccak256, B256, U256};
use bls_bundle_types::{Operation, PublicKey};

/// Bytes signed for `operation`, 160 in total:
///
/// `uint256 chainId || keccak256(abi.encode(publicKey)) || uint256 nonce || uint256 gas ||
/// keccak256(actions)`, where each action packs as
/// `uint256 ethValue || address || keccak256(encodedFunction)`.
pub fn encode_message(chain_id: u64, public_key: &PublicKey, operation: &Operation) -> Vec<u8> {
    let mut out = Vec::with_capacity(160);
    out.extend_from_slice(&U256::from(chain_id).to_be_bytes::<32>());
    out.extend_from_slice(public_key.hash().as_slice());
    out.extend_from_slice(&operation.nonce.to_be_bytes::<32>());
    out.extend_from_slice(&operation.gas.to_be_bytes::<32>());
    out.extend_from_slice(actions_hash(operation).as_slice());
    out
}

fn actions_hash(operation: &Operation) -> B256 {
    let mut packed = Vec::with_capacity(operation.actions.len() * 84);
    for action in &operation.actions {
        packed.extend_from_slice(&action.eth_value.to_be_bytes::<32>());
        packed.extend_from_slice(action.contract_address.as_slice());
        packed.extend_from_slice(keccak256(&action.encoded_function).as_slice());
    }
    keccak256(packed)
}
