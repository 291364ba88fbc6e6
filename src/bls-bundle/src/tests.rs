//! End-to-end scenarios: sign, aggregate, compress, decompress, verify.

use alloy_primitives::{keccak256, Address, Bytes, U256};
use bls_bundle_types::{ActionData, Bundle, Operation};

use crate::{
    compressors::{
        erc20::Erc20Call, fee_payment_action, test_support::*, CompressorContext,
    },
    config::default_bls_domain,
    registry::{MemoryRegistryContract, Registry, RegistrySnapshot},
    signer::{aggregate, BlsSigner, PrivateKey},
    wallet::BlsWallet,
    BundleCompressor,
};

fn signer() -> BlsSigner {
    BlsSigner::new(default_bls_domain(), 31337)
}

fn wallet(seed: u8) -> BlsWallet {
    BlsWallet::new(
        PrivateKey::from_bytes(&[seed; 32]).unwrap(),
        Address::from_word(keccak256([seed; 4])),
        signer(),
    )
}

fn shared_operation() -> Operation {
    Operation {
        nonce: U256::from(123u64),
        gas: U256::from(30_000_000u64),
        actions: vec![ActionData {
            eth_value: U256::ZERO,
            contract_address: Address::from_word(keccak256([0u8; 32])),
            encoded_function: Bytes::from(vec![0x5c]),
        }],
    }
}

async fn bundle_compressor(ctx: CompressorContext) -> BundleCompressor {
    let a = &ctx.addresses;
    let expanders = Registry::new(MemoryRegistryContract::with_entries(vec![
        a.fallback_expander,
        a.bls_registration_expander,
        a.erc20_expander,
    ]));
    BundleCompressor::with_default_compressors(expanders, ctx)
        .await
        .unwrap()
}

#[test]
fn two_signers_aggregate_and_verify() {
    let op = shared_operation();
    let a = wallet(1).sign(&op);
    let b = wallet(2).sign(&op);

    let aggregated = aggregate(&[a, b]).unwrap();
    assert_eq!(aggregated.len(), 2);
    assert!(signer().verify(&aggregated));

    let mut tampered = aggregated.clone();
    tampered.operations[1].actions[0].eth_value = U256::from(1u64);
    assert!(!signer().verify(&tampered));

    let mut tampered = aggregated;
    tampered.operations[0].actions[0].eth_value = U256::from(1u64);
    assert!(!signer().verify(&tampered));
}

#[test]
fn reordering_one_array_breaks_verification() {
    let mut alice = wallet(3);
    let mut bob = wallet(4);
    let a = alice.sign_actions(shared_operation().actions, U256::from(100_000u64));
    bob.set_nonce(U256::from(9u64));
    let b = bob.sign_actions(shared_operation().actions, U256::from(100_000u64));

    let bundle = aggregate(&[a, b]).unwrap();
    assert!(signer().verify(&bundle));

    let mut keys_swapped = bundle.clone();
    keys_swapped.sender_public_keys.swap(0, 1);
    assert!(!signer().verify(&keys_swapped));

    let mut operations_swapped = bundle.clone();
    operations_swapped.operations.swap(0, 1);
    assert!(!signer().verify(&operations_swapped));

    let mut both_swapped = bundle;
    both_swapped.sender_public_keys.swap(0, 1);
    both_swapped.operations.swap(0, 1);
    assert!(signer().verify(&both_swapped));
}

#[test]
fn empty_bundles_verify_and_vanish_in_aggregation() {
    assert!(signer().verify(&Bundle::empty()));

    let signed = wallet(5).sign(&shared_operation());
    let out = aggregate(&[Bundle::empty(), signed.clone(), Bundle::empty()]).unwrap();
    assert_eq!(out, signed);
}

#[tokio::test]
async fn signed_bundle_survives_compression() {
    let ctx = empty_context();
    let utilities = ctx.addresses.aggregator_utilities;
    let key_registry = ctx.bls_public_key_registry.clone();
    let compressor = bundle_compressor(ctx).await;

    let mut alice = wallet(6);
    let mut bob = wallet(7);
    let mut carol = wallet(8);
    key_registry.register(alice.public_key()).await.unwrap();

    let token = Address::from_word(keccak256(b"token"));
    let transfer = ActionData {
        eth_value: U256::ZERO,
        contract_address: token,
        encoded_function: Bytes::from(
            Erc20Call::Transfer {
                to: bob.address(),
                amount: U256::from(25u64) * U256::from(10u64).pow(U256::from(17u64)),
            }
            .calldata(),
        ),
    };
    let registration = carol.registration_action(test_addresses().bls_public_key_registry);

    let bundle = aggregate(&[
        alice.sign_actions(
            vec![transfer, fee_payment_action(utilities, U256::from(10u64).pow(U256::from(14u64)))],
            U256::from(90_000u64),
        ),
        bob.sign_actions(shared_operation().actions, U256::from(30_000_000u64)),
        carol.sign_actions(vec![registration], U256::from(200_000u64)),
    ])
    .unwrap();
    assert!(signer().verify(&bundle));

    let bytes = compressor.compress(&bundle).await.unwrap();
    let restored = compressor.decompress(&bytes).await.unwrap();
    assert_eq!(restored, bundle);
    assert!(signer().verify(&restored));

    // expander indices: alice -> erc20 (2), bob -> fallback (0)
    assert_eq!(bytes[0], 3);
    assert_eq!(bytes[1], 2);
}

#[tokio::test]
async fn snapshot_registries_drive_compression() {
    let alice = wallet(9);
    let snapshot = RegistrySnapshot {
        bls_public_keys: vec![*alice.public_key()],
        addresses: vec![shared_operation().actions[0].contract_address],
        expanders: vec![test_addresses().fallback_expander],
    };
    let (keys, addresses, expanders) = snapshot.into_registries();
    let ctx = CompressorContext::new(keys, addresses, test_addresses());
    let compressor = BundleCompressor::with_default_compressors(expanders, ctx).await;
    // registration and erc20 expanders are absent from the snapshot
    assert!(compressor.is_err());

    let (keys, addresses, expanders) = RegistrySnapshot {
        bls_public_keys: vec![*alice.public_key()],
        addresses: vec![shared_operation().actions[0].contract_address],
        expanders: vec![test_addresses().fallback_expander],
    }
    .into_registries();
    let ctx = CompressorContext::new(keys, addresses, test_addresses());
    let mut compressor = BundleCompressor::new(expanders);
    compressor
        .add_compressor(Box::new(crate::FallbackCompressor::new(ctx)))
        .await
        .unwrap();

    let bundle = alice.sign(&shared_operation());
    let bytes = compressor.compress(&bundle).await.unwrap();
    // count, expander, flags, key index, nonce, gas (2), action count, value, target index,
    // calldata length, calldata, signature
    assert_eq!(bytes.len(), 1 + 1 + 1 + 3 + 1 + 2 + 1 + 1 + 3 + 1 + 1 + 64);
    assert_eq!(compressor.decompress(&bytes).await.unwrap(), bundle);
}
