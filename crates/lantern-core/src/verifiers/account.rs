//! Account-family proofs: `eth_getBalance`, `eth_getTransactionCount`,
//! `eth_getCode`, `eth_getStorageAt`, `eth_getProof`.
//!
//! The account leaf is reached via MPT on `keccak(address)` under the
//! execution state root; the state root itself is bound to the beacon
//! body root (L1) or read from an authenticated preconfirmation payload
//! (OP-Stack).

use serde_json::json;

use super::{authenticate_header, collect_nodes, decode_header_context};
use crate::consensus::CommitteeStore;
use crate::error::{Result, VerifyError};
use crate::op::{verify_preconf, DecompressPolicy};
use crate::ssz::merkle::verify_single_proof;
use crate::ssz::schemas::STATE_ROOT_GINDEX;
use crate::ssz::View;
use crate::trie::{self, keccak256, TrieValue};
use crate::types::execution::AccountState;
use crate::types::request::{parse_address, parse_word, DataPayload, RpcMethod};
use crate::types::chain::ChainSpec;

/// An account whose state and requested storage slots have been walked
/// under an authenticated state root.
pub(crate) struct VerifiedAccount {
    pub address: [u8; 20],
    pub account: AccountState,
    pub storage: Vec<([u8; 32], [u8; 32])>,
}

/// Decode an Ethereum account from its RLP leaf:
/// `RLP([nonce, balance, storageRoot, codeHash])`.
pub(crate) fn decode_account_rlp(leaf: &[u8]) -> Result<AccountState> {
    let items = trie::rlp::decode_exact(leaf)?.items()?;
    if items.len() != 4 {
        return Err(VerifyError::invalid(format!(
            "account leaf has {} items, expected 4",
            items.len()
        )));
    }
    let storage_root = match items[2].as_bytes()? {
        empty if empty.is_empty() => AccountState::EMPTY_STORAGE_ROOT,
        bytes if bytes.len() == 32 => bytes.try_into().expect("32 bytes"),
        other => {
            return Err(VerifyError::invalid(format!(
                "invalid storage root length {}",
                other.len()
            )))
        }
    };
    let code_hash = match items[3].as_bytes()? {
        empty if empty.is_empty() => AccountState::EMPTY_CODE_HASH,
        bytes if bytes.len() == 32 => bytes.try_into().expect("32 bytes"),
        other => {
            return Err(VerifyError::invalid(format!(
                "invalid code hash length {}",
                other.len()
            )))
        }
    };
    Ok(AccountState {
        nonce: items[0].as_u64()?,
        balance: items[1].as_u256_be()?,
        storage_root,
        code_hash,
    })
}

/// Decode a storage leaf: an RLP byte string, right-aligned to 32 bytes.
pub(crate) fn decode_storage_value(leaf: &[u8]) -> Result<[u8; 32]> {
    trie::rlp::decode_exact(leaf)?.as_u256_be()
}

/// Walk an account under `state_root` and every supplied storage slot
/// under the account's storage root.
pub(crate) fn walk_account(
    state_root: &[u8; 32],
    address: [u8; 20],
    account_nodes: &[&[u8]],
    storage_view: &View<'_>,
) -> Result<VerifiedAccount> {
    let key = keccak256(&address);
    let account = match trie::verify_proof(state_root, &key, account_nodes)? {
        TrieValue::Present(leaf) => decode_account_rlp(leaf)?,
        TrieValue::Absent => AccountState::empty(),
    };

    let mut storage = Vec::with_capacity(storage_view.len()?);
    for i in 0..storage_view.len()? {
        let entry = storage_view.at(i)?;
        let slot = entry.field("key")?.bytes32()?;
        let nodes = collect_nodes(&entry.field("proof")?)?;
        storage.push((slot, walk_storage_slot(&account, slot, &nodes)?));
    }

    Ok(VerifiedAccount {
        address,
        account,
        storage,
    })
}

fn walk_storage_slot(
    account: &AccountState,
    slot: [u8; 32],
    nodes: &[&[u8]],
) -> Result<[u8; 32]> {
    if nodes.is_empty() {
        // Only the empty trie needs no proof; everything else must walk
        if account.storage_root == AccountState::EMPTY_STORAGE_ROOT {
            return Ok([0u8; 32]);
        }
        return Err(VerifyError::invalid("empty storage proof"));
    }
    let key = keccak256(&slot);
    match trie::verify_proof(&account.storage_root, &key, nodes)? {
        TrieValue::Present(leaf) => decode_storage_value(leaf),
        TrieValue::Absent => Ok([0u8; 32]),
    }
}

/// The state root a trie proof is anchored to is the hash of its first
/// node; the surrounding Merkle proof then binds that root upward.
pub(crate) fn state_root_of(nodes: &[&[u8]]) -> Result<[u8; 32]> {
    let first = nodes
        .first()
        .ok_or_else(|| VerifyError::invalid("empty account proof"))?;
    Ok(keccak256(first))
}

/// Select the result the method asks for from a verified account.
fn account_result(
    method: RpcMethod,
    verified: &VerifiedAccount,
    requested_slot: Option<[u8; 32]>,
    claimed_code: Option<&[u8]>,
    proof_nodes: &[&[u8]],
    storage_view: &View<'_>,
) -> Result<DataPayload> {
    match method {
        RpcMethod::GetBalance => Ok(DataPayload::Uint256(verified.account.balance)),
        RpcMethod::GetTransactionCount => Ok(DataPayload::uint(verified.account.nonce)),
        RpcMethod::GetCode => {
            let code = claimed_code.unwrap_or(&[]);
            let computed = keccak256(code);
            if verified.account.code_hash == AccountState::EMPTY_CODE_HASH {
                if !code.is_empty() {
                    return Err(VerifyError::invalid(
                        "code supplied for account without code",
                    ));
                }
                return Ok(DataPayload::Bytes(Vec::new()));
            }
            if computed != verified.account.code_hash {
                return Err(VerifyError::root_mismatch(
                    "code hash",
                    &computed,
                    &verified.account.code_hash,
                ));
            }
            Ok(DataPayload::Bytes(code.to_vec()))
        }
        RpcMethod::GetStorageAt => {
            let slot = requested_slot
                .ok_or_else(|| VerifyError::invalid("missing storage slot argument"))?;
            let value = verified
                .storage
                .iter()
                .find(|(key, _)| *key == slot)
                .map(|(_, value)| *value)
                .ok_or_else(|| {
                    VerifyError::invalid(format!(
                        "proof has no entry for storage slot 0x{}",
                        hex::encode(slot)
                    ))
                })?;
            Ok(DataPayload::Bytes32(value))
        }
        RpcMethod::GetProof => {
            let mut storage_entries = Vec::new();
            for (i, (key, value)) in verified.storage.iter().enumerate() {
                let nodes = collect_nodes(&storage_view.at(i)?.field("proof")?)?;
                storage_entries.push(json!({
                    "key": format!("0x{}", hex::encode(key)),
                    "value": format!("0x{}", hex::encode(value)),
                    "proof": hex_nodes(&nodes),
                }));
            }
            Ok(DataPayload::Json(json!({
                "address": format!("0x{}", hex::encode(verified.address)),
                "balance": format!("0x{}", verified.account.balance_hex()),
                "nonce": format!("0x{:x}", verified.account.nonce),
                "codeHash": format!("0x{}", hex::encode(verified.account.code_hash)),
                "storageHash": format!("0x{}", hex::encode(verified.account.storage_root)),
                "accountProof": hex_nodes(proof_nodes),
                "storageProof": storage_entries,
            })))
        }
        other => Err(VerifyError::invalid(format!(
            "{other:?} is not an account method"
        ))),
    }
}

fn hex_nodes(nodes: &[&[u8]]) -> Vec<String> {
    nodes
        .iter()
        .map(|node| format!("0x{}", hex::encode(node)))
        .collect()
}

/// Extract the address argument and optional storage slot from the
/// JSON-RPC params of an account-family method.
fn account_args(
    method: RpcMethod,
    params: &[serde_json::Value],
) -> Result<([u8; 20], Option<[u8; 32]>)> {
    let address_arg = params
        .first()
        .and_then(|v| v.as_str())
        .ok_or_else(|| VerifyError::invalid("missing address argument"))?;
    let address = parse_address(address_arg)?;

    let slot = if method == RpcMethod::GetStorageAt {
        let slot_arg = params
            .get(1)
            .and_then(|v| v.as_str())
            .ok_or_else(|| VerifyError::invalid("missing storage slot argument"))?;
        Some(parse_word(slot_arg)?)
    } else {
        None
    };
    Ok((address, slot))
}

fn check_address(proof_address: [u8; 20], requested: [u8; 20]) -> Result<()> {
    if proof_address != requested {
        return Err(VerifyError::AddressMismatch {
            proof_address: format!("0x{}", hex::encode(proof_address)),
            requested: format!("0x{}", hex::encode(requested)),
        });
    }
    Ok(())
}

/// Verify an L1 account proof.
pub fn verify_eth(
    spec: &ChainSpec,
    store: &dyn CommitteeStore,
    proof: &View<'_>,
    method: RpcMethod,
    params: &[serde_json::Value],
    claimed_code: Option<&[u8]>,
) -> Result<DataPayload> {
    let (requested, slot) = account_args(method, params)?;
    let proof_address = proof.field("address")?.bytes20()?;
    check_address(proof_address, requested)?;

    let context = decode_header_context(proof)?;
    authenticate_header(spec, store, &context)?;

    let account_nodes = collect_nodes(&proof.field("account_proof")?)?;
    let state_root = state_root_of(&account_nodes)?;

    // Bind the state root into the signed header's body root
    let branch = super::collect_witnesses(&proof.field("state_proof")?)?;
    verify_single_proof(
        &branch,
        &state_root,
        STATE_ROOT_GINDEX,
        &context.header.body_root,
        "state root",
    )?;

    let storage_view = proof.field("storage_proofs")?;
    let verified = walk_account(&state_root, proof_address, &account_nodes, &storage_view)?;
    account_result(
        method,
        &verified,
        slot,
        claimed_code,
        &account_nodes,
        &storage_view,
    )
}

/// Verify an OP-Stack account proof against a sequencer-signed payload.
pub fn verify_op(
    chain_id: u64,
    policy: &DecompressPolicy,
    proof: &View<'_>,
    method: RpcMethod,
    params: &[serde_json::Value],
    claimed_code: Option<&[u8]>,
) -> Result<DataPayload> {
    let (requested, slot) = account_args(method, params)?;
    let proof_address = proof.field("address")?.bytes20()?;
    check_address(proof_address, requested)?;

    let block = proof.field("block")?;
    let preconf = verify_preconf(
        chain_id,
        block.field("payload")?.bytes,
        block.field("signature")?.bytes,
        policy,
    )?;
    let payload = preconf.payload()?;
    let state_root = payload.field("state_root")?.bytes32()?;

    let account_nodes = collect_nodes(&proof.field("account_proof")?)?;
    let anchored = state_root_of(&account_nodes)?;
    if anchored != state_root {
        return Err(VerifyError::root_mismatch(
            "state root",
            &anchored,
            &state_root,
        ));
    }

    let storage_view = proof.field("storage_proofs")?;
    let verified = walk_account(&state_root, proof_address, &account_nodes, &storage_view)?;
    account_result(
        method,
        &verified,
        slot,
        claimed_code,
        &account_nodes,
        &storage_view,
    )
}
