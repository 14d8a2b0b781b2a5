//! Block proofs: `eth_getBlockByNumber`, `eth_getBlockByHash`,
//! `eth_blockNumber`.
//!
//! On L1 the full execution payload (or just its number and hash) is
//! bound to the signed beacon header; on OP-Stack the payload itself is
//! the authenticated object.

use serde_json::json;

use super::{authenticate_header, collect_witnesses, decode_header_context, uint64_leaf};
use crate::consensus::CommitteeStore;
use crate::error::{Result, VerifyError};
use crate::op::{verify_preconf, DecompressPolicy};
use crate::ssz::merkle::{verify_multi_proof, verify_single_proof};
use crate::ssz::schemas::{
    BLOCK_HASH_GINDEX, BLOCK_NUMBER_GINDEX, EXECUTION_PAYLOAD, PAYLOAD_GINDEX,
};
use crate::ssz::{hash_tree_root, View};
use crate::trie::keccak256;
use crate::types::chain::ChainSpec;
use crate::types::request::{BlockSelector, DataPayload, RpcMethod};

fn block_selector(method: RpcMethod, params: &[serde_json::Value]) -> Result<BlockSelector> {
    match method {
        RpcMethod::BlockNumber => Ok(BlockSelector::Tag),
        RpcMethod::GetBlockByNumber | RpcMethod::GetBlockByHash => {
            let arg = params
                .first()
                .and_then(|v| v.as_str())
                .ok_or_else(|| VerifyError::invalid("missing block selector argument"))?;
            BlockSelector::parse(arg)
        }
        other => Err(VerifyError::invalid(format!(
            "{other:?} is not a block method"
        ))),
    }
}

fn check_selector(selector: BlockSelector, number: u64, hash: &[u8; 32]) -> Result<()> {
    if !selector.matches(number, hash) {
        return Err(VerifyError::invalid(format!(
            "proof covers block {number} (0x{}), request asked for a different block",
            hex::encode(hash)
        )));
    }
    Ok(())
}

/// Normalize an authenticated execution payload into a JSON-RPC block.
fn block_json(payload: &View<'_>) -> Result<serde_json::Value> {
    let transactions = payload.field("transactions")?;
    let mut tx_hashes = Vec::with_capacity(transactions.len()?);
    for i in 0..transactions.len()? {
        tx_hashes.push(format!(
            "0x{}",
            hex::encode(keccak256(transactions.at(i)?.bytes))
        ));
    }
    let base_fee = alloy_primitives::U256::from_be_bytes(payload.field("base_fee_per_gas")?.uint256_be()?);
    Ok(json!({
        "number": format!("0x{:x}", payload.field("block_number")?.uint64()?),
        "hash": format!("0x{}", hex::encode(payload.field("block_hash")?.bytes32()?)),
        "parentHash": format!("0x{}", hex::encode(payload.field("parent_hash")?.bytes32()?)),
        "miner": format!("0x{}", hex::encode(payload.field("fee_recipient")?.bytes20()?)),
        "stateRoot": format!("0x{}", hex::encode(payload.field("state_root")?.bytes32()?)),
        "receiptsRoot": format!("0x{}", hex::encode(payload.field("receipts_root")?.bytes32()?)),
        "logsBloom": format!("0x{}", hex::encode(payload.field("logs_bloom")?.bytes)),
        "mixHash": format!("0x{}", hex::encode(payload.field("prev_randao")?.bytes32()?)),
        "gasLimit": format!("0x{:x}", payload.field("gas_limit")?.uint64()?),
        "gasUsed": format!("0x{:x}", payload.field("gas_used")?.uint64()?),
        "timestamp": format!("0x{:x}", payload.field("timestamp")?.uint64()?),
        "extraData": format!("0x{}", hex::encode(payload.field("extra_data")?.bytes)),
        "baseFeePerGas": format!("0x{base_fee:x}"),
        "blobGasUsed": format!("0x{:x}", payload.field("blob_gas_used")?.uint64()?),
        "excessBlobGas": format!("0x{:x}", payload.field("excess_blob_gas")?.uint64()?),
        "transactions": tx_hashes,
    }))
}

/// Verify an L1 block proof carrying the full execution payload.
pub fn verify_eth(
    spec: &ChainSpec,
    store: &dyn CommitteeStore,
    proof: &View<'_>,
    method: RpcMethod,
    params: &[serde_json::Value],
) -> Result<DataPayload> {
    let selector = block_selector(method, params)?;

    let context = decode_header_context(proof)?;
    authenticate_header(spec, store, &context)?;

    let payload = View::new(&EXECUTION_PAYLOAD, proof.field("execution_payload")?.bytes)?;
    let payload_root = hash_tree_root(payload)?;
    let branch = collect_witnesses(&proof.field("proof")?)?;
    verify_single_proof(
        &branch,
        &payload_root,
        PAYLOAD_GINDEX,
        &context.header.body_root,
        "execution payload",
    )?;

    let number = payload.field("block_number")?.uint64()?;
    let hash = payload.field("block_hash")?.bytes32()?;
    check_selector(selector, number, &hash)?;

    Ok(DataPayload::Json(block_json(&payload)?))
}

/// Verify an L1 block-number proof: just the number and hash, bound to
/// the signed header.
pub fn verify_block_number_eth(
    spec: &ChainSpec,
    store: &dyn CommitteeStore,
    proof: &View<'_>,
) -> Result<DataPayload> {
    let context = decode_header_context(proof)?;
    authenticate_header(spec, store, &context)?;

    let number = proof.field("block_number")?.uint64()?;
    let hash = proof.field("block_hash")?.bytes32()?;
    let witnesses = collect_witnesses(&proof.field("proof")?)?;
    verify_multi_proof(
        &witnesses,
        &[
            (BLOCK_NUMBER_GINDEX, uint64_leaf(number)),
            (BLOCK_HASH_GINDEX, hash),
        ],
        &context.header.body_root,
        "block body",
    )?;

    Ok(DataPayload::uint(number))
}

/// Verify an OP-Stack block proof. Serves the block methods and
/// `eth_blockNumber`, which both read the authenticated payload.
pub fn verify_op(
    chain_id: u64,
    policy: &DecompressPolicy,
    proof: &View<'_>,
    method: RpcMethod,
    params: &[serde_json::Value],
) -> Result<DataPayload> {
    let selector = block_selector(method, params)?;

    let preconf = verify_preconf(
        chain_id,
        proof.field("payload")?.bytes,
        proof.field("signature")?.bytes,
        policy,
    )?;
    let payload = preconf.payload()?;

    let number = payload.field("block_number")?.uint64()?;
    let hash = payload.field("block_hash")?.bytes32()?;
    check_selector(selector, number, &hash)?;

    if method == RpcMethod::BlockNumber {
        return Ok(DataPayload::uint(number));
    }
    Ok(DataPayload::Json(block_json(&payload)?))
}
