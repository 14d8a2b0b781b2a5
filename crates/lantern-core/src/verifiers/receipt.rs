//! Receipt proofs: `eth_getTransactionReceipt`.
//!
//! The receipt leaf is reached via MPT on `RLP(tx_index)` under the
//! receipts root. On L1 the receipts root is bound to the signed beacon
//! header together with the block number, block hash and the raw
//! transaction; on OP-Stack it comes from the authenticated
//! preconfirmation payload.

use serde_json::json;

use super::{
    authenticate_header, collect_nodes, collect_witnesses, decode_header_context,
    transaction_root, uint64_leaf,
};
use crate::consensus::CommitteeStore;
use crate::error::{Result, VerifyError};
use crate::op::{verify_preconf, DecompressPolicy};
use crate::ssz::merkle::verify_multi_proof;
use crate::ssz::schemas::{
    gindex_of_transaction, BLOCK_HASH_GINDEX, BLOCK_NUMBER_GINDEX, RECEIPTS_ROOT_GINDEX,
};
use crate::ssz::View;
use crate::trie::{self, keccak256, rlp::Rlp};
use crate::types::chain::ChainSpec;
use crate::types::execution::{Log, TransactionReceipt, TxEnvelope};
use crate::types::request::{parse_word, DataPayload};

/// Decode a receipt trie leaf, stripping the EIP-2718 envelope byte.
/// The body is `RLP([status, cumulativeGasUsed, logsBloom, logs])`.
pub(crate) fn decode_receipt(leaf: &[u8]) -> Result<TransactionReceipt> {
    let (envelope, offset) = TxEnvelope::classify(leaf)
        .ok_or_else(|| VerifyError::invalid("unrecognized receipt envelope"))?;
    let items = trie::rlp::decode_exact(&leaf[offset..])?.items()?;
    if items.len() != 4 {
        return Err(VerifyError::invalid(format!(
            "receipt body has {} items, expected 4",
            items.len()
        )));
    }

    let status_bytes = items[0].as_bytes()?;
    if status_bytes.len() > 1 {
        return Err(VerifyError::invalid("pre-Byzantium receipt root in leaf"));
    }
    let status = status_bytes.first().copied().unwrap_or(0);

    let bloom_bytes = items[2].as_bytes()?;
    if bloom_bytes.len() != 256 {
        return Err(VerifyError::invalid(format!(
            "logs bloom has {} bytes, expected 256",
            bloom_bytes.len()
        )));
    }
    let mut logs_bloom = [0u8; 256];
    logs_bloom.copy_from_slice(bloom_bytes);

    Ok(TransactionReceipt {
        envelope,
        status,
        cumulative_gas_used: items[1].as_u64()?,
        logs_bloom,
        logs: decode_logs(&items[3])?,
    })
}

fn decode_logs(item: &Rlp<'_>) -> Result<Vec<Log>> {
    let mut logs = Vec::new();
    for entry in item.items()? {
        let fields = entry.items()?;
        if fields.len() != 3 {
            return Err(VerifyError::invalid(format!(
                "log entry has {} fields, expected 3",
                fields.len()
            )));
        }
        let address_bytes = fields[0].as_bytes()?;
        if address_bytes.len() != 20 {
            return Err(VerifyError::invalid("log address must be 20 bytes"));
        }
        let mut address = [0u8; 20];
        address.copy_from_slice(address_bytes);

        let mut topics = Vec::new();
        for topic in fields[1].items()? {
            let bytes = topic.as_bytes()?;
            if bytes.len() != 32 {
                return Err(VerifyError::invalid("log topic must be 32 bytes"));
            }
            topics.push(bytes.try_into().expect("32 bytes"));
        }

        logs.push(Log {
            address,
            topics,
            data: fields[2].as_bytes()?.to_vec(),
        });
    }
    Ok(logs)
}

/// Walk a receipt trie proof for one transaction index and return the
/// decoded receipt along with the trie root the proof is anchored to.
pub(crate) fn walk_receipt(
    receipts_root: &[u8; 32],
    tx_index: u64,
    nodes: &[&[u8]],
) -> Result<TransactionReceipt> {
    let key = trie::rlp::encode_uint(tx_index);
    let leaf = trie::verify_proof(receipts_root, &key, nodes)?
        .required(&format!("receipt for transaction {tx_index}"))?;
    decode_receipt(leaf)
}

pub(crate) fn receipt_json(
    receipt: &TransactionReceipt,
    tx_hash: &[u8; 32],
    tx_index: u64,
    block_number: u64,
    block_hash: &[u8; 32],
) -> serde_json::Value {
    let logs: Vec<_> = receipt
        .logs
        .iter()
        .map(|log| {
            json!({
                "address": format!("0x{}", hex::encode(log.address)),
                "topics": log
                    .topics
                    .iter()
                    .map(|t| format!("0x{}", hex::encode(t)))
                    .collect::<Vec<_>>(),
                "data": format!("0x{}", hex::encode(&log.data)),
                "blockNumber": format!("0x{block_number:x}"),
                "blockHash": format!("0x{}", hex::encode(block_hash)),
                "transactionHash": format!("0x{}", hex::encode(tx_hash)),
                "transactionIndex": format!("0x{tx_index:x}"),
            })
        })
        .collect();
    json!({
        "transactionHash": format!("0x{}", hex::encode(tx_hash)),
        "transactionIndex": format!("0x{tx_index:x}"),
        "blockNumber": format!("0x{block_number:x}"),
        "blockHash": format!("0x{}", hex::encode(block_hash)),
        "status": format!("0x{:x}", receipt.status),
        "cumulativeGasUsed": format!("0x{:x}", receipt.cumulative_gas_used),
        "logsBloom": format!("0x{}", hex::encode(receipt.logs_bloom)),
        "logs": logs,
    })
}

fn requested_tx_hash(params: &[serde_json::Value]) -> Result<[u8; 32]> {
    let arg = params
        .first()
        .and_then(|v| v.as_str())
        .ok_or_else(|| VerifyError::invalid("missing transaction hash argument"))?;
    parse_word(arg)
}

/// Verify an L1 receipt proof.
pub fn verify_eth(
    spec: &ChainSpec,
    store: &dyn CommitteeStore,
    proof: &View<'_>,
    params: &[serde_json::Value],
) -> Result<DataPayload> {
    let requested = requested_tx_hash(params)?;

    let context = decode_header_context(proof)?;
    authenticate_header(spec, store, &context)?;

    let raw_tx = proof.field("transaction")?.bytes;
    let tx_hash = keccak256(raw_tx);
    if tx_hash != requested {
        return Err(VerifyError::root_mismatch(
            "transaction hash",
            &tx_hash,
            &requested,
        ));
    }

    let tx_index = proof.field("transaction_index")?.uint64()?;
    let block_number = proof.field("block_number")?.uint64()?;
    let block_hash = proof.field("block_hash")?.bytes32()?;

    let receipt_nodes = collect_nodes(&proof.field("receipt_proof")?)?;
    let receipts_root = keccak256(
        receipt_nodes
            .first()
            .ok_or_else(|| VerifyError::invalid("empty receipt proof"))?,
    );

    // Bind every claimed value to the signed header's body root. The
    // expected body root is always computed from the proof, never assumed.
    let witnesses = collect_witnesses(&proof.field("block_proof")?)?;
    verify_multi_proof(
        &witnesses,
        &[
            (BLOCK_NUMBER_GINDEX, uint64_leaf(block_number)),
            (BLOCK_HASH_GINDEX, block_hash),
            (RECEIPTS_ROOT_GINDEX, receipts_root),
            (gindex_of_transaction(tx_index), transaction_root(raw_tx)?),
        ],
        &context.header.body_root,
        "block body",
    )?;

    let receipt = walk_receipt(&receipts_root, tx_index, &receipt_nodes)?;
    check_envelope(raw_tx, &receipt)?;

    Ok(DataPayload::Json(receipt_json(
        &receipt,
        &tx_hash,
        tx_index,
        block_number,
        &block_hash,
    )))
}

/// Verify an OP-Stack receipt proof against a sequencer-signed payload.
pub fn verify_op(
    chain_id: u64,
    policy: &DecompressPolicy,
    proof: &View<'_>,
    params: &[serde_json::Value],
) -> Result<DataPayload> {
    let requested = requested_tx_hash(params)?;

    let block = proof.field("block")?;
    let preconf = verify_preconf(
        chain_id,
        block.field("payload")?.bytes,
        block.field("signature")?.bytes,
        policy,
    )?;
    let payload = preconf.payload()?;

    let tx_index = proof.field("transaction_index")?.uint64()?;
    let transactions = payload.field("transactions")?;
    if tx_index as usize >= transactions.len()? {
        return Err(VerifyError::invalid(format!(
            "transaction index {tx_index} out of range, payload has {}",
            transactions.len()?
        )));
    }
    let raw_tx = transactions.at(tx_index as usize)?.bytes;
    let tx_hash = keccak256(raw_tx);
    if tx_hash != requested {
        return Err(VerifyError::root_mismatch(
            "transaction hash",
            &tx_hash,
            &requested,
        ));
    }

    let receipts_root = payload.field("receipts_root")?.bytes32()?;
    let receipt_nodes = collect_nodes(&proof.field("receipt_proof")?)?;
    let receipt = walk_receipt(&receipts_root, tx_index, &receipt_nodes)?;
    check_envelope(raw_tx, &receipt)?;

    let block_number = payload.field("block_number")?.uint64()?;
    let block_hash = payload.field("block_hash")?.bytes32()?;
    Ok(DataPayload::Json(receipt_json(
        &receipt,
        &tx_hash,
        tx_index,
        block_number,
        &block_hash,
    )))
}

/// A receipt's envelope byte must agree with its transaction's.
fn check_envelope(raw_tx: &[u8], receipt: &TransactionReceipt) -> Result<()> {
    let (tx_envelope, _) = TxEnvelope::classify(raw_tx)
        .ok_or_else(|| VerifyError::invalid("unrecognized transaction envelope"))?;
    if tx_envelope != receipt.envelope {
        return Err(VerifyError::invalid(format!(
            "receipt envelope {:?} does not match transaction envelope {:?}",
            receipt.envelope, tx_envelope
        )));
    }
    Ok(())
}
