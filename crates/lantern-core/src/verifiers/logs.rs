//! Logs proofs: `eth_getLogs`.
//!
//! The claimed result is a JSON array of logs. Every claimed log must be
//! re-derivable byte-for-byte from an authenticated receipt at its
//! `(blockNumber, transactionIndex)` coordinate; a claimed log with no
//! authenticated source rejects the whole response.

use std::collections::HashMap;

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
use crate::trie::keccak256;
use crate::types::chain::ChainSpec;
use crate::types::execution::TransactionReceipt;
use crate::types::request::{parse_address, parse_word, DataPayload};
use crate::verifiers::receipt::walk_receipt;

/// One transaction's worth of authenticated logs.
struct AuthenticatedTx {
    receipt: TransactionReceipt,
    tx_hash: [u8; 32],
    block_hash: [u8; 32],
}

/// A log entry as claimed by the RPC response.
struct ClaimedLog {
    address: [u8; 20],
    topics: Vec<[u8; 32]>,
    data: Vec<u8>,
    block_number: u64,
    tx_index: u64,
    block_hash: Option<[u8; 32]>,
    tx_hash: Option<[u8; 32]>,
}

fn parse_quantity(value: &serde_json::Value, what: &str) -> Result<u64> {
    let text = value
        .as_str()
        .ok_or_else(|| VerifyError::invalid(format!("{what} must be a hex quantity")))?;
    let stripped = text
        .strip_prefix("0x")
        .ok_or_else(|| VerifyError::invalid(format!("{what} must be 0x-prefixed")))?;
    u64::from_str_radix(stripped, 16)
        .map_err(|e| VerifyError::invalid(format!("invalid {what}: {e}")))
}

fn parse_claimed_logs(data: &[u8]) -> Result<Vec<ClaimedLog>> {
    let entries: Vec<serde_json::Value> = serde_json::from_slice(data)
        .map_err(|e| VerifyError::invalid(format!("claimed logs are not valid JSON: {e}")))?;
    let mut logs = Vec::with_capacity(entries.len());
    for entry in &entries {
        let address = parse_address(
            entry["address"]
                .as_str()
                .ok_or_else(|| VerifyError::invalid("claimed log missing address"))?,
        )?;
        let mut topics = Vec::new();
        for topic in entry["topics"]
            .as_array()
            .ok_or_else(|| VerifyError::invalid("claimed log missing topics"))?
        {
            let text = topic
                .as_str()
                .ok_or_else(|| VerifyError::invalid("log topic must be a string"))?;
            topics.push(parse_word(text)?);
        }
        let data_hex = entry["data"]
            .as_str()
            .ok_or_else(|| VerifyError::invalid("claimed log missing data"))?;
        let data = hex::decode(data_hex.strip_prefix("0x").unwrap_or(data_hex))
            .map_err(|e| VerifyError::invalid(format!("invalid log data: {e}")))?;

        let block_hash = match entry.get("blockHash").and_then(|v| v.as_str()) {
            Some(text) => Some(parse_word(text)?),
            None => None,
        };
        let tx_hash = match entry.get("transactionHash").and_then(|v| v.as_str()) {
            Some(text) => Some(parse_word(text)?),
            None => None,
        };

        logs.push(ClaimedLog {
            address,
            topics,
            data,
            block_number: parse_quantity(&entry["blockNumber"], "blockNumber")?,
            tx_index: parse_quantity(&entry["transactionIndex"], "transactionIndex")?,
            block_hash,
            tx_hash,
        });
    }
    Ok(logs)
}

/// Authenticate one block's receipts and add them to the coordinate map.
fn collect_block_txs(
    txs: &View<'_>,
    receipts_root: &[u8; 32],
    block_number: u64,
    block_hash: [u8; 32],
    payload_txs: Option<&View<'_>>,
    authenticated: &mut HashMap<(u64, u64), AuthenticatedTx>,
) -> Result<()> {
    for i in 0..txs.len()? {
        let tx_entry = txs.at(i)?;
        let tx_index = tx_entry.field("transaction_index")?.uint64()?;
        let nodes = collect_nodes(&tx_entry.field("proof")?)?;
        let receipt = walk_receipt(receipts_root, tx_index, &nodes)?;

        let supplied_tx = tx_entry.field("transaction")?.bytes;
        let raw_tx = match payload_txs {
            // OP-Stack: the payload itself carries the transaction list
            Some(list) => {
                if tx_index as usize >= list.len()? {
                    return Err(VerifyError::invalid(format!(
                        "transaction index {tx_index} out of range"
                    )));
                }
                let from_payload = list.at(tx_index as usize)?.bytes;
                if !supplied_tx.is_empty() && supplied_tx != from_payload {
                    return Err(VerifyError::invalid(
                        "supplied transaction differs from payload transaction",
                    ));
                }
                from_payload
            }
            None => supplied_tx,
        };

        authenticated.insert(
            (block_number, tx_index),
            AuthenticatedTx {
                receipt,
                tx_hash: keccak256(raw_tx),
                block_hash,
            },
        );
    }
    Ok(())
}

/// Check every claimed log against the authenticated receipts.
fn match_claimed_logs(
    claimed: &[ClaimedLog],
    authenticated: &HashMap<(u64, u64), AuthenticatedTx>,
) -> Result<()> {
    for log in claimed {
        let source = authenticated
            .get(&(log.block_number, log.tx_index))
            .ok_or_else(|| {
                VerifyError::invalid(format!(
                    "missing log proof for block {} transaction {}",
                    log.block_number, log.tx_index
                ))
            })?;

        let derivable = source.receipt.logs.iter().any(|candidate| {
            candidate.address == log.address
                && candidate.topics == log.topics
                && candidate.data == log.data
        });
        if !derivable {
            return Err(VerifyError::invalid(format!(
                "claimed log for block {} transaction {} does not match any receipt log",
                log.block_number, log.tx_index
            )));
        }
        if let Some(block_hash) = log.block_hash {
            if block_hash != source.block_hash {
                return Err(VerifyError::root_mismatch(
                    "log block hash",
                    &source.block_hash,
                    &block_hash,
                ));
            }
        }
        if let Some(tx_hash) = log.tx_hash {
            if tx_hash != source.tx_hash {
                return Err(VerifyError::root_mismatch(
                    "log transaction hash",
                    &source.tx_hash,
                    &tx_hash,
                ));
            }
        }
    }
    Ok(())
}

/// The receipts root every tx proof of a block anchors to: the hash of
/// the first tx proof's first node.
fn block_receipts_root(txs: &View<'_>) -> Result<[u8; 32]> {
    if txs.is_empty()? {
        return Err(VerifyError::invalid("logs block proof without transactions"));
    }
    let nodes = txs.at(0)?.field("proof")?;
    let first = nodes.at(0)?;
    Ok(keccak256(first.bytes))
}

/// Verify an L1 logs proof.
pub fn verify_eth(
    spec: &ChainSpec,
    store: &dyn CommitteeStore,
    proof: &View<'_>,
    claimed_data: Option<&[u8]>,
) -> Result<DataPayload> {
    let data = claimed_data
        .ok_or_else(|| VerifyError::invalid("logs verification requires the claimed result"))?;
    let claimed = parse_claimed_logs(data)?;

    let mut authenticated = HashMap::new();
    let blocks = proof.field("blocks")?;
    for i in 0..blocks.len()? {
        let block = blocks.at(i)?;
        let context = decode_header_context(&block)?;
        authenticate_header(spec, store, &context)?;

        let block_number = block.field("block_number")?.uint64()?;
        let block_hash = block.field("block_hash")?.bytes32()?;
        let txs = block.field("txs")?;
        let receipts_root = block_receipts_root(&txs)?;

        // One multiproof binds the block coordinates, the receipts root
        // and every supplied transaction to the signed header.
        let mut leaves = vec![
            (BLOCK_NUMBER_GINDEX, uint64_leaf(block_number)),
            (BLOCK_HASH_GINDEX, block_hash),
            (RECEIPTS_ROOT_GINDEX, receipts_root),
        ];
        for t in 0..txs.len()? {
            let tx_entry = txs.at(t)?;
            let tx_index = tx_entry.field("transaction_index")?.uint64()?;
            let raw_tx = tx_entry.field("transaction")?.bytes;
            leaves.push((gindex_of_transaction(tx_index), transaction_root(raw_tx)?));
        }
        let witnesses = collect_witnesses(&block.field("proof")?)?;
        verify_multi_proof(&witnesses, &leaves, &context.header.body_root, "block body")?;

        collect_block_txs(
            &txs,
            &receipts_root,
            block_number,
            block_hash,
            None,
            &mut authenticated,
        )?;
    }

    match_claimed_logs(&claimed, &authenticated)?;
    let value: serde_json::Value = serde_json::from_slice(data)
        .map_err(|e| VerifyError::invalid(format!("claimed logs are not valid JSON: {e}")))?;
    Ok(DataPayload::Json(value))
}

/// Verify an OP-Stack logs proof against sequencer-signed payloads.
pub fn verify_op(
    chain_id: u64,
    policy: &DecompressPolicy,
    proof: &View<'_>,
    claimed_data: Option<&[u8]>,
) -> Result<DataPayload> {
    let data = claimed_data
        .ok_or_else(|| VerifyError::invalid("logs verification requires the claimed result"))?;
    let claimed = parse_claimed_logs(data)?;

    let mut authenticated = HashMap::new();
    let blocks = proof.field("blocks")?;
    for i in 0..blocks.len()? {
        let entry = blocks.at(i)?;
        let block = entry.field("block")?;
        let preconf = verify_preconf(
            chain_id,
            block.field("payload")?.bytes,
            block.field("signature")?.bytes,
            policy,
        )?;
        let payload = preconf.payload()?;

        let block_number = payload.field("block_number")?.uint64()?;
        let block_hash = payload.field("block_hash")?.bytes32()?;
        let receipts_root = payload.field("receipts_root")?.bytes32()?;
        let payload_txs = payload.field("transactions")?;

        collect_block_txs(
            &entry.field("txs")?,
            &receipts_root,
            block_number,
            block_hash,
            Some(&payload_txs),
            &mut authenticated,
        )?;
    }

    match_claimed_logs(&claimed, &authenticated)?;
    let value: serde_json::Value = serde_json::from_slice(data)
        .map_err(|e| VerifyError::invalid(format!("claimed logs are not valid JSON: {e}")))?;
    Ok(DataPayload::Json(value))
}
