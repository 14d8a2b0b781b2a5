//! Transaction proofs: `eth_getTransactionByHash`.
//!
//! On L1 the raw transaction is bound into the signed beacon header via
//! the payload's transaction list; on OP-Stack it is read directly from
//! the authenticated preconfirmation payload.

use serde_json::json;

use super::{
    authenticate_header, collect_witnesses, decode_header_context, transaction_root, uint64_leaf,
};
use crate::consensus::CommitteeStore;
use crate::error::{Result, VerifyError};
use crate::op::{verify_preconf, DecompressPolicy};
use crate::ssz::merkle::verify_multi_proof;
use crate::ssz::schemas::{gindex_of_transaction, BLOCK_HASH_GINDEX, BLOCK_NUMBER_GINDEX};
use crate::ssz::View;
use crate::trie::keccak256;
use crate::types::chain::ChainSpec;
use crate::types::execution::TxEnvelope;
use crate::types::request::{parse_word, DataPayload};

fn transaction_json(
    raw_tx: &[u8],
    tx_hash: &[u8; 32],
    tx_index: u64,
    block_number: u64,
    block_hash: &[u8; 32],
) -> Result<serde_json::Value> {
    let (envelope, _) = TxEnvelope::classify(raw_tx)
        .ok_or_else(|| VerifyError::invalid("unrecognized transaction envelope"))?;
    Ok(json!({
        "hash": format!("0x{}", hex::encode(tx_hash)),
        "transactionIndex": format!("0x{tx_index:x}"),
        "blockNumber": format!("0x{block_number:x}"),
        "blockHash": format!("0x{}", hex::encode(block_hash)),
        "type": envelope,
        "raw": format!("0x{}", hex::encode(raw_tx)),
    }))
}

fn requested_tx_hash(params: &[serde_json::Value]) -> Result<[u8; 32]> {
    let arg = params
        .first()
        .and_then(|v| v.as_str())
        .ok_or_else(|| VerifyError::invalid("missing transaction hash argument"))?;
    parse_word(arg)
}

/// Verify an L1 transaction proof.
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

    let witnesses = collect_witnesses(&proof.field("proof")?)?;
    verify_multi_proof(
        &witnesses,
        &[
            (BLOCK_NUMBER_GINDEX, uint64_leaf(block_number)),
            (BLOCK_HASH_GINDEX, block_hash),
            (gindex_of_transaction(tx_index), transaction_root(raw_tx)?),
        ],
        &context.header.body_root,
        "block body",
    )?;

    Ok(DataPayload::Json(transaction_json(
        raw_tx,
        &tx_hash,
        tx_index,
        block_number,
        &block_hash,
    )?))
}

/// Verify an OP-Stack transaction proof against a sequencer-signed payload.
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

    let block_number = payload.field("block_number")?.uint64()?;
    let block_hash = payload.field("block_hash")?.bytes32()?;
    Ok(DataPayload::Json(transaction_json(
        raw_tx,
        &tx_hash,
        tx_index,
        block_number,
        &block_hash,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_json_shape() {
        let raw_tx = [0x02u8, 0xc0];
        let tx_hash = keccak256(&raw_tx);
        let value = transaction_json(&raw_tx, &tx_hash, 3, 100, &[0xaa; 32]).unwrap();
        assert_eq!(value["transactionIndex"], "0x3");
        assert_eq!(value["blockNumber"], "0x64");
        assert_eq!(value["type"], "eip1559");
        assert_eq!(value["raw"], "0x02c0");
    }

    #[test]
    fn test_requested_hash_parsing() {
        assert!(requested_tx_hash(&[]).is_err());
        let params = vec![serde_json::json!(format!("0x{}", hex::encode([0x9au8; 32])))];
        assert_eq!(requested_tx_hash(&params).unwrap(), [0x9a; 32]);
    }
}
