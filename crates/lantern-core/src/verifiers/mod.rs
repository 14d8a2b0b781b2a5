//! Per-method proof state machines.
//!
//! Each verifier assembles the leaves its method claims, recomputes the
//! roots through the trie and Merkle machinery, and hands header
//! authentication to the consensus or OP-Stack path. Any mismatch along
//! the way rejects the whole proof.

pub mod account;
pub mod block;
pub mod call;
pub mod logs;
pub mod receipt;
pub mod transaction;
pub mod witness;

use crate::consensus::{resolve_committee, verify_header_signature, CommitteeStore};
use crate::error::Result;
use crate::ssz::{hash_tree_root, View};
use crate::ssz::schemas::TRANSACTION;
use crate::types::beacon::{BeaconBlockHeader, BlsSignature, SyncAggregate};
use crate::types::chain::ChainSpec;

/// The header and sync aggregate every L1 proof container carries.
pub(crate) struct HeaderContext {
    pub header: BeaconBlockHeader,
    pub aggregate: SyncAggregate,
}

/// Decode the `header` / `sync_committee_bits` / `sync_committee_signature`
/// trailer fields of an L1 proof container.
pub(crate) fn decode_header_context(proof: &View<'_>) -> Result<HeaderContext> {
    let header = decode_beacon_header(&proof.field("header")?)?;

    let bits_view = proof.field("sync_committee_bits")?;
    let mut bits = [0u8; 64];
    bits.copy_from_slice(bits_view.bytes);

    let signature_view = proof.field("sync_committee_signature")?;
    let mut signature = [0u8; 96];
    signature.copy_from_slice(signature_view.bytes);

    Ok(HeaderContext {
        header,
        aggregate: SyncAggregate {
            sync_committee_bits: bits,
            sync_committee_signature: BlsSignature(signature),
        },
    })
}

pub(crate) fn decode_beacon_header(view: &View<'_>) -> Result<BeaconBlockHeader> {
    Ok(BeaconBlockHeader {
        slot: view.field("slot")?.uint64()?,
        proposer_index: view.field("proposer_index")?.uint64()?,
        parent_root: view.field("parent_root")?.bytes32()?,
        state_root: view.field("state_root")?.bytes32()?,
        body_root: view.field("body_root")?.bytes32()?,
    })
}

/// Authenticate an L1 header: resolve the committee for its period from
/// the cache and verify the aggregate signature. A missing period is the
/// soft failure the host can repair with more sync data.
pub(crate) fn authenticate_header(
    spec: &ChainSpec,
    store: &dyn CommitteeStore,
    context: &HeaderContext,
) -> Result<()> {
    let period = spec.period_of_slot(context.header.slot);
    let keys = resolve_committee(store, period)?;
    verify_header_signature(spec, &context.header, &context.aggregate, &keys)
}

/// Collect the RLP node slices of a trie proof list.
pub(crate) fn collect_nodes<'a>(list: &View<'a>) -> Result<Vec<&'a [u8]>> {
    let mut nodes = Vec::with_capacity(list.len()?);
    for i in 0..list.len()? {
        nodes.push(list.at(i)?.bytes);
    }
    Ok(nodes)
}

/// Collect the 32-byte witness hashes of an SSZ Merkle proof.
pub(crate) fn collect_witnesses(list: &View<'_>) -> Result<Vec<[u8; 32]>> {
    let mut witnesses = Vec::with_capacity(list.len()?);
    for i in 0..list.len()? {
        witnesses.push(list.at(i)?.bytes32()?);
    }
    Ok(witnesses)
}

/// SSZ leaf for a u64 payload field inside the body multiproof.
pub(crate) fn uint64_leaf(value: u64) -> [u8; 32] {
    let mut leaf = [0u8; 32];
    leaf[..8].copy_from_slice(&value.to_le_bytes());
    leaf
}

/// Hash-tree-root of a raw transaction, as the payload's transaction list
/// commits to it.
pub(crate) fn transaction_root(raw_tx: &[u8]) -> Result<[u8; 32]> {
    hash_tree_root(View::new(&TRANSACTION, raw_tx)?)
}
