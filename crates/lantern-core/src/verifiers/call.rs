//! Call proofs: `eth_call`.
//!
//! The verifier re-executes nothing. It authenticates every account and
//! storage slot in the prover-supplied access set under a state root
//! covered by the signed header, checks any supplied contract code against
//! the verified code hashes, and validates the caller's state overrides.
//! The call result itself is passed through once its inputs are proven
//! consistent.

use alloy_primitives::U256;

use super::account::{state_root_of, walk_account, VerifiedAccount};
use super::{authenticate_header, collect_nodes, collect_witnesses, decode_header_context};
use crate::consensus::CommitteeStore;
use crate::error::{Result, VerifyError};
use crate::op::{verify_preconf, DecompressPolicy};
use crate::ssz::merkle::verify_single_proof;
use crate::ssz::schemas::STATE_ROOT_GINDEX;
use crate::ssz::View;
use crate::trie::keccak256;
use crate::types::chain::ChainSpec;
use crate::types::request::{parse_address, DataPayload};

fn unsupported(key: &str) -> VerifyError {
    VerifyError::UnsupportedOverride {
        reason: key.to_string(),
    }
}

/// Validate an `eth_call` state-override object.
///
/// Accepted per-account properties: `balance`, `code`, and exactly one of
/// `state` / `stateDiff`. Everything else, `nonce` included, is a hard
/// error naming the offending property.
pub(crate) fn validate_overrides(overrides: &serde_json::Value) -> Result<()> {
    let Some(accounts) = overrides.as_object() else {
        return Err(VerifyError::invalid("state overrides must be an object"));
    };
    for (address, entry) in accounts {
        parse_address(address)?;
        let Some(properties) = entry.as_object() else {
            return Err(VerifyError::invalid(format!(
                "override for {address} must be an object"
            )));
        };
        if properties.contains_key("state") && properties.contains_key("stateDiff") {
            return Err(unsupported("state and stateDiff are mutually exclusive"));
        }
        for (key, value) in properties {
            match key.as_str() {
                "balance" => {
                    let text = value
                        .as_str()
                        .ok_or_else(|| VerifyError::invalid("balance override must be hex"))?;
                    let stripped = text.strip_prefix("0x").ok_or_else(|| {
                        VerifyError::invalid("balance override must be 0x-prefixed")
                    })?;
                    if stripped.len() > 64 {
                        return Err(VerifyError::invalid("balance override exceeds 32 bytes"));
                    }
                    U256::from_str_radix(stripped, 16).map_err(|e| {
                        VerifyError::invalid(format!("invalid balance override: {e}"))
                    })?;
                }
                "code" => {
                    let text = value
                        .as_str()
                        .ok_or_else(|| VerifyError::invalid("code override must be hex"))?;
                    let stripped = text
                        .strip_prefix("0x")
                        .ok_or_else(|| VerifyError::invalid("code override must be 0x-prefixed"))?;
                    hex::decode(stripped)
                        .map_err(|e| VerifyError::invalid(format!("invalid code override: {e}")))?;
                }
                "state" | "stateDiff" => validate_storage_override(key, value)?,
                other => return Err(unsupported(other)),
            }
        }
    }
    Ok(())
}

fn validate_storage_override(key: &str, value: &serde_json::Value) -> Result<()> {
    let Some(slots) = value.as_object() else {
        return Err(VerifyError::invalid(format!("{key} override must be an object")));
    };
    for (slot, slot_value) in slots {
        for (what, text) in [("slot key", Some(slot.as_str())), ("slot value", slot_value.as_str())] {
            let text =
                text.ok_or_else(|| VerifyError::invalid(format!("{what} must be a string")))?;
            let stripped = text
                .strip_prefix("0x")
                .ok_or_else(|| VerifyError::invalid(format!("{what} must be 0x-prefixed")))?;
            let bytes = hex::decode(stripped)
                .map_err(|e| VerifyError::invalid(format!("invalid {what}: {e}")))?;
            if bytes.len() != 32 {
                return Err(VerifyError::invalid(format!(
                    "{what} must be exactly 32 bytes, got {}",
                    bytes.len()
                )));
            }
        }
    }
    Ok(())
}

/// Walk every account of an access set under one state root.
pub(crate) fn verify_account_set(
    accounts: &View<'_>,
    state_root: &[u8; 32],
) -> Result<Vec<VerifiedAccount>> {
    let mut verified = Vec::with_capacity(accounts.len()?);
    for i in 0..accounts.len()? {
        let entry = accounts.at(i)?;
        let address = entry.field("address")?.bytes20()?;
        let nodes = collect_nodes(&entry.field("account_proof")?)?;
        let storage_view = entry.field("storage_proofs")?;
        verified.push(walk_account(state_root, address, &nodes, &storage_view)?);
    }
    Ok(verified)
}

/// The state root an access set anchors to: the first account's first
/// proof node.
pub(crate) fn access_set_state_root(accounts: &View<'_>) -> Result<[u8; 32]> {
    if accounts.is_empty()? {
        return Err(VerifyError::invalid("call proof covers no accounts"));
    }
    let nodes = collect_nodes(&accounts.at(0)?.field("account_proof")?)?;
    state_root_of(&nodes)
}

/// Every supplied contract code must hash to a verified account's code
/// hash; otherwise the prover is smuggling bytecode the state never held.
pub(crate) fn check_codes(codes: &View<'_>, accounts: &[VerifiedAccount]) -> Result<()> {
    for i in 0..codes.len()? {
        let code = codes.at(i)?.bytes;
        let computed = keccak256(code);
        let known = accounts
            .iter()
            .any(|account| account.account.code_hash == computed);
        if !known {
            return Err(VerifyError::invalid(format!(
                "supplied code 0x{} does not match any verified account",
                hex::encode(&computed[..8])
            )));
        }
    }
    Ok(())
}

fn call_overrides(params: &[serde_json::Value]) -> Result<()> {
    if let Some(overrides) = params.get(2) {
        if !overrides.is_null() {
            validate_overrides(overrides)?;
        }
    }
    Ok(())
}

fn call_result(claimed: Option<&[u8]>) -> DataPayload {
    DataPayload::Bytes(claimed.map(|b| b.to_vec()).unwrap_or_default())
}

/// Verify an L1 call proof.
pub fn verify_eth(
    spec: &ChainSpec,
    store: &dyn CommitteeStore,
    proof: &View<'_>,
    params: &[serde_json::Value],
    claimed: Option<&[u8]>,
) -> Result<DataPayload> {
    call_overrides(params)?;

    let context = decode_header_context(proof)?;
    authenticate_header(spec, store, &context)?;

    let accounts_view = proof.field("accounts")?;
    let state_root = access_set_state_root(&accounts_view)?;
    let branch = collect_witnesses(&proof.field("state_proof")?)?;
    verify_single_proof(
        &branch,
        &state_root,
        STATE_ROOT_GINDEX,
        &context.header.body_root,
        "state root",
    )?;

    let verified = verify_account_set(&accounts_view, &state_root)?;
    check_codes(&proof.field("codes")?, &verified)?;
    Ok(call_result(claimed))
}

/// Verify an OP-Stack call proof against a sequencer-signed payload.
pub fn verify_op(
    chain_id: u64,
    policy: &DecompressPolicy,
    proof: &View<'_>,
    params: &[serde_json::Value],
    claimed: Option<&[u8]>,
) -> Result<DataPayload> {
    call_overrides(params)?;

    let block = proof.field("block")?;
    let preconf = verify_preconf(
        chain_id,
        block.field("payload")?.bytes,
        block.field("signature")?.bytes,
        policy,
    )?;
    let state_root = preconf.payload()?.field("state_root")?.bytes32()?;

    let accounts_view = proof.field("accounts")?;
    let anchored = access_set_state_root(&accounts_view)?;
    if anchored != state_root {
        return Err(VerifyError::root_mismatch(
            "state root",
            &anchored,
            &state_root,
        ));
    }

    let verified = verify_account_set(&accounts_view, &state_root)?;
    check_codes(&proof.field("codes")?, &verified)?;
    Ok(call_result(claimed))
}
