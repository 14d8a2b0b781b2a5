//! Witness proofs: `eth_getWitness`.
//!
//! A witness is an authenticated snapshot of the accounts and storage
//! slots some computation touched: the same access-set machinery as
//! `eth_call`, but the result is the verified state itself rather than a
//! pass-through call result.

use serde_json::json;

use super::call::{access_set_state_root, check_codes, verify_account_set};
use super::{authenticate_header, collect_witnesses, decode_header_context};
use crate::consensus::CommitteeStore;
use crate::error::Result;
use crate::ssz::merkle::verify_single_proof;
use crate::ssz::schemas::STATE_ROOT_GINDEX;
use crate::ssz::View;
use crate::types::chain::ChainSpec;
use crate::types::request::DataPayload;
use crate::verifiers::account::VerifiedAccount;

fn witness_json(accounts: &[VerifiedAccount]) -> serde_json::Value {
    let entries: Vec<_> = accounts
        .iter()
        .map(|verified| {
            let storage: Vec<_> = verified
                .storage
                .iter()
                .map(|(key, value)| {
                    json!({
                        "key": format!("0x{}", hex::encode(key)),
                        "value": format!("0x{}", hex::encode(value)),
                    })
                })
                .collect();
            json!({
                "address": format!("0x{}", hex::encode(verified.address)),
                "balance": format!("0x{}", verified.account.balance_hex()),
                "nonce": format!("0x{:x}", verified.account.nonce),
                "codeHash": format!("0x{}", hex::encode(verified.account.code_hash)),
                "storageHash": format!("0x{}", hex::encode(verified.account.storage_root)),
                "storage": storage,
            })
        })
        .collect();
    json!({ "accounts": entries })
}

/// Verify an L1 witness proof.
pub fn verify_eth(
    spec: &ChainSpec,
    store: &dyn CommitteeStore,
    proof: &View<'_>,
) -> Result<DataPayload> {
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
    Ok(DataPayload::Json(witness_json(&verified)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::execution::AccountState;

    #[test]
    fn test_witness_json_shape() {
        let verified = VerifiedAccount {
            address: [0x11; 20],
            account: AccountState::empty(),
            storage: vec![([0x01; 32], [0x02; 32])],
        };
        let value = witness_json(&[verified]);
        let accounts = value["accounts"].as_array().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(
            accounts[0]["address"],
            format!("0x{}", hex::encode([0x11u8; 20]))
        );
        assert_eq!(accounts[0]["storage"][0]["value"]
            .as_str()
            .unwrap()
            .len(),
            66
        );
    }
}
