//! Top-level request dispatcher.
//!
//! Parses the outer proof envelope, applies any sync data to the
//! committee cache, selects the proof state machine for the requested
//! method, and folds the outcome into a [`VerificationReport`].

use serde::Serialize;
use tracing::{debug, warn};

use crate::consensus::{process_sync_data, CommitteeStore};
use crate::error::{ErrorKind, Result, VerifyError};
use crate::op::DecompressPolicy;
use crate::ssz::schemas::{ETH_REQUEST, OP_REQUEST};
use crate::ssz::View;
use crate::types::beacon::{
    BlsPublicKey, BlsSignature, CommitteeUpdate, SyncAggregate, SyncCommittee,
};
use crate::types::chain::{is_op_stack, ChainSpec};
use crate::types::request::{DataPayload, RequestVersion, RpcMethod};
use crate::verifiers;
use crate::verifiers::decode_beacon_header;

/// Host-facing verification outcome: a single success flag, normalized
/// result data, and a first-wins error. The missing-period range is
/// populated only for the soft failure a host can repair by fetching
/// light-client updates and retrying.
#[derive(Debug, Serialize)]
pub struct VerificationReport {
    pub success: bool,
    pub data: DataPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_missing_period: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_missing_period: Option<u64>,
}

impl VerificationReport {
    fn from_result(result: Result<DataPayload>) -> Self {
        match result {
            Ok(data) => VerificationReport {
                success: true,
                data,
                error: None,
                error_kind: None,
                first_missing_period: None,
                last_missing_period: None,
            },
            Err(error) => {
                warn!(%error, "verification rejected");
                let (first, last) = match error {
                    VerifyError::MissingPeriods { first, last } => (Some(first), Some(last)),
                    _ => (None, None),
                };
                VerificationReport {
                    success: false,
                    data: DataPayload::None,
                    error_kind: Some(error.kind()),
                    error: Some(error.to_string()),
                    first_missing_period: first,
                    last_missing_period: last,
                }
            }
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("report serialization cannot fail")
    }
}

/// Host-tunable verification options.
#[derive(Clone, Copy, Debug, Default)]
pub struct VerifyOptions {
    pub decompress: DecompressPolicy,
}

/// Verify a proof envelope for a JSON-RPC request with default options.
///
/// `args` is the JSON array of the request's params. The committee store
/// is consulted for L1 header authentication and extended by any sync
/// data the envelope carries.
pub fn verify_request(
    request: &[u8],
    method: &str,
    args: &str,
    chain_id: u64,
    store: &dyn CommitteeStore,
) -> VerificationReport {
    verify_request_with(request, method, args, chain_id, store, &VerifyOptions::default())
}

pub fn verify_request_with(
    request: &[u8],
    method: &str,
    args: &str,
    chain_id: u64,
    store: &dyn CommitteeStore,
    options: &VerifyOptions,
) -> VerificationReport {
    VerificationReport::from_result(run(request, method, args, chain_id, store, options))
}

/// The claimed result payload decoded from the request's data union.
enum ClaimedData<'a> {
    None,
    Bytes32([u8; 32]),
    Bytes(&'a [u8]),
    Uint256([u8; 32]),
}

impl<'a> ClaimedData<'a> {
    fn decode(data: &View<'a>) -> Result<Self> {
        let (selector, inner) = data.union_variant()?;
        Ok(match selector {
            0 => ClaimedData::None,
            1 => ClaimedData::Bytes32(inner.bytes32()?),
            2 => ClaimedData::Bytes(inner.bytes),
            3 => ClaimedData::Uint256(inner.uint256_be()?),
            _ => return Err(VerifyError::invalid("unknown data selector")),
        })
    }

    fn bytes(&self) -> Option<&'a [u8]> {
        match self {
            ClaimedData::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// The claimed value must agree with what the proof derives. Claims of
    /// a kind the verifier re-derives structurally (JSON results) are
    /// checked inside the individual verifiers instead.
    fn check_against(&self, derived: &DataPayload) -> Result<()> {
        let matches = match (self, derived) {
            (ClaimedData::None, _) => true,
            (ClaimedData::Bytes32(claimed), DataPayload::Bytes32(value)) => claimed == value,
            (ClaimedData::Uint256(claimed), DataPayload::Uint256(value)) => claimed == value,
            (ClaimedData::Bytes(claimed), DataPayload::Bytes(value)) => *claimed == &value[..],
            _ => true,
        };
        if !matches {
            return Err(VerifyError::invalid(
                "claimed result does not match the proven value",
            ));
        }
        Ok(())
    }
}

fn run(
    request: &[u8],
    method: &str,
    args: &str,
    chain_id: u64,
    store: &dyn CommitteeStore,
    options: &VerifyOptions,
) -> Result<DataPayload> {
    let method = RpcMethod::parse(method)?;
    let params: Vec<serde_json::Value> = if args.trim().is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(args)
            .map_err(|e| VerifyError::invalid(format!("args are not a JSON array: {e}")))?
    };

    if request.len() < 4 {
        return Err(VerifyError::invalid("request envelope too short"));
    }
    let version = RequestVersion::from_bytes(&request[..4])?;
    debug!(domain = version.domain, ?method, chain_id, "verifying request");

    if version.is_op_stack() {
        if !is_op_stack(chain_id) {
            return Err(VerifyError::UnsupportedChain { chain_id });
        }
        let view = View::new(&OP_REQUEST, request)?;
        let claimed = ClaimedData::decode(&view.field("data")?)?;
        let (selector, proof) = view.field("proof")?.union_variant()?;
        let derived = dispatch_op(chain_id, options, selector, &proof, method, &params, &claimed)?;
        claimed.check_against(&derived)?;
        return Ok(derived);
    }

    let spec =
        ChainSpec::for_chain(chain_id).ok_or(VerifyError::UnsupportedChain { chain_id })?;
    let view = View::new(&ETH_REQUEST, request)?;

    // Sync data first: it may contain exactly the periods the proof needs.
    let sync_data = view.field("sync_data")?;
    if !sync_data.union_is_none()? {
        let updates = decode_committee_updates(&sync_data)?;
        process_sync_data(spec, store, &updates)?;
    }

    let claimed = ClaimedData::decode(&view.field("data")?)?;
    let (selector, proof) = view.field("proof")?.union_variant()?;
    let derived = dispatch_eth(spec, store, selector, &proof, method, &params, &claimed)?;
    claimed.check_against(&derived)?;
    Ok(derived)
}

fn wrong_proof_kind(method: RpcMethod) -> VerifyError {
    VerifyError::invalid(format!("proof kind does not match method {method:?}"))
}

fn dispatch_eth(
    spec: &ChainSpec,
    store: &dyn CommitteeStore,
    selector: u8,
    proof: &View<'_>,
    method: RpcMethod,
    params: &[serde_json::Value],
    claimed: &ClaimedData<'_>,
) -> Result<DataPayload> {
    match selector {
        1 if method.is_account_method() => {
            verifiers::account::verify_eth(spec, store, proof, method, params, claimed.bytes())
        }
        2 if method == RpcMethod::GetTransactionByHash => {
            verifiers::transaction::verify_eth(spec, store, proof, params)
        }
        3 if method == RpcMethod::GetTransactionReceipt => {
            verifiers::receipt::verify_eth(spec, store, proof, params)
        }
        4 if method == RpcMethod::GetLogs => {
            verifiers::logs::verify_eth(spec, store, proof, claimed.bytes())
        }
        5 if method == RpcMethod::Call => {
            verifiers::call::verify_eth(spec, store, proof, params, claimed.bytes())
        }
        6 if matches!(
            method,
            RpcMethod::GetBlockByNumber | RpcMethod::GetBlockByHash
        ) =>
        {
            verifiers::block::verify_eth(spec, store, proof, method, params)
        }
        7 if method == RpcMethod::BlockNumber => {
            verifiers::block::verify_block_number_eth(spec, store, proof)
        }
        8 if method == RpcMethod::GetWitness => {
            verifiers::witness::verify_eth(spec, store, proof)
        }
        0 => Err(VerifyError::invalid("request carries no proof")),
        _ => Err(wrong_proof_kind(method)),
    }
}

fn dispatch_op(
    chain_id: u64,
    options: &VerifyOptions,
    selector: u8,
    proof: &View<'_>,
    method: RpcMethod,
    params: &[serde_json::Value],
    claimed: &ClaimedData<'_>,
) -> Result<DataPayload> {
    let policy = &options.decompress;
    match selector {
        1 if method.is_account_method() => {
            verifiers::account::verify_op(chain_id, policy, proof, method, params, claimed.bytes())
        }
        2 if method == RpcMethod::GetTransactionByHash => {
            verifiers::transaction::verify_op(chain_id, policy, proof, params)
        }
        3 if method == RpcMethod::GetTransactionReceipt => {
            verifiers::receipt::verify_op(chain_id, policy, proof, params)
        }
        4 if method == RpcMethod::GetLogs => {
            verifiers::logs::verify_op(chain_id, policy, proof, claimed.bytes())
        }
        5 if matches!(
            method,
            RpcMethod::GetBlockByNumber | RpcMethod::GetBlockByHash | RpcMethod::BlockNumber
        ) =>
        {
            verifiers::block::verify_op(chain_id, policy, proof, method, params)
        }
        6 if method == RpcMethod::Call => {
            verifiers::call::verify_op(chain_id, policy, proof, params, claimed.bytes())
        }
        0 => Err(VerifyError::invalid("request carries no proof")),
        _ => Err(wrong_proof_kind(method)),
    }
}

/// Decode the sync-data union's committee update list into owned records.
fn decode_committee_updates(sync_data: &View<'_>) -> Result<Vec<CommitteeUpdate>> {
    let (selector, list) = sync_data.union_variant()?;
    if selector != 1 {
        return Err(VerifyError::invalid("unknown sync data selector"));
    }
    let mut updates = Vec::with_capacity(list.len()?);
    for i in 0..list.len()? {
        let entry = list.at(i)?;

        let committee_view = entry.field("next_sync_committee")?;
        let pubkeys_view = committee_view.field("pubkeys")?;
        let mut pubkeys = Vec::with_capacity(pubkeys_view.len()?);
        for k in 0..pubkeys_view.len()? {
            let mut key = [0u8; 48];
            key.copy_from_slice(pubkeys_view.at(k)?.bytes);
            pubkeys.push(BlsPublicKey(key));
        }
        let mut aggregate = [0u8; 48];
        aggregate.copy_from_slice(committee_view.field("aggregate_pubkey")?.bytes);

        let branch_view = entry.field("next_sync_committee_branch")?;
        let mut branch = Vec::with_capacity(branch_view.len()?);
        for b in 0..branch_view.len()? {
            branch.push(branch_view.at(b)?.bytes32()?);
        }

        let mut bits = [0u8; 64];
        bits.copy_from_slice(entry.field("sync_committee_bits")?.bytes);
        let mut signature = [0u8; 96];
        signature.copy_from_slice(entry.field("sync_committee_signature")?.bytes);

        updates.push(CommitteeUpdate {
            attested_header: decode_beacon_header(&entry.field("attested_header")?)?,
            next_sync_committee: SyncCommittee {
                pubkeys,
                aggregate_pubkey: BlsPublicKey(aggregate),
            },
            next_sync_committee_branch: branch,
            sync_aggregate: SyncAggregate {
                sync_committee_bits: bits,
                sync_committee_signature: BlsSignature(signature),
            },
            signature_slot: entry.field("signature_slot")?.uint64()?,
        });
    }
    Ok(updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::InMemoryCommitteeCache;

    #[test]
    fn test_report_from_success() {
        let report = VerificationReport::from_result(Ok(DataPayload::uint(5)));
        assert!(report.success);
        assert!(report.error.is_none());
        let json = report.to_json();
        assert!(json.contains("\"0x5\""));
    }

    #[test]
    fn test_report_from_missing_periods() {
        let report = VerificationReport::from_result(Err(VerifyError::MissingPeriods {
            first: 7,
            last: 9,
        }));
        assert!(!report.success);
        assert_eq!(report.first_missing_period, Some(7));
        assert_eq!(report.last_missing_period, Some(9));
        assert_eq!(report.error_kind, Some(ErrorKind::MissingPeriods));
    }

    #[test]
    fn test_unknown_method_rejected() {
        let cache = InMemoryCommitteeCache::new();
        let report = verify_request(&[1, 1, 0, 0], "eth_mining", "[]", 1, &cache);
        assert!(!report.success);
        assert_eq!(report.error_kind, Some(ErrorKind::UnsupportedMethod));
    }

    #[test]
    fn test_unknown_chain_rejected() {
        let cache = InMemoryCommitteeCache::new();
        let report = verify_request(&[1, 1, 0, 0], "eth_getBalance", "[]", 424242, &cache);
        assert!(!report.success);
        assert_eq!(report.error_kind, Some(ErrorKind::UnsupportedChain));
    }

    #[test]
    fn test_garbage_envelope_rejected() {
        let cache = InMemoryCommitteeCache::new();
        let report = verify_request(&[1, 1], "eth_getBalance", "[]", 1, &cache);
        assert!(!report.success);
        assert_eq!(report.error_kind, Some(ErrorKind::InvalidProof));

        let report = verify_request(&[9, 1, 0, 0, 0], "eth_getBalance", "[]", 1, &cache);
        assert!(!report.success);
    }

    #[test]
    fn test_domain_chain_mismatch() {
        let cache = InMemoryCommitteeCache::new();
        // OP domain against an L1 chain id
        let report = verify_request(&[6, 1, 0, 0], "eth_getBalance", "[]", 1, &cache);
        assert!(!report.success);
        assert_eq!(report.error_kind, Some(ErrorKind::UnsupportedChain));
    }
}
