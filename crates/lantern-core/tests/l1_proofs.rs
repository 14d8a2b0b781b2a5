//! End-to-end L1 proof scenarios: complete envelopes verified through the
//! public entry point, plus single-bit tamper rejections.

mod common;

use common::*;

use lantern_core::ssz::schemas::{
    gindex_of_transaction, BLOCK_HASH_GINDEX, BLOCK_NUMBER_GINDEX, PAYLOAD_GINDEX,
    RECEIPTS_ROOT_GINDEX, STATE_ROOT_GINDEX, TRANSACTION,
};
use lantern_core::ssz::{hash_tree_root, View};
use lantern_core::trie::keccak256;
use lantern_core::{verify_request, CommitteeStore, ErrorKind, InMemoryCommitteeCache};

fn seeded_cache() -> InMemoryCommitteeCache {
    let cache = InMemoryCommitteeCache::new();
    cache
        .seed(test_period(), &committee().committee)
        .expect("seed");
    cache
}

// =============================================================================
// Account fixture
// =============================================================================

struct AccountFixture {
    address: [u8; 20],
    code: Vec<u8>,
    slot: [u8; 32],
    account_leaf: Vec<u8>,
    storage_leaf: Vec<u8>,
    state_branch: Vec<[u8; 32]>,
    header_fields: (lantern_core::BeaconBlockHeader, [u8; 64], [u8; 96]),
}

fn account_fixture() -> AccountFixture {
    let address = [0x51u8; 20];
    let code = vec![0x60, 0x01, 0x60, 0x00, 0xf3];
    let code_hash = keccak256(&code);

    let mut slot = [0u8; 32];
    slot[31] = 0x01;
    let (storage_leaf, storage_root) = single_leaf_trie(&keccak256(&slot), &[0x2a]);

    let account_value = account_rlp(7, 1000, storage_root, code_hash);
    let (account_leaf, state_root) = single_leaf_trie(&keccak256(&address), &account_value);

    let (state_branch, body_root) = build_branch(state_root, STATE_ROOT_GINDEX);
    let header_fields = signed_header(TEST_SLOT, body_root);

    AccountFixture {
        address,
        code,
        slot,
        account_leaf,
        storage_leaf,
        state_branch,
        header_fields,
    }
}

impl AccountFixture {
    fn proof_bytes(&self) -> Vec<u8> {
        let (header, bits, signature) = &self.header_fields;
        let storage_entry = container(vec![
            F::Fix(self.slot.to_vec()),
            F::Dyn(list_dyn(&[self.storage_leaf.clone()])),
        ]);
        container(vec![
            F::Fix(self.address.to_vec()),
            F::Dyn(list_dyn(&[self.account_leaf.clone()])),
            F::Dyn(list_dyn(&[storage_entry])),
            F::Fix(list_fixed(&self.state_branch)),
            F::Fix(header_bytes(header)),
            F::Fix(bits.to_vec()),
            F::Fix(signature.to_vec()),
        ])
    }

    fn request(&self, data: (u8, Vec<u8>)) -> Vec<u8> {
        request_bytes(1, data, (1, self.proof_bytes()), (0, Vec::new()))
    }

    fn address_arg(&self) -> String {
        format!("0x{}", hex::encode(self.address))
    }
}

#[test]
fn balance_proof_verifies() {
    let fixture = account_fixture();
    let cache = seeded_cache();
    let args = format!("[\"{}\", \"latest\"]", fixture.address_arg());

    let report = verify_request(&fixture.request(no_data()), "eth_getBalance", &args, 1, &cache);
    assert!(report.success, "rejected: {:?}", report.error);
    assert!(report.to_json().contains("\"0x3e8\""));
}

#[test]
fn nonce_proof_verifies() {
    let fixture = account_fixture();
    let cache = seeded_cache();
    let args = format!("[\"{}\", \"latest\"]", fixture.address_arg());

    let report = verify_request(
        &fixture.request(no_data()),
        "eth_getTransactionCount",
        &args,
        1,
        &cache,
    );
    assert!(report.success, "rejected: {:?}", report.error);
    assert!(report.to_json().contains("\"0x7\""));
}

#[test]
fn storage_proof_verifies() {
    let fixture = account_fixture();
    let cache = seeded_cache();
    let args = format!("[\"{}\", \"0x01\", \"latest\"]", fixture.address_arg());

    let report = verify_request(
        &fixture.request(no_data()),
        "eth_getStorageAt",
        &args,
        1,
        &cache,
    );
    assert!(report.success, "rejected: {:?}", report.error);
    // 0x2a right-aligned in 32 bytes
    assert!(report.to_json().contains("2a\""));
}

#[test]
fn code_proof_checks_hash() {
    let fixture = account_fixture();
    let cache = seeded_cache();
    let args = format!("[\"{}\", \"latest\"]", fixture.address_arg());

    let report = verify_request(
        &fixture.request((2, fixture.code.clone())),
        "eth_getCode",
        &args,
        1,
        &cache,
    );
    assert!(report.success, "rejected: {:?}", report.error);

    // A different bytecode blob cannot satisfy the verified code hash
    let report = verify_request(
        &fixture.request((2, vec![0xde, 0xad])),
        "eth_getCode",
        &args,
        1,
        &cache,
    );
    assert!(!report.success);
    assert_eq!(report.error_kind, Some(ErrorKind::RootMismatch));
}

#[test]
fn get_proof_returns_full_bundle() {
    let fixture = account_fixture();
    let cache = seeded_cache();
    let args = format!("[\"{}\", [\"0x01\"], \"latest\"]", fixture.address_arg());

    let report = verify_request(&fixture.request(no_data()), "eth_getProof", &args, 1, &cache);
    assert!(report.success, "rejected: {:?}", report.error);
    let json = report.to_json();
    assert!(json.contains("accountProof"));
    assert!(json.contains("storageProof"));
    assert!(json.contains("storageHash"));
}

#[test]
fn flipped_storage_bit_is_root_mismatch() {
    let mut fixture = account_fixture();
    let last = fixture.storage_leaf.len() - 1;
    fixture.storage_leaf[last] ^= 0x01;
    let cache = seeded_cache();
    let args = format!("[\"{}\", \"0x01\", \"latest\"]", fixture.address_arg());

    let report = verify_request(
        &fixture.request(no_data()),
        "eth_getStorageAt",
        &args,
        1,
        &cache,
    );
    assert!(!report.success);
    assert_eq!(report.error_kind, Some(ErrorKind::RootMismatch));
}

#[test]
fn flipped_signature_bit_is_bad_signature() {
    let mut fixture = account_fixture();
    fixture.header_fields.2[17] ^= 0x01;
    let cache = seeded_cache();
    let args = format!("[\"{}\", \"latest\"]", fixture.address_arg());

    let report = verify_request(&fixture.request(no_data()), "eth_getBalance", &args, 1, &cache);
    assert!(!report.success);
    assert_eq!(report.error_kind, Some(ErrorKind::BadSignature));
}

#[test]
fn low_participation_is_bad_signature() {
    let mut fixture = account_fixture();
    // 256 of 512 participants is below the 2/3 threshold
    fixture.header_fields.1[32..].fill(0);
    let cache = seeded_cache();
    let args = format!("[\"{}\", \"latest\"]", fixture.address_arg());

    let report = verify_request(&fixture.request(no_data()), "eth_getBalance", &args, 1, &cache);
    assert!(!report.success);
    assert_eq!(report.error_kind, Some(ErrorKind::BadSignature));
    assert!(report.error.unwrap().contains("participation"));
}

#[test]
fn address_mismatch_is_reported() {
    let fixture = account_fixture();
    let cache = seeded_cache();
    let args = format!("[\"0x{}\", \"latest\"]", hex::encode([0x99u8; 20]));

    let report = verify_request(&fixture.request(no_data()), "eth_getBalance", &args, 1, &cache);
    assert!(!report.success);
    assert_eq!(report.error_kind, Some(ErrorKind::AddressMismatch));
}

#[test]
fn missing_period_is_soft_failure() {
    let fixture = account_fixture();
    let cache = InMemoryCommitteeCache::new();
    let args = format!("[\"{}\", \"latest\"]", fixture.address_arg());

    let report = verify_request(&fixture.request(no_data()), "eth_getBalance", &args, 1, &cache);
    assert!(!report.success);
    assert_eq!(report.error_kind, Some(ErrorKind::MissingPeriods));
    assert_eq!(report.first_missing_period, Some(test_period()));
    assert_eq!(report.last_missing_period, Some(test_period()));
}

#[test]
fn claimed_balance_must_match_proven_value() {
    let fixture = account_fixture();
    let cache = seeded_cache();
    let args = format!("[\"{}\", \"latest\"]", fixture.address_arg());

    // uint256 data payloads are little-endian on the wire
    let mut claimed_ok = vec![0u8; 32];
    claimed_ok[..2].copy_from_slice(&1000u16.to_le_bytes());
    let report = verify_request(
        &fixture.request((3, claimed_ok)),
        "eth_getBalance",
        &args,
        1,
        &cache,
    );
    assert!(report.success, "rejected: {:?}", report.error);

    let mut claimed_bad = vec![0u8; 32];
    claimed_bad[..2].copy_from_slice(&999u16.to_le_bytes());
    let report = verify_request(
        &fixture.request((3, claimed_bad)),
        "eth_getBalance",
        &args,
        1,
        &cache,
    );
    assert!(!report.success);
    assert_eq!(report.error_kind, Some(ErrorKind::InvalidProof));
}

#[test]
fn sync_data_fills_missing_period() {
    let fixture = account_fixture();
    let cache = InMemoryCommitteeCache::new();
    // Only the previous period is trusted; the request must carry the
    // handover to the period its header lives in.
    cache
        .seed(test_period() - 1, &committee().committee)
        .expect("seed");

    let request = request_bytes(
        1,
        no_data(),
        (1, fixture.proof_bytes()),
        (1, committee_update_bytes(test_period())),
    );
    let args = format!("[\"{}\", \"latest\"]", fixture.address_arg());

    let report = verify_request(&request, "eth_getBalance", &args, 1, &cache);
    assert!(report.success, "rejected: {:?}", report.error);
    assert!(cache.get(test_period()).is_some());
}

/// One SSZ committee-update record handing the test committee over to
/// `target_period`, signed by the committee of the period before it.
fn committee_update_bytes(target_period: u64) -> Vec<u8> {
    use lantern_core::consensus::hash_sync_committee;
    use lantern_core::ssz::merkle::compute_root_from_branch;
    use lantern_core::ssz::schemas::NEXT_SYNC_COMMITTEE_GINDEX;

    let attested_slot = (target_period - 1) * 8192 + 100;
    let branch = vec![[0x5au8; 32]; 5];
    let committee_root = hash_sync_committee(&committee().committee).unwrap();
    let state_root =
        compute_root_from_branch(&committee_root, NEXT_SYNC_COMMITTEE_GINDEX, &branch).unwrap();

    let attested_header = lantern_core::BeaconBlockHeader {
        slot: attested_slot,
        proposer_index: 1,
        parent_root: [0x01; 32],
        state_root,
        body_root: [0x02; 32],
    };
    let (bits, signature) = sign_header(&attested_header);

    let mut committee_bytes = Vec::new();
    for pk in &committee().committee.pubkeys {
        committee_bytes.extend_from_slice(&pk.0);
    }
    committee_bytes.extend_from_slice(&committee().committee.aggregate_pubkey.0);

    let mut update = Vec::new();
    update.extend_from_slice(&header_bytes(&attested_header));
    update.extend_from_slice(&committee_bytes);
    for node in &branch {
        update.extend_from_slice(node);
    }
    update.extend_from_slice(&bits);
    update.extend_from_slice(&signature);
    update.extend_from_slice(&(attested_slot + 1).to_le_bytes());

    // A list of fixed-size records is a plain concatenation
    update
}

// =============================================================================
// Transaction proofs
// =============================================================================

struct TxFixture {
    raw_tx: Vec<u8>,
    tx_index: u64,
    block_number: u64,
    block_hash: [u8; 32],
    witnesses: Vec<[u8; 32]>,
    header_fields: (lantern_core::BeaconBlockHeader, [u8; 64], [u8; 96]),
}

fn tx_fixture() -> TxFixture {
    let raw_tx = vec![0x02, 0xc3, 0x01, 0x02, 0x03];
    let tx_index = 3u64;
    let block_number = 123u64;
    let block_hash = [0x44u8; 32];

    let tx_root = hash_tree_root(View::new(&TRANSACTION, &raw_tx).unwrap()).unwrap();
    let (witnesses, body_root) = build_multi_proof(&[
        (BLOCK_NUMBER_GINDEX, uint_leaf(block_number)),
        (BLOCK_HASH_GINDEX, block_hash),
        (gindex_of_transaction(tx_index), tx_root),
    ]);
    let header_fields = signed_header(TEST_SLOT, body_root);

    TxFixture {
        raw_tx,
        tx_index,
        block_number,
        block_hash,
        witnesses,
        header_fields,
    }
}

impl TxFixture {
    fn request(&self) -> Vec<u8> {
        let (header, bits, signature) = &self.header_fields;
        let proof = container(vec![
            F::Dyn(self.raw_tx.clone()),
            F::Fix(self.tx_index.to_le_bytes().to_vec()),
            F::Fix(self.block_number.to_le_bytes().to_vec()),
            F::Fix(self.block_hash.to_vec()),
            F::Dyn(list_fixed(&self.witnesses)),
            F::Fix(header_bytes(header)),
            F::Fix(bits.to_vec()),
            F::Fix(signature.to_vec()),
        ]);
        request_bytes(1, no_data(), (2, proof), (0, Vec::new()))
    }
}

#[test]
fn transaction_proof_verifies() {
    let fixture = tx_fixture();
    let cache = seeded_cache();
    let args = format!("[\"0x{}\"]", hex::encode(keccak256(&fixture.raw_tx)));

    let report = verify_request(&fixture.request(), "eth_getTransactionByHash", &args, 1, &cache);
    assert!(report.success, "rejected: {:?}", report.error);
    let json = report.to_json();
    assert!(json.contains("\"0x7b\""));
    assert!(json.contains("eip1559"));
}

#[test]
fn transaction_proof_rejects_wrong_hash() {
    let fixture = tx_fixture();
    let cache = seeded_cache();
    let args = format!("[\"0x{}\"]", hex::encode([0x13u8; 32]));

    let report = verify_request(&fixture.request(), "eth_getTransactionByHash", &args, 1, &cache);
    assert!(!report.success);
    assert_eq!(report.error_kind, Some(ErrorKind::RootMismatch));
}

#[test]
fn proof_kind_must_match_method() {
    let fixture = tx_fixture();
    let cache = seeded_cache();
    let args = format!("[\"0x{}\"]", hex::encode(keccak256(&fixture.raw_tx)));

    // A transaction proof cannot answer a receipt query
    let report = verify_request(&fixture.request(), "eth_getTransactionReceipt", &args, 1, &cache);
    assert!(!report.success);
    assert_eq!(report.error_kind, Some(ErrorKind::InvalidProof));
}

// =============================================================================
// Receipt proofs
// =============================================================================

fn receipt_leaf_bytes() -> Vec<u8> {
    let log = rlp_list(&[
        rlp_bytes(&[0x11; 20]),
        rlp_list(&[rlp_bytes(&[0x22; 32])]),
        rlp_bytes(b"payload"),
    ]);
    let body = rlp_list(&[
        rlp_bytes(&[0x01]),
        rlp_bytes(&[0x52, 0x08]),
        rlp_bytes(&[0u8; 256]),
        rlp_list(&[log]),
    ]);
    let mut leaf = vec![0x02];
    leaf.extend_from_slice(&body);
    leaf
}

struct ReceiptFixture {
    raw_tx: Vec<u8>,
    tx_index: u64,
    block_number: u64,
    block_hash: [u8; 32],
    receipt_node: Vec<u8>,
    witnesses: Vec<[u8; 32]>,
    header_fields: (lantern_core::BeaconBlockHeader, [u8; 64], [u8; 96]),
}

fn receipt_fixture(trie_index: u64, claimed_index: u64) -> ReceiptFixture {
    let raw_tx = vec![0x02, 0xc3, 0x01, 0x02, 0x03];
    let block_number = 200u64;
    let block_hash = [0x55u8; 32];

    let (receipt_node, receipts_root) =
        single_leaf_trie(&rlp_uint_key(trie_index), &receipt_leaf_bytes());

    let tx_root = hash_tree_root(View::new(&TRANSACTION, &raw_tx).unwrap()).unwrap();
    let (witnesses, body_root) = build_multi_proof(&[
        (BLOCK_NUMBER_GINDEX, uint_leaf(block_number)),
        (BLOCK_HASH_GINDEX, block_hash),
        (RECEIPTS_ROOT_GINDEX, receipts_root),
        (gindex_of_transaction(claimed_index), tx_root),
    ]);
    let header_fields = signed_header(TEST_SLOT, body_root);

    ReceiptFixture {
        raw_tx,
        tx_index: claimed_index,
        block_number,
        block_hash,
        receipt_node,
        witnesses,
        header_fields,
    }
}

/// The receipts trie keys leaves by `RLP(tx_index)`.
fn rlp_uint_key(index: u64) -> Vec<u8> {
    if index == 0 {
        vec![0x80]
    } else {
        rlp_uint(index)
    }
}

impl ReceiptFixture {
    fn request(&self) -> Vec<u8> {
        let (header, bits, signature) = &self.header_fields;
        let proof = container(vec![
            F::Dyn(self.raw_tx.clone()),
            F::Fix(self.tx_index.to_le_bytes().to_vec()),
            F::Fix(self.block_number.to_le_bytes().to_vec()),
            F::Fix(self.block_hash.to_vec()),
            F::Dyn(list_dyn(&[self.receipt_node.clone()])),
            F::Dyn(list_fixed(&self.witnesses)),
            F::Fix(header_bytes(header)),
            F::Fix(bits.to_vec()),
            F::Fix(signature.to_vec()),
        ]);
        request_bytes(1, no_data(), (3, proof), (0, Vec::new()))
    }
}

#[test]
fn receipt_proof_verifies() {
    let fixture = receipt_fixture(3, 3);
    let cache = seeded_cache();
    let args = format!("[\"0x{}\"]", hex::encode(keccak256(&fixture.raw_tx)));

    let report = verify_request(&fixture.request(), "eth_getTransactionReceipt", &args, 1, &cache);
    assert!(report.success, "rejected: {:?}", report.error);
    let json = report.to_json();
    assert!(json.contains("cumulativeGasUsed"));
    assert!(json.contains("\"0x5208\""));
}

#[test]
fn receipt_proof_wrong_index_is_path_mismatch() {
    // The trie holds the receipt at index 3; the proof claims index 4
    let fixture = receipt_fixture(3, 4);
    let cache = seeded_cache();
    let args = format!("[\"0x{}\"]", hex::encode(keccak256(&fixture.raw_tx)));

    let report = verify_request(&fixture.request(), "eth_getTransactionReceipt", &args, 1, &cache);
    assert!(!report.success);
    assert_eq!(report.error_kind, Some(ErrorKind::InvalidProof));
}

#[test]
fn receipt_node_tamper_breaks_body_binding() {
    let mut fixture = receipt_fixture(3, 3);
    let last = fixture.receipt_node.len() - 1;
    fixture.receipt_node[last] ^= 0x01;
    let cache = seeded_cache();
    let args = format!("[\"0x{}\"]", hex::encode(keccak256(&fixture.raw_tx)));

    let report = verify_request(&fixture.request(), "eth_getTransactionReceipt", &args, 1, &cache);
    assert!(!report.success);
    assert_eq!(report.error_kind, Some(ErrorKind::RootMismatch));
}

// =============================================================================
// Logs proofs
// =============================================================================

fn logs_request(claimed: &serde_json::Value) -> Vec<u8> {
    let raw_tx = vec![0x02, 0xc3, 0x01, 0x02, 0x03];
    let tx_index = 2u64;
    let block_number = 200u64;
    let block_hash = [0x55u8; 32];

    let (receipt_node, receipts_root) =
        single_leaf_trie(&rlp_uint_key(tx_index), &receipt_leaf_bytes());
    let tx_root = hash_tree_root(View::new(&TRANSACTION, &raw_tx).unwrap()).unwrap();
    let (witnesses, body_root) = build_multi_proof(&[
        (BLOCK_NUMBER_GINDEX, uint_leaf(block_number)),
        (BLOCK_HASH_GINDEX, block_hash),
        (RECEIPTS_ROOT_GINDEX, receipts_root),
        (gindex_of_transaction(tx_index), tx_root),
    ]);
    let (header, bits, signature) = signed_header(TEST_SLOT, body_root);

    let logs_tx = container(vec![
        F::Dyn(raw_tx),
        F::Fix(tx_index.to_le_bytes().to_vec()),
        F::Dyn(list_dyn(&[receipt_node])),
    ]);
    let block = container(vec![
        F::Fix(block_number.to_le_bytes().to_vec()),
        F::Fix(block_hash.to_vec()),
        F::Dyn(list_fixed(&witnesses)),
        F::Fix(header_bytes(&header)),
        F::Fix(bits.to_vec()),
        F::Fix(signature.to_vec()),
        F::Dyn(list_dyn(&[logs_tx])),
    ]);
    let proof = container(vec![F::Dyn(list_dyn(&[block]))]);

    let data = serde_json::to_vec(claimed).unwrap();
    request_bytes(1, (2, data), (4, proof), (0, Vec::new()))
}

fn claimed_log(block: u64, tx: u64, data: &str) -> serde_json::Value {
    serde_json::json!([{
        "address": format!("0x{}", hex::encode([0x11u8; 20])),
        "topics": [format!("0x{}", hex::encode([0x22u8; 32]))],
        "data": format!("0x{}", hex::encode(data.as_bytes())),
        "blockNumber": format!("0x{block:x}"),
        "transactionIndex": format!("0x{tx:x}"),
    }])
}

#[test]
fn logs_proof_verifies() {
    let cache = seeded_cache();
    let report = verify_request(
        &logs_request(&claimed_log(200, 2, "payload")),
        "eth_getLogs",
        "[{}]",
        1,
        &cache,
    );
    assert!(report.success, "rejected: {:?}", report.error);
    assert!(report.to_json().contains(&hex::encode(b"payload")));
}

#[test]
fn log_without_matching_tx_proof_rejects() {
    let cache = seeded_cache();
    // Claimed log points at tx 3; only tx 2 is authenticated
    let report = verify_request(
        &logs_request(&claimed_log(200, 3, "payload")),
        "eth_getLogs",
        "[{}]",
        1,
        &cache,
    );
    assert!(!report.success);
    assert_eq!(report.error_kind, Some(ErrorKind::InvalidProof));
    assert!(report.error.unwrap().contains("missing log proof"));
}

#[test]
fn log_payload_tamper_rejects() {
    let cache = seeded_cache();
    let report = verify_request(
        &logs_request(&claimed_log(200, 2, "tampered")),
        "eth_getLogs",
        "[{}]",
        1,
        &cache,
    );
    assert!(!report.success);
    assert_eq!(report.error_kind, Some(ErrorKind::InvalidProof));
}

// =============================================================================
// Call and witness proofs
// =============================================================================

fn call_proof_bytes(fixture: &AccountFixture) -> Vec<u8> {
    let (header, bits, signature) = &fixture.header_fields;
    let storage_entry = container(vec![
        F::Fix(fixture.slot.to_vec()),
        F::Dyn(list_dyn(&[fixture.storage_leaf.clone()])),
    ]);
    let account = container(vec![
        F::Fix(fixture.address.to_vec()),
        F::Dyn(list_dyn(&[fixture.account_leaf.clone()])),
        F::Dyn(list_dyn(&[storage_entry])),
    ]);
    container(vec![
        F::Dyn(list_dyn(&[account])),
        F::Dyn(list_dyn(&[fixture.code.clone()])),
        F::Fix(list_fixed(&fixture.state_branch)),
        F::Fix(header_bytes(header)),
        F::Fix(bits.to_vec()),
        F::Fix(signature.to_vec()),
    ])
}

#[test]
fn call_proof_verifies_access_set() {
    let fixture = account_fixture();
    let cache = seeded_cache();
    let request = request_bytes(
        1,
        (2, b"\x00\x01".to_vec()),
        (5, call_proof_bytes(&fixture)),
        (0, Vec::new()),
    );
    let args = format!(
        "[{{\"to\": \"{}\", \"data\": \"0x\"}}, \"latest\"]",
        fixture.address_arg()
    );

    let report = verify_request(&request, "eth_call", &args, 1, &cache);
    assert!(report.success, "rejected: {:?}", report.error);
    assert!(report.to_json().contains("\"0x0001\""));
}

#[test]
fn call_nonce_override_rejected_by_name() {
    let fixture = account_fixture();
    let cache = seeded_cache();
    let request = request_bytes(1, no_data(), (5, call_proof_bytes(&fixture)), (0, Vec::new()));
    let args = format!(
        "[{{\"to\": \"{}\"}}, \"latest\", {{\"{}\": {{\"nonce\": \"0x1\"}}}}]",
        fixture.address_arg(),
        fixture.address_arg()
    );

    let report = verify_request(&request, "eth_call", &args, 1, &cache);
    assert!(!report.success);
    assert_eq!(report.error_kind, Some(ErrorKind::UnsupportedOverride));
    assert!(report.error.unwrap().contains("nonce"));
}

#[test]
fn call_foreign_code_rejected() {
    let mut fixture = account_fixture();
    // Code that no verified account hashes to
    fixture.code = vec![0xde, 0xad, 0xbe, 0xef];
    let cache = seeded_cache();
    let request = request_bytes(1, no_data(), (5, call_proof_bytes(&fixture)), (0, Vec::new()));
    let args = format!("[{{\"to\": \"{}\"}}, \"latest\"]", fixture.address_arg());

    let report = verify_request(&request, "eth_call", &args, 1, &cache);
    assert!(!report.success);
    assert_eq!(report.error_kind, Some(ErrorKind::InvalidProof));
}

#[test]
fn witness_proof_returns_verified_state() {
    let fixture = account_fixture();
    let cache = seeded_cache();
    let request = request_bytes(1, no_data(), (8, call_proof_bytes(&fixture)), (0, Vec::new()));
    let args = "[]";

    let report = verify_request(&request, "eth_getWitness", args, 1, &cache);
    assert!(report.success, "rejected: {:?}", report.error);
    let json = report.to_json();
    assert!(json.contains(&hex::encode(fixture.address)));
    assert!(json.contains("storageHash"));
}

// =============================================================================
// Block proofs
// =============================================================================

fn payload_fixture(block_number: u64, block_hash: [u8; 32]) -> Vec<u8> {
    let raw_tx = vec![0x02, 0xc3, 0x01, 0x02, 0x03];
    let mut base_fee = vec![0u8; 32];
    base_fee[0] = 0x07;
    container(vec![
        F::Fix(vec![0u8; 32]),                      // parent_hash
        F::Fix(vec![0u8; 20]),                      // fee_recipient
        F::Fix(vec![0x0cu8; 32]),                   // state_root
        F::Fix(vec![0x0du8; 32]),                   // receipts_root
        F::Fix(vec![0u8; 256]),                     // logs_bloom
        F::Fix(vec![0u8; 32]),                      // prev_randao
        F::Fix(block_number.to_le_bytes().to_vec()),
        F::Fix(30_000_000u64.to_le_bytes().to_vec()), // gas_limit
        F::Fix(21_000u64.to_le_bytes().to_vec()),     // gas_used
        F::Fix(1_700_000_000u64.to_le_bytes().to_vec()), // timestamp
        F::Dyn(Vec::new()),                         // extra_data
        F::Fix(base_fee),                           // base_fee_per_gas (LE)
        F::Fix(block_hash.to_vec()),
        F::Dyn(list_dyn(&[raw_tx])),                // transactions
        F::Dyn(Vec::new()),                         // withdrawals
        F::Fix(0u64.to_le_bytes().to_vec()),        // blob_gas_used
        F::Fix(0u64.to_le_bytes().to_vec()),        // excess_blob_gas
    ])
}

#[test]
fn block_proof_verifies_and_checks_selector() {
    let block_hash = [0x66u8; 32];
    let payload = payload_fixture(321, block_hash);
    let payload_root = hash_tree_root(
        View::new(&lantern_core::ssz::schemas::EXECUTION_PAYLOAD, &payload).unwrap(),
    )
    .unwrap();
    let (branch, body_root) = build_branch(payload_root, PAYLOAD_GINDEX);
    let (header, bits, signature) = signed_header(TEST_SLOT, body_root);

    let proof = container(vec![
        F::Dyn(payload),
        F::Fix(list_fixed(&branch)),
        F::Fix(header_bytes(&header)),
        F::Fix(bits.to_vec()),
        F::Fix(signature.to_vec()),
    ]);
    let request = request_bytes(1, no_data(), (6, proof), (0, Vec::new()));
    let cache = seeded_cache();

    let report = verify_request(&request, "eth_getBlockByNumber", "[\"0x141\", false]", 1, &cache);
    assert!(report.success, "rejected: {:?}", report.error);
    let json = report.to_json();
    assert!(json.contains("\"0x141\""));
    assert!(json.contains(&hex::encode(block_hash)));
    assert!(json.contains("baseFeePerGas"));

    // The same proof cannot answer a request for a different block
    let report = verify_request(&request, "eth_getBlockByNumber", "[\"0x142\", false]", 1, &cache);
    assert!(!report.success);
    assert_eq!(report.error_kind, Some(ErrorKind::InvalidProof));
}

#[test]
fn block_number_proof_verifies() {
    let block_number = 777u64;
    let block_hash = [0x77u8; 32];
    let (witnesses, body_root) = build_multi_proof(&[
        (BLOCK_NUMBER_GINDEX, uint_leaf(block_number)),
        (BLOCK_HASH_GINDEX, block_hash),
    ]);
    let (header, bits, signature) = signed_header(TEST_SLOT, body_root);

    let proof = container(vec![
        F::Fix(block_number.to_le_bytes().to_vec()),
        F::Fix(block_hash.to_vec()),
        F::Dyn(list_fixed(&witnesses)),
        F::Fix(header_bytes(&header)),
        F::Fix(bits.to_vec()),
        F::Fix(signature.to_vec()),
    ]);
    let request = request_bytes(1, no_data(), (7, proof), (0, Vec::new()));
    let cache = seeded_cache();

    let report = verify_request(&request, "eth_blockNumber", "[]", 1, &cache);
    assert!(report.success, "rejected: {:?}", report.error);
    assert!(report.to_json().contains("\"0x309\""));
}
