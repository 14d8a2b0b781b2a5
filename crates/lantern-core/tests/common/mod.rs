//! Shared fixtures for the end-to-end proof scenarios: minimal SSZ and
//! RLP encoders, trie builders, a witness generator for Merkle
//! multi-proofs, and a deterministic BLS sync committee.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::OnceLock;

use blst::min_pk::{AggregateSignature, SecretKey};

use lantern_core::consensus::{
    compute_domain, compute_signing_root, hash_beacon_block_header,
};
use lantern_core::ssz::hash::{sha256, sha256_pair};
use lantern_core::ssz::merkle::compute_root_from_branch;
use lantern_core::trie::keccak256;
use lantern_core::types::beacon::{
    BeaconBlockHeader, BlsPublicKey, SyncCommittee, DOMAIN_SYNC_COMMITTEE, SYNC_COMMITTEE_SIZE,
};
use lantern_core::types::chain::{ChainSpec, MAINNET};

// =============================================================================
// SSZ encoding
// =============================================================================

/// A container field value: fixed bytes in place, or a dynamic part that
/// gets an offset slot.
pub enum F {
    Fix(Vec<u8>),
    Dyn(Vec<u8>),
}

pub fn container(fields: Vec<F>) -> Vec<u8> {
    let fixed_len: usize = fields
        .iter()
        .map(|f| match f {
            F::Fix(bytes) => bytes.len(),
            F::Dyn(_) => 4,
        })
        .sum();

    let mut out = Vec::new();
    let mut tail = Vec::new();
    for field in &fields {
        match field {
            F::Fix(bytes) => out.extend_from_slice(bytes),
            F::Dyn(bytes) => {
                out.extend_from_slice(&((fixed_len + tail.len()) as u32).to_le_bytes());
                tail.extend_from_slice(bytes);
            }
        }
    }
    out.extend_from_slice(&tail);
    out
}

/// List of variable-size elements: leading offset table plus payloads.
pub fn list_dyn(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut offset = items.len() * 4;
    for item in items {
        out.extend_from_slice(&(offset as u32).to_le_bytes());
        offset += item.len();
    }
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

/// List of fixed-size elements: plain concatenation.
pub fn list_fixed(items: &[[u8; 32]]) -> Vec<u8> {
    items.iter().flatten().copied().collect()
}

pub fn union(selector: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![selector];
    out.extend_from_slice(payload);
    out
}

pub fn header_bytes(header: &BeaconBlockHeader) -> Vec<u8> {
    let mut out = Vec::with_capacity(112);
    out.extend_from_slice(&header.slot.to_le_bytes());
    out.extend_from_slice(&header.proposer_index.to_le_bytes());
    out.extend_from_slice(&header.parent_root);
    out.extend_from_slice(&header.state_root);
    out.extend_from_slice(&header.body_root);
    out
}

/// Assemble a complete proof envelope for the given domain.
pub fn request_bytes(
    domain: u8,
    data: (u8, Vec<u8>),
    proof: (u8, Vec<u8>),
    sync: (u8, Vec<u8>),
) -> Vec<u8> {
    container(vec![
        F::Fix(vec![domain, 1, 0, 0]),
        F::Dyn(union(data.0, &data.1)),
        F::Dyn(union(proof.0, &proof.1)),
        F::Dyn(union(sync.0, &sync.1)),
    ])
}

pub fn no_data() -> (u8, Vec<u8>) {
    (0, Vec::new())
}

// =============================================================================
// RLP and trie building
// =============================================================================

pub fn rlp_bytes(payload: &[u8]) -> Vec<u8> {
    match payload.len() {
        1 if payload[0] < 0x80 => payload.to_vec(),
        len if len <= 55 => {
            let mut out = vec![0x80 + len as u8];
            out.extend_from_slice(payload);
            out
        }
        len if len <= 255 => {
            let mut out = vec![0xb8, len as u8];
            out.extend_from_slice(payload);
            out
        }
        len => {
            let mut out = vec![0xb9, (len >> 8) as u8, len as u8];
            out.extend_from_slice(payload);
            out
        }
    }
}

pub fn rlp_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload: Vec<u8> = items.iter().flatten().copied().collect();
    let mut out = match payload.len() {
        len if len <= 55 => vec![0xc0 + len as u8],
        len if len <= 255 => vec![0xf8, len as u8],
        len => vec![0xf9, (len >> 8) as u8, len as u8],
    };
    out.extend_from_slice(&payload);
    out
}

/// Minimal big-endian RLP integer payload.
pub fn rlp_uint(value: u64) -> Vec<u8> {
    if value == 0 {
        return rlp_bytes(&[]);
    }
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap();
    rlp_bytes(&bytes[start..])
}

pub fn to_nibbles(key: &[u8]) -> Vec<u8> {
    key.iter().flat_map(|b| [b >> 4, b & 0x0f]).collect()
}

/// Hex-prefix encode a nibble path.
pub fn hp(nibbles: &[u8], is_leaf: bool) -> Vec<u8> {
    let flag = if is_leaf { 2u8 } else { 0u8 };
    let mut out = Vec::new();
    if nibbles.len() % 2 == 1 {
        out.push(((flag | 1) << 4) | nibbles[0]);
        for pair in nibbles[1..].chunks(2) {
            out.push((pair[0] << 4) | pair[1]);
        }
    } else {
        out.push(flag << 4);
        for pair in nibbles.chunks(2) {
            out.push((pair[0] << 4) | pair[1]);
        }
    }
    out
}

/// A single-leaf trie holding `value` at `key`: the whole key path lives
/// in one leaf node, whose keccak is the trie root.
pub fn single_leaf_trie(key: &[u8], value: &[u8]) -> (Vec<u8>, [u8; 32]) {
    let leaf = rlp_list(&[rlp_bytes(&hp(&to_nibbles(key), true)), rlp_bytes(value)]);
    let root = keccak256(&leaf);
    (leaf, root)
}

/// The RLP 4-tuple of an account leaf.
pub fn account_rlp(
    nonce: u64,
    balance: u64,
    storage_root: [u8; 32],
    code_hash: [u8; 32],
) -> Vec<u8> {
    rlp_list(&[
        rlp_uint(nonce),
        rlp_uint(balance),
        rlp_bytes(&storage_root),
        rlp_bytes(&code_hash),
    ])
}

// =============================================================================
// Merkle proof building
// =============================================================================

fn filler(gindex: u64) -> [u8; 32] {
    let mut seed = [0u8; 32];
    seed[..8].copy_from_slice(&gindex.to_le_bytes());
    sha256(&seed)
}

/// Build a single-leaf branch with deterministic sibling hashes.
pub fn build_branch(leaf: [u8; 32], gindex: u64) -> (Vec<[u8; 32]>, [u8; 32]) {
    let depth = 63 - gindex.leading_zeros() as usize;
    let branch: Vec<[u8; 32]> = (0..depth).map(|i| filler(gindex >> i ^ 1)).collect();
    let root = compute_root_from_branch(&leaf, gindex, &branch).expect("fixture branch");
    (branch, root)
}

/// Build the witness list and root for a multi-leaf proof, mirroring the
/// verifier's descending-gindex consumption order.
pub fn build_multi_proof(leaves: &[(u64, [u8; 32])]) -> (Vec<[u8; 32]>, [u8; 32]) {
    let mut nodes: BTreeMap<u64, [u8; 32]> = leaves.iter().copied().collect();
    let mut witnesses = Vec::new();
    loop {
        let (&gindex, &node) = nodes.iter().next_back().expect("non-empty");
        if gindex == 1 {
            return (witnesses, node);
        }
        nodes.remove(&gindex);
        let sibling_index = gindex ^ 1;
        let sibling = match nodes.remove(&sibling_index) {
            Some(known) => known,
            None => {
                let hash = filler(sibling_index);
                witnesses.push(hash);
                hash
            }
        };
        let parent = if gindex & 1 == 1 {
            sha256_pair(&sibling, &node)
        } else {
            sha256_pair(&node, &sibling)
        };
        nodes.insert(gindex >> 1, parent);
    }
}

// =============================================================================
// Sync committee fixture
// =============================================================================

pub struct TestCommittee {
    secret_keys: Vec<SecretKey>,
    pub committee: SyncCommittee,
}

static COMMITTEE: OnceLock<TestCommittee> = OnceLock::new();

/// A deterministic 512-member committee, built once per test binary.
pub fn committee() -> &'static TestCommittee {
    COMMITTEE.get_or_init(|| {
        let secret_keys: Vec<SecretKey> = (0..SYNC_COMMITTEE_SIZE)
            .map(|i| {
                let mut ikm = [0x7au8; 32];
                ikm[..8].copy_from_slice(&(i as u64 + 1).to_le_bytes());
                SecretKey::key_gen(&ikm, &[]).expect("keygen")
            })
            .collect();
        let pubkeys: Vec<BlsPublicKey> = secret_keys
            .iter()
            .map(|sk| BlsPublicKey(sk.sk_to_pk().to_bytes()))
            .collect();
        TestCommittee {
            secret_keys,
            committee: SyncCommittee {
                aggregate_pubkey: pubkeys[0].clone(),
                pubkeys,
            },
        }
    })
}

pub fn mainnet() -> &'static ChainSpec {
    ChainSpec::for_chain(MAINNET).expect("mainnet spec")
}

/// Sign a header with the full test committee: all 512 bits set.
pub fn sign_header(header: &BeaconBlockHeader) -> ([u8; 64], [u8; 96]) {
    let spec = mainnet();
    let fork = spec.fork_version_at_slot(header.slot);
    let domain = compute_domain(
        &DOMAIN_SYNC_COMMITTEE,
        &fork,
        &spec.genesis_validators_root,
    );
    let signing_root = compute_signing_root(&hash_beacon_block_header(header), &domain);

    let dst = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";
    let signatures: Vec<_> = committee()
        .secret_keys
        .iter()
        .map(|sk| sk.sign(&signing_root, dst, &[]))
        .collect();
    let refs: Vec<_> = signatures.iter().collect();
    let aggregate = AggregateSignature::aggregate(&refs, false)
        .expect("aggregate")
        .to_signature();

    ([0xffu8; 64], aggregate.to_bytes())
}

/// A header at the given slot whose body root is `body_root`, signed by
/// the test committee.
pub fn signed_header(slot: u64, body_root: [u8; 32]) -> (BeaconBlockHeader, [u8; 64], [u8; 96]) {
    let header = BeaconBlockHeader {
        slot,
        proposer_index: 9000,
        parent_root: [0x0a; 32],
        state_root: [0x0b; 32],
        body_root,
    };
    let (bits, signature) = sign_header(&header);
    (header, bits, signature)
}

/// SSZ leaf of a u64 payload field.
pub fn uint_leaf(value: u64) -> [u8; 32] {
    let mut leaf = [0u8; 32];
    leaf[..8].copy_from_slice(&value.to_le_bytes());
    leaf
}

/// A slot deep in the Deneb era, and its sync committee period.
pub const TEST_SLOT: u64 = 9_000_000;

pub fn test_period() -> u64 {
    mainnet().period_of_slot(TEST_SLOT)
}
