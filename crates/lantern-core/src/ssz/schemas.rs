//! Static SSZ schemas for the proof envelope and the beacon structures it
//! binds to, plus the generalized-index constants of the Deneb block
//! layout. The constants are protocol, not implementation: re-deriving
//! them at runtime is a test-only activity.

use super::def::{Field, TypeDef};

// =============================================================================
// Primitive building blocks
// =============================================================================

pub static UINT64: TypeDef = TypeDef::Uint(8);
pub static UINT256: TypeDef = TypeDef::Uint(32);
pub static BYTES4: TypeDef = TypeDef::Bytes(4);
pub static BYTES20: TypeDef = TypeDef::Bytes(20);
pub static BYTES32: TypeDef = TypeDef::Bytes(32);
pub static BYTES48: TypeDef = TypeDef::Bytes(48);
pub static BYTES65: TypeDef = TypeDef::Bytes(65);
pub static BYTES96: TypeDef = TypeDef::Bytes(96);
pub static BYTES256: TypeDef = TypeDef::Bytes(256);
pub static SYNC_BITS: TypeDef = TypeDef::BitVector(512);

/// One RLP trie node of the account or storage trie.
static TRIE_NODE: TypeDef = TypeDef::ByteList(2048);
/// One RLP trie node of the receipts trie. Receipt leaves embed full logs.
static RECEIPT_TRIE_NODE: TypeDef = TypeDef::ByteList(1 << 20);
/// A raw EIP-2718 transaction envelope.
pub static TRANSACTION: TypeDef = TypeDef::ByteList(1 << 30);
/// Deployed contract code.
static CONTRACT_CODE: TypeDef = TypeDef::ByteList(1 << 24);
static EXTRA_DATA: TypeDef = TypeDef::ByteList(32);

static TRIE_NODES: TypeDef = TypeDef::List { elem: &TRIE_NODE, max: 64 };
static RECEIPT_TRIE_NODES: TypeDef = TypeDef::List { elem: &RECEIPT_TRIE_NODE, max: 64 };
/// Sibling witnesses of a single- or multi-leaf SSZ Merkle proof.
static WITNESS_NODES: TypeDef = TypeDef::List { elem: &BYTES32, max: 64 };
/// The fixed-depth branch from the payload state root up to the body root.
static STATE_ROOT_BRANCH: TypeDef = TypeDef::Vector { elem: &BYTES32, len: 9 };
/// The fixed-depth branch from the payload root up to the body root.
static PAYLOAD_BRANCH: TypeDef = TypeDef::Vector { elem: &BYTES32, len: 4 };

// =============================================================================
// Beacon structures (Deneb)
// =============================================================================

pub static BEACON_HEADER: TypeDef = TypeDef::Container {
    name: "BeaconBlockHeader",
    fields: &[
        Field { name: "slot", def: &UINT64 },
        Field { name: "proposer_index", def: &UINT64 },
        Field { name: "parent_root", def: &BYTES32 },
        Field { name: "state_root", def: &BYTES32 },
        Field { name: "body_root", def: &BYTES32 },
    ],
};

static PUBKEYS: TypeDef = TypeDef::Vector { elem: &BYTES48, len: 512 };

pub static SYNC_COMMITTEE: TypeDef = TypeDef::Container {
    name: "SyncCommittee",
    fields: &[
        Field { name: "pubkeys", def: &PUBKEYS },
        Field { name: "aggregate_pubkey", def: &BYTES48 },
    ],
};

static WITHDRAWAL: TypeDef = TypeDef::Container {
    name: "Withdrawal",
    fields: &[
        Field { name: "index", def: &UINT64 },
        Field { name: "validator_index", def: &UINT64 },
        Field { name: "address", def: &BYTES20 },
        Field { name: "amount", def: &UINT64 },
    ],
};

static TRANSACTIONS: TypeDef = TypeDef::List { elem: &TRANSACTION, max: 1 << 20 };
static WITHDRAWALS: TypeDef = TypeDef::List { elem: &WITHDRAWAL, max: 16 };

/// The Deneb execution payload: the execution-layer block as the beacon
/// chain commits to it.
pub static EXECUTION_PAYLOAD: TypeDef = TypeDef::Container {
    name: "ExecutionPayload",
    fields: &[
        Field { name: "parent_hash", def: &BYTES32 },
        Field { name: "fee_recipient", def: &BYTES20 },
        Field { name: "state_root", def: &BYTES32 },
        Field { name: "receipts_root", def: &BYTES32 },
        Field { name: "logs_bloom", def: &BYTES256 },
        Field { name: "prev_randao", def: &BYTES32 },
        Field { name: "block_number", def: &UINT64 },
        Field { name: "gas_limit", def: &UINT64 },
        Field { name: "gas_used", def: &UINT64 },
        Field { name: "timestamp", def: &UINT64 },
        Field { name: "extra_data", def: &EXTRA_DATA },
        Field { name: "base_fee_per_gas", def: &UINT256 },
        Field { name: "block_hash", def: &BYTES32 },
        Field { name: "transactions", def: &TRANSACTIONS },
        Field { name: "withdrawals", def: &WITHDRAWALS },
        Field { name: "blob_gas_used", def: &UINT64 },
        Field { name: "excess_blob_gas", def: &UINT64 },
    ],
};

// =============================================================================
// Sync data
// =============================================================================

static COMMITTEE_BRANCH: TypeDef = TypeDef::Vector { elem: &BYTES32, len: 5 };

/// One committee handover: the signing committee attests to a header whose
/// state contains the next committee.
pub static COMMITTEE_UPDATE: TypeDef = TypeDef::Container {
    name: "CommitteeUpdate",
    fields: &[
        Field { name: "attested_header", def: &BEACON_HEADER },
        Field { name: "next_sync_committee", def: &SYNC_COMMITTEE },
        Field { name: "next_sync_committee_branch", def: &COMMITTEE_BRANCH },
        Field { name: "sync_committee_bits", def: &SYNC_BITS },
        Field { name: "sync_committee_signature", def: &BYTES96 },
        Field { name: "signature_slot", def: &UINT64 },
    ],
};

static COMMITTEE_UPDATES: TypeDef = TypeDef::List { elem: &COMMITTEE_UPDATE, max: 16 };

pub static SYNC_DATA_UNION: TypeDef = TypeDef::Union {
    variants: &[&TypeDef::None, &COMMITTEE_UPDATES],
};

// =============================================================================
// L1 proof containers
// =============================================================================

static STORAGE_PROOF_ENTRY: TypeDef = TypeDef::Container {
    name: "StorageProofEntry",
    fields: &[
        Field { name: "key", def: &BYTES32 },
        Field { name: "proof", def: &TRIE_NODES },
    ],
};

static STORAGE_PROOFS: TypeDef = TypeDef::List { elem: &STORAGE_PROOF_ENTRY, max: 4096 };

pub static ACCOUNT_PROOF: TypeDef = TypeDef::Container {
    name: "AccountProof",
    fields: &[
        Field { name: "address", def: &BYTES20 },
        Field { name: "account_proof", def: &TRIE_NODES },
        Field { name: "storage_proofs", def: &STORAGE_PROOFS },
        Field { name: "state_proof", def: &STATE_ROOT_BRANCH },
        Field { name: "header", def: &BEACON_HEADER },
        Field { name: "sync_committee_bits", def: &SYNC_BITS },
        Field { name: "sync_committee_signature", def: &BYTES96 },
    ],
};

pub static TRANSACTION_PROOF: TypeDef = TypeDef::Container {
    name: "TransactionProof",
    fields: &[
        Field { name: "transaction", def: &TRANSACTION },
        Field { name: "transaction_index", def: &UINT64 },
        Field { name: "block_number", def: &UINT64 },
        Field { name: "block_hash", def: &BYTES32 },
        Field { name: "proof", def: &WITNESS_NODES },
        Field { name: "header", def: &BEACON_HEADER },
        Field { name: "sync_committee_bits", def: &SYNC_BITS },
        Field { name: "sync_committee_signature", def: &BYTES96 },
    ],
};

pub static RECEIPT_PROOF: TypeDef = TypeDef::Container {
    name: "ReceiptProof",
    fields: &[
        Field { name: "transaction", def: &TRANSACTION },
        Field { name: "transaction_index", def: &UINT64 },
        Field { name: "block_number", def: &UINT64 },
        Field { name: "block_hash", def: &BYTES32 },
        Field { name: "receipt_proof", def: &RECEIPT_TRIE_NODES },
        Field { name: "block_proof", def: &WITNESS_NODES },
        Field { name: "header", def: &BEACON_HEADER },
        Field { name: "sync_committee_bits", def: &SYNC_BITS },
        Field { name: "sync_committee_signature", def: &BYTES96 },
    ],
};

static LOGS_TX: TypeDef = TypeDef::Container {
    name: "LogsTx",
    fields: &[
        Field { name: "transaction", def: &TRANSACTION },
        Field { name: "transaction_index", def: &UINT64 },
        Field { name: "proof", def: &RECEIPT_TRIE_NODES },
    ],
};

static LOGS_TXS: TypeDef = TypeDef::List { elem: &LOGS_TX, max: 1024 };

static LOGS_BLOCK: TypeDef = TypeDef::Container {
    name: "LogsBlock",
    fields: &[
        Field { name: "block_number", def: &UINT64 },
        Field { name: "block_hash", def: &BYTES32 },
        Field { name: "proof", def: &WITNESS_NODES },
        Field { name: "header", def: &BEACON_HEADER },
        Field { name: "sync_committee_bits", def: &SYNC_BITS },
        Field { name: "sync_committee_signature", def: &BYTES96 },
        Field { name: "txs", def: &LOGS_TXS },
    ],
};

static LOGS_BLOCKS: TypeDef = TypeDef::List { elem: &LOGS_BLOCK, max: 256 };

pub static LOGS_PROOF: TypeDef = TypeDef::Container {
    name: "LogsProof",
    fields: &[Field { name: "blocks", def: &LOGS_BLOCKS }],
};

static CALL_ACCOUNT: TypeDef = TypeDef::Container {
    name: "CallAccount",
    fields: &[
        Field { name: "address", def: &BYTES20 },
        Field { name: "account_proof", def: &TRIE_NODES },
        Field { name: "storage_proofs", def: &STORAGE_PROOFS },
    ],
};

static CALL_ACCOUNTS: TypeDef = TypeDef::List { elem: &CALL_ACCOUNT, max: 256 };
static CONTRACT_CODES: TypeDef = TypeDef::List { elem: &CONTRACT_CODE, max: 256 };

/// Proof for `eth_call`: every account and storage slot the call touches,
/// authenticated under one state root. The same shape serves witness
/// proofs, which authenticate the touched set without a call result.
pub static CALL_PROOF: TypeDef = TypeDef::Container {
    name: "CallProof",
    fields: &[
        Field { name: "accounts", def: &CALL_ACCOUNTS },
        Field { name: "codes", def: &CONTRACT_CODES },
        Field { name: "state_proof", def: &STATE_ROOT_BRANCH },
        Field { name: "header", def: &BEACON_HEADER },
        Field { name: "sync_committee_bits", def: &SYNC_BITS },
        Field { name: "sync_committee_signature", def: &BYTES96 },
    ],
};

static PAYLOAD_BYTES: TypeDef = TypeDef::ByteList(1 << 27);

pub static BLOCK_PROOF: TypeDef = TypeDef::Container {
    name: "BlockProof",
    fields: &[
        Field { name: "execution_payload", def: &PAYLOAD_BYTES },
        Field { name: "proof", def: &PAYLOAD_BRANCH },
        Field { name: "header", def: &BEACON_HEADER },
        Field { name: "sync_committee_bits", def: &SYNC_BITS },
        Field { name: "sync_committee_signature", def: &BYTES96 },
    ],
};

pub static BLOCK_NUMBER_PROOF: TypeDef = TypeDef::Container {
    name: "BlockNumberProof",
    fields: &[
        Field { name: "block_number", def: &UINT64 },
        Field { name: "block_hash", def: &BYTES32 },
        Field { name: "proof", def: &WITNESS_NODES },
        Field { name: "header", def: &BEACON_HEADER },
        Field { name: "sync_committee_bits", def: &SYNC_BITS },
        Field { name: "sync_committee_signature", def: &BYTES96 },
    ],
};

// =============================================================================
// OP-Stack proof containers
// =============================================================================

/// `zstd(domain32 ‖ ssz_payload)` followed by the sequencer's signature.
static COMPRESSED_PAYLOAD: TypeDef = TypeDef::ByteList(1 << 24);

pub static OP_BLOCK_PROOF: TypeDef = TypeDef::Container {
    name: "OpBlockProof",
    fields: &[
        Field { name: "payload", def: &COMPRESSED_PAYLOAD },
        Field { name: "signature", def: &BYTES65 },
    ],
};

pub static OP_ACCOUNT_PROOF: TypeDef = TypeDef::Container {
    name: "OpAccountProof",
    fields: &[
        Field { name: "address", def: &BYTES20 },
        Field { name: "account_proof", def: &TRIE_NODES },
        Field { name: "storage_proofs", def: &STORAGE_PROOFS },
        Field { name: "block", def: &OP_BLOCK_PROOF },
    ],
};

pub static OP_TRANSACTION_PROOF: TypeDef = TypeDef::Container {
    name: "OpTransactionProof",
    fields: &[
        Field { name: "transaction_index", def: &UINT64 },
        Field { name: "block", def: &OP_BLOCK_PROOF },
    ],
};

pub static OP_RECEIPT_PROOF: TypeDef = TypeDef::Container {
    name: "OpReceiptProof",
    fields: &[
        Field { name: "transaction_index", def: &UINT64 },
        Field { name: "receipt_proof", def: &RECEIPT_TRIE_NODES },
        Field { name: "block", def: &OP_BLOCK_PROOF },
    ],
};

static OP_LOGS_BLOCK: TypeDef = TypeDef::Container {
    name: "OpLogsBlock",
    fields: &[
        Field { name: "block", def: &OP_BLOCK_PROOF },
        Field { name: "txs", def: &LOGS_TXS },
    ],
};

static OP_LOGS_BLOCKS: TypeDef = TypeDef::List { elem: &OP_LOGS_BLOCK, max: 64 };

pub static OP_LOGS_PROOF: TypeDef = TypeDef::Container {
    name: "OpLogsProof",
    fields: &[Field { name: "blocks", def: &OP_LOGS_BLOCKS }],
};

pub static OP_CALL_PROOF: TypeDef = TypeDef::Container {
    name: "OpCallProof",
    fields: &[
        Field { name: "accounts", def: &CALL_ACCOUNTS },
        Field { name: "codes", def: &CONTRACT_CODES },
        Field { name: "block", def: &OP_BLOCK_PROOF },
    ],
};

// =============================================================================
// Request envelope
// =============================================================================

static RESULT_BYTES: TypeDef = TypeDef::ByteList(1 << 24);

/// Claimed result payloads. Selector order is wire format.
pub static DATA_UNION: TypeDef = TypeDef::Union {
    variants: &[&TypeDef::None, &BYTES32, &RESULT_BYTES, &UINT256],
};

/// L1 proof kinds. Selector order is wire format; the witness proof shares
/// the call-proof layout.
pub static ETH_PROOF_UNION: TypeDef = TypeDef::Union {
    variants: &[
        &TypeDef::None,
        &ACCOUNT_PROOF,
        &TRANSACTION_PROOF,
        &RECEIPT_PROOF,
        &LOGS_PROOF,
        &CALL_PROOF,
        &BLOCK_PROOF,
        &BLOCK_NUMBER_PROOF,
        &CALL_PROOF,
    ],
};

/// OP-Stack proof kinds. Selector order is wire format.
pub static OP_PROOF_UNION: TypeDef = TypeDef::Union {
    variants: &[
        &TypeDef::None,
        &OP_ACCOUNT_PROOF,
        &OP_TRANSACTION_PROOF,
        &OP_RECEIPT_PROOF,
        &OP_LOGS_PROOF,
        &OP_BLOCK_PROOF,
        &OP_CALL_PROOF,
    ],
};

pub static ETH_REQUEST: TypeDef = TypeDef::Container {
    name: "Request",
    fields: &[
        Field { name: "version", def: &BYTES4 },
        Field { name: "data", def: &DATA_UNION },
        Field { name: "proof", def: &ETH_PROOF_UNION },
        Field { name: "sync_data", def: &SYNC_DATA_UNION },
    ],
};

pub static OP_REQUEST: TypeDef = TypeDef::Container {
    name: "Request",
    fields: &[
        Field { name: "version", def: &BYTES4 },
        Field { name: "data", def: &DATA_UNION },
        Field { name: "proof", def: &OP_PROOF_UNION },
        Field { name: "sync_data", def: &SYNC_DATA_UNION },
    ],
};

// =============================================================================
// Generalized indices (Deneb block layout)
// =============================================================================

/// The execution payload inside the beacon block body (field 9 of 12).
pub const PAYLOAD_GINDEX: u64 = 25;
/// `payload.state_root` relative to the body root.
pub const STATE_ROOT_GINDEX: u64 = 802;
/// `payload.receipts_root` relative to the body root.
pub const RECEIPTS_ROOT_GINDEX: u64 = 803;
/// `payload.block_number` relative to the body root.
pub const BLOCK_NUMBER_GINDEX: u64 = 806;
/// `payload.block_hash` relative to the body root.
pub const BLOCK_HASH_GINDEX: u64 = 812;
/// `payload.transactions` (list root, length mixed in) relative to the body root.
pub const TRANSACTIONS_GINDEX: u64 = 813;
/// `next_sync_committee` inside the beacon state.
pub const NEXT_SYNC_COMMITTEE_GINDEX: u64 = 55;

/// The hash-tree-root of transaction `i` relative to the body root: the
/// transactions list data node sits one level below the length mix-in, and
/// elements hang 20 levels below that (limit 2^20).
pub fn gindex_of_transaction(index: u64) -> u64 {
    (TRANSACTIONS_GINDEX << 21) + index
}
