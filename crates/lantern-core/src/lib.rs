//! # Lantern Core
//!
//! Stateless proof verification for Ethereum and OP-Stack chains.
//!
//! This crate contains **no networking code** and fetches nothing. A
//! caller presents a JSON-RPC request together with a compact binary
//! proof envelope; the verifier reconstructs the claimed value from the
//! proof and checks every cryptographic link up to a signed beacon block
//! header (L1) or a sequencer-signed execution payload (OP-Stack). No
//! trust is placed in the RPC server that produced the data.
//!
//! ## Trust Model
//!
//! - **L1 (`consensus` module)**: a beacon header counts as authentic
//!   when 2/3+ of the 512-member sync committee signed it, the same
//!   assumption Ethereum light clients make. Committee keys are resolved
//!   per period from a host-seeded cache.
//!
//! - **OP-Stack (`op` module)**: an execution payload counts as
//!   authentic when the chain's configured sequencer signed it.
//!
//! - **Everything else** is zero-trust: SSZ Merkle proofs and
//!   Merkle-Patricia trie walks from the claimed values up to the
//!   authenticated roots, with any mismatch rejecting the proof.
//!
//! ## Usage
//!
//! ```ignore
//! use lantern_core::{verify_request, GLOBAL_COMMITTEE_CACHE};
//!
//! let report = verify_request(&proof_bytes, "eth_getBalance", args, 1, &*GLOBAL_COMMITTEE_CACHE);
//! assert!(report.success);
//! ```

pub mod consensus;
pub mod error;
pub mod op;
pub mod ssz;
pub mod trie;
pub mod types;
pub mod verifier;
pub mod verifiers;

// Re-export commonly used types for convenience
pub use consensus::{
    committee_cache::{
        CommitteeKeys, CommitteeStore, InMemoryCommitteeCache, GLOBAL_COMMITTEE_CACHE,
    },
    sync_committee::{verify_committee_update, verify_header_signature},
};
pub use error::{ErrorKind, VerifyError};
pub use op::{DecompressPolicy, PreconfPayload};
pub use trie::keccak256;
pub use types::{beacon::*, chain::*, execution::*, request::*};
pub use verifier::{verify_request, verify_request_with, VerificationReport, VerifyOptions};
