use serde::Serialize;
use thiserror::Error;

/// Errors produced while verifying a proof envelope.
///
/// Every failure a proof can exhibit collapses into one of these variants.
/// The variant is the stable, programmatic classification; the message
/// carries enough detail to diagnose exactly which link broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// Structural damage: SSZ decode failures, bad union selectors, RLP
    /// decode failures, MPT path mismatches, out-of-range offsets.
    #[error("invalid proof: {reason}")]
    InvalidProof { reason: String },

    /// A recomputed root does not match the root the proof is anchored to.
    #[error("{context}: computed root {computed} does not match expected root {expected}")]
    RootMismatch {
        context: &'static str,
        computed: String,
        expected: String,
    },

    /// BLS verification failed, participation was below threshold, or the
    /// recovered secp256k1 signer is not the configured sequencer.
    #[error("invalid signature: {reason}")]
    BadSignature { reason: String },

    /// No chain spec or sequencer entry exists for the requested chain.
    #[error("unsupported chain id {chain_id}")]
    UnsupportedChain { chain_id: u64 },

    /// No verifier exists for the requested RPC method.
    #[error("unsupported method {method}")]
    UnsupportedMethod { method: String },

    /// A state override the verifier cannot express. Carries the offending
    /// property name so callers can surface a precise message.
    #[error("unsupported state override: {reason}")]
    UnsupportedOverride { reason: String },

    /// The proof covers a different address than the request asked about.
    #[error("address mismatch: proof covers {proof_address}, request asked for {requested}")]
    AddressMismatch {
        proof_address: String,
        requested: String,
    },

    /// Soft failure: the sync-committee cache has no keys for the periods
    /// the proof needs. The host may fetch the missing light-client updates
    /// and retry with augmented sync data.
    #[error("missing sync committee periods {first}..={last}")]
    MissingPeriods { first: u64, last: u64 },
}

/// Stable programmatic classification of a [`VerifyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidProof,
    RootMismatch,
    BadSignature,
    UnsupportedChain,
    UnsupportedMethod,
    UnsupportedOverride,
    AddressMismatch,
    MissingPeriods,
}

impl VerifyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VerifyError::InvalidProof { .. } => ErrorKind::InvalidProof,
            VerifyError::RootMismatch { .. } => ErrorKind::RootMismatch,
            VerifyError::BadSignature { .. } => ErrorKind::BadSignature,
            VerifyError::UnsupportedChain { .. } => ErrorKind::UnsupportedChain,
            VerifyError::UnsupportedMethod { .. } => ErrorKind::UnsupportedMethod,
            VerifyError::UnsupportedOverride { .. } => ErrorKind::UnsupportedOverride,
            VerifyError::AddressMismatch { .. } => ErrorKind::AddressMismatch,
            VerifyError::MissingPeriods { .. } => ErrorKind::MissingPeriods,
        }
    }

    /// True for the one error a host can satisfy by fetching more sync data
    /// and retrying. Every other kind is terminal for the given proof.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VerifyError::MissingPeriods { .. })
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        VerifyError::InvalidProof {
            reason: reason.into(),
        }
    }

    pub(crate) fn root_mismatch(
        context: &'static str,
        computed: &[u8],
        expected: &[u8],
    ) -> Self {
        VerifyError::RootMismatch {
            context,
            computed: format!("0x{}", hex::encode(computed)),
            expected: format!("0x{}", hex::encode(expected)),
        }
    }

    pub(crate) fn bad_signature(reason: impl Into<String>) -> Self {
        VerifyError::BadSignature {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VerifyError>;
