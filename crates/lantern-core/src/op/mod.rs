//! OP-Stack preconfirmation authentication.
//!
//! An OP-Stack block proof is `zstd(domain32 ‖ ssz_payload)` plus a 65-byte
//! secp256k1 signature. The sequencer signs
//! `keccak(domain ‖ chain_id ‖ keccak(ssz_payload))`; recovering that
//! signature and comparing against the chain's configured sequencer
//! address authenticates every root inside the payload.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use tracing::debug;

use crate::error::{Result, VerifyError};
use crate::ssz::schemas::EXECUTION_PAYLOAD;
use crate::ssz::View;
use crate::trie::keccak256;
use crate::types::chain::sequencer_for_chain;

/// Bounds on preconfirmation decompression. The zstd frame header usually
/// declares its content size; when it does not, the verifier probes with
/// growing buffers, and these bounds cap both the probe and the admissible
/// expansion ratio.
#[derive(Clone, Copy, Debug)]
pub struct DecompressPolicy {
    pub max_decompressed: usize,
    pub max_ratio: usize,
}

impl Default for DecompressPolicy {
    fn default() -> Self {
        DecompressPolicy {
            max_decompressed: 16 << 20,
            max_ratio: 128,
        }
    }
}

/// A sequencer-authenticated preconfirmation: the decompressed
/// `domain ‖ ssz_payload` buffer, owned by the verification call.
pub struct PreconfPayload {
    plain: Vec<u8>,
}

impl PreconfPayload {
    /// The 32-byte signing domain the payload was published under.
    pub fn domain(&self) -> &[u8] {
        &self.plain[..32]
    }

    /// Typed view over the embedded Deneb execution payload.
    pub fn payload(&self) -> Result<View<'_>> {
        View::new(&EXECUTION_PAYLOAD, &self.plain[32..])
    }
}

/// Decompress a preconfirmation frame within the policy bounds.
pub fn decompress(compressed: &[u8], policy: &DecompressPolicy) -> Result<Vec<u8>> {
    if compressed.is_empty() {
        return Err(VerifyError::invalid("empty compressed payload"));
    }
    let max_allowed = policy
        .max_decompressed
        .min(policy.max_ratio.saturating_mul(compressed.len()));

    let declared = zstd::zstd_safe::get_frame_content_size(compressed)
        .map_err(|e| VerifyError::invalid(format!("corrupt zstd frame: {e:?}")))?;

    if let Some(size) = declared {
        let size = size as usize;
        if size > max_allowed {
            return Err(VerifyError::invalid(format!(
                "declared decompressed size {size} exceeds limit {max_allowed}"
            )));
        }
        return zstd::bulk::decompress(compressed, size)
            .map_err(|e| VerifyError::invalid(format!("zstd decompression failed: {e}")));
    }

    // No declared size: probe with exponentially growing buffers up to the
    // policy bound.
    let mut capacity = 64 * 1024;
    loop {
        let capacity_now = capacity.min(max_allowed);
        match zstd::bulk::decompress(compressed, capacity_now) {
            Ok(plain) => {
                if plain.len() > max_allowed {
                    return Err(VerifyError::invalid(format!(
                        "decompressed size {} exceeds limit {max_allowed}",
                        plain.len()
                    )));
                }
                return Ok(plain);
            }
            Err(_) if capacity_now < max_allowed => capacity *= 2,
            Err(e) => {
                return Err(VerifyError::invalid(format!(
                    "zstd decompression failed within {max_allowed} bytes: {e}"
                )))
            }
        }
    }
}

/// The fixed 96-byte sequencer pre-image:
/// `domain32 ‖ chain_id-as-u256-BE ‖ keccak(ssz_payload)`.
fn signing_digest(domain: &[u8], chain_id: u64, payload_hash: &[u8; 32]) -> [u8; 32] {
    let mut preimage = [0u8; 96];
    preimage[..32].copy_from_slice(domain);
    preimage[56..64].copy_from_slice(&chain_id.to_be_bytes());
    preimage[64..96].copy_from_slice(payload_hash);
    keccak256(&preimage)
}

/// Recover the signer address of a 65-byte `(r ‖ s ‖ v)` signature over a
/// 32-byte digest. `v` is accepted as 0/1 or 27/28.
pub fn recover_signer(digest: &[u8; 32], signature: &[u8]) -> Result<[u8; 20]> {
    if signature.len() != 65 {
        return Err(VerifyError::invalid(format!(
            "signature must be 65 bytes, got {}",
            signature.len()
        )));
    }
    let v = match signature[64] {
        v @ 0..=1 => v,
        v @ 27..=28 => v - 27,
        v => {
            return Err(VerifyError::bad_signature(format!(
                "invalid recovery id {v}"
            )))
        }
    };
    let recovery_id = RecoveryId::from_byte(v)
        .ok_or_else(|| VerifyError::bad_signature("invalid recovery id"))?;
    let signature = Signature::from_slice(&signature[..64])
        .map_err(|e| VerifyError::bad_signature(format!("malformed signature: {e}")))?;
    let key = VerifyingKey::recover_from_prehash(digest, &signature, recovery_id)
        .map_err(|e| VerifyError::bad_signature(format!("recovery failed: {e}")))?;

    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Ok(address)
}

/// Verify an OP-Stack block proof: decompress, recover the sequencer
/// signature, and compare against the chain's configured sequencer.
/// Returns the authenticated payload for further inspection.
pub fn verify_preconf(
    chain_id: u64,
    compressed: &[u8],
    signature: &[u8],
    policy: &DecompressPolicy,
) -> Result<PreconfPayload> {
    let expected_sequencer =
        sequencer_for_chain(chain_id).ok_or(VerifyError::UnsupportedChain { chain_id })?;

    let plain = decompress(compressed, policy)?;
    if plain.len() < 32 {
        return Err(VerifyError::invalid(format!(
            "preconfirmation payload too short: {} bytes",
            plain.len()
        )));
    }

    let payload_hash = keccak256(&plain[32..]);
    let digest = signing_digest(&plain[..32], chain_id, &payload_hash);
    let recovered = recover_signer(&digest, signature)?;

    if recovered != expected_sequencer {
        return Err(VerifyError::bad_signature(format!(
            "invalid sequencer signature: recovered 0x{}, expected 0x{}",
            hex::encode(recovered),
            hex::encode(expected_sequencer)
        )));
    }
    debug!(chain_id, "sequencer signature verified");

    Ok(PreconfPayload { plain })
}
