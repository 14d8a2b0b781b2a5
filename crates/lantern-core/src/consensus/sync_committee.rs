use tracing::debug;

use crate::consensus::committee_cache::CommitteeKeys;
use crate::error::{Result, VerifyError};
use crate::ssz::hash::{merkleize, sha256, sha256_pair};
use crate::ssz::merkle::verify_single_proof;
use crate::ssz::schemas::NEXT_SYNC_COMMITTEE_GINDEX;
use crate::types::beacon::*;
use crate::types::chain::ChainSpec;

/// Compute the signing root for an already-hashed object.
/// This is what the sync committee actually signs: not the header root
/// directly, but `hash_tree_root(SigningData{object_root, domain})`.
pub fn compute_signing_root(object_root: &[u8; 32], domain: &[u8; 32]) -> [u8; 32] {
    sha256_pair(object_root, domain)
}

/// Compute the signing domain for sync committee signatures:
/// `domain_type + fork_data_root[:28]`.
pub fn compute_domain(
    domain_type: &[u8; 4],
    fork_version: &[u8; 4],
    genesis_validators_root: &[u8; 32],
) -> [u8; 32] {
    let fork_data_root = compute_fork_data_root(fork_version, genesis_validators_root);
    let mut domain = [0u8; 32];
    domain[..4].copy_from_slice(domain_type);
    domain[4..].copy_from_slice(&fork_data_root[..28]);
    domain
}

/// Compute the fork data root from fork version and genesis validators root.
fn compute_fork_data_root(
    fork_version: &[u8; 4],
    genesis_validators_root: &[u8; 32],
) -> [u8; 32] {
    let mut data = [0u8; 64];
    // SSZ encode: fork_version padded to 32 bytes, then genesis_validators_root
    data[..4].copy_from_slice(fork_version);
    data[32..].copy_from_slice(genesis_validators_root);
    sha256(&data)
}

/// SSZ hash_tree_root of a beacon block header: five 32-byte leaves padded
/// to eight.
pub fn hash_beacon_block_header(header: &BeaconBlockHeader) -> [u8; 32] {
    let zero = [0u8; 32];

    let h01 = sha256_pair(&uint64_to_leaf(header.slot), &uint64_to_leaf(header.proposer_index));
    let h23 = sha256_pair(&header.parent_root, &header.state_root);
    let h45 = sha256_pair(&header.body_root, &zero);
    let h67 = sha256_pair(&zero, &zero);

    sha256_pair(&sha256_pair(&h01, &h23), &sha256_pair(&h45, &h67))
}

/// SSZ hash_tree_root of a sync committee: the 512 pubkey subtree roots
/// merkleized, paired with the aggregate pubkey root.
pub fn hash_sync_committee(committee: &SyncCommittee) -> Result<[u8; 32]> {
    committee
        .validate()
        .map_err(|e| VerifyError::invalid(e.to_string()))?;
    let leaves: Vec<[u8; 32]> = committee
        .pubkeys
        .iter()
        .map(|pk| pubkey_root(&pk.0))
        .collect();
    let pubkeys_root = merkleize(&leaves, SYNC_COMMITTEE_SIZE)?;
    Ok(sha256_pair(
        &pubkeys_root,
        &pubkey_root(&committee.aggregate_pubkey.0),
    ))
}

/// A 48-byte pubkey spans two SSZ chunks: 32 bytes, then 16 plus padding.
fn pubkey_root(pubkey: &[u8; 48]) -> [u8; 32] {
    let mut left = [0u8; 32];
    let mut right = [0u8; 32];
    left.copy_from_slice(&pubkey[..32]);
    right[..16].copy_from_slice(&pubkey[32..]);
    sha256_pair(&left, &right)
}

/// Verify that a beacon block header is signed by a supermajority of the
/// given sync committee. This is the trust anchor of every L1 proof: if
/// this passes, everything bound to the header's roots is authentic.
pub fn verify_header_signature(
    spec: &ChainSpec,
    header: &BeaconBlockHeader,
    aggregate: &SyncAggregate,
    keys: &CommitteeKeys,
) -> Result<()> {
    check_participation(aggregate)?;

    let fork_version = spec.fork_version_at_slot(header.slot);
    let domain = compute_domain(
        &DOMAIN_SYNC_COMMITTEE,
        &fork_version,
        &spec.genesis_validators_root,
    );
    let header_root = hash_beacon_block_header(header);
    let signing_root = compute_signing_root(&header_root, &domain);

    verify_aggregate_signature(keys, aggregate, &signing_root)?;
    debug!(
        slot = header.slot,
        participants = aggregate.num_participants(),
        "header signature verified"
    );
    Ok(())
}

/// Verify one committee handover record against the committee that signed
/// it. Returns the period the new committee takes over.
pub fn verify_committee_update(
    spec: &ChainSpec,
    update: &CommitteeUpdate,
    signing_keys: &CommitteeKeys,
) -> Result<u64> {
    if update.signature_slot <= update.attested_header.slot {
        return Err(VerifyError::invalid(format!(
            "signature slot {} is not after attested slot {}",
            update.signature_slot, update.attested_header.slot
        )));
    }
    check_participation(&update.sync_aggregate)?;

    // The attested state must commit to the next committee at its
    // well-known generalized index.
    let committee_root = hash_sync_committee(&update.next_sync_committee)?;
    verify_single_proof(
        &update.next_sync_committee_branch,
        &committee_root,
        NEXT_SYNC_COMMITTEE_GINDEX,
        &update.attested_header.state_root,
        "next sync committee branch",
    )?;

    let fork_version = spec.fork_version_at_slot(update.signature_slot);
    let domain = compute_domain(
        &DOMAIN_SYNC_COMMITTEE,
        &fork_version,
        &spec.genesis_validators_root,
    );
    let header_root = hash_beacon_block_header(&update.attested_header);
    let signing_root = compute_signing_root(&header_root, &domain);
    verify_aggregate_signature(signing_keys, &update.sync_aggregate, &signing_root)?;

    Ok(spec.period_of_slot(update.attested_header.slot) + 1)
}

fn check_participation(aggregate: &SyncAggregate) -> Result<()> {
    let participants = aggregate.num_participants();
    if participants < MIN_SYNC_COMMITTEE_PARTICIPANTS {
        return Err(VerifyError::bad_signature(format!(
            "insufficient sync committee participation: {participants}/{SYNC_COMMITTEE_SIZE} \
             (need at least {MIN_SYNC_COMMITTEE_PARTICIPANTS})"
        )));
    }
    Ok(())
}

/// Verify an aggregate BLS12-381 signature over the participant subset.
/// A single wrong bit or pubkey fails the whole verification.
fn verify_aggregate_signature(
    keys: &CommitteeKeys,
    aggregate: &SyncAggregate,
    message: &[u8; 32],
) -> Result<()> {
    use blst::min_pk::{AggregatePublicKey, PublicKey, Signature};
    use blst::BLST_ERROR;

    let sig = Signature::from_bytes(&aggregate.sync_committee_signature.0).map_err(|e| {
        VerifyError::bad_signature(format!("failed to deserialize signature: {e:?}"))
    })?;

    let participants = aggregate.participant_indices();
    let pks: Vec<PublicKey> = participants
        .iter()
        .map(|&i| {
            PublicKey::from_bytes(keys.pubkey(i)).map_err(|e| {
                VerifyError::bad_signature(format!("invalid BLS public key at index {i}: {e:?}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let pk_refs: Vec<&PublicKey> = pks.iter().collect();

    let agg_pk = AggregatePublicKey::aggregate(&pk_refs, false).map_err(|e| {
        VerifyError::bad_signature(format!("failed to aggregate public keys: {e:?}"))
    })?;
    let agg_pk = agg_pk.to_public_key();

    // DST (domain separation tag) for Ethereum BLS signatures
    let dst = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";
    let result = sig.verify(false, message, dst, &[], &agg_pk, false);
    if result != BLST_ERROR::BLST_SUCCESS {
        return Err(VerifyError::bad_signature(
            "aggregate signature does not verify against the participating committee members",
        ));
    }
    Ok(())
}

/// Encode a u64 as a 32-byte SSZ leaf (little-endian, zero-padded).
fn uint64_to_leaf(value: u64) -> [u8; 32] {
    let mut leaf = [0u8; 32];
    leaf[..8].copy_from_slice(&value.to_le_bytes());
    leaf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssz::schemas::BEACON_HEADER;
    use crate::ssz::{hash_tree_root, View};
    use crate::types::chain::MAINNET;

    #[test]
    fn test_uint64_to_leaf() {
        let leaf = uint64_to_leaf(42);
        assert_eq!(leaf[0], 42);
        assert_eq!(leaf[1..8], [0; 7]);
        assert_eq!(leaf[8..32], [0; 24]);
    }

    #[test]
    fn test_compute_domain() {
        let domain = compute_domain(
            &DOMAIN_SYNC_COMMITTEE,
            &[0x04, 0x00, 0x00, 0x00],
            &[0xaa; 32],
        );
        assert_eq!(&domain[..4], &DOMAIN_SYNC_COMMITTEE);
        let domain2 = compute_domain(
            &DOMAIN_SYNC_COMMITTEE,
            &[0x04, 0x00, 0x00, 0x00],
            &[0xaa; 32],
        );
        assert_eq!(domain, domain2);
    }

    #[test]
    fn test_header_root_matches_generic_ssz() {
        let header = BeaconBlockHeader {
            slot: 123_456,
            proposer_index: 42,
            parent_root: [0x11; 32],
            state_root: [0x22; 32],
            body_root: [0x33; 32],
        };
        let mut encoded = Vec::new();
        encoded.extend_from_slice(&header.slot.to_le_bytes());
        encoded.extend_from_slice(&header.proposer_index.to_le_bytes());
        encoded.extend_from_slice(&header.parent_root);
        encoded.extend_from_slice(&header.state_root);
        encoded.extend_from_slice(&header.body_root);
        let view = View::new(&BEACON_HEADER, &encoded).unwrap();
        assert_eq!(
            hash_beacon_block_header(&header),
            hash_tree_root(view).unwrap()
        );
    }

    #[test]
    fn test_insufficient_participation_rejected() {
        let spec = ChainSpec::for_chain(MAINNET).unwrap();
        let mut bits = [0u8; 64];
        for byte in bits.iter_mut().take(12) {
            *byte = 0xff; // 96 participants
        }
        bits[12] = 0x0f; // 4 more = 100
        let aggregate = SyncAggregate {
            sync_committee_bits: bits,
            sync_committee_signature: BlsSignature([0u8; 96]),
        };
        assert_eq!(aggregate.num_participants(), 100);

        let header = BeaconBlockHeader {
            slot: 100,
            proposer_index: 1,
            parent_root: [0; 32],
            state_root: [0; 32],
            body_root: [0; 32],
        };
        let keys = CommitteeKeys::zeroed();
        let result = verify_header_signature(spec, &header, &aggregate, &keys);
        assert!(matches!(result, Err(VerifyError::BadSignature { .. })));
    }

    #[test]
    fn test_sync_committee_root_structure() {
        let committee = SyncCommittee {
            pubkeys: vec![BlsPublicKey([0u8; 48]); 512],
            aggregate_pubkey: BlsPublicKey([0u8; 48]),
        };
        let root = hash_sync_committee(&committee).unwrap();
        // All-zero keys still merkleize to a structured, non-zero root
        assert_ne!(root, [0u8; 32]);

        let short = SyncCommittee {
            pubkeys: vec![BlsPublicKey([0u8; 48]); 511],
            aggregate_pubkey: BlsPublicKey([0u8; 48]),
        };
        assert!(hash_sync_committee(&short).is_err());
    }

    #[test]
    fn test_update_slot_ordering_enforced() {
        let spec = ChainSpec::for_chain(MAINNET).unwrap();
        let update = CommitteeUpdate {
            attested_header: BeaconBlockHeader {
                slot: 100,
                proposer_index: 1,
                parent_root: [0; 32],
                state_root: [0; 32],
                body_root: [0; 32],
            },
            next_sync_committee: SyncCommittee {
                pubkeys: vec![BlsPublicKey([0u8; 48]); 512],
                aggregate_pubkey: BlsPublicKey([0u8; 48]),
            },
            next_sync_committee_branch: vec![[0u8; 32]; 5],
            sync_aggregate: SyncAggregate {
                sync_committee_bits: [0xff; 64],
                sync_committee_signature: BlsSignature([0u8; 96]),
            },
            signature_slot: 100, // not after the attested slot
        };
        let keys = CommitteeKeys::zeroed();
        assert!(matches!(
            verify_committee_update(spec, &update, &keys),
            Err(VerifyError::InvalidProof { .. })
        ));
    }
}
