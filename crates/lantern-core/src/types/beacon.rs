use bitvec::prelude::{BitSlice, Lsb0};
use serde::{Deserialize, Serialize};

/// Number of validators in the Ethereum beacon chain sync committee.
pub const SYNC_COMMITTEE_SIZE: usize = 512;

/// Number of bytes in a BLS12-381 public key (compressed).
pub const BLS_PUBKEY_LEN: usize = 48;

/// Number of bytes in a BLS12-381 signature (compressed).
pub const BLS_SIGNATURE_LEN: usize = 96;

/// Domain type for sync committee signatures.
pub const DOMAIN_SYNC_COMMITTEE: [u8; 4] = [0x07, 0x00, 0x00, 0x00];

/// Minimum number of sync committee participants required (2/3 of 512).
pub const MIN_SYNC_COMMITTEE_PARTICIPANTS: usize = 342;

/// A BLS12-381 public key (48 bytes, compressed G1 point).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlsPublicKey(pub [u8; BLS_PUBKEY_LEN]);

impl Serialize for BlsPublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for BlsPublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl BlsPublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != BLS_PUBKEY_LEN {
            return Err("Invalid BLS public key length");
        }
        let mut arr = [0u8; BLS_PUBKEY_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

/// A BLS12-381 signature (96 bytes, compressed G2 point).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlsSignature(pub [u8; BLS_SIGNATURE_LEN]);

impl Serialize for BlsSignature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for BlsSignature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl BlsSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != BLS_SIGNATURE_LEN {
            return Err("Invalid BLS signature length");
        }
        let mut arr = [0u8; BLS_SIGNATURE_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

/// A beacon chain block header.
/// Five fields, every one of which participates in the hash tree root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlockHeader {
    /// Slot number of this block.
    pub slot: u64,
    /// Index of the validator who proposed this block.
    pub proposer_index: u64,
    /// Root hash of the parent beacon block.
    pub parent_root: [u8; 32],
    /// Root hash of the beacon state after processing this block.
    pub state_root: [u8; 32],
    /// Root hash of the block body. Everything an execution proof binds to
    /// hangs off this root.
    pub body_root: [u8; 32],
}

/// The sync committee: 512 validators that sign off on the chain head.
/// Rotates every period (roughly 27 hours on mainnet).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCommittee {
    /// 512 BLS public keys of committee members.
    pub pubkeys: Vec<BlsPublicKey>,
    /// Aggregated public key for fast signature verification.
    pub aggregate_pubkey: BlsPublicKey,
}

impl SyncCommittee {
    /// Validate the sync committee has the correct number of members.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.pubkeys.len() != SYNC_COMMITTEE_SIZE {
            return Err("Sync committee must have exactly 512 members");
        }
        Ok(())
    }
}

/// The aggregate BLS signature from the sync committee, together with the
/// 512-bit participation bitvector (SSZ bit order, least significant first).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncAggregate {
    pub sync_committee_bits: [u8; 64],
    pub sync_committee_signature: BlsSignature,
}

impl SyncAggregate {
    fn bits(&self) -> &BitSlice<u8, Lsb0> {
        BitSlice::from_slice(&self.sync_committee_bits)
    }

    /// Count how many sync committee members participated (set bits).
    pub fn num_participants(&self) -> usize {
        self.bits().count_ones()
    }

    /// Check if a specific committee member (by index) participated.
    pub fn has_participant(&self, index: usize) -> bool {
        index < SYNC_COMMITTEE_SIZE && self.bits()[index]
    }

    /// Get the indices of all participating committee members.
    pub fn participant_indices(&self) -> Vec<usize> {
        self.bits().iter_ones().collect()
    }
}

/// A committee handover record carried in the request's sync data.
///
/// Proves that the committee of the attested header's period vouched for
/// `next_sync_committee`, letting the verifier extend its committee cache
/// one period forward. Every field must be verified before the cache
/// accepts the new keys.
#[derive(Clone, Debug)]
pub struct CommitteeUpdate {
    /// The header the current committee is attesting to.
    pub attested_header: BeaconBlockHeader,
    /// The committee taking over at the next period boundary.
    pub next_sync_committee: SyncCommittee,
    /// Merkle branch proving next_sync_committee against the beacon state.
    pub next_sync_committee_branch: Vec<[u8; 32]>,
    /// Participation and aggregate signature over the attested header.
    pub sync_aggregate: SyncAggregate,
    /// The slot at which the signature was produced.
    pub signature_slot: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_aggregate_participation() {
        let mut bits = [0u8; 64];
        bits[0] = 0b1111_1111; // First 8 members participated
        bits[1] = 0b0000_0001; // 9th member

        let aggregate = SyncAggregate {
            sync_committee_bits: bits,
            sync_committee_signature: BlsSignature([0u8; 96]),
        };

        assert_eq!(aggregate.num_participants(), 9);
        assert!(aggregate.has_participant(0));
        assert!(aggregate.has_participant(7));
        assert!(aggregate.has_participant(8));
        assert!(!aggregate.has_participant(9));
        assert_eq!(aggregate.participant_indices().len(), 9);
    }

    #[test]
    fn test_committee_size_validation() {
        let committee = SyncCommittee {
            pubkeys: vec![BlsPublicKey([0u8; 48]); 100],
            aggregate_pubkey: BlsPublicKey([0u8; 48]),
        };
        assert!(committee.validate().is_err());

        let committee = SyncCommittee {
            pubkeys: vec![BlsPublicKey([0u8; 48]); 512],
            aggregate_pubkey: BlsPublicKey([0u8; 48]),
        };
        assert!(committee.validate().is_ok());
    }

    #[test]
    fn test_bls_key_length_checks() {
        assert!(BlsPublicKey::from_bytes(&[0u8; 48]).is_ok());
        assert!(BlsPublicKey::from_bytes(&[0u8; 47]).is_err());
        assert!(BlsSignature::from_bytes(&[0u8; 96]).is_ok());
        assert!(BlsSignature::from_bytes(&[0u8; 95]).is_err());
    }
}
