use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::consensus::sync_committee::verify_committee_update;
use crate::error::{Result, VerifyError};
use crate::types::beacon::{CommitteeUpdate, SyncCommittee};
use crate::types::chain::ChainSpec;

/// The resolved public keys of one sync committee period, in the compact
/// form signature verification consumes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitteeKeys {
    pubkeys: Vec<[u8; 48]>,
    aggregate: [u8; 48],
}

impl CommitteeKeys {
    pub fn from_committee(committee: &SyncCommittee) -> Result<Self> {
        committee
            .validate()
            .map_err(|e| VerifyError::invalid(e.to_string()))?;
        Ok(CommitteeKeys {
            pubkeys: committee.pubkeys.iter().map(|pk| pk.0).collect(),
            aggregate: committee.aggregate_pubkey.0,
        })
    }

    pub fn pubkey(&self, index: usize) -> &[u8; 48] {
        &self.pubkeys[index]
    }

    pub fn aggregate(&self) -> &[u8; 48] {
        &self.aggregate
    }

    #[cfg(test)]
    pub(crate) fn zeroed() -> Self {
        CommitteeKeys {
            pubkeys: vec![[0u8; 48]; crate::types::beacon::SYNC_COMMITTEE_SIZE],
            aggregate: [0u8; 48],
        }
    }
}

/// Period-keyed storage of sync-committee public keys.
///
/// The cache is the only shared state in the verifier. Readers are many
/// and lock-free from the verifier's point of view (entries are handed out
/// as `Arc` snapshots); a writer installs a fully built entry atomically.
/// Entries are append-only within a session.
pub trait CommitteeStore: Send + Sync {
    fn get(&self, period: u64) -> Option<Arc<CommitteeKeys>>;
    fn put(&self, period: u64, keys: Arc<CommitteeKeys>);
    /// The newest period with cached keys, if any.
    fn latest_known(&self) -> Option<u64>;
}

/// The default process-wide committee cache.
#[derive(Default)]
pub struct InMemoryCommitteeCache {
    entries: RwLock<BTreeMap<u64, Arc<CommitteeKeys>>>,
}

impl InMemoryCommitteeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install trusted keys for a period without verification. This is the
    /// host's checkpoint-trust step; everything after it is cryptographic.
    pub fn seed(&self, period: u64, committee: &SyncCommittee) -> Result<()> {
        self.put(period, Arc::new(CommitteeKeys::from_committee(committee)?));
        Ok(())
    }
}

impl CommitteeStore for InMemoryCommitteeCache {
    fn get(&self, period: u64) -> Option<Arc<CommitteeKeys>> {
        self.entries
            .read()
            .expect("committee cache poisoned")
            .get(&period)
            .cloned()
    }

    fn put(&self, period: u64, keys: Arc<CommitteeKeys>) {
        self.entries
            .write()
            .expect("committee cache poisoned")
            .insert(period, keys);
    }

    fn latest_known(&self) -> Option<u64> {
        self.entries
            .read()
            .expect("committee cache poisoned")
            .keys()
            .next_back()
            .copied()
    }
}

/// Shared cache used when the host does not supply its own store.
pub static GLOBAL_COMMITTEE_CACHE: Lazy<InMemoryCommitteeCache> =
    Lazy::new(InMemoryCommitteeCache::new);

/// Fetch the committee keys for a period, or report the gap the host needs
/// to fill. This is the verifier's only soft failure.
pub fn resolve_committee(
    store: &dyn CommitteeStore,
    period: u64,
) -> Result<Arc<CommitteeKeys>> {
    if let Some(keys) = store.get(period) {
        return Ok(keys);
    }
    let first = match store.latest_known() {
        Some(latest) if latest + 1 <= period => latest + 1,
        _ => period,
    };
    Err(VerifyError::MissingPeriods {
        first,
        last: period,
    })
}

/// Apply the committee handover records of a request's sync data,
/// extending the cache period by period. Records must be ordered so each
/// one is signed by a committee that is already resolvable.
pub fn process_sync_data(
    spec: &ChainSpec,
    store: &dyn CommitteeStore,
    updates: &[CommitteeUpdate],
) -> Result<()> {
    for update in updates {
        let signing_period = spec.period_of_slot(update.signature_slot);
        let signing_keys = resolve_committee(store, signing_period)?;
        let target_period = verify_committee_update(spec, update, &signing_keys)?;
        store.put(
            target_period,
            Arc::new(CommitteeKeys::from_committee(&update.next_sync_committee)?),
        );
        debug!(period = target_period, "committee cache extended");
    }
    Ok(())
}
