use hex_literal::hex;

// =============================================================================
// Chain IDs
// =============================================================================

pub const MAINNET: u64 = 1;
pub const SEPOLIA: u64 = 11155111;
pub const GNOSIS: u64 = 100;
pub const OP_MAINNET: u64 = 10;
pub const BASE: u64 = 8453;

/// A scheduled consensus fork: active from `epoch` onward, identified on the
/// wire by its 4-byte version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fork {
    pub epoch: u64,
    pub version: [u8; 4],
}

/// Static per-chain constants needed to authenticate beacon headers.
///
/// `slots_per_epoch` and `epochs_per_period` are expressed as bit shifts:
/// the sync-committee period of a slot is
/// `slot >> (slots_per_epoch_bits + epochs_per_period_bits)`.
#[derive(Clone, Copy, Debug)]
pub struct ChainSpec {
    pub chain_id: u64,
    pub genesis_validators_root: [u8; 32],
    /// Fork schedule in ascending epoch order, genesis first.
    pub forks: &'static [Fork],
    pub slots_per_epoch_bits: u32,
    pub epochs_per_period_bits: u32,
}

impl ChainSpec {
    /// Look up the spec for an L1 chain id. OP-Stack chains have no beacon
    /// chain of their own and resolve to `None` here.
    pub fn for_chain(chain_id: u64) -> Option<&'static ChainSpec> {
        match chain_id {
            MAINNET => Some(&MAINNET_SPEC),
            SEPOLIA => Some(&SEPOLIA_SPEC),
            GNOSIS => Some(&GNOSIS_SPEC),
            _ => None,
        }
    }

    pub fn epoch_of_slot(&self, slot: u64) -> u64 {
        slot >> self.slots_per_epoch_bits
    }

    pub fn period_of_slot(&self, slot: u64) -> u64 {
        slot >> (self.slots_per_epoch_bits + self.epochs_per_period_bits)
    }

    /// The fork version active at the given slot. The schedule is scanned
    /// from the newest fork backwards; genesis always matches.
    pub fn fork_version_at_slot(&self, slot: u64) -> [u8; 4] {
        let epoch = self.epoch_of_slot(slot);
        self.forks
            .iter()
            .rev()
            .find(|f| epoch >= f.epoch)
            .map(|f| f.version)
            .unwrap_or(self.forks[0].version)
    }
}

/// The sequencer (unsafe block signer) address for an OP-Stack chain.
/// A chain with no entry here cannot verify preconfirmation payloads.
pub fn sequencer_for_chain(chain_id: u64) -> Option<[u8; 20]> {
    match chain_id {
        OP_MAINNET => Some(hex!("AAAA45d9549EDA09E70937013520214382Ffc4A2")),
        BASE => Some(hex!("Af6E19BE0F9cE7f8afd49a1824851023A8249e8a")),
        _ => None,
    }
}

pub fn is_op_stack(chain_id: u64) -> bool {
    sequencer_for_chain(chain_id).is_some()
}

// =============================================================================
// Fork schedules
// =============================================================================

static MAINNET_FORKS: [Fork; 6] = [
    Fork { epoch: 0, version: [0x00, 0x00, 0x00, 0x00] },
    Fork { epoch: 74_240, version: [0x01, 0x00, 0x00, 0x00] },
    Fork { epoch: 144_896, version: [0x02, 0x00, 0x00, 0x00] },
    Fork { epoch: 194_048, version: [0x03, 0x00, 0x00, 0x00] },
    Fork { epoch: 269_568, version: [0x04, 0x00, 0x00, 0x00] },
    Fork { epoch: 364_032, version: [0x05, 0x00, 0x00, 0x00] },
];

static SEPOLIA_FORKS: [Fork; 6] = [
    Fork { epoch: 0, version: [0x90, 0x00, 0x00, 0x69] },
    Fork { epoch: 50, version: [0x90, 0x00, 0x00, 0x70] },
    Fork { epoch: 100, version: [0x90, 0x00, 0x00, 0x71] },
    Fork { epoch: 56_832, version: [0x90, 0x00, 0x00, 0x72] },
    Fork { epoch: 132_608, version: [0x90, 0x00, 0x00, 0x73] },
    Fork { epoch: 222_464, version: [0x90, 0x00, 0x00, 0x74] },
];

static GNOSIS_FORKS: [Fork; 6] = [
    Fork { epoch: 0, version: [0x00, 0x00, 0x00, 0x64] },
    Fork { epoch: 512, version: [0x01, 0x00, 0x00, 0x64] },
    Fork { epoch: 385_536, version: [0x02, 0x00, 0x00, 0x64] },
    Fork { epoch: 648_704, version: [0x03, 0x00, 0x00, 0x64] },
    Fork { epoch: 889_856, version: [0x04, 0x00, 0x00, 0x64] },
    Fork { epoch: 1_337_856, version: [0x05, 0x00, 0x00, 0x64] },
];

static MAINNET_SPEC: ChainSpec = ChainSpec {
    chain_id: MAINNET,
    genesis_validators_root: hex!(
        "4b363db94e286120d76eb905340fdd4e54bfe9f06bf33ff6cf5ad27f511bfe95"
    ),
    forks: &MAINNET_FORKS,
    slots_per_epoch_bits: 5,
    epochs_per_period_bits: 8,
};

static SEPOLIA_SPEC: ChainSpec = ChainSpec {
    chain_id: SEPOLIA,
    genesis_validators_root: hex!(
        "d8ea171f3c94aea21ebc42a1ed61052acf3f9209c00e4efbaaddac09ed9b8078"
    ),
    forks: &SEPOLIA_FORKS,
    slots_per_epoch_bits: 5,
    epochs_per_period_bits: 8,
};

// Gnosis runs 16 slots per epoch and 512 epochs per period.
static GNOSIS_SPEC: ChainSpec = ChainSpec {
    chain_id: GNOSIS,
    genesis_validators_root: hex!(
        "f5dcb5564e829aab27264b9becd5dfaa017085611224cb3036f573368dbb9d47"
    ),
    forks: &GNOSIS_FORKS,
    slots_per_epoch_bits: 4,
    epochs_per_period_bits: 9,
};
