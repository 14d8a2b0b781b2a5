use serde::{Deserialize, Serialize};

/// An Ethereum account as stored in the state trie.
/// Decoded from the RLP 4-tuple at the end of a verified account proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Number of transactions sent from this account.
    pub nonce: u64,
    /// Balance in wei (stored as big-endian bytes to avoid precision loss).
    pub balance: [u8; 32],
    /// Root hash of the account's storage trie.
    /// For externally owned accounts (EOAs), this is the empty trie root.
    pub storage_root: [u8; 32],
    /// Keccak256 hash of the account's code.
    /// For EOAs, this is the hash of the empty string.
    pub code_hash: [u8; 32],
}

impl AccountState {
    /// The keccak256 hash of empty bytes, the code hash of every EOA.
    pub const EMPTY_CODE_HASH: [u8; 32] = [
        0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7,
        0x03, 0xc0, 0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04,
        0x5d, 0x85, 0xa4, 0x70,
    ];

    /// The root of an empty Merkle-Patricia trie.
    pub const EMPTY_STORAGE_ROOT: [u8; 32] = [
        0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0,
        0xf8, 0x6e, 0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5,
        0xe3, 0x63, 0xb4, 0x21,
    ];

    /// An account that does not exist in the state trie. Proofs of absence
    /// resolve to this value so callers see zero balance and nonce.
    pub fn empty() -> Self {
        AccountState {
            nonce: 0,
            balance: [0u8; 32],
            storage_root: Self::EMPTY_STORAGE_ROOT,
            code_hash: Self::EMPTY_CODE_HASH,
        }
    }

    /// Check if this is a contract account (has code deployed).
    pub fn is_contract(&self) -> bool {
        self.code_hash != Self::EMPTY_CODE_HASH
    }

    /// Get balance as a hex string (no 0x prefix, leading zeros stripped).
    pub fn balance_hex(&self) -> String {
        let hex_str = hex::encode(self.balance);
        let trimmed = hex_str.trim_start_matches('0');
        if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    }
}

/// EIP-2718 transaction envelope kinds. Legacy transactions carry no type
/// byte; all others prefix their payload with the listed byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxEnvelope {
    Legacy,
    Eip2930,
    Eip1559,
    Eip4844,
    Deposit,
}

impl TxEnvelope {
    /// Classify a raw transaction or receipt leaf by its first byte.
    /// Returns the envelope kind and the offset of the RLP body.
    pub fn classify(data: &[u8]) -> Option<(TxEnvelope, usize)> {
        match *data.first()? {
            0x01 => Some((TxEnvelope::Eip2930, 1)),
            0x02 => Some((TxEnvelope::Eip1559, 1)),
            0x03 => Some((TxEnvelope::Eip4844, 1)),
            0x7e => Some((TxEnvelope::Deposit, 1)),
            b if b >= 0xc0 => Some((TxEnvelope::Legacy, 0)),
            _ => None,
        }
    }
}

/// A log entry emitted by a smart contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Address of the contract that emitted the log.
    pub address: [u8; 20],
    /// Indexed topics (up to 4, first is usually the event signature hash).
    pub topics: Vec<[u8; 32]>,
    /// Non-indexed data.
    pub data: Vec<u8>,
}

/// A verified transaction receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Envelope kind of the transaction this receipt belongs to.
    pub envelope: TxEnvelope,
    /// Whether the transaction succeeded (1) or failed (0).
    pub status: u8,
    /// Cumulative gas used in the block up to and including this transaction.
    pub cumulative_gas_used: u64,
    /// Bloom filter for quick log searching (256 bytes, hex-encoded for serde).
    #[serde(with = "bloom_serde")]
    pub logs_bloom: [u8; 256],
    /// The logs emitted by this transaction.
    pub logs: Vec<Log>,
}

mod bloom_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bloom: &[u8; 256], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bloom))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 256], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        if bytes.len() != 256 {
            return Err(serde::de::Error::custom("bloom must be 256 bytes"));
        }
        let mut arr = [0u8; 256];
        arr.copy_from_slice(&bytes);
        Ok(arr)
    }
}
