use alloy_primitives::U256;
use serde::{Serialize, Serializer};

use crate::error::VerifyError;

/// Request domain for Ethereum L1 proofs.
pub const DOMAIN_ETHEREUM: u8 = 1;
/// Request domain for OP-Stack preconfirmation proofs.
pub const DOMAIN_OP_STACK: u8 = 6;

/// The schema version every proof envelope is decoded under.
pub const SUPPORTED_MAJOR: u8 = 1;

/// The leading 4 bytes of a proof envelope: `(domain, major, minor, patch)`.
/// The version uniquely determines the SSZ schema of the remaining fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestVersion {
    pub domain: u8,
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl RequestVersion {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VerifyError> {
        if bytes.len() != 4 {
            return Err(VerifyError::invalid(format!(
                "request version must be 4 bytes, got {}",
                bytes.len()
            )));
        }
        let version = RequestVersion {
            domain: bytes[0],
            major: bytes[1],
            minor: bytes[2],
            patch: bytes[3],
        };
        if version.domain != DOMAIN_ETHEREUM && version.domain != DOMAIN_OP_STACK {
            return Err(VerifyError::invalid(format!(
                "unknown request domain {}",
                version.domain
            )));
        }
        if version.major != SUPPORTED_MAJOR {
            return Err(VerifyError::invalid(format!(
                "unsupported request version {}.{}.{}",
                version.major, version.minor, version.patch
            )));
        }
        Ok(version)
    }

    pub fn is_op_stack(&self) -> bool {
        self.domain == DOMAIN_OP_STACK
    }
}

/// The RPC methods the verifier has a proof state machine for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RpcMethod {
    GetBalance,
    GetTransactionCount,
    GetCode,
    GetStorageAt,
    GetProof,
    GetTransactionByHash,
    GetTransactionReceipt,
    GetLogs,
    Call,
    GetBlockByNumber,
    GetBlockByHash,
    BlockNumber,
    GetWitness,
}

impl RpcMethod {
    pub fn parse(method: &str) -> Result<Self, VerifyError> {
        match method {
            "eth_getBalance" => Ok(RpcMethod::GetBalance),
            "eth_getTransactionCount" => Ok(RpcMethod::GetTransactionCount),
            "eth_getCode" => Ok(RpcMethod::GetCode),
            "eth_getStorageAt" => Ok(RpcMethod::GetStorageAt),
            "eth_getProof" => Ok(RpcMethod::GetProof),
            "eth_getTransactionByHash" => Ok(RpcMethod::GetTransactionByHash),
            "eth_getTransactionReceipt" => Ok(RpcMethod::GetTransactionReceipt),
            "eth_getLogs" => Ok(RpcMethod::GetLogs),
            "eth_call" => Ok(RpcMethod::Call),
            "eth_getBlockByNumber" => Ok(RpcMethod::GetBlockByNumber),
            "eth_getBlockByHash" => Ok(RpcMethod::GetBlockByHash),
            "eth_blockNumber" => Ok(RpcMethod::BlockNumber),
            "eth_getWitness" => Ok(RpcMethod::GetWitness),
            other => Err(VerifyError::UnsupportedMethod {
                method: other.to_string(),
            }),
        }
    }

    /// True for methods answered from the account leaf (single MPT walk
    /// under the state root).
    pub fn is_account_method(&self) -> bool {
        matches!(
            self,
            RpcMethod::GetBalance
                | RpcMethod::GetTransactionCount
                | RpcMethod::GetCode
                | RpcMethod::GetStorageAt
                | RpcMethod::GetProof
        )
    }
}

/// Host-facing classification of an RPC method: whether it needs a proof,
/// can be answered locally, or is not supported at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodSupport {
    /// A proof state machine exists; the verifier can authenticate results.
    Proofable,
    /// Answerable without any proof (static or purely computational).
    Local,
    /// No verifier and no local answer.
    Unsupported,
}

/// Classify a method the way the dispatcher will treat it, so hosts can
/// route unproofable methods without building a proof envelope first.
pub fn method_support(method: &str) -> MethodSupport {
    if RpcMethod::parse(method).is_ok() {
        return MethodSupport::Proofable;
    }
    match method {
        "eth_chainId" | "net_version" | "web3_clientVersion" | "web3_sha3" => {
            MethodSupport::Local
        }
        _ => MethodSupport::Unsupported,
    }
}

/// Normalized result data returned by a successful verification.
///
/// Serialization follows JSON-RPC conventions: quantities are minimal
/// `0x`-hex, byte strings are even-length `0x`-hex, and structured results
/// (receipts, logs, blocks) are embedded JSON values.
#[derive(Clone, Debug, PartialEq)]
pub enum DataPayload {
    None,
    /// A 32-byte word (storage values, hashes).
    Bytes32([u8; 32]),
    /// Raw bytes (code, raw transactions).
    Bytes(Vec<u8>),
    /// A big-endian unsigned quantity (balances, nonces, block numbers).
    Uint256([u8; 32]),
    /// A structured JSON result (receipt, logs, block, proof bundle).
    Json(serde_json::Value),
}

impl DataPayload {
    pub fn uint(value: u64) -> Self {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&value.to_be_bytes());
        DataPayload::Uint256(word)
    }
}

impl Serialize for DataPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DataPayload::None => serializer.serialize_none(),
            DataPayload::Bytes32(word) => {
                serializer.serialize_str(&format!("0x{}", hex::encode(word)))
            }
            DataPayload::Bytes(bytes) => {
                serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
            }
            DataPayload::Uint256(word) => {
                let value = U256::from_be_bytes(*word);
                serializer.serialize_str(&format!("0x{value:x}"))
            }
            DataPayload::Json(value) => value.serialize(serializer),
        }
    }
}

/// A caller-supplied block reference: a hex quantity, a 32-byte hash, or a
/// named tag. Tags all resolve to "whatever block the proof covers".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockSelector {
    Tag,
    Number(u64),
    Hash([u8; 32]),
}

impl BlockSelector {
    pub fn parse(arg: &str) -> Result<Self, VerifyError> {
        match arg {
            "latest" | "safe" | "finalized" | "earliest" | "pending" => Ok(BlockSelector::Tag),
            hex_arg => {
                let stripped = hex_arg.strip_prefix("0x").ok_or_else(|| {
                    VerifyError::invalid(format!("invalid block selector {hex_arg:?}"))
                })?;
                if stripped.len() == 64 {
                    let bytes = hex::decode(stripped)
                        .map_err(|e| VerifyError::invalid(format!("invalid block hash: {e}")))?;
                    let mut hash = [0u8; 32];
                    hash.copy_from_slice(&bytes);
                    Ok(BlockSelector::Hash(hash))
                } else {
                    let number = u64::from_str_radix(stripped, 16).map_err(|e| {
                        VerifyError::invalid(format!("invalid block number: {e}"))
                    })?;
                    Ok(BlockSelector::Number(number))
                }
            }
        }
    }

    /// Check the selector against an authenticated block. `Tag` matches
    /// anything; concrete selectors must match exactly.
    pub fn matches(&self, number: u64, hash: &[u8; 32]) -> bool {
        match self {
            BlockSelector::Tag => true,
            BlockSelector::Number(n) => *n == number,
            BlockSelector::Hash(h) => h == hash,
        }
    }
}

/// Parse a `0x`-prefixed 20-byte address argument.
pub fn parse_address(arg: &str) -> Result<[u8; 20], VerifyError> {
    let stripped = arg
        .strip_prefix("0x")
        .ok_or_else(|| VerifyError::invalid(format!("invalid address {arg:?}")))?;
    let bytes = hex::decode(stripped)
        .map_err(|e| VerifyError::invalid(format!("invalid address: {e}")))?;
    if bytes.len() != 20 {
        return Err(VerifyError::invalid(format!(
            "address must be 20 bytes, got {}",
            bytes.len()
        )));
    }
    let mut address = [0u8; 20];
    address.copy_from_slice(&bytes);
    Ok(address)
}

/// Parse a `0x`-prefixed 32-byte word (storage slots, hashes).
pub fn parse_word(arg: &str) -> Result<[u8; 32], VerifyError> {
    let stripped = arg
        .strip_prefix("0x")
        .ok_or_else(|| VerifyError::invalid(format!("invalid 32-byte word {arg:?}")))?;
    let bytes = hex::decode(stripped)
        .map_err(|e| VerifyError::invalid(format!("invalid word: {e}")))?;
    if bytes.len() > 32 {
        return Err(VerifyError::invalid(format!(
            "word must be at most 32 bytes, got {}",
            bytes.len()
        )));
    }
    let mut word = [0u8; 32];
    word[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(word)
}
