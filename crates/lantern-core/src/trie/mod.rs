//! Merkle-Patricia trie proof verification.
//!
//! A proof is the list of RLP nodes on the path from the trie root to the
//! key's leaf. Every node must hash to the reference its parent holds;
//! nodes shorter than 32 bytes are embedded in their parent directly and
//! never appear as separate proof entries.

pub mod rlp;

use tiny_keccak::{Hasher, Keccak};

use crate::error::{Result, VerifyError};
use crate::ssz::hash::ct_eq;
use rlp::Rlp;

/// Compute keccak256 hash of data.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// Outcome of a trie walk: the key's value, or an authenticated absence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrieValue<'a> {
    Present(&'a [u8]),
    Absent,
}

impl<'a> TrieValue<'a> {
    /// Unwrap a value that the caller requires to exist.
    pub fn required(self, what: &str) -> Result<&'a [u8]> {
        match self {
            TrieValue::Present(value) => Ok(value),
            TrieValue::Absent => Err(VerifyError::invalid(format!("{what} not found in trie"))),
        }
    }
}

/// Convert a key to nibbles (4 bits each, high nibble first).
pub fn bytes_to_nibbles(key: &[u8]) -> Vec<u8> {
    let mut nibbles = Vec::with_capacity(key.len() * 2);
    for byte in key {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0f);
    }
    nibbles
}

/// Decode compact (hex-prefix) encoding used in trie node paths.
/// Returns (nibbles, is_leaf).
fn decode_hex_prefix(encoded: &[u8]) -> Result<(Vec<u8>, bool)> {
    let Some(&first) = encoded.first() else {
        return Err(VerifyError::invalid("empty hex-prefix path"));
    };
    let flag = first >> 4;
    if flag > 3 {
        return Err(VerifyError::invalid(format!(
            "invalid hex-prefix flag {flag}"
        )));
    }
    let is_leaf = flag >= 2;
    let is_odd = flag & 1 == 1;

    let mut nibbles = Vec::with_capacity(encoded.len() * 2);
    if is_odd {
        nibbles.push(first & 0x0f);
    }
    for &byte in &encoded[1..] {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0f);
    }
    Ok((nibbles, is_leaf))
}

/// Walk a Merkle-Patricia proof from `root` along `key`.
///
/// Returns the value stored under the key, or `Absent` when the proof
/// demonstrates the key is not in the trie (an empty branch slot or a leaf
/// whose path diverges). Every node is checked against the hash reference
/// that led to it; surplus or missing proof nodes reject.
pub fn verify_proof<'a>(
    root: &[u8; 32],
    key: &[u8],
    nodes: &[&'a [u8]],
) -> Result<TrieValue<'a>> {
    let nibbles = bytes_to_nibbles(key);
    let mut consumed = 0usize;

    let mut node_iter = nodes.iter();
    let first = *node_iter
        .next()
        .ok_or_else(|| VerifyError::invalid("empty trie proof"))?;
    let first_hash = keccak256(first);
    if !ct_eq(&first_hash, root) {
        return Err(VerifyError::root_mismatch("trie root", &first_hash, root));
    }

    let mut current: &'a [u8] = first;
    loop {
        let node = rlp::decode_exact(current)?;
        let items = node.items()?;

        let child: Rlp<'a> = match items.len() {
            17 => {
                if consumed >= nibbles.len() {
                    // Key fully consumed at a branch: the value slot decides
                    let value = items[16].as_bytes()?;
                    reject_surplus(&mut node_iter)?;
                    return Ok(if value.is_empty() {
                        TrieValue::Absent
                    } else {
                        TrieValue::Present(value)
                    });
                }
                let index = nibbles[consumed] as usize;
                consumed += 1;
                items[index]
            }
            2 => {
                let (path, is_leaf) = decode_hex_prefix(items[0].as_bytes()?)?;
                let remaining = &nibbles[consumed..];
                if is_leaf {
                    reject_surplus(&mut node_iter)?;
                    return Ok(if remaining == path.as_slice() {
                        TrieValue::Present(items[1].as_bytes()?)
                    } else {
                        TrieValue::Absent
                    });
                }
                if path.is_empty() {
                    return Err(VerifyError::invalid("extension node with empty path"));
                }
                if !remaining.starts_with(&path) {
                    // Path diverges before the key: authenticated absence
                    reject_surplus(&mut node_iter)?;
                    return Ok(TrieValue::Absent);
                }
                consumed += path.len();
                items[1]
            }
            n => {
                return Err(VerifyError::invalid(format!(
                    "trie node with {n} items"
                )))
            }
        };

        // Step into the child: a 32-byte hash points at the next proof
        // node, an embedded short node continues in place, an empty slot
        // proves absence.
        match child {
            Rlp::Bytes(bytes) if bytes.is_empty() => {
                reject_surplus(&mut node_iter)?;
                return Ok(TrieValue::Absent);
            }
            Rlp::Bytes(bytes) if bytes.len() == 32 => {
                let next = *node_iter
                    .next()
                    .ok_or_else(|| VerifyError::invalid("trie proof truncated"))?;
                let next_hash = keccak256(next);
                let mut reference = [0u8; 32];
                reference.copy_from_slice(bytes);
                if !ct_eq(&next_hash, &reference) {
                    return Err(VerifyError::root_mismatch(
                        "trie node",
                        &next_hash,
                        &reference,
                    ));
                }
                current = next;
            }
            Rlp::List { raw, .. } if raw.len() < 32 => {
                current = raw;
            }
            _ => return Err(VerifyError::invalid("malformed trie child reference")),
        }
    }
}

fn reject_surplus(node_iter: &mut std::slice::Iter<'_, &[u8]>) -> Result<()> {
    if node_iter.next().is_some() {
        return Err(VerifyError::invalid("surplus trie proof nodes"));
    }
    Ok(())
}
