use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};

use super::def::TypeDef;
use super::view::View;
use crate::error::{Result, VerifyError};

/// SHA256 hash of arbitrary data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// SHA256 hash of two 32-byte values concatenated.
pub fn sha256_pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(a);
    data[32..].copy_from_slice(b);
    sha256(&data)
}

/// Constant-time equality for 32-byte roots. Root comparisons are the
/// accept/reject boundary of the verifier, so they must not leak timing.
pub fn ct_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    let mut diff = 0u8;
    for i in 0..32 {
        diff |= a[i] ^ b[i];
    }
    diff == 0
}

/// Roots of all-zero subtrees by height. `ZERO_HASHES[d]` is the root of a
/// complete depth-`d` tree of zero chunks.
static ZERO_HASHES: Lazy<[[u8; 32]; 64]> = Lazy::new(|| {
    let mut table = [[0u8; 32]; 64];
    for depth in 1..64 {
        let below = table[depth - 1];
        table[depth] = sha256_pair(&below, &below);
    }
    table
});

pub fn zero_hash(depth: usize) -> [u8; 32] {
    ZERO_HASHES[depth]
}

fn ceil_log2(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}

/// Merkleize `chunks` into a tree padded with zero chunks up to
/// `limit_chunks` leaves (rounded to the next power of two).
pub fn merkleize(chunks: &[[u8; 32]], limit_chunks: usize) -> Result<[u8; 32]> {
    let floor = chunks.len().max(1);
    if limit_chunks != 0 && chunks.len() > limit_chunks {
        return Err(VerifyError::invalid(format!(
            "chunk count {} exceeds merkleization limit {}",
            chunks.len(),
            limit_chunks
        )));
    }
    let depth = ceil_log2(limit_chunks.max(floor));
    Ok(subtree_root(chunks, depth))
}

fn subtree_root(chunks: &[[u8; 32]], depth: usize) -> [u8; 32] {
    if chunks.is_empty() {
        return zero_hash(depth);
    }
    if depth == 0 {
        return chunks[0];
    }
    let half = 1usize << (depth - 1);
    if chunks.len() <= half {
        sha256_pair(&subtree_root(chunks, depth - 1), &zero_hash(depth - 1))
    } else {
        sha256_pair(
            &subtree_root(&chunks[..half], depth - 1),
            &subtree_root(&chunks[half..], depth - 1),
        )
    }
}

/// Mix a list length into its data root.
pub fn mix_in_length(root: &[u8; 32], length: usize) -> [u8; 32] {
    let mut length_chunk = [0u8; 32];
    length_chunk[..8].copy_from_slice(&(length as u64).to_le_bytes());
    sha256_pair(root, &length_chunk)
}

fn mix_in_selector(root: &[u8; 32], selector: u8) -> [u8; 32] {
    let mut selector_chunk = [0u8; 32];
    selector_chunk[0] = selector;
    sha256_pair(root, &selector_chunk)
}

/// Split a byte string into zero-padded 32-byte chunks.
fn pack_bytes(bytes: &[u8]) -> Vec<[u8; 32]> {
    bytes
        .chunks(32)
        .map(|piece| {
            let mut chunk = [0u8; 32];
            chunk[..piece.len()].copy_from_slice(piece);
            chunk
        })
        .collect()
}

const BYTES_PER_CHUNK: usize = 32;
const BITS_PER_CHUNK: usize = 256;

/// The SSZ hash tree root of a typed view.
///
/// Lists mix in their length, vectors do not; both pad with zero chunks to
/// their type's chunk limit. Unions mix in their selector.
pub fn hash_tree_root(view: View<'_>) -> Result<[u8; 32]> {
    match view.def {
        TypeDef::Uint(_) | TypeDef::Boolean => {
            let mut chunk = [0u8; 32];
            chunk[..view.bytes.len()].copy_from_slice(view.bytes);
            Ok(chunk)
        }
        TypeDef::Bytes(len) => {
            let limit = (len + BYTES_PER_CHUNK - 1) / BYTES_PER_CHUNK;
            merkleize(&pack_bytes(view.bytes), limit)
        }
        TypeDef::ByteList(max) => {
            let limit = (max + BYTES_PER_CHUNK - 1) / BYTES_PER_CHUNK;
            let root = merkleize(&pack_bytes(view.bytes), limit)?;
            Ok(mix_in_length(&root, view.bytes.len()))
        }
        TypeDef::BitVector(bits) => {
            let limit = (bits + BITS_PER_CHUNK - 1) / BITS_PER_CHUNK;
            merkleize(&pack_bytes(view.bytes), limit)
        }
        TypeDef::BitList(max) => {
            let Some(&last) = view.bytes.last() else {
                return Err(VerifyError::invalid("empty bitlist encoding"));
            };
            if last == 0 {
                return Err(VerifyError::invalid("bitlist missing sentinel bit"));
            }
            let sentinel = 7 - last.leading_zeros() as usize;
            let bit_len = (view.bytes.len() - 1) * 8 + sentinel;
            if bit_len > *max {
                return Err(VerifyError::invalid(format!(
                    "bitlist length {bit_len} exceeds maximum {max}"
                )));
            }
            let mut data = view.bytes.to_vec();
            *data.last_mut().expect("non-empty") &= !(1 << sentinel);
            if sentinel == 0 {
                data.pop();
            }
            let limit = (max + BITS_PER_CHUNK - 1) / BITS_PER_CHUNK;
            let root = merkleize(&pack_bytes(&data), limit)?;
            Ok(mix_in_length(&root, bit_len))
        }
        TypeDef::Vector { elem, len } => match elem {
            // Integer elements pack into shared chunks
            TypeDef::Uint(size) => {
                let limit = (len * size + BYTES_PER_CHUNK - 1) / BYTES_PER_CHUNK;
                merkleize(&pack_bytes(view.bytes), limit)
            }
            // Composite elements contribute one subtree root each
            _ => {
                let mut leaves = Vec::with_capacity(*len);
                for i in 0..*len {
                    leaves.push(hash_tree_root(view.at(i)?)?);
                }
                merkleize(&leaves, *len)
            }
        },
        TypeDef::List { elem, max } => {
            let count = view.len()?;
            match elem {
                TypeDef::Uint(size) => {
                    let limit = (max * size + BYTES_PER_CHUNK - 1) / BYTES_PER_CHUNK;
                    let root = merkleize(&pack_bytes(view.bytes), limit)?;
                    Ok(mix_in_length(&root, count))
                }
                _ => {
                    let mut leaves = Vec::with_capacity(count);
                    for i in 0..count {
                        leaves.push(hash_tree_root(view.at(i)?)?);
                    }
                    let root = merkleize(&leaves, *max)?;
                    Ok(mix_in_length(&root, count))
                }
            }
        }
        TypeDef::Container { fields, .. } => {
            let mut leaves = Vec::with_capacity(fields.len());
            for field in fields.iter() {
                leaves.push(hash_tree_root(view.field(field.name)?)?);
            }
            merkleize(&leaves, fields.len())
        }
        TypeDef::Union { .. } => {
            let (selector, inner) = view.union_variant()?;
            let root = hash_tree_root(inner)?;
            Ok(mix_in_selector(&root, selector))
        }
        TypeDef::None => Ok([0u8; 32]),
    }
}
