//! Zero-copy RLP decoding.
//!
//! Proof nodes are large and numerous, so decoding yields borrowed
//! subslices of the input, never copies. Trie nodes shorter than 32 bytes
//! are embedded in their parent instead of referenced by hash, which is
//! why every decoded item keeps its raw encoding alongside its payload.

use crate::error::{Result, VerifyError};

/// A decoded RLP item borrowing from the input buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rlp<'a> {
    /// A byte string (payload only, header stripped).
    Bytes(&'a [u8]),
    /// A list: `raw` is the full encoding, `payload` the concatenated items.
    List { raw: &'a [u8], payload: &'a [u8] },
}

impl<'a> Rlp<'a> {
    pub fn as_bytes(&self) -> Result<&'a [u8]> {
        match *self {
            Rlp::Bytes(bytes) => Ok(bytes),
            Rlp::List { .. } => Err(VerifyError::invalid("expected RLP bytes, got list")),
        }
    }

    /// Decode all items of a list.
    pub fn items(&self) -> Result<Vec<Rlp<'a>>> {
        let Rlp::List { payload, .. } = *self else {
            return Err(VerifyError::invalid("expected RLP list, got bytes"));
        };
        let mut items = Vec::new();
        let mut offset = 0usize;
        while offset < payload.len() {
            let (item, consumed) = decode(&payload[offset..])?;
            items.push(item);
            offset += consumed;
        }
        Ok(items)
    }

    /// Number of items in a list.
    pub fn list_len(&self) -> Result<usize> {
        Ok(self.items()?.len())
    }

    /// Decode a big-endian unsigned integer payload.
    pub fn as_u64(&self) -> Result<u64> {
        let bytes = self.as_bytes()?;
        if bytes.len() > 8 {
            return Err(VerifyError::invalid(format!(
                "integer payload too long: {} bytes",
                bytes.len()
            )));
        }
        let mut value = 0u64;
        for &b in bytes {
            value = (value << 8) | b as u64;
        }
        Ok(value)
    }

    /// Decode a big-endian unsigned integer of up to 32 bytes,
    /// left-padded into a 32-byte word.
    pub fn as_u256_be(&self) -> Result<[u8; 32]> {
        let bytes = self.as_bytes()?;
        if bytes.len() > 32 {
            return Err(VerifyError::invalid(format!(
                "u256 payload too long: {} bytes",
                bytes.len()
            )));
        }
        let mut word = [0u8; 32];
        word[32 - bytes.len()..].copy_from_slice(bytes);
        Ok(word)
    }
}

/// Decode the item at the front of `buf`, returning it and the number of
/// bytes it occupies.
pub fn decode(buf: &[u8]) -> Result<(Rlp<'_>, usize)> {
    let Some(&prefix) = buf.first() else {
        return Err(VerifyError::invalid("empty RLP input"));
    };
    match prefix {
        // Single byte, its own encoding
        0x00..=0x7f => Ok((Rlp::Bytes(&buf[..1]), 1)),
        // Short string
        0x80..=0xb7 => {
            let length = (prefix - 0x80) as usize;
            let total = 1 + length;
            if buf.len() < total {
                return Err(VerifyError::invalid("RLP short string truncated"));
            }
            Ok((Rlp::Bytes(&buf[1..total]), total))
        }
        // Long string
        0xb8..=0xbf => {
            let (length, header) = long_length(buf, prefix - 0xb7)?;
            let total = header + length;
            if buf.len() < total {
                return Err(VerifyError::invalid("RLP long string truncated"));
            }
            Ok((Rlp::Bytes(&buf[header..total]), total))
        }
        // Short list
        0xc0..=0xf7 => {
            let length = (prefix - 0xc0) as usize;
            let total = 1 + length;
            if buf.len() < total {
                return Err(VerifyError::invalid("RLP short list truncated"));
            }
            Ok((
                Rlp::List {
                    raw: &buf[..total],
                    payload: &buf[1..total],
                },
                total,
            ))
        }
        // Long list
        0xf8..=0xff => {
            let (length, header) = long_length(buf, prefix - 0xf7)?;
            let total = header + length;
            if buf.len() < total {
                return Err(VerifyError::invalid("RLP long list truncated"));
            }
            Ok((
                Rlp::List {
                    raw: &buf[..total],
                    payload: &buf[header..total],
                },
                total,
            ))
        }
    }
}

/// Decode a complete buffer as a single item with nothing trailing.
pub fn decode_exact(buf: &[u8]) -> Result<Rlp<'_>> {
    let (item, consumed) = decode(buf)?;
    if consumed != buf.len() {
        return Err(VerifyError::invalid(format!(
            "{} trailing bytes after RLP item",
            buf.len() - consumed
        )));
    }
    Ok(item)
}

fn long_length(buf: &[u8], len_bytes: u8) -> Result<(usize, usize)> {
    let len_bytes = len_bytes as usize;
    if buf.len() < 1 + len_bytes {
        return Err(VerifyError::invalid("RLP length field truncated"));
    }
    let mut length = 0usize;
    for &b in &buf[1..1 + len_bytes] {
        length = length
            .checked_shl(8)
            .ok_or_else(|| VerifyError::invalid("RLP length overflow"))?
            | b as usize;
    }
    Ok((length, 1 + len_bytes))
}

/// RLP-encode a transaction index the way the tx and receipt tries key
/// their leaves.
pub fn encode_uint(value: u64) -> Vec<u8> {
    alloy_rlp::encode(value)
}
