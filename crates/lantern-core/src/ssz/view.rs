use super::def::TypeDef;
use crate::error::{Result, VerifyError};

/// A non-owning, typed window into an SSZ-encoded buffer.
///
/// A view never copies: navigation (`field`, `at`, `union_variant`) returns
/// further views borrowing the same request buffer. Offsets are validated
/// on every step, so a malformed proof produces an `InvalidProof` error,
/// never a panic and never an out-of-bounds slice.
#[derive(Clone, Copy, Debug)]
pub struct View<'a> {
    pub def: &'static TypeDef,
    pub bytes: &'a [u8],
}

impl<'a> View<'a> {
    /// Wrap `bytes` as a value of type `def`, validating the outer length
    /// for fixed-size types.
    pub fn new(def: &'static TypeDef, bytes: &'a [u8]) -> Result<View<'a>> {
        if let Some(size) = def.fixed_size() {
            if bytes.len() != size {
                return Err(VerifyError::invalid(format!(
                    "{} must be {} bytes, got {}",
                    def.describe(),
                    size,
                    bytes.len()
                )));
            }
        }
        if let TypeDef::ByteList(max) = def {
            if bytes.len() > *max {
                return Err(VerifyError::invalid(format!(
                    "byte list exceeds maximum length: {} > {}",
                    bytes.len(),
                    max
                )));
            }
        }
        Ok(View { def, bytes })
    }

    /// Access a container field by name.
    pub fn field(&self, name: &str) -> Result<View<'a>> {
        let (fields, container) = match self.def {
            TypeDef::Container { fields, name } => (*fields, *name),
            _ => {
                return Err(VerifyError::invalid(format!(
                    "cannot access field {name:?} on {}",
                    self.def.describe()
                )))
            }
        };
        let regions = self.container_regions(fields, container)?;
        for (field, (start, end)) in fields.iter().zip(regions) {
            if field.name == name {
                return View::new(field.def, &self.bytes[start..end]);
            }
        }
        Err(VerifyError::invalid(format!(
            "{container} has no field {name:?}"
        )))
    }

    /// Byte regions of all container fields, with full offset validation:
    /// the first offset must land exactly at the end of the fixed region,
    /// offsets must be monotonic, and all must lie within the buffer.
    fn container_regions(
        &self,
        fields: &'static [super::def::Field],
        container: &'static str,
    ) -> Result<Vec<(usize, usize)>> {
        let mut fixed_len = 0usize;
        for field in fields {
            fixed_len += field.def.fixed_size().unwrap_or(4);
        }
        if self.bytes.len() < fixed_len {
            return Err(VerifyError::invalid(format!(
                "{container} truncated: {} bytes, fixed region needs {fixed_len}",
                self.bytes.len()
            )));
        }

        // First pass: read every dynamic field's offset.
        let mut offsets: Vec<usize> = Vec::new();
        let mut pos = 0usize;
        for field in fields {
            match field.def.fixed_size() {
                Some(size) => pos += size,
                None => {
                    let raw: [u8; 4] = self.bytes[pos..pos + 4].try_into().expect("4-byte slot");
                    offsets.push(u32::from_le_bytes(raw) as usize);
                    pos += 4;
                }
            }
        }

        for (i, offset) in offsets.iter().enumerate() {
            let floor = if i == 0 { fixed_len } else { offsets[i - 1] };
            if i == 0 && *offset != fixed_len {
                return Err(VerifyError::invalid(format!(
                    "{container}: first offset {offset} does not match fixed region {fixed_len}"
                )));
            }
            if *offset < floor || *offset > self.bytes.len() {
                return Err(VerifyError::invalid(format!(
                    "{container}: offset {offset} out of range"
                )));
            }
        }

        // Second pass: assemble regions, bounding each dynamic field by the
        // next offset (or the end of the buffer for the last one).
        let mut regions = Vec::with_capacity(fields.len());
        let mut pos = 0usize;
        let mut dynamic_index = 0usize;
        for field in fields {
            match field.def.fixed_size() {
                Some(size) => {
                    regions.push((pos, pos + size));
                    pos += size;
                }
                None => {
                    let start = offsets[dynamic_index];
                    let end = offsets
                        .get(dynamic_index + 1)
                        .copied()
                        .unwrap_or(self.bytes.len());
                    regions.push((start, end));
                    dynamic_index += 1;
                    pos += 4;
                }
            }
        }
        Ok(regions)
    }

    /// Number of elements in a list, vector, byte list or bitvector.
    pub fn len(&self) -> Result<usize> {
        match self.def {
            TypeDef::Vector { len, .. } => Ok(*len),
            TypeDef::Bytes(len) => Ok(*len),
            TypeDef::ByteList(_) => Ok(self.bytes.len()),
            TypeDef::BitVector(bits) => Ok(*bits),
            TypeDef::List { elem, .. } => match elem.fixed_size() {
                Some(size) => {
                    if size == 0 || self.bytes.len() % size != 0 {
                        return Err(VerifyError::invalid(format!(
                            "list of {}-byte elements has ragged length {}",
                            size,
                            self.bytes.len()
                        )));
                    }
                    Ok(self.bytes.len() / size)
                }
                None => self.offset_table().map(|offsets| offsets.len()),
            },
            _ => Err(VerifyError::invalid(format!(
                "{} has no length",
                self.def.describe()
            ))),
        }
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Access a list or vector element by index.
    pub fn at(&self, index: usize) -> Result<View<'a>> {
        let (elem, count) = match self.def {
            TypeDef::List { elem, .. } => (*elem, self.len()?),
            TypeDef::Vector { elem, len } => (*elem, *len),
            _ => {
                return Err(VerifyError::invalid(format!(
                    "cannot index into {}",
                    self.def.describe()
                )))
            }
        };
        if index >= count {
            return Err(VerifyError::invalid(format!(
                "index {index} out of bounds, length {count}"
            )));
        }
        match elem.fixed_size() {
            Some(size) => View::new(elem, &self.bytes[index * size..(index + 1) * size]),
            None => {
                let offsets = self.offset_table()?;
                let start = offsets[index];
                let end = offsets.get(index + 1).copied().unwrap_or(self.bytes.len());
                View::new(elem, &self.bytes[start..end])
            }
        }
    }

    /// The leading offset table of a list of variable-size elements.
    /// The element count is implied by the first offset.
    fn offset_table(&self) -> Result<Vec<usize>> {
        if self.bytes.is_empty() {
            return Ok(Vec::new());
        }
        if self.bytes.len() < 4 {
            return Err(VerifyError::invalid("offset table truncated"));
        }
        let first =
            u32::from_le_bytes(self.bytes[..4].try_into().expect("4-byte offset")) as usize;
        if first == 0 || first % 4 != 0 || first > self.bytes.len() {
            return Err(VerifyError::invalid(format!(
                "corrupt leading offset {first}"
            )));
        }
        let count = first / 4;
        let mut offsets = Vec::with_capacity(count);
        let mut previous = first;
        for i in 0..count {
            let raw: [u8; 4] = self.bytes[i * 4..i * 4 + 4].try_into().expect("4-byte slot");
            let offset = u32::from_le_bytes(raw) as usize;
            let floor = if i == 0 { first } else { previous };
            if (i == 0 && offset != first) || offset < floor || offset > self.bytes.len() {
                return Err(VerifyError::invalid(format!(
                    "non-monotonic element offset {offset}"
                )));
            }
            previous = offset;
            offsets.push(offset);
        }
        Ok(offsets)
    }

    /// Decode an unsigned integer of up to 8 bytes.
    pub fn uint64(&self) -> Result<u64> {
        match self.def {
            TypeDef::Uint(size) if *size <= 8 => {
                let mut raw = [0u8; 8];
                raw[..*size].copy_from_slice(self.bytes);
                Ok(u64::from_le_bytes(raw))
            }
            TypeDef::Boolean => Ok(self.bytes[0] as u64),
            _ => Err(VerifyError::invalid(format!(
                "{} is not a small integer",
                self.def.describe()
            ))),
        }
    }

    /// Decode a 32-byte unsigned integer into big-endian layout.
    pub fn uint256_be(&self) -> Result<[u8; 32]> {
        match self.def {
            TypeDef::Uint(32) => {
                let mut word = [0u8; 32];
                for (i, b) in self.bytes.iter().enumerate() {
                    word[31 - i] = *b;
                }
                Ok(word)
            }
            _ => Err(VerifyError::invalid(format!(
                "{} is not a uint256",
                self.def.describe()
            ))),
        }
    }

    /// Copy out a fixed 32-byte value.
    pub fn bytes32(&self) -> Result<[u8; 32]> {
        if self.bytes.len() != 32 {
            return Err(VerifyError::invalid(format!(
                "expected 32 bytes, got {}",
                self.bytes.len()
            )));
        }
        let mut word = [0u8; 32];
        word.copy_from_slice(self.bytes);
        Ok(word)
    }

    /// Copy out a fixed 20-byte value.
    pub fn bytes20(&self) -> Result<[u8; 20]> {
        if self.bytes.len() != 20 {
            return Err(VerifyError::invalid(format!(
                "expected 20 bytes, got {}",
                self.bytes.len()
            )));
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(self.bytes);
        Ok(out)
    }

    /// Resolve a union to its selector and inner view.
    pub fn union_variant(&self) -> Result<(u8, View<'a>)> {
        let TypeDef::Union { variants } = self.def else {
            return Err(VerifyError::invalid(format!(
                "{} is not a union",
                self.def.describe()
            )));
        };
        let selector = *self
            .bytes
            .first()
            .ok_or_else(|| VerifyError::invalid("empty union encoding"))?;
        let def = *variants.get(selector as usize).ok_or_else(|| {
            VerifyError::invalid(format!("unknown union selector {selector}"))
        })?;
        let inner = View::new(def, &self.bytes[1..])?;
        Ok((selector, inner))
    }

    /// True when a union holds its `None` variant.
    pub fn union_is_none(&self) -> Result<bool> {
        let (_, inner) = self.union_variant()?;
        Ok(matches!(inner.def, TypeDef::None))
    }
}

#[cfg(test)]
mod tests {
    use super::super::def::Field;
    use super::*;

    static U64: TypeDef = TypeDef::Uint(8);
    static ROOT: TypeDef = TypeDef::Bytes(32);
    static BLOB: TypeDef = TypeDef::ByteList(1024);
    static PAIR: TypeDef = TypeDef::Container {
        name: "Pair",
        fields: &[
            Field { name: "slot", def: &U64 },
            Field { name: "data", def: &BLOB },
        ],
    };
    static ROOTS: TypeDef = TypeDef::List { elem: &ROOT, max: 64 };
    static BLOBS: TypeDef = TypeDef::List { elem: &BLOB, max: 16 };

    #[test]
    fn test_fixed_field_access() {
        // slot = 7, data = "hi" at offset 12
        let mut buf = vec![];
        buf.extend_from_slice(&7u64.to_le_bytes());
        buf.extend_from_slice(&12u32.to_le_bytes());
        buf.extend_from_slice(b"hi");

        let view = View::new(&PAIR, &buf).unwrap();
        assert_eq!(view.field("slot").unwrap().uint64().unwrap(), 7);
        assert_eq!(view.field("data").unwrap().bytes, b"hi");
        assert!(view.field("nope").is_err());
    }

    #[test]
    fn test_bad_first_offset_rejected() {
        let mut buf = vec![];
        buf.extend_from_slice(&7u64.to_le_bytes());
        buf.extend_from_slice(&11u32.to_le_bytes()); // overlaps the fixed region
        buf.extend_from_slice(b"hi");
        assert!(View::new(&PAIR, &buf)
            .unwrap()
            .field("data")
            .is_err());
    }

    #[test]
    fn test_offset_past_end_rejected() {
        let mut buf = vec![];
        buf.extend_from_slice(&7u64.to_le_bytes());
        buf.extend_from_slice(&99u32.to_le_bytes());
        assert!(View::new(&PAIR, &buf).unwrap().field("data").is_err());
    }

    #[test]
    fn test_fixed_element_list() {
        let buf = vec![0xabu8; 64];
        let view = View::new(&ROOTS, &buf).unwrap();
        assert_eq!(view.len().unwrap(), 2);
        assert_eq!(view.at(1).unwrap().bytes.len(), 32);
        assert!(view.at(2).is_err());

        // Ragged length is structural damage, not a short list
        let view = View::new(&ROOTS, &buf[..63]).unwrap();
        assert!(view.len().is_err());
    }

    #[test]
    fn test_variable_element_list() {
        // Two elements: "aa" and "b"
        let mut buf = vec![];
        buf.extend_from_slice(&8u32.to_le_bytes());
        buf.extend_from_slice(&10u32.to_le_bytes());
        buf.extend_from_slice(b"aab");

        let view = View::new(&BLOBS, &buf).unwrap();
        assert_eq!(view.len().unwrap(), 2);
        assert_eq!(view.at(0).unwrap().bytes, b"aa");
        assert_eq!(view.at(1).unwrap().bytes, b"b");
    }

    #[test]
    fn test_empty_variable_list() {
        let view = View::new(&BLOBS, &[]).unwrap();
        assert_eq!(view.len().unwrap(), 0);
        assert!(view.is_empty().unwrap());
    }

    #[test]
    fn test_non_monotonic_element_offsets_rejected() {
        let mut buf = vec![];
        buf.extend_from_slice(&8u32.to_le_bytes());
        buf.extend_from_slice(&6u32.to_le_bytes()); // walks backwards
        buf.extend_from_slice(b"aab");
        let view = View::new(&BLOBS, &buf).unwrap();
        assert!(view.at(1).is_err());
    }

    #[test]
    fn test_uint256_is_little_endian_on_the_wire() {
        static U256: TypeDef = TypeDef::Uint(32);
        let mut buf = [0u8; 32];
        buf[0] = 0x39;
        buf[1] = 0x05;
        let view = View::new(&U256, &buf).unwrap();
        let be = view.uint256_be().unwrap();
        assert_eq!(be[31], 0x39);
        assert_eq!(be[30], 0x05);
    }

    #[test]
    fn test_union_selection() {
        static CHOICE: TypeDef = TypeDef::Union {
            variants: &[&TypeDef::None, &ROOT],
        };
        let mut buf = vec![1u8];
        buf.extend_from_slice(&[0xcc; 32]);
        let view = View::new(&CHOICE, &buf).unwrap();
        let (selector, inner) = view.union_variant().unwrap();
        assert_eq!(selector, 1);
        assert_eq!(inner.bytes32().unwrap(), [0xcc; 32]);
        assert!(!view.union_is_none().unwrap());

        let view = View::new(&CHOICE, &[0u8]).unwrap();
        assert!(view.union_is_none().unwrap());

        let view = View::new(&CHOICE, &[7u8]).unwrap();
        assert!(view.union_variant().is_err());
    }

    #[test]
    fn test_fixed_size_mismatch_rejected() {
        assert!(View::new(&ROOT, &[0u8; 31]).is_err());
        assert!(View::new(&ROOT, &[0u8; 33]).is_err());
        assert!(View::new(&ROOT, &[0u8; 32]).is_ok());
    }
}
