/// Static SSZ type definition.
///
/// Every decoded value in a proof envelope is a [`View`](super::View)
/// pairing one of these definitions with a byte range. Definitions are
/// `'static` so views stay plain `(pointer, slice)` pairs with no
/// allocation per navigation step.
#[derive(Debug, PartialEq, Eq)]
pub enum TypeDef {
    /// Unsigned little-endian integer of the given byte width.
    Uint(usize),
    Boolean,
    /// `Vector[byte, N]`: fixed-length byte string.
    Bytes(usize),
    /// `List[byte, N]`: variable-length byte string with a maximum.
    ByteList(usize),
    /// `Bitvector[N]`.
    BitVector(usize),
    /// `Bitlist[N]`.
    BitList(usize),
    /// Fixed-length vector of a composite or integer element type.
    Vector {
        elem: &'static TypeDef,
        len: usize,
    },
    /// Variable-length list of a composite or integer element type.
    List {
        elem: &'static TypeDef,
        max: usize,
    },
    Container {
        name: &'static str,
        fields: &'static [Field],
    },
    /// Tagged union: 1-byte selector followed by the selected variant.
    /// Selector `i` picks `variants[i]`.
    Union {
        variants: &'static [&'static TypeDef],
    },
    /// The empty union variant. Encodes as zero bytes.
    None,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub def: &'static TypeDef,
}

impl TypeDef {
    /// The encoded size of a fixed-size type, or `None` for variable-size
    /// types (which are represented by 4-byte offsets inside containers).
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            TypeDef::Uint(size) => Some(*size),
            TypeDef::Boolean => Some(1),
            TypeDef::Bytes(len) => Some(*len),
            TypeDef::BitVector(bits) => Some((bits + 7) / 8),
            TypeDef::Vector { elem, len } => elem.fixed_size().map(|s| s * len),
            TypeDef::Container { fields, .. } => {
                let mut total = 0;
                for field in fields.iter() {
                    total += field.def.fixed_size()?;
                }
                Some(total)
            }
            TypeDef::None => Some(0),
            TypeDef::ByteList(_)
            | TypeDef::BitList(_)
            | TypeDef::List { .. }
            | TypeDef::Union { .. } => None,
        }
    }

    pub fn is_fixed_size(&self) -> bool {
        self.fixed_size().is_some()
    }

    /// Human-readable name for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TypeDef::Uint(_) => "uint",
            TypeDef::Boolean => "boolean",
            TypeDef::Bytes(_) => "bytes",
            TypeDef::ByteList(_) => "byte list",
            TypeDef::BitVector(_) => "bitvector",
            TypeDef::BitList(_) => "bitlist",
            TypeDef::Vector { .. } => "vector",
            TypeDef::List { .. } => "list",
            TypeDef::Container { name, .. } => name,
            TypeDef::Union { .. } => "union",
            TypeDef::None => "none",
        }
    }
}
