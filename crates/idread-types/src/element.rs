use idread_wire::ByteOrder;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Element types a channel can carry.
///
/// Each kind has one row in [`KIND_TABLE`], which is the single place the
/// element size, header name and dtype code are defined:
///
/// ```text
/// ┌─────────┬──────┬───────────┬───────┐
/// │ Kind    │ Size │ Wire name │ dtype │
/// ├─────────┼──────┼───────────┼───────┤
/// │ UInt8   │ 1    │ uint8     │ u1    │
/// │ Int8    │ 1    │ int8      │ i1    │
/// │ UInt16  │ 2    │ uint16    │ u2    │
/// │ Int16   │ 2    │ int16     │ i2    │
/// │ UInt32  │ 4    │ uint32    │ u4    │
/// │ Int32   │ 4    │ int32     │ i4    │
/// │ UInt64  │ 8    │ uint64    │ u8    │
/// │ Int64   │ 8    │ int64     │ i8    │
/// │ Float32 │ 4    │ float32   │ f4    │
/// │ Float64 │ 8    │ float64   │ f8    │
/// └─────────┴──────┴───────────┴───────┘
/// ```
///
/// The header also accepts `"float"` for float64, `"int"` for int64, and
/// treats a missing type as float64.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Float32,
    Float64,
}

struct KindInfo {
    kind: ElementKind,
    size: usize,
    name: &'static str,
    dtype: &'static str,
}

const KIND_TABLE: [KindInfo; 10] = [
    KindInfo { kind: ElementKind::UInt8, size: 1, name: "uint8", dtype: "u1" },
    KindInfo { kind: ElementKind::Int8, size: 1, name: "int8", dtype: "i1" },
    KindInfo { kind: ElementKind::UInt16, size: 2, name: "uint16", dtype: "u2" },
    KindInfo { kind: ElementKind::Int16, size: 2, name: "int16", dtype: "i2" },
    KindInfo { kind: ElementKind::UInt32, size: 4, name: "uint32", dtype: "u4" },
    KindInfo { kind: ElementKind::Int32, size: 4, name: "int32", dtype: "i4" },
    KindInfo { kind: ElementKind::UInt64, size: 8, name: "uint64", dtype: "u8" },
    KindInfo { kind: ElementKind::Int64, size: 8, name: "int64", dtype: "i8" },
    KindInfo { kind: ElementKind::Float32, size: 4, name: "float32", dtype: "f4" },
    KindInfo { kind: ElementKind::Float64, size: 8, name: "float64", dtype: "f8" },
];

impl ElementKind {
    /// Every kind, in table order.
    pub const ALL: [ElementKind; 10] = [
        Self::UInt8,
        Self::Int8,
        Self::UInt16,
        Self::Int16,
        Self::UInt32,
        Self::Int32,
        Self::UInt64,
        Self::Int64,
        Self::Float32,
        Self::Float64,
    ];

    fn info(self) -> &'static KindInfo {
        // The table is indexed in declaration order.
        &KIND_TABLE[self as usize]
    }

    /// Bytes per element.
    #[must_use]
    pub fn size(self) -> usize {
        self.info().size
    }

    /// Canonical header name, e.g. `"uint16"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// numpy-style dtype string including byte order, e.g. `">f8"`.
    ///
    /// Single-byte kinds have no byte order and use `|`.
    #[must_use]
    pub fn dtype(self, order: ByteOrder) -> String {
        let info = self.info();
        let prefix = match (info.size, order) {
            (1, _) => '|',
            (_, ByteOrder::Little) => '<',
            (_, ByteOrder::Big) => '>',
        };
        format!("{prefix}{}", info.dtype)
    }

    #[must_use]
    pub fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Resolve the header's `type` attribute.
    ///
    /// # Errors
    ///
    /// [`TypeError::UnsupportedDataType`] for any name that is not a
    /// numeric kind or alias. This includes `"string"`.
    pub fn from_type_name(name: Option<&str>) -> Result<Self, TypeError> {
        match name {
            None | Some("float64" | "float") => Ok(Self::Float64),
            Some("int") => Ok(Self::Int64),
            Some(other) => KIND_TABLE
                .iter()
                .find(|info| info.name == other)
                .map(|info| info.kind)
                .ok_or_else(|| TypeError::UnsupportedDataType {
                    name: other.to_owned(),
                }),
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
