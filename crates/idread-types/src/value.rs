use idread_wire::ByteOrder;
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::channel::shape_element_count;
use crate::element::ElementKind;
use crate::error::TypeError;

/// One decoded element.
///
/// Serializes as the bare number so decoded scalars look the same in JSON
/// output as they did on the producer side.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Scalar {
    UInt8(u8),
    Int8(i8),
    UInt16(u16),
    Int16(i16),
    UInt32(u32),
    Int32(i32),
    UInt64(u64),
    Int64(i64),
    Float32(f32),
    Float64(f64),
}

/// A flat, typed element buffer.
#[derive(Clone, Debug, PartialEq)]
pub enum Elements {
    UInt8(Vec<u8>),
    Int8(Vec<i8>),
    UInt16(Vec<u16>),
    Int16(Vec<i16>),
    UInt32(Vec<u32>),
    Int32(Vec<i32>),
    UInt64(Vec<u64>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

// Dispatch the same expression over every variant of a typed enum.
macro_rules! each_variant {
    ($enum:ident, $value:expr, $inner:ident => $body:expr) => {
        match $value {
            $enum::UInt8($inner) => $body,
            $enum::Int8($inner) => $body,
            $enum::UInt16($inner) => $body,
            $enum::Int16($inner) => $body,
            $enum::UInt32($inner) => $body,
            $enum::Int32($inner) => $body,
            $enum::UInt64($inner) => $body,
            $enum::Int64($inner) => $body,
            $enum::Float32($inner) => $body,
            $enum::Float64($inner) => $body,
        }
    };
}

macro_rules! decode_as {
    ($bytes:expr, $order:expr, $ty:ty) => {{
        const N: usize = std::mem::size_of::<$ty>();
        $bytes
            .chunks_exact(N)
            .map(|chunk| {
                let mut raw = [0u8; N];
                raw.copy_from_slice(chunk);
                match $order {
                    ByteOrder::Little => <$ty>::from_le_bytes(raw),
                    ByteOrder::Big => <$ty>::from_be_bytes(raw),
                }
            })
            .collect::<Vec<$ty>>()
    }};
}

macro_rules! write_as {
    ($values:expr, $order:expr, $out:expr) => {
        for v in $values {
            match $order {
                ByteOrder::Little => $out.extend_from_slice(&v.to_le_bytes()),
                ByteOrder::Big => $out.extend_from_slice(&v.to_be_bytes()),
            }
        }
    };
}

impl Scalar {
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::UInt8(_) => ElementKind::UInt8,
            Self::Int8(_) => ElementKind::Int8,
            Self::UInt16(_) => ElementKind::UInt16,
            Self::Int16(_) => ElementKind::Int16,
            Self::UInt32(_) => ElementKind::UInt32,
            Self::Int32(_) => ElementKind::Int32,
            Self::UInt64(_) => ElementKind::UInt64,
            Self::Int64(_) => ElementKind::Int64,
            Self::Float32(_) => ElementKind::Float32,
            Self::Float64(_) => ElementKind::Float64,
        }
    }

    /// Append the element bytes in `order`.
    pub fn write_bytes(&self, order: ByteOrder, out: &mut Vec<u8>) {
        each_variant!(Scalar, self, v => write_as!(std::iter::once(v), order, out));
    }

    /// Lossy conversion for display and statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::UInt8(v) => f64::from(v),
            Self::Int8(v) => f64::from(v),
            Self::UInt16(v) => f64::from(v),
            Self::Int16(v) => f64::from(v),
            Self::UInt32(v) => f64::from(v),
            Self::Int32(v) => f64::from(v),
            Self::UInt64(v) => v as f64,
            Self::Int64(v) => v as f64,
            Self::Float32(v) => f64::from(v),
            Self::Float64(v) => v,
        }
    }
}

impl Elements {
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::UInt8(_) => ElementKind::UInt8,
            Self::Int8(_) => ElementKind::Int8,
            Self::UInt16(_) => ElementKind::UInt16,
            Self::Int16(_) => ElementKind::Int16,
            Self::UInt32(_) => ElementKind::UInt32,
            Self::Int32(_) => ElementKind::Int32,
            Self::UInt64(_) => ElementKind::UInt64,
            Self::Int64(_) => ElementKind::Int64,
            Self::Float32(_) => ElementKind::Float32,
            Self::Float64(_) => ElementKind::Float64,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        each_variant!(Elements, self, v => v.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Interpret raw payload bytes as elements of `kind`.
    ///
    /// # Errors
    ///
    /// [`TypeError::PayloadNotAligned`] if `bytes` is not a whole number
    /// of elements.
    pub fn decode(kind: ElementKind, order: ByteOrder, bytes: &[u8]) -> Result<Self, TypeError> {
        if bytes.len() % kind.size() != 0 {
            return Err(TypeError::PayloadNotAligned {
                kind,
                len: bytes.len(),
            });
        }

        Ok(match kind {
            ElementKind::UInt8 => Self::UInt8(bytes.to_vec()),
            ElementKind::Int8 => Self::Int8(decode_as!(bytes, order, i8)),
            ElementKind::UInt16 => Self::UInt16(decode_as!(bytes, order, u16)),
            ElementKind::Int16 => Self::Int16(decode_as!(bytes, order, i16)),
            ElementKind::UInt32 => Self::UInt32(decode_as!(bytes, order, u32)),
            ElementKind::Int32 => Self::Int32(decode_as!(bytes, order, i32)),
            ElementKind::UInt64 => Self::UInt64(decode_as!(bytes, order, u64)),
            ElementKind::Int64 => Self::Int64(decode_as!(bytes, order, i64)),
            ElementKind::Float32 => Self::Float32(decode_as!(bytes, order, f32)),
            ElementKind::Float64 => Self::Float64(decode_as!(bytes, order, f64)),
        })
    }

    /// Append every element's bytes in `order`.
    pub fn write_bytes(&self, order: ByteOrder, out: &mut Vec<u8>) {
        out.reserve(self.len() * self.kind().size());
        each_variant!(Elements, self, v => write_as!(v, order, out));
    }

    #[must_use]
    pub fn to_bytes(&self, order: ByteOrder) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_bytes(order, &mut out);
        out
    }

    /// Element at `index`, if in range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Scalar> {
        match self {
            Self::UInt8(v) => v.get(index).copied().map(Scalar::UInt8),
            Self::Int8(v) => v.get(index).copied().map(Scalar::Int8),
            Self::UInt16(v) => v.get(index).copied().map(Scalar::UInt16),
            Self::Int16(v) => v.get(index).copied().map(Scalar::Int16),
            Self::UInt32(v) => v.get(index).copied().map(Scalar::UInt32),
            Self::Int32(v) => v.get(index).copied().map(Scalar::Int32),
            Self::UInt64(v) => v.get(index).copied().map(Scalar::UInt64),
            Self::Int64(v) => v.get(index).copied().map(Scalar::Int64),
            Self::Float32(v) => v.get(index).copied().map(Scalar::Float32),
            Self::Float64(v) => v.get(index).copied().map(Scalar::Float64),
        }
    }
}

macro_rules! impl_from_vec {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for Elements {
                fn from(values: Vec<$ty>) -> Self {
                    Self::$variant(values)
                }
            }

            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_vec!(
    u8 => UInt8,
    i8 => Int8,
    u16 => UInt16,
    i16 => Int16,
    u32 => UInt32,
    i32 => Int32,
    u64 => UInt64,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
);

/// A shaped element buffer, slowest dimension first.
///
/// Serializes as nested JSON lists following `shape`, so a `[2, 3]` array
/// becomes `[[a, b, c], [d, e, f]]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Array {
    shape: Vec<usize>,
    elements: Elements,
}

impl Array {
    /// Shape `elements` as `shape`.
    ///
    /// # Errors
    ///
    /// [`TypeError::ShapeMismatch`] if the element count is not the
    /// product of the dimensions, including when that product overflows.
    pub fn new(shape: Vec<usize>, elements: Elements) -> Result<Self, TypeError> {
        if shape_element_count(&shape) != Some(elements.len()) {
            return Err(TypeError::ShapeMismatch {
                shape,
                elements: elements.len(),
            });
        }
        Ok(Self { shape, elements })
    }

    /// A one-dimensional array holding every element.
    #[must_use]
    pub fn flat(elements: Elements) -> Self {
        Self {
            shape: vec![elements.len()],
            elements,
        }
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[must_use]
    pub fn elements(&self) -> &Elements {
        &self.elements
    }

    #[must_use]
    pub fn into_elements(self) -> Elements {
        self.elements
    }
}

struct Nested<'a> {
    shape: &'a [usize],
    elements: &'a Elements,
    offset: usize,
}

impl Serialize for Nested<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Some((&outer, inner)) = self.shape.split_first() else {
            return self.elements.get(self.offset).serialize(serializer);
        };

        let stride: usize = inner.iter().product();
        let mut seq = serializer.serialize_seq(Some(outer))?;
        for i in 0..outer {
            seq.serialize_element(&Nested {
                shape: inner,
                elements: self.elements,
                offset: self.offset + i * stride,
            })?;
        }
        seq.end()
    }
}

impl Serialize for Array {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Nested {
            shape: &self.shape,
            elements: &self.elements,
            offset: 0,
        }
        .serialize(serializer)
    }
}

/// A decoded channel value: a single scalar or a shaped array.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),
    Array(Array),
}

impl Value {
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Scalar(s) => s.kind(),
            Self::Array(a) => a.elements.kind(),
        }
    }

    /// Shape of one value; empty for scalars.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Scalar(_) => &[],
            Self::Array(a) => a.shape(),
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Array(a) => a.elements.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append the element bytes in `order`.
    pub fn write_bytes(&self, order: ByteOrder, out: &mut Vec<u8>) {
        match self {
            Self::Scalar(s) => s.write_bytes(order, out),
            Self::Array(a) => a.elements.write_bytes(order, out),
        }
    }

    #[must_use]
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Self::Scalar(s) => Some(*s),
            Self::Array(_) => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Scalar(_) => None,
            Self::Array(a) => Some(a),
        }
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Self::Array(array)
    }
}
