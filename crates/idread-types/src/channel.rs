use idread_wire::ByteOrder;

use crate::element::ElementKind;
use crate::error::TypeError;

/// Payload compression declared per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    #[default]
    None,
    /// Bit-shuffled elements in independently LZ4-compressed blocks.
    BitshuffleLz4,
}

impl Compression {
    /// Header name of the bitshuffle-LZ4 scheme.
    pub const BITSHUFFLE_LZ4: &'static str = "bitshuffle_lz4";

    /// Resolve the header's `compression` attribute.
    ///
    /// # Errors
    ///
    /// [`TypeError::UnsupportedCompression`] for names other than
    /// `"none"` and `"bitshuffle_lz4"`.
    pub fn from_name(name: Option<&str>) -> Result<Self, TypeError> {
        match name {
            None | Some("none") => Ok(Self::None),
            Some(Self::BITSHUFFLE_LZ4) => Ok(Self::BitshuffleLz4),
            Some(other) => Err(TypeError::UnsupportedCompression {
                name: other.to_owned(),
            }),
        }
    }

    /// Header name, or `None` when the attribute should be omitted.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::BitshuffleLz4 => Some(Self::BITSHUFFLE_LZ4),
        }
    }
}

/// Everything the value decoder needs to read one channel's events.
///
/// Built once per header frame and never modified afterwards. The element
/// size is derived from `kind`, so the two cannot disagree.
///
/// ```text
/// ┌──────────────┬──────────────────────────────────────────────────┐
/// │ Field        │ Meaning                                          │
/// ├──────────────┼──────────────────────────────────────────────────┤
/// │ name         │ channel name                                     │
/// │ backend      │ data source / grouping tag                       │
/// │ kind         │ element type                                     │
/// │ byte_order   │ order of event metadata and elements             │
/// │ shape        │ elements per dimension, slowest first; [1] = scalar │
/// │ compression  │ payload compression                              │
/// └──────────────┴──────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelDescriptor {
    pub name: String,
    pub backend: String,
    pub kind: ElementKind,
    pub byte_order: ByteOrder,
    pub shape: Vec<usize>,
    pub compression: Compression,
}

impl ChannelDescriptor {
    /// A little-endian, uncompressed scalar channel.
    pub fn new(name: impl Into<String>, backend: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            name: name.into(),
            backend: backend.into(),
            kind,
            byte_order: ByteOrder::Little,
            shape: vec![1],
            compression: Compression::None,
        }
    }

    /// Set the shape (slowest dimension first). An empty shape means scalar.
    #[must_use]
    pub fn with_shape(mut self, shape: Vec<usize>) -> Self {
        self.shape = if shape.is_empty() { vec![1] } else { shape };
        self
    }

    #[must_use]
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Bytes per element.
    #[must_use]
    pub fn element_size(&self) -> usize {
        self.kind.size()
    }

    /// True for `shape == [1]`, which decodes to a bare scalar.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.shape == [1]
    }

    /// Elements per event implied by the shape, or `None` if the
    /// dimensions multiply past `usize`.
    #[must_use]
    pub fn element_count(&self) -> Option<usize> {
        shape_element_count(&self.shape)
    }
}

/// Product of `shape`, checked for overflow.
#[must_use]
pub fn shape_element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}
