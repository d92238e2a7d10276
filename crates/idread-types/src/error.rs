use idread_wire::WireError;

use crate::element::ElementKind;

/// Errors raised while interpreting channel metadata or element payloads.
///
/// These sit one level above [`WireError`]: the bytes were framed
/// correctly, but their meaning cannot be recovered.
///
/// # Error hierarchy
///
/// ```text
/// ┌──────────────────────────────────────────────────────────┐
/// │ TypeError (this crate)                                   │
/// │   ├── UnsupportedDataType    ← "string" or unknown type  │
/// │   ├── UnsupportedCompression ← unknown compression name  │
/// │   ├── PayloadNotAligned      ← bytes % element size != 0 │
/// │   ├── ShapeMismatch          ← element count vs shape    │
/// │   ├── InvalidShape           ← dimension out of range    │
/// │   ├── ShapeOverflow          ← element count overflows   │
/// │   ├── Json                   ← header document malformed │
/// │   └── Wire                   ← low-level framing error   │
/// └──────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
  /// The header declared an element type this decoder cannot read.
  ///
  /// String channels land here as well. Without a fixed element size the
  /// rest of the stream cannot be framed, so this is always fatal.
  #[error("unsupported data type: {name:?}")]
  UnsupportedDataType { name: String },

  /// The header declared a payload compression other than none or
  /// bitshuffle-LZ4.
  #[error("unsupported compression: {name:?}")]
  UnsupportedCompression { name: String },

  /// A payload's byte length is not a whole number of elements.
  #[error("{len} payload bytes are not a whole number of {kind:?} elements")]
  PayloadNotAligned { kind: ElementKind, len: usize },

  /// A decoded element count does not fit the declared shape.
  #[error("{elements} elements cannot be shaped as {shape:?}")]
  ShapeMismatch { shape: Vec<usize>, elements: usize },

  /// A shape dimension does not fit in `usize`.
  #[error("invalid shape dimension {dimension}")]
  InvalidShape { dimension: u64 },

  /// The dimensions of a shape multiply past `usize`.
  #[error("shape {shape:?} holds more elements than fit in memory")]
  ShapeOverflow { shape: Vec<usize> },

  /// The header JSON document could not be parsed or serialized.
  #[error("malformed header document: {0}")]
  Json(#[from] serde_json::Error),

  #[error(transparent)]
  Wire(#[from] WireError),
}
