use idread_types::TypeError;
use idread_wire::WireError;

/// Coarse classification of a [`DecodeError`].
///
/// Every decode error is fatal; the class tells the caller whose fault
/// it was. Recoverable conditions never surface as errors, they are
/// reported as [`DecodeWarning`](crate::DecodeWarning)s instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// The stream violates the wire format.
    Protocol,
    /// The byte source ended early or failed.
    Transport,
    /// The collector refused an event or header.
    Collector,
}

/// Errors that can occur while decoding an idread stream.
///
/// Error hierarchy:
///
/// ```text
///   DecodeError
///   ├── Protocol
///   │   ├── InvalidFrameSize             ← length prefix below 2
///   │   ├── FrameTooLarge                ← body exceeds max_frame_size
///   │   ├── ShortHeader                  ← header body lacks hash/compression
///   │   ├── UnsupportedHeaderCompression ← compression byte not 0 or 1
///   │   ├── InvalidUtf8                  ← header document not UTF-8
///   │   ├── Type(TypeError)              ← bad JSON, unsupported type, ...
///   │   ├── FrameOverrun                 ← events need more than the frame holds
///   │   ├── InvalidEventSize             ← negative or below metadata size
///   │   ├── ShapeMismatch                ← element count vs declared shape
///   │   ├── CorruptBlock                 ← bitshuffle-LZ4 payload malformed
///   │   └── DecompressionBomb            ← inflated size above limit
///   ├── Transport
///   │   ├── Truncated                    ← source ended inside a frame
///   │   └── Io(std::io::Error)           ← source failed
///   └── Collector                        ← sink error, boxed
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid frame size {size} at offset {offset}")]
    InvalidFrameSize { size: i64, offset: u64 },

    /// The frame declares a body larger than the configured limit. The
    /// body is not read.
    #[error("frame at offset {offset} declares {size} body bytes, limit is {limit}")]
    FrameTooLarge { size: u64, limit: u64, offset: u64 },

    /// A header body too short to hold the 8-byte hash and the
    /// compression byte.
    #[error("header frame at offset {offset} has only {len} body bytes")]
    ShortHeader { len: usize, offset: u64 },

    #[error("unsupported header compression {value}")]
    UnsupportedHeaderCompression { value: u8 },

    #[error("header document is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Header document or payload could not be interpreted.
    ///
    /// Covers malformed JSON, unsupported element types (including
    /// strings), unsupported compressions, and payloads that are not a
    /// whole number of elements.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// The events of a value frame need more bytes than its size field
    /// declares.
    #[error("value frame at offset {offset} declares size {frame_size} but its events need at least {required}")]
    FrameOverrun {
        offset: u64,
        frame_size: i64,
        required: u64,
    },

    /// An event size that is negative or too small for the metadata.
    #[error("invalid event size {size} for channel {channel:?} in frame at offset {offset}")]
    InvalidEventSize {
        channel: String,
        size: i32,
        offset: u64,
    },

    #[error("channel {channel:?}: {elements} elements do not fit shape {shape:?}")]
    ShapeMismatch {
        channel: String,
        shape: Vec<usize>,
        elements: usize,
    },

    /// A bitshuffle-LZ4 payload could not be inflated.
    #[error("corrupt compressed block: {0}")]
    CorruptBlock(String),

    /// A compressed payload declares an inflated size above the limit.
    #[error("decompressed size {actual} exceeds limit {limit}")]
    DecompressionBomb { actual: u64, limit: usize },

    /// The source ended inside a frame prefix or body.
    #[error("stream truncated at offset {offset}: {needed} more bytes expected")]
    Truncated { offset: u64, needed: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The collector failed. The original error is kept as the source.
    #[error("collector failed: {0}")]
    Collector(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl DecodeError {
    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            Self::Truncated { .. } | Self::Io(_) => DecodeErrorKind::Transport,
            Self::Collector(_) => DecodeErrorKind::Collector,
            _ => DecodeErrorKind::Protocol,
        }
    }

    pub(crate) fn collector<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Collector(Box::new(error))
    }
}

impl From<WireError> for DecodeError {
    /// Map frame-prefix errors onto the decode taxonomy.
    ///
    /// Cursor reads inside a body are mapped by the value decoder itself,
    /// since running off a body is an overrun rather than a truncation.
    fn from(error: WireError) -> Self {
        match error {
            WireError::UnexpectedEof { offset, needed } => Self::Truncated {
                offset,
                needed: needed as u64,
            },
            WireError::InvalidFrameSize { size, offset } => Self::InvalidFrameSize { size, offset },
            WireError::ShuffleMisaligned { len, element_size } => Self::CorruptBlock(format!(
                "{len} bytes do not split into groups of 8 elements of {element_size} bytes"
            )),
            WireError::Io(e) => Self::Io(e),
        }
    }
}
