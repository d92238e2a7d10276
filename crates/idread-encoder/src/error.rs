use idread_types::{ElementKind, TypeError};
use idread_wire::WireError;

/// Errors that can occur while producing an idread stream.
///
/// Error hierarchy:
///
/// ```text
///   EncodeError
///   ├── ChannelCountMismatch ← value frame does not cover every channel
///   ├── KindMismatch         ← value element type differs from the header
///   ├── EventTooLarge        ← event size does not fit the i32 field
///   ├── Type(TypeError)      ← header serialization
///   └── Wire(WireError)      ← bit-shuffle layout
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("value frame has {actual} events but the header declares {expected} channels")]
    ChannelCountMismatch { expected: usize, actual: usize },

    #[error("channel {channel:?} is declared {expected} but the value is {actual}")]
    KindMismatch {
        channel: String,
        expected: ElementKind,
        actual: ElementKind,
    },

    #[error("event for channel {channel:?} is {size} bytes, more than an i32 size field can hold")]
    EventTooLarge { channel: String, size: usize },

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Wire(#[from] WireError),
}
