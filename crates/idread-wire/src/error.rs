/// Errors raised by the byte-level primitives of the idread wire format.
///
/// These know nothing about channels or events: they cover the frame
/// prefix, bounded cursor reads inside a frame body, and the bit-shuffle
/// kernel. Higher layers wrap them with protocol context.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Input ended before a complete field could be read.
    ///
    /// `offset` is where the read started (stream offset for the frame
    /// prefix, body offset for cursor reads) and `needed` the number of
    /// bytes that were missing.
    #[error("unexpected end of input at offset {offset} ({needed} more bytes needed)")]
    UnexpectedEof { offset: u64, needed: usize },

    /// The frame length prefix cannot even hold the 2-byte kind tag.
    #[error("invalid frame size {size} at offset {offset}: must be at least 2")]
    InvalidFrameSize { size: i64, offset: u64 },

    /// Bit-shuffle input is not a whole number of 8-element groups.
    #[error("bitshuffle input of {len} bytes is not a multiple of 8 elements of {element_size} bytes")]
    ShuffleMisaligned { len: usize, element_size: usize },

    /// I/O error from the underlying byte source.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// NOTE `UnexpectedEof` is a short read: a frame promised more bytes than
// the source delivered. `Io` is the source itself failing. Callers map the
// two onto different error kinds, so keep them apart.
