use idread_wire::FrameKind;

/// A recoverable condition met while decoding.
///
/// Warnings never stop the decode. The affected bytes are drained and the
/// stream continues at the next frame boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeWarning {
    /// A frame kind other than header or values. `skipped` body bytes
    /// were drained.
    UnknownFrameKind { kind: i16, offset: u64, skipped: u64 },

    /// A value frame arrived while no channels were declared.
    ValuesBeforeHeader { offset: u64, skipped: u64 },

    /// A value frame declared more bytes than its events used.
    TrailingBytes { offset: u64, bytes: u64 },
}

impl std::fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownFrameKind {
                kind,
                offset,
                skipped,
            } => write!(
                f,
                "unknown frame kind {kind} at offset {offset}, skipped {skipped} bytes"
            ),
            Self::ValuesBeforeHeader { offset, skipped } => write!(
                f,
                "value frame at offset {offset} with no channels declared, skipped {skipped} bytes"
            ),
            Self::TrailingBytes { offset, bytes } => write!(
                f,
                "value frame at offset {offset} has {bytes} unused trailing bytes"
            ),
        }
    }
}

/// What happened to one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A header installed `channels` descriptors.
    Header { channels: usize },
    /// A value frame delivered `events` events, `null_events` of them
    /// null, and left `trailing` bytes unused.
    Values {
        events: usize,
        null_events: usize,
        trailing: u64,
    },
    /// The frame body was drained without being decoded.
    Skipped(DecodeWarning),
}

/// One frame as seen by the decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameInfo {
    /// Stream offset of the length prefix.
    pub offset: u64,
    pub kind: FrameKind,
    /// The size field as read: body length plus the 2-byte kind tag.
    pub size: i64,
    pub outcome: FrameOutcome,
}

/// Running totals for one decode.
///
/// ```text
/// ┌────────────────┬─────────────────────────────────────────────┐
/// │ Field          │ Counts                                      │
/// ├────────────────┼─────────────────────────────────────────────┤
/// │ frames         │ every frame read, skipped ones included     │
/// │ header_frames  │ header frames decoded                       │
/// │ value_frames   │ value frames decoded                        │
/// │ events         │ events delivered, null ones included        │
/// │ null_events    │ events with event size 0                    │
/// │ bytes          │ stream bytes consumed                       │
/// │ warnings       │ recoverable conditions, in stream order     │
/// └────────────────┴─────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeReport {
    pub frames: u64,
    pub header_frames: u64,
    pub value_frames: u64,
    pub events: u64,
    pub null_events: u64,
    pub bytes: u64,
    pub warnings: Vec<DecodeWarning>,
}

impl DecodeReport {
    /// True if any recoverable condition was met.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}
