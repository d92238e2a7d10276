use std::path::PathBuf;

use idread_types::ElementKind;

/// Errors raised by the collectors and the dataset container.
///
/// ```text
/// ┌─────────────────────┬──────────────────────────────────────────────┐
/// │ Variant             │ Cause                                        │
/// ├─────────────────────┼──────────────────────────────────────────────┤
/// │ UnknownField        │ field name not in the selectable set         │
/// │ ZeroChannels        │ mapping collector built for 0 channels       │
/// │ Locked              │ container held by a writer (or left locked)  │
/// │ MissingManifest     │ container was never finalized                │
/// │ KindMismatch        │ value type differs from the dataset's        │
/// │ RowShapeMismatch    │ value shape differs from the dataset's       │
/// │ UnknownDataset      │ reader asked for a dataset that isn't there  │
/// │ Corrupt             │ dataset file disagrees with the manifest     │
/// │ Io / Json           │ filesystem or manifest serialization         │
/// └─────────────────────┴──────────────────────────────────────────────┘
/// ```
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("unknown event field {0:?} (expected value, time, pulseId, status, severity or timeRaw)")]
    UnknownField(String),

    #[error("a mapping collector needs at least one channel per round")]
    ZeroChannels,

    #[error("container {} is locked", path.display())]
    Locked { path: PathBuf },

    #[error("container {} has no manifest", path.display())]
    MissingManifest { path: PathBuf },

    #[error("dataset {dataset} holds {expected} values, got {actual}")]
    KindMismatch {
        dataset: String,
        expected: ElementKind,
        actual: ElementKind,
    },

    /// A row's shape differs from the first row of its dataset.
    ///
    /// One-dimensional channels whose waveform length changes between
    /// events land here: a dataset holds fixed-shape rows only.
    #[error(
        "dataset {dataset} rows have shape {expected:?}, got {actual:?}; \
         rows of one dataset cannot change shape"
    )]
    RowShapeMismatch {
        dataset: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("no dataset named {0}")]
    UnknownDataset(String),

    #[error("dataset {dataset} is corrupt: {detail}")]
    Corrupt { dataset: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
