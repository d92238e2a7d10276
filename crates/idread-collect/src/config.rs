use std::fmt;
use std::str::FromStr;

use crate::error::CollectError;

/// A per-event field the dictionary and mapping collectors can emit.
///
/// ```text
/// ┌──────────┬──────────┬──────────────────────────────────────────┐
/// │ Variant  │ Key      │ Source                                   │
/// ├──────────┼──────────┼──────────────────────────────────────────┤
/// │ Value    │ value    │ decoded scalar or array                  │
/// │ Time     │ time     │ global time as a local-zone timestamp    │
/// │ PulseId  │ pulseId  │ pulse id                                 │
/// │ Status   │ status   │ alarm status                             │
/// │ Severity │ severity │ alarm severity                           │
/// │ TimeRaw  │ timeRaw  │ global time, integer nanoseconds         │
/// └──────────┴──────────┴──────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventField {
    Value,
    Time,
    PulseId,
    Status,
    Severity,
    TimeRaw,
}

impl EventField {
    /// Every field, in output order.
    pub const ALL: [EventField; 6] = [
        Self::Value,
        Self::Time,
        Self::PulseId,
        Self::Status,
        Self::Severity,
        Self::TimeRaw,
    ];

    /// The output key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Time => "time",
            Self::PulseId => "pulseId",
            Self::Status => "status",
            Self::Severity => "severity",
            Self::TimeRaw => "timeRaw",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for EventField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for EventField {
    type Err = CollectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| CollectError::UnknownField(s.to_owned()))
    }
}

/// The set of fields emitted per record.
///
/// Fields are always emitted in [`EventField::ALL`] order, whatever order
/// they were selected in. The default selects everything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldSelection(u8);

impl FieldSelection {
    #[must_use]
    pub fn all() -> Self {
        Self::ALL_BITS
    }

    #[must_use]
    pub fn empty() -> Self {
        Self(0)
    }

    const ALL_BITS: Self = Self(0b11_1111);

    #[must_use]
    pub fn with(self, field: EventField) -> Self {
        Self(self.0 | field.bit())
    }

    #[must_use]
    pub fn contains(self, field: EventField) -> bool {
        self.0 & field.bit() != 0
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Selected fields in output order.
    pub fn iter(self) -> impl Iterator<Item = EventField> {
        EventField::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl Default for FieldSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<EventField> for FieldSelection {
    fn from_iter<I: IntoIterator<Item = EventField>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl FromStr for FieldSelection {
    type Err = CollectError;

    /// Parse a comma-separated list such as `"value,pulseId"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(EventField::from_str)
            .collect()
    }
}

/// Storage options for the dataset collector.
///
/// ```text
/// ┌───────────────────┬─────────┬──────────────────────────────────────┐
/// │ Field             │ Default │ Meaning                              │
/// ├───────────────────┼─────────┼──────────────────────────────────────┤
/// │ chunk_rows        │ 1000    │ rows added each time a dataset grows │
/// │ compress          │ false   │ shuffle + zstd datasets on finalize  │
/// │ compression_level │ 3       │ zstd level                           │
/// └───────────────────┴─────────┴──────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DatasetOptions {
    pub chunk_rows: u64,
    pub compress: bool,
    pub compression_level: i32,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            chunk_rows: 1000,
            compress: false,
            compression_level: 3,
        }
    }
}
