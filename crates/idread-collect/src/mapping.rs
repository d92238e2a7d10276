use idread_types::{ChannelDescriptor, Collector, Event};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, warn};

use crate::config::FieldSelection;
use crate::error::CollectError;
use crate::record::Record;

/// A record that also names its channel.
///
/// ```json
/// { "channel": "SINEG01:X1", "backend": "sf-databuffer", "value": 0.5, "pulseId": 1 }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct MappingRecord {
    pub channel: String,
    pub backend: String,
    pub record: Record,
}

impl Serialize for MappingRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("channel", &self.channel)?;
        map.serialize_entry("backend", &self.backend)?;
        self.record.serialize_fields(&mut map)?;
        map.end()
    }
}

/// Groups every `N` consecutive events into a round.
///
/// A value frame delivers exactly one event per channel, so with `N` set
/// to the channel count each round is one pulse across all channels.
/// Null events occupy their slot as `None`.
///
/// The last round is flushed by [`finalize`](Collector::finalize) even
/// if the stream ended part way through it.
pub struct MappingCollector {
    selection: FieldSelection,
    channels: usize,
    /// Adopt the channel count of every header.
    follow_header: bool,
    round: Vec<Option<MappingRecord>>,
    rounds: Vec<Vec<Option<MappingRecord>>>,
}

impl MappingCollector {
    /// A collector with a fixed round size.
    ///
    /// # Errors
    ///
    /// [`CollectError::ZeroChannels`] if `channels` is 0.
    pub fn new(channels: usize, selection: FieldSelection) -> Result<Self, CollectError> {
        if channels == 0 {
            return Err(CollectError::ZeroChannels);
        }
        Ok(Self {
            selection,
            channels,
            follow_header: false,
            round: Vec::with_capacity(channels),
            rounds: Vec::new(),
        })
    }

    /// A collector whose round size is taken from each header frame.
    #[must_use]
    pub fn from_header(selection: FieldSelection) -> Self {
        Self {
            selection,
            channels: 0,
            follow_header: true,
            round: Vec::new(),
            rounds: Vec::new(),
        }
    }

    /// Current round size; 0 until a header is seen by a header-driven
    /// collector.
    #[must_use]
    pub fn channels(&self) -> usize {
        self.channels
    }

    fn flush_partial(&mut self) {
        if self.round.is_empty() {
            return;
        }
        warn!(
            expected = self.channels,
            got = self.round.len(),
            "keeping incomplete mapping round"
        );
        self.rounds.push(std::mem::take(&mut self.round));
    }
}

impl Collector for MappingCollector {
    type Output = Vec<Vec<Option<MappingRecord>>>;
    type Error = CollectError;

    fn on_header(&mut self, channels: &[ChannelDescriptor]) -> Result<(), Self::Error> {
        if self.follow_header {
            self.flush_partial();
            self.channels = channels.len();
            debug!(channels = self.channels, "mapping round size from header");
        } else if channels.len() != self.channels {
            warn!(
                configured = self.channels,
                header = channels.len(),
                "header channel count differs from mapping round size"
            );
        }
        Ok(())
    }

    fn accept(&mut self, event: Event<'_>) -> Result<(), Self::Error> {
        if self.channels == 0 {
            return Err(CollectError::ZeroChannels);
        }

        let record = event.data.map(|_| MappingRecord {
            channel: event.channel.to_owned(),
            backend: event.backend.to_owned(),
            record: Record::new(&event, self.selection),
        });
        self.round.push(record);

        if self.round.len() == self.channels {
            let full = std::mem::replace(&mut self.round, Vec::with_capacity(self.channels));
            self.rounds.push(full);
        }
        Ok(())
    }

    fn finalize(mut self) -> Result<Self::Output, Self::Error> {
        self.flush_partial();
        Ok(self.rounds)
    }
}
