use std::collections::HashMap;
use std::convert::Infallible;

use idread_types::{Collector, ElementKind, Event};
use serde::Serialize;

/// Per-channel counts gathered by [`ChannelStats`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChannelSummary {
    pub channel: String,
    pub backend: String,
    /// Kind of the first non-null value, if any.
    pub kind: Option<ElementKind>,
    pub events: u64,
    pub null_events: u64,
    pub first_pulse_id: Option<i64>,
    pub last_pulse_id: Option<i64>,
}

/// Counts events per channel without keeping values.
///
/// Summaries come out in first-seen order.
#[derive(Default)]
pub struct ChannelStats {
    summaries: Vec<ChannelSummary>,
    index: HashMap<(String, String), usize>,
}

impl ChannelStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Collector for ChannelStats {
    type Output = Vec<ChannelSummary>;
    type Error = Infallible;

    fn accept(&mut self, event: Event<'_>) -> Result<(), Self::Error> {
        let key = (event.backend.to_owned(), event.channel.to_owned());
        let slot = *self.index.entry(key).or_insert_with(|| {
            self.summaries.push(ChannelSummary {
                channel: event.channel.to_owned(),
                backend: event.backend.to_owned(),
                kind: None,
                events: 0,
                null_events: 0,
                first_pulse_id: None,
                last_pulse_id: None,
            });
            self.summaries.len() - 1
        });
        let summary = &mut self.summaries[slot];

        summary.events += 1;
        match event.data {
            None => summary.null_events += 1,
            Some(data) => {
                summary.kind.get_or_insert(data.value.kind());
                summary.first_pulse_id.get_or_insert(data.pulse_id);
                summary.last_pulse_id = Some(data.pulse_id);
            }
        }
        Ok(())
    }

    fn finalize(self) -> Result<Self::Output, Self::Error> {
        Ok(self.summaries)
    }
}
