use std::collections::HashMap;
use std::convert::Infallible;

use idread_types::{Collector, Event};
use serde::Serialize;

use crate::config::FieldSelection;
use crate::record::Record;

/// Channel identity as emitted in dictionary output.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ChannelId {
    pub name: String,
    pub backend: String,
}

/// Every record of one channel.
///
/// ```json
/// { "channel": { "name": "SINEG01:X1", "backend": "sf-databuffer" },
///   "data": [ { "value": 0.5, "pulseId": 1 }, ... ] }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChannelGroup {
    pub channel: ChannelId,
    pub data: Vec<Record>,
}

/// Groups events per channel.
///
/// Output groups are ordered by backend (first seen first), then by
/// channel within the backend (first seen first). Records within a group
/// keep stream order.
pub struct DictionaryCollector {
    selection: FieldSelection,
    backends: Vec<BackendGroups>,
    /// backend name → position in `backends`
    backend_index: HashMap<String, usize>,
}

/// The groups of one backend, in first-seen order.
struct BackendGroups {
    groups: Vec<ChannelGroup>,
    /// channel name → position in `groups`
    index: HashMap<String, usize>,
}

impl DictionaryCollector {
    #[must_use]
    pub fn new(selection: FieldSelection) -> Self {
        Self {
            selection,
            backends: Vec::new(),
            backend_index: HashMap::new(),
        }
    }

    fn group(&mut self, backend: &str, channel: &str) -> &mut ChannelGroup {
        let b = match self.backend_index.get(backend) {
            Some(&b) => b,
            None => {
                self.backends.push(BackendGroups {
                    groups: Vec::new(),
                    index: HashMap::new(),
                });
                let b = self.backends.len() - 1;
                self.backend_index.insert(backend.to_owned(), b);
                b
            }
        };

        let entry = &mut self.backends[b];
        let g = match entry.index.get(channel) {
            Some(&g) => g,
            None => {
                entry.groups.push(ChannelGroup {
                    channel: ChannelId {
                        name: channel.to_owned(),
                        backend: backend.to_owned(),
                    },
                    data: Vec::new(),
                });
                let g = entry.groups.len() - 1;
                entry.index.insert(channel.to_owned(), g);
                g
            }
        };
        &mut entry.groups[g]
    }
}

impl Default for DictionaryCollector {
    fn default() -> Self {
        Self::new(FieldSelection::default())
    }
}

impl Collector for DictionaryCollector {
    type Output = Vec<ChannelGroup>;
    type Error = Infallible;

    fn accept(&mut self, event: Event<'_>) -> Result<(), Self::Error> {
        let record = Record::new(&event, self.selection);
        self.group(event.backend, event.channel).data.push(record);
        Ok(())
    }

    fn finalize(self) -> Result<Self::Output, Self::Error> {
        Ok(self
            .backends
            .into_iter()
            .flat_map(|backend| backend.groups)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventField;
    use idread_types::{EventData, Scalar};

    fn feed(collector: &mut DictionaryCollector, channel: &str, backend: &str, pulse: i64) {
        let data = EventData::new(Scalar::Int64(pulse)).with_pulse_id(pulse);
        collector
            .accept(Event::new(channel, backend, Some(&data)))
            .unwrap();
    }

    #[test]
    fn same_channel_name_in_two_backends_stays_apart() {
        let mut collector = DictionaryCollector::default();
        feed(&mut collector, "X", "a", 1);
        feed(&mut collector, "X", "b", 2);
        feed(&mut collector, "X", "a", 3);

        let groups = collector.finalize().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].channel.backend, "a");
        assert_eq!(groups[0].data.len(), 2);
        assert_eq!(groups[1].channel.backend, "b");
        assert_eq!(groups[1].data.len(), 1);
    }

    #[test]
    fn groups_by_backend_then_channel() {
        let mut collector = DictionaryCollector::default();
        feed(&mut collector, "X", "sf-databuffer", 1);
        feed(&mut collector, "IMG", "sf-imagebuffer", 1);
        feed(&mut collector, "Y", "sf-databuffer", 1);
        feed(&mut collector, "X", "sf-databuffer", 2);
        feed(&mut collector, "IMG", "sf-imagebuffer", 2);

        let groups = collector.finalize().unwrap();
        let order: Vec<_> = groups
            .iter()
            .map(|g| (g.channel.backend.as_str(), g.channel.name.as_str(), g.data.len()))
            .collect();
        assert_eq!(
            order,
            [
                ("sf-databuffer", "X", 2),
                ("sf-databuffer", "Y", 1),
                ("sf-imagebuffer", "IMG", 2),
            ]
        );
        assert_eq!(groups[0].data[1].pulse_id, Some(2));
    }

    #[test]
    fn same_name_on_two_backends_is_two_groups() {
        let mut collector = DictionaryCollector::default();
        feed(&mut collector, "X", "a", 1);
        feed(&mut collector, "X", "b", 1);
        assert_eq!(collector.finalize().unwrap().len(), 2);
    }

    #[test]
    fn output_shape() {
        let selection = FieldSelection::empty().with(EventField::PulseId);
        let mut collector = DictionaryCollector::new(selection);
        feed(&mut collector, "X", "sf", 7);
        collector.accept(Event::new("X", "sf", None)).unwrap();
        let json = serde_json::to_string(&collector.finalize().unwrap()).unwrap();
        assert_eq!(
            json,
            r#"[{"channel":{"name":"X","backend":"sf"},"data":[{"pulseId":7},{"pulseId":null}]}]"#
        );
    }
}
