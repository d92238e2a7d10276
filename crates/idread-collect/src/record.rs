use chrono::{DateTime, Local};
use idread_types::{Event, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::config::{EventField, FieldSelection};

/// Convert nanoseconds since the Unix epoch to a local-zone timestamp.
///
/// Full nanosecond precision is kept.
#[must_use]
pub fn local_time(nanos: i64) -> DateTime<Local> {
    DateTime::from_timestamp_nanos(nanos).with_timezone(&Local)
}

/// One event reduced to the selected fields.
///
/// Serializes as a JSON object with one key per selected field, in
/// [`EventField::ALL`] order. For a null event every selected key is
/// present with a `null` value.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    selection: FieldSelection,
    /// Only kept when [`EventField::Value`] is selected.
    pub value: Option<Value>,
    pub pulse_id: Option<i64>,
    pub global_time_nanos: Option<i64>,
    pub status: Option<i8>,
    pub severity: Option<i8>,
}

impl Record {
    #[must_use]
    pub fn new(event: &Event<'_>, selection: FieldSelection) -> Self {
        let value = if selection.contains(EventField::Value) {
            event.value().cloned()
        } else {
            None
        };
        Self {
            selection,
            value,
            pulse_id: event.pulse_id(),
            global_time_nanos: event.global_time_nanos(),
            status: event.status(),
            severity: event.severity(),
        }
    }

    #[must_use]
    pub fn selection(&self) -> FieldSelection {
        self.selection
    }

    /// Local-zone timestamp of the global time.
    #[must_use]
    pub fn time(&self) -> Option<DateTime<Local>> {
        self.global_time_nanos.map(local_time)
    }

    /// Write the selected fields into an already open map.
    pub(crate) fn serialize_fields<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        for field in self.selection.iter() {
            let key = field.key();
            match field {
                EventField::Value => map.serialize_entry(key, &self.value)?,
                EventField::Time => map.serialize_entry(key, &self.time())?,
                EventField::PulseId => map.serialize_entry(key, &self.pulse_id)?,
                EventField::Status => map.serialize_entry(key, &self.status)?,
                EventField::Severity => map.serialize_entry(key, &self.severity)?,
                EventField::TimeRaw => map.serialize_entry(key, &self.global_time_nanos)?,
            }
        }
        Ok(())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.selection.iter().count()))?;
        self.serialize_fields(&mut map)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idread_types::{EventData, Scalar};

    #[test]
    fn selected_fields_only() {
        let data = EventData::new(Scalar::Float64(1.5))
            .with_pulse_id(9)
            .with_times(1_700_000_000_123_456_789, 0)
            .with_alarm(0, 2);
        let selection: FieldSelection = "value,pulseId,timeRaw".parse().unwrap();
        let record = Record::new(&Event::new("A", "b", Some(&data)), selection);
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"value":1.5,"pulseId":9,"timeRaw":1700000000123456789}"#
        );
    }

    #[test]
    fn null_event_has_null_keys() {
        let selection: FieldSelection = "value,severity".parse().unwrap();
        let record = Record::new(&Event::new("A", "b", None), selection);
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"value":null,"severity":null}"#
        );
    }

    #[test]
    fn time_keeps_nanoseconds() {
        let time = local_time(1_700_000_000_123_456_789);
        assert_eq!(time.timestamp(), 1_700_000_000);
        assert_eq!(time.timestamp_subsec_nanos(), 123_456_789);
    }

    #[test]
    fn unselected_value_is_not_cloned() {
        let data = EventData::new(Scalar::Int8(1));
        let selection = FieldSelection::empty().with(EventField::Status);
        let record = Record::new(&Event::new("A", "b", Some(&data)), selection);
        assert!(record.value.is_none());
        assert_eq!(record.status, Some(0));
    }
}
