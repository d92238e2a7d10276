use crate::value::Value;

/// The six data fields of a non-null event.
///
/// On the wire these are either all present or all absent (an event size
/// of zero), so they travel together behind a single `Option`.
#[derive(Clone, Debug, PartialEq)]
pub struct EventData {
    pub value: Value,
    pub pulse_id: i64,
    /// Global (machine) timestamp, nanoseconds since the Unix epoch.
    pub global_time_nanos: i64,
    /// Timestamp assigned by the IOC, nanoseconds since the Unix epoch.
    pub ioc_time_nanos: i64,
    pub status: i8,
    pub severity: i8,
}

impl EventData {
    /// A data record with zeroed metadata.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            pulse_id: 0,
            global_time_nanos: 0,
            ioc_time_nanos: 0,
            status: 0,
            severity: 0,
        }
    }

    #[must_use]
    pub fn with_pulse_id(mut self, pulse_id: i64) -> Self {
        self.pulse_id = pulse_id;
        self
    }

    /// Set the global and IOC timestamps.
    #[must_use]
    pub fn with_times(mut self, global_time_nanos: i64, ioc_time_nanos: i64) -> Self {
        self.global_time_nanos = global_time_nanos;
        self.ioc_time_nanos = ioc_time_nanos;
        self
    }

    #[must_use]
    pub fn with_alarm(mut self, status: i8, severity: i8) -> Self {
        self.status = status;
        self.severity = severity;
        self
    }
}

/// One channel's reading from one value frame.
///
/// Borrows the channel identity from the decoder's descriptor list; the
/// decoder does not keep the event after handing it to a collector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Event<'a> {
    pub channel: &'a str,
    pub backend: &'a str,
    pub data: Option<&'a EventData>,
}

impl<'a> Event<'a> {
    #[must_use]
    pub fn new(channel: &'a str, backend: &'a str, data: Option<&'a EventData>) -> Self {
        Self {
            channel,
            backend,
            data,
        }
    }

    /// True for a zero-size event: every data field is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.data.is_none()
    }

    #[must_use]
    pub fn value(&self) -> Option<&'a Value> {
        self.data.map(|d| &d.value)
    }

    #[must_use]
    pub fn pulse_id(&self) -> Option<i64> {
        self.data.map(|d| d.pulse_id)
    }

    #[must_use]
    pub fn global_time_nanos(&self) -> Option<i64> {
        self.data.map(|d| d.global_time_nanos)
    }

    #[must_use]
    pub fn ioc_time_nanos(&self) -> Option<i64> {
        self.data.map(|d| d.ioc_time_nanos)
    }

    #[must_use]
    pub fn status(&self) -> Option<i8> {
        self.data.map(|d| d.status)
    }

    #[must_use]
    pub fn severity(&self) -> Option<i8> {
        self.data.map(|d| d.severity)
    }

    /// Copy the event out of the decoder's borrow.
    #[must_use]
    pub fn to_owned_event(&self) -> OwnedEvent {
        OwnedEvent {
            channel: self.channel.to_owned(),
            backend: self.backend.to_owned(),
            data: self.data.cloned(),
        }
    }
}

/// An [`Event`] that owns its strings and data.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedEvent {
    pub channel: String,
    pub backend: String,
    pub data: Option<EventData>,
}

impl OwnedEvent {
    /// Borrow as an [`Event`], e.g. to replay into another collector.
    #[must_use]
    pub fn as_event(&self) -> Event<'_> {
        Event::new(&self.channel, &self.backend, self.data.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Scalar;

    #[test]
    fn null_event_has_no_fields() {
        let event = Event::new("A", "b", None);
        assert!(event.is_null());
        assert_eq!(event.pulse_id(), None);
        assert_eq!(event.severity(), None);
        assert!(event.value().is_none());
    }

    #[test]
    fn accessors_read_through_data() {
        let data = EventData::new(Scalar::Float64(3.5))
            .with_pulse_id(42)
            .with_times(1_000, 999)
            .with_alarm(1, 2);
        let event = Event::new("A", "b", Some(&data));
        assert_eq!(event.pulse_id(), Some(42));
        assert_eq!(event.global_time_nanos(), Some(1_000));
        assert_eq!(event.ioc_time_nanos(), Some(999));
        assert_eq!(event.status(), Some(1));
        assert_eq!(event.severity(), Some(2));
    }

    #[test]
    fn owned_event_replays_identically() {
        let data = EventData::new(Scalar::Int32(-4)).with_pulse_id(7);
        let owned = Event::new("X", "sf", Some(&data)).to_owned_event();
        assert_eq!(owned.as_event(), Event::new("X", "sf", Some(&data)));
    }
}
