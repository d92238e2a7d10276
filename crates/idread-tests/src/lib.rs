//! Stream fixtures shared by the integration tests, the benches and the
//! `write_fixtures` binary.
//!
//! Every fixture is built with [`StreamEncoder`], so the bytes are
//! deterministic and need no files on disk.

use idread_encoder::StreamEncoder;
use idread_types::{
    Array, ByteOrder, ChannelDescriptor, Compression, ElementKind, Elements, EventData, Scalar,
};

/// Backend tag used by every fixture channel.
pub const BACKEND: &str = "sf-databuffer";

/// Global time of pulse 0: 2023-11-14T22:13:20Z.
pub const EPOCH_NANOS: i64 = 1_700_000_000_000_000_000;

/// One channel of every layout the decoder distinguishes.
///
/// ```text
/// ┌─────────────┬─────────┬────────┬────────┬────────────────┐
/// │ Name        │ Type    │ Shape  │ Order  │ Compression    │
/// ├─────────────┼─────────┼────────┼────────┼────────────────┤
/// │ SCALAR:F64  │ float64 │ [1]    │ little │ none           │
/// │ SCALAR:I32  │ int32   │ [1]    │ big    │ none           │
/// │ WAVE:U16    │ uint16  │ [64]   │ little │ bitshuffle_lz4 │
/// │ IMAGE:U8    │ uint8   │ [4, 6] │ little │ bitshuffle_lz4 │
/// └─────────────┴─────────┴────────┴────────┴────────────────┘
/// ```
#[must_use]
pub fn mixed_channels() -> Vec<ChannelDescriptor> {
    vec![
        ChannelDescriptor::new("SCALAR:F64", BACKEND, ElementKind::Float64),
        ChannelDescriptor::new("SCALAR:I32", BACKEND, ElementKind::Int32)
            .with_byte_order(ByteOrder::Big),
        ChannelDescriptor::new("WAVE:U16", BACKEND, ElementKind::UInt16)
            .with_shape(vec![64])
            .with_compression(Compression::BitshuffleLz4),
        ChannelDescriptor::new("IMAGE:U8", BACKEND, ElementKind::UInt8)
            .with_shape(vec![4, 6])
            .with_compression(Compression::BitshuffleLz4),
    ]
}

/// The events of [`mixed_channels`] for one pulse.
///
/// Every fifth pulse the waveform is null.
#[must_use]
pub fn mixed_events(pulse: i64) -> Vec<Option<EventData>> {
    let stamp = |value: idread_types::Value| {
        EventData::new(value)
            .with_pulse_id(pulse)
            .with_times(EPOCH_NANOS + pulse * 10_000_000, EPOCH_NANOS + pulse)
    };
    #[allow(clippy::cast_precision_loss)]
    let scalar = stamp(Scalar::Float64(pulse as f64 * 0.25).into());
    let counter = stamp(Scalar::Int32(i32::try_from(pulse % 1_000_000).unwrap_or(0)).into())
        .with_alarm(1, 2);
    let wave = (pulse % 5 != 4).then(|| {
        let samples = (0..64u16)
            .map(|i| i.wrapping_mul(31).wrapping_add(pulse.unsigned_abs() as u16))
            .collect();
        stamp(Array::flat(Elements::UInt16(samples)).into())
    });
    let pixels = (0..24u8).map(|i| i.wrapping_add(pulse as u8)).collect();
    let image = stamp(Array::flat(Elements::UInt8(pixels)).into());
    vec![Some(scalar), Some(counter), wave, Some(image)]
}

/// A header for [`mixed_channels`] followed by `pulses` value frames.
///
/// # Panics
///
/// Never for the fixed channel set; encoding errors would be a bug in the
/// encoder.
#[must_use]
pub fn mixed_stream(pulses: i64) -> Vec<u8> {
    let mut encoder = StreamEncoder::new();
    encoder
        .write_header(&mixed_channels())
        .expect("fixture header encodes");
    for pulse in 0..pulses {
        encoder
            .write_values(&mixed_events(pulse))
            .expect("fixture values encode");
    }
    encoder.into_bytes()
}

/// A single float64 scalar channel carrying `values`, one pulse each.
///
/// # Panics
///
/// Never; see [`mixed_stream`].
#[must_use]
pub fn scalar_stream(name: &str, values: &[f64]) -> Vec<u8> {
    let mut encoder = StreamEncoder::new();
    encoder
        .write_header(&[ChannelDescriptor::new(name, BACKEND, ElementKind::Float64)])
        .expect("fixture header encodes");
    for (pulse, value) in (0i64..).zip(values) {
        let data = EventData::new(Scalar::Float64(*value))
            .with_pulse_id(pulse)
            .with_times(EPOCH_NANOS + pulse, EPOCH_NANOS + pulse);
        encoder
            .write_values(&[Some(data)])
            .expect("fixture values encode");
    }
    encoder.into_bytes()
}

/// A header document with one channel of the given `type` attribute.
#[must_use]
pub fn header_json_with_type(channel: &str, type_name: &str) -> String {
    format!(
        r#"{{"htype":"bsr_m-1.1","channels":[{{"name":"{channel}","backend":"{BACKEND}","type":"{type_name}"}}]}}"#
    )
}
