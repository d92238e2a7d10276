//! Value frame decoding.
//!
//! A value frame carries one event per declared channel, in header order:
//!
//! ```text
//! ┌───────────────┬──────────────────────────────────────────────────┐
//! │ 4 bytes       │ event_size (channel byte order); 0 = null event  │
//! │ 8 bytes       │ IOC time, ns                                     │
//! │ 8 bytes       │ pulse id                                         │
//! │ 8 bytes       │ global time, ns                                  │
//! │ 1 byte        │ status                                           │
//! │ 1 byte        │ severity                                         │
//! │ size - 26     │ payload, raw or bitshuffle-LZ4                   │
//! └───────────────┴──────────────────────────────────────────────────┘
//!   ... repeated per channel, then any unused bytes up to the frame size
//! ```

use idread_types::{Array, ChannelDescriptor, Compression, Elements, Event, EventData, Value};
use idread_wire::frame::{EVENT_METADATA_SIZE, KIND_SIZE};
use idread_wire::{BodyCursor, WireError};

use crate::decompression::decompress_bitshuffle_lz4;
use crate::error::DecodeError;

/// Per-frame tallies returned by [`decode_values`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValueFrameStats {
    pub events: usize,
    pub null_events: usize,
    /// Body bytes left over after the last event.
    pub trailing: u64,
}

/// Decode one value frame body and hand each event to `emit`.
///
/// `frame_size` is the frame's size field and `offset` its stream offset;
/// both only feed diagnostics. Events are emitted as they are decoded, so
/// an error part way through leaves the earlier events delivered.
///
/// # Errors
///
/// - [`DecodeError::FrameOverrun`] if the events need more bytes than
///   the body holds.
/// - [`DecodeError::InvalidEventSize`] for an event size that is
///   negative or smaller than the metadata.
/// - [`DecodeError::ShapeMismatch`] or [`DecodeError::Type`] if a payload
///   does not fit its channel.
/// - Decompression errors for compressed channels.
/// - Whatever `emit` returns.
pub fn decode_values<F>(
    body: &[u8],
    frame_size: i64,
    offset: u64,
    channels: &[ChannelDescriptor],
    max_decompressed_size: usize,
    mut emit: F,
) -> Result<ValueFrameStats, DecodeError>
where
    F: FnMut(Event<'_>) -> Result<(), DecodeError>,
{
    // Running off the body means the frame promised fewer bytes than the
    // events need: the kind tag, the whole body, and the missing bytes.
    let overrun = |error: WireError| match error {
        WireError::UnexpectedEof { needed, .. } => DecodeError::FrameOverrun {
            offset,
            frame_size,
            required: (KIND_SIZE + body.len() + needed) as u64,
        },
        other => other.into(),
    };

    let mut cursor = BodyCursor::new(body);
    let mut stats = ValueFrameStats::default();

    for channel in channels {
        let order = channel.byte_order;
        let event_size = cursor.read_i32(order).map_err(overrun)?;

        if event_size == 0 {
            emit(Event::new(&channel.name, &channel.backend, None))?;
            stats.events += 1;
            stats.null_events += 1;
            continue;
        }

        let payload_len = usize::try_from(event_size)
            .ok()
            .and_then(|size| size.checked_sub(EVENT_METADATA_SIZE))
            .ok_or_else(|| DecodeError::InvalidEventSize {
                channel: channel.name.clone(),
                size: event_size,
                offset,
            })?;
        if EVENT_METADATA_SIZE + payload_len > cursor.remaining() {
            return Err(overrun(WireError::UnexpectedEof {
                offset: cursor.position() as u64,
                needed: EVENT_METADATA_SIZE + payload_len - cursor.remaining(),
            }));
        }

        let ioc_time_nanos = cursor.read_i64(order).map_err(overrun)?;
        let pulse_id = cursor.read_i64(order).map_err(overrun)?;
        let global_time_nanos = cursor.read_i64(order).map_err(overrun)?;
        let status = cursor.read_i8().map_err(overrun)?;
        let severity = cursor.read_i8().map_err(overrun)?;
        let payload = cursor.take(payload_len).map_err(overrun)?;

        let data = EventData {
            value: decode_value(channel, payload, max_decompressed_size)?,
            pulse_id,
            global_time_nanos,
            ioc_time_nanos,
            status,
            severity,
        };
        emit(Event::new(&channel.name, &channel.backend, Some(&data)))?;
        stats.events += 1;
    }

    stats.trailing = cursor.remaining() as u64;
    Ok(stats)
}

/// Turn one event payload into a value shaped for `channel`.
///
/// Uncompressed scalar channels yield [`Value::Scalar`]; one-dimensional
/// channels accept any element count; everything else must match the
/// declared shape exactly.
///
/// # Errors
///
/// [`DecodeError::ShapeMismatch`] if the element count does not fit, and
/// [`DecodeError::Type`] if the payload is not a whole number of elements.
pub fn decode_value(
    channel: &ChannelDescriptor,
    payload: &[u8],
    max_decompressed_size: usize,
) -> Result<Value, DecodeError> {
    let elements = match channel.compression {
        Compression::None => Elements::decode(channel.kind, channel.byte_order, payload)?,
        Compression::BitshuffleLz4 => {
            let raw =
                decompress_bitshuffle_lz4(payload, channel.element_size(), max_decompressed_size)?;
            Elements::decode(channel.kind, channel.byte_order, &raw)?
        }
    };

    let mismatch = |elements: usize| DecodeError::ShapeMismatch {
        channel: channel.name.clone(),
        shape: channel.shape.clone(),
        elements,
    };

    if channel.compression == Compression::None && channel.is_scalar() {
        return match elements.get(0) {
            Some(scalar) if elements.len() == 1 => Ok(Value::Scalar(scalar)),
            _ => Err(mismatch(elements.len())),
        };
    }
    if channel.shape.len() == 1 && !channel.is_scalar() {
        return Ok(Value::Array(Array::flat(elements)));
    }

    let count = elements.len();
    if channel.element_count() != Some(count) {
        return Err(mismatch(count));
    }
    Array::new(channel.shape.clone(), elements)
        .map(Value::Array)
        .map_err(|_| mismatch(count))
}
