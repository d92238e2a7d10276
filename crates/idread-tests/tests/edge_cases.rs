//! Edge cases the decoder must handle without losing its place in the
//! stream:
//!
//! - **Null events**: an event size of 0 is a null event occupying only
//!   its 4-byte size field.
//! - **Surplus bytes**: a value frame may declare more bytes than its
//!   events use; the surplus is drained and reported.
//! - **Skipped frames**: unknown frame kinds and value frames before any
//!   header are drained and reported as warnings.
//! - **Fatal errors**: unsupported types, overruns, bad sizes and
//!   truncation stop the decode with a classified error.

use idread_decoder::{
    DecodeError, DecodeErrorKind, DecodeWarning, DecoderConfig, FrameOutcome, StreamDecoder,
    decode,
};
use idread_encoder::StreamEncoder;
use idread_tests::{BACKEND, header_json_with_type, mixed_channels, mixed_events, mixed_stream};
use idread_types::{ChannelDescriptor, ElementKind, EventData, OwnedEvent, Scalar, TypeError};
use idread_wire::FrameKind;
use idread_wire::frame::FRAME_PREFIX_SIZE;

fn int32_channel() -> ChannelDescriptor {
    ChannelDescriptor::new("COUNTER", BACKEND, ElementKind::Int32)
}

fn counter(v: i32) -> Option<EventData> {
    Some(EventData::new(Scalar::Int32(v)).with_pulse_id(i64::from(v)))
}

// ── Null events ───────────────────────────────────────────────────────────────

#[test]
fn null_event_consumes_four_bytes() {
    let mut encoder = StreamEncoder::new();
    encoder
        .write_header(&[int32_channel(), int32_channel()])
        .unwrap();
    let before = encoder.as_bytes().len();
    encoder.write_values(&[None, None]).unwrap();
    let frame_len = encoder.as_bytes().len() - before;
    assert_eq!(frame_len, FRAME_PREFIX_SIZE + 2 * 4);

    let decoded = decode(encoder.as_bytes(), Vec::<OwnedEvent>::new()).unwrap();
    assert_eq!(decoded.report.events, 2);
    assert_eq!(decoded.report.null_events, 2);
    assert!(decoded.output.iter().all(|e| e.data.is_none()));
    assert!(!decoded.report.is_degraded());
}

// ── Surplus bytes ─────────────────────────────────────────────────────────────

#[test]
fn surplus_bytes_are_drained() {
    let mut encoder = StreamEncoder::new();
    encoder.write_header(&[int32_channel()]).unwrap();
    let offset = encoder.as_bytes().len() as u64;
    encoder
        .write_values_padded(&[counter(1)], 5)
        .unwrap()
        .write_values(&[counter(2)])
        .unwrap();

    let decoded = decode(encoder.as_bytes(), Vec::<OwnedEvent>::new()).unwrap();
    let pulses: Vec<_> = decoded
        .output
        .iter()
        .map(|e| e.as_event().pulse_id())
        .collect();
    assert_eq!(pulses, [Some(1), Some(2)]);
    assert_eq!(
        decoded.report.warnings,
        [DecodeWarning::TrailingBytes { offset, bytes: 5 }]
    );
    assert_eq!(decoded.report.bytes, encoder.as_bytes().len() as u64);
}

// ── Skipped frames ────────────────────────────────────────────────────────────

#[test]
fn unknown_frame_kind_is_skipped() {
    let mut encoder = StreamEncoder::new();
    encoder.write_header(&[int32_channel()]).unwrap();
    let offset = encoder.as_bytes().len() as u64;
    encoder
        .write_raw_frame(FrameKind::Unknown(7), b"opaque")
        .write_values(&[counter(9)])
        .unwrap();

    let mut decoder = StreamDecoder::new(encoder.as_bytes());
    let mut events: Vec<OwnedEvent> = Vec::new();

    let header = decoder.next_frame(&mut events).unwrap().unwrap();
    assert_eq!(header.outcome, FrameOutcome::Header { channels: 1 });

    let skipped = decoder.next_frame(&mut events).unwrap().unwrap();
    let warning = DecodeWarning::UnknownFrameKind {
        kind: 7,
        offset,
        skipped: 6,
    };
    assert_eq!(skipped.offset, offset);
    assert_eq!(skipped.outcome, FrameOutcome::Skipped(warning.clone()));

    assert!(decoder.next_frame(&mut events).unwrap().is_some());
    assert!(decoder.next_frame(&mut events).unwrap().is_none());
    assert_eq!(events.len(), 1);
    assert_eq!(decoder.report().warnings, [warning]);
}

#[test]
fn values_before_header_are_skipped() {
    let mut encoder = StreamEncoder::new();
    encoder
        .write_raw_frame(FrameKind::Values, &[0, 0, 0, 0])
        .write_header(&[int32_channel()])
        .unwrap()
        .write_values(&[counter(1)])
        .unwrap();

    let decoded = decode(encoder.as_bytes(), Vec::<OwnedEvent>::new()).unwrap();
    assert_eq!(decoded.output.len(), 1);
    assert_eq!(
        decoded.report.warnings,
        [DecodeWarning::ValuesBeforeHeader {
            offset: 0,
            skipped: 4
        }]
    );
    assert!(decoded.report.is_degraded());
}

#[test]
fn values_after_an_empty_header_are_skipped() {
    let mut encoder = StreamEncoder::new();
    encoder.write_header_json(r#"{"channels":[]}"#).unwrap();
    let offset = encoder.as_bytes().len() as u64;
    encoder
        .write_raw_frame(FrameKind::Values, &[0xAB; 7])
        .write_header(&[int32_channel()])
        .unwrap()
        .write_values(&[counter(3)])
        .unwrap();

    let decoded = decode(encoder.as_bytes(), Vec::<OwnedEvent>::new()).unwrap();
    assert_eq!(
        decoded.report.warnings,
        [DecodeWarning::ValuesBeforeHeader { offset, skipped: 7 }]
    );
    assert_eq!(decoded.report.header_frames, 2);
    assert_eq!(decoded.output.len(), 1);
    assert_eq!(decoded.output[0].channel, "COUNTER");
    assert_eq!(decoded.output[0].data, counter(3));
}

#[test]
fn empty_stream_is_clean() {
    let decoded = decode(&[][..], Vec::<OwnedEvent>::new()).unwrap();
    assert_eq!(decoded.report.frames, 0);
    assert!(decoded.output.is_empty());
}

// ── Fatal errors ──────────────────────────────────────────────────────────────

#[test]
fn string_channel_stops_at_the_header() {
    let mut encoder = StreamEncoder::new();
    encoder
        .write_header_json(&header_json_with_type("TEXT", "string"))
        .unwrap();
    let header_end = encoder.as_bytes().len() as u64;
    encoder.write_raw_frame(FrameKind::Values, &[0, 0, 0, 0]);

    let mut decoder = StreamDecoder::new(encoder.as_bytes());
    let mut events: Vec<OwnedEvent> = Vec::new();
    let err = decoder.next_frame(&mut events).unwrap_err();

    assert!(matches!(
        err,
        DecodeError::Type(TypeError::UnsupportedDataType { ref name }) if name == "string"
    ));
    assert_eq!(err.kind(), DecodeErrorKind::Protocol);
    assert_eq!(decoder.position(), header_end);
    assert!(decoder.channels().is_empty());
    assert!(events.is_empty());
}

#[test]
fn unknown_payload_compression_is_fatal() {
    let json = r#"{"channels":[{"name":"X","type":"int32","compression":"zlib"}]}"#;
    let mut encoder = StreamEncoder::new();
    encoder.write_header_json(json).unwrap();
    let err = decode(encoder.as_bytes(), Vec::<OwnedEvent>::new()).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Type(TypeError::UnsupportedCompression { .. })
    ));
}

#[test]
fn overflowing_shape_fails_the_header() {
    let json = r#"{"channels":[{"name":"I","backend":"b","type":"uint8","shape":[4294967296,4294967296]}]}"#;
    let mut encoder = StreamEncoder::new();
    encoder.write_header_json(json).unwrap();
    let mut body = 26i32.to_le_bytes().to_vec();
    body.extend_from_slice(&[0; 26]);
    encoder.write_raw_frame(FrameKind::Values, &body);

    let err = decode(encoder.as_bytes(), Vec::<OwnedEvent>::new()).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Type(TypeError::ShapeOverflow { .. })
    ));
    assert_eq!(err.kind(), DecodeErrorKind::Protocol);
}

#[test]
fn events_overrunning_the_frame_are_fatal() {
    let mut encoder = StreamEncoder::new();
    encoder.write_header(&[int32_channel()]).unwrap();
    // Event size 30 (26 metadata + 4 payload), but only 10 bytes follow.
    let mut body = 30i32.to_le_bytes().to_vec();
    body.extend_from_slice(&[0; 10]);
    encoder.write_raw_frame(FrameKind::Values, &body);

    let err = decode(encoder.as_bytes(), Vec::<OwnedEvent>::new()).unwrap_err();
    assert!(matches!(err, DecodeError::FrameOverrun { .. }), "{err:?}");
    assert_eq!(err.kind(), DecodeErrorKind::Protocol);
}

#[test]
fn event_size_below_metadata_is_fatal() {
    let mut encoder = StreamEncoder::new();
    encoder.write_header(&[int32_channel()]).unwrap();
    let mut body = 12i32.to_le_bytes().to_vec();
    body.extend_from_slice(&[0; 12]);
    encoder.write_raw_frame(FrameKind::Values, &body);

    let err = decode(encoder.as_bytes(), Vec::<OwnedEvent>::new()).unwrap_err();
    assert!(
        matches!(err, DecodeError::InvalidEventSize { size: 12, .. }),
        "{err:?}"
    );
}

#[test]
fn frame_size_below_kind_tag_is_fatal() {
    let mut stream = 1i64.to_be_bytes().to_vec();
    stream.extend_from_slice(&[0, 0]);
    let err = decode(stream.as_slice(), Vec::<OwnedEvent>::new()).unwrap_err();
    assert!(
        matches!(err, DecodeError::InvalidFrameSize { size: 1, offset: 0 }),
        "{err:?}"
    );
}

#[test]
fn oversize_frame_is_refused_before_reading() {
    let stream = mixed_stream(1);
    let config = DecoderConfig {
        max_frame_size: 64,
        ..DecoderConfig::default()
    };
    let mut decoder = StreamDecoder::with_config(stream.as_slice(), config);
    let mut events: Vec<OwnedEvent> = Vec::new();
    let err = decoder.run(&mut events).unwrap_err();
    assert!(matches!(err, DecodeError::FrameTooLarge { limit: 64, .. }));
}

#[test]
fn truncation_inside_body_is_transport_error() {
    let mut stream = mixed_stream(3);
    stream.truncate(stream.len() - 7);
    let err = decode(stream.as_slice(), Vec::<OwnedEvent>::new()).unwrap_err();
    assert!(matches!(err, DecodeError::Truncated { needed: 7, .. }), "{err:?}");
    assert_eq!(err.kind(), DecodeErrorKind::Transport);
}

#[test]
fn truncation_inside_prefix_is_transport_error() {
    let mut stream = mixed_stream(1);
    stream.extend_from_slice(&[0, 0, 0]);
    let err = decode(stream.as_slice(), Vec::<OwnedEvent>::new()).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::Transport);
}

#[test]
fn events_before_an_error_are_delivered() {
    let mut encoder = StreamEncoder::new();
    encoder.write_header(&mixed_channels()).unwrap();
    encoder.write_values(&mixed_events(0)).unwrap();
    encoder.write_raw_bytes(&[0xff; 4]);

    let mut decoder = StreamDecoder::new(encoder.as_bytes());
    let mut events: Vec<OwnedEvent> = Vec::new();
    assert!(decoder.run(&mut events).is_err());
    assert_eq!(events.len(), 4);
    assert_eq!(decoder.report().value_frames, 1);
}
