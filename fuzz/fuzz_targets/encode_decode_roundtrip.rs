#![no_main]

use arbitrary::Arbitrary;
use idread_decoder::decode;
use idread_encoder::StreamEncoder;
use idread_types::{
    Array, ByteOrder, ChannelDescriptor, Compression, ElementKind, Elements, EventData, OwnedEvent,
    Value,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzChannel {
    kind_id: u8,
    big_endian: bool,
    compressed: bool,
    samples: Vec<u8>,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    channels: Vec<FuzzChannel>,
    pulses: u8,
    null_mask: u64,
    block_elements: u8,
    compress_header: bool,
}

fn kind_from_id(id: u8) -> ElementKind {
    ElementKind::ALL[usize::from(id) % ElementKind::ALL.len()]
}

// Fuzz target: encode arbitrary channels and events, decode, compare.
//
// Every event is a 1-D array built from the channel's sample bytes, so
// all element kinds, byte orders and block sizes are covered.
fuzz_target!(|input: FuzzInput| {
    let channels: Vec<(ChannelDescriptor, Value)> = input
        .channels
        .iter()
        .take(8)
        .enumerate()
        .map(|(i, c)| {
            let kind = kind_from_id(c.kind_id);
            let usable = c.samples.len() / kind.size() * kind.size();
            let order = if c.big_endian { ByteOrder::Big } else { ByteOrder::Little };
            let elements = Elements::decode(kind, order, &c.samples[..usable]).unwrap();
            let count = elements.len().max(2);
            let elements = if elements.len() < 2 {
                Elements::decode(kind, order, &vec![0u8; 2 * kind.size()]).unwrap()
            } else {
                elements
            };
            let compression = if c.compressed {
                Compression::BitshuffleLz4
            } else {
                Compression::None
            };
            let descriptor = ChannelDescriptor::new(format!("C{i}"), "fuzz", kind)
                .with_shape(vec![count])
                .with_byte_order(order)
                .with_compression(compression);
            (descriptor, Value::Array(Array::flat(elements)))
        })
        .collect();
    if channels.is_empty() {
        return;
    }

    let descriptors: Vec<ChannelDescriptor> = channels.iter().map(|(d, _)| d.clone()).collect();
    let mut encoder = StreamEncoder::new();
    encoder
        .compress_header(input.compress_header)
        .block_elements(usize::from(input.block_elements) * 8);
    encoder.write_header(&descriptors).unwrap();

    let mut expected = Vec::new();
    for pulse in 0..i64::from(input.pulses % 16) {
        let events: Vec<Option<EventData>> = channels
            .iter()
            .enumerate()
            .map(|(i, (_, value))| {
                let bit = (pulse as u64 * 8 + i as u64) % 64;
                (input.null_mask >> bit & 1 == 0)
                    .then(|| EventData::new(value.clone()).with_pulse_id(pulse))
            })
            .collect();
        expected.extend(events.iter().cloned());
        encoder.write_values(&events).unwrap();
    }

    let decoded = decode(encoder.as_bytes(), Vec::<OwnedEvent>::new()).unwrap();
    assert!(!decoded.report.is_degraded());
    // Compare bit patterns so NaN samples still match.
    let bits = |data: Option<&EventData>| {
        data.map(|d| {
            let mut out = Vec::new();
            d.value.write_bytes(ByteOrder::Little, &mut out);
            (d.pulse_id, d.value.shape().to_vec(), out)
        })
    };
    let actual: Vec<_> = decoded.output.iter().map(|e| bits(e.data.as_ref())).collect();
    let expected: Vec<_> = expected.iter().map(|e| bits(e.as_ref())).collect();
    assert_eq!(actual, expected);
});
