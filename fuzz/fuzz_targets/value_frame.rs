#![no_main]

use idread_decoder::value::decode_values;
use idread_types::{ByteOrder, ChannelDescriptor, Compression, ElementKind};
use libfuzzer_sys::fuzz_target;

// Fuzz target: a value frame body against a fixed channel list.
//
// Catches bugs in:
// - Event size validation (negative, below metadata, past the body)
// - Payload alignment and shape checks
// - Compressed payloads inside events
fuzz_target!(|data: &[u8]| {
    let channels = [
        ChannelDescriptor::new("S", "f", ElementKind::Float64),
        ChannelDescriptor::new("B", "f", ElementKind::Int16).with_byte_order(ByteOrder::Big),
        ChannelDescriptor::new("W", "f", ElementKind::UInt32)
            .with_shape(vec![4])
            .with_compression(Compression::BitshuffleLz4),
        ChannelDescriptor::new("I", "f", ElementKind::UInt8).with_shape(vec![2, 3]),
    ];
    let frame_size = data.len() as i64 + 2;
    let _ = decode_values(data, frame_size, 0, &channels, 1 << 20, |_| Ok(()));
});
