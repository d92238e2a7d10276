#![no_main]

use idread_decoder::{DecoderConfig, StreamDecoder};
use idread_types::OwnedEvent;
use libfuzzer_sys::fuzz_target;

// Fuzz target: a whole stream through the blocking decoder.
//
// Limits are kept small so hostile length fields fail fast instead of
// allocating.
//
// Catches bugs in:
// - Frame prefix parsing and size validation
// - Skipping unknown frames and values before a header
// - Remainder accounting between events and frame size
fuzz_target!(|data: &[u8]| {
    let config = DecoderConfig {
        max_frame_size: 1 << 20,
        max_decompressed_size: 1 << 20,
    };
    let mut decoder = StreamDecoder::with_config(data, config);
    let mut events: Vec<OwnedEvent> = Vec::new();
    if decoder.run(&mut events).is_ok() {
        assert_eq!(decoder.report().bytes, data.len() as u64);
    }
});
