#![no_main]

use idread_decoder::HeaderFrame;
use libfuzzer_sys::fuzz_target;

// Fuzz target: HeaderFrame::decode with arbitrary bodies.
//
// Catches bugs in:
// - Hash / compression byte handling
// - Compressed header inflation
// - JSON parsing and channel type resolution
fuzz_target!(|data: &[u8]| {
    let _ = HeaderFrame::decode(data, 0, 1 << 20);
});
