#![no_main]

use idread_decoder::decompression::decompress_bitshuffle_lz4;
use libfuzzer_sys::fuzz_target;

// Fuzz target: bitshuffle-LZ4 payload inflation.
//
// Input format:
//   - First byte: element size selector (1, 2, 4 or 8)
//   - Remaining bytes: compressed payload
//
// Catches bugs in:
// - Length prefix and block size validation
// - Block boundaries and the verbatim tail
// - Output size limits
fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let element_size = 1 << (selector % 4);
    let _ = decompress_bitshuffle_lz4(payload, element_size, 1 << 20);
});
