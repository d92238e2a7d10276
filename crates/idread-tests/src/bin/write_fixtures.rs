//! Write the fixture streams to disk for use with the `idread` CLI.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin write_fixtures -p idread-tests -- [DIR]
//! ```
//!
//! | File                 | Contents                                     |
//! |----------------------|----------------------------------------------|
//! | mixed.idr            | 4 channels (scalar, big-endian, wave, image) |
//! | scalar.idr           | 1500 float64 scalars                         |
//! | compressed_header.idr| mixed channels, bitshuffle-LZ4 header        |
//! | degraded.idr         | unknown frame kind and trailing bytes        |
//! | string_channel.idr   | header declaring a string channel            |
//! | truncated.idr        | mixed stream cut inside the last frame       |

#![allow(clippy::pedantic)]

use std::path::PathBuf;

use idread_encoder::StreamEncoder;
use idread_tests::{
    header_json_with_type, mixed_channels, mixed_events, mixed_stream, scalar_stream,
};
use idread_wire::FrameKind;

fn main() {
    let dir = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("fixtures"), PathBuf::from);
    std::fs::create_dir_all(&dir).unwrap();

    let write = |name: &str, bytes: &[u8]| {
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        println!("  wrote {} ({} bytes)", path.display(), bytes.len());
    };

    write("mixed.idr", &mixed_stream(100));

    let values: Vec<f64> = (0..1500).map(|i| f64::from(i) * 0.5).collect();
    write("scalar.idr", &scalar_stream("SCALAR:F64", &values));

    let mut compressed = StreamEncoder::new();
    compressed.compress_header(true);
    compressed.write_header(&mixed_channels()).unwrap();
    for pulse in 0..10 {
        compressed.write_values(&mixed_events(pulse)).unwrap();
    }
    write("compressed_header.idr", compressed.as_bytes());

    let mut degraded = StreamEncoder::new();
    degraded
        .write_raw_frame(FrameKind::Values, &[0, 0, 0, 0])
        .write_header(&mixed_channels())
        .unwrap()
        .write_values_padded(&mixed_events(0), 5)
        .unwrap()
        .write_raw_frame(FrameKind::Unknown(7), b"opaque")
        .write_values(&mixed_events(1))
        .unwrap();
    write("degraded.idr", degraded.as_bytes());

    let mut string = StreamEncoder::new();
    string
        .write_header_json(&header_json_with_type("TEXT", "string"))
        .unwrap();
    write("string_channel.idr", string.as_bytes());

    let mut truncated = mixed_stream(3);
    truncated.truncate(truncated.len() - 7);
    write("truncated.idr", &truncated);
}
