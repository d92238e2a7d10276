#![warn(clippy::pedantic)]

pub mod config;
pub mod decoder;
pub mod decompression;
pub mod error;
pub mod frame_reader;
pub mod header;
pub mod report;
pub mod streaming;
pub mod value;

mod session;

pub use config::DecoderConfig;
pub use decoder::{Decoded, StreamDecoder, decode};
pub use error::{DecodeError, DecodeErrorKind};
pub use header::{HeaderCompression, HeaderFrame};
pub use report::{DecodeReport, DecodeWarning, FrameInfo, FrameOutcome};
pub use streaming::{AsyncStreamDecoder, decode_async};
