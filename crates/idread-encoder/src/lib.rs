#![warn(clippy::pedantic)]

pub mod compression;
pub mod encoder;
pub mod error;
pub mod frame_writer;

pub use encoder::StreamEncoder;
pub use error::EncodeError;
