#![warn(clippy::pedantic)]

pub mod bitshuffle;
pub mod cursor;
pub mod error;
pub mod frame;

pub use cursor::{BodyCursor, ByteOrder};
pub use error::WireError;
pub use frame::{FrameHeader, FrameKind};
