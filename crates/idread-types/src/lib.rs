#![warn(clippy::pedantic)]

pub mod channel;
pub mod collector;
pub mod element;
pub mod error;
pub mod event;
pub mod header;
pub mod value;

pub use channel::{shape_element_count, ChannelDescriptor, Compression};
pub use collector::Collector;
pub use element::ElementKind;
pub use error::TypeError;
pub use event::{Event, EventData, OwnedEvent};
pub use header::{ChannelEntry, DataHeader};
pub use idread_wire::ByteOrder;
pub use value::{Array, Elements, Scalar, Value};
