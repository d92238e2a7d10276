#![warn(clippy::pedantic)]

pub mod config;
pub mod container;
pub mod dataset;
pub mod dictionary;
pub mod error;
pub mod mapping;
pub mod record;
pub mod stats;

mod shuffle;

pub use config::{DatasetOptions, EventField, FieldSelection};
pub use container::{ContainerReader, ContainerWriter, DatasetInfo, Manifest};
pub use dataset::DatasetCollector;
pub use dictionary::{ChannelGroup, ChannelId, DictionaryCollector};
pub use error::CollectError;
pub use mapping::{MappingCollector, MappingRecord};
pub use record::Record;
pub use stats::{ChannelStats, ChannelSummary};
