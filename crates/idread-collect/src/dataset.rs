use std::path::Path;

use idread_types::{ByteOrder, Collector, ElementKind, Event};
use tracing::info;

use crate::config::DatasetOptions;
use crate::container::{ContainerWriter, Manifest};
use crate::error::CollectError;

/// Per-channel dataset suffixes, in the order rows are appended.
pub const DATASET_FIELDS: [&str; 6] = [
    "data",
    "pulse_id",
    "timestamp",
    "ioc_timestamp",
    "status",
    "severity",
];

/// Writes every non-null event into a container on disk.
///
/// Each channel gets six datasets named `/<channel>/<field>` for the
/// fields in [`DATASET_FIELDS`]. `data` rows take the value's element
/// kind and shape; the others are scalar `int64` or `int8` rows. Null
/// events write nothing.
///
/// Finalizing compacts the datasets and writes the manifest. A collector
/// dropped without finalizing leaves the container locked.
pub struct DatasetCollector {
    container: ContainerWriter,
    scratch: Vec<u8>,
    events: u64,
}

impl DatasetCollector {
    /// Open `path` as a new container.
    ///
    /// # Errors
    ///
    /// See [`ContainerWriter::create`].
    pub fn create(path: impl AsRef<Path>, options: DatasetOptions) -> Result<Self, CollectError> {
        Ok(Self {
            container: ContainerWriter::create(path, options)?,
            scratch: Vec::new(),
            events: 0,
        })
    }

    /// Rows written so far to `/<channel>/data`.
    #[must_use]
    pub fn rows(&self, channel: &str) -> u64 {
        self.container
            .rows(&format!("/{channel}/data"))
            .unwrap_or(0)
    }
}

impl Collector for DatasetCollector {
    type Output = Manifest;
    type Error = CollectError;

    fn accept(&mut self, event: Event<'_>) -> Result<(), Self::Error> {
        let Some(data) = event.data else {
            return Ok(());
        };
        let channel = event.channel;

        self.scratch.clear();
        data.value.write_bytes(ByteOrder::Little, &mut self.scratch);
        self.container.append(
            &format!("/{channel}/data"),
            data.value.kind(),
            data.value.shape(),
            &self.scratch,
        )?;

        let longs = [
            ("pulse_id", data.pulse_id),
            ("timestamp", data.global_time_nanos),
            ("ioc_timestamp", data.ioc_time_nanos),
        ];
        for (field, v) in longs {
            self.container.append(
                &format!("/{channel}/{field}"),
                ElementKind::Int64,
                &[],
                &v.to_le_bytes(),
            )?;
        }
        for (field, v) in [("status", data.status), ("severity", data.severity)] {
            self.container.append(
                &format!("/{channel}/{field}"),
                ElementKind::Int8,
                &[],
                &v.to_le_bytes(),
            )?;
        }

        self.events += 1;
        Ok(())
    }

    fn finalize(self) -> Result<Self::Output, Self::Error> {
        let path = self.container.path().to_path_buf();
        let manifest = self.container.finish()?;
        info!(path = %path.display(), events = self.events, "dataset collector finalized");
        Ok(manifest)
    }
}
