//! A directory of growable, row-oriented datasets.
//!
//! ```text
//! <dir>/
//! ├── .lock           exclusive writer marker, removed on finish
//! ├── 0.bin           rows of dataset 0, little-endian elements
//! ├── 1.bin           ...
//! └── manifest.json   written on finish only
//! ```
//!
//! While a writer is open each dataset file is preallocated in steps of
//! `chunk_rows` rows; the logical row count lives in the writer. Finishing
//! trims every file to its logical length, optionally compresses it, and
//! writes the manifest. A container without a manifest, or with a lock,
//! is not readable.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use idread_types::{Array, ElementKind, Elements, shape_element_count};
use idread_wire::ByteOrder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DatasetOptions;
use crate::error::CollectError;
use crate::shuffle;

pub const LOCK_FILE: &str = ".lock";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const FORMAT: &str = "idread-container";
pub const FORMAT_VERSION: u32 = 1;

/// How a dataset file is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Codec {
    Raw,
    /// Byte-plane shuffle, then zstd.
    ShuffleZstd,
}

/// Manifest entry for one dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub name: String,
    pub file: String,
    pub kind: ElementKind,
    /// Shape of one row; empty for scalar rows.
    pub shape: Vec<usize>,
    pub rows: u64,
    pub codec: Codec,
}

impl DatasetInfo {
    /// Bytes per row when uncompressed, or `None` if that overflows.
    #[must_use]
    pub fn row_bytes(&self) -> Option<usize> {
        shape_element_count(&self.shape)?.checked_mul(self.kind.size())
    }
}

/// The `manifest.json` document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub format: String,
    pub version: u32,
    pub datasets: Vec<DatasetInfo>,
}

impl Manifest {
    #[must_use]
    pub fn dataset(&self, name: &str) -> Option<&DatasetInfo> {
        self.datasets.iter().find(|d| d.name == name)
    }
}

struct DatasetWriter {
    info: DatasetInfo,
    file: BufWriter<File>,
    capacity: u64,
    row_bytes: usize,
}

impl DatasetWriter {
    fn append(&mut self, row: &[u8], chunk_rows: u64) -> io::Result<()> {
        if self.info.rows == self.capacity {
            self.capacity += chunk_rows;
            self.file
                .get_ref()
                .set_len(self.capacity * self.row_bytes as u64)?;
        }
        self.file.write_all(row)?;
        self.info.rows += 1;
        Ok(())
    }
}

/// Exclusive writer for a container directory.
pub struct ContainerWriter {
    root: PathBuf,
    options: DatasetOptions,
    datasets: Vec<DatasetWriter>,
    index: HashMap<String, usize>,
}

impl ContainerWriter {
    /// Open `path` for writing, creating the directory if needed.
    ///
    /// Any manifest from an earlier run is removed, so the container reads
    /// as incomplete until [`finish`](Self::finish) succeeds.
    ///
    /// # Errors
    ///
    /// [`CollectError::Locked`] if another writer holds the container or a
    /// previous writer never finished; [`CollectError::Io`] otherwise.
    pub fn create(path: impl AsRef<Path>, options: DatasetOptions) -> Result<Self, CollectError> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(root.join(LOCK_FILE))
        {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(CollectError::Locked { path: root });
            }
            Err(e) => return Err(e.into()),
        }

        match fs::remove_file(root.join(MANIFEST_FILE)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        info!(path = %root.display(), chunk_rows = options.chunk_rows, "container opened");
        Ok(Self {
            root,
            options: DatasetOptions {
                chunk_rows: options.chunk_rows.max(1),
                ..options
            },
            datasets: Vec::new(),
            index: HashMap::new(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Append one row to `dataset`, creating it on first use.
    ///
    /// The first row fixes the dataset's element kind and row shape.
    ///
    /// # Errors
    ///
    /// - [`CollectError::KindMismatch`] / [`CollectError::RowShapeMismatch`]
    ///   if the row differs from the dataset's first row.
    /// - [`CollectError::Io`] on write failure.
    pub fn append(
        &mut self,
        dataset: &str,
        kind: ElementKind,
        shape: &[usize],
        row: &[u8],
    ) -> Result<(), CollectError> {
        let slot = match self.index.get(dataset) {
            Some(&slot) => slot,
            None => self.create_dataset(dataset, kind, shape)?,
        };
        let writer = &mut self.datasets[slot];

        if writer.info.kind != kind {
            return Err(CollectError::KindMismatch {
                dataset: dataset.to_owned(),
                expected: writer.info.kind,
                actual: kind,
            });
        }
        if writer.info.shape != shape {
            return Err(CollectError::RowShapeMismatch {
                dataset: dataset.to_owned(),
                expected: writer.info.shape.clone(),
                actual: shape.to_vec(),
            });
        }

        writer.append(row, self.options.chunk_rows)?;
        Ok(())
    }

    fn create_dataset(
        &mut self,
        name: &str,
        kind: ElementKind,
        shape: &[usize],
    ) -> Result<usize, CollectError> {
        let slot = self.datasets.len();
        let file_name = format!("{slot}.bin");
        let file = File::create(self.root.join(&file_name))?;
        debug!(dataset = name, file = %file_name, %kind, ?shape, "dataset created");

        let info = DatasetInfo {
            name: name.to_owned(),
            file: file_name,
            kind,
            shape: shape.to_vec(),
            rows: 0,
            codec: Codec::Raw,
        };
        let row_bytes = info.row_bytes().ok_or_else(|| CollectError::Corrupt {
            dataset: name.to_owned(),
            detail: format!("row shape {shape:?} overflows"),
        })?;
        self.datasets.push(DatasetWriter {
            row_bytes,
            info,
            file: BufWriter::new(file),
            capacity: 0,
        });
        self.index.insert(name.to_owned(), slot);
        Ok(slot)
    }

    /// Logical row count of `dataset`.
    #[must_use]
    pub fn rows(&self, dataset: &str) -> Option<u64> {
        self.index.get(dataset).map(|&i| self.datasets[i].info.rows)
    }

    /// Rows allocated on disk for `dataset`.
    #[must_use]
    pub fn capacity(&self, dataset: &str) -> Option<u64> {
        self.index.get(dataset).map(|&i| self.datasets[i].capacity)
    }

    /// Compact every dataset, write the manifest and release the lock.
    ///
    /// # Errors
    ///
    /// [`CollectError::Io`] or [`CollectError::Json`]. On error the lock
    /// stays in place.
    pub fn finish(self) -> Result<Manifest, CollectError> {
        let mut infos = Vec::with_capacity(self.datasets.len());

        for writer in self.datasets {
            let mut info = writer.info;
            let file = writer.file.into_inner().map_err(io::IntoInnerError::into_error)?;
            file.set_len(info.rows * writer.row_bytes as u64)?;
            file.sync_all()?;
            drop(file);

            if self.options.compress {
                let path = self.root.join(&info.file);
                let raw = fs::read(&path)?;
                let planes = shuffle::shuffle(&raw, info.kind.size());
                let packed = zstd::encode_all(planes.as_slice(), self.options.compression_level)?;
                fs::write(&path, packed)?;
                info.codec = Codec::ShuffleZstd;
            }
            infos.push(info);
        }

        let manifest = Manifest {
            format: FORMAT.to_owned(),
            version: FORMAT_VERSION,
            datasets: infos,
        };
        fs::write(
            self.root.join(MANIFEST_FILE),
            serde_json::to_vec_pretty(&manifest)?,
        )?;
        fs::remove_file(self.root.join(LOCK_FILE))?;

        info!(
            path = %self.root.display(),
            datasets = manifest.datasets.len(),
            "container finished"
        );
        Ok(manifest)
    }
}

/// Read access to a finished container.
pub struct ContainerReader {
    root: PathBuf,
    manifest: Manifest,
}

impl ContainerReader {
    /// Open a finished container.
    ///
    /// # Errors
    ///
    /// - [`CollectError::Locked`] if a writer holds it or never finished.
    /// - [`CollectError::MissingManifest`] if it was never finished.
    /// - [`CollectError::Json`] if the manifest is malformed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CollectError> {
        let root = path.as_ref().to_path_buf();
        if root.join(LOCK_FILE).exists() {
            return Err(CollectError::Locked { path: root });
        }
        let text = match fs::read(root.join(MANIFEST_FILE)) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CollectError::MissingManifest { path: root });
            }
            Err(e) => return Err(e.into()),
        };
        let manifest = serde_json::from_slice(&text)?;
        Ok(Self { root, manifest })
    }

    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Every element of `name`, rows concatenated.
    ///
    /// # Errors
    ///
    /// - [`CollectError::UnknownDataset`] if there is no such dataset.
    /// - [`CollectError::Corrupt`] if the file does not hold exactly
    ///   `rows` rows.
    pub fn read(&self, name: &str) -> Result<Elements, CollectError> {
        let info = self
            .manifest
            .dataset(name)
            .ok_or_else(|| CollectError::UnknownDataset(name.to_owned()))?;
        let corrupt = |detail: String| CollectError::Corrupt {
            dataset: name.to_owned(),
            detail,
        };

        let stored = fs::read(self.root.join(&info.file))?;
        let raw = match info.codec {
            Codec::Raw => stored,
            Codec::ShuffleZstd => {
                let planes = zstd::decode_all(stored.as_slice())?;
                shuffle::unshuffle(&planes, info.kind.size())
                    .ok_or_else(|| corrupt("decompressed size is not whole elements".into()))?
            }
        };

        let expected = info
            .row_bytes()
            .and_then(|bytes| info.rows.checked_mul(bytes as u64))
            .ok_or_else(|| corrupt(format!("row shape {:?} overflows", info.shape)))?;
        if raw.len() as u64 != expected {
            return Err(corrupt(format!(
                "{} bytes on disk, manifest implies {expected}",
                raw.len()
            )));
        }
        Elements::decode(info.kind, ByteOrder::Little, &raw).map_err(|e| corrupt(e.to_string()))
    }

    /// `name` as an array of shape `[rows, row shape...]`.
    ///
    /// # Errors
    ///
    /// As for [`read`](Self::read).
    pub fn read_array(&self, name: &str) -> Result<Array, CollectError> {
        let elements = self.read(name)?;
        let info = self
            .manifest
            .dataset(name)
            .ok_or_else(|| CollectError::UnknownDataset(name.to_owned()))?;
        let rows = usize::try_from(info.rows).map_err(|e| CollectError::Corrupt {
            dataset: name.to_owned(),
            detail: e.to_string(),
        })?;
        let shape = std::iter::once(rows).chain(info.shape.iter().copied()).collect();
        Array::new(shape, elements).map_err(|e| CollectError::Corrupt {
            dataset: name.to_owned(),
            detail: e.to_string(),
        })
    }
}
