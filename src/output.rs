//! JSON snapshot writer.

use std::fs;
use std::path::{Path, PathBuf};

use serde::ser::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::engine::FlatIndex;
use crate::error::{Error, Result};
use crate::models::Organization;

/// A value rendered as indented JSON, waiting to be written to `path`.
#[derive(Debug)]
pub struct Snapshot {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl Snapshot {
    pub fn encode<T: Serialize + ?Sized>(value: &T, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut bytes = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut bytes, PrettyFormatter::with_indent(b"    "));
        value
            .serialize(&mut serializer)
            .map_err(|e| Error::persistence(&path, e.into()))?;
        Ok(Self { path, bytes })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Write to disk, creating missing parent directories.
    pub fn write(&self) -> Result<usize> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::persistence(parent, e))?;
        }
        fs::write(&self.path, &self.bytes).map_err(|e| Error::persistence(&self.path, e))?;
        Ok(self.bytes.len())
    }
}

/// Serialize `value` as indented JSON into `path`, returning the bytes written.
///
/// Missing parent directories are created.
pub fn write_snapshot<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<usize> {
    Snapshot::encode(value, path)?.write()
}

/// Write every snapshot or none of them.
///
/// If one write fails, the files already written by this call are removed
/// before the error is returned.
pub fn write_all(snapshots: &[Snapshot]) -> Result<Vec<usize>> {
    let mut written = Vec::with_capacity(snapshots.len());
    for (i, snapshot) in snapshots.iter().enumerate() {
        match snapshot.write() {
            Ok(bytes) => written.push(bytes),
            Err(e) => {
                for done in &snapshots[..i] {
                    if let Err(cleanup) = fs::remove_file(done.path()) {
                        tracing::warn!(
                            "Could not remove partial output {}: {}",
                            done.path().display(),
                            cleanup
                        );
                    }
                }
                return Err(e);
            }
        }
    }
    Ok(written)
}

/// The flat index as written to disk: a list of organization snapshots.
pub fn flat_values(index: &FlatIndex) -> Vec<&Organization> {
    index.values().collect()
}
