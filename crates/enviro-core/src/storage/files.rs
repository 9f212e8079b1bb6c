//! Aggregate files on disk.
//!
//! One pretty-printed JSON file per aggregate, named after the boundary
//! minute in the store's time zone.

use std::fmt::Display;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use log::{debug, warn};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{Aggregate, Measurements, StorageError};

/// File name layout for aggregates: year, day of year, hour, minute.
const FILE_NAME_FORMAT: &str = "%Y_%j_%H_%M";
/// Human-readable timestamp written into each aggregate, asctime style.
const TIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";
const AGGREGATE_EXTENSION: &str = ".json";
const JSON_INDENT: &[u8] = b"    ";

/// On-disk layout of one aggregate file.
#[derive(Serialize)]
struct AggregateDocument<'a> {
    time: String,
    #[serde(flatten)]
    values: &'a Measurements,
}

/// Directory of aggregate JSON files.
///
/// The sampler writes through it and the HTTP surface reads through it; the
/// two share nothing else. Writes go to a hidden temp file first and are
/// renamed into place, so readers only ever see complete files.
///
/// File names and the `time` field are rendered in `Tz`, which is local time
/// on the device.
#[derive(Debug, Clone)]
pub struct AggregateStore<Tz: TimeZone = Local> {
    dir: PathBuf,
    tz: Tz,
}

impl AggregateStore<Local> {
    /// A store that names files in the host's local time.
    pub fn local(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, Local)
    }
}

impl<Tz> AggregateStore<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn new(dir: impl Into<PathBuf>, tz: Tz) -> Self {
        Self {
            dir: dir.into(),
            tz,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the data directory (and parents) if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StorageError::io(&self.dir, source))
    }

    fn datetime(&self, timestamp: i64) -> Result<DateTime<Tz>, StorageError> {
        self.tz
            .timestamp_opt(timestamp, 0)
            .single()
            .ok_or(StorageError::InvalidTimestamp(timestamp))
    }

    /// File name for the aggregate written at `boundary`.
    ///
    /// Resolution is one minute, so two boundaries in the same minute map to
    /// the same file.
    pub fn file_name(&self, boundary: i64) -> Result<String, StorageError> {
        let when = self.datetime(boundary)?;
        Ok(format!("{}{}", when.format(FILE_NAME_FORMAT), AGGREGATE_EXTENSION))
    }

    /// Serialize an aggregate the way it is stored on disk.
    pub fn render(&self, aggregate: &Aggregate) -> Result<Vec<u8>, StorageError> {
        let document = AggregateDocument {
            time: self.datetime(aggregate.start_ts)?.format(TIME_FORMAT).to_string(),
            values: &aggregate.mean,
        };

        let mut bytes = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut bytes, PrettyFormatter::with_indent(JSON_INDENT));
        document.serialize(&mut serializer)?;

        Ok(bytes)
    }

    /// Write an aggregate for the given boundary and return its final path.
    ///
    /// An existing file with the same name is replaced. On failure the temp
    /// file is removed and nothing is published.
    pub async fn persist(&self, aggregate: &Aggregate, boundary: i64) -> Result<PathBuf, StorageError> {
        let name = self.file_name(boundary)?;
        let bytes = self.render(aggregate)?;

        let path = self.dir.join(&name);
        let tmp_path = self.dir.join(format!(".{name}.tmp"));

        if let Err(e) = publish(&tmp_path, &path, &bytes).await {
            match fs::remove_file(&tmp_path).await {
                Ok(()) => {}
                Err(cleanup) if cleanup.kind() == ErrorKind::NotFound => {}
                Err(cleanup) => warn!("Failed to remove {}: {}", tmp_path.display(), cleanup),
            }
            return Err(e);
        }

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }

    /// Sorted names of all aggregate files in the directory.
    pub async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|source| StorageError::io(&self.dir, source))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| StorageError::io(&self.dir, source))?
        {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !name.ends_with(AGGREGATE_EXTENSION) || name.starts_with('.') {
                continue;
            }
            let is_file = entry
                .file_type()
                .await
                .map_err(|source| StorageError::io(entry.path(), source))?
                .is_file();
            if is_file {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    /// Contents of a named file in the directory.
    ///
    /// Returns None when the file does not exist, is not a regular file, or
    /// `name` is anything other than a plain visible file name.
    pub async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if !is_plain_file_name(name) {
            return Ok(None);
        }

        let path = self.dir.join(name);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::io(&path, source)),
        }

        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            // Raced with a delete
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::io(&path, source)),
        }
    }
}

async fn publish(tmp_path: &Path, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let mut file = fs::File::create(tmp_path)
        .await
        .map_err(|source| StorageError::io(tmp_path, source))?;
    file.write_all(bytes)
        .await
        .map_err(|source| StorageError::io(tmp_path, source))?;
    file.sync_all()
        .await
        .map_err(|source| StorageError::io(tmp_path, source))?;
    drop(file);

    fs::rename(tmp_path, path)
        .await
        .map_err(|source| StorageError::io(path, source))
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
}
