//! Readings, aggregates and their on-disk store.

pub mod files;
pub mod record;
pub mod window;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use files::AggregateStore;
pub use record::{Aggregate, FIELD_COUNT, Measurements, Reading};
pub use window::Window;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode aggregate: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("timestamp {0} cannot be represented in the configured time zone")]
    InvalidTimestamp(i64),
}

impl StorageError {
    fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
