//! Capture records and the queue file on disk.

use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use xops_core::{parse_queue, render_capture_markdown, render_queue, CaptureRecord, QueueError, QueueItem};
use xops_logging::xops_debug;

use crate::persist::{read_optional, write_file, AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file not found: {0}")]
    Missing(PathBuf),
    #[error("invalid capture json in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid queue file {path}: {source}")]
    Queue {
        path: PathBuf,
        #[source]
        source: QueueError,
    },
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCapture {
    pub json: PathBuf,
    pub markdown: PathBuf,
}

/// `<status_id>.json` plus its markdown rendering, one pair per capture.
#[derive(Debug, Clone)]
pub struct CaptureStore {
    dir: PathBuf,
}

impl CaptureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn json_path(&self, status_id: &str) -> PathBuf {
        self.dir.join(format!("{status_id}.json"))
    }

    pub fn contains(&self, status_id: &str) -> bool {
        self.json_path(status_id).is_file()
    }

    pub fn load(&self, status_id: &str) -> Result<CaptureRecord, StoreError> {
        load_capture(&self.json_path(status_id))
    }

    /// Writes the JSON record and the markdown rendering; records without a
    /// status id are named after the local capture time.
    pub fn save(&self, record: &CaptureRecord) -> Result<SavedCapture, StoreError> {
        let sid = record.status_id();
        let name = if sid.is_empty() {
            Local::now().format("capture_%Y%m%d_%H%M%S").to_string()
        } else {
            sid
        };
        let json = record.to_json_pretty().map_err(|source| StoreError::Json {
            path: self.dir.join(format!("{name}.json")),
            source,
        })?;

        let writer = AtomicFileWriter::new(self.dir.clone());
        let json_path = writer.write(&format!("{name}.json"), format!("{json}\n"))?;
        let md_path = writer.write(&format!("{name}.md"), render_capture_markdown(record))?;
        xops_debug!("Saved capture {} to {:?}", name, json_path);
        Ok(SavedCapture {
            json: json_path,
            markdown: md_path,
        })
    }
}

pub fn load_capture(path: &Path) -> Result<CaptureRecord, StoreError> {
    let raw = read_optional(path)?.ok_or_else(|| StoreError::Missing(path.to_path_buf()))?;
    CaptureRecord::from_json(&raw).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_queue(path: &Path) -> Result<(Vec<String>, Vec<QueueItem>), StoreError> {
    let raw = read_optional(path)?.ok_or_else(|| StoreError::Missing(path.to_path_buf()))?;
    parse_queue(&raw).map_err(|source| StoreError::Queue {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_queue(path: &Path, header: &[String], items: &[QueueItem]) -> Result<PathBuf, StoreError> {
    Ok(write_file(path, render_queue(header, items))?)
}
