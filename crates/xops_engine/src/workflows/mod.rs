//! The tool invocations: each takes the workspace paths plus its options and
//! returns a serializable result printed by the binary.

mod analysis;
mod analyze;
mod batch;
mod drafts;
mod generate;
mod learn;

use std::path::{Path, PathBuf};

use thiserror::Error;
use xops_core::extract_status_id;

use crate::browser::BrowserError;
use crate::capture::CaptureError;
use crate::config::ConfigError;
use crate::paths::WorkspacePaths;
use crate::persist::PersistError;
use crate::store::StoreError;

pub use analysis::{write_tutorial_plan, write_viral_report, TutorialResult, ViralResult};
pub use analyze::{analyze, AnalyzeOptions, AnalyzeResult, CaptureMetrics, Purpose};
pub use batch::{load_links, parse_links, run_batch, BatchOptions, BatchResult};
pub use drafts::{draft_text, publish_drafts, DraftsOptions, DraftsResult, COMPOSE_URL, DEFAULT_DRAFT_LIMIT};
pub use generate::{generate_queue, generate_queue_with, GenerateOptions, GenerateResult};
pub use learn::{learn_from_capture, LearnOptions, LearnResult};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Input(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error("failed to serialize result: {0}")]
    Json(#[from] serde_json::Error),
}

/// Capture file named by `--capture`, or the one stored for the status id in
/// `--url`. The file must exist.
pub fn resolve_capture_path(
    paths: &WorkspacePaths,
    capture: Option<&Path>,
    url: Option<&str>,
) -> Result<PathBuf, WorkflowError> {
    let path = match (capture, url.map(str::trim).filter(|u| !u.is_empty())) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(url)) => {
            let sid = extract_status_id(url)
                .ok_or_else(|| WorkflowError::Input(format!("Cannot infer status id from url: {url}")))?;
            paths.capture_json(&sid)
        }
        (None, None) => return Err(WorkflowError::Input("Provide --url or --capture".to_string())),
    };
    if !path.is_file() {
        return Err(WorkflowError::Input(format!("Capture file not found: {}", path.display())));
    }
    Ok(path)
}

/// Output id of a record: its status id, else the id in the capture file
/// name, else `unknown`.
pub(crate) fn output_id(record: &xops_core::CaptureRecord, capture_path: &Path) -> String {
    let sid = record.status_id();
    if !sid.is_empty() {
        return sid;
    }
    capture_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| stem.chars().all(|c| c.is_ascii_digit()) && !stem.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}
