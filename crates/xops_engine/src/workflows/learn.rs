use std::path::{Path, PathBuf};

use serde::Serialize;
use xops_core::{render_learning_note, top_points, DEFAULT_MAX_POINTS};
use xops_logging::xops_info;

use super::{output_id, WorkflowError};
use crate::knowledge::append_kb_entry;
use crate::paths::WorkspacePaths;
use crate::persist::write_file;
use crate::store::load_capture;

#[derive(Debug, Clone)]
pub struct LearnOptions {
    pub max_points: usize,
    /// Learned note path; defaults to `data/learned/<id>.md`.
    pub output: Option<PathBuf>,
    /// Knowledge base; defaults to `data/knowledge/x_lessons.md`.
    pub kb: Option<PathBuf>,
}

impl Default for LearnOptions {
    fn default() -> Self {
        Self {
            max_points: DEFAULT_MAX_POINTS,
            output: None,
            kb: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LearnResult {
    pub capture: PathBuf,
    pub learned: PathBuf,
    pub kb: PathBuf,
    pub kb_appended: bool,
    pub points: usize,
}

/// Writes the learned note for a stored capture and records its top points
/// in the knowledge base, once per status id.
pub fn learn_from_capture(
    paths: &WorkspacePaths,
    capture_path: &Path,
    options: &LearnOptions,
) -> Result<LearnResult, WorkflowError> {
    let record = load_capture(capture_path)?;
    let points = top_points(&record.all_texts(), options.max_points);

    let learned = match &options.output {
        Some(path) => path.clone(),
        None => paths
            .learned_dir()
            .join(format!("{}.md", output_id(&record, capture_path))),
    };
    write_file(&learned, render_learning_note(&record, &points))?;

    let kb = options.kb.clone().unwrap_or_else(|| paths.kb_file());
    let kb_appended = append_kb_entry(&kb, &record, &points, &learned.display().to_string())?;
    xops_info!(
        "Learned {} points from {:?} (kb appended: {})",
        points.len(),
        capture_path,
        kb_appended
    );

    Ok(LearnResult {
        capture: capture_path.to_path_buf(),
        learned,
        kb,
        kb_appended,
        points: points.len(),
    })
}
