use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use xops_core::{kb_marker, render_kb_entry, CaptureRecord, KB_HEADER};
use xops_logging::xops_info;

use crate::persist::{ensure_dir, read_optional, PersistError};

/// Appends the record's entry to the knowledge base unless its marker is
/// already present anywhere in the file. Returns whether an entry was written.
pub fn append_kb_entry(
    kb_path: &Path,
    record: &CaptureRecord,
    points: &[String],
    learned_note: &str,
) -> Result<bool, PersistError> {
    let marker = kb_marker(&record.status_id());
    let existing = read_optional(kb_path)?;
    if existing.as_deref().is_some_and(|content| content.contains(&marker)) {
        return Ok(false);
    }

    if let Some(parent) = kb_path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(kb_path)?;
    if existing.is_none() {
        file.write_all(KB_HEADER.as_bytes())?;
    }
    file.write_all(render_kb_entry(record, points, learned_note).as_bytes())?;
    xops_info!("Appended {} to {:?}", marker, kb_path);
    Ok(true)
}
