use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use xops_core::{categorize, extract_status_id, render_batch_note, summarize, BatchEntry};
use xops_logging::{xops_info, xops_warn};

use super::{learn_from_capture, LearnOptions, WorkflowError};
use crate::capture::Capturer;
use crate::notion::{NotionClient, NotionError};
use crate::paths::WorkspacePaths;
use crate::persist::{read_optional, write_file};
use crate::store::CaptureStore;

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Note name; defaults to `batch_<local timestamp>`.
    pub name: Option<String>,
    /// Capture links that have no stored capture yet.
    pub fetch: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub links: usize,
    pub processed: usize,
    pub output: PathBuf,
    pub notion_page_id: String,
    pub errors: Vec<String>,
}

/// One url per line; blank lines and `#` comments are skipped.
pub fn parse_links(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn load_links(path: &Path) -> Result<Vec<String>, WorkflowError> {
    let content = read_optional(path)?
        .ok_or_else(|| WorkflowError::Input(format!("Links file not found: {}", path.display())))?;
    Ok(parse_links(&content))
}

/// Categorizes every link's capture into a grouped note. A failing link is
/// recorded in `errors` and the batch goes on.
///
/// `notion` is `None` when sync is off; a construction error is recorded
/// like any other sync failure.
pub async fn run_batch(
    paths: &WorkspacePaths,
    links: &[String],
    options: &BatchOptions,
    capturer: Option<&dyn Capturer>,
    notion: Option<Result<NotionClient, NotionError>>,
) -> Result<BatchResult, WorkflowError> {
    let store = CaptureStore::new(paths.capture_dir());
    let mut entries = Vec::new();
    let mut errors = Vec::new();

    for link in links {
        match batch_entry(paths, &store, link, options.fetch, capturer).await {
            Ok(entry) => entries.push(entry),
            Err(err) => {
                xops_warn!("Batch link skipped: {}", err);
                errors.push(err);
            }
        }
    }

    let name = options
        .name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| Local::now().format("batch_%Y%m%d_%H%M%S").to_string());
    let generated_at = Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
    let markdown = render_batch_note(&entries, links.len(), &name, &generated_at);
    let output = write_file(&paths.batch_notes_dir().join(format!("{name}.md")), &markdown)?;

    let mut notion_page_id = String::new();
    if let Some(client) = notion {
        let synced = match client {
            Ok(client) => client.create_page(&format!("X Batch Learning {name}"), &markdown).await,
            Err(err) => Err(err),
        };
        match synced {
            Ok(id) => notion_page_id = id,
            Err(err) => errors.push(err.to_string()),
        }
    }

    xops_info!(
        "Batch {}: {}/{} links processed, {} errors",
        name,
        entries.len(),
        links.len(),
        errors.len()
    );
    Ok(BatchResult {
        links: links.len(),
        processed: entries.len(),
        output,
        notion_page_id,
        errors,
    })
}

async fn batch_entry(
    paths: &WorkspacePaths,
    store: &CaptureStore,
    link: &str,
    fetch: bool,
    capturer: Option<&dyn Capturer>,
) -> Result<BatchEntry, String> {
    let sid = extract_status_id(link).ok_or_else(|| format!("Invalid X link: {link}"))?;

    if !store.contains(&sid) && fetch {
        if let Some(capturer) = capturer {
            let report = capturer.capture(link).await.map_err(|err| format!("{link}: {err}"))?;
            learn_from_capture(paths, &report.capture_json, &LearnOptions::default())
                .map_err(|err| format!("{link}: {err}"))?;
        }
    }
    if !store.contains(&sid) {
        return Err(format!("missing capture: {link}"));
    }

    let record = store.load(&sid).map_err(|err| format!("{link}: {err}"))?;
    let text = &record.main.text;
    let status_id = if record.target_status_id.is_empty() {
        sid
    } else {
        record.target_status_id.clone()
    };
    Ok(BatchEntry {
        status_id,
        url: link.to_string(),
        author: record.main.author.clone(),
        summary: summarize(text),
        category: categorize(text).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_skip_blanks_and_comments() {
        let links = parse_links("# saved\nhttps://x.com/a/status/1\n\n  https://x.com/b/status/2  \n#x\n");
        assert_eq!(links, ["https://x.com/a/status/1", "https://x.com/b/status/2"]);
    }
}
