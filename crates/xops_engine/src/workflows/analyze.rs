use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Local;
use serde::Serialize;
use xops_core::{extract_status_id, CaptureRecord};
use xops_logging::xops_info;

use super::{
    learn_from_capture, load_links, run_batch, write_tutorial_plan, write_viral_report, BatchOptions, BatchResult,
    LearnOptions, LearnResult, WorkflowError,
};
use crate::browser::BrowserKind;
use crate::capture::{CaptureMode, Capturer};
use crate::notion::{NotionClient, NotionError};
use crate::paths::WorkspacePaths;
use crate::persist::write_file;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Tutorial,
    Viral,
    Batch,
}

impl FromStr for Purpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "tutorial" => Ok(Purpose::Tutorial),
            "2" | "viral" | "structure" => Ok(Purpose::Viral),
            "3" | "batch" => Ok(Purpose::Batch),
            other => Err(format!("Unsupported purpose: {other}")),
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Purpose::Tutorial => "tutorial",
            Purpose::Viral => "viral",
            Purpose::Batch => "batch",
        })
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub purpose: Purpose,
    pub url: Option<String>,
    pub links_file: Option<PathBuf>,
    pub browser: BrowserKind,
    pub headless: bool,
    pub proxy: Option<String>,
}

/// Size facts about a fresh capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureMetrics {
    pub status_id: String,
    pub main_text_len: usize,
    pub article_status: String,
    pub article_text_len: usize,
    pub capture_json: PathBuf,
    pub capture_md: PathBuf,
}

impl CaptureMetrics {
    pub fn from_record(record: &CaptureRecord, fallback_id: &str, capture_json: PathBuf, capture_md: PathBuf) -> Self {
        let status_id = [&record.main.status_id, &record.target_status_id]
            .into_iter()
            .find(|id| !id.is_empty())
            .cloned()
            .unwrap_or_else(|| fallback_id.to_string());
        let article = record.articles.first();
        Self {
            status_id,
            main_text_len: record.main.text.chars().count(),
            article_status: article.map(|a| a.status.as_str().to_string()).unwrap_or_default(),
            article_text_len: article.map(|a| a.text.chars().count()).unwrap_or(0),
            capture_json,
            capture_md,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResult {
    pub purpose: Purpose,
    pub url: String,
    pub browser: String,
    pub headless: bool,
    pub proxy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_mode: Option<CaptureMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_error_headless: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture: Option<CaptureMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learn: Option<LearnResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_links_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchResult>,
}

/// One entry point for capture plus analysis. Single-link purposes capture
/// (with headless fallback), learn and analyze; the batch purpose runs the
/// batch note with fetching enabled.
pub async fn analyze(
    paths: &WorkspacePaths,
    options: &AnalyzeOptions,
    capturer: &dyn Capturer,
    notion: Option<Result<NotionClient, NotionError>>,
) -> Result<AnalyzeResult, WorkflowError> {
    let url = options.url.as_deref().map(str::trim).unwrap_or_default().to_string();
    let mut result = AnalyzeResult {
        purpose: options.purpose,
        url: url.clone(),
        browser: options.browser.to_string(),
        headless: options.headless,
        proxy: options.proxy.clone().unwrap_or_default(),
        capture_mode: None,
        capture_error_headless: None,
        capture: None,
        learn: None,
        analysis_type: None,
        analysis_file: None,
        generated_links_file: None,
        batch: None,
    };

    if options.purpose == Purpose::Batch {
        let links_file = match &options.links_file {
            Some(path) => path.clone(),
            None if url.is_empty() => {
                return Err(WorkflowError::Input("batch mode requires --links-file or --url".to_string()))
            }
            None => {
                let name = Local::now().format("x_links_%Y%m%d_%H%M%S.txt").to_string();
                let path = write_file(&paths.data_dir().join(name), format!("{url}\n"))?;
                result.generated_links_file = Some(path.clone());
                path
            }
        };
        let links = load_links(&links_file)?;
        let batch_options = BatchOptions {
            name: None,
            fetch: true,
        };
        result.batch = Some(run_batch(paths, &links, &batch_options, Some(capturer), notion).await?);
        return Ok(result);
    }

    if url.is_empty() {
        return Err(WorkflowError::Input("single-link mode requires --url".to_string()));
    }
    let sid = extract_status_id(&url).ok_or_else(|| WorkflowError::Input(format!("Invalid X status URL: {url}")))?;

    let report = capturer.capture(&url).await?;
    result.capture_mode = Some(report.capture_mode);
    result.capture_error_headless = report.capture_error_headless.clone();
    result.learn = Some(learn_from_capture(paths, &report.capture_json, &LearnOptions::default())?);
    result.capture = Some(CaptureMetrics::from_record(
        &report.record,
        &sid,
        report.capture_json.clone(),
        report.capture_md.clone(),
    ));

    let (analysis_type, analysis_file) = match options.purpose {
        Purpose::Tutorial => (
            "tutorial_plan",
            write_tutorial_plan(paths, &report.capture_json, None)?.output,
        ),
        _ => ("viral_structure", write_viral_report(paths, &report.capture_json, None)?.out_md),
    };
    xops_info!("Analysis {} written to {:?}", analysis_type, analysis_file);
    result.analysis_type = Some(analysis_type.to_string());
    result.analysis_file = Some(analysis_file);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xops_core::{ArticleStatus, LongArticle, PostSnapshot};

    #[test]
    fn purposes_accept_numbers_and_aliases() {
        assert_eq!("1".parse::<Purpose>(), Ok(Purpose::Tutorial));
        assert_eq!(" Structure ".parse::<Purpose>(), Ok(Purpose::Viral));
        assert_eq!("3".parse::<Purpose>(), Ok(Purpose::Batch));
        assert!("4".parse::<Purpose>().is_err());
    }

    #[test]
    fn metrics_describe_first_article() {
        let record = CaptureRecord {
            main: PostSnapshot {
                text: "步骤一".into(),
                ..PostSnapshot::default()
            },
            target_status_id: "9".into(),
            articles: vec![LongArticle {
                status: ArticleStatus::Ok,
                text: "x".repeat(30),
                ..LongArticle::pending("u")
            }],
            ..CaptureRecord::default()
        };
        let metrics = CaptureMetrics::from_record(&record, "1", "a.json".into(), "a.md".into());
        assert_eq!(metrics.status_id, "9");
        assert_eq!(metrics.main_text_len, 3);
        assert_eq!(metrics.article_status, "ok");
        assert_eq!(metrics.article_text_len, 30);
    }
}
