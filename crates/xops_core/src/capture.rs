//! Capture record: one immutable snapshot of a post, its thread and the
//! long-form articles it links to.
//!
//! Every field carries `#[serde(default)]` so records written by older
//! versions (no `articles`, empty `thread`, no media) still load.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostSnapshot {
    pub status_id: String,
    pub status_url: String,
    pub author: String,
    pub author_handle: String,
    pub timestamp: String,
    pub text: String,
    pub media_urls: Vec<String>,
    pub article_urls: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    Ok,
    LoginRequired,
    AccessLimited,
    NoText,
    Timeout,
    Error,
    FromStatusPage,
    #[default]
    Unknown,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Ok => "ok",
            ArticleStatus::LoginRequired => "login_required",
            ArticleStatus::AccessLimited => "access_limited",
            ArticleStatus::NoText => "no_text",
            ArticleStatus::Timeout => "timeout",
            ArticleStatus::Error => "error",
            ArticleStatus::FromStatusPage => "from_status_page",
            ArticleStatus::Unknown => "unknown",
        }
    }

    /// Statuses whose empty text may be replaced by the status page text.
    pub fn is_recoverable_from_status_page(&self) -> bool {
        matches!(
            self,
            ArticleStatus::NoText | ArticleStatus::AccessLimited | ArticleStatus::LoginRequired
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongArticle {
    pub url: String,
    pub final_url: String,
    pub status: ArticleStatus,
    pub title: String,
    pub text: String,
}

impl LongArticle {
    pub fn pending(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureRecord {
    pub url: String,
    pub target_status_id: String,
    pub captured_at: String,
    pub main: PostSnapshot,
    pub thread: Vec<PostSnapshot>,
    pub thread_count: usize,
    pub scan_count: usize,
    pub articles: Vec<LongArticle>,
    pub article_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloaded_media: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloaded_media_count: Option<usize>,
}

impl CaptureRecord {
    /// Status id of the record, falling back to the main post and then to the
    /// id embedded in the source url.
    pub fn status_id(&self) -> String {
        if !self.target_status_id.is_empty() {
            return self.target_status_id.clone();
        }
        if !self.main.status_id.is_empty() {
            return self.main.status_id.clone();
        }
        crate::links::extract_status_id(&self.url).unwrap_or_default()
    }

    /// Main text followed by thread texts, skipping blank ones.
    pub fn post_texts(&self) -> Vec<&str> {
        std::iter::once(self.main.text.as_str())
            .chain(self.thread.iter().map(|t| t.text.as_str()))
            .filter(|t| !t.trim().is_empty())
            .collect()
    }

    /// Post texts plus long-article texts, skipping blank ones.
    pub fn all_texts(&self) -> Vec<&str> {
        let mut texts = self.post_texts();
        texts.extend(
            self.articles
                .iter()
                .map(|a| a.text.as_str())
                .filter(|t| !t.trim().is_empty()),
        );
        texts
    }

    /// Media urls of the main post and thread, deduplicated in order.
    pub fn unique_media_urls(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        std::iter::once(&self.main)
            .chain(self.thread.iter())
            .flat_map(|post| post.media_urls.iter())
            .filter(|u| !u.is_empty() && seen.insert(u.as_str()))
            .cloned()
            .collect()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_record_without_optional_fields_loads() {
        let raw = r#"{"url":"https://x.com/a/status/42","main":{"text":"hello"}}"#;
        let record = CaptureRecord::from_json(raw).unwrap();
        assert!(record.thread.is_empty());
        assert!(record.articles.is_empty());
        assert_eq!(record.downloaded_media, None);
        assert_eq!(record.status_id(), "42");
        assert_eq!(record.main.text, "hello");
    }

    #[test]
    fn article_status_serializes_snake_case() {
        let article = LongArticle {
            status: ArticleStatus::LoginRequired,
            ..LongArticle::pending("https://x.com/i/article/1")
        };
        let json = serde_json::to_string(&article).unwrap();
        assert!(json.contains("\"status\":\"login_required\""));
    }

    #[test]
    fn media_download_fields_are_omitted_when_absent() {
        let json = CaptureRecord::default().to_json_pretty().unwrap();
        assert!(!json.contains("downloaded_media"));
    }

    #[test]
    fn unique_media_urls_keeps_first_occurrence() {
        let record = CaptureRecord {
            main: PostSnapshot {
                media_urls: vec!["a".into(), "b".into()],
                ..PostSnapshot::default()
            },
            thread: vec![PostSnapshot {
                media_urls: vec!["b".into(), "c".into(), String::new()],
                ..PostSnapshot::default()
            }],
            ..CaptureRecord::default()
        };
        assert_eq!(record.unique_media_urls(), vec!["a", "b", "c"]);
    }
}
