//! Note sync: one Notion page per batch note.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use xops_core::{chunk_text, DEFAULT_CHUNK_CHARS};
use xops_logging::xops_info;

pub const NOTION_API_URL: &str = "https://api.notion.com";
pub const NOTION_VERSION: &str = "2022-06-28";
pub const DEFAULT_TITLE_PROP: &str = "Name";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(40);

#[derive(Debug, Error)]
pub enum NotionError {
    #[error("Notion sync requested but NOTION_TOKEN or NOTION_DATABASE_ID missing")]
    MissingCredentials,
    #[error("Notion sync failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Notion sync failed: HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionConfig {
    pub token: String,
    pub database_id: String,
    pub title_prop: String,
}

impl NotionConfig {
    /// Reads `NOTION_TOKEN`, `NOTION_DATABASE_ID` and `NOTION_TITLE_PROP`.
    pub fn from_env() -> Result<Self, NotionError> {
        let var = |key: &str| std::env::var(key).unwrap_or_default().trim().to_string();
        Self::from_values(var("NOTION_TOKEN"), var("NOTION_DATABASE_ID"), var("NOTION_TITLE_PROP"))
    }

    pub fn from_values(token: String, database_id: String, title_prop: String) -> Result<Self, NotionError> {
        if token.is_empty() || database_id.is_empty() {
            return Err(NotionError::MissingCredentials);
        }
        let title_prop = if title_prop.is_empty() {
            DEFAULT_TITLE_PROP.to_string()
        } else {
            title_prop
        };
        Ok(Self {
            token,
            database_id,
            title_prop,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CreatedPage {
    #[serde(default)]
    id: String,
}

/// Request body for a database page whose body is `markdown` split into
/// paragraph blocks.
pub fn page_payload(database_id: &str, title_prop: &str, title: &str, markdown: &str) -> Value {
    let children: Vec<Value> = chunk_text(markdown, DEFAULT_CHUNK_CHARS)
        .into_iter()
        .map(|part| {
            json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": {
                    "rich_text": [{"type": "text", "text": {"content": part}}]
                }
            })
        })
        .collect();

    json!({
        "parent": {"database_id": database_id},
        "properties": {
            title_prop: {
                "title": [{"type": "text", "text": {"content": title}}]
            }
        },
        "children": children,
    })
}

pub struct NotionClient {
    client: reqwest::Client,
    base_url: String,
    config: NotionConfig,
}

impl NotionClient {
    pub fn new(config: NotionConfig) -> Result<Self, NotionError> {
        Self::with_base_url(config, NOTION_API_URL)
    }

    pub fn from_env() -> Result<Self, NotionError> {
        Self::new(NotionConfig::from_env()?)
    }

    pub fn with_base_url(config: NotionConfig, base_url: impl Into<String>) -> Result<Self, NotionError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            config,
        })
    }

    /// Creates the page and returns its id.
    pub async fn create_page(&self, title: &str, markdown: &str) -> Result<String, NotionError> {
        let payload = page_payload(&self.config.database_id, &self.config.title_prop, title, markdown);
        let response = self
            .client
            .post(format!("{}/v1/pages", self.base_url))
            .bearer_auth(&self.config.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotionError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let page: CreatedPage = response.json().await?;
        xops_info!("Created Notion page {}", page.id);
        Ok(page.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_required() {
        assert!(matches!(
            NotionConfig::from_values("tok".into(), String::new(), String::new()),
            Err(NotionError::MissingCredentials)
        ));
        let config = NotionConfig::from_values("tok".into(), "db".into(), String::new()).unwrap();
        assert_eq!(config.title_prop, DEFAULT_TITLE_PROP);
    }

    #[test]
    fn payload_splits_body_into_paragraphs() {
        let body = format!("{}\n{}", "a".repeat(1500), "b".repeat(1500));
        let payload = page_payload("db", "Title", "X Batch Learning n", &body);
        assert_eq!(payload["parent"]["database_id"], "db");
        assert_eq!(
            payload["properties"]["Title"]["title"][0]["text"]["content"],
            "X Batch Learning n"
        );
        let children = payload["children"].as_array().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[1]["paragraph"]["rich_text"][0]["text"]["content"], "b".repeat(1500));
    }
}
