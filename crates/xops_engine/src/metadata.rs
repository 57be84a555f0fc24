//! Title and description of a seed page, used to enrich generated posts.

use scraper::{Html, Selector};
use xops_core::clean_text;
use xops_logging::xops_warn;

use crate::decode::decode_page;
use crate::fetch::Fetcher;

const DESCRIPTION_KEYS: &[&str] = &["description", "og:description", "twitter:description"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: String,
    pub summary: String,
}

pub fn parse_page_metadata(html: &str) -> PageMetadata {
    let doc = Html::parse_document(html);
    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| doc.select(&sel).next().map(|t| t.text().collect::<String>()))
        .unwrap_or_default();

    let summary = DESCRIPTION_KEYS
        .iter()
        .find_map(|key| {
            ["name", "property"].iter().find_map(|attr| {
                let sel = Selector::parse(&format!("meta[{attr}=\"{key}\"]")).ok()?;
                doc.select(&sel)
                    .next()
                    .and_then(|meta| meta.value().attr("content"))
                    .filter(|content| !content.is_empty())
                    .map(str::to_string)
            })
        })
        .unwrap_or_default();

    PageMetadata {
        title: clean_text(&title),
        summary: clean_text(&summary),
    }
}

/// Any fetch failure yields empty metadata.
pub async fn fetch_page_metadata(fetcher: &dyn Fetcher, url: &str) -> PageMetadata {
    match fetcher.fetch(url).await {
        Ok(output) => {
            let page = decode_page(&output.bytes, output.metadata.content_type.as_deref());
            parse_page_metadata(&page.text)
        }
        Err(err) => {
            xops_warn!("Metadata fetch failed for {}: {}", url, err);
            PageMetadata::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_prefers_plain_meta_then_open_graph() {
        let html = r#"<html><head><title>  Some
            Title </title>
            <meta property="og:description" content="og text">
            <meta name="twitter:description" content="tw text">
            </head></html>"#;
        let meta = parse_page_metadata(html);
        assert_eq!(meta.title, "Some Title");
        assert_eq!(meta.summary, "og text");
    }

    #[test]
    fn missing_tags_give_empty_fields() {
        assert_eq!(parse_page_metadata("<p>x</p>"), PageMetadata::default());
    }
}
