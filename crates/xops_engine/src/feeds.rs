//! RSS and Atom seeds for the `ai_hotspot` section.

use std::collections::HashSet;

use feed_rs::parser;
use thiserror::Error;
use xops_core::{clean_text, SeedItem, SeedSections, SECTION_AI_HOTSPOT};
use xops_logging::{xops_info, xops_warn};

use crate::fetch::{FetchError, Fetcher};

/// Entries taken from the top of each feed.
pub const ENTRIES_PER_FEED: usize = 5;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("unparseable feed: {0}")]
    Parse(#[from] parser::ParseFeedError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub summary: String,
}

pub fn parse_feed_entries(bytes: &[u8]) -> Result<Vec<FeedEntry>, FeedError> {
    let feed = parser::parse(bytes)?;
    Ok(feed
        .entries
        .into_iter()
        .map(|entry| FeedEntry {
            title: entry.title.map(|t| clean_text(&t.content)).unwrap_or_default(),
            link: entry.links.first().map(|l| l.href.clone()).unwrap_or_default(),
            summary: entry
                .summary
                .map(|s| clean_text(&s.content))
                .unwrap_or_default(),
        })
        .collect())
}

pub async fn fetch_feed_entries(fetcher: &dyn Fetcher, url: &str) -> Result<Vec<FeedEntry>, FeedError> {
    let output = fetcher.fetch(url).await?;
    parse_feed_entries(&output.bytes)
}

/// Appends up to `per_feed` entries to `ai_hotspot`, skipping entries
/// without a link and links already present. Returns how many were added.
pub fn add_feed_seeds(sections: &mut SeedSections, entries: &[FeedEntry], per_feed: usize) -> usize {
    let items = sections.entry(SECTION_AI_HOTSPOT.to_string()).or_default();
    let mut existing: HashSet<String> = items.iter().map(|item| item.url.clone()).collect();
    let before = items.len();
    for entry in entries.iter().take(per_feed) {
        if entry.link.is_empty() || !existing.insert(entry.link.clone()) {
            continue;
        }
        items.push(SeedItem {
            section: SECTION_AI_HOTSPOT.to_string(),
            url: entry.link.clone(),
            note: entry.title.clone(),
            title: entry.title.clone(),
            summary: entry.summary.clone(),
        });
    }
    items.len() - before
}

/// Pulls every configured feed into `sections`; unreachable feeds are
/// logged and skipped.
pub async fn add_rss_seeds(fetcher: &dyn Fetcher, sections: &mut SeedSections, feed_urls: &[String]) {
    for url in feed_urls {
        match fetch_feed_entries(fetcher, url).await {
            Ok(entries) => {
                let added = add_feed_seeds(sections, &entries, ENTRIES_PER_FEED);
                xops_info!("Feed {} contributed {} seeds", url, added);
            }
            Err(err) => xops_warn!("Feed {} skipped: {}", url, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>AI</title>
<item><title>Model  launch</title><link>https://a.example/1</link><description>New model</description></item>
<item><title>Dup</title><link>https://a.example/seeded</link></item>
<item><title>Two</title><link>https://a.example/2</link></item>
</channel></rss>"#;

    #[test]
    fn rss_entries_are_parsed() {
        let entries = parse_feed_entries(RSS.as_bytes()).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].title, "Model launch");
        assert_eq!(entries[0].link, "https://a.example/1");
        assert_eq!(entries[0].summary, "New model");
    }

    #[test]
    fn feed_seeds_dedupe_and_cap() {
        let mut sections = SeedSections::new();
        sections.insert(
            SECTION_AI_HOTSPOT.to_string(),
            vec![SeedItem {
                section: SECTION_AI_HOTSPOT.into(),
                url: "https://a.example/seeded".into(),
                ..SeedItem::default()
            }],
        );
        let entries = parse_feed_entries(RSS.as_bytes()).unwrap();

        assert_eq!(add_feed_seeds(&mut sections, &entries, 2), 1);
        assert_eq!(add_feed_seeds(&mut sections, &entries, 5), 1);
        let urls: Vec<_> = sections[SECTION_AI_HOTSPOT].iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, ["https://a.example/seeded", "https://a.example/1", "https://a.example/2"]);
        assert_eq!(sections[SECTION_AI_HOTSPOT][1].note, "Model launch");
    }
}
