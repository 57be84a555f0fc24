//! Seed list parsing and the policy that turns seeds into queue items.

use std::collections::BTreeMap;

use crate::links::{infer_github_repo, truncate_chars};
use crate::queue::QueueItem;

pub const SECTION_AI_HOTSPOT: &str = "ai_hotspot";
pub const SECTION_OPENCLAW: &str = "openclaw";
pub const SECTION_GITHUB_TRENDING: &str = "github_trending";
/// Order in which seed sections are merged into the queue.
pub const SECTION_ORDER: &[&str] = &[SECTION_AI_HOTSPOT, SECTION_OPENCLAW, SECTION_GITHUB_TRENDING];
pub const POST_CHAR_LIMIT: usize = 280;
/// Every n-th generated item is written in English.
pub const ENGLISH_EVERY: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedItem {
    pub section: String,
    pub url: String,
    pub note: String,
    pub title: String,
    pub summary: String,
}

pub type SeedSections = BTreeMap<String, Vec<SeedItem>>;

/// Parses `## section` headings, `- url` items and `note:` lines.
pub fn parse_seeds(content: &str) -> SeedSections {
    let mut sections = SeedSections::new();
    let mut current: Option<String> = None;

    for raw in content.lines() {
        let line = raw.trim();
        if let Some(name) = line.strip_prefix("## ") {
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }
        let Some(section) = current.as_ref() else {
            continue;
        };
        let items = sections.entry(section.clone()).or_default();
        if let Some(url) = line.strip_prefix("- ") {
            items.push(SeedItem {
                section: section.clone(),
                url: url.trim().to_string(),
                ..SeedItem::default()
            });
            continue;
        }
        if let Some(note) = line.strip_prefix("note:") {
            if let Some(last) = items.last_mut() {
                last.note = note.trim().to_string();
            }
        }
    }
    sections
}

/// Language of the item at zero-based position `idx`.
pub fn lang_for_position(idx: usize) -> &'static str {
    if (idx + 1) % ENGLISH_EVERY == 0 {
        "en"
    } else {
        "zh"
    }
}

/// Seeds merged in [`SECTION_ORDER`], capped at `limit`.
pub fn merge_sections(sections: &SeedSections, limit: usize) -> Vec<SeedItem> {
    SECTION_ORDER
        .iter()
        .filter_map(|key| sections.get(*key))
        .flatten()
        .take(limit)
        .cloned()
        .collect()
}

/// Template post for a seed when no generated text is available.
pub fn fallback_text(seed: &SeedItem, lang: &str) -> String {
    let title = if !seed.title.is_empty() {
        seed.title.clone()
    } else {
        infer_github_repo(&seed.url).unwrap_or_else(|| "未命名内容".to_string())
    };
    let summary = [&seed.summary, &seed.note]
        .into_iter()
        .find(|s| !s.is_empty())
        .cloned()
        .unwrap_or_else(|| "简要更新".to_string());
    let url = &seed.url;
    let en = lang == "en";

    let text = match seed.section.as_str() {
        SECTION_AI_HOTSPOT if en => format!("AI update: {title}\nTL;DR: {summary}\nSource: {url}"),
        SECTION_AI_HOTSPOT => format!("【AI动态】{title}\n一句话：{summary}\n来源：{url}"),
        SECTION_OPENCLAW if en => {
            format!("Openclaw notes: {title}\nKey points: {summary}\nSource: {url}")
        }
        SECTION_OPENCLAW => format!("【Openclaw 经验】{title}\n要点：{summary}\n来源：{url}"),
        SECTION_GITHUB_TRENDING => {
            let repo = infer_github_repo(url).unwrap_or(title);
            if en {
                format!("GitHub trend: {repo}\nWhy: {summary}\nSource: {url}")
            } else {
                format!("【GitHub 热门】{repo}\n亮点：{summary}\n来源：{url}")
            }
        }
        _ if en => format!("Update: {title}\n{summary}\nSource: {url}"),
        _ => format!("更新：{title}\n{summary}\n来源：{url}"),
    };
    truncate_chars(&text, POST_CHAR_LIMIT)
}

/// Builds pending queue items; `render` may supply generated text for a seed
/// and returns an empty string to fall back to the template.
pub fn build_items<F>(seeds: &[SeedItem], mut render: F) -> Vec<QueueItem>
where
    F: FnMut(&SeedItem) -> String,
{
    seeds
        .iter()
        .enumerate()
        .map(|(idx, seed)| {
            let lang = lang_for_position(idx);
            let mut text = if SECTION_ORDER.contains(&seed.section.as_str()) {
                render(seed)
            } else {
                String::new()
            };
            if text.is_empty() {
                text = fallback_text(seed, lang);
            }
            QueueItem {
                source: seed.url.clone(),
                note: seed.note.clone(),
                text,
                ..QueueItem::new(idx as u32 + 1, seed.section.clone(), lang)
            }
        })
        .collect()
}

pub fn queue_header(date: &str, timezone: &str, posts_per_day: usize) -> Vec<String> {
    vec![
        format!("# X Queue - {date}"),
        format!("timezone: {timezone}"),
        format!("posts_per_day: {posts_per_day}"),
    ]
}

/// Fills a prompt template's `{title}`, `{summary}`, `{url}` and `{note}`
/// placeholders.
pub fn fill_template(template: &str, seed: &SeedItem) -> String {
    template
        .replace("{title}", &seed.title)
        .replace("{summary}", &seed.summary)
        .replace("{url}", &seed.url)
        .replace("{note}", &seed.note)
}
