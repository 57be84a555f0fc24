//! Key-learning extraction and the markdown it feeds: the per-capture learned
//! note and the knowledge-base entry.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::capture::CaptureRecord;
use crate::links::clean_text;

pub const DEFAULT_MAX_POINTS: usize = 8;
pub const KB_POINTS: usize = 5;
pub const KB_HEADER: &str = "# X Lessons KB\n\n";

const MIN_SENTENCE_CHARS: usize = 8;

const PRACTICAL_KEYWORDS: &[&str] = &[
    "step", "steps", "how", "why", "tip", "tips", "avoid", "pitfall", "issue", "方法", "步骤",
    "建议", "注意", "避坑", "技巧", "原理", "安装", "配置", "实测", "must", "should", "best",
    "first", "then",
];

pub(crate) static SENTENCE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\n。！？!?;；]+").expect("sentence split regex"));
pub(crate) static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\b").expect("number regex"));

/// Cleaned sentences of at least `min_chars` characters.
pub fn split_sentences(text: &str, min_chars: usize) -> Vec<String> {
    let text = text.replace('\r', "\n");
    SENTENCE_SPLIT_RE
        .split(&text)
        .map(clean_text)
        .filter(|s| !s.is_empty() && s.chars().count() >= min_chars)
        .collect()
}

pub fn score_sentence(sentence: &str) -> u32 {
    let lower = sentence.to_lowercase();
    let mut score = PRACTICAL_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .count() as u32
        * 2;

    if NUMBER_RE.is_match(sentence) {
        score += 1;
    }

    let len = sentence.chars().count();
    if (20..=180).contains(&len) {
        score += 2;
    } else if (10..=240).contains(&len) {
        score += 1;
    }
    score
}

/// Highest scoring distinct sentences across `texts`, ties kept in reading
/// order.
pub fn top_points<S: AsRef<str>>(texts: &[S], limit: usize) -> Vec<String> {
    let all: Vec<String> = texts
        .iter()
        .flat_map(|t| split_sentences(t.as_ref(), MIN_SENTENCE_CHARS))
        .collect();

    let mut seen = HashSet::new();
    let mut ranked: Vec<(u32, &String)> = all
        .iter()
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(|s| (score_sentence(s), s))
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));

    let points: Vec<String> = ranked
        .into_iter()
        .take(limit)
        .map(|(_, s)| s.clone())
        .collect();
    if points.is_empty() {
        return all.into_iter().take(limit).collect();
    }
    points
}

/// Marker line that identifies one knowledge-base entry.
pub fn kb_marker(status_id: &str) -> String {
    format!("<!-- status_id:{status_id} -->")
}

/// Knowledge-base entry, marker line first, ending with a blank line.
pub fn render_kb_entry(record: &CaptureRecord, points: &[String], learned_note: &str) -> String {
    let sid = record.status_id();
    let mut lines = vec![
        kb_marker(&sid),
        format!("## {sid}"),
        format!("- source_url: {}", record.url),
        format!("- author: {}", record.main.author),
        format!("- learned_note: {learned_note}"),
    ];
    if !points.is_empty() {
        lines.push("- top_points:".to_string());
        lines.extend(points.iter().take(KB_POINTS).map(|p| format!("  - {p}")));
    }
    lines.push(String::new());
    let mut entry = lines.join("\n");
    entry.push('\n');
    entry
}

pub fn render_learning_note(record: &CaptureRecord, points: &[String]) -> String {
    let main = &record.main;
    let mut lines: Vec<String> = vec![
        format!("# Learned Note {}", record.target_status_id),
        String::new(),
        format!("- source_url: {}", record.url),
        format!("- author: {}", main.author),
        handle_line(&main.author_handle),
        format!("- captured_at: {}", record.captured_at),
        format!("- thread_count: {}", record.thread.len()),
        String::new(),
        "## Original".to_string(),
        main.text.clone(),
        String::new(),
    ];

    if !record.articles.is_empty() {
        lines.push("## Long Article".to_string());
        for (idx, article) in record.articles.iter().enumerate() {
            lines.push(format!("### {}", idx + 1));
            lines.push(format!("- url: {}", article.url));
            lines.push(format!("- status: {}", article.status.as_str()));
            lines.push(format!("- title: {}", article.title));
            lines.push(String::new());
            lines.push(article.text.clone());
            lines.push(String::new());
        }
    }

    let downloaded = record.downloaded_media.as_deref().unwrap_or_default();
    if !main.media_urls.is_empty() || !downloaded.is_empty() {
        lines.push("## Media".to_string());
        if !main.media_urls.is_empty() {
            lines.push("- source_media_urls:".to_string());
            lines.extend(main.media_urls.iter().map(|u| format!("  - {u}")));
        }
        if !downloaded.is_empty() {
            lines.push("- downloaded_media_files:".to_string());
            lines.extend(downloaded.iter().map(|p| format!("  - {p}")));
        }
        lines.push(String::new());
    }

    lines.push("## Key Learnings".to_string());
    if points.is_empty() {
        lines.push("- (no key points extracted)".to_string());
    } else {
        lines.extend(points.iter().map(|p| format!("- {p}")));
    }
    lines.push(String::new());

    lines.extend(
        [
            "## Reusable Angles",
            "- What problem does this solve and for whom?",
            "- What is the fastest path from zero to working?",
            "- What pitfalls should be avoided in production?",
            "",
            "## Next Actions",
            "- Convert top 3 learnings into one short post + one checklist post.",
            "- Keep source URL for attribution and verification.",
            "",
        ]
        .map(str::to_string),
    );

    lines.join("\n")
}

pub(crate) fn handle_line(handle: &str) -> String {
    if handle.is_empty() {
        "- handle: ".to_string()
    } else {
        format!("- handle: @{handle}")
    }
}
