//! Hook / structure / call-to-action heuristics for a captured post.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::capture::CaptureRecord;
use crate::learning::NUMBER_RE;
use crate::links::clean_text;

const HOOK_WINDOW: usize = 120;
const FIRST_CHARS: usize = 140;
const OUTLINE_LINES: usize = 8;
const WARNING_WORDS: &[&str] = &["被低估", "别再", "真相", "误区", "千万", "必须", "不要"];
const CTA_WORDS: &[&str] = &["评论", "补充", "共创", "转发", "收藏"];

static LIST_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.|[-*])\s+").expect("list line regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureStats {
    pub line_count: usize,
    pub list_like_lines: usize,
    pub density: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViralReport {
    pub url: String,
    pub target_status_id: String,
    pub author: String,
    pub timestamp: String,
    pub hook_type: String,
    pub first_140: String,
    pub structure: StructureStats,
    pub outline_guess: Vec<String>,
    pub cta_guess: String,
}

impl ViralReport {
    /// Analyzes the main text, or the joined article texts when the post
    /// body is empty.
    pub fn from_record(record: &CaptureRecord) -> Self {
        let mut text = record.main.text.clone();
        if clean_text(&text).is_empty() {
            let article_texts: Vec<String> = record
                .articles
                .iter()
                .map(|a| clean_text(&a.text))
                .filter(|t| !t.is_empty())
                .collect();
            if !article_texts.is_empty() {
                text = article_texts.join("\n");
            }
        }

        let lines = non_empty_lines(&text);
        let cta_guess = if CTA_WORDS.iter().any(|w| text.contains(w)) {
            "comment"
        } else {
            "none"
        };

        Self {
            url: record.url.clone(),
            target_status_id: record.target_status_id.clone(),
            author: record.main.author.clone(),
            timestamp: record.main.timestamp.clone(),
            hook_type: infer_hook(&text).to_string(),
            first_140: clean_text(&text).chars().take(FIRST_CHARS).collect(),
            structure: detect_structure(&lines),
            outline_guess: lines.iter().take(OUTLINE_LINES).cloned().collect(),
            cta_guess: cta_guess.to_string(),
        }
    }
}

fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(clean_text)
        .filter(|l| !l.is_empty())
        .collect()
}

pub fn infer_hook(text: &str) -> &'static str {
    let cleaned = clean_text(text);
    if cleaned.is_empty() {
        return "unknown";
    }
    let head: String = cleaned.chars().take(HOOK_WINDOW).collect();
    if head.contains('?') || head.contains('？') {
        return "question";
    }
    if WARNING_WORDS.iter().any(|w| head.contains(w)) {
        return "contrarian-or-warning";
    }
    if NUMBER_RE.is_match(&head) {
        return "result-or-list";
    }
    "statement"
}

pub fn detect_structure(lines: &[String]) -> StructureStats {
    StructureStats {
        line_count: lines.len(),
        list_like_lines: lines.iter().filter(|l| LIST_LINE_RE.is_match(l)).count(),
        density: if lines.len() >= 8 { "high" } else { "low" }.to_string(),
    }
}

pub fn render_viral_report(report: &ViralReport) -> String {
    let mut lines: Vec<String> = vec![
        format!("# Viral Structure Report {}", report.target_status_id),
        String::new(),
        format!("- url: {}", report.url),
        format!("- author: {}", report.author),
        format!("- timestamp: {}", report.timestamp),
        String::new(),
        "## Hook".to_string(),
        format!("- type: {}", report.hook_type),
        format!("- first_140: {}", report.first_140),
        String::new(),
        "## Structure".to_string(),
        format!("- line_count: {}", report.structure.line_count),
        format!("- list_like_lines: {}", report.structure.list_like_lines),
        format!("- density: {}", report.structure.density),
        String::new(),
        "## Outline Guess".to_string(),
    ];
    lines.extend(report.outline_guess.iter().map(|o| format!("- {o}")));
    lines.push(String::new());
    lines.push("## CTA Guess".to_string());
    lines.push(format!("- {}", report.cta_guess));
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{LongArticle, PostSnapshot};

    #[test]
    fn hook_types_follow_priority() {
        assert_eq!(infer_hook(""), "unknown");
        assert_eq!(infer_hook("为什么没人说这个？"), "question");
        assert_eq!(infer_hook("别再这样部署了"), "contrarian-or-warning");
        assert_eq!(infer_hook("I shipped 3 apps"), "result-or-list");
        assert_eq!(infer_hook("A calm statement"), "statement");
    }

    #[test]
    fn list_lines_are_counted() {
        let lines = non_empty_lines("Intro\n1. one\n- two\n\n* three\nplain");
        let stats = detect_structure(&lines);
        assert_eq!(stats.line_count, 5);
        assert_eq!(stats.list_like_lines, 3);
        assert_eq!(stats.density, "low");
    }

    #[test]
    fn empty_post_falls_back_to_article_text() {
        let record = CaptureRecord {
            main: PostSnapshot::default(),
            articles: vec![LongArticle {
                text: "欢迎评论区补充".into(),
                ..LongArticle::pending("u")
            }],
            ..CaptureRecord::default()
        };
        let report = ViralReport::from_record(&record);
        assert_eq!(report.cta_guess, "comment");
        assert_eq!(report.outline_guess, vec!["欢迎评论区补充"]);
        assert!(render_viral_report(&report).contains("## CTA Guess\n- comment"));
    }
}
