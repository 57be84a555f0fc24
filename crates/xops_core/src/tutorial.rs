//! Turns a captured tutorial post into an ordered action plan.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::capture::CaptureRecord;
use crate::learning::{split_sentences, NUMBER_RE};

pub const MAX_STEPS: usize = 12;
const MIN_STEP_CHARS: usize = 6;

const STEP_HINTS: &[&str] = &[
    "step", "first", "then", "next", "finally", "install", "setup", "configure", "run", "start",
    "validate", "debug", "fix", "error", "第一", "第二", "然后", "最后", "安装", "配置", "运行",
    "启动", "验证", "排查",
];

static COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(`[^`]+`|(pip|python|python3|npm|pnpm|yarn|uv|git|docker|docker-compose|go|cargo|apt|brew|chmod|bash|sh)\s+[^\n]+)",
    )
    .expect("command regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TutorialPlan {
    pub steps: Vec<String>,
    pub commands: Vec<String>,
}

impl TutorialPlan {
    pub fn from_record(record: &CaptureRecord) -> Self {
        let texts = record.post_texts();
        Self {
            steps: extract_steps(&texts, MAX_STEPS),
            commands: extract_commands(&texts),
        }
    }
}

/// Shell-looking commands and inline code spans, deduplicated in order.
pub fn extract_commands(texts: &[&str]) -> Vec<String> {
    let mut seen = HashSet::new();
    texts
        .iter()
        .flat_map(|t| COMMAND_RE.captures_iter(t))
        .map(|caps| caps[1].trim_matches('`').trim().to_string())
        .filter(|cmd| !cmd.is_empty() && seen.insert(cmd.clone()))
        .collect()
}

pub fn extract_steps(texts: &[&str], limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut scored: Vec<(u32, String)> = texts
        .iter()
        .flat_map(|t| split_sentences(t, MIN_STEP_CHARS))
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(|s| (score_step(&s), s))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let selected: Vec<String> = scored
        .iter()
        .filter(|(score, _)| *score > 0)
        .take(limit)
        .map(|(_, s)| s.clone())
        .collect();
    if selected.is_empty() {
        return scored.into_iter().take(limit).map(|(_, s)| s).collect();
    }
    selected
}

fn score_step(sentence: &str) -> u32 {
    let lower = sentence.to_lowercase();
    let mut score = STEP_HINTS.iter().filter(|h| lower.contains(*h)).count() as u32;
    if NUMBER_RE.is_match(sentence) {
        score += 1;
    }
    if (20..=180).contains(&sentence.chars().count()) {
        score += 1;
    }
    score
}

pub fn render_tutorial_plan(record: &CaptureRecord, plan: &TutorialPlan) -> String {
    let mut lines: Vec<String> = vec![
        format!("# Tutorial Action Plan {}", record.target_status_id),
        String::new(),
        format!("- source_url: {}", record.url),
        format!("- author: {}", record.main.author),
        format!("- timestamp: {}", record.main.timestamp),
        String::new(),
        "## Plan Steps".to_string(),
    ];
    if plan.steps.is_empty() {
        lines.push("1. No clear steps extracted. Review source manually.".to_string());
    } else {
        lines.extend(
            plan.steps
                .iter()
                .enumerate()
                .map(|(i, s)| format!("{}. {s}", i + 1)),
        );
    }
    lines.push(String::new());

    lines.push("## Candidate Commands".to_string());
    if plan.commands.is_empty() {
        lines.push("- No explicit commands found in source text.".to_string());
    } else {
        lines.extend(plan.commands.iter().map(|c| format!("- `{c}`")));
    }
    lines.push(String::new());

    lines.extend(
        [
            "## Execution Contract",
            "- Confirm environment and target directory before running commands.",
            "- Run one step at a time and verify output.",
            "- Stop on first failure unless user asks to continue.",
            "",
        ]
        .map(str::to_string),
    );
    lines.join("\n")
}
