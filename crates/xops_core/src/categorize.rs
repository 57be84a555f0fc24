use crate::links::{clean_text, truncate_chars};

pub const UNCATEGORIZED: &str = "uncategorized";
pub const SUMMARY_LIMIT: usize = 120;

/// Keyword rules in priority order; the first category with a matching
/// keyword wins.
pub const CATEGORY_RULES: &[(&str, &[&str])] = &[
    (
        "install-debug",
        &["安装", "配置", "报错", "debug", "error", "setup", "deploy", "运行", "启动"],
    ),
    (
        "architecture-principles",
        &["原理", "架构", "architecture", "protocol", "cdp", "机制", "design"],
    ),
    (
        "security-risk",
        &["安全", "漏洞", "risk", "风控", "暴露", "认证", "权限", "攻击"],
    ),
    (
        "growth-content",
        &["爆款", "内容", "运营", "流量", "选题", "结构", "转化", "自媒体"],
    ),
    (
        "tools-release",
        &["发布", "更新", "release", "new", "模型", "功能", "版本"],
    ),
];

/// All category names in report order, `uncategorized` last.
pub fn category_names() -> impl Iterator<Item = &'static str> {
    CATEGORY_RULES
        .iter()
        .map(|(name, _)| *name)
        .chain(std::iter::once(UNCATEGORIZED))
}

pub fn categorize(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(&k.to_lowercase())))
        .map(|(name, _)| *name)
        .unwrap_or(UNCATEGORIZED)
}

/// One-line summary: whitespace collapsed, at most [`SUMMARY_LIMIT`] chars.
pub fn summarize(text: &str) -> String {
    summarize_with_limit(text, SUMMARY_LIMIT)
}

pub fn summarize_with_limit(text: &str, limit: usize) -> String {
    truncate_chars(&clean_text(text), limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_keywords_win_over_later_rules() {
        assert_eq!(categorize("step 1: 安装\nstep 2: 配置\n"), "install-debug");
        assert_eq!(categorize("新版本发布 with a new DEBUG mode"), "install-debug");
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(categorize("Protocol internals"), "architecture-principles");
        assert_eq!(categorize("nothing relevant here"), UNCATEGORIZED);
    }

    #[test]
    fn short_text_summary_is_only_whitespace_collapsed() {
        assert_eq!(summarize("step 1: 安装\nstep 2: 配置\n"), "step 1: 安装 step 2: 配置");
    }

    #[test]
    fn long_summary_is_truncated_with_ellipsis() {
        let text = "字".repeat(200);
        let summary = summarize(&text);
        assert_eq!(summary.chars().count(), SUMMARY_LIMIT);
        assert!(summary.ends_with('…'));
    }

    #[test]
    fn category_names_end_with_uncategorized() {
        let names: Vec<_> = category_names().collect();
        assert_eq!(names.len(), 6);
        assert_eq!(names.last(), Some(&UNCATEGORIZED));
    }
}
