//! Markdown renderings of capture records and batch notes.

use serde::Serialize;

use crate::capture::{CaptureRecord, PostSnapshot};
use crate::categorize::category_names;
use crate::learning::handle_line;

pub fn render_capture_markdown(record: &CaptureRecord) -> String {
    let main = &record.main;
    let mut lines: Vec<String> = vec![
        format!("# X Capture {}", record.target_status_id),
        String::new(),
        format!("- url: {}", record.url),
        format!("- captured_at: {}", record.captured_at),
        String::new(),
        "## Main Post".to_string(),
    ];
    push_post_meta(&mut lines, main);
    lines.push(format!("- article_link_count: {}", main.article_urls.len()));
    lines.push(String::new());
    lines.push(main.text.clone());
    if !main.article_urls.is_empty() {
        lines.push(String::new());
        lines.push("article_links:".to_string());
        lines.extend(main.article_urls.iter().map(|u| format!("- {u}")));
    }
    push_media(&mut lines, &main.media_urls, "main");
    lines.push(String::new());

    lines.push("## Thread".to_string());
    if record.thread.is_empty() {
        lines.push("- none".to_string());
    }
    for (idx, post) in record.thread.iter().enumerate() {
        let n = idx + 1;
        lines.push(String::new());
        lines.push(format!("### {n}"));
        push_post_meta(&mut lines, post);
        lines.push(String::new());
        lines.push(post.text.clone());
        push_media(&mut lines, &post.media_urls, &format!("thread_{n}"));
    }

    lines.push(String::new());
    lines.push("## Long Article".to_string());
    if record.articles.is_empty() {
        lines.push("- none".to_string());
    }
    for (idx, article) in record.articles.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("### {}", idx + 1));
        lines.push(format!("- url: {}", article.url));
        lines.push(format!("- final_url: {}", article.final_url));
        lines.push(format!("- status: {}", article.status.as_str()));
        lines.push(format!("- title: {}", article.title));
        lines.push(String::new());
        lines.push(article.text.clone());
    }
    lines.push(String::new());
    lines.join("\n")
}

fn push_post_meta(lines: &mut Vec<String>, post: &PostSnapshot) {
    lines.push(format!("- author: {}", post.author));
    lines.push(handle_line(&post.author_handle));
    lines.push(format!("- timestamp: {}", post.timestamp));
    lines.push(format!("- status_url: {}", post.status_url));
    lines.push(format!("- media_count: {}", post.media_urls.len()));
}

fn push_media(lines: &mut Vec<String>, media: &[String], prefix: &str) {
    if media.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push("media:".to_string());
    lines.extend(media.iter().map(|u| format!("- {u}")));
    lines.push(String::new());
    lines.push("media_preview:".to_string());
    lines.extend(
        media
            .iter()
            .enumerate()
            .map(|(i, u)| format!("![{prefix}_{}]({u})", i + 1)),
    );
}

/// One categorized link in a batch note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchEntry {
    pub status_id: String,
    pub url: String,
    pub author: String,
    pub summary: String,
    pub category: String,
}

/// Entries grouped per category, in category rule order; empty groups kept.
pub fn group_by_category(entries: &[BatchEntry]) -> Vec<(&'static str, Vec<&BatchEntry>)> {
    category_names()
        .map(|name| {
            let members = entries.iter().filter(|e| e.category == name).collect();
            (name, members)
        })
        .collect()
}

pub fn render_batch_note(
    entries: &[BatchEntry],
    total_links: usize,
    name: &str,
    generated_at: &str,
) -> String {
    let mut lines: Vec<String> = vec![
        format!("# X Batch Learning Note {name}"),
        String::new(),
        format!("- total_links: {total_links}"),
        format!("- generated_at: {generated_at}"),
        String::new(),
    ];

    for (category, members) in group_by_category(entries) {
        if members.is_empty() {
            continue;
        }
        lines.push(format!("## {category} ({})", members.len()));
        lines.push(String::new());
        for entry in members {
            lines.push(format!("### {}", entry.status_id));
            lines.push(format!("- url: {}", entry.url));
            lines.push(format!("- author: {}", entry.author));
            lines.push(format!("- summary: {}", entry.summary));
            lines.push(String::new());
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{ArticleStatus, LongArticle};

    fn entry(id: &str, category: &str) -> BatchEntry {
        BatchEntry {
            status_id: id.into(),
            url: format!("https://x.com/a/status/{id}"),
            author: "A".into(),
            summary: "s".into(),
            category: category.into(),
        }
    }

    #[test]
    fn batch_note_lists_only_non_empty_groups_in_rule_order() {
        let entries = vec![
            entry("2", "uncategorized"),
            entry("1", "security-risk"),
            entry("3", "security-risk"),
        ];
        let note = render_batch_note(&entries, 4, "b1", "2024-01-01T00:00:00");
        let security = note.find("## security-risk (2)").unwrap();
        let uncategorized = note.find("## uncategorized (1)").unwrap();
        assert!(security < uncategorized);
        assert!(!note.contains("install-debug"));
        assert!(note.contains("- total_links: 4"));
    }

    #[test]
    fn capture_markdown_marks_missing_sections() {
        let record = CaptureRecord {
            target_status_id: "5".into(),
            main: PostSnapshot {
                text: "body".into(),
                media_urls: vec!["https://pbs.twimg.com/media/a".into()],
                ..PostSnapshot::default()
            },
            ..CaptureRecord::default()
        };
        let md = render_capture_markdown(&record);
        assert!(md.starts_with("# X Capture 5\n"));
        assert!(md.contains("![main_1](https://pbs.twimg.com/media/a)"));
        assert!(md.contains("## Thread\n- none"));
        assert!(md.contains("## Long Article\n- none"));
    }

    #[test]
    fn capture_markdown_lists_articles() {
        let record = CaptureRecord {
            articles: vec![LongArticle {
                status: ArticleStatus::Ok,
                text: "article body".into(),
                ..LongArticle::pending("https://x.com/i/article/1")
            }],
            ..CaptureRecord::default()
        };
        let md = render_capture_markdown(&record);
        assert!(md.contains("- status: ok"));
        assert!(md.contains("article body"));
    }
}
