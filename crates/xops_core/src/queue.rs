//! Line-oriented queue file format.
//!
//! ```text
//! # X Queue - 2024-05-01
//!
//! ## Item 003 [pending]
//! type: github_trending
//! lang: zh
//! source: https://example.com
//! note: some note
//! text:
//! line 1 of body
//! line 2 of body
//! ```
//!
//! The blank line that [`render_queue`] writes in front of every item marker
//! is a separator and is dropped again by [`parse_queue`], so
//! `parse_queue(render_queue(h, items)) == (h, items)` for a non-empty header
//! and bodies without a line starting with `## Item `.

use serde::Serialize;

pub const ITEM_MARKER: &str = "## Item ";
pub const DEFAULT_HEADER: &str = "# X Queue";
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_DRAFTED: &str = "drafted";
pub const STATUS_POSTED: &str = "posted";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueItem {
    pub item_id: u32,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub lang: String,
    pub source: String,
    pub note: String,
    pub text: String,
}

impl QueueItem {
    pub fn new(item_id: u32, kind: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            item_id,
            status: STATUS_PENDING.to_string(),
            kind: kind.into(),
            lang: lang.into(),
            source: String::new(),
            note: String::new(),
            text: String::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == STATUS_PENDING
    }

    pub fn label(&self) -> String {
        format!("Item {:03}", self.item_id)
    }

    fn marker_line(&self) -> String {
        format!("{ITEM_MARKER}{:03} [{}]", self.item_id, self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("line {line_no}: invalid item id in {line:?}")]
    InvalidItemId { line_no: usize, line: String },
}

struct OpenItem {
    item: QueueItem,
    in_text: bool,
    body: Vec<String>,
}

impl OpenItem {
    /// `before_marker` is true when the item is closed by the next marker
    /// rather than by end of input; the separator blank line is dropped then.
    fn finish(mut self, before_marker: bool) -> QueueItem {
        if before_marker && self.body.last().is_some_and(|l| l.is_empty()) {
            self.body.pop();
        }
        self.item.text = self.body.join("\n");
        self.item
    }
}

/// Parses a queue file into its header lines and items.
///
/// Unknown `key: value` lines inside an item are ignored. A marker whose id
/// token is missing or not an integer aborts the whole parse.
pub fn parse_queue(content: &str) -> Result<(Vec<String>, Vec<QueueItem>), QueueError> {
    let mut header: Vec<String> = Vec::new();
    let mut items: Vec<QueueItem> = Vec::new();
    let mut current: Option<OpenItem> = None;

    // Only `\n` ends a line; a `\r` before it belongs to the line.
    let mut lines: Vec<&str> = content.split('\n').collect();
    if content.is_empty() || content.ends_with('\n') {
        lines.pop();
    }

    for (idx, line) in lines.into_iter().enumerate() {
        if line.starts_with(ITEM_MARKER) {
            match current.take() {
                Some(open) => items.push(open.finish(true)),
                None => {
                    if header.last().is_some_and(|l| l.is_empty()) {
                        header.pop();
                    }
                }
            }
            current = Some(OpenItem {
                item: parse_marker(idx + 1, line)?,
                in_text: false,
                body: Vec::new(),
            });
            continue;
        }

        let Some(open) = current.as_mut() else {
            header.push(line.to_string());
            continue;
        };

        if open.in_text {
            open.body.push(line.to_string());
            continue;
        }

        if line.starts_with("text:") {
            open.in_text = true;
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            let value = value.trim().to_string();
            match key.trim() {
                "type" => open.item.kind = value,
                "lang" => open.item.lang = value,
                "source" => open.item.source = value,
                "note" => open.item.note = value,
                _ => {}
            }
        }
    }

    if let Some(open) = current {
        items.push(open.finish(false));
    }
    Ok((header, items))
}

fn parse_marker(line_no: usize, line: &str) -> Result<QueueItem, QueueError> {
    let invalid = || QueueError::InvalidItemId {
        line_no,
        line: line.to_string(),
    };
    let item_id = line
        .split_whitespace()
        .nth(2)
        .ok_or_else(invalid)?
        .parse::<u32>()
        .map_err(|_| invalid())?;

    let status = match (line.find('['), line.find(']')) {
        (Some(open), Some(close)) if close > open => line[open + 1..close].trim().to_string(),
        (Some(_), Some(_)) => String::new(),
        _ => STATUS_PENDING.to_string(),
    };

    Ok(QueueItem {
        item_id,
        status,
        kind: String::new(),
        lang: String::new(),
        source: String::new(),
        note: String::new(),
        text: String::new(),
    })
}

/// Renders header and items back into the queue file format.
pub fn render_queue(header: &[String], items: &[QueueItem]) -> String {
    let mut out: Vec<String> = Vec::new();
    if header.is_empty() {
        out.push(DEFAULT_HEADER.to_string());
    } else {
        out.extend(header.iter().cloned());
    }

    for item in items {
        out.push(String::new());
        out.push(item.marker_line());
        out.push(format!("type: {}", item.kind));
        out.push(format!("lang: {}", item.lang));
        out.push(format!("source: {}", item.source));
        out.push(format!("note: {}", item.note));
        out.push("text:".to_string());
        if !item.text.is_empty() {
            out.extend(item.text.split('\n').map(str::to_string));
        }
    }
    out.push(String::new());
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(id: u32, status: &str, text: &str) -> QueueItem {
        QueueItem {
            item_id: id,
            status: status.to_string(),
            kind: "github_trending".to_string(),
            lang: "zh".to_string(),
            source: "https://example.com".to_string(),
            note: "some note".to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn marker_with_brackets_sets_id_and_status() {
        let (_, items) = parse_queue("## Item 007 [drafted]\n").unwrap();
        assert_eq!(items[0].item_id, 7);
        assert_eq!(items[0].status, "drafted");
    }

    #[test]
    fn marker_without_brackets_defaults_to_pending() {
        let (_, items) = parse_queue("## Item 12\ntype: x\n").unwrap();
        assert_eq!(items[0].item_id, 12);
        assert_eq!(items[0].status, "pending");
        assert_eq!(items[0].kind, "x");
    }

    #[test]
    fn non_integer_id_aborts_parse() {
        let err = parse_queue("# head\n## Item abc [pending]\n").unwrap_err();
        assert_eq!(
            err,
            QueueError::InvalidItemId {
                line_no: 2,
                line: "## Item abc [pending]".to_string()
            }
        );
        assert!(parse_queue("## Item \n").is_err());
    }

    #[test]
    fn text_block_runs_to_next_marker_including_inner_blank_lines() {
        let content = "# h\n\n## Item 001 [pending]\ntext:\none\n\n\ntwo\n\n## Item 002 [posted]\ntext:\nlast\n";
        let (header, items) = parse_queue(content).unwrap();
        assert_eq!(header, vec!["# h".to_string()]);
        assert_eq!(items[0].text, "one\n\n\ntwo");
        assert_eq!(items[1].text, "last");
    }

    #[test]
    fn text_block_runs_to_end_of_file() {
        let content = "## Item 001 [pending]\ntext:\na\ntype: not a key here\n\n";
        let (_, items) = parse_queue(content).unwrap();
        assert_eq!(items[0].text, "a\ntype: not a key here\n");
        assert_eq!(items[0].kind, "");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let content = "## Item 001 [pending]\nlang: en\npriority: high\nrandom line\ntext:\nbody\n";
        let (_, items) = parse_queue(content).unwrap();
        assert_eq!(items[0].lang, "en");
        assert_eq!(items[0].text, "body");
    }

    #[test]
    fn render_matches_documented_layout() {
        let header = vec!["# X Queue - 2024-05-01".to_string()];
        let rendered = render_queue(&header, &[item(3, "pending", "line 1\nline 2")]);
        assert_eq!(
            rendered,
            "# X Queue - 2024-05-01\n\n## Item 003 [pending]\ntype: github_trending\nlang: zh\nsource: https://example.com\nnote: some note\ntext:\nline 1\nline 2\n"
        );
    }

    #[test]
    fn empty_header_renders_default() {
        let rendered = render_queue(&[], &[]);
        assert_eq!(rendered, "# X Queue\n");
    }

    #[test]
    fn round_trip_preserves_header_and_items() {
        let header = vec![
            "# X Queue - 2024-05-01".to_string(),
            "timezone: Asia/Shanghai".to_string(),
            String::new(),
            "posts_per_day: 15".to_string(),
            "saved on windows\r".to_string(),
        ];
        let items = vec![
            item(1, "pending", "first\n\nwith gap"),
            item(2, "drafted", ""),
            item(3, "posted", "\nleading blank and trailing\n"),
            item(4, "pending", "text: looks like a key\nlast"),
            item(5, "pending", "ends with blank\n"),
            item(6, "pending", "line\r\nnext\r"),
            item(7, "pending", "crlf end\r\n"),
        ];
        let rendered = render_queue(&header, &items);
        let (parsed_header, parsed_items) = parse_queue(&rendered).unwrap();
        assert_eq!(parsed_header, header);
        assert_eq!(parsed_items, items);

        // Re-rendering is stable across repeated runs.
        assert_eq!(render_queue(&parsed_header, &parsed_items), rendered);
    }
}
