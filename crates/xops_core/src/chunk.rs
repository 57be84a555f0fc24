/// Character budget of one synced paragraph block.
pub const DEFAULT_CHUNK_CHARS: usize = 1800;

/// Splits `text` into chunks of at most `max_chars` characters.
///
/// Lines are packed greedily and a new chunk is started rather than
/// splitting a line. A single line longer than the budget is cut at
/// character boundaries; its pieces are consecutive chunks that join without
/// a separator. All other chunks join with `\n`. Only `\n` separates lines,
/// so trailing newlines and `\r` survive the rejoin.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let max_chars = max_chars.max(1);
    let mut chunks: Vec<String> = Vec::new();
    let mut buf: Vec<&str> = Vec::new();
    // Characters in `buf` including one newline per line.
    let mut size = 0usize;

    for line in text.split('\n') {
        let len = line.chars().count();
        if len > max_chars {
            if !buf.is_empty() {
                chunks.push(buf.join("\n"));
                buf.clear();
                size = 0;
            }
            chunks.extend(split_long_line(line, max_chars));
            continue;
        }

        let add = len + 1;
        if size + add > max_chars + 1 && !buf.is_empty() {
            chunks.push(buf.join("\n"));
            buf.clear();
            size = 0;
        }
        buf.push(line);
        size += add;
    }
    if !buf.is_empty() {
        chunks.push(buf.join("\n"));
    }
    chunks
}

fn split_long_line(line: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    chars
        .chunks(max_chars)
        .map(|piece| piece.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_text_is_single_chunk() {
        assert_eq!(chunk_text("a\nb", 10), vec!["a\nb".to_string()]);
        assert!(chunk_text("", 10).is_empty());
    }

    #[test]
    fn chunks_never_exceed_cap_and_rejoin_to_original() {
        let text = (0..300)
            .map(|i| format!("line {i} {}", "x".repeat(i % 37)))
            .collect::<Vec<_>>()
            .join("\n");
        for cap in [60, 100, DEFAULT_CHUNK_CHARS] {
            let chunks = chunk_text(&text, cap);
            assert!(chunks.iter().all(|c| c.chars().count() <= cap));
            assert_eq!(chunks.join("\n"), text);
        }

        for text in ["a\n", "a\n\n", "a\r\nb", "\nlead", "x\r\n\r\n"] {
            assert_eq!(chunk_text(text, DEFAULT_CHUNK_CHARS).join("\n"), text);
            assert_eq!(chunk_text(text, 4).join("\n"), text);
        }
    }

    #[test]
    fn line_exactly_at_cap_fits_alone() {
        let line = "y".repeat(10);
        let text = format!("ab\n{line}\ncd");
        let chunks = chunk_text(&text, 10);
        assert_eq!(chunks, vec!["ab".to_string(), line, "cd".to_string()]);
    }

    #[test]
    fn overlong_line_is_cut_at_char_boundaries() {
        let line = "配".repeat(25);
        let chunks = chunk_text(&format!("head\n{line}\ntail"), 10);
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks[0], "head");
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks[1..4].concat(), line);
        assert_eq!(chunks[4], "tail");
    }
}
