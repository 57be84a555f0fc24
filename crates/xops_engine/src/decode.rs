use std::sync::LazyLock;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use regex::bytes::Regex;

/// Bytes scanned for a `<meta charset>` declaration.
const META_PRESCAN_BYTES: usize = 1024;

static META_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?\s*([A-Za-z0-9_\-:.]+)"#)
        .expect("meta charset regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPage {
    pub text: String,
    pub encoding_label: String,
    /// Malformed sequences were replaced with U+FFFD.
    pub lossy: bool,
}

/// Decodes a fetched page into UTF-8, choosing the encoding from the BOM,
/// then the Content-Type charset, then a `<meta charset>` near the top of the
/// document, then chardetng's guess.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> DecodedPage {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    let declared = content_type
        .and_then(header_charset)
        .or_else(|| meta_charset(bytes))
        .and_then(|label| Encoding::for_label(label.as_bytes()));
    if let Some(encoding) = declared {
        return decode_with(bytes, encoding);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

fn header_charset(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}

fn meta_charset(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(META_PRESCAN_BYTES)];
    META_CHARSET_RE
        .captures(head)
        .and_then(|caps| std::str::from_utf8(&caps[1]).ok().map(str::to_string))
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> DecodedPage {
    let (text, used, lossy) = encoding.decode(bytes);
    DecodedPage {
        text: text.into_owned(),
        encoding_label: used.name().to_string(),
        lossy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_charset_wins_over_detection() {
        let bytes = b"<html><title>caf\xe9</title></html>";
        let page = decode_page(bytes, Some("text/html; Charset=\"ISO-8859-1\""));
        assert_eq!(page.encoding_label, "windows-1252");
        assert!(page.text.contains("café"));
        assert!(!page.lossy);
    }

    #[test]
    fn meta_charset_is_used_without_header() {
        let mut bytes = b"<html><head><meta charset=\"gbk\"></head><body>".to_vec();
        bytes.extend_from_slice(&[0xc4, 0xe3, 0xba, 0xc3]);
        let page = decode_page(&bytes, Some("text/html"));
        assert_eq!(page.encoding_label, "GBK");
        assert!(page.text.contains("你好"));
    }

    #[test]
    fn utf8_bom_is_honoured() {
        let page = decode_page("\u{feff}<p>hé</p>".as_bytes(), None);
        assert_eq!(page.encoding_label, "UTF-8");
        assert!(page.text.contains("hé"));
    }
}
