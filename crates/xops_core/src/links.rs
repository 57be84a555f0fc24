use std::sync::LazyLock;

use regex::Regex;
use url::Url;

pub const SITE_ORIGIN: &str = "https://x.com";

static STATUS_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/status/(\d+)").expect("status id regex"));
static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([A-Za-z0-9_]{1,15})").expect("handle regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static MEDIA_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"name=[^&]+").expect("media name regex"));
static GITHUB_REPO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://github.com/([^/]+/[^/]+)").expect("github repo regex")
});

/// First `/status/<digits>` id in a url or path.
pub fn extract_status_id(url_or_path: &str) -> Option<String> {
    STATUS_ID_RE
        .captures(url_or_path)
        .map(|caps| caps[1].to_string())
}

/// First `@handle` in a user-name block, lowercased.
pub fn extract_handle(user_text: &str) -> Option<String> {
    HANDLE_RE
        .captures(user_text)
        .map(|caps| caps[1].to_ascii_lowercase())
}

/// Collapses whitespace runs into single spaces and trims.
pub fn clean_text(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// Truncates to `limit` characters, ending with `…` when shortened.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Makes a site-relative status path absolute.
pub fn absolute_status_url(path: &str) -> String {
    if path.is_empty() || path.starts_with("http") {
        path.to_string()
    } else {
        format!("{SITE_ORIGIN}{path}")
    }
}

/// Canonical long-form article url: absolute, no query, no `/media/...` tail.
pub fn normalize_article_url(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let mut url = if href.starts_with('/') {
        format!("{SITE_ORIGIN}{href}")
    } else {
        href.to_string()
    };
    if let Some((base, _)) = url.split_once('?') {
        url = base.to_string();
    }
    if url.contains("/article/") {
        if let Some((base, _)) = url.split_once("/media/") {
            url = base.to_string();
        }
    }
    Some(url)
}

/// Requests the original resolution for media urls carrying a `format`
/// query parameter.
pub fn normalize_media_url(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    let has_format = Url::parse(raw)
        .ok()
        .map(|u| {
            u.query_pairs()
                .any(|(k, v)| k == "format" && !v.is_empty())
        })
        .unwrap_or(false);
    if has_format && raw.contains("name=") {
        return Some(MEDIA_NAME_RE.replace_all(raw, "name=orig").into_owned());
    }
    Some(raw.to_string())
}

/// File extension for a media url, taken from its `format` query parameter.
pub fn media_extension(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "format")
                .map(|(_, v)| v.into_owned())
        })
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "jpg".to_string())
}

pub fn is_platform_media(url: &str) -> bool {
    url.contains("pbs.twimg.com/media/") || url.contains("pbs.twimg.com/ext_tw_video_thumb/")
}

/// `owner/name` for a GitHub repository url.
pub fn infer_github_repo(url: &str) -> Option<String> {
    GITHUB_REPO_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
}
