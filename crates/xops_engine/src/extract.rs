//! DOM extraction over page-source snapshots.
//!
//! The feed is virtualized, so every lookup works on a fresh snapshot of the
//! page source rather than on live element handles.

use std::collections::HashSet;

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};
use serde_json::Value;
use xops_core::{
    absolute_status_url, clean_text, extract_handle, extract_status_id, is_platform_media,
    normalize_article_url, normalize_media_url, ArticleStatus, LongArticle, PostSnapshot,
};

pub const FEED_ARTICLE_SELECTOR: &str = "main article";
/// Shortest text accepted as a long article body.
pub const MIN_ARTICLE_CHARS: usize = 20;

const POST_TEXT_LIMIT: usize = 600;
const ARTICLE_TEXT_LIMIT: usize = 500;
const JSON_LD_LIMIT: usize = 30;

const POST_TEXT_SELECTORS: &[&str] = &[
    "[data-testid=\"tweetText\"]",
    "[class*='longform-header-one']",
    "[class*='longform-header-two']",
    "[class*='longform-unstyled']",
    "[class*='longform-blockquote']",
    "[class*='longform-unordered-list-item']",
    "[class*='longform-ordered-list-item']",
    "div[data-contents='true'] [data-block='true']",
];

const ARTICLE_TEXT_SELECTORS: &[&str] = &[
    "div[class*='longform-header-one']",
    "div[class*='longform-header-two']",
    "div[class*='longform-unstyled']",
    "div[class*='longform-blockquote']",
    "div[class*='longform-unordered-list-item']",
    "div[class*='longform-ordered-list-item']",
    ".public-DraftStyleDefault-block",
    "div[data-contents='true'] div[data-block='true']",
    "article p",
    "article div[dir='auto']",
    "main article div[dir='auto']",
    "main p",
];

/// (selector, attribute holding the url)
const MEDIA_SELECTORS: &[(&str, &str)] = &[
    ("a[href*=\"/photo/\"] img[src]", "src"),
    ("div[data-testid=\"tweetPhoto\"] img[src]", "src"),
    ("video[poster]", "poster"),
];

const LOGIN_CHROME: &[&str] = &["Log in", "Sign up", "Sign in", "Sign up for X"];
const JSON_LD_TEXT_KEYS: &[&str] = &["articleBody", "description", "text"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLink {
    pub status_id: String,
    pub href: String,
}

/// One `main article` node of a feed snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedArticle {
    /// Link wrapping the node's first `<time>`.
    pub permalink: Option<StatusLink>,
    /// Every distinct status link inside the node, in document order.
    pub status_links: Vec<StatusLink>,
    pub post: PostSnapshot,
}

impl FeedArticle {
    pub fn permalink_id(&self) -> Option<&str> {
        self.permalink.as_ref().map(|link| link.status_id.as_str())
    }

    pub fn links_to(&self, status_id: &str) -> bool {
        self.status_links.iter().any(|link| link.status_id == status_id)
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Every feed article in document order.
pub fn snapshot_feed(html: &str) -> Vec<FeedArticle> {
    let doc = Html::parse_document(html);
    let Some(articles) = selector(FEED_ARTICLE_SELECTOR) else {
        return Vec::new();
    };
    doc.select(&articles).map(extract_feed_article).collect()
}

fn extract_feed_article(article: ElementRef<'_>) -> FeedArticle {
    let permalink = time_permalink(article);
    let status_links = status_links(article);

    let text = collect_unique_texts(article, POST_TEXT_SELECTORS, POST_TEXT_LIMIT, |_| true)
        .join("\n")
        .trim()
        .to_string();

    let author = selector("div[data-testid=\"User-Name\"]")
        .and_then(|sel| article.select(&sel).next())
        .map(element_text)
        .unwrap_or_default();
    let author_handle = extract_handle(&author).unwrap_or_default();

    let timestamp = selector("time")
        .and_then(|sel| article.select(&sel).next())
        .and_then(|time| time.value().attr("datetime"))
        .unwrap_or_default()
        .to_string();

    let primary = permalink.clone().or_else(|| status_links.first().cloned());
    let (status_id, status_url) = primary
        .map(|link| (link.status_id, absolute_status_url(&link.href)))
        .unwrap_or_default();

    FeedArticle {
        post: PostSnapshot {
            status_id,
            status_url,
            author,
            author_handle,
            timestamp,
            text,
            media_urls: media_urls(article),
            article_urls: article_links(article),
        },
        permalink,
        status_links,
    }
}

/// Status link of the nearest `<a>` enclosing the first `<time>`.
fn time_permalink(article: ElementRef<'_>) -> Option<StatusLink> {
    let time = article.select(&selector("time")?).next()?;
    let anchor = nearest_anchor(*time)?;
    let href = anchor.value().attr("href")?;
    let status_id = extract_status_id(href)?;
    Some(StatusLink {
        status_id,
        href: href.to_string(),
    })
}

fn nearest_anchor(node: NodeRef<'_, Node>) -> Option<ElementRef<'_>> {
    node.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "a")
}

fn status_links(article: ElementRef<'_>) -> Vec<StatusLink> {
    let Some(sel) = selector("a[href*=\"/status/\"]") else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    article
        .select(&sel)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let status_id = extract_status_id(href)?;
            seen.insert(format!("{status_id}:{href}")).then(|| StatusLink {
                status_id,
                href: href.to_string(),
            })
        })
        .collect()
}

fn media_urls(article: ElementRef<'_>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut media = Vec::new();
    for (css, attr) in MEDIA_SELECTORS {
        let Some(sel) = selector(css) else { continue };
        for node in article.select(&sel) {
            let Some(url) = node.value().attr(attr).and_then(normalize_media_url) else {
                continue;
            };
            if is_platform_media(&url) && seen.insert(url.clone()) {
                media.push(url);
            }
        }
    }
    media
}

fn article_links(article: ElementRef<'_>) -> Vec<String> {
    let Some(sel) = selector("a[href*=\"/article/\"]") else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    article
        .select(&sel)
        .filter_map(|a| a.value().attr("href").and_then(normalize_article_url))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

fn collect_unique_texts<F>(root: ElementRef<'_>, selectors: &[&str], per_selector: usize, keep: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    let mut seen = HashSet::new();
    let mut parts = Vec::new();
    for css in selectors {
        let Some(sel) = selector(css) else { continue };
        for node in root.select(&sel).take(per_selector) {
            let text = element_text(node);
            if text.is_empty() || !keep(text.as_str()) {
                continue;
            }
            if seen.insert(text.clone()) {
                parts.push(text);
            }
        }
    }
    parts
}

/// Posts of a snapshot, first `max_articles` nodes only, deduplicated by
/// status id; nodes without an id survive only when they carry text.
pub fn collect_unique_posts(articles: Vec<FeedArticle>, max_articles: usize) -> Vec<PostSnapshot> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .take(max_articles)
        .map(|article| article.post)
        .filter(|post| {
            if post.status_id.is_empty() {
                !post.text.is_empty()
            } else {
                seen.insert(post.status_id.clone())
            }
        })
        .collect()
}

/// Title, text and status of a long-form article page.
///
/// `url` is the requested article url, `final_url` where the browser ended
/// up and `page_title` the document title reported by the driver.
pub fn extract_long_article(url: &str, final_url: &str, page_title: &str, html: &str) -> LongArticle {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    let mut title = clean_text(page_title);
    if let Some(h1) = selector("h1")
        .and_then(|sel| doc.select(&sel).next())
        .map(element_text)
        .filter(|t| !t.is_empty())
    {
        title = h1;
    }

    let mut text = collect_unique_texts(root, ARTICLE_TEXT_SELECTORS, ARTICLE_TEXT_LIMIT, |t| {
        !LOGIN_CHROME.contains(&t) && t.chars().count() >= 2
    })
    .join("\n")
    .trim()
    .to_string();
    if text.is_empty() {
        text = json_ld_text(&doc);
    }
    if text.is_empty() {
        text = og_description(&doc).unwrap_or_default();
    }

    let status = classify_article(&doc, final_url, &title, html, &text);
    LongArticle {
        url: url.to_string(),
        final_url: final_url.to_string(),
        status,
        title,
        text,
    }
}

fn classify_article(doc: &Html, final_url: &str, title: &str, html: &str, text: &str) -> ArticleStatus {
    if text.chars().count() >= MIN_ARTICLE_CHARS {
        return ArticleStatus::Ok;
    }
    if final_url.contains("/login") || final_url.contains("/i/flow/") {
        return ArticleStatus::LoginRequired;
    }
    let has = |css: &str| selector(css).is_some_and(|sel| doc.select(&sel).next().is_some());
    if has("a[href=\"/login\"]") || has("a[href*=\"/signup\"]") || html.to_lowercase().contains("log in") {
        return ArticleStatus::LoginRequired;
    }
    if title.to_lowercase() == "x" {
        return ArticleStatus::AccessLimited;
    }
    ArticleStatus::NoText
}

fn json_ld_text(doc: &Html) -> String {
    let Some(sel) = selector("script[type=\"application/ld+json\"]") else {
        return String::new();
    };
    let mut seen = HashSet::new();
    let mut parts = Vec::new();
    for script in doc.select(&sel).take(JSON_LD_LIMIT) {
        let raw = script.text().collect::<String>();
        let Ok(value) = serde_json::from_str::<Value>(raw.trim()) else {
            continue;
        };
        collect_json_ld(&value, &mut seen, &mut parts);
    }
    parts.join("\n")
}

fn collect_json_ld(value: &Value, seen: &mut HashSet<String>, parts: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match child {
                    Value::String(s) if JSON_LD_TEXT_KEYS.contains(&key.as_str()) => {
                        let text = clean_text(s);
                        if text.chars().count() >= MIN_ARTICLE_CHARS && seen.insert(text.clone()) {
                            parts.push(text);
                        }
                    }
                    Value::Object(_) | Value::Array(_) => collect_json_ld(child, seen, parts),
                    _ => {}
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_json_ld(item, seen, parts);
            }
        }
        _ => {}
    }
}

fn og_description(doc: &Html) -> Option<String> {
    let sel = selector("meta[property=\"og:description\"]")?;
    let content = doc.select(&sel).next()?.value().attr("content")?;
    let text = clean_text(content);
    (text.chars().count() >= MIN_ARTICLE_CHARS).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FEED: &str = r#"<html><body><main>
      <article>
        <div data-testid="User-Name"><span>Rust Dev</span> <span>@RustDev</span></div>
        <a href="/rustdev/status/100"><time datetime="2025-01-01T00:00:00.000Z">1h</time></a>
        <div data-testid="tweetText">step 1: 安装
        <span>tool</span></div>
        <div data-testid="tweetText">step 1: 安装 tool</div>
        <a href="/other/status/555">quoted</a>
        <div data-testid="tweetPhoto"><img src="https://pbs.twimg.com/media/A?format=jpg&amp;name=small"></div>
        <img src="https://abs.twimg.com/emoji.png">
        <a href="/rustdev/article/9/media/3?s=1">article</a>
      </article>
      <article>
        <div data-testid="User-Name">Other @other</div>
        <a href="/other/status/200"><span>see</span></a>
        <div data-testid="tweetText">reply</div>
      </article>
      <article><div>no id, no text</div></article>
    </main></body></html>"#;

    #[test]
    fn feed_articles_carry_permalink_and_post_fields() {
        let articles = snapshot_feed(FEED);
        assert_eq!(articles.len(), 3);

        let first = &articles[0];
        assert_eq!(first.permalink_id(), Some("100"));
        assert!(first.links_to("555"));
        let post = &first.post;
        assert_eq!(post.status_id, "100");
        assert_eq!(post.status_url, "https://x.com/rustdev/status/100");
        assert_eq!(post.author_handle, "rustdev");
        assert_eq!(post.timestamp, "2025-01-01T00:00:00.000Z");
        assert_eq!(post.text, "step 1: 安装 tool");
        assert_eq!(
            post.media_urls,
            vec!["https://pbs.twimg.com/media/A?format=jpg&name=orig"]
        );
        assert_eq!(post.article_urls, vec!["https://x.com/rustdev/article/9"]);

        let second = &articles[1];
        assert_eq!(second.permalink_id(), None);
        assert_eq!(second.post.status_id, "200");
    }

    #[test]
    fn unique_posts_drop_duplicates_and_empty_anonymous_nodes() {
        let mut articles = snapshot_feed(FEED);
        articles.push(articles[0].clone());
        let posts = collect_unique_posts(articles, 50);
        let ids: Vec<&str> = posts.iter().map(|p| p.status_id.as_str()).collect();
        assert_eq!(ids, vec!["100", "200"]);

        assert_eq!(collect_unique_posts(snapshot_feed(FEED), 1).len(), 1);
    }

    #[test]
    fn long_article_prefers_h1_and_longform_blocks() {
        let html = r#"<html><head><title>Page</title></head><body>
            <h1>Real Title</h1>
            <div class="longform-unstyled">A long paragraph that is clearly article text.</div>
            <div class="longform-unstyled">Log in</div>
        </body></html>"#;
        let article = extract_long_article("u", "https://x.com/i/article/1", "Page", html);
        assert_eq!(article.title, "Real Title");
        assert_eq!(article.status, ArticleStatus::Ok);
        assert_eq!(article.text, "A long paragraph that is clearly article text.");
    }

    #[test]
    fn long_article_falls_back_to_json_ld() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@graph":[{"articleBody":"Body text long enough to count."},{"text":"short"}]}</script>
        </head><body></body></html>"#;
        let article = extract_long_article("u", "https://x.com/i/article/1", "t", html);
        assert_eq!(article.text, "Body text long enough to count.");
        assert_eq!(article.status, ArticleStatus::Ok);
    }

    #[test]
    fn empty_article_pages_are_classified() {
        let login = extract_long_article("u", "https://x.com/i/flow/login", "", "<html></html>");
        assert_eq!(login.status, ArticleStatus::LoginRequired);

        let signup = r#"<html><body><a href="/i/signup">Join</a></body></html>"#;
        let article = extract_long_article("u", "https://x.com/i/article/1", "", signup);
        assert_eq!(article.status, ArticleStatus::LoginRequired);

        let limited = extract_long_article("u", "https://x.com/i/article/1", "X", "<html></html>");
        assert_eq!(limited.status, ArticleStatus::AccessLimited);

        let empty = extract_long_article("u", "https://x.com/i/article/1", "Post", "<html></html>");
        assert_eq!(empty.status, ArticleStatus::NoText);
        assert_eq!(empty.final_url, "https://x.com/i/article/1");
    }
}
