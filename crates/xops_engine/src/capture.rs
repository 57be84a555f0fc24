//! Post capture: locate the target post in a virtualized feed, extract it
//! with its thread and linked long-form articles, fall back from headless to
//! headed mode once, and leave diagnostics behind on failure.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, Utc};
use serde::Serialize;
use thiserror::Error;
use xops_core::{extract_status_id, ArticleStatus, CaptureRecord, LongArticle, PostSnapshot};
use xops_logging::{xops_debug, xops_info, xops_warn};

use crate::browser::{
    build_session_cookies, BrowserError, BrowserKind, BrowserLauncher, CookieOverrides, FeedPage,
    LaunchOptions,
};
use crate::extract::{collect_unique_posts, extract_long_article, snapshot_feed, FeedArticle};
use crate::media::MediaDownloader;
use crate::paths::WorkspacePaths;
use crate::persist::AtomicFileWriter;
use crate::store::{CaptureStore, StoreError};

pub const LOGIN_FLOW_PATH: &str = "/i/flow/login";
/// Main post text length from which it may stand in for an unreadable
/// linked article.
pub const STATUS_PAGE_FALLBACK_CHARS: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticReport {
    pub current_url: String,
    pub screenshot: Option<PathBuf>,
    pub html: Option<PathBuf>,
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "current_url={}", self.current_url)?;
        if let Some(path) = &self.screenshot {
            write!(f, ", screenshot {}", path.display())?;
        }
        if let Some(path) = &self.html {
            write!(f, ", html {}", path.display())?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("invalid X status url: {0}")]
    InvalidUrl(String),
    #[error("not logged in: page redirected to {0}")]
    LoginWall(String),
    #[error("no tweet article found on page")]
    NoArticles,
    #[error("target status id not found on page: {0}")]
    TargetNotFound(String),
    #[error("captured status mismatch: expected={expected}, actual={actual}")]
    StatusMismatch { expected: String, actual: String },
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("capture failed: {source} ({report})")]
    Diagnosed {
        source: Box<CaptureError>,
        report: DiagnosticReport,
    },
}

impl CaptureError {
    pub fn is_timeout(&self) -> bool {
        match self {
            CaptureError::Browser(err) => err.is_timeout(),
            CaptureError::Diagnosed { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

/// Scroll-and-retry schedule used while looking for the target post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub scroll_px: i64,
    pub settle: Duration,
    pub top_settle: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 8,
            scroll_px: 1200,
            settle: Duration::from_millis(700),
            top_settle: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub browser: BrowserKind,
    pub headless: bool,
    pub proxy: Option<String>,
    pub profile_dir: Option<PathBuf>,
    /// Budget for navigation and every selector wait.
    pub timeout: Duration,
    pub scrolls: u32,
    pub scroll_px: i64,
    pub scroll_wait: Duration,
    pub max_articles: usize,
    pub max_thread: usize,
    pub include_others: bool,
    pub article_settle: Duration,
    pub download_media: bool,
    pub cookie_string: String,
    pub cookie_overrides: CookieOverrides,
    pub retry: RetryPolicy,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            browser: BrowserKind::default(),
            headless: false,
            proxy: None,
            profile_dir: None,
            timeout: Duration::from_millis(90_000),
            scrolls: 4,
            scroll_px: 2800,
            scroll_wait: Duration::from_millis(1200),
            max_articles: 50,
            max_thread: 20,
            include_others: false,
            article_settle: Duration::from_millis(2500),
            download_media: false,
            cookie_string: String::new(),
            cookie_overrides: CookieOverrides::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl CaptureSettings {
    fn launch_options(&self, headless: bool) -> LaunchOptions {
        LaunchOptions {
            browser: self.browser,
            headless,
            profile_dir: self.profile_dir.clone(),
            proxy: self.proxy.clone(),
            timeout: self.timeout,
        }
    }
}

/// Picks the target in one feed snapshot: exact match on the `<time>`
/// permalink first, then any node linking to the target. An empty target
/// selects the first node.
pub fn locate_target<'a>(articles: &'a [FeedArticle], status_id: &str) -> Result<&'a FeedArticle, CaptureError> {
    let first = articles.first().ok_or(CaptureError::NoArticles)?;
    if status_id.is_empty() {
        return Ok(first);
    }
    articles
        .iter()
        .find(|a| a.permalink_id() == Some(status_id))
        .or_else(|| articles.iter().find(|a| a.links_to(status_id)))
        .ok_or_else(|| CaptureError::TargetNotFound(status_id.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedPost {
    pub article: FeedArticle,
    /// Scrolls performed before the target was seen.
    pub scrolls: u32,
}

/// Jumps to the top of the feed, then snapshots and scrolls until the
/// target shows up or the attempts run out. There is no scroll after the
/// last attempt.
pub async fn find_target<P>(page: &mut P, status_id: &str, policy: &RetryPolicy) -> Result<LocatedPost, CaptureError>
where
    P: FeedPage + ?Sized,
{
    if let Err(err) = page.scroll_to_top().await {
        xops_debug!("Home key failed: {}", err);
    }
    page.pause(policy.top_settle).await;

    let mut scrolls = 0;
    let mut last_err = CaptureError::TargetNotFound(status_id.to_string());
    for attempt in 0..policy.attempts {
        let html = page.content().await?;
        let articles = snapshot_feed(&html);
        match locate_target(&articles, status_id) {
            Ok(article) => {
                xops_debug!("Target {} found after {} scrolls", status_id, scrolls);
                return Ok(LocatedPost {
                    article: article.clone(),
                    scrolls,
                });
            }
            Err(err) => last_err = err,
        }
        if attempt + 1 == policy.attempts {
            break;
        }
        if let Err(err) = page.scroll_by(policy.scroll_px).await {
            xops_debug!("Scroll failed: {}", err);
        }
        scrolls += 1;
        page.pause(policy.settle).await;
    }
    Err(last_err)
}

/// Nodes written by the main author (or by anyone with `include_others`),
/// excluding the main post and empty nodes, capped at `max_thread`.
pub fn select_thread(
    main: &PostSnapshot,
    nodes: &[PostSnapshot],
    include_others: bool,
    max_thread: usize,
) -> Vec<PostSnapshot> {
    let handle = main.author_handle.to_lowercase();
    nodes
        .iter()
        .filter(|node| main.status_id.is_empty() || node.status_id != main.status_id)
        .filter(|node| include_others || handle.is_empty() || node.author_handle.to_lowercase() == handle)
        .filter(|node| !node.text.is_empty())
        .take(max_thread)
        .cloned()
        .collect()
}

/// Article urls of the main post first, then of the scanned nodes.
pub fn unique_article_urls(main: &PostSnapshot, nodes: &[PostSnapshot]) -> Vec<String> {
    let mut seen = HashSet::new();
    std::iter::once(main)
        .chain(nodes.iter())
        .flat_map(|post| post.article_urls.iter())
        .filter(|url| !url.is_empty() && seen.insert(url.as_str()))
        .cloned()
        .collect()
}

/// Lets a long main post stand in for linked articles that could not be read.
pub fn apply_status_page_fallback(main: &PostSnapshot, articles: &mut [LongArticle]) {
    if main.article_urls.is_empty() || main.text.chars().count() < STATUS_PAGE_FALLBACK_CHARS {
        return;
    }
    for article in articles
        .iter_mut()
        .filter(|a| a.text.is_empty() && a.status.is_recoverable_from_status_page())
    {
        article.text = main.text.clone();
        article.status = ArticleStatus::FromStatusPage;
    }
}

async fn read_long_article<P>(page: &mut P, url: &str, settle: Duration) -> LongArticle
where
    P: FeedPage + ?Sized,
{
    async fn load<P: FeedPage + ?Sized>(page: &mut P, url: &str, settle: Duration) -> Result<LongArticle, BrowserError> {
        page.goto(url).await?;
        page.pause(settle).await;
        let final_url = page.current_url().await?;
        let title = page.title().await?;
        let html = page.content().await?;
        Ok(extract_long_article(url, &final_url, &title, &html))
    }

    match load(page, url, settle).await {
        Ok(article) => article,
        Err(err) => {
            xops_warn!("Long article {} unreadable: {}", url, err);
            LongArticle {
                status: if err.is_timeout() {
                    ArticleStatus::Timeout
                } else {
                    ArticleStatus::Error
                },
                ..LongArticle::pending(url)
            }
        }
    }
}

/// The load-and-extract sequence on an already open page.
pub async fn capture_on_page<P>(page: &mut P, url: &str, settings: &CaptureSettings) -> Result<CaptureRecord, CaptureError>
where
    P: FeedPage + ?Sized,
{
    let target = extract_status_id(url).unwrap_or_default();

    page.goto(url).await?;
    let current = page.current_url().await?;
    if current.contains(LOGIN_FLOW_PATH) {
        return Err(CaptureError::LoginWall(current));
    }
    page.wait_for_selector("main", settings.timeout).await?;
    page.wait_for_selector("main article", settings.timeout).await?;

    let located = find_target(page, &target, &settings.retry).await?;
    let main = located.article.post;
    if !target.is_empty() && !main.status_id.is_empty() && main.status_id != target {
        return Err(CaptureError::StatusMismatch {
            expected: target,
            actual: main.status_id,
        });
    }

    for _ in 0..settings.scrolls {
        page.scroll_by(settings.scroll_px).await?;
        page.pause(settings.scroll_wait).await;
    }
    let html = page.content().await?;
    let nodes = collect_unique_posts(snapshot_feed(&html), settings.max_articles);

    let mut articles = Vec::new();
    for article_url in unique_article_urls(&main, &nodes) {
        articles.push(read_long_article(page, &article_url, settings.article_settle).await);
    }
    apply_status_page_fallback(&main, &mut articles);

    let thread = select_thread(&main, &nodes, settings.include_others, settings.max_thread);
    let target_status_id = if target.is_empty() {
        main.status_id.clone()
    } else {
        target
    };

    xops_info!(
        "Captured {}: {} thread posts, {} scanned, {} articles",
        target_status_id,
        thread.len(),
        nodes.len(),
        articles.len()
    );
    Ok(CaptureRecord {
        url: url.to_string(),
        target_status_id,
        captured_at: Utc::now().to_rfc3339(),
        main,
        thread_count: thread.len(),
        thread,
        scan_count: nodes.len(),
        article_count: articles.len(),
        articles,
        downloaded_media: None,
        downloaded_media_count: None,
    })
}

/// Screenshot and HTML dump under `debug_dir`, both best effort.
pub async fn save_diagnostics<P>(page: &mut P, debug_dir: PathBuf, prefix: &str) -> DiagnosticReport
where
    P: FeedPage + ?Sized,
{
    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let writer = AtomicFileWriter::new(debug_dir);
    let current_url = page.current_url().await.unwrap_or_default();

    let screenshot = match page.screenshot_png().await {
        Ok(png) => writer.write(&format!("{prefix}_{stamp}.png"), png).ok(),
        Err(err) => {
            xops_debug!("Screenshot unavailable: {}", err);
            None
        }
    };
    let html = match page.content().await {
        Ok(source) => writer.write(&format!("{prefix}_{stamp}.html"), source).ok(),
        Err(err) => {
            xops_debug!("Page source unavailable: {}", err);
            None
        }
    };
    DiagnosticReport {
        current_url,
        screenshot,
        html,
    }
}

/// Launches a browser in the given mode, captures `url` and always closes
/// the session. Failures carry the diagnostics written for them.
pub async fn run_capture_session<L>(
    launcher: &L,
    url: &str,
    settings: &CaptureSettings,
    headless: bool,
    paths: &WorkspacePaths,
) -> Result<CaptureRecord, CaptureError>
where
    L: BrowserLauncher + ?Sized,
{
    let mut page = launcher.launch(&settings.launch_options(headless)).await?;

    if let Some(cookies) = build_session_cookies(&settings.cookie_string, &settings.cookie_overrides) {
        match page.add_cookies(&cookies).await {
            Ok(()) => xops_info!("Cookie mode enabled ({} cookies)", cookies.len()),
            Err(err) => xops_warn!("Cookie injection failed: {}", err),
        }
    }

    let result = match capture_on_page(&mut page, url, settings).await {
        Ok(record) => Ok(record),
        Err(err) => {
            let prefix = if err.is_timeout() { "timeout" } else { "error" };
            let report = save_diagnostics(&mut page, paths.debug_dir(), prefix).await;
            Err(CaptureError::Diagnosed {
                source: Box::new(err),
                report,
            })
        }
    };
    if let Err(err) = page.close().await {
        xops_debug!("Closing browser session failed: {}", err);
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureMode {
    Headless,
    Headed,
    HeadedFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOutcome {
    pub record: CaptureRecord,
    pub mode: CaptureMode,
    pub headless_error: Option<String>,
}

/// Runs a capture session in the configured mode and, when that was
/// headless and failed, once more headed. A headed failure is final.
///
/// A url without a status id is rejected before any browser is launched.
pub async fn capture_with_fallback<L>(
    launcher: &L,
    url: &str,
    settings: &CaptureSettings,
    paths: &WorkspacePaths,
) -> Result<CaptureOutcome, CaptureError>
where
    L: BrowserLauncher + ?Sized,
{
    if extract_status_id(url).is_none() {
        return Err(CaptureError::InvalidUrl(url.to_string()));
    }

    match run_capture_session(launcher, url, settings, settings.headless, paths).await {
        Ok(record) => Ok(CaptureOutcome {
            record,
            mode: if settings.headless {
                CaptureMode::Headless
            } else {
                CaptureMode::Headed
            },
            headless_error: None,
        }),
        Err(err) if settings.headless => {
            xops_warn!("Headless capture failed, retrying headed: {}", err);
            let record = run_capture_session(launcher, url, settings, false, paths).await?;
            Ok(CaptureOutcome {
                record,
                mode: CaptureMode::HeadedFallback,
                headless_error: Some(err.to_string()),
            })
        }
        Err(err) => Err(err),
    }
}

/// A stored capture and how it was obtained.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureReport {
    pub status_id: String,
    pub capture_mode: CaptureMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_error_headless: Option<String>,
    pub capture_json: PathBuf,
    pub capture_md: PathBuf,
    #[serde(skip)]
    pub record: CaptureRecord,
}

/// Produces a stored capture for a post url.
#[async_trait]
pub trait Capturer: Send + Sync {
    async fn capture(&self, url: &str) -> Result<CaptureReport, CaptureError>;
}

/// Browser-backed capture with mode fallback, optional media download and
/// storage into the capture directory.
pub struct BrowserCapturer<L> {
    launcher: L,
    settings: CaptureSettings,
    paths: WorkspacePaths,
    media: MediaDownloader,
}

impl<L: BrowserLauncher> BrowserCapturer<L> {
    pub fn new(launcher: L, settings: CaptureSettings, paths: WorkspacePaths) -> Self {
        Self {
            launcher,
            settings,
            paths,
            media: MediaDownloader::default(),
        }
    }

    pub fn with_media_downloader(mut self, media: MediaDownloader) -> Self {
        self.media = media;
        self
    }
}

#[async_trait]
impl<L: BrowserLauncher> Capturer for BrowserCapturer<L> {
    async fn capture(&self, url: &str) -> Result<CaptureReport, CaptureError> {
        let outcome = capture_with_fallback(&self.launcher, url, &self.settings, &self.paths).await?;
        let mut record = outcome.record;

        if self.settings.download_media {
            let files = self
                .media
                .download_all(&record.unique_media_urls(), &self.paths.media_dir(), &record.status_id())
                .await;
            record.downloaded_media_count = Some(files.len());
            record.downloaded_media = Some(files.iter().map(|p| p.display().to_string()).collect());
        }

        let saved = CaptureStore::new(self.paths.capture_dir()).save(&record)?;
        Ok(CaptureReport {
            status_id: record.status_id(),
            capture_mode: outcome.mode,
            capture_error_headless: outcome.headless_error,
            capture_json: saved.json,
            capture_md: saved.markdown,
            record,
        })
    }
}
