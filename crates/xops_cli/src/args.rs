//! Command-line interface of the `xops` binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use xops_engine::browser::{BrowserKind, CookieOverrides, DEFAULT_WEBDRIVER_URL};
use xops_engine::workflows::{Purpose, DEFAULT_DRAFT_LIMIT};
use xops_engine::{CaptureSettings, WorkspacePaths};

pub(crate) const CAPTURE_TIMEOUT_MS: u64 = 90_000;
const ANALYZE_TIMEOUT_MS: u64 = 180_000;

/// x-ops research toolkit: capture posts, learn from them, queue drafts.
#[derive(Parser, Debug)]
#[command(name = "xops", version, about, long_about = None)]
pub struct Cli {
    /// Workspace root; all data lives under `<workspace>/data`
    #[arg(long, env = "XOPS_WORKSPACE", default_value = ".", global = true)]
    pub workspace: PathBuf,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// W3C WebDriver endpoint (chromedriver, msedgedriver)
    #[arg(long, env = "XOPS_WEBDRIVER_URL", default_value = DEFAULT_WEBDRIVER_URL, global = true)]
    pub webdriver: String,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn paths(&self) -> WorkspacePaths {
        WorkspacePaths::new(&self.workspace)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Capture one post, its thread and linked articles
    Capture(CaptureArgs),
    /// Write a learned note and append the knowledge base
    Learn(LearnArgs),
    /// Categorize a list of links into one batch note
    Batch(BatchArgs),
    /// Build an action plan from a tutorial-style capture
    Tutorial(ReportArgs),
    /// Describe the structure of a capture's main post
    Viral(ReportArgs),
    /// Capture and analyze in one step
    Analyze(AnalyzeArgs),
    /// Generate the day's post queue from seeds and feeds
    QueueGenerate(GenerateArgs),
    /// Save pending queue items as drafts
    Drafts(DraftsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BrowserArgs {
    /// chrome, edge or chromium
    #[arg(long, default_value = "chromium")]
    pub browser: BrowserKind,

    #[arg(long, overrides_with = "headed")]
    pub headless: bool,

    #[arg(long, overrides_with = "headless")]
    pub headed: bool,

    #[arg(long)]
    pub proxy: Option<String>,
}

impl BrowserArgs {
    /// Explicit `--headless`/`--headed`, else `default`.
    pub fn headless_or(&self, default: bool) -> bool {
        if self.headless {
            true
        } else if self.headed {
            false
        } else {
            default
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Raw `name=value; ...` cookie header
    #[arg(long, env = "X_COOKIE_STRING", hide_env_values = true)]
    pub cookie_string: Option<String>,

    /// File holding the raw cookie header
    #[arg(long, env = "X_COOKIE_FILE")]
    pub cookie_file: Option<PathBuf>,

    /// Navigation and selector wait budget in milliseconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Extra feed scrolls after the target is found
    #[arg(long, default_value_t = 4)]
    pub scrolls: u32,

    #[arg(long, default_value_t = 1200)]
    pub scroll_wait_ms: u64,

    #[arg(long, default_value_t = 50)]
    pub max_articles: usize,

    #[arg(long, default_value_t = 20)]
    pub max_thread: usize,

    /// Keep replies by other authors in the thread
    #[arg(long)]
    pub include_others: bool,

    #[arg(long)]
    pub download_media: bool,
}

impl SessionArgs {
    pub fn settings(
        &self,
        browser: &BrowserArgs,
        headless: bool,
        default_timeout_ms: u64,
        paths: &WorkspacePaths,
    ) -> CaptureSettings {
        let cookie_string = xops_engine::browser::resolve_cookie_string(
            self.cookie_string.as_deref(),
            self.cookie_file.as_deref(),
        );
        CaptureSettings {
            browser: browser.browser,
            headless,
            proxy: browser.proxy.clone(),
            profile_dir: Some(paths.profile_dir()),
            timeout: Duration::from_millis(self.timeout.unwrap_or(default_timeout_ms)),
            scrolls: self.scrolls,
            scroll_wait: Duration::from_millis(self.scroll_wait_ms),
            max_articles: self.max_articles,
            max_thread: self.max_thread,
            include_others: self.include_others,
            download_media: self.download_media,
            cookie_string,
            cookie_overrides: CookieOverrides::from_env(),
            ..CaptureSettings::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CaptureArgs {
    /// Status url, e.g. https://x.com/<handle>/status/<id>
    pub url: String,

    #[command(flatten)]
    pub browser: BrowserArgs,

    #[command(flatten)]
    pub session: SessionArgs,

    /// Extra copy of the capture JSON
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl CaptureArgs {
    pub fn settings(&self, paths: &WorkspacePaths) -> CaptureSettings {
        let headless = self.browser.headless_or(false);
        self.session.settings(&self.browser, headless, CAPTURE_TIMEOUT_MS, paths)
    }
}

#[derive(Args, Debug, Clone)]
pub struct LearnArgs {
    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub capture: Option<PathBuf>,

    #[arg(long, default_value_t = xops_core::DEFAULT_MAX_POINTS)]
    pub max_points: usize,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub kb: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    #[arg(long)]
    pub links_file: PathBuf,

    /// Note name, default `batch_<timestamp>`
    #[arg(long)]
    pub name: Option<String>,

    /// Capture links that have no stored capture yet
    #[arg(long)]
    pub fetch: bool,

    /// Sync the note to Notion (NOTION_TOKEN, NOTION_DATABASE_ID)
    #[arg(long)]
    pub notion: bool,

    #[command(flatten)]
    pub browser: BrowserArgs,

    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub capture: Option<PathBuf>,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// tutorial, viral, batch (or 1, 2, 3)
    #[arg(long)]
    pub purpose: Purpose,

    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub links_file: Option<PathBuf>,

    #[arg(long)]
    pub notion: bool,

    #[command(flatten)]
    pub browser: BrowserArgs,

    #[command(flatten)]
    pub session: SessionArgs,
}

impl AnalyzeArgs {
    pub fn settings(&self, paths: &WorkspacePaths) -> CaptureSettings {
        let headless = self.browser.headless_or(true);
        self.session.settings(&self.browser, headless, ANALYZE_TIMEOUT_MS, paths)
    }
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Queue date, default today
    #[arg(long)]
    pub date: Option<String>,

    /// Item count, default `posts_per_day` from the config
    #[arg(long, default_value_t = 0)]
    pub limit: usize,

    #[arg(long)]
    pub queue: Option<PathBuf>,

    #[arg(long)]
    pub seeds: Option<PathBuf>,

    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct DraftsArgs {
    #[arg(long)]
    pub queue: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_DRAFT_LIMIT)]
    pub limit: usize,

    #[arg(long, default_value = "chrome")]
    pub browser: BrowserKind,

    #[arg(long)]
    pub headless: bool,

    /// Rewrite the queue with drafted items marked
    #[arg(long)]
    pub mark: bool,

    /// Screenshot failed items into the data dir
    #[arg(long)]
    pub debug: bool,
}
