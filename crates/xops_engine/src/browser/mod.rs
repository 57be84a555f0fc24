//! Browser automation seam.
//!
//! Capture and draft publishing only talk to [`FeedPage`] and
//! [`ComposePage`]; [`WebDriverLauncher`] drives a real browser through any
//! W3C WebDriver endpoint (chromedriver, msedgedriver).

mod cookies;
mod webdriver;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use cookies::{build_session_cookies, parse_cookie_string, resolve_cookie_string, CookieOverrides};
pub use webdriver::{WebDriverLauncher, WebDriverPage, DEFAULT_WEBDRIVER_URL};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrowserError {
    #[error("timed out after {timeout_ms} ms: {what}")]
    Timeout { what: String, timeout_ms: u128 },
    #[error("no element matches {0}")]
    NoSuchElement(String),
    #[error("could not start browser session: {0}")]
    Launch(String),
    #[error("webdriver error {code}: {message}")]
    Driver { code: String, message: String },
    #[error("webdriver transport: {0}")]
    Transport(String),
    #[error("unexpected webdriver response: {0}")]
    Protocol(String),
}

impl BrowserError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BrowserError::Timeout { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowserKind {
    Chrome,
    Edge,
    #[default]
    Chromium,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Edge => "edge",
            BrowserKind::Chromium => "chromium",
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" => Ok(BrowserKind::Chrome),
            "edge" | "msedge" => Ok(BrowserKind::Edge),
            "chromium" => Ok(BrowserKind::Chromium),
            other => Err(format!("unsupported browser: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub browser: BrowserKind,
    pub headless: bool,
    pub profile_dir: Option<PathBuf>,
    pub proxy: Option<String>,
    /// Page-load budget handed to the driver.
    pub timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            browser: BrowserKind::default(),
            headless: false,
            profile_dir: None,
            proxy: None,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub http_only: bool,
    pub secure: bool,
}

/// One browser tab, driven serially.
#[async_trait]
pub trait FeedPage: Send {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError>;
    async fn current_url(&mut self) -> Result<String, BrowserError>;
    /// Polls until `selector` matches or `timeout` elapses.
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError>;
    /// Serialized DOM of the current document.
    async fn content(&mut self) -> Result<String, BrowserError>;
    async fn title(&mut self) -> Result<String, BrowserError>;
    /// Home key: jump to the top of the feed.
    async fn scroll_to_top(&mut self) -> Result<(), BrowserError>;
    async fn scroll_by(&mut self, delta_y: i64) -> Result<(), BrowserError>;
    /// Lets the feed settle.
    async fn pause(&mut self, duration: Duration);
    async fn screenshot_png(&mut self) -> Result<Vec<u8>, BrowserError>;
    async fn add_cookies(&mut self, cookies: &[Cookie]) -> Result<(), BrowserError>;
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// The post composer interactions used by the drafts publisher.
#[async_trait]
pub trait ComposePage: FeedPage {
    /// Clicks the first element matching any selector; false when none match.
    async fn click_first(&mut self, selectors: &[&str]) -> Result<bool, BrowserError>;
    /// Clicks the first button whose label contains any of `names`.
    async fn click_button_named(&mut self, names: &[&str]) -> Result<bool, BrowserError>;
    async fn fill(&mut self, selector: &str, text: &str) -> Result<(), BrowserError>;
    async fn press_escape(&mut self) -> Result<(), BrowserError>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Page: ComposePage;

    async fn launch(&self, options: &LaunchOptions) -> Result<Self::Page, BrowserError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_names_parse_case_insensitively() {
        assert_eq!("Edge".parse::<BrowserKind>(), Ok(BrowserKind::Edge));
        assert_eq!("msedge".parse::<BrowserKind>(), Ok(BrowserKind::Edge));
        assert_eq!("chromium".parse::<BrowserKind>(), Ok(BrowserKind::Chromium));
        assert!("firefox".parse::<BrowserKind>().is_err());
    }
}
