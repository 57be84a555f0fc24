//! In-memory browser used by the capture and drafts tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use xops_engine::browser::{BrowserError, BrowserLauncher, ComposePage, Cookie, FeedPage, LaunchOptions};

/// One feed node: permalink id, author handle, text and extra markup.
pub fn feed_node(status_id: &str, handle: &str, text: &str, extra: &str) -> String {
    format!(
        r#"<article>
  <div data-testid="User-Name"><span>{handle} name</span><span>@{handle}</span></div>
  <a href="/{handle}/status/{status_id}"><time datetime="2026-10-19T08:00:00.000Z">Oct 19</time></a>
  <div data-testid="tweetText">{text}</div>
  {extra}
</article>"#
    )
}

pub fn feed_page(nodes: &[String]) -> String {
    format!("<html><body><main>{}</main></body></html>", nodes.join("\n"))
}

#[derive(Debug, Default)]
pub struct PageLog {
    pub visited: Vec<String>,
    pub scrolls: usize,
    pub home_presses: usize,
    pub fills: Vec<String>,
    pub cookies: Vec<Cookie>,
    pub closed: bool,
}

/// A tab whose feed grows with each scroll: `feed[n]` is the source after
/// `n` scrolls, the last entry repeating. Urls in `pages` serve fixed HTML.
#[derive(Clone)]
pub struct FakePage {
    pub feed: Vec<String>,
    pub pages: HashMap<String, String>,
    pub redirects: HashMap<String, String>,
    pub current: String,
    pub log: Arc<Mutex<PageLog>>,
    pub fail_fill: bool,
}

impl FakePage {
    pub fn new(feed: Vec<String>) -> Self {
        Self {
            feed,
            pages: HashMap::new(),
            redirects: HashMap::new(),
            current: String::new(),
            log: Arc::new(Mutex::new(PageLog::default())),
            fail_fill: false,
        }
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    pub fn scrolls(&self) -> usize {
        self.log.lock().unwrap().scrolls
    }
}

#[async_trait]
impl FeedPage for FakePage {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.log.lock().unwrap().visited.push(url.to_string());
        self.current = self.redirects.get(url).cloned().unwrap_or_else(|| url.to_string());
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        Ok(self.current.clone())
    }

    async fn wait_for_selector(&mut self, _selector: &str, _timeout: Duration) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        if let Some(html) = self.pages.get(&self.current) {
            return Ok(html.clone());
        }
        let scrolls = self.log.lock().unwrap().scrolls;
        let idx = scrolls.min(self.feed.len().saturating_sub(1));
        Ok(self.feed.get(idx).cloned().unwrap_or_default())
    }

    async fn title(&mut self) -> Result<String, BrowserError> {
        Ok("Article / X".to_string())
    }

    async fn scroll_to_top(&mut self) -> Result<(), BrowserError> {
        self.log.lock().unwrap().home_presses += 1;
        Ok(())
    }

    async fn scroll_by(&mut self, _delta_y: i64) -> Result<(), BrowserError> {
        self.log.lock().unwrap().scrolls += 1;
        Ok(())
    }

    async fn pause(&mut self, _duration: Duration) {}

    async fn screenshot_png(&mut self) -> Result<Vec<u8>, BrowserError> {
        Ok(b"\x89PNG".to_vec())
    }

    async fn add_cookies(&mut self, cookies: &[Cookie]) -> Result<(), BrowserError> {
        self.log.lock().unwrap().cookies.extend_from_slice(cookies);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.log.lock().unwrap().closed = true;
        Ok(())
    }
}

#[async_trait]
impl ComposePage for FakePage {
    async fn click_first(&mut self, _selectors: &[&str]) -> Result<bool, BrowserError> {
        Ok(true)
    }

    async fn click_button_named(&mut self, _names: &[&str]) -> Result<bool, BrowserError> {
        Ok(true)
    }

    async fn fill(&mut self, selector: &str, text: &str) -> Result<(), BrowserError> {
        if self.fail_fill {
            return Err(BrowserError::NoSuchElement(selector.to_string()));
        }
        self.log.lock().unwrap().fills.push(text.to_string());
        Ok(())
    }

    async fn press_escape(&mut self) -> Result<(), BrowserError> {
        Ok(())
    }
}

/// Hands out clones of one page; launches in the listed modes fail.
pub struct FakeLauncher {
    pub page: FakePage,
    pub fail_headless: bool,
    pub fail_headed: bool,
    pub launches: Mutex<Vec<LaunchOptions>>,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        Self {
            page,
            fail_headless: false,
            fail_headed: false,
            launches: Mutex::new(Vec::new()),
        }
    }

    pub fn modes(&self) -> Vec<bool> {
        self.launches.lock().unwrap().iter().map(|o| o.headless).collect()
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    type Page = FakePage;

    async fn launch(&self, options: &LaunchOptions) -> Result<FakePage, BrowserError> {
        self.launches.lock().unwrap().push(options.clone());
        let fails = if options.headless {
            self.fail_headless
        } else {
            self.fail_headed
        };
        if fails {
            return Err(BrowserError::Launch(format!("headless={} refused", options.headless)));
        }
        Ok(self.page.clone())
    }
}
