use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use serde_json::{json, Value};
use tokio::time::Instant;
use xops_logging::{xops_debug, xops_warn};

use super::{BrowserError, BrowserKind, BrowserLauncher, ComposePage, Cookie, FeedPage, LaunchOptions};

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const KEY_HOME: &str = "\u{E011}";
const KEY_ESCAPE: &str = "\u{E00C}";

const CLICK_BUTTON_SCRIPT: &str = r#"
const names = arguments[0];
const buttons = Array.from(document.querySelectorAll('button, [role="button"]'));
for (const name of names) {
  for (const b of buttons) {
    const label = ((b.innerText || '') + ' ' + (b.getAttribute('aria-label') || '')).trim();
    if (label.includes(name)) { b.click(); return true; }
  }
}
return false;
"#;

/// Starts sessions on a W3C WebDriver endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    endpoint: String,
    client: reqwest::Client,
}

impl WebDriverLauncher {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, BrowserError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| BrowserError::Transport(err.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

fn browser_args(options: &LaunchOptions) -> Vec<String> {
    let mut args = vec![
        "--no-first-run".to_string(),
        "--window-size=1280,2000".to_string(),
    ];
    if options.headless {
        args.push("--headless=new".to_string());
    }
    if let Some(dir) = &options.profile_dir {
        args.push(format!("--user-data-dir={}", dir.display()));
    }
    if let Some(proxy) = options.proxy.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        args.push(format!("--proxy-server={proxy}"));
    }
    args
}

pub(crate) fn capabilities(options: &LaunchOptions) -> Value {
    let timeout_ms = options.timeout.as_millis() as u64;
    let args = browser_args(options);
    let (browser_name, options_key) = match options.browser {
        BrowserKind::Edge => ("MicrosoftEdge", "ms:edgeOptions"),
        BrowserKind::Chrome | BrowserKind::Chromium => ("chrome", "goog:chromeOptions"),
    };
    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": browser_name,
                "pageLoadStrategy": "eager",
                "timeouts": { "pageLoad": timeout_ms, "script": timeout_ms, "implicit": 0 },
                options_key: { "args": args },
            }
        }
    })
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    type Page = WebDriverPage;

    async fn launch(&self, options: &LaunchOptions) -> Result<Self::Page, BrowserError> {
        let url = format!("{}/session", self.endpoint);
        let value = send(
            self.client.post(&url).json(&capabilities(options)),
            "new session",
            options.timeout,
        )
        .await
        .map_err(|err| BrowserError::Launch(err.to_string()))?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| BrowserError::Launch("response carries no sessionId".to_string()))?;
        xops_debug!(
            "WebDriver session {} started ({}, headless={})",
            session_id,
            options.browser,
            options.headless
        );
        Ok(WebDriverPage {
            client: self.client.clone(),
            session_url: format!("{url}/{session_id}"),
            timeout: options.timeout,
        })
    }
}

/// The single window of one WebDriver session.
#[derive(Debug)]
pub struct WebDriverPage {
    client: reqwest::Client,
    session_url: String,
    timeout: Duration,
}

impl WebDriverPage {
    async fn get(&self, path: &str, what: &str) -> Result<Value, BrowserError> {
        let request = self.client.get(format!("{}{path}", self.session_url));
        send(request, what, self.timeout).await
    }

    async fn post(&self, path: &str, body: Value, what: &str) -> Result<Value, BrowserError> {
        let request = self
            .client
            .post(format!("{}{path}", self.session_url))
            .json(&body);
        send(request, what, self.timeout).await
    }

    async fn find_element(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        let body = json!({ "using": "css selector", "value": selector });
        match self.post("/element", body, selector).await {
            Ok(value) => value
                .get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(|id| Some(id.to_string()))
                .ok_or_else(|| BrowserError::Protocol(format!("element reference for {selector}"))),
            Err(BrowserError::NoSuchElement(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn click_element(&self, element_id: &str, what: &str) -> Result<(), BrowserError> {
        self.post(&format!("/element/{element_id}/click"), json!({}), what)
            .await
            .map(|_| ())
    }

    async fn execute(&self, script: &str, args: Value) -> Result<Value, BrowserError> {
        self.post(
            "/execute/sync",
            json!({ "script": script, "args": args }),
            "script",
        )
        .await
    }

    async fn press_key(&self, key: &str) -> Result<(), BrowserError> {
        let body = json!({
            "actions": [{
                "type": "key",
                "id": "keyboard",
                "actions": [
                    { "type": "keyDown", "value": key },
                    { "type": "keyUp", "value": key },
                ],
            }]
        });
        self.post("/actions", body, "key press").await.map(|_| ())
    }
}

#[async_trait]
impl FeedPage for WebDriverPage {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.post("/url", json!({ "url": url }), &format!("loading {url}"))
            .await
            .map(|_| ())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        let value = self.get("/url", "current url").await?;
        as_string(value, "current url")
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.find_element(selector).await?.is_some() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout {
                    what: format!("waiting for selector {selector}"),
                    timeout_ms: timeout.as_millis(),
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        let value = self.get("/source", "page source").await?;
        as_string(value, "page source")
    }

    async fn title(&mut self) -> Result<String, BrowserError> {
        let value = self.get("/title", "title").await?;
        as_string(value, "title")
    }

    async fn scroll_to_top(&mut self) -> Result<(), BrowserError> {
        self.press_key(KEY_HOME).await
    }

    async fn scroll_by(&mut self, delta_y: i64) -> Result<(), BrowserError> {
        self.execute("window.scrollBy(0, arguments[0]);", json!([delta_y]))
            .await
            .map(|_| ())
    }

    async fn pause(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn screenshot_png(&mut self) -> Result<Vec<u8>, BrowserError> {
        let value = self.get("/screenshot", "screenshot").await?;
        let encoded = as_string(value, "screenshot")?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|err| BrowserError::Protocol(format!("screenshot is not base64: {err}")))
    }

    /// WebDriver only accepts cookies for the current document's domain, so
    /// each domain's root page is visited first.
    async fn add_cookies(&mut self, cookies: &[Cookie]) -> Result<(), BrowserError> {
        let mut by_domain: BTreeMap<&str, Vec<&Cookie>> = BTreeMap::new();
        for cookie in cookies {
            by_domain.entry(cookie.domain.as_str()).or_default().push(cookie);
        }
        for (domain, group) in by_domain {
            self.goto(&format!("https://{}/", domain.trim_start_matches('.')))
                .await?;
            for cookie in group {
                let body = json!({
                    "cookie": {
                        "name": cookie.name,
                        "value": cookie.value,
                        "domain": cookie.domain,
                        "path": cookie.path,
                        "httpOnly": cookie.http_only,
                        "secure": cookie.secure,
                    }
                });
                if let Err(err) = self.post("/cookie", body, "add cookie").await {
                    xops_warn!("Cookie {} rejected on {}: {}", cookie.name, domain, err);
                }
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        send(self.client.delete(&self.session_url), "close session", self.timeout)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl ComposePage for WebDriverPage {
    async fn click_first(&mut self, selectors: &[&str]) -> Result<bool, BrowserError> {
        for selector in selectors {
            let Some(element) = self.find_element(selector).await? else {
                continue;
            };
            match self.click_element(&element, selector).await {
                Ok(()) => return Ok(true),
                Err(err) => xops_debug!("Click on {} failed: {}", selector, err),
            }
        }
        Ok(false)
    }

    async fn click_button_named(&mut self, names: &[&str]) -> Result<bool, BrowserError> {
        let value = self.execute(CLICK_BUTTON_SCRIPT, json!([names])).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn fill(&mut self, selector: &str, text: &str) -> Result<(), BrowserError> {
        let element = self
            .find_element(selector)
            .await?
            .ok_or_else(|| BrowserError::NoSuchElement(selector.to_string()))?;
        self.click_element(&element, selector).await?;
        self.post(
            &format!("/element/{element}/value"),
            json!({ "text": text }),
            selector,
        )
        .await
        .map(|_| ())
    }

    async fn press_escape(&mut self) -> Result<(), BrowserError> {
        self.press_key(KEY_ESCAPE).await
    }
}

async fn send(
    request: reqwest::RequestBuilder,
    what: &str,
    timeout: Duration,
) -> Result<Value, BrowserError> {
    let response = request
        .send()
        .await
        .map_err(|err| BrowserError::Transport(err.to_string()))?;
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|err| BrowserError::Protocol(format!("{what}: {err}")))?;
    let value = body.get("value").cloned().unwrap_or(Value::Null);
    if status.is_success() {
        return Ok(value);
    }

    let code = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Err(match code.as_str() {
        "timeout" | "script timeout" => BrowserError::Timeout {
            what: what.to_string(),
            timeout_ms: timeout.as_millis(),
        },
        "no such element" => BrowserError::NoSuchElement(what.to_string()),
        _ => BrowserError::Driver { code, message },
    })
}

fn as_string(value: Value, what: &str) -> Result<String, BrowserError> {
    match value {
        Value::String(text) => Ok(text),
        other => Err(BrowserError::Protocol(format!("{what}: expected string, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn capabilities_carry_mode_profile_and_proxy() {
        let options = LaunchOptions {
            browser: BrowserKind::Edge,
            headless: true,
            profile_dir: Some(PathBuf::from("/ws/data/profile")),
            proxy: Some(" http://127.0.0.1:7890 ".into()),
            timeout: Duration::from_millis(90_000),
        };
        let caps = capabilities(&options);
        let always = &caps["capabilities"]["alwaysMatch"];
        assert_eq!(always["browserName"], "MicrosoftEdge");
        assert_eq!(always["timeouts"]["pageLoad"], 90_000);
        let args: Vec<&str> = always["ms:edgeOptions"]["args"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(args.contains(&"--headless=new"));
        assert!(args.contains(&"--user-data-dir=/ws/data/profile"));
        assert!(args.contains(&"--proxy-server=http://127.0.0.1:7890"));
    }

    #[test]
    fn headed_chrome_has_no_headless_flag() {
        let options = LaunchOptions {
            browser: BrowserKind::Chrome,
            headless: false,
            profile_dir: None,
            proxy: None,
            timeout: Duration::from_secs(1),
        };
        let caps = capabilities(&options);
        let args = caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"]
            .as_array()
            .unwrap()
            .clone();
        assert!(!args.iter().any(|a| a.as_str() == Some("--headless=new")));
    }
}
