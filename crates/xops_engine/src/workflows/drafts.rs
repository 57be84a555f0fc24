use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use xops_core::{truncate_chars, POST_CHAR_LIMIT, STATUS_DRAFTED};
use xops_logging::{xops_info, xops_warn};

use super::WorkflowError;
use crate::browser::{BrowserError, BrowserKind, BrowserLauncher, ComposePage, FeedPage, LaunchOptions};
use crate::paths::WorkspacePaths;
use crate::persist::AtomicFileWriter;
use crate::store::{load_queue, save_queue};

pub const COMPOSE_URL: &str = "https://x.com/compose/tweet";
pub const DEFAULT_DRAFT_LIMIT: usize = 15;
const TEXTBOX_SELECTOR: &str = r#"div[role="textbox"]"#;
const TEXTBOX_TIMEOUT: Duration = Duration::from_secs(20);
const CLOSE_SELECTORS: &[&str] = &[
    r#"button[data-testid="AppTabBar_Close_Button"]"#,
    r#"button[data-testid="app-bar-close"]"#,
    r#"button[aria-label="Close"]"#,
    r#"button[aria-label="关闭"]"#,
];
const SAVE_BUTTON_NAMES: &[&str] = &["Save", "保存", "Draft", "草稿"];
const CONFIRM_SELECTORS: &[&str] = &[
    r#"button[data-testid="confirmationSheetConfirm"]"#,
    r#"button[data-testid="confirm"]"#,
];

#[derive(Debug, Clone)]
pub struct DraftsOptions {
    pub queue: Option<PathBuf>,
    pub limit: usize,
    pub browser: BrowserKind,
    pub headless: bool,
    /// Rewrite the queue with drafted items marked.
    pub mark: bool,
    /// Screenshot failed items into the data dir.
    pub debug: bool,
}

impl Default for DraftsOptions {
    fn default() -> Self {
        Self {
            queue: None,
            limit: DEFAULT_DRAFT_LIMIT,
            browser: BrowserKind::Chrome,
            headless: false,
            mark: false,
            debug: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftsResult {
    pub queue: PathBuf,
    pub processed: usize,
    pub drafted: Vec<u32>,
    pub failed: usize,
    pub marked: bool,
}

/// Saves pending queue items as drafts in the composer, one at a time.
pub async fn publish_drafts<L>(
    launcher: &L,
    paths: &WorkspacePaths,
    options: &DraftsOptions,
) -> Result<DraftsResult, WorkflowError>
where
    L: BrowserLauncher + ?Sized,
{
    let queue = options.queue.clone().unwrap_or_else(|| paths.queue_file());
    let (header, mut items) = load_queue(&queue)?;
    let selected: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_pending() && !item.text.trim().is_empty())
        .map(|(idx, _)| idx)
        .take(options.limit)
        .collect();

    let mut result = DraftsResult {
        queue: queue.clone(),
        processed: selected.len(),
        drafted: Vec::new(),
        failed: 0,
        marked: false,
    };
    if selected.is_empty() {
        xops_info!("No pending items in {:?}", queue);
        return Ok(result);
    }

    let mut page = launcher
        .launch(&LaunchOptions {
            browser: options.browser,
            headless: options.headless,
            profile_dir: Some(paths.profile_dir()),
            ..LaunchOptions::default()
        })
        .await?;

    for idx in selected {
        let item = &mut items[idx];
        let text = truncate_chars(&item.text, POST_CHAR_LIMIT);
        match draft_text(&mut page, &text).await {
            Ok(()) => {
                item.status = STATUS_DRAFTED.to_string();
                result.drafted.push(item.item_id);
                xops_info!("Drafted Item {:03}", item.item_id);
            }
            Err(err) => {
                result.failed += 1;
                xops_warn!("Item {:03} not drafted: {}", item.item_id, err);
                if options.debug {
                    save_failure_screenshot(&mut page, paths, item.item_id).await;
                }
            }
        }
    }
    if let Err(err) = page.close().await {
        xops_warn!("Closing browser session failed: {}", err);
    }

    if options.mark {
        save_queue(&queue, &header, &items)?;
        result.marked = true;
    }
    Ok(result)
}

/// Opens the composer, types `text` and leaves through the save-draft prompt.
pub async fn draft_text<P>(page: &mut P, text: &str) -> Result<(), BrowserError>
where
    P: ComposePage + ?Sized,
{
    page.goto(COMPOSE_URL).await?;
    page.wait_for_selector(TEXTBOX_SELECTOR, TEXTBOX_TIMEOUT).await?;
    page.fill(TEXTBOX_SELECTOR, text).await?;
    page.pause(Duration::from_millis(500)).await;
    save_draft(page).await?;
    page.pause(Duration::from_secs(1)).await;
    Ok(())
}

async fn save_draft<P>(page: &mut P) -> Result<(), BrowserError>
where
    P: ComposePage + ?Sized,
{
    if !page.click_first(CLOSE_SELECTORS).await? {
        page.press_escape().await?;
    }
    if page.click_button_named(SAVE_BUTTON_NAMES).await? {
        return Ok(());
    }
    page.click_first(CONFIRM_SELECTORS).await?;
    Ok(())
}

async fn save_failure_screenshot<P>(page: &mut P, paths: &WorkspacePaths, item_id: u32)
where
    P: FeedPage + ?Sized,
{
    let png = match page.screenshot_png().await {
        Ok(png) => png,
        Err(err) => {
            xops_warn!("Screenshot unavailable: {}", err);
            return;
        }
    };
    let writer = AtomicFileWriter::new(paths.data_dir());
    if let Err(err) = writer.write(&format!("error_{item_id:03}.png"), png) {
        xops_warn!("Could not store screenshot: {}", err);
    }
}
