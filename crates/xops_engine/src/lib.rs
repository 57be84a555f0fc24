//! x-ops engine: browser capture, HTTP, storage and the tool workflows.
pub mod browser;
mod capture;
mod config;
mod decode;
mod extract;
mod feeds;
mod fetch;
mod knowledge;
mod llm;
mod media;
mod metadata;
mod notion;
mod paths;
mod persist;
mod store;
pub mod workflows;

pub use capture::{
    apply_status_page_fallback, capture_on_page, capture_with_fallback, find_target, locate_target,
    run_capture_session, save_diagnostics, select_thread, unique_article_urls, BrowserCapturer, CaptureError,
    CaptureMode, CaptureOutcome, CaptureReport, CaptureSettings, Capturer, DiagnosticReport, LocatedPost,
    RetryPolicy, LOGIN_FLOW_PATH, STATUS_PAGE_FALLBACK_CHARS,
};
pub use config::{ConfigError, GeneratorConfig, LlmConfig, DEFAULT_POSTS_PER_DAY, DEFAULT_TIMEZONE};
pub use decode::{decode_page, DecodedPage};
pub use extract::{
    collect_unique_posts, extract_long_article, snapshot_feed, FeedArticle, StatusLink, FEED_ARTICLE_SELECTOR,
    MIN_ARTICLE_CHARS,
};
pub use feeds::{add_feed_seeds, add_rss_seeds, fetch_feed_entries, parse_feed_entries, FeedEntry, FeedError};
pub use fetch::{FailureKind, FetchError, FetchMetadata, FetchOutput, FetchSettings, Fetcher, ReqwestFetcher};
pub use knowledge::append_kb_entry;
pub use llm::{generate_or_empty, run_llm_command, LlmError, LLM_TIMEOUT};
pub use media::{media_file_name, MediaDownloader};
pub use metadata::{fetch_page_metadata, parse_page_metadata, PageMetadata};
pub use notion::{page_payload, NotionClient, NotionConfig, NotionError, NOTION_API_URL, NOTION_VERSION};
pub use paths::WorkspacePaths;
pub use persist::{ensure_dir, read_optional, write_file, AtomicFileWriter, PersistError};
pub use store::{load_capture, load_queue, save_queue, CaptureStore, SavedCapture, StoreError};
pub use workflows::WorkflowError;
