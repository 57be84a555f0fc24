//! x-ops core: pure data model and text processing, no IO.
mod capture;
mod categorize;
mod chunk;
mod generate;
mod learning;
mod links;
mod queue;
mod render;
mod tutorial;
mod viral;

pub use capture::{ArticleStatus, CaptureRecord, LongArticle, PostSnapshot};
pub use categorize::{
    categorize, category_names, summarize, summarize_with_limit, CATEGORY_RULES, SUMMARY_LIMIT,
    UNCATEGORIZED,
};
pub use chunk::{chunk_text, DEFAULT_CHUNK_CHARS};
pub use generate::{
    build_items, fallback_text, fill_template, lang_for_position, merge_sections, parse_seeds,
    queue_header, SeedItem, SeedSections, POST_CHAR_LIMIT, SECTION_AI_HOTSPOT,
    SECTION_GITHUB_TRENDING, SECTION_OPENCLAW, SECTION_ORDER,
};
pub use learning::{
    kb_marker, render_kb_entry, render_learning_note, score_sentence, split_sentences,
    top_points, DEFAULT_MAX_POINTS, KB_HEADER, KB_POINTS,
};
pub use links::{
    absolute_status_url, clean_text, extract_handle, extract_status_id, infer_github_repo,
    is_platform_media, media_extension, normalize_article_url, normalize_media_url,
    truncate_chars, SITE_ORIGIN,
};
pub use queue::{
    parse_queue, render_queue, QueueError, QueueItem, DEFAULT_HEADER, ITEM_MARKER,
    STATUS_DRAFTED, STATUS_PENDING, STATUS_POSTED,
};
pub use render::{group_by_category, render_batch_note, render_capture_markdown, BatchEntry};
pub use tutorial::{extract_commands, extract_steps, render_tutorial_plan, TutorialPlan, MAX_STEPS};
pub use viral::{detect_structure, infer_hook, render_viral_report, StructureStats, ViralReport};
