use std::collections::HashMap;
use std::path::PathBuf;

use chrono::Local;
use serde::Serialize;
use xops_core::{build_items, fill_template, merge_sections, parse_seeds, queue_header, SeedItem};
use xops_logging::{xops_debug, xops_info};

use super::WorkflowError;
use crate::config::GeneratorConfig;
use crate::feeds::add_rss_seeds;
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::llm::generate_or_empty;
use crate::metadata::fetch_page_metadata;
use crate::paths::WorkspacePaths;
use crate::persist::read_optional;
use crate::store::save_queue;

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Queue date; defaults to today.
    pub date: Option<String>,
    /// Item count; 0 uses the configured `posts_per_day`.
    pub limit: usize,
    pub queue: Option<PathBuf>,
    pub seeds: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateResult {
    pub queue: PathBuf,
    pub items: usize,
    pub date: String,
}

/// Builds the day's queue from seeds and feeds with default HTTP settings.
pub async fn generate_queue(paths: &WorkspacePaths, options: &GenerateOptions) -> Result<GenerateResult, WorkflowError> {
    let pages = ReqwestFetcher::new(FetchSettings::default());
    let feeds = ReqwestFetcher::new(FetchSettings::for_feeds());
    generate_queue_with(paths, options, &pages, &feeds).await
}

/// Seeds plus feed entries, enriched with page metadata, rendered by the
/// configured command or the section templates, written as the queue file.
pub async fn generate_queue_with(
    paths: &WorkspacePaths,
    options: &GenerateOptions,
    pages: &dyn Fetcher,
    feeds: &dyn Fetcher,
) -> Result<GenerateResult, WorkflowError> {
    let config_path = options.config.clone().unwrap_or_else(|| paths.generator_config());
    let config = GeneratorConfig::load(&config_path)?;
    let limit = if options.limit == 0 {
        config.posts_per_day
    } else {
        options.limit
    };
    let date = options
        .date
        .clone()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string());

    let seeds_path = options.seeds.clone().unwrap_or_else(|| paths.seeds_file());
    let seeds_md = read_optional(&seeds_path)?
        .ok_or_else(|| WorkflowError::Input(format!("Seeds file not found: {}", seeds_path.display())))?;
    let mut sections = parse_seeds(&seeds_md);
    add_rss_seeds(feeds, &mut sections, &config.rss).await;

    let mut seeds = merge_sections(&sections, limit);
    for seed in seeds.iter_mut() {
        let meta = fetch_page_metadata(pages, &seed.url).await;
        if !meta.title.is_empty() {
            seed.title = meta.title;
        }
        if !meta.summary.is_empty() {
            seed.summary = meta.summary;
        }
    }

    let generated = render_with_command(paths, &config, &seeds).await;
    let items = build_items(&seeds, |seed| {
        generated
            .get(&(seed.section.clone(), seed.url.clone()))
            .cloned()
            .unwrap_or_default()
    });

    let queue_path = options.queue.clone().unwrap_or_else(|| paths.queue_file());
    let header = queue_header(&date, &config.timezone, limit);
    let queue = save_queue(&queue_path, &header, &items)?;
    xops_info!("Wrote {} items to {:?}", items.len(), queue);
    Ok(GenerateResult {
        queue,
        items: items.len(),
        date,
    })
}

/// Command output per seed for sections that have a prompt template.
async fn render_with_command(
    paths: &WorkspacePaths,
    config: &GeneratorConfig,
    seeds: &[SeedItem],
) -> HashMap<(String, String), String> {
    let mut generated = HashMap::new();
    let Some(command) = config.llm.command() else {
        return generated;
    };
    let mut templates: HashMap<String, Option<String>> = HashMap::new();
    for seed in seeds {
        if !templates.contains_key(&seed.section) {
            let path = paths.templates_dir().join(format!("{}.txt", seed.section));
            let template = read_optional(&path).ok().flatten().filter(|t| !t.trim().is_empty());
            if template.is_none() {
                xops_debug!("No prompt template at {:?}", path);
            }
            templates.insert(seed.section.clone(), template);
        }
        let Some(Some(template)) = templates.get(&seed.section) else {
            continue;
        };
        let text = generate_or_empty(command, &fill_template(template, seed)).await;
        if !text.is_empty() {
            generated.insert((seed.section.clone(), seed.url.clone()), text);
        }
    }
    generated
}
