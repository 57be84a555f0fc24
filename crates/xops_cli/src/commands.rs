//! One handler per subcommand; each returns the JSON object printed on stdout.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use xops_engine::browser::WebDriverLauncher;
use xops_engine::workflows::{
    analyze, generate_queue, learn_from_capture, load_links, publish_drafts, resolve_capture_path, run_batch,
    write_tutorial_plan, write_viral_report, AnalyzeOptions, BatchOptions, DraftsOptions, GenerateOptions,
    LearnOptions,
};
use xops_engine::{write_file, BrowserCapturer, Capturer, NotionClient, WorkspacePaths};
use xops_logging::xops_info;

use crate::args::{
    AnalyzeArgs, BatchArgs, CaptureArgs, Cli, Command, DraftsArgs, GenerateArgs, LearnArgs, ReportArgs,
    CAPTURE_TIMEOUT_MS,
};

pub async fn dispatch(cli: &Cli, paths: &WorkspacePaths) -> Result<Value> {
    match &cli.command {
        Command::Capture(args) => capture(cli, paths, args).await,
        Command::Learn(args) => learn(paths, args),
        Command::Batch(args) => batch(cli, paths, args).await,
        Command::Tutorial(args) => tutorial(paths, args),
        Command::Viral(args) => viral(paths, args),
        Command::Analyze(args) => analyze_cmd(cli, paths, args).await,
        Command::QueueGenerate(args) => queue_generate(paths, args).await,
        Command::Drafts(args) => drafts(cli, paths, args).await,
    }
}

fn launcher(cli: &Cli) -> Result<WebDriverLauncher> {
    WebDriverLauncher::new(&cli.webdriver).with_context(|| format!("WebDriver endpoint {}", cli.webdriver))
}

async fn capture(cli: &Cli, paths: &WorkspacePaths, args: &CaptureArgs) -> Result<Value> {
    let capturer = BrowserCapturer::new(launcher(cli)?, args.settings(paths), paths.clone());
    let report = capturer.capture(&args.url).await?;

    let record_json = report.record.to_json_pretty()?;
    if let Some(output) = &args.output {
        write_file(output, format!("{record_json}\n"))?;
        xops_info!("Capture copy written to {:?}", output);
    }

    let mut value = serde_json::to_value(&report.record)?;
    if let Value::Object(map) = &mut value {
        map.insert("capture_mode".into(), serde_json::to_value(report.capture_mode)?);
        if let Some(err) = &report.capture_error_headless {
            map.insert("capture_error_headless".into(), json!(err));
        }
        map.insert("capture_json".into(), json!(report.capture_json));
        map.insert("capture_md".into(), json!(report.capture_md));
    }
    Ok(value)
}

fn learn(paths: &WorkspacePaths, args: &LearnArgs) -> Result<Value> {
    let capture = resolve_capture_path(paths, args.capture.as_deref(), args.url.as_deref())?;
    let options = LearnOptions {
        max_points: args.max_points,
        output: args.output.clone(),
        kb: args.kb.clone(),
    };
    Ok(serde_json::to_value(learn_from_capture(paths, &capture, &options)?)?)
}

async fn batch(cli: &Cli, paths: &WorkspacePaths, args: &BatchArgs) -> Result<Value> {
    let links = load_links(&args.links_file)?;
    let options = BatchOptions {
        name: args.name.clone(),
        fetch: args.fetch,
    };
    let notion = args.notion.then(NotionClient::from_env);

    let result = if args.fetch {
        let headless = args.browser.headless_or(false);
        let settings = args.session.settings(&args.browser, headless, CAPTURE_TIMEOUT_MS, paths);
        let capturer = BrowserCapturer::new(launcher(cli)?, settings, paths.clone());
        run_batch(paths, &links, &options, Some(&capturer), notion).await?
    } else {
        run_batch(paths, &links, &options, None, notion).await?
    };
    Ok(serde_json::to_value(result)?)
}

fn tutorial(paths: &WorkspacePaths, args: &ReportArgs) -> Result<Value> {
    let capture = resolve_capture_path(paths, args.capture.as_deref(), args.url.as_deref())?;
    Ok(serde_json::to_value(write_tutorial_plan(paths, &capture, args.output.as_deref())?)?)
}

fn viral(paths: &WorkspacePaths, args: &ReportArgs) -> Result<Value> {
    let capture = resolve_capture_path(paths, args.capture.as_deref(), args.url.as_deref())?;
    Ok(serde_json::to_value(write_viral_report(paths, &capture, args.output.as_deref())?)?)
}

async fn analyze_cmd(cli: &Cli, paths: &WorkspacePaths, args: &AnalyzeArgs) -> Result<Value> {
    let settings = args.settings(paths);
    let options = AnalyzeOptions {
        purpose: args.purpose,
        url: args.url.clone(),
        links_file: args.links_file.clone(),
        browser: settings.browser,
        headless: settings.headless,
        proxy: settings.proxy.clone(),
    };
    let capturer = BrowserCapturer::new(launcher(cli)?, settings, paths.clone());
    let notion = args.notion.then(NotionClient::from_env);
    Ok(serde_json::to_value(analyze(paths, &options, &capturer, notion).await?)?)
}

async fn queue_generate(paths: &WorkspacePaths, args: &GenerateArgs) -> Result<Value> {
    let options = GenerateOptions {
        date: args.date.clone(),
        limit: args.limit,
        queue: args.queue.clone(),
        seeds: args.seeds.clone(),
        config: args.config.clone(),
    };
    Ok(serde_json::to_value(generate_queue(paths, &options).await?)?)
}

async fn drafts(cli: &Cli, paths: &WorkspacePaths, args: &DraftsArgs) -> Result<Value> {
    let options = DraftsOptions {
        queue: args.queue.clone(),
        limit: args.limit,
        browser: args.browser,
        headless: args.headless,
        mark: args.mark,
        debug: args.debug,
    };
    Ok(serde_json::to_value(publish_drafts(&launcher(cli)?, paths, &options).await?)?)
}
