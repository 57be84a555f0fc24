mod args;
mod commands;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use serde_json::{json, Value};
use xops_engine::ensure_dir;
use xops_logging::{xops_error, LogDestination};

use crate::args::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(value) => {
            print_json(&value);
            ExitCode::SUCCESS
        }
        Err(err) => {
            xops_error!("{:#}", err);
            print_json(&json!({ "ok": false, "error": format!("{err:#}") }));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<Value> {
    let paths = cli.paths();
    ensure_dir(paths.data_dir()).context("preparing the workspace data dir")?;

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    xops_logging::initialize(LogDestination::Both(paths.log_file()), level);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting the async runtime")?;
    runtime.block_on(commands::dispatch(cli, &paths))
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => println!("{{\"ok\": false, \"error\": \"{err}\"}}"),
    }
}
