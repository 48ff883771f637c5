//! stagesync - sync the published game documents from the mirrors and print
//! today's stages, tips and mini games.
//!
//! Runs one sync pass by default. `--watch` keeps resyncing at each server
//! day boundary.

use std::io;
use std::path::Path;

use anyhow::{bail, Result};
use chrono::Utc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stagesync_core::models::MergedStageEntry;
use stagesync_core::region::STAGE_ACTIVITY_PATH;
use stagesync_core::schedule::next_resync_delay;
use stagesync_core::{
    namespace_for, FetchClient, ItemIndex, MergeEngine, Namespace, ResourceSync, SyncConfig,
    VersionGate,
};

// ============================================================================
// Constants
// ============================================================================

/// File name prefix of the daily rolling log
const LOG_FILE_PREFIX: &str = "stagesync.log";

const USAGE: &str = "\
Usage: stagesync [COMMAND]

Commands:
  (none)            Sync once and print today's stages
  --stage CODE      Sync once and print what is known about one stage
  --watch           Sync at every server day boundary until interrupted
  --clear-cache     Delete cached documents and validators
  --help            Show this message

Environment:
  RUST_LOG            Log filter (default: warn)
  STAGESYNC_MIRRORS   Comma separated mirror base URLs
  STAGESYNC_CLIENT    Client type (Official, Bilibili, YoStarEN, ...)";

type Engine = MergeEngine<ResourceSync<FetchClient>>;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Sync,
    Stage(String),
    Watch,
    ClearCache,
    Help,
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args {
        [] => Ok(Command::Sync),
        [flag] if flag == "--watch" => Ok(Command::Watch),
        [flag] if flag == "--clear-cache" => Ok(Command::ClearCache),
        [flag] if flag == "--help" || flag == "-h" => Ok(Command::Help),
        [flag, code] if flag == "--stage" => Ok(Command::Stage(code.clone())),
        [flag] if flag == "--stage" => bail!("--stage needs a stage code"),
        other => bail!("Unrecognized arguments: {}\n\n{}", other.join(" "), USAGE),
    }
}

/// Initialize the tracing subscriber for logging.
/// Returns the file writer guard, which must live until exit.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = SyncConfig::load()?;
    config.apply_env();

    let _log_guard = init_tracing(config.log_dir.as_deref());
    info!(client = %config.client_type, mirrors = config.mirrors.len(), "stagesync starting");

    let sync = ResourceSync::from_config(&config)?;
    if command == Command::ClearCache {
        sync.invalidate_cache();
        println!("Cache cleared");
        return Ok(());
    }

    let items = config
        .resource_dir
        .as_deref()
        .map(ItemIndex::load_from_dir)
        .unwrap_or_default();
    let gate = VersionGate::new(config.core_version.as_deref());
    let namespace = namespace_for(&config.client_type);
    let engine = MergeEngine::new(sync, gate, items);

    match command {
        Command::Stage(code) => {
            sync_once(&engine, &namespace).await;
            print_stage(&engine.get_merged_stage(&code), engine.contains_stage(&code));
        }
        Command::Watch => loop {
            sync_once(&engine, &namespace).await;
            print_today(&engine);

            let delay = next_resync_delay(Utc::now());
            info!(delay_secs = delay.as_secs(), "Next sync scheduled");
            tokio::time::sleep(delay).await;
        },
        _ => {
            sync_once(&engine, &namespace).await;
            print_today(&engine);
        }
    }

    info!("stagesync shutting down");
    Ok(())
}

async fn sync_once(engine: &Engine, namespace: &Namespace) {
    let report = engine.refresh(namespace).await;
    let sync = engine.source();

    if !report.activity_loaded {
        eprintln!("Activity schedule unavailable, showing permanent stages only");
    }
    for path in &report.tasks_missing {
        eprintln!("Task document unavailable: {}", path);
    }
    for path in namespace.task_paths.iter().filter(|p| !report.tasks_missing.contains(*p)) {
        eprintln!("Task document: {}", sync.document_path(path).display());
    }
    info!(
        activity = %sync.document_path(STAGE_ACTIVITY_PATH).display(),
        merged = report.merged_stages,
        "Documents ready"
    );
}

fn print_today(engine: &Engine) {
    let tips = engine.get_today_tips();
    if !tips.is_empty() {
        println!("Today");
        for tip in &tips {
            println!("  {}", tip);
        }
        println!();
    }

    for group in engine.stage_groups(true) {
        match &group.days_left_text {
            Some(days) => println!("{} ({} left)", group.title, days),
            None => println!("{}", group.title),
        }
        for stage in &group.stages {
            if stage.code.is_empty() {
                println!("  {}", stage.display_name);
            } else {
                println!("  {:<14} {}", stage.code, stage.display_name);
            }
        }
        println!();
    }

    let games = engine.mini_games(true);
    if !games.is_empty() {
        println!("Mini games");
        for game in &games {
            let flag = if game.is_unsupported { " (unsupported)" } else { "" };
            println!("  {:<28} {}{}", game.value, game.display, flag);
        }
    }
}

fn print_stage(entry: &MergedStageEntry, known: bool) {
    let now = Utc::now();
    let weekday = stagesync_core::schedule::server_weekday(now);

    println!("{} ({})", entry.display_name, entry.code);
    if !known {
        println!("  not in the current catalog");
    }
    println!(
        "  open today: {}",
        if entry.is_open(weekday, now) { "yes" } else { "no" }
    );
    if !entry.open_days.is_empty() {
        let days: Vec<String> = entry.open_days.iter().map(|d| d.to_string()).collect();
        println!("  open days: {}", days.join(", "));
    }
    if let Some(window) = &entry.window {
        println!(
            "  window: {} {} - {}",
            window.name,
            window.start.format("%Y-%m-%d %H:%M UTC"),
            window.end.format("%Y-%m-%d %H:%M UTC")
        );
    }
    if let Some(drop) = &entry.drop {
        println!("  drop: {}", drop);
    }
    if !entry.tip.is_empty() {
        println!("  tip: {}", entry.tip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(parse_args(&args(&[])).unwrap(), Command::Sync);
        assert_eq!(parse_args(&args(&["--watch"])).unwrap(), Command::Watch);
        assert_eq!(parse_args(&args(&["--clear-cache"])).unwrap(), Command::ClearCache);
        assert_eq!(parse_args(&args(&["-h"])).unwrap(), Command::Help);
        assert_eq!(
            parse_args(&args(&["--stage", "CE-6"])).unwrap(),
            Command::Stage("CE-6".to_string())
        );
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&args(&["--stage"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert!(parse_args(&args(&["--watch", "extra"])).is_err());
    }
}
