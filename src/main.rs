//! Main entry point for the Ladder Room command line tool
//!
//! Loads a serialized ladder, rebuilds every derived stat from its match
//! history and prints the resulting leaderboard.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use ladder_room::config::AppConfig;
use ladder_room::ladder::{LadderService, LeaderboardEntry};
use ladder_room::recompute::RecomputeReport;
use ladder_room::store::InMemoryLadderStore;
use ladder_room::types::LadderSnapshot;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Output format for the leaderboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Ladder Room - Elo ladder rebuilds for head-to-head matches
#[derive(Parser)]
#[command(
    name = "ladder-room",
    version,
    about = "Rebuild Elo ratings and streaks from a ladder's match history",
    long_about = "Ladder Room replays the full match history of a ladder in chronological order, \
                 recomputing every competitor's Elo rating, streaks and win counts from scratch, \
                 and prints the resulting leaderboard."
)]
struct Args {
    /// Ladder snapshot (JSON with scope, competitors and matches)
    #[arg(value_name = "SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// K-factor override
    #[arg(short, long, value_name = "K", help = "Override the Elo K-factor")]
    k_factor: Option<f64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print the rating change of every replayed match
    #[arg(long)]
    show_history: bool,

    /// Print Prometheus metrics after the rebuild
    #[arg(long)]
    metrics: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without loading a ladder")]
    dry_run: bool,
}

/// JSON document printed with `--format json`
#[derive(Serialize)]
struct JsonOutput<'a> {
    scope: &'a str,
    leaderboard: &'a [LeaderboardEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a RecomputeReport>,
}

/// Initialize structured logging with the configured level
///
/// Logs go to stderr so stdout carries only the leaderboard.
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(k_factor) = args.k_factor {
        config.rating.k_factor = k_factor;
    }

    ladder_room::config::validate_config(&config)?;
    Ok(config)
}

fn read_snapshot(path: &Path) -> Result<LadderSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read ladder snapshot {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid ladder snapshot {}", path.display()))
}

fn print_text(scope: &str, leaderboard: &[LeaderboardEntry], report: Option<&RecomputeReport>) {
    println!("Ladder '{}' - {} competitors", scope, leaderboard.len());
    println!(
        "{:>4}  {:<20} {:>6} {:>5} {:>5} {:>6} {:>6}  {:<12} {}",
        "#", "Name", "Rating", "W", "L", "Streak", "Best", "Tier", "Heat"
    );

    for entry in leaderboard {
        let stats = &entry.competitor.stats;
        println!(
            "{:>4}  {:<20} {:>6} {:>5} {:>5} {:>6} {:>6}  {:<12} {}",
            entry.position,
            entry.competitor.name,
            stats.rating,
            stats.matches_won,
            stats.matches_lost(),
            stats.current_streak,
            stats.max_streak,
            entry.tier,
            entry.heat
        );
    }

    if let Some(report) = report {
        println!();
        println!("Replayed {} matches:", report.applied.len());
        for applied in &report.applied {
            println!(
                "  match {:>5}: {} beat {} (+/-{}) -> {} / {}",
                applied.match_id,
                applied.winner,
                applied.loser,
                applied.delta,
                applied.winner_rating,
                applied.loser_rating
            );
        }
    }
}

async fn run(args: Args, config: AppConfig) -> Result<()> {
    let path = args
        .snapshot
        .as_ref()
        .ok_or_else(|| anyhow!("A ladder snapshot file is required"))?;
    let snapshot = read_snapshot(path)?;
    let scope = snapshot.scope.clone();

    info!(
        "Loaded ladder '{}' with {} competitors and {} matches",
        scope,
        snapshot.competitors.len(),
        snapshot.matches.len()
    );

    let store = Arc::new(InMemoryLadderStore::from_snapshots([snapshot]));
    let service = LadderService::from_config(store, &config)?;

    let report = service.recompute(&scope).await?;
    let leaderboard = service.leaderboard(&scope).await?;
    let history = args.show_history.then_some(&report);

    match args.format {
        OutputFormat::Text => print_text(&scope, &leaderboard, history),
        OutputFormat::Json => {
            let output = JsonOutput {
                scope: &scope,
                leaderboard: &leaderboard,
                report: history,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    if args.metrics {
        println!();
        print!("{}", service.orchestrator().metrics().render()?);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.dry_run {
        info!(
            "Configuration valid - service '{}', K-factor {}, initial rating {}",
            config.service.name, config.rating.k_factor, config.rating.initial_rating
        );
        return Ok(());
    }

    if let Err(e) = run(args, config).await {
        error!("Ladder rebuild failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
