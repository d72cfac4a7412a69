//! kptail CLI
//!
//! Designed to run as a periodic batch job under an external scheduler
//! (e.g. Telegraf's `exec` input): new records go to stdout, diagnostics
//! to stderr, exit code is non-zero on any failure.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kptail::{
    error::Result,
    models::Config,
    pipeline,
    storage::{CursorStore, FileCursorStore},
    utils::http,
};

/// kptail - Kp/ap feed tailer
#[derive(Parser, Debug)]
#[command(
    name = "kptail",
    version,
    about = "Tails the GFZ Kp/ap feed into InfluxDB line protocol"
)]
struct Cli {
    /// Path to storage directory containing config and cursor files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the feed and emit new records as line protocol
    Run {
        /// Path to cursor file (default: {storage_dir}/cursor.json)
        #[arg(long)]
        cursor: Option<PathBuf>,

        /// Emit without saving the cursor
        #[arg(long)]
        dry_run: bool,
    },

    /// Fetch and parse the feed, log a diagnostic summary
    Show,

    /// Validate the configuration file
    Validate,

    /// Show storage paths and current cursor state
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    let cursor_path = cli.storage_dir.join("cursor.json");

    match cli.command {
        Command::Run { cursor, dry_run } => {
            let store = FileCursorStore::new(cursor.unwrap_or(cursor_path));
            let stdout = std::io::stdout();
            let mut out = stdout.lock();

            let summary = pipeline::run_once(&config, &store, &mut out, dry_run).await?;
            log::info!(
                "Done: {}/{} records emitted",
                summary.emitted,
                summary.parsed
            );
        }

        Command::Show => {
            let client = http::create_client(&config.fetch)?;
            let body = http::fetch_text(&client, &config.fetch.url).await?;
            let feed = pipeline::parse_feed(&body)?;

            log::info!("{} records in feed", feed.len());
            if let Some(last) = feed.last() {
                log::info!("Latest record: {last}");
            }
            if let Some(last_final) = feed.last_definitive() {
                log::info!("Latest definitive record: {last_final}");
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK ({})", config.fetch.url);
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());

            let store = FileCursorStore::new(&cursor_path);
            log::info!("Cursor file: {}", store.path().display());
            match store.load().await? {
                Some(cursor) => {
                    log::info!("Cursor: last emitted {}", cursor.last_emitted);
                    log::info!("Last updated: {}", cursor.updated_at);
                }
                None => log::info!("No cursor found yet."),
            }
        }
    }

    Ok(())
}
