// src/pipeline/run.rs

//! One-shot pipeline run: fetch → parse → diff → emit → save cursor.

use std::io::Write;

use crate::error::Result;
use crate::models::{Config, OutputConfig};
use crate::pipeline::{KpFeed, parse_feed, records_after};
use crate::storage::{Cursor, CursorStore};
use crate::utils::http;

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Records parsed from the feed (placeholders excluded)
    pub parsed: usize,

    /// Records emitted this run
    pub emitted: usize,

    /// Cursor position after the run
    pub cursor: Option<Cursor>,
}

/// Stream records newer than the cursor to the writer.
///
/// Each line is written as soon as it is formatted, so output already
/// written survives a late failure further down the feed. Returns the
/// emitted count and the advanced cursor (unchanged when nothing was new).
pub fn emit_new(
    feed: &KpFeed,
    cursor: Option<Cursor>,
    output: &OutputConfig,
    out: &mut dyn Write,
) -> Result<(usize, Option<Cursor>)> {
    let since = cursor.map(|c| c.last_emitted);
    let fresh = records_after(&feed.records, since);

    for record in fresh {
        let line = record.to_measurement(output).to_line(output.precision)?;
        writeln!(out, "{line}")?;
    }

    let advanced = fresh.last().map(|r| Cursor::new(r.timestamp)).or(cursor);
    Ok((fresh.len(), advanced))
}

/// Run the full pipeline once against the configured feed URL.
///
/// The cursor is saved only after the emit pass completed and only when it
/// actually moved; a failed run leaves it untouched so the next scheduled
/// invocation picks the same records up again.
pub async fn run_once(
    config: &Config,
    store: &dyn CursorStore,
    out: &mut dyn Write,
    dry_run: bool,
) -> Result<RunSummary> {
    let client = http::create_client(&config.fetch)?;

    log::info!("Fetching {}", config.fetch.url);
    let body = http::fetch_text(&client, &config.fetch.url).await?;
    log::debug!("Fetched {} bytes", body.len());

    let feed = parse_feed(&body)?;
    log::info!("Parsed {} records", feed.len());

    let cursor = store.load().await?;
    match &cursor {
        Some(c) => log::debug!("Cursor at {}", c.last_emitted),
        None => log::info!("No cursor found, first run emits the whole feed"),
    }

    let (emitted, advanced) = emit_new(&feed, cursor, &config.output, out)?;
    out.flush()?;

    if emitted == 0 {
        log::info!("No new records since last run");
    } else {
        log::info!("Emitted {emitted} new records");
    }

    if dry_run {
        log::info!("Dry run, cursor not saved");
    } else if emitted > 0 {
        if let Some(c) = &advanced {
            store.save(c).await?;
            log::debug!("Cursor saved at {}", c.last_emitted);
        }
    }

    Ok(RunSummary {
        parsed: feed.len(),
        emitted,
        cursor: advanced,
    })
}
