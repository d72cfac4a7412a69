//! Pipeline stages for one tailer run.
//!
//! - `parse`: feed text → ordered records
//! - `diff`: drop records already emitted by a previous run
//! - `run`: wire fetch, parse, diff, emit and cursor save together

pub mod diff;
pub mod parse;
pub mod run;

pub use diff::records_after;
pub use parse::{KpFeed, parse_feed};
pub use run::{RunSummary, emit_new, run_once};
