//! Feed text parsing.
//!
//! Turns the raw nowcast file body into an ordered sequence of records.
//! Comment and blank lines are skipped; a malformed data line fails the
//! whole parse rather than being dropped.

use crate::error::{AppError, Result};
use crate::models::{KpRecord, Status};

/// Parsed content of a Kp/ap feed download.
#[derive(Debug, Clone, Default)]
pub struct KpFeed {
    /// Records in feed order, strictly ascending by timestamp
    pub records: Vec<KpRecord>,
}

impl KpFeed {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent record, if any.
    pub fn last(&self) -> Option<&KpRecord> {
        self.records.last()
    }

    /// Most recent record already marked definitive.
    pub fn last_definitive(&self) -> Option<&KpRecord> {
        self.records
            .iter()
            .rev()
            .find(|r| r.status == Status::Definitive)
    }
}

/// Parse a feed body into records.
///
/// Placeholder rows for future intervals (`Kp = -1`) are skipped. Records
/// must be strictly ascending by timestamp; a duplicate or out-of-order
/// timestamp indicates a corrupt download and fails the parse.
pub fn parse_feed(text: &str) -> Result<KpFeed> {
    let mut records: Vec<KpRecord> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let record: KpRecord = line.parse()?;
        if record.is_placeholder() {
            continue;
        }

        if let Some(previous) = records.last() {
            if record.timestamp == previous.timestamp {
                return Err(AppError::format(line, "duplicate timestamp"));
            }
            if record.timestamp < previous.timestamp {
                return Err(AppError::format(line, "out-of-order timestamp"));
            }
        }

        records.push(record);
    }

    Ok(KpFeed { records })
}
