//! Change detection against the persisted cursor.
//!
//! The feed always re-serves its full history window, so each run has to
//! work out which tail of the file it has not emitted yet. Records are
//! strictly ascending by timestamp (the parser guarantees it), which makes
//! the diff a suffix lookup.

use chrono::{DateTime, Utc};

use crate::models::KpRecord;

/// Records strictly newer than the cursor, in feed order.
///
/// An absent cursor means a first run and yields the full sequence. A
/// record whose timestamp equals the cursor was emitted by a previous run
/// and is excluded.
pub fn records_after(records: &[KpRecord], cursor: Option<DateTime<Utc>>) -> &[KpRecord] {
    match cursor {
        None => records,
        Some(cursor) => {
            let start = records.partition_point(|r| r.timestamp <= cursor);
            &records[start..]
        }
    }
}
