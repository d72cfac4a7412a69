//! Cursor persistence.
//!
//! The only state carried between invocations is the cursor: the timestamp
//! of the last record successfully emitted. It is loaded once at the start
//! of a run and overwritten once at the end; the storage medium is a
//! pluggable collaborator behind [`CursorStore`].

pub mod local;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

// Re-export for convenience
pub use local::FileCursorStore;
pub use memory::MemoryCursorStore;

/// Identity of the last record emitted by a previous run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    /// Timestamp of the last emitted record
    pub last_emitted: DateTime<Utc>,

    /// When this cursor was written
    pub updated_at: DateTime<Utc>,
}

impl Cursor {
    pub fn new(last_emitted: DateTime<Utc>) -> Self {
        Self {
            last_emitted,
            updated_at: Utc::now(),
        }
    }
}

/// Trait for cursor storage backends.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Load the persisted cursor. `None` means no run has completed yet.
    async fn load(&self) -> Result<Option<Cursor>>;

    /// Persist the cursor after a successful emit pass.
    async fn save(&self, cursor: &Cursor) -> Result<()>;
}
