//! In-memory cursor storage.
//!
//! A fake store for tests and dry wiring; nothing survives the process.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::storage::{Cursor, CursorStore};

/// Volatile cursor store.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    cursor: Mutex<Option<Cursor>>,
}

impl MemoryCursorStore {
    /// Create an empty store (first-run state).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a cursor.
    pub fn with_cursor(cursor: Cursor) -> Self {
        Self {
            cursor: Mutex::new(Some(cursor)),
        }
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn load(&self) -> Result<Option<Cursor>> {
        Ok(*self.cursor.lock().unwrap())
    }

    async fn save(&self, cursor: &Cursor) -> Result<()> {
        *self.cursor.lock().unwrap() = Some(*cursor);
        Ok(())
    }
}
