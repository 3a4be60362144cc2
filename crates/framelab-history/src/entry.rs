//! History entries and the views handed to callers.

use chrono::{DateTime, Local, Utc};
use framelab_core::{AdjustmentParams, PixelBuffer};
use serde::{Deserialize, Serialize};

/// One compressed snapshot in the history log. Never mutated after it is
/// appended.
#[derive(Debug, Clone)]
pub(crate) struct HistoryEntry {
    pub sequence: u64,
    pub data: Vec<u8>,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub params: AdjustmentParams,
    pub width: u32,
    pub height: u32,
}

impl HistoryEntry {
    pub fn summary(&self, index: usize, current: bool) -> EntrySummary {
        EntrySummary {
            index,
            sequence: self.sequence,
            description: self.description.clone(),
            timestamp: self.timestamp,
            params: self.params,
            width: self.width,
            height: self.height,
            compressed_bytes: self.data.len(),
            current,
        }
    }

    /// Display line: marker, 1-based position, description, local time.
    pub fn describe(&self, index: usize, current: bool) -> String {
        let marker = if current { "▶" } else { " " };
        format!(
            "{marker} {}. {} ({})",
            index + 1,
            self.description,
            self.timestamp.with_timezone(&Local).format("%H:%M:%S")
        )
    }
}

/// A snapshot decoded back into pixels by undo or redo.
#[derive(Debug, Clone)]
pub struct DecodedEntry {
    /// Position of the entry in the log, which is now the current index.
    pub index: usize,
    pub buffer: PixelBuffer,
    pub description: String,
    pub params: AdjustmentParams,
    pub timestamp: DateTime<Utc>,
}

/// Entry metadata without pixel data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub index: usize,
    /// Monotonic across the store's lifetime, unaffected by eviction.
    pub sequence: u64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub params: AdjustmentParams,
    pub width: u32,
    pub height: u32,
    pub compressed_bytes: usize,
    pub current: bool,
}
