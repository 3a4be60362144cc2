//! FrameLab History - compressed undo/redo snapshots
//!
//! Implements the edit history for FrameLab:
//! - A lossy-then-lossless snapshot codec
//! - A bounded, branch-truncating undo/redo log
//! - Change notification through injected observers or channels
//! - JSON-loadable configuration

pub mod codec;
pub mod config;
pub mod entry;
pub mod observer;
pub mod store;

pub use codec::{CodecConfig, SnapshotCodec};
pub use config::{HistoryConfig, DEFAULT_CAPACITY};
pub use entry::{DecodedEntry, EntrySummary};
pub use observer::{HistoryEvent, HistoryEventKind, HistoryObserver};
pub use store::{HistoryStore, PendingState};
