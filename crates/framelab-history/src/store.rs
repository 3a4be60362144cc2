//! Bounded, branch-truncating undo/redo log of compressed snapshots.
//!
//! Every mutation runs its whole read-modify-write under one mutex, so no
//! caller ever observes a partially truncated or partially appended log.
//! Observers are notified after that lock has been released.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use crossbeam_channel::{Receiver, Sender};
use framelab_core::{AdjustmentParams, FrameLabError, PixelBuffer, Result, SharedPixelBuffer};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::codec::SnapshotCodec;
use crate::config::HistoryConfig;
use crate::entry::{DecodedEntry, EntrySummary, HistoryEntry};
use crate::observer::{HistoryEvent, HistoryEventKind, HistoryObserver};

/// Snapshot history shared between the editing thread and snapshot workers.
///
/// Cloning is cheap and yields a handle to the same log.
#[derive(Clone)]
pub struct HistoryStore {
    inner: Arc<Inner>,
}

struct Inner {
    timeline: Mutex<Timeline>,
    listeners: Mutex<Listeners>,
    codec: SnapshotCodec,
    capacity: usize,
}

#[derive(Default)]
struct Listeners {
    observer: Option<Arc<dyn HistoryObserver>>,
    subscribers: Vec<Sender<HistoryEvent>>,
}

#[derive(Default)]
struct Timeline {
    entries: VecDeque<HistoryEntry>,
    current: Option<usize>,
    next_sequence: u64,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Back,
    Forward,
}

impl Direction {
    fn kind(self) -> HistoryEventKind {
        match self {
            Self::Back => HistoryEventKind::Undone,
            Self::Forward => HistoryEventKind::Redone,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Back => "undo",
            Self::Forward => "redo",
        }
    }
}

impl Timeline {
    fn can_undo(&self) -> bool {
        matches!(self.current, Some(i) if i > 0)
    }

    fn can_redo(&self) -> bool {
        matches!(self.current, Some(i) if i + 1 < self.entries.len())
    }

    fn target(&self, direction: Direction) -> Option<usize> {
        match direction {
            Direction::Back if self.can_undo() => self.current.map(|i| i - 1),
            Direction::Forward if self.can_redo() => self.current.map(|i| i + 1),
            _ => None,
        }
    }

    fn event(&self, kind: HistoryEventKind) -> HistoryEvent {
        HistoryEvent {
            kind,
            current_index: self.current,
            len: self.entries.len(),
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }
}

/// Handle to a snapshot queued by [`HistoryStore::add_state`].
///
/// Dropping it does not cancel the snapshot.
pub struct PendingState {
    rx: Receiver<Result<usize>>,
}

impl PendingState {
    /// Block until the snapshot is committed. Returns the entry's index at
    /// commit time.
    pub fn wait(self) -> Result<usize> {
        self.rx
            .recv()
            .map_err(|_| FrameLabError::Encoder("snapshot worker exited without a result".into()))?
    }

    /// The outcome, if the snapshot has finished.
    pub fn try_wait(&self) -> Option<Result<usize>> {
        self.rx.try_recv().ok()
    }
}

impl HistoryStore {
    /// Store with the default capacity of 20 and default codec settings.
    pub fn new() -> Self {
        Self::build(HistoryConfig::default())
    }

    pub fn with_config(config: HistoryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: HistoryConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                timeline: Mutex::new(Timeline::default()),
                listeners: Mutex::new(Listeners::default()),
                codec: SnapshotCodec::new(config.codec),
                capacity: config.capacity,
            }),
        }
    }

    /// Record a snapshot without blocking the caller.
    ///
    /// Encoding and the log update run on the rayon pool.
    pub fn add_state(
        &self,
        buffer: impl Into<SharedPixelBuffer>,
        description: impl Into<String>,
        params: AdjustmentParams,
    ) -> PendingState {
        let buffer = buffer.into();
        let description = description.into();
        let inner = Arc::clone(&self.inner);
        let (tx, rx) = crossbeam_channel::bounded(1);

        rayon::spawn(move || {
            let result = inner.commit(&buffer, description, params);
            if let Err(e) = &result {
                warn!(error = %e, "Snapshot was not recorded");
            }
            // The caller may have dropped the handle.
            let _ = tx.send(result);
        });

        PendingState { rx }
    }

    /// Record a snapshot on the calling thread.
    pub fn add_state_blocking(
        &self,
        buffer: &PixelBuffer,
        description: impl Into<String>,
        params: AdjustmentParams,
    ) -> Result<usize> {
        self.inner.commit(buffer, description.into(), params)
    }

    /// Step back one entry. Returns `None` when there is nothing to undo or
    /// the target entry cannot be decoded; the position is then unchanged.
    pub fn undo(&self) -> Option<DecodedEntry> {
        self.inner.navigate(Direction::Back)
    }

    /// Step forward one entry, with the same failure policy as [`undo`](Self::undo).
    pub fn redo(&self) -> Option<DecodedEntry> {
        self.inner.navigate(Direction::Forward)
    }

    /// Like [`undo`](Self::undo), reporting why nothing was returned.
    pub fn try_undo(&self) -> Result<DecodedEntry> {
        self.inner.step(Direction::Back)
    }

    pub fn try_redo(&self) -> Result<DecodedEntry> {
        self.inner.step(Direction::Forward)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let event = {
            let mut timeline = self.inner.timeline.lock();
            let dropped = timeline.entries.len();
            timeline.entries.clear();
            timeline.current = None;
            info!(dropped, "History cleared");
            timeline.event(HistoryEventKind::Cleared)
        };
        self.inner.notify(event);
    }

    /// One display line per entry, oldest first, with a marker on the
    /// current entry.
    pub fn descriptions(&self) -> Vec<String> {
        let timeline = self.inner.timeline.lock();
        timeline
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| entry.describe(i, timeline.current == Some(i)))
            .collect()
    }

    pub fn summaries(&self) -> Vec<EntrySummary> {
        let timeline = self.inner.timeline.lock();
        timeline
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| entry.summary(i, timeline.current == Some(i)))
            .collect()
    }

    pub fn can_undo(&self) -> bool {
        self.inner.timeline.lock().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.inner.timeline.lock().can_redo()
    }

    /// Index of the current entry; `None` when the log is empty.
    pub fn current_index(&self) -> Option<usize> {
        self.inner.timeline.lock().current
    }

    pub fn len(&self) -> usize {
        self.inner.timeline.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.timeline.lock().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Total compressed bytes held by the log.
    pub fn compressed_size(&self) -> usize {
        self.inner
            .timeline
            .lock()
            .entries
            .iter()
            .map(|e| e.data.len())
            .sum()
    }

    /// Install the observer notified after every committed mutation,
    /// replacing any previous one.
    pub fn set_observer(&self, observer: impl HistoryObserver + 'static) {
        self.inner.listeners.lock().observer = Some(Arc::new(observer));
    }

    pub fn clear_observer(&self) {
        self.inner.listeners.lock().observer = None;
    }

    /// Channel receiving every change event from now on. Dropping the
    /// receiver unsubscribes.
    pub fn subscribe(&self) -> Receiver<HistoryEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.inner.listeners.lock().subscribers.push(tx);
        rx
    }

    #[cfg(test)]
    pub(crate) fn corrupt_entry(&self, index: usize) {
        let mut timeline = self.inner.timeline.lock();
        if let Some(entry) = timeline.entries.get_mut(index) {
            entry.data.clear();
        }
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let timeline = self.inner.timeline.lock();
        f.debug_struct("HistoryStore")
            .field("len", &timeline.entries.len())
            .field("current", &timeline.current)
            .field("capacity", &self.inner.capacity)
            .finish()
    }
}

impl Inner {
    /// Encode, truncate the redo branch, append, evict, advance. Encoding
    /// happens first so a failure leaves the log untouched.
    fn commit(&self, buffer: &PixelBuffer, description: String, params: AdjustmentParams) -> Result<usize> {
        let (index, event) = {
            let mut timeline = self.timeline.lock();

            let data = self.codec.encode(buffer)?;
            if data.is_empty() {
                return Err(FrameLabError::Encoder("codec produced an empty snapshot".into()));
            }

            let timeline = &mut *timeline;
            match timeline.current {
                Some(current) => {
                    let discarded = timeline.entries.len() - (current + 1);
                    if discarded > 0 {
                        timeline.entries.truncate(current + 1);
                        debug!(discarded, "Redo branch truncated");
                    }
                }
                None => timeline.entries.clear(),
            }

            let sequence = timeline.next_sequence;
            timeline.next_sequence += 1;
            timeline.entries.push_back(HistoryEntry {
                sequence,
                data,
                description,
                timestamp: Utc::now(),
                params,
                width: buffer.width(),
                height: buffer.height(),
            });

            while timeline.entries.len() > self.capacity {
                if let Some(evicted) = timeline.entries.pop_front() {
                    debug!(sequence = evicted.sequence, "Oldest snapshot evicted");
                }
            }

            let index = timeline.entries.len() - 1;
            timeline.current = Some(index);
            info!(
                sequence,
                index,
                len = timeline.entries.len(),
                width = buffer.width(),
                height = buffer.height(),
                "Snapshot recorded"
            );
            (index, timeline.event(HistoryEventKind::StateAdded))
        };

        self.notify(event);
        Ok(index)
    }

    fn navigate(&self, direction: Direction) -> Option<DecodedEntry> {
        match self.step(direction) {
            Ok(entry) => Some(entry),
            Err(FrameLabError::InvalidArgument(_)) => None,
            Err(e) => {
                warn!(error = %e, action = direction.verb(), "Skipped unreadable snapshot; position unchanged");
                None
            }
        }
    }

    /// Move one entry in `direction`. The pointer only moves once the target
    /// has been decoded successfully.
    fn step(&self, direction: Direction) -> Result<DecodedEntry> {
        let (decoded, event) = {
            let mut timeline = self.timeline.lock();
            let target = timeline.target(direction).ok_or_else(|| {
                FrameLabError::InvalidArgument(format!("nothing to {}", direction.verb()))
            })?;

            let entry = &timeline.entries[target];
            let decoded = DecodedEntry {
                index: target,
                buffer: self.decode_entry(entry)?,
                description: entry.description.clone(),
                params: entry.params,
                timestamp: entry.timestamp,
            };

            timeline.current = Some(target);
            debug!(index = target, action = direction.verb(), "History position moved");
            (decoded, timeline.event(direction.kind()))
        };

        self.notify(event);
        Ok(decoded)
    }

    fn decode_entry(&self, entry: &HistoryEntry) -> Result<PixelBuffer> {
        if entry.data.is_empty() {
            return Err(FrameLabError::CorruptEntry(format!(
                "snapshot {} has no data",
                entry.sequence
            )));
        }
        let buffer = self.codec.decode(&entry.data)?;
        if (buffer.width(), buffer.height()) != (entry.width, entry.height) {
            return Err(FrameLabError::CorruptEntry(format!(
                "snapshot {} decoded to {}x{}, recorded as {}x{}",
                entry.sequence,
                buffer.width(),
                buffer.height(),
                entry.width,
                entry.height
            )));
        }
        Ok(buffer)
    }

    fn notify(&self, event: HistoryEvent) {
        let observer = {
            let mut listeners = self.listeners.lock();
            listeners.subscribers.retain(|tx| tx.send(event).is_ok());
            listeners.observer.clone()
        };
        if let Some(observer) = observer {
            observer.on_history_changed(&event);
        }
    }
}
