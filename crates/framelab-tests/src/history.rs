//! Integration tests for the snapshot history.
//!
//! Exercises framelab-effects output recorded through framelab-history.

use std::sync::Arc;
use std::time::Duration;

use framelab_core::{AdjustmentParams, PixelBuffer};
use framelab_effects::{apply_adjustments, grayscale, Unstoppable};
use framelab_history::codec::{decode, encode};
use framelab_history::{HistoryConfig, HistoryEventKind, HistoryStore};

// ── Helpers ────────────────────────────────────────────────────

fn edit_chain() -> Vec<(String, AdjustmentParams)> {
    (0..4)
        .map(|i| {
            let params = AdjustmentParams::new(i as f32 * 10.0, 0.0, 0.0, i);
            (format!("step {i}"), params)
        })
        .collect()
}

fn record_chain(store: &HistoryStore, base: &PixelBuffer) {
    for (name, params) in edit_chain() {
        let frame = apply_adjustments(base, &params, &Unstoppable).unwrap();
        store.add_state_blocking(&frame, name, params).unwrap();
    }
}

// ── Codec ──────────────────────────────────────────────────────

#[test]
fn codec_preserves_dimensions_of_processed_frames() {
    for (w, h) in [(1, 1), (3, 17), (64, 48), (100, 3)] {
        let frame = grayscale(&PixelBuffer::test_pattern(w, h).unwrap(), &Unstoppable).unwrap();
        let decoded = decode(&encode(&frame).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (w, h));
    }
}

// ── Navigation ─────────────────────────────────────────────────

#[test]
fn undo_walks_back_through_recorded_edits() {
    let store = HistoryStore::new();
    let base = PixelBuffer::test_pattern(32, 24).unwrap();
    record_chain(&store, &base);
    assert_eq!(store.current_index(), Some(3));

    let mut seen = Vec::new();
    while let Some(entry) = store.undo() {
        assert_eq!((entry.buffer.width(), entry.buffer.height()), (32, 24));
        seen.push((entry.description, entry.params.blur_radius));
    }
    assert_eq!(
        seen,
        vec![("step 2".to_string(), 2), ("step 1".to_string(), 1), ("step 0".to_string(), 0)]
    );
    assert_eq!(store.current_index(), Some(0));
    assert!(store.can_redo());
}

#[test]
fn cap_of_twenty_holds_after_many_edits() {
    let store = HistoryStore::new();
    let frame = PixelBuffer::test_pattern(8, 8).unwrap();
    for i in 0..27 {
        store
            .add_state_blocking(&frame, format!("edit {i}"), AdjustmentParams::default())
            .unwrap();
    }
    assert_eq!(store.len(), 20);
    assert_eq!(store.current_index(), Some(19));
    assert_eq!(store.descriptions().len(), 20);
    assert!(store.descriptions()[19].starts_with("▶ 20. edit 26"));
}

#[test]
fn branch_truncation_scenario() {
    let store = HistoryStore::new();
    let frame = PixelBuffer::test_pattern(8, 8).unwrap();
    for name in ["a", "b", "c"] {
        store
            .add_state_blocking(&frame, name, AdjustmentParams::default())
            .unwrap();
    }

    let b = store.undo().unwrap();
    assert_eq!(b.description, "b");
    assert_eq!(store.current_index(), Some(1));

    store
        .add_state_blocking(&frame, "d", AdjustmentParams::default())
        .unwrap();
    let names: Vec<String> = store.summaries().into_iter().map(|s| s.description).collect();
    assert_eq!(names, vec!["a", "b", "d"]);
    assert_eq!(store.current_index(), Some(2));
    assert!(!store.can_redo());
    assert!(store.redo().is_none());
}

// ── Async snapshots & notifications ────────────────────────────

#[test]
fn async_snapshots_notify_subscribers() {
    let store = HistoryStore::with_config(HistoryConfig::with_capacity(4)).unwrap();
    let events = store.subscribe();
    let frame = Arc::new(PixelBuffer::test_pattern(16, 16).unwrap());

    let pending: Vec<_> = (0..6)
        .map(|i| store.add_state(Arc::clone(&frame), format!("async {i}"), AdjustmentParams::default()))
        .collect();
    for p in pending {
        p.wait().unwrap();
    }

    let received: Vec<_> = (0..6)
        .map(|_| events.recv_timeout(Duration::from_secs(5)).unwrap())
        .collect();
    assert!(received.iter().all(|e| e.kind == HistoryEventKind::StateAdded));
    assert_eq!(received.iter().map(|e| e.len).max(), Some(4));
    assert_eq!(store.len(), 4);
    assert_eq!(store.current_index(), Some(3));
}

#[test]
fn fire_and_forget_snapshot_still_commits() {
    let store = HistoryStore::new();
    let events = store.subscribe();
    drop(store.add_state(PixelBuffer::test_pattern(8, 8).unwrap(), "dropped handle", AdjustmentParams::default()));

    let event = events.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(event.kind, HistoryEventKind::StateAdded);
    assert_eq!(event.current_index, Some(0));
    assert_eq!(store.len(), 1);
}

#[test]
fn clear_resets_and_notifies() {
    let store = HistoryStore::new();
    let base = PixelBuffer::test_pattern(16, 16).unwrap();
    record_chain(&store, &base);
    let events = store.subscribe();

    store.clear();
    let event = events.try_recv().unwrap();
    assert_eq!(event.kind, HistoryEventKind::Cleared);
    assert_eq!(event.current_index, None);
    assert_eq!(event.len, 0);
    assert!(!event.can_undo && !event.can_redo);
    assert!(store.undo().is_none());
}
