//! Integration tests: layer store + history + persistence bridge.
//!
//! Drives the store through whole editing sessions and checks the history
//! log and the saved slot stay consistent with the live document.

use ado_core::*;
use pretty_assertions::assert_eq;

const KEY: &str = "adomate-design";

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn store() -> LayerStore {
    init_logs();
    LayerStore::new(CanvasState::default(), &ComposerConfig::default())
}

fn z_set(state: &CanvasState) -> Vec<usize> {
    let mut z: Vec<usize> = state.layers.iter().map(|l| l.z_index).collect();
    z.sort_unstable();
    z
}

// ─── Store sessions ──────────────────────────────────────────────────────

#[test]
fn every_effective_mutation_is_one_history_entry() {
    let mut s = store();
    let a = s.add_layer(LayerPatch::default()); // 2
    let b = s.duplicate_layer(a).unwrap(); // 3
    s.update_layer(b, LayerPatch::position(0.0, 0.0)).unwrap(); // 4
    s.reorder_layer(b, ReorderDirection::Down).unwrap(); // 5
    s.delete_layer(a).unwrap(); // 6
    assert_eq!(s.history().len(), 6);
    assert_eq!(s.history().cursor(), 5);

    // No-ops add nothing.
    s.reorder_layer(b, ReorderDirection::Up);
    s.update_layer(b, LayerPatch::position(0.0, 0.0));
    s.delete_layer(a);
    assert_eq!(s.history().len(), 6);
}

#[test]
fn z_indices_stay_dense_across_a_session() {
    let mut s = store();
    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(s.add_layer(LayerPatch::default()));
    }
    s.duplicate_layer(ids[2]).unwrap();
    s.delete_layer(ids[0]).unwrap();
    s.reorder_layer(ids[4], ReorderDirection::Down).unwrap();
    s.delete_layer(ids[3]).unwrap();
    s.undo();
    s.reorder_layer(ids[1], ReorderDirection::Up).unwrap();

    for snapshot in s.history().snapshots() {
        let n = snapshot.layers.len();
        assert_eq!(z_set(snapshot), (0..n).collect::<Vec<_>>());
        assert!(snapshot.is_densely_indexed());
    }
}

#[test]
fn history_window_keeps_latest_twenty_five() {
    let mut s = store();
    let id = s.add_layer(LayerPatch::default());
    for i in 0..40 {
        s.update_layer(id, LayerPatch::position(i as f64, 0.0)).unwrap();
    }
    assert_eq!(s.history().len(), 25);
    assert_eq!(s.layer(id).unwrap().x, 39.0);
    // Oldest retained snapshot is the one written by the 16th update.
    assert_eq!(s.history().snapshots()[0].layers[0].x, 15.0);
}

#[test]
fn undo_then_edit_drops_redo_branch() {
    let mut s = store();
    let a = s.add_layer(LayerPatch::default());
    s.update_layer(a, LayerPatch::position(1.0, 1.0)).unwrap();
    s.update_layer(a, LayerPatch::position(2.0, 2.0)).unwrap();
    s.undo().unwrap();
    s.undo().unwrap();
    s.update_layer(a, LayerPatch::position(9.0, 9.0)).unwrap();
    assert!(!s.history().can_redo());
    assert_eq!(s.redo(), None);
    assert_eq!(s.layer(a).unwrap().x, 9.0);
    assert_eq!(s.history().len(), 3);
}

#[test]
fn past_snapshots_are_not_mutated_by_later_edits() {
    let mut s = store();
    let a = s.add_layer(LayerPatch::default());
    let before = s.history().snapshots().to_vec();
    s.update_layer(
        a,
        LayerPatch {
            text: Some("changed".into()),
            ..LayerPatch::default()
        },
    )
    .unwrap();
    assert_eq!(&s.history().snapshots()[..2], before.as_slice());
}

// ─── Persistence ─────────────────────────────────────────────────────────

#[test]
fn saved_fixture_loads_normalized() {
    init_logs();
    let mut storage = MemoryStorage::new();
    storage.seed(KEY, include_str!("fixtures/saved_design.json"));
    let bridge = PersistenceBridge::new(storage, KEY, 2000.0);

    let state = bridge.load().expect("fixture should load");
    assert_eq!(state.canvas_height, 533.0);
    assert_eq!(state.layers.len(), 2);
    // Stored out of paint order; loading sorts by zIndex.
    assert_eq!(state.layers[0].text, "Up to 50% off");
    assert_eq!(state.layers[0].letter_spacing, 0.0);
    assert_eq!(state.layers[1].font_weight, FontWeight::Bold);
    assert_eq!(state.layers[1].alignment, Alignment::Center);
    assert!(state.is_densely_indexed());
}

#[test]
fn store_state_survives_save_and_load() {
    let mut s = store();
    let a = s.add_layer(LayerPatch {
        text: Some("Line one\nLine two".into()),
        shadow: Some(Some(Shadow {
            color: "rgba(0,0,0,0.5)".into(),
            blur: 4.0,
            offset_x: 2.0,
            offset_y: 3.0,
        })),
        ..LayerPatch::default()
    });
    s.duplicate_layer(a).unwrap();

    let mut bridge = PersistenceBridge::new(MemoryStorage::new(), KEY, 2000.0);
    bridge.schedule(s.state().clone(), 0.0);
    assert!(bridge.poll(2000.0).unwrap());

    let raw = bridge.storage().get(KEY).unwrap().to_string();
    assert!(!raw.contains("selected"));
    assert_eq!(bridge.load().as_ref(), Some(s.state()));
}

#[test]
fn restored_ids_are_never_reissued() {
    init_logs();
    let mut storage = MemoryStorage::new();
    storage.seed(KEY, include_str!("fixtures/saved_design.json"));
    let restored = PersistenceBridge::new(storage, KEY, 2000.0).load().unwrap();

    let mut s = LayerStore::new(restored.clone(), &ComposerConfig::default());
    for _ in 0..10 {
        let id = s.add_layer(LayerPatch::default());
        assert!(restored.layer(id).is_none());
    }
}
