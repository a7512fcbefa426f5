//! Queue persistence through the public API
//!
//! Exercises the on-disk YAML store the way a restart does: draw, save,
//! reload into a fresh scheduler and continue the same shuffle cycle.

use gesture_recorder::scheduler::{
    FileQueueStore, GestureBatchScheduler, PersistedQueueState, QueueStateStore,
};
use gesture_recorder::{GestureId, RecorderError};
use std::collections::HashSet;
use std::path::PathBuf;

fn pool(len: usize) -> Vec<GestureId> {
    (0..len).map(|i| GestureId::new(format!("NUM_{i}"))).collect()
}

fn state_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gesture-recorder-it-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir.join("queue_state.yaml")
}

#[test]
fn restart_resumes_cycle_without_repeats() {
    let path = state_path("resume");
    let mut drawn = HashSet::new();

    let mut first = GestureBatchScheduler::with_seed(FileQueueStore::new(&path), 1);
    first.fill_pool(pool(15));
    drawn.extend(first.draw_batch(5).unwrap().iter().cloned());
    drawn.extend(first.draw_batch(5).unwrap().iter().cloned());
    first.persist().unwrap();

    let yaml = std::fs::read_to_string(&path).unwrap();
    assert!(yaml.contains("ShuffledQueue:"));
    assert!(yaml.contains("GestureMiniBatch:"));

    let mut second = GestureBatchScheduler::with_seed(FileQueueStore::new(&path), 2);
    second.fill_pool(pool(15));
    assert!(second.restore().unwrap());
    assert!(second.reuse_pending());

    let reused: Vec<GestureId> = second.next_batch(5).unwrap().iter().cloned().collect();
    assert!(reused.iter().all(|id| drawn.contains(id)));

    let last = second.next_batch(5).unwrap();
    assert!(last.iter().all(|id| !drawn.contains(id)));
    assert_eq!(second.queue().len(), 0);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn hand_written_state_file_is_accepted() {
    let path = state_path("hand-written");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        "ShuffledQueue:\n  - EGO_1\n  - ETC_2\nGestureMiniBatch:\n  - NUM_3\n",
    )
    .unwrap();

    let state = FileQueueStore::new(&path).load().unwrap().expect("state present");
    assert_eq!(
        state,
        PersistedQueueState {
            shuffled_queue: vec!["EGO_1".into(), "ETC_2".into()],
            gesture_mini_batch: vec!["NUM_3".into()],
        }
    );

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn duplicate_entries_are_rejected_on_restore() {
    let path = state_path("duplicates");
    let store = FileQueueStore::new(&path);
    store
        .save(&PersistedQueueState {
            shuffled_queue: vec!["EGO_1".into(), "EGO_1".into()],
            gesture_mini_batch: Vec::new(),
        })
        .unwrap();

    let mut scheduler = GestureBatchScheduler::with_seed(FileQueueStore::new(&path), 3);
    let err = scheduler.restore().unwrap_err();
    assert!(matches!(err, RecorderError::Parse { .. }));
    assert_eq!(scheduler.queue().len(), 0);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
