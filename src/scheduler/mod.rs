//! Gesture batch scheduling
//!
//! The scheduler keeps a draw queue that is a random permutation of the
//! whole gesture pool. Each session dequeues a fixed-size [`SessionBatch`]
//! from the front. When the queue holds fewer gestures than a batch needs,
//! the remainder is discarded and the full pool is re-permuted.
//!
//! Discarding the remainder means gestures left over at the end of a cycle
//! may wait longer than one cycle before being drawn. This is a known bias
//! of the refill rule and is kept intentionally.
//!
//! The queue and last batch survive process restarts through a
//! [`QueueStateStore`]. After a successful [`restore`](GestureBatchScheduler::restore)
//! the restored batch is flagged for reuse so the next session records it
//! instead of drawing a new one.

mod batch;
mod pool;
mod store;

pub use batch::{BatchCursor, SessionBatch};
pub use pool::discover_pool;
pub use store::{FileQueueStore, MemoryQueueStore, PersistedQueueState, QueueStateStore};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::{BTreeSet, HashSet, VecDeque};
use tracing::{debug, info, warn};

use crate::types::GestureId;
use crate::{RecorderError, Result};

/// Number of gestures recorded per session.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Draws non-repeating gesture batches from a shuffled pool.
pub struct GestureBatchScheduler<S = FileQueueStore> {
    /// Every known gesture, sorted and unique
    pool: Vec<GestureId>,

    /// Remaining draw order, front is drawn first
    queue: VecDeque<GestureId>,

    /// Batch of the current session
    batch: Option<SessionBatch>,

    /// Set when the current batch must be recorded again without a new draw
    reuse_batch: bool,

    rng: StdRng,

    store: S,
}

impl<S: QueueStateStore> GestureBatchScheduler<S> {
    /// Create a scheduler with an entropy-seeded shuffle.
    pub fn new(store: S) -> Self {
        Self::with_rng(store, StdRng::from_entropy())
    }

    /// Create a scheduler whose shuffles are repeatable for a given seed.
    pub fn with_seed(store: S, seed: u64) -> Self {
        Self::with_rng(store, StdRng::seed_from_u64(seed))
    }

    fn with_rng(store: S, rng: StdRng) -> Self {
        Self { pool: Vec::new(), queue: VecDeque::new(), batch: None, reuse_batch: false, rng, store }
    }

    /// Replace the draw pool. Duplicates collapse to one entry.
    ///
    /// The current queue keeps its order; only gestures missing from the
    /// new pool are dropped from it. The full pool takes effect at the next
    /// refill.
    pub fn fill_pool<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = GestureId>,
    {
        let unique: BTreeSet<GestureId> = ids.into_iter().collect();
        self.pool = unique.into_iter().collect();
        info!("Gesture pool filled with {} gestures", self.pool.len());
        self.retain_pool_members();
    }

    /// Drop queued and batched gestures that are not in the pool, e.g.
    /// clips removed since the state was saved. No-op while the pool is
    /// empty.
    fn retain_pool_members(&mut self) {
        if self.pool.is_empty() {
            return;
        }
        let pool = &self.pool;
        let known = |id: &GestureId| pool.binary_search(id).is_ok();

        let queued = self.queue.len();
        self.queue.retain(|id| known(id));
        let dropped_queue = queued - self.queue.len();

        let mut dropped_batch = 0;
        if let Some(batch) = &self.batch {
            let kept: Vec<GestureId> = batch.iter().filter(|id| known(*id)).cloned().collect();
            dropped_batch = batch.len() - kept.len();
            if dropped_batch > 0 {
                self.batch = if kept.is_empty() { None } else { Some(SessionBatch::new(kept)) };
            }
        }

        if dropped_queue + dropped_batch > 0 {
            warn!(
                queue = dropped_queue,
                batch = dropped_batch,
                "Dropped saved gestures that are no longer in the pool"
            );
        }
        if self.batch.is_none() {
            self.reuse_batch = false;
        }
    }

    /// Draw the next `size` gestures as the new session batch.
    ///
    /// Fails with [`RecorderError::PoolTooSmall`] when the pool cannot
    /// supply `size` distinct gestures.
    pub fn draw_batch(&mut self, size: usize) -> Result<&SessionBatch> {
        if size == 0 {
            return Err(RecorderError::EmptyBatch);
        }
        if self.pool.len() < size {
            return Err(RecorderError::pool_too_small(self.pool.len(), size));
        }

        if self.queue.len() < size {
            self.reshuffle();
        }

        let ids: Vec<GestureId> = self.queue.drain(..size).collect();
        debug!(batch = ?ids, remaining = self.queue.len(), "Drew session batch");

        self.reuse_batch = false;
        Ok(self.batch.insert(SessionBatch::new(ids)))
    }

    /// Replace the queue with a fresh permutation of the whole pool.
    fn reshuffle(&mut self) {
        if !self.queue.is_empty() {
            debug!(discarded = self.queue.len(), "Discarding queue remainder before reshuffle");
        }
        let mut order = self.pool.clone();
        order.shuffle(&mut self.rng);
        self.queue = order.into();
        debug!("Reshuffled {} gestures into the draw queue", self.queue.len());
    }

    /// Current persisted form of the queue and batch.
    pub fn snapshot(&self) -> PersistedQueueState {
        PersistedQueueState {
            shuffled_queue: self.queue.iter().cloned().collect(),
            gesture_mini_batch: self.batch.as_ref().map(|b| b.as_slice().to_vec()).unwrap_or_default(),
        }
    }

    /// Write the queue and current batch to the store.
    pub fn persist(&self) -> Result<()> {
        let state = self.snapshot();
        self.store.save(&state)?;
        info!(
            queue = state.shuffled_queue.len(),
            batch = state.gesture_mini_batch.len(),
            "Persisted gesture queue state"
        );
        Ok(())
    }

    /// Load the queue and batch saved by a previous run.
    ///
    /// Returns `Ok(false)` when nothing was stored. A restored non-empty
    /// batch is flagged for reuse. Stored state containing duplicates is
    /// rejected and the scheduler is left unchanged. Gestures no longer in
    /// a filled pool are dropped, keeping the saved order.
    pub fn restore(&mut self) -> Result<bool> {
        let Some(state) = self.store.load()? else {
            debug!("No persisted queue state, starting a fresh draw cycle");
            return Ok(false);
        };

        ensure_unique(&state.shuffled_queue, "ShuffledQueue")?;
        ensure_unique(&state.gesture_mini_batch, "GestureMiniBatch")?;

        self.queue = state.shuffled_queue.into();
        self.batch = if state.gesture_mini_batch.is_empty() {
            None
        } else {
            Some(SessionBatch::new(state.gesture_mini_batch))
        };
        self.reuse_batch = self.batch.is_some();
        self.retain_pool_members();

        info!(
            queue = self.queue.len(),
            batch = self.batch.as_ref().map_or(0, SessionBatch::len),
            "Restored gesture queue state"
        );
        Ok(true)
    }

    /// Flag the current batch to be recorded again instead of drawing.
    pub fn mark_batch_reuse(&mut self) {
        if self.batch.is_none() {
            warn!("Batch reuse requested but no batch has been drawn");
            return;
        }
        self.reuse_batch = true;
    }

    pub fn reuse_pending(&self) -> bool {
        self.reuse_batch
    }

    /// Batch for the next session: the flagged batch when reuse is pending
    /// and it still has `size` gestures, otherwise a new draw. Consumes the
    /// reuse flag.
    pub fn next_batch(&mut self, size: usize) -> Result<&SessionBatch> {
        let reuse = std::mem::take(&mut self.reuse_batch);
        match self.batch.as_ref().map(SessionBatch::len) {
            Some(kept) if reuse && kept == size => {
                debug!(size, "Reusing current batch without reshuffling");
                return self.batch.as_ref().ok_or(RecorderError::EmptyBatch);
            }
            Some(kept) if reuse => {
                info!(kept, size, "Kept batch has the wrong size; drawing a new one");
            }
            _ => {}
        }
        self.draw_batch(size)
    }

    pub fn current_batch(&self) -> Option<&SessionBatch> {
        self.batch.as_ref()
    }

    pub fn pool(&self) -> &[GestureId] {
        &self.pool
    }

    pub fn queue(&self) -> impl ExactSizeIterator<Item = &GestureId> {
        self.queue.iter()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

fn ensure_unique(ids: &[GestureId], field: &str) -> Result<()> {
    let mut seen = HashSet::with_capacity(ids.len());
    match ids.iter().find(|id| !seen.insert(*id)) {
        Some(dup) => Err(RecorderError::parse(
            "PersistedQueueState validation",
            format!("{field} contains {dup} more than once"),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(n: usize) -> Vec<GestureId> {
        (0..n).map(|i| GestureId::new(format!("EGO_{i:02}"))).collect()
    }

    fn scheduler(pool: usize, seed: u64) -> GestureBatchScheduler<MemoryQueueStore> {
        let mut scheduler = GestureBatchScheduler::with_seed(MemoryQueueStore::new(), seed);
        scheduler.fill_pool(ids(pool));
        scheduler
    }

    #[test]
    fn pool_too_small_fails_fast() {
        let mut scheduler = scheduler(3, 1);
        let err = scheduler.draw_batch(5).unwrap_err();
        assert!(matches!(err, RecorderError::PoolTooSmall { pool: 3, batch: 5 }));
        assert!(scheduler.current_batch().is_none());
    }

    #[test]
    fn zero_size_batch_is_rejected() {
        assert!(matches!(scheduler(5, 1).draw_batch(0), Err(RecorderError::EmptyBatch)));
    }

    #[test]
    fn duplicate_pool_entries_collapse() {
        let mut scheduler = scheduler(0, 1);
        scheduler.fill_pool(["EGO_1", "EGO_1", "ETC_2"].into_iter().map(GestureId::from));
        assert_eq!(scheduler.pool().len(), 2);
    }

    #[test]
    fn batch_is_consumed_from_queue_front() {
        let mut scheduler = scheduler(12, 7);
        scheduler.draw_batch(5).unwrap();
        let front: Vec<GestureId> = scheduler.queue().take(5).cloned().collect();
        assert_eq!(scheduler.queue().len(), 7);

        let batch = scheduler.draw_batch(5).unwrap();
        assert_eq!(batch.as_slice(), front.as_slice());
    }

    #[test]
    fn short_queue_is_discarded_and_reshuffled() {
        let mut scheduler = scheduler(7, 3);
        scheduler.draw_batch(5).unwrap();
        assert_eq!(scheduler.queue().len(), 2);

        scheduler.draw_batch(5).unwrap();
        // Full pool of 7 re-permuted, 5 drawn.
        assert_eq!(scheduler.queue().len(), 2);
    }

    #[test]
    fn same_seed_same_draws() {
        let mut a = scheduler(20, 42);
        let mut b = scheduler(20, 42);
        for _ in 0..6 {
            assert_eq!(a.draw_batch(5).unwrap().clone(), b.draw_batch(5).unwrap().clone());
        }
    }

    #[test]
    fn persist_then_restore_round_trips() {
        let mut scheduler = scheduler(11, 9);
        scheduler.draw_batch(5).unwrap();
        let before = scheduler.snapshot();
        scheduler.persist().unwrap();

        let mut restored = GestureBatchScheduler::with_seed(scheduler.store().clone(), 1000);
        assert!(restored.restore().unwrap());
        assert_eq!(restored.snapshot(), before);
        assert!(restored.reuse_pending());
    }

    #[test]
    fn restore_without_state_is_first_run() {
        let mut scheduler = scheduler(5, 1);
        assert!(!scheduler.restore().unwrap());
        assert!(!scheduler.reuse_pending());
    }

    #[test]
    fn restore_rejects_duplicates() {
        let store = MemoryQueueStore::new();
        store
            .save(&PersistedQueueState {
                shuffled_queue: vec!["EGO_1".into(), "EGO_1".into()],
                gesture_mini_batch: vec![],
            })
            .unwrap();

        let mut scheduler = GestureBatchScheduler::with_seed(store, 1);
        assert!(matches!(scheduler.restore(), Err(RecorderError::Parse { .. })));
        assert_eq!(scheduler.queue().len(), 0);
    }

    #[test]
    fn next_batch_reuses_flagged_batch_once() {
        let mut scheduler = scheduler(15, 5);
        let first = scheduler.draw_batch(5).unwrap().clone();

        scheduler.mark_batch_reuse();
        assert_eq!(scheduler.next_batch(5).unwrap(), &first);
        assert!(!scheduler.reuse_pending());

        assert_ne!(scheduler.next_batch(5).unwrap(), &first);
    }

    #[test]
    fn restored_batch_is_reused_without_touching_queue() {
        let mut original = scheduler(10, 11);
        let batch = original.draw_batch(5).unwrap().clone();
        original.persist().unwrap();

        let mut restored = GestureBatchScheduler::with_seed(original.store().clone(), 2);
        restored.fill_pool(ids(10));
        restored.restore().unwrap();
        let queue_before: Vec<GestureId> = restored.queue().cloned().collect();

        assert_eq!(restored.next_batch(5).unwrap(), &batch);
        assert_eq!(restored.queue().cloned().collect::<Vec<_>>(), queue_before);
    }

    #[test]
    fn restored_gestures_missing_from_pool_are_dropped() {
        let store = MemoryQueueStore::new();
        let saved = |names: &[&str]| names.iter().map(|n| GestureId::from(*n)).collect::<Vec<_>>();
        store
            .save(&PersistedQueueState {
                shuffled_queue: saved(&["EGO_1", "EGO_2", "GONE_1", "GONE_2", "GONE_3", "EGO_3"]),
                gesture_mini_batch: saved(&["GONE_4", "EGO_4"]),
            })
            .unwrap();

        let mut scheduler = GestureBatchScheduler::with_seed(store, 4);
        scheduler.fill_pool((1..=6).map(|i| GestureId::new(format!("EGO_{i}"))));
        assert!(scheduler.restore().unwrap());

        let queue: Vec<GestureId> = scheduler.queue().cloned().collect();
        assert_eq!(queue, saved(&["EGO_1", "EGO_2", "EGO_3"]));
        assert_eq!(
            scheduler.current_batch().map(SessionBatch::as_slice),
            Some(saved(&["EGO_4"]).as_slice())
        );

        // The shrunken batch no longer fits a session, so a fresh draw is made.
        let batch = scheduler.next_batch(5).unwrap().clone();
        assert!(batch.iter().all(|id| scheduler.pool().contains(id)));
    }

    #[test]
    fn batch_of_vanished_gestures_is_not_reused() {
        let store = MemoryQueueStore::new();
        store
            .save(&PersistedQueueState {
                shuffled_queue: vec![],
                gesture_mini_batch: vec!["GONE_1".into(), "GONE_2".into()],
            })
            .unwrap();

        let mut scheduler = GestureBatchScheduler::with_seed(store, 4);
        scheduler.fill_pool(ids(6));
        scheduler.restore().unwrap();
        assert!(scheduler.current_batch().is_none());
        assert!(!scheduler.reuse_pending());
    }

    #[test]
    fn pool_change_after_restore_prunes_queue() {
        let mut original = scheduler(10, 3);
        original.draw_batch(5).unwrap();
        original.persist().unwrap();

        let mut restored = GestureBatchScheduler::with_seed(original.store().clone(), 3);
        restored.restore().unwrap();
        assert_eq!(restored.queue().len(), 5);

        restored.fill_pool(ids(3));
        assert!(restored.queue().all(|id| ids(3).contains(id)));
    }

    #[test]
    fn kept_batch_of_other_size_is_redrawn() {
        let mut scheduler = scheduler(15, 5);
        let first = scheduler.draw_batch(5).unwrap().clone();

        scheduler.mark_batch_reuse();
        let next = scheduler.next_batch(4).unwrap();
        assert_eq!(next.len(), 4);
        assert_ne!(next, &first);
        assert!(!scheduler.reuse_pending());
    }

    proptest! {
        #[test]
        fn batches_never_contain_duplicates(
            pool in 5usize..40,
            seed in any::<u64>(),
            draws in 1usize..20,
        ) {
            let mut scheduler = scheduler(pool, seed);
            for _ in 0..draws {
                let batch = scheduler.draw_batch(DEFAULT_BATCH_SIZE).unwrap();
                let unique: HashSet<&GestureId> = batch.iter().collect();
                prop_assert_eq!(unique.len(), batch.len());
            }
        }

        #[test]
        fn full_cycle_covers_pool_exactly_once(cycles in 1usize..6, seed in any::<u64>()) {
            let pool = DEFAULT_BATCH_SIZE * cycles;
            let mut scheduler = scheduler(pool, seed);

            let mut seen = Vec::new();
            for _ in 0..cycles {
                seen.extend(scheduler.draw_batch(DEFAULT_BATCH_SIZE).unwrap().iter().cloned());
            }
            seen.sort();
            prop_assert_eq!(seen, ids(pool));
        }

        #[test]
        fn queue_never_holds_duplicates(pool in 5usize..30, seed in any::<u64>(), draws in 1usize..15) {
            let mut scheduler = scheduler(pool, seed);
            for _ in 0..draws {
                scheduler.draw_batch(DEFAULT_BATCH_SIZE).unwrap();
                let unique: HashSet<&GestureId> = scheduler.queue().collect();
                prop_assert_eq!(unique.len(), scheduler.queue().len());
            }
        }
    }
}
