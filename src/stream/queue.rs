//! Frame hand-off between the receiver task and the consumer

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::trace;

use super::pipeline::PipelineStats;
use crate::types::FramePacket;

/// FIFO of decoded frames shared by one producer and one consumer.
///
/// With a capacity set, a push onto a full queue evicts the oldest frame,
/// so at most `capacity` frames are ever pending.
#[derive(Debug)]
pub(crate) struct FrameQueue {
    frames: Mutex<VecDeque<FramePacket>>,
    capacity: Option<usize>,
    stats: Arc<PipelineStats>,
    notify: Notify,
    closed: AtomicBool,
    consumer_gone: AtomicBool,
}

impl FrameQueue {
    pub fn new(capacity: Option<usize>, stats: Arc<PipelineStats>) -> Self {
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity.unwrap_or(16))),
            capacity,
            stats,
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            consumer_gone: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<FramePacket>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue a frame. Returns `false` once the consumer is gone.
    pub fn push(&self, frame: FramePacket) -> bool {
        if self.consumer_gone.load(Ordering::Acquire) {
            return false;
        }
        {
            let mut frames = self.lock();
            if let Some(capacity) = self.capacity {
                while frames.len() >= capacity {
                    let Some(stale) = frames.pop_front() else { break };
                    trace!(sequence = stale.sequence, "Evicting stale frame");
                    self.stats.record_discarded();
                }
            }
            frames.push_back(frame);
        }
        self.notify.notify_one();
        true
    }

    pub fn pop(&self) -> Option<FramePacket> {
        self.lock().pop_front()
    }

    /// Take everything queued and keep only the newest frame.
    pub fn pop_latest(&self) -> Option<FramePacket> {
        let mut frames = self.lock();
        let latest = frames.pop_back();
        for _ in frames.drain(..) {
            self.stats.record_discarded();
        }
        latest
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Wait for the next frame. `None` once the producer has closed and the
    /// queue is drained.
    pub async fn next(&self) -> Option<FramePacket> {
        loop {
            if let Some(frame) = self.pop() {
                return Some(frame);
            }
            if self.closed.load(Ordering::Acquire) {
                return self.pop();
            }
            self.notify.notified().await;
        }
    }

    /// Producer side is finished; wakes a waiting consumer.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    /// Consumer side is finished; later pushes are refused.
    pub fn detach_consumer(&self) {
        self.consumer_gone.store(true, Ordering::Release);
        self.lock().clear();
    }
}
