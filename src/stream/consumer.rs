//! Foreground side of the frame hand-off

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use std::sync::Arc;

use super::queue::FrameQueue;
use super::throttle::ThrottleExt;
use crate::types::{FramePacket, UpdateRate};

/// Keeps the queue accepting frames while a consumer exists.
struct Attached(Arc<FrameQueue>);

impl Drop for Attached {
    fn drop(&mut self) {
        self.0.detach_consumer();
    }
}

/// Single consumer of decoded frames. Never blocks.
///
/// The queue bound, if any, is enforced when frames are enqueued, so
/// frames pile up to at most the capacity however rarely this is polled.
pub struct FrameConsumer {
    queue: Attached,
}

impl FrameConsumer {
    pub(crate) fn new(queue: Arc<FrameQueue>) -> Self {
        Self { queue: Attached(queue) }
    }

    /// Oldest queued frame, if any.
    pub fn poll(&mut self) -> Option<FramePacket> {
        self.queue.0.pop()
    }

    /// Drain everything queued and return only the newest frame.
    pub fn poll_latest(&mut self) -> Option<FramePacket> {
        self.queue.0.pop_latest()
    }

    /// Number of frames waiting.
    pub fn pending(&self) -> usize {
        self.queue.0.len()
    }

    /// Turn the consumer into an async stream paced at `rate`.
    ///
    /// Must be called inside a Tokio runtime when `rate` throttles.
    pub fn into_stream(self, rate: UpdateRate) -> BoxStream<'static, FramePacket> {
        let frames = stream::unfold(self.queue, |queue| async move {
            let frame = queue.0.next().await?;
            Some((frame, queue))
        });
        match rate.throttle_interval() {
            None => frames.boxed(),
            Some(period) => frames.throttle(period).boxed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::PipelineStats;
    use std::time::Duration;

    struct Harness {
        queue: Arc<FrameQueue>,
        stats: Arc<PipelineStats>,
    }

    impl Harness {
        fn push(&self, frame: FramePacket) -> bool {
            self.queue.push(frame)
        }

        fn close(&self) {
            self.queue.close();
        }
    }

    fn consumer(capacity: Option<usize>) -> (Harness, FrameConsumer) {
        let stats = Arc::new(PipelineStats::default());
        let queue = Arc::new(FrameQueue::new(capacity, Arc::clone(&stats)));
        (Harness { queue: Arc::clone(&queue), stats }, FrameConsumer::new(queue))
    }

    fn frame(sequence: u64) -> FramePacket {
        FramePacket::new(vec![sequence as u8], sequence)
    }

    fn discarded(harness: &Harness) -> u64 {
        harness.stats.snapshot().discarded
    }

    #[test]
    fn poll_is_fifo_and_non_blocking() {
        let (queue, mut consumer) = consumer(None);
        assert!(consumer.poll().is_none());

        queue.push(frame(0));
        queue.push(frame(1));
        assert_eq!(consumer.poll().map(|f| f.sequence), Some(0));
        assert_eq!(consumer.poll().map(|f| f.sequence), Some(1));
        assert!(consumer.poll().is_none());
    }

    #[test]
    fn poll_latest_keeps_newest() {
        let (queue, mut consumer) = consumer(None);
        for i in 0..4 {
            queue.push(frame(i));
        }
        assert_eq!(consumer.poll_latest().map(|f| f.sequence), Some(3));
        assert_eq!(consumer.pending(), 0);
        assert_eq!(discarded(&queue), 3);
    }

    #[test]
    fn capacity_holds_without_polling() {
        let (queue, consumer) = consumer(Some(2));
        for i in 0..5 {
            queue.push(frame(i));
        }
        assert_eq!(consumer.pending(), 2);
        assert_eq!(discarded(&queue), 3);
    }

    #[test]
    fn capacity_discards_oldest_first() {
        let (queue, mut consumer) = consumer(Some(2));
        for i in 0..5 {
            queue.push(frame(i));
        }
        assert_eq!(consumer.poll().map(|f| f.sequence), Some(3));
        assert_eq!(consumer.poll().map(|f| f.sequence), Some(4));
    }

    #[test]
    fn dropped_consumer_stops_the_queue() {
        let (queue, consumer) = consumer(None);
        drop(consumer);
        assert!(!queue.push(frame(0)));
    }

    #[tokio::test]
    async fn stream_is_bounded_too() {
        let (queue, consumer) = consumer(Some(1));
        let mut frames = consumer.into_stream(UpdateRate::Native);
        for i in 0..3 {
            queue.push(frame(i));
        }
        queue.close();

        let first = tokio::time::timeout(Duration::from_secs(1), frames.next()).await.unwrap();
        assert_eq!(first.map(|f| f.sequence), Some(2));
        assert!(frames.next().await.is_none());
        assert_eq!(discarded(&queue), 2);
    }
}
