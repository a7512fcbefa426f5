//! Stream ingestion pipeline: socket lifetime, receiver task and hand-off

use futures::stream::BoxStream;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::consumer::FrameConsumer;
use super::queue::FrameQueue;
use super::receiver::FrameReceiver;
use crate::config::StreamConfig;
use crate::types::{FramePacket, UpdateRate};
use crate::{RecorderError, Result};

/// Counters updated by the receiver and readable from the foreground.
#[derive(Debug, Default)]
pub struct PipelineStats {
    received: AtomicU64,
    decoded: AtomicU64,
    malformed: AtomicU64,
    receive_errors: AtomicU64,
    discarded: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub received: u64,
    pub decoded: u64,
    pub malformed: u64,
    pub receive_errors: u64,
    pub discarded: u64,
}

impl PipelineStats {
    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decoded(&self) {
        self.decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_receive_error(&self) {
        self.receive_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            decoded: self.decoded.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            receive_errors: self.receive_errors.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// Receiver task handle while the socket is open.
struct ActiveReceiver {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
    running: Arc<AtomicBool>,
    local_addr: SocketAddr,
}

/// Live camera preview feed from the capture server.
///
/// [`start`](Self::start) binds the stream port and spawns one receiver
/// task; [`poll`](Self::poll) hands decoded frames to the single foreground
/// consumer without blocking; [`stop`](Self::stop) closes the socket and
/// waits for the receiver to finish.
pub struct StreamIngestionPipeline {
    config: StreamConfig,
    stats: Arc<PipelineStats>,
    consumer: Option<FrameConsumer>,
    active: Option<ActiveReceiver>,
}

impl StreamIngestionPipeline {
    pub fn new(config: StreamConfig) -> Self {
        Self { config, stats: Arc::new(PipelineStats::default()), consumer: None, active: None }
    }

    /// Bind `0.0.0.0:port` and start receiving. Port `0` picks a free port.
    ///
    /// Starting an already running pipeline is a no-op.
    pub async fn start(&mut self, port: u16) -> Result<SocketAddr> {
        if let Some(active) = &self.active {
            warn!("Stream pipeline already running on {}", active.local_addr);
            return Ok(active.local_addr);
        }

        let socket = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], port)))
            .await
            .map_err(|e| RecorderError::socket(format!("bind stream port {port}"), e))?;
        let local_addr =
            socket.local_addr().map_err(|e| RecorderError::socket("stream local_addr", e))?;

        let queue = Arc::new(FrameQueue::new(self.config.queue_capacity, Arc::clone(&self.stats)));
        self.consumer = Some(FrameConsumer::new(Arc::clone(&queue)));

        let cancel = CancellationToken::new();
        let running = Arc::new(AtomicBool::new(true));
        let receiver = FrameReceiver {
            socket,
            frames: queue,
            stats: Arc::clone(&self.stats),
            running: Arc::clone(&running),
            cancel: cancel.clone(),
            max_datagram: self.config.max_datagram,
        };
        let handle = tokio::spawn(receiver.run());

        info!("Stream pipeline listening on {}", local_addr);
        self.active = Some(ActiveReceiver { handle, cancel, running, local_addr });
        Ok(local_addr)
    }

    /// Start on the configured port.
    pub async fn start_configured(&mut self) -> Result<SocketAddr> {
        let port = self.config.port;
        self.start(port).await
    }

    /// Close the socket and wait for the receiver to exit.
    ///
    /// Waiting is bounded by the configured join timeout. A receiver that
    /// does not finish in time is abandoned and reported as
    /// [`RecorderError::Timeout`]; it still exits once it observes the
    /// cancellation.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(active) = self.active.take() else {
            debug!("Stream pipeline already stopped");
            return Ok(());
        };

        active.cancel.cancel();
        let join_timeout = self.config.join_timeout();
        match tokio::time::timeout(join_timeout, active.handle).await {
            Ok(Ok(())) => info!("Stream pipeline stopped"),
            Ok(Err(e)) => error!("Frame receiver task failed: {}", e),
            Err(_) => {
                warn!("Frame receiver did not stop within {:?}", join_timeout);
                return Err(RecorderError::Timeout { duration: join_timeout });
            }
        }
        active.running.store(false, Ordering::Release);
        Ok(())
    }

    /// Whether the receiver task is alive.
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| {
                active.running.load(Ordering::Acquire) && !active.handle.is_finished()
            })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.active.as_ref().map(|active| active.local_addr)
    }

    /// One decoded frame, oldest first. Never blocks.
    pub fn poll(&mut self) -> Option<FramePacket> {
        self.consumer.as_mut().and_then(FrameConsumer::poll)
    }

    /// Newest decoded frame, discarding anything older. Never blocks.
    pub fn poll_latest(&mut self) -> Option<FramePacket> {
        self.consumer.as_mut().and_then(FrameConsumer::poll_latest)
    }

    /// Take the consumer as an async stream paced at `rate`.
    ///
    /// After this, [`poll`](Self::poll) returns `None` until the next start.
    pub fn frames(&mut self, rate: UpdateRate) -> Option<BoxStream<'static, FramePacket>> {
        self.consumer.take().map(|consumer| consumer.into_stream(rate))
    }

    /// Frames waiting for the consumer.
    pub fn pending(&self) -> usize {
        self.consumer.as_ref().map_or(0, FrameConsumer::pending)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn join_timeout(&self) -> Duration {
        self.config.join_timeout()
    }
}

impl Drop for StreamIngestionPipeline {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            debug!("Dropping running stream pipeline");
            active.cancel.cancel();
        }
    }
}
