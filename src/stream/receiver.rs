//! Background receive loop for frame datagrams

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::pipeline::PipelineStats;
use super::queue::FrameQueue;
use crate::types::FramePacket;

/// Owns the stream socket for the lifetime of one session.
pub(crate) struct FrameReceiver {
    pub socket: UdpSocket,
    pub frames: Arc<FrameQueue>,
    pub stats: Arc<PipelineStats>,
    pub running: Arc<AtomicBool>,
    pub cancel: CancellationToken,
    pub max_datagram: usize,
}

impl FrameReceiver {
    /// Receive until cancelled. Dropping `self` at the end closes the socket.
    pub async fn run(self) {
        let local = self.socket.local_addr().ok();
        info!(?local, "Frame receiver started");

        let mut buf = vec![0u8; self.max_datagram];
        let mut sequence = 0u64;
        let mut error_streak = 0u32;
        let mut consumer_gone = false;

        loop {
            let result = tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("Frame receiver cancelled during receive");
                    break;
                }
                result = self.socket.recv_from(&mut buf) => result,
            };

            match result {
                Ok((len, from)) => {
                    error_streak = 0;
                    self.stats.record_received();

                    let frame = match FramePacket::decode(&buf[..len], sequence) {
                        Ok(frame) => frame,
                        Err(reason) => {
                            self.stats.record_malformed();
                            warn!(%from, ?reason, "Skipping malformed frame datagram");
                            continue;
                        }
                    };

                    trace!(sequence, bytes = frame.len(), "Frame decoded");
                    sequence += 1;
                    self.stats.record_decoded();

                    if !self.frames.push(frame) && !consumer_gone {
                        debug!("Frame consumer dropped; frames are discarded until stop");
                        consumer_gone = true;
                    }
                }
                Err(e) => {
                    // Transient: ICMP errors from earlier sends, interrupted calls.
                    error_streak += 1;
                    self.stats.record_receive_error();
                    warn!("Error receiving frame ({} in a row): {}", error_streak, e);

                    let backoff = Duration::from_millis(10 * (1 << error_streak.min(5)));
                    tokio::select! {
                        _ = self.cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        self.frames.close();
        self.running.store(false, Ordering::Release);
        info!("Frame receiver ended after {} frames", sequence);
    }
}
