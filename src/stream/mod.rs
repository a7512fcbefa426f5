//! Preview frame ingestion
//!
//! The capture server sends each encoded camera frame as one UDP datagram:
//! a signed 32-bit little-endian length followed by that many payload
//! bytes. A background receiver task decodes datagrams into
//! [`FramePacket`](crate::types::FramePacket)s and pushes them onto a
//! shared queue; the foreground drains it with non-blocking polls. With
//! `stream.queue_capacity` set, the push evicts the oldest pending frame.
//!
//! Delivery is best effort. Malformed datagrams are skipped, transient
//! socket errors are logged, and only [`StreamIngestionPipeline::stop`]
//! ends the receiver.

mod consumer;
mod pipeline;
mod queue;
mod receiver;
mod throttle;

pub use consumer::FrameConsumer;
pub use pipeline::{PipelineStats, StatsSnapshot, StreamIngestionPipeline};
pub use throttle::{Throttle, ThrottleExt};
