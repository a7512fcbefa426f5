//! UDP request/response channel to the capture server

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use super::message::Command;
use crate::config::ControlConfig;
use crate::{RecorderError, Result};

/// Replies are short status words; anything longer is not a reply.
const REPLY_BUFFER_SIZE: usize = 1024;

/// Default deadline for a reply.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of one request. Never an error: transport problems and silence
/// are ordinary negative outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    /// The expected reply arrived in time
    Confirmed,
    /// One-way command was written to the socket
    Delivered,
    /// A reply arrived but was not the expected one
    Rejected(String),
    /// No reply within the deadline
    TimedOut,
    /// The socket reported an error
    Failed(String),
}

impl ControlOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ControlOutcome::Confirmed | ControlOutcome::Delivered)
    }
}

/// Anything that can carry [`Command`]s to the capture server.
///
/// Implementations must serialize requests: a reply is only ever matched
/// to the request that is currently in flight.
#[async_trait::async_trait]
pub trait ControlTransport: Send + Sync {
    async fn request(&self, command: &Command) -> ControlOutcome;

    /// Boolean view of [`request`](Self::request).
    async fn send(&self, command: &Command) -> bool {
        self.request(command).await.is_success()
    }
}

/// Connected UDP socket with one request in flight at a time.
pub struct ControlChannel {
    socket: Mutex<UdpSocket>,
    endpoint: SocketAddr,
    timeout: Duration,
}

impl ControlChannel {
    /// Bind an ephemeral local port and connect it to `endpoint`.
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let endpoint = tokio::net::lookup_host(endpoint)
            .await
            .map_err(|e| RecorderError::socket(format!("resolve {endpoint}"), e))?
            .next()
            .ok_or_else(|| RecorderError::config(format!("{endpoint} did not resolve")))?;

        let local: SocketAddr = if endpoint.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };

        let socket =
            UdpSocket::bind(local).await.map_err(|e| RecorderError::socket("bind control socket", e))?;
        socket
            .connect(endpoint)
            .await
            .map_err(|e| RecorderError::socket(format!("connect to {endpoint}"), e))?;

        info!("Control channel connected to {}", endpoint);
        Ok(Self { socket: Mutex::new(socket), endpoint, timeout: DEFAULT_RESPONSE_TIMEOUT })
    }

    /// Connect using the configured endpoint and deadline.
    pub async fn from_config(config: &ControlConfig) -> Result<Self> {
        Ok(Self::connect(&config.endpoint()).await?.with_timeout(config.response_timeout()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait::async_trait]
impl ControlTransport for ControlChannel {
    async fn request(&self, command: &Command) -> ControlOutcome {
        let socket = self.socket.lock().await;
        discard_stale_replies(&socket);

        let text = command.to_message().encode();
        debug!(command = %text, endpoint = %self.endpoint, "Sending control command");

        if let Err(e) = socket.send(text.as_bytes()).await {
            warn!("Failed to send {}: {}", command.name(), e);
            return ControlOutcome::Failed(e.to_string());
        }

        let Some(expected) = command.expected_reply() else {
            return ControlOutcome::Delivered;
        };

        let mut buf = [0u8; REPLY_BUFFER_SIZE];
        match tokio::time::timeout(self.timeout, socket.recv(&mut buf)).await {
            Ok(Ok(len)) => {
                let reply = String::from_utf8_lossy(&buf[..len]);
                debug!(command = command.name(), reply = %reply, "Control reply received");
                if reply == expected {
                    ControlOutcome::Confirmed
                } else {
                    ControlOutcome::Rejected(reply.into_owned())
                }
            }
            Ok(Err(e)) => {
                warn!("Error awaiting reply to {}: {}", command.name(), e);
                ControlOutcome::Failed(e.to_string())
            }
            Err(_) => {
                warn!("Server response to {} timed out after {:?}", command.name(), self.timeout);
                ControlOutcome::TimedOut
            }
        }
    }
}

/// Drop datagrams that arrived after an earlier request gave up waiting,
/// so they are not read as the reply to the next one.
fn discard_stale_replies(socket: &UdpSocket) {
    let mut buf = [0u8; REPLY_BUFFER_SIZE];
    loop {
        match socket.try_recv(&mut buf) {
            Ok(len) => {
                debug!(reply = %String::from_utf8_lossy(&buf[..len]), "Discarding stale control reply");
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
            Err(e) => {
                // Pending ICMP errors surface here; they belong to the old request.
                trace!("Discarding stale socket error: {}", e);
                break;
            }
        }
    }
}
