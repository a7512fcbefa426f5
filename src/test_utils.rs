//! Test utilities: a scriptable capture server, a frame sender and
//! scratch directories.
//!
//! Shared by unit tests and benches so socket-level behaviour can be
//! exercised without the real capture server.

#![cfg(any(test, feature = "benchmark"))]

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::control::{
    Command, ControlOutcome, ControlTransport, GLASSES_CONNECTED, STARTED_STREAMING,
};
use crate::scheduler::SessionBatch;
use crate::types::{FramePacket, GestureId};

/// Reply the mock server sends for one command.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub text: String,
    pub delay: Duration,
}

impl MockReply {
    pub fn now(text: impl Into<String>) -> Self {
        Self::after(text, Duration::ZERO)
    }

    pub fn after(text: impl Into<String>, delay: Duration) -> Self {
        Self { text: text.into(), delay }
    }
}

/// UDP capture server stand-in bound to an ephemeral loopback port.
///
/// Every command received is recorded. Replies are produced by the
/// responder closure and sent after their delay without blocking the
/// receive loop. The server stops when dropped.
pub struct MockCaptureServer {
    addr: SocketAddr,
    commands: Arc<Mutex<Vec<String>>>,
    cancel: CancellationToken,
}

impl MockCaptureServer {
    pub async fn spawn<F>(respond: F) -> io::Result<Self>
    where
        F: Fn(&str) -> Option<MockReply> + Send + Sync + 'static,
    {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await?);
        let addr = socket.local_addr()?;
        let commands = Arc::new(Mutex::new(Vec::new()));
        let cancel = CancellationToken::new();

        let log = Arc::clone(&commands);
        let token = cancel.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 2048];
            loop {
                let (len, from) = tokio::select! {
                    _ = token.cancelled() => break,
                    result = socket.recv_from(&mut buf) => match result {
                        Ok(received) => received,
                        Err(e) => {
                            debug!("Mock capture server receive error: {}", e);
                            continue;
                        }
                    },
                };

                let command = String::from_utf8_lossy(&buf[..len]).into_owned();
                trace!(%command, "Mock capture server received");
                let reply = respond(&command);
                log.lock().unwrap().push(command);

                if let Some(reply) = reply {
                    let socket = Arc::clone(&socket);
                    tokio::spawn(async move {
                        tokio::time::sleep(reply.delay).await;
                        let _ = socket.send_to(reply.text.as_bytes(), from).await;
                    });
                }
            }
        });

        Ok(Self { addr, commands, cancel })
    }

    /// Server that answers the way the real capture server does: the
    /// streaming handshake and glasses query get their confirmations,
    /// everything else is silent.
    pub async fn reference() -> io::Result<Self> {
        Self::spawn(|command| match command.split(':').next() {
            Some("StartStreaming") => Some(MockReply::now(STARTED_STREAMING)),
            Some("GlassesStatus") => Some(MockReply::now(GLASSES_CONNECTED)),
            _ => None,
        })
        .await
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Commands received so far, in arrival order.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Number of received commands starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.commands.lock().unwrap().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Wait until at least `count` commands arrived or `timeout` elapsed.
    pub async fn wait_for_commands(&self, count: usize, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.commands.lock().unwrap().len() < count && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl Drop for MockCaptureServer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Sends frame datagrams to a local stream port.
pub struct FrameSender {
    socket: UdpSocket,
}

impl FrameSender {
    pub async fn connect(port: u16) -> io::Result<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        socket.connect(SocketAddr::from(([127, 0, 0, 1], port))).await?;
        Ok(Self { socket })
    }

    /// Send `payload` with its length prefix.
    pub async fn send_frame(&self, payload: &[u8]) -> io::Result<()> {
        self.send_raw(&FramePacket::encode(payload)).await
    }

    /// Send bytes exactly as given.
    pub async fn send_raw(&self, datagram: &[u8]) -> io::Result<()> {
        self.socket.send(datagram).await.map(|_| ())
    }
}

/// In-memory transport that records every command.
///
/// Without a scripted outcome it behaves like a healthy server: commands
/// that expect a reply are confirmed, the rest are delivered.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<String>>,
    outcome: Option<ControlOutcome>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every command with `outcome`.
    pub fn with_outcome(outcome: ControlOutcome) -> Self {
        Self { sent: Mutex::default(), outcome: Some(outcome) }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.sent.lock().unwrap().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

#[async_trait::async_trait]
impl ControlTransport for RecordingTransport {
    async fn request(&self, command: &Command) -> ControlOutcome {
        self.sent.lock().unwrap().push(command.to_string());
        match &self.outcome {
            Some(outcome) => outcome.clone(),
            None if command.expected_reply().is_some() => ControlOutcome::Confirmed,
            None => ControlOutcome::Delivered,
        }
    }
}

/// Batch of `len` ego gestures: `EGO_00`, `EGO_01`, ...
pub fn batch_of(len: usize) -> SessionBatch {
    SessionBatch::new((0..len).map(|i| GestureId::new(format!("EGO_{i:02}"))).collect())
}

/// Pool of `len` gestures spread across the categories.
pub fn sample_pool(len: usize) -> Vec<GestureId> {
    const PREFIXES: [&str; 3] = ["EGO", "ETC", "NUM"];
    (0..len).map(|i| GestureId::new(format!("{}_{i}", PREFIXES[i % PREFIXES.len()]))).collect()
}

static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Temporary directory removed on drop.
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn new(name: &str) -> Self {
        let unique = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir()
            .join(format!("gesture-recorder-{name}-{}-{unique}", std::process::id()));
        let _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir_all(&path).expect("create scratch directory");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}
