//! Recording session state machine

use futures::Stream;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::control::{Command, ControlTransport};
use crate::scheduler::SessionBatch;
use crate::types::GestureId;
use crate::{RecorderError, Result};

/// Seconds counted down before the first gesture is recorded.
pub const DEFAULT_COUNTDOWN_SECS: u32 = 3;

/// Where a recording session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum SessionState {
    /// Seconds left before recording starts
    Countdown(u32),
    /// Recording the gesture at this batch index
    Recording(usize),
    /// Previous clip stopped, switching to this batch index
    AdvancingTo(usize),
    /// Every gesture in the batch was recorded
    Completed,
    /// Operator went back to the menu; the batch will be reused
    BackToMenu,
    /// Operator asked to quit the application
    Exiting,
}

impl SessionState {
    /// The session is over and control returns to the caller.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::BackToMenu | SessionState::Exiting)
    }
}

/// Drives countdown, per-gesture recording and exits for one batch.
///
/// Control commands are best effort: a negative or missing reply is logged
/// and the session advances locally anyway.
pub struct RecordingSession<C> {
    batch: SessionBatch,
    control: Arc<C>,
    state: watch::Sender<SessionState>,
    streaming_stopped: bool,
    reuse_batch: bool,
}

impl<C: ControlTransport> RecordingSession<C> {
    /// Create a session in `Countdown(countdown_secs)`.
    pub fn new(batch: SessionBatch, control: Arc<C>, countdown_secs: u32) -> Result<Self> {
        if batch.is_empty() {
            return Err(RecorderError::EmptyBatch);
        }
        let (state, _) = watch::channel(SessionState::Countdown(countdown_secs));
        Ok(Self { batch, control, state, streaming_stopped: false, reuse_batch: false })
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Watch state changes, e.g. to re-render the gesture preview.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// State changes as a stream, starting with the current state.
    pub fn state_updates(&self) -> impl Stream<Item = SessionState> + 'static {
        WatchStream::new(self.state.subscribe())
    }

    pub fn batch(&self) -> &SessionBatch {
        &self.batch
    }

    /// Gesture being recorded or switched to.
    pub fn active_gesture(&self) -> Option<&GestureId> {
        match self.state() {
            SessionState::Recording(index) | SessionState::AdvancingTo(index) => self.batch.get(index),
            _ => None,
        }
    }

    /// Whether the session ended in a way that keeps the batch for next time.
    pub fn reuse_requested(&self) -> bool {
        self.reuse_batch
    }

    fn publish(&self, next: SessionState) {
        let previous = self.state.send_replace(next);
        debug!(?previous, ?next, "Session state changed");
    }

    async fn notify(&self, command: Command) {
        let outcome = self.control.request(&command).await;
        if !outcome.is_success() {
            warn!(
                command = command.name(),
                ?outcome,
                "Capture server did not accept command; continuing"
            );
        }
    }

    async fn start_gesture(&mut self, index: usize) {
        if let Some(id) = self.batch.get(index) {
            info!(index, gesture = %id, "Recording gesture");
            self.notify(Command::StartRecording(id.numeric())).await;
        }
        self.publish(SessionState::Recording(index));
    }

    /// Advance the countdown by one second; reaching zero starts recording
    /// the first gesture.
    pub async fn tick(&mut self) -> Result<SessionState> {
        let SessionState::Countdown(remaining) = self.state() else {
            return Err(RecorderError::invalid_transition(self.state(), "tick the countdown"));
        };

        let remaining = remaining.saturating_sub(1);
        self.publish(SessionState::Countdown(remaining));
        if remaining == 0 {
            self.start_gesture(0).await;
        }
        Ok(self.state())
    }

    /// Tick once per second until the countdown is over.
    pub async fn run_countdown(&mut self) -> Result<SessionState> {
        let mut ticks = tokio::time::interval(Duration::from_secs(1));
        ticks.tick().await;

        loop {
            match self.state() {
                SessionState::Countdown(0) => {
                    self.tick().await?;
                }
                SessionState::Countdown(_) => {
                    ticks.tick().await;
                    self.tick().await?;
                }
                state => return Ok(state),
            }
        }
    }

    /// Stop the current clip and move to the next gesture, or finish the
    /// batch after the last one.
    pub async fn advance(&mut self) -> Result<SessionState> {
        let SessionState::Recording(index) = self.state() else {
            return Err(RecorderError::invalid_transition(self.state(), "stop recording"));
        };

        self.notify(Command::StopRecording).await;

        let next = index + 1;
        if next < self.batch.len() {
            self.publish(SessionState::AdvancingTo(next));
            self.start_gesture(next).await;
        } else {
            self.stop_streaming().await;
            info!("Recorded all {} gestures in the batch", self.batch.len());
            self.publish(SessionState::Completed);
        }
        Ok(self.state())
    }

    /// Return to the menu, keeping the batch. Only allowed before any clip
    /// past the first one has been started.
    pub async fn back(&mut self) -> Result<SessionState> {
        match self.state() {
            SessionState::Countdown(_) | SessionState::Recording(0) => {}
            state => return Err(RecorderError::invalid_transition(state, "go back to the menu")),
        }

        self.stop_streaming().await;
        self.reuse_batch = true;
        self.publish(SessionState::BackToMenu);
        Ok(self.state())
    }

    /// Stop streaming and enter `Exiting`. The caller terminates the process.
    pub async fn exit(&mut self) -> Result<SessionState> {
        if self.state() == SessionState::Exiting {
            return Ok(SessionState::Exiting);
        }
        self.stop_streaming().await;
        self.publish(SessionState::Exiting);
        Ok(self.state())
    }

    async fn stop_streaming(&mut self) {
        if std::mem::replace(&mut self.streaming_stopped, true) {
            debug!("Streaming already stopped");
            return;
        }
        self.notify(Command::StopStreaming).await;
    }
}
