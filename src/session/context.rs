//! Application-wide session context

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::controller::{RecordingSession, SessionState};
use crate::config::RecorderConfig;
use crate::control::{Command, ControlChannel, ControlOutcome, ControlTransport};
use crate::scheduler::{
    BatchCursor, FileQueueStore, GestureBatchScheduler, QueueStateStore, SessionBatch, discover_pool,
};
use crate::stream::StreamIngestionPipeline;
use crate::types::{GestureId, RecordingDevice, StreamingOptions};
use crate::{RecorderError, Result};

/// A running recording: the session state machine and its preview feed.
pub struct ActiveRecording<C> {
    pub session: RecordingSession<C>,
    pub preview: StreamIngestionPipeline,
}

impl<C> ActiveRecording<C> {
    /// Address the preview socket is bound to.
    pub fn preview_addr(&self) -> Option<SocketAddr> {
        self.preview.local_addr()
    }
}

/// Owns everything that outlives a single recording session: the
/// scheduler, the control channel, the operator's streaming options and
/// the menu cursor.
///
/// Passed explicitly to whoever needs it; there is no global instance.
pub struct SessionContext<C = ControlChannel, S = FileQueueStore> {
    config: RecorderConfig,
    scheduler: GestureBatchScheduler<S>,
    control: Arc<C>,
    options: StreamingOptions,
    glasses_connected: bool,
    cursor: BatchCursor,
}

impl SessionContext {
    /// Initialize with the queue state file named in the configuration.
    pub async fn init(config: RecorderConfig) -> Result<Self> {
        let store = FileQueueStore::new(&config.session.queue_state_path);
        Self::init_with_store(config, store).await
    }
}

impl<S: QueueStateStore> SessionContext<ControlChannel, S> {
    /// Load the gesture pool and saved queue, then open the control channel.
    pub async fn init_with_store(config: RecorderConfig, store: S) -> Result<Self> {
        config.validate()?;

        let control = ControlChannel::from_config(&config.control).await?;
        let scheduler = GestureBatchScheduler::new(store);
        let mut context = Self::with_parts(config, scheduler, Arc::new(control));

        if let Some(dir) = context.config.pool.clip_directory.clone() {
            let ids = discover_pool(&dir, &context.config.pool.clip_extension);
            info!("Discovered {} gestures in {}", ids.len(), dir.display());
            context.scheduler.fill_pool(ids);
        }
        context.restore_queue();
        Ok(context)
    }
}

impl<C, S> SessionContext<C, S>
where
    C: ControlTransport + 'static,
    S: QueueStateStore,
{
    /// Assemble a context from already constructed parts.
    pub fn with_parts(
        config: RecorderConfig,
        scheduler: GestureBatchScheduler<S>,
        control: Arc<C>,
    ) -> Self {
        Self {
            config,
            scheduler,
            control,
            options: StreamingOptions::default(),
            glasses_connected: false,
            cursor: BatchCursor::default(),
        }
    }

    /// Load the saved queue. A missing or unreadable state starts a fresh cycle.
    pub fn restore_queue(&mut self) -> bool {
        match self.scheduler.restore() {
            Ok(restored) => restored,
            Err(e) => {
                warn!("Ignoring saved queue state: {}", e);
                false
            }
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &GestureBatchScheduler<S> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut GestureBatchScheduler<S> {
        &mut self.scheduler
    }

    pub fn control(&self) -> &Arc<C> {
        &self.control
    }

    /// Batch for the next session: the kept batch when one is flagged for
    /// reuse, otherwise a fresh draw. Resets the menu cursor.
    pub fn prepare_batch(&mut self) -> Result<&SessionBatch> {
        let size = self.config.session.batch_size;
        let batch = self.scheduler.next_batch(size)?;
        self.cursor = batch.cursor();
        Ok(batch)
    }

    pub fn batch(&self) -> Option<&SessionBatch> {
        self.scheduler.current_batch()
    }

    pub fn cursor(&self) -> BatchCursor {
        self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut BatchCursor {
        &mut self.cursor
    }

    /// Gesture under the menu cursor.
    pub fn selected_gesture(&self) -> Option<&GestureId> {
        self.cursor.current(self.scheduler.current_batch()?)
    }

    pub fn options(&self) -> &StreamingOptions {
        &self.options
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.options.note = note.into();
    }

    pub fn toggle_include_date(&mut self) -> bool {
        self.options.include_date = !self.options.include_date;
        self.options.include_date
    }

    /// Switch between camera and glasses. Glasses can only be selected
    /// while they are reported connected.
    pub fn toggle_device(&mut self) -> RecordingDevice {
        if self.options.device == RecordingDevice::Camera && !self.glasses_connected {
            warn!("Glasses are not connected; staying on camera");
            return self.options.device;
        }
        self.options.toggle_device();
        self.options.device
    }

    pub fn toggle_save_at(&mut self) {
        self.options.toggle_save_at();
    }

    pub fn glasses_connected(&self) -> bool {
        self.glasses_connected
    }

    /// Ask the capture server whether the glasses are connected.
    ///
    /// Any negative or missing reply counts as disconnected and forces the
    /// recording device back to the camera.
    pub async fn refresh_glasses_status(&mut self) -> bool {
        let outcome = self.control.request(&Command::GlassesStatus).await;
        self.glasses_connected = outcome.is_success();

        if !self.glasses_connected {
            info!(?outcome, "Glasses not available");
            if self.options.device == RecordingDevice::Glasses {
                self.options.toggle_device();
            }
        }
        self.glasses_connected
    }

    /// Bind the preview socket, ask the capture server to start streaming,
    /// and hand back a session in countdown.
    pub async fn begin_recording(&mut self) -> Result<ActiveRecording<C>> {
        let batch = self.scheduler.current_batch().cloned().ok_or(RecorderError::EmptyBatch)?;

        if self.options.device == RecordingDevice::Glasses && !self.glasses_connected {
            return Err(RecorderError::DeviceUnavailable { device: self.options.device.to_string() });
        }

        let mut preview = StreamIngestionPipeline::new(self.config.stream.clone());
        preview.start_configured().await?;

        let outcome = self.control.request(&Command::StartStreaming(self.options.clone())).await;
        if outcome != ControlOutcome::Confirmed {
            if let Err(e) = preview.stop().await {
                warn!("Preview did not close cleanly: {}", e);
            }
            return Err(RecorderError::StreamingRefused { reason: format!("{outcome:?}") });
        }

        let countdown = self.config.session.countdown_secs;
        let session = RecordingSession::new(batch, Arc::clone(&self.control), countdown)?;
        info!(device = %self.options.device, save_at = %self.options.save_at, "Streaming started");
        Ok(ActiveRecording { session, preview })
    }

    /// Close the preview and fold the session result back into the scheduler.
    pub async fn end_recording(&mut self, mut active: ActiveRecording<C>) -> SessionState {
        if let Err(e) = active.preview.stop().await {
            warn!("Preview did not close cleanly: {}", e);
        }

        let state = active.session.state();
        if !state.is_terminal() {
            warn!(?state, "Recording ended before the session finished");
        }
        if active.session.reuse_requested() {
            self.scheduler.mark_batch_reuse();
        }
        state
    }

    /// Save the queue. Called on every exit path; failures are logged.
    pub fn shutdown(&self) {
        match self.scheduler.persist() {
            Ok(()) => info!("Queue state saved"),
            Err(e) => error!("Could not save queue state: {}", e),
        }
    }
}
