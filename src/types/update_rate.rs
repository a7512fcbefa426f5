//! Preview refresh rate control

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How often the preview consumer wants frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum UpdateRate {
    /// Every decoded frame, as fast as the server sends them
    Native,

    /// At most this many frames per second, newest frame wins.
    /// `Max(0)` is treated as `Native`.
    Max(u32),
}

impl UpdateRate {
    /// Interval between emitted frames, or `None` when no throttling applies.
    pub fn throttle_interval(self) -> Option<Duration> {
        match self {
            UpdateRate::Native | UpdateRate::Max(0) => None,
            UpdateRate::Max(hz) => Some(Duration::from_secs_f64(1.0 / hz as f64)),
        }
    }
}
