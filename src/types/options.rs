//! Streaming options chosen on the menu screen

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::RecorderError;

/// Note sent when the operator left the file name note empty.
pub const NO_NOTE: &str = "NoNote";

/// Device the capture server records from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum RecordingDevice {
    #[default]
    Camera,
    Glasses,
}

impl RecordingDevice {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordingDevice::Camera => "Camera",
            RecordingDevice::Glasses => "Glasses",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            RecordingDevice::Camera => RecordingDevice::Glasses,
            RecordingDevice::Glasses => RecordingDevice::Camera,
        }
    }
}

impl fmt::Display for RecordingDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the glasses recording is stored. Ignored for the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum SaveLocation {
    #[default]
    Phone,
    Local,
}

impl SaveLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            SaveLocation::Phone => "Phone",
            SaveLocation::Local => "Local",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            SaveLocation::Phone => SaveLocation::Local,
            SaveLocation::Local => SaveLocation::Phone,
        }
    }
}

impl FromStr for RecordingDevice {
    type Err = RecorderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Camera" => Ok(RecordingDevice::Camera),
            "Glasses" => Ok(RecordingDevice::Glasses),
            other => Err(RecorderError::parse("recording device", format!("unknown device {other:?}"))),
        }
    }
}

impl FromStr for SaveLocation {
    type Err = RecorderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Phone" => Ok(SaveLocation::Phone),
            "Local" => Ok(SaveLocation::Local),
            other => Err(RecorderError::parse("save location", format!("unknown location {other:?}"))),
        }
    }
}

impl fmt::Display for SaveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments of the `StartStreaming` handshake.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct StreamingOptions {
    /// Free-form note the server appends to recording file names
    pub note: String,
    /// Whether the server stamps file names with the current date
    pub include_date: bool,
    pub device: RecordingDevice,
    pub save_at: SaveLocation,
}

impl StreamingOptions {
    /// Note as sent on the wire. Colons would split the argument list, so
    /// they are replaced.
    pub fn wire_note(&self) -> String {
        let note = self.note.trim();
        if note.is_empty() { NO_NOTE.to_string() } else { note.replace(':', "_") }
    }

    /// Flip between camera and glasses. Switching back to the camera resets
    /// the save location, which only applies to glasses.
    pub fn toggle_device(&mut self) {
        self.device = self.device.toggle();
        if self.device == RecordingDevice::Camera {
            self.save_at = SaveLocation::default();
        }
    }

    /// Flip the save location. No-op while the camera is selected.
    pub fn toggle_save_at(&mut self) {
        if self.device == RecordingDevice::Glasses {
            self.save_at = self.save_at.toggle();
        }
    }
}
