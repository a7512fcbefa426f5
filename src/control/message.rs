//! Text commands understood by the capture server

use std::fmt;
use std::str::FromStr;

use crate::types::{NO_NOTE, NumericGestureId, StreamingOptions};
use crate::{RecorderError, Result};

/// Reply to a successful `StartStreaming`.
pub const STARTED_STREAMING: &str = "StartedStreaming";
/// Reply to `GlassesStatus` when the glasses are reachable.
pub const GLASSES_CONNECTED: &str = "GlassesConnected";
/// Reply to `GlassesStatus` otherwise.
pub const GLASSES_NOT_CONNECTED: &str = "GlassesNotConnected";

/// Separator between the command token and its arguments.
pub const ARG_SEPARATOR: char = ':';

/// Command token plus ordered arguments, encoded as `command:arg1:arg2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlMessage {
    pub command: String,
    pub args: Vec<String>,
}

impl ControlMessage {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into(), args: Vec::new() }
    }

    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn encode(&self) -> String {
        let mut text = self.command.clone();
        for arg in &self.args {
            text.push(ARG_SEPARATOR);
            text.push_str(arg);
        }
        text
    }

    /// Split received text back into command and arguments.
    pub fn parse(text: &str) -> Self {
        let mut parts = text.split(ARG_SEPARATOR);
        let command = parts.next().unwrap_or_default().to_string();
        Self { command, args: parts.map(str::to_string).collect() }
    }
}

impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Everything the client can ask of the capture server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the preview stream and configure file naming and device
    StartStreaming(StreamingOptions),
    /// Start writing a clip for the given gesture
    StartRecording(NumericGestureId),
    StopRecording,
    StopStreaming,
    /// Ask whether the eye-tracking glasses are reachable
    GlassesStatus,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::StartStreaming(_) => "StartStreaming",
            Command::StartRecording(_) => "StartRecording",
            Command::StopRecording => "StopRecording",
            Command::StopStreaming => "StopStreaming",
            Command::GlassesStatus => "GlassesStatus",
        }
    }

    pub fn to_message(&self) -> ControlMessage {
        let message = ControlMessage::new(self.name());
        match self {
            Command::StartStreaming(options) => message
                .arg(options.wire_note())
                .arg(if options.include_date { "1" } else { "0" })
                .arg(options.device)
                .arg(options.save_at),
            Command::StartRecording(numeric) => message.arg(numeric),
            Command::StopRecording | Command::StopStreaming | Command::GlassesStatus => message,
        }
    }

    /// Reply that counts as success. `None` marks a one-way notification
    /// that the server never answers.
    pub fn expected_reply(&self) -> Option<&'static str> {
        match self {
            Command::StartStreaming(_) => Some(STARTED_STREAMING),
            Command::GlassesStatus => Some(GLASSES_CONNECTED),
            Command::StartRecording(_) | Command::StopRecording | Command::StopStreaming => None,
        }
    }
}

impl TryFrom<&ControlMessage> for Command {
    type Error = RecorderError;

    fn try_from(message: &ControlMessage) -> Result<Self> {
        let args: Vec<&str> = message.args.iter().map(String::as_str).collect();
        match (message.command.as_str(), args.as_slice()) {
            ("StartStreaming", [note, date, device, save_at]) => {
                let include_date = match *date {
                    "0" => false,
                    "1" => true,
                    other => {
                        let reason = format!("date flag {other:?}");
                        return Err(RecorderError::parse("StartStreaming", reason));
                    }
                };
                Ok(Command::StartStreaming(StreamingOptions {
                    note: if *note == NO_NOTE { String::new() } else { note.to_string() },
                    include_date,
                    device: device.parse()?,
                    save_at: save_at.parse()?,
                }))
            }
            ("StartRecording", [numeric]) if !numeric.is_empty() => {
                Ok(Command::StartRecording(NumericGestureId::from_wire(numeric)))
            }
            ("StopRecording", []) => Ok(Command::StopRecording),
            ("StopStreaming", []) => Ok(Command::StopStreaming),
            ("GlassesStatus", []) => Ok(Command::GlassesStatus),
            (command, args) => Err(RecorderError::parse(
                "control command",
                format!("{command} with {} argument(s) is not a known command", args.len()),
            )),
        }
    }
}

impl FromStr for Command {
    type Err = RecorderError;

    fn from_str(text: &str) -> Result<Self> {
        Command::try_from(&ControlMessage::parse(text.trim()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_message().encode())
    }
}
