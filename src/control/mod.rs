//! Control channel to the capture server.
//!
//! The protocol is plain text over UDP, always client-initiated:
//!
//! | Command                                         | Reply                                    |
//! |-------------------------------------------------|------------------------------------------|
//! | `StartStreaming:<note>:<0/1>:<device>:<saveAt>` | `StartedStreaming`                       |
//! | `GlassesStatus`                                 | `GlassesConnected` / `GlassesNotConnected` |
//! | `StartRecording:<numericGestureId>`             | none                                     |
//! | `StopRecording`                                 | none                                     |
//! | `StopStreaming`                                 | none                                     |
//!
//! There are no sequence numbers or retries. A reply is compared by exact
//! match; anything else, or silence past the deadline, is a negative
//! [`ControlOutcome`]. [`ControlChannel`] allows one request in flight at a
//! time so replies cannot be cross-matched.

mod channel;
mod message;

pub use channel::{ControlChannel, ControlOutcome, ControlTransport, DEFAULT_RESPONSE_TIMEOUT};
pub use message::{
    ARG_SEPARATOR, Command, ControlMessage, GLASSES_CONNECTED, GLASSES_NOT_CONNECTED,
    STARTED_STREAMING,
};
