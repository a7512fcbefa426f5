//! Core value types shared by the scheduler, control channel and stream.
//!
//! - [`GestureId`] is the opaque gesture token drawn by the scheduler, with a
//!   closed [`GestureCategory`] and a derived [`NumericGestureId`] wire form
//! - [`FramePacket`] is one decoded preview image from the stream socket
//! - [`StreamingOptions`] carries the `StartStreaming` arguments
//! - [`UpdateRate`] controls how often the preview consumer sees frames
//!
//! ```rust
//! use gesture_recorder::types::{FramePacket, GestureCategory, GestureId};
//!
//! let id = GestureId::from("NUM_4_four");
//! assert_eq!(id.category(), GestureCategory::Num);
//! assert_eq!(id.numeric().as_str(), "24");
//!
//! let datagram = FramePacket::encode(b"jpeg");
//! let frame = FramePacket::decode(&datagram, 0).unwrap();
//! assert_eq!(&*frame.data, b"jpeg");
//! ```

mod frame;
mod gesture;
mod options;
mod update_rate;

pub use frame::{FramePacket, LENGTH_PREFIX_LEN, MalformedFrame};
pub use gesture::{GestureCategory, GestureId, NumericGestureId};
pub use options::{NO_NOTE, RecordingDevice, SaveLocation, StreamingOptions};
pub use update_rate::UpdateRate;
