//! Typed front-end<->engine messages for mfcapture.
//!
//! This crate defines the message and value types shared between a
//! front end (the CLI) and the capture engine.

mod commands;
mod events;
mod state;
mod types;

pub use commands::EngineCommand;
pub use events::EngineEvent;
pub use state::{ActiveCapture, EngineState, StopReason};
pub use types::{
    CaptureConfig, ContainerSlot, ControlState, DeviceInfo, EncodingParameters, MediaKind,
    OutputFormat, DEFAULT_OUTPUT_FILE, TARGET_BIT_RATE,
};

use crossbeam_channel::{Receiver, Sender};

/// Channel capacity for commands (front end → engine).
pub const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Channel capacity for events (engine → front end).
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Creates a bounded command channel.
pub fn command_channel() -> (Sender<EngineCommand>, Receiver<EngineCommand>) {
    crossbeam_channel::bounded(COMMAND_CHANNEL_CAPACITY)
}

/// Creates a bounded event channel.
pub fn event_channel() -> (Sender<EngineEvent>, Receiver<EngineEvent>) {
    crossbeam_channel::bounded(EVENT_CHANNEL_CAPACITY)
}
