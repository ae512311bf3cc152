//! Events sent from the engine to the front end.

use serde::{Deserialize, Serialize};

use crate::state::{EngineState, StopReason};
use crate::types::{ControlState, DeviceInfo, MediaKind};

/// Events that the engine can send to the front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EngineEvent {
    /// Engine state has changed.
    StateChanged {
        /// Previous state.
        previous: Box<EngineState>,

        /// Current state.
        current: Box<EngineState>,
    },

    /// Fresh device list for a media kind, with the selected entry.
    Devices {
        kind: MediaKind,
        devices: Vec<DeviceInfo>,
        selected: Option<usize>,
    },

    /// Control availability changed.
    Controls(ControlState),

    /// The output path was changed by the engine (extension follows the format).
    OutputPath(String),

    /// Error occurred.
    Error {
        /// Whether the error is recoverable.
        recoverable: bool,

        /// Error message.
        message: String,
    },

    /// The active capture device disappeared.
    DeviceLost,

    /// A capture ended and its file was finalized.
    CaptureFinished {
        /// File that was written.
        path: String,

        /// Why it ended.
        reason: StopReason,
    },

    /// Engine is ready.
    Ready,

    /// Engine has shut down.
    Shutdown,
}
