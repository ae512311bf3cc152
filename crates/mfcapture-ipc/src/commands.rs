//! Commands sent from the front end to the engine.

use serde::{Deserialize, Serialize};

use crate::types::{ContainerSlot, MediaKind};

/// Commands that the front end can send to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EngineCommand {
    /// Re-enumerate capture devices of the selected kind.
    RefreshDevices,

    /// Switch between audio and video capture.
    SelectMediaKind(MediaKind),

    /// Switch between the two containers offered for the current kind.
    SelectContainer(ContainerSlot),

    /// Set the output file path.
    SetOutputPath(String),

    /// Select a device by its index in the last enumeration.
    SelectDevice(usize),

    /// Start capturing with the current selection.
    StartCapture,

    /// Stop the current capture.
    StopCapture,

    /// Start if idle, stop if capturing.
    ToggleCapture,

    /// Request current engine state.
    GetState,

    /// Shutdown the engine completely.
    Shutdown,
}
