//! Error types for the engine.

use thiserror::Error;

use mfcapture_capture::CaptureError;
use mfcapture_device::DeviceError;

/// Errors that can occur while driving a capture.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No capture devices of the requested kind.
    #[error("Could not find any capture devices.")]
    NoDevices,

    /// Device index outside the current list.
    #[error("Invalid device index {index} (have {count})")]
    InvalidDevice { index: usize, count: usize },

    /// The selected device disappeared between enumeration and start.
    #[error("Device '{name}' is no longer available")]
    DeviceUnavailable { name: String },

    /// Enumeration failed.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Starting or stopping the capture failed.
    #[error(transparent)]
    Capture(#[from] CaptureError),
}
