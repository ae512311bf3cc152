//! Engine state machine types.

use serde::{Deserialize, Serialize};

use crate::types::{MediaKind, OutputFormat};

/// The current state of the capture engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum EngineState {
    /// No capture in progress.
    #[default]
    Idle,

    /// Samples are flowing from the device into the sink writer.
    Capturing {
        /// What is being recorded.
        session: ActiveCapture,
    },

    /// The sink writer is being finalized.
    Stopping {
        /// Reason for stopping.
        reason: StopReason,
    },

    /// The last operation failed.
    Error {
        /// Error message.
        message: String,

        /// Whether another capture can be attempted.
        recoverable: bool,
    },
}

impl EngineState {
    /// Returns true if the engine is idle.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true if a capture is running.
    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing { .. })
    }

    /// Returns true if the engine is stopping.
    pub fn is_stopping(&self) -> bool {
        matches!(self, Self::Stopping { .. })
    }

    /// Returns true if the engine is in an error state.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Returns a simple string representation of the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Capturing { .. } => "Capturing",
            Self::Stopping { .. } => "Stopping",
            Self::Error { .. } => "Error",
        }
    }
}

/// Description of the capture in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCapture {
    /// Friendly name of the device.
    pub device_name: String,

    /// Kind of device.
    pub kind: MediaKind,

    /// Encoded output format.
    pub format: OutputFormat,

    /// File being written.
    pub output_path: String,
}

/// Reason a capture ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// User requested stop.
    UserRequested,

    /// The configured maximum duration was reached.
    DurationElapsed,

    /// The capture device was removed.
    DeviceLost,

    /// The asynchronous read or the sink writer failed.
    CaptureError { message: String },

    /// The engine is shutting down.
    Shutdown,
}

impl StopReason {
    /// Returns a display message for this reason.
    pub fn message(&self) -> String {
        match self {
            Self::UserRequested => "Capture stopped by user".to_string(),
            Self::DurationElapsed => "Maximum capture duration reached".to_string(),
            Self::DeviceLost => "The capture device was removed or lost".to_string(),
            Self::CaptureError { message } => format!("Capture error: {message}"),
            Self::Shutdown => "Engine shutting down".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(EngineState::default().is_idle());

        let capturing = EngineState::Capturing {
            session: ActiveCapture {
                device_name: "Microphone".into(),
                kind: MediaKind::Audio,
                format: OutputFormat::Wma,
                output_path: "capture.wma".into(),
            },
        };
        assert!(capturing.is_capturing());
        assert_eq!(capturing.name(), "Capturing");

        let error = EngineState::Error {
            message: "boom".into(),
            recoverable: true,
        };
        assert!(error.is_error());
        assert!(!error.is_capturing());
    }

    #[test]
    fn test_stop_reason_messages() {
        assert_eq!(
            StopReason::DeviceLost.message(),
            "The capture device was removed or lost"
        );
        assert_eq!(
            StopReason::CaptureError {
                message: "sink failed".into()
            }
            .message(),
            "Capture error: sink failed"
        );
    }
}
