//! Capture engine.
//!
//! The engine owns the selection state (media kind, container, device and
//! output file), drives a [`CaptureBackend`] and reports progress to a
//! front end over the `mfcapture-ipc` channels.

mod backend;
mod controller;
mod error;
mod orchestrator;

#[cfg(windows)]
pub use backend::MediaFoundationBackend;
pub use backend::{CaptureBackend, CaptureRequest};
pub use controller::{rename_extension, Controller};
pub use error::EngineError;
pub use orchestrator::{Engine, COMMAND_POLL_INTERVAL, DEVICE_CHECK_INTERVAL, STOP_ERROR_MESSAGE};

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(windows)]
use crossbeam_channel::{Receiver, Sender};
#[cfg(windows)]
use mfcapture_ipc::{CaptureConfig, EngineCommand, EngineEvent};

/// Create an engine backed by Media Foundation.
///
/// Call this on the thread that will run the engine.
#[cfg(windows)]
pub fn create_engine(
    command_rx: Receiver<EngineCommand>,
    event_tx: Sender<EngineEvent>,
    config: CaptureConfig,
) -> EngineResult<Engine<MediaFoundationBackend>> {
    let backend = MediaFoundationBackend::new()?;
    Ok(Engine::new(command_rx, event_tx, backend, config))
}
