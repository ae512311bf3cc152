//! The seam between the engine and the platform capture stack.

use mfcapture_capture::CaptureFailure;
use mfcapture_ipc::{DeviceInfo, EncodingParameters, MediaKind};

use crate::EngineResult;

/// What to record and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub device: DeviceInfo,
    pub output_path: String,
    pub params: EncodingParameters,
}

/// Device enumeration and one capture at a time.
pub trait CaptureBackend {
    /// Current devices of `kind`.
    fn enumerate(&mut self, kind: MediaKind) -> EngineResult<Vec<DeviceInfo>>;

    /// Begin recording. Fails if a capture is already running.
    fn start(&mut self, request: &CaptureRequest) -> EngineResult<()>;

    /// Stop recording and finalize the file. Stopping when idle is a no-op.
    fn stop(&mut self) -> EngineResult<()>;

    fn is_capturing(&self) -> bool;

    /// Whether `removed_link` identifies the device being recorded.
    fn is_device_lost(&self, removed_link: &str) -> bool;

    /// Next asynchronous failure, if any.
    fn poll_failure(&mut self) -> Option<CaptureFailure>;
}

#[cfg(windows)]
pub use platform::MediaFoundationBackend;

#[cfg(windows)]
mod platform {
    use tracing::{debug, info, instrument};

    use mfcapture_capture::{CaptureFailure, CaptureSession};
    use mfcapture_device::{DeviceList, MediaFoundation};
    use mfcapture_ipc::{DeviceInfo, MediaKind};

    use super::{CaptureBackend, CaptureRequest};
    use crate::error::EngineError;
    use crate::EngineResult;

    /// Capture through Media Foundation source readers and sink writers.
    ///
    /// Must be created and used on one thread; it owns that thread's COM
    /// apartment.
    pub struct MediaFoundationBackend {
        session: CaptureSession,
        devices: DeviceList,
        // Dropped last: shuts Media Foundation down.
        _runtime: MediaFoundation,
    }

    impl MediaFoundationBackend {
        #[instrument(name = "mf_backend_new")]
        pub fn new() -> EngineResult<Self> {
            let runtime = MediaFoundation::startup()?;
            info!("Media Foundation started");
            Ok(Self {
                session: CaptureSession::new(),
                devices: DeviceList::new(),
                _runtime: runtime,
            })
        }

        /// Index of `device` in a fresh enumeration of its kind, matched by
        /// symbolic link when it has one.
        fn locate(&mut self, device: &DeviceInfo) -> EngineResult<usize> {
            self.devices.enumerate(device.kind)?;
            let listed = self.devices.describe();

            let found = match device.symbolic_link.as_deref() {
                Some(link) => listed.iter().position(|d| d.matches_link(link)),
                None => (device.index < listed.len()).then_some(device.index),
            };
            found.ok_or_else(|| EngineError::DeviceUnavailable {
                name: device.name.clone(),
            })
        }
    }

    impl CaptureBackend for MediaFoundationBackend {
        fn enumerate(&mut self, kind: MediaKind) -> EngineResult<Vec<DeviceInfo>> {
            self.devices.enumerate(kind)?;
            Ok(self.devices.describe())
        }

        fn start(&mut self, request: &CaptureRequest) -> EngineResult<()> {
            let index = self.locate(&request.device)?;
            debug!(index, device = %request.device.name, "Starting capture");
            self.session
                .start(&self.devices, index, &request.output_path, request.params)?;
            Ok(())
        }

        fn stop(&mut self) -> EngineResult<()> {
            Ok(self.session.end()?)
        }

        fn is_capturing(&self) -> bool {
            self.session.is_capturing()
        }

        fn is_device_lost(&self, removed_link: &str) -> bool {
            self.session.check_device_lost(removed_link)
        }

        fn poll_failure(&mut self) -> Option<CaptureFailure> {
            self.session.poll_failure()
        }
    }
}
