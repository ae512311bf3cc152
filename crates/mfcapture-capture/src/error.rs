//! Error types for the capture module.

use thiserror::Error;

use mfcapture_device::DeviceError;
use mfcapture_wave::WaveError;

/// Errors that can occur during capture operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Windows API error.
    #[error("Windows API error: {message}")]
    WindowsApi {
        message: String,
        #[cfg(windows)]
        #[source]
        source: Option<windows::core::Error>,
    },

    /// Device enumeration or activation failed.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Writing the WAVE file failed.
    #[error(transparent)]
    Wave(#[from] WaveError),

    /// Capture already started.
    #[error("Capture already started")]
    AlreadyCapturing,

    /// The output format does not match the kind of the device list.
    #[error("Cannot record a {device} device as {format}")]
    KindMismatch {
        device: mfcapture_ipc::MediaKind,
        format: mfcapture_ipc::OutputFormat,
    },

    /// The source reader flagged an error on the stream.
    #[error("Source reader reported a stream error")]
    StreamError,
}

#[cfg(windows)]
impl From<windows::core::Error> for CaptureError {
    fn from(err: windows::core::Error) -> Self {
        Self::WindowsApi {
            message: err.message().to_string(),
            source: Some(err),
        }
    }
}

#[cfg(windows)]
impl CaptureError {
    /// Wrap a Windows error with the name of the failing step.
    pub fn api(context: &str, err: windows::core::Error) -> Self {
        Self::WindowsApi {
            message: format!(
                "{context}: {}",
                mfcapture_device::describe_hresult(err.code().0 as u32)
            ),
            source: Some(err),
        }
    }
}

impl CaptureError {
    /// HRESULT carried by this error, if it came from a Windows call.
    pub fn hresult(&self) -> Option<u32> {
        match self {
            #[cfg(windows)]
            Self::WindowsApi {
                source: Some(err), ..
            } => Some(err.code().0 as u32),
            #[cfg(windows)]
            Self::Device(err) => err.hresult(),
            _ => None,
        }
    }
}
