//! Error types for device enumeration.

use thiserror::Error;

/// Errors that can occur while enumerating or opening capture devices.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Windows API error.
    #[error("Windows API error: {message}")]
    WindowsApi {
        message: String,
        #[cfg(windows)]
        #[source]
        source: Option<windows::core::Error>,
    },

    /// Device index outside the current list.
    #[error("Device index {index} out of range ({count} devices)")]
    InvalidIndex { index: usize, count: usize },

    /// waveIn call failed with an MMRESULT.
    #[error("{context} failed for device {device}: {message} (MMRESULT {code})")]
    Legacy {
        context: &'static str,
        device: usize,
        code: u32,
        message: String,
    },

    /// Writing a recording to disk failed.
    #[error(transparent)]
    Wave(#[from] mfcapture_wave::WaveError),
}

#[cfg(windows)]
impl From<windows::core::Error> for DeviceError {
    fn from(err: windows::core::Error) -> Self {
        Self::WindowsApi {
            message: err.message().to_string(),
            source: Some(err),
        }
    }
}

#[cfg(windows)]
impl DeviceError {
    /// Wrap a Windows error with the name of the failing step.
    pub fn api(context: &str, err: windows::core::Error) -> Self {
        Self::WindowsApi {
            message: format!("{context}: {}", crate::describe_hresult(err.code().0 as u32)),
            source: Some(err),
        }
    }

    /// HRESULT of the underlying Windows error, if any.
    pub fn hresult(&self) -> Option<u32> {
        match self {
            Self::WindowsApi {
                source: Some(err), ..
            } => Some(err.code().0 as u32),
            _ => None,
        }
    }
}
