//! COM and Media Foundation lifetime.

use tracing::{debug, instrument, warn};
use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
use windows::Win32::Media::MediaFoundation::{MFShutdown, MFStartup, MFSTARTUP_FULL, MF_VERSION};
use windows::Win32::System::Com::{
    CoInitializeEx, CoUninitialize, COINIT, COINIT_APARTMENTTHREADED, COINIT_DISABLE_OLE1DDE,
};

use crate::error::DeviceError;
use crate::DeviceResult;

/// Keeps COM and Media Foundation running on the current thread.
///
/// Must be created and dropped on the same thread. Every other Media
/// Foundation object should be released before the guard goes away.
pub struct MediaFoundation {
    com_initialized: bool,
}

impl MediaFoundation {
    /// Initialize COM (apartment threaded) and start Media Foundation.
    #[instrument(name = "media_foundation_startup")]
    pub fn startup() -> DeviceResult<Self> {
        let flags = COINIT(COINIT_APARTMENTTHREADED.0 | COINIT_DISABLE_OLE1DDE.0);
        let hr = unsafe { CoInitializeEx(None, flags) };

        // S_FALSE still needs a matching CoUninitialize.
        let com_initialized = if hr == RPC_E_CHANGED_MODE {
            warn!("COM already initialized with a different threading model");
            false
        } else if hr.is_err() {
            return Err(DeviceError::api("CoInitializeEx", hr.into()));
        } else {
            true
        };

        if let Err(e) = unsafe { MFStartup(MF_VERSION, MFSTARTUP_FULL) } {
            if com_initialized {
                unsafe { CoUninitialize() };
            }
            return Err(DeviceError::api("MFStartup", e));
        }

        debug!("Media Foundation started");
        Ok(Self { com_initialized })
    }
}

impl Drop for MediaFoundation {
    fn drop(&mut self) {
        if let Err(e) = unsafe { MFShutdown() } {
            warn!(error = %e, "MFShutdown failed");
        }
        if self.com_initialized {
            unsafe { CoUninitialize() };
        }
        debug!("Media Foundation shut down");
    }
}
