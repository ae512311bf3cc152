//! Capture device enumeration through `MFEnumDeviceSources`.

use tracing::{debug, instrument, warn};
use windows::core::{GUID, PWSTR};
use windows::Win32::Media::MediaFoundation::{
    IMFActivate, IMFAttributes, IMFMediaSource, IMFSourceReader, IMFSourceReaderCallback,
    MFCreateAttributes, MFCreateSourceReaderFromMediaSource, MFEnumDeviceSources,
    MF_DEVSOURCE_ATTRIBUTE_FRIENDLY_NAME, MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE,
    MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_AUDCAP_ENDPOINT_ID,
    MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_AUDCAP_GUID,
    MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_VIDCAP_GUID,
    MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_VIDCAP_SYMBOLIC_LINK, MF_SOURCE_READER_ASYNC_CALLBACK,
};
use windows::Win32::System::Com::CoTaskMemFree;

use mfcapture_ipc::{DeviceInfo, MediaKind};

use crate::error::DeviceError;
use crate::DeviceResult;

/// Activation objects for the capture devices of one media kind.
#[derive(Default)]
pub struct DeviceList {
    kind: MediaKind,
    devices: Vec<IMFActivate>,
}

impl DeviceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with the current devices of `kind`.
    #[instrument(name = "enumerate_capture_devices", skip(self))]
    pub fn enumerate(&mut self, kind: MediaKind) -> DeviceResult<usize> {
        self.clear();
        self.kind = kind;

        let source_type = match kind {
            MediaKind::Audio => MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_AUDCAP_GUID,
            MediaKind::Video => MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_VIDCAP_GUID,
        };

        let attributes = create_attributes(1)?;
        unsafe { attributes.SetGUID(&MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE, &source_type) }
            .map_err(|e| DeviceError::api("Failed to request capture devices", e))?;

        let mut array: *mut Option<IMFActivate> = std::ptr::null_mut();
        let mut count = 0u32;
        unsafe { MFEnumDeviceSources(&attributes, &mut array, &mut count) }
            .map_err(|e| DeviceError::api("Failed to enumerate devices", e))?;

        if !array.is_null() {
            // Take ownership of each reference, then free the array itself.
            let slots = unsafe { std::slice::from_raw_parts_mut(array, count as usize) };
            self.devices = slots.iter_mut().filter_map(Option::take).collect();
            unsafe { CoTaskMemFree(Some(array as *const _)) };
        }

        debug!(count = self.devices.len(), "Enumerated capture devices");
        Ok(self.devices.len())
    }

    /// Release every activation object.
    pub fn clear(&mut self) {
        self.devices.clear();
    }

    pub fn count(&self) -> usize {
        self.devices.len()
    }

    /// Media kind of the last enumeration.
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// A new reference to the activation object at `index`.
    pub fn activate(&self, index: usize) -> DeviceResult<IMFActivate> {
        self.devices
            .get(index)
            .cloned()
            .ok_or(DeviceError::InvalidIndex {
                index,
                count: self.devices.len(),
            })
    }

    /// Friendly name of the device at `index`.
    pub fn name(&self, index: usize) -> DeviceResult<String> {
        let activate = self.activate(index)?;
        allocated_string(&activate, &MF_DEVSOURCE_ATTRIBUTE_FRIENDLY_NAME)
    }

    /// Audio endpoint id or video symbolic link of the device at `index`.
    ///
    /// Device-removal notifications carry this string.
    pub fn symbolic_link(&self, index: usize) -> DeviceResult<String> {
        let activate = self.activate(index)?;
        let key = match self.kind {
            MediaKind::Audio => MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_AUDCAP_ENDPOINT_ID,
            MediaKind::Video => MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_VIDCAP_SYMBOLIC_LINK,
        };
        allocated_string(&activate, &key)
    }

    /// Snapshot of the list for a front end.
    pub fn describe(&self) -> Vec<DeviceInfo> {
        (0..self.devices.len())
            .map(|index| {
                let name = self.name(index).unwrap_or_else(|e| {
                    warn!(index, error = %e, "Failed to read device name");
                    "Unknown Device".to_string()
                });
                DeviceInfo {
                    index,
                    name,
                    symbolic_link: self.symbolic_link(index).ok(),
                    kind: self.kind,
                }
            })
            .collect()
    }

    /// Activate the device at `index` and open a source reader on it.
    ///
    /// With a callback the reader runs in asynchronous mode and every
    /// `ReadSample` completes through `OnReadSample`.
    pub fn create_source_reader(
        &self,
        index: usize,
        callback: Option<&IMFSourceReaderCallback>,
    ) -> DeviceResult<IMFSourceReader> {
        let activate = self.activate(index)?;
        let source = activate_source(&activate)?;
        create_reader(&source, callback)
    }
}

/// Create the media source behind an activation object.
pub fn activate_source(activate: &IMFActivate) -> DeviceResult<IMFMediaSource> {
    unsafe { activate.ActivateObject::<IMFMediaSource>() }
        .map_err(|e| DeviceError::api("ActivateObject failed", e))
}

/// Open a source reader on `source`, optionally asynchronous.
pub fn create_reader(
    source: &IMFMediaSource,
    callback: Option<&IMFSourceReaderCallback>,
) -> DeviceResult<IMFSourceReader> {
    let attributes = create_attributes(1)?;
    if let Some(callback) = callback {
        unsafe { attributes.SetUnknown(&MF_SOURCE_READER_ASYNC_CALLBACK, callback) }
            .map_err(|e| DeviceError::api("Failed to set reader callback", e))?;
    }

    unsafe { MFCreateSourceReaderFromMediaSource(source, &attributes) }
        .map_err(|e| DeviceError::api("Failed to create source reader", e))
}

fn create_attributes(size: u32) -> DeviceResult<IMFAttributes> {
    let mut attributes: Option<IMFAttributes> = None;
    unsafe { MFCreateAttributes(&mut attributes, size) }
        .map_err(|e| DeviceError::api("Failed to create attribute store", e))?;
    attributes.ok_or_else(|| DeviceError::WindowsApi {
        message: "MFCreateAttributes returned no store".to_string(),
        source: None,
    })
}

fn allocated_string(activate: &IMFActivate, key: &GUID) -> DeviceResult<String> {
    let mut value = PWSTR::null();
    let mut len = 0u32;
    unsafe { activate.GetAllocatedString(key, &mut value, &mut len) }?;

    let text = unsafe { value.to_string() };
    unsafe { CoTaskMemFree(Some(value.0 as *const _)) };
    text.map_err(|_| DeviceError::WindowsApi {
        message: "Device string is not valid UTF-16".to_string(),
        source: None,
    })
}
