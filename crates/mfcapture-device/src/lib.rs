//! Media Foundation capture-device enumeration and diagnostics.
//!
//! Wraps `MFEnumDeviceSources` in a [`DeviceList`], names media GUIDs and
//! status codes for console output, and carries the waveIn probe used to
//! compare against the older multimedia API.

#[cfg(windows)]
mod device_list;
mod error;
mod guid_names;
mod hresult;
mod legacy;
mod native_types;
#[cfg(windows)]
mod runtime;

#[cfg(windows)]
pub use device_list::{activate_source, create_reader, DeviceList};
pub use error::DeviceError;
#[cfg(windows)]
pub use guid_names::guid_name;
pub use guid_names::{format_guid, friendly_guid_name, known_guid_name, media_guid};
pub use hresult::{describe_hresult, describe_with, known_error, message_id, KnownError};
pub use legacy::{
    write_pcm16_wave, LegacyDevice, LEGACY_RECORD_SECONDS, LEGACY_SAMPLE_RATE, STANDARD_FORMATS,
};
#[cfg(windows)]
pub use legacy::{legacy_input_devices, record_legacy};
#[cfg(windows)]
pub use native_types::native_media_types;
pub use native_types::{NativeType, StreamTypes};
#[cfg(windows)]
pub use runtime::MediaFoundation;

/// GUID constants as `u128`, matching `GUID::from_u128`.
pub mod guids {
    pub use crate::guid_names::{
        MF_AUDIO_FORMAT_AAC, MF_AUDIO_FORMAT_ADTS, MF_AUDIO_FORMAT_BASE,
        MF_AUDIO_FORMAT_DOLBY_AC3_SPDIF, MF_AUDIO_FORMAT_DRM, MF_AUDIO_FORMAT_DTS,
        MF_AUDIO_FORMAT_FLOAT, MF_AUDIO_FORMAT_MP3, MF_AUDIO_FORMAT_MPEG, MF_AUDIO_FORMAT_MSP1,
        MF_AUDIO_FORMAT_PCM, MF_AUDIO_FORMAT_WMASPDIF, MF_AUDIO_FORMAT_WMAUDIO_LOSSLESS,
        MF_AUDIO_FORMAT_WMAUDIO_V8, MF_AUDIO_FORMAT_WMAUDIO_V9, MF_MEDIA_TYPE_AUDIO,
        MF_MEDIA_TYPE_DEFAULT, MF_MEDIA_TYPE_VIDEO, MF_VIDEO_FORMAT_H264, MF_VIDEO_FORMAT_IYUV,
        MF_VIDEO_FORMAT_MJPG, MF_VIDEO_FORMAT_NV12, MF_VIDEO_FORMAT_RGB24, MF_VIDEO_FORMAT_RGB32,
        MF_VIDEO_FORMAT_UYVY, MF_VIDEO_FORMAT_WMV3, MF_VIDEO_FORMAT_YUY2,
    };
}

/// Status codes callers match on.
pub mod codes {
    pub use crate::hresult::{
        MF_E_ATTRIBUTENOTFOUND, MF_E_INVALIDMEDIATYPE, MF_E_INVALIDSTREAMNUMBER,
        MF_E_NO_MORE_TYPES, MF_E_SHUTDOWN, MF_E_TOPO_CODEC_NOT_FOUND,
    };
}

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;
