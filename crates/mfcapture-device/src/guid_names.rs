//! Friendly names for Media Foundation type GUIDs.
//!
//! GUIDs are handled as `u128` in the layout of `GUID::from_u128`, so the
//! table can be checked without the platform headers.

/// Shared tail of every FOURCC/format-tag derived media GUID
/// (`{XXXXXXXX-0000-0010-8000-00AA00389B71}`).
const FOURCC_BASE: u128 = 0x00000000_0000_0010_8000_00aa00389b71;

/// Media subtype GUID for a WAVE format tag or a FOURCC code.
pub const fn media_guid(data1: u32) -> u128 {
    ((data1 as u128) << 96) | FOURCC_BASE
}

const fn fourcc(code: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*code)
}

pub const MF_MEDIA_TYPE_DEFAULT: u128 = 0x81a412e6_8103_4b06_857f_1862781024ac;
pub const MF_MEDIA_TYPE_AUDIO: u128 = media_guid(fourcc(b"auds"));
pub const MF_MEDIA_TYPE_VIDEO: u128 = media_guid(fourcc(b"vids"));

pub const MF_AUDIO_FORMAT_BASE: u128 = media_guid(0x0000);
pub const MF_AUDIO_FORMAT_PCM: u128 = media_guid(0x0001);
pub const MF_AUDIO_FORMAT_FLOAT: u128 = media_guid(0x0003);
pub const MF_AUDIO_FORMAT_DTS: u128 = media_guid(0x0008);
pub const MF_AUDIO_FORMAT_DRM: u128 = media_guid(0x0009);
pub const MF_AUDIO_FORMAT_MSP1: u128 = media_guid(0x000a);
pub const MF_AUDIO_FORMAT_MPEG: u128 = media_guid(0x0050);
pub const MF_AUDIO_FORMAT_MP3: u128 = media_guid(0x0055);
pub const MF_AUDIO_FORMAT_DOLBY_AC3_SPDIF: u128 = media_guid(0x0092);
pub const MF_AUDIO_FORMAT_WMAUDIO_V8: u128 = media_guid(0x0161);
pub const MF_AUDIO_FORMAT_WMAUDIO_V9: u128 = media_guid(0x0162);
pub const MF_AUDIO_FORMAT_WMAUDIO_LOSSLESS: u128 = media_guid(0x0163);
pub const MF_AUDIO_FORMAT_WMASPDIF: u128 = media_guid(0x0164);
pub const MF_AUDIO_FORMAT_ADTS: u128 = media_guid(0x1600);
pub const MF_AUDIO_FORMAT_AAC: u128 = media_guid(0x1610);

pub const MF_VIDEO_FORMAT_RGB24: u128 = media_guid(20);
pub const MF_VIDEO_FORMAT_RGB32: u128 = media_guid(22);
pub const MF_VIDEO_FORMAT_NV12: u128 = media_guid(fourcc(b"NV12"));
pub const MF_VIDEO_FORMAT_YUY2: u128 = media_guid(fourcc(b"YUY2"));
pub const MF_VIDEO_FORMAT_UYVY: u128 = media_guid(fourcc(b"UYVY"));
pub const MF_VIDEO_FORMAT_IYUV: u128 = media_guid(fourcc(b"IYUV"));
pub const MF_VIDEO_FORMAT_H264: u128 = media_guid(fourcc(b"H264"));
pub const MF_VIDEO_FORMAT_WMV3: u128 = media_guid(fourcc(b"WMV3"));
pub const MF_VIDEO_FORMAT_MJPG: u128 = media_guid(fourcc(b"MJPG"));

const NAMES: &[(u128, &str)] = &[
    // Audio subtypes
    (MF_AUDIO_FORMAT_BASE, "MFAudioFormat_Base"),
    (MF_AUDIO_FORMAT_PCM, "MFAudioFormat_PCM"),
    (MF_AUDIO_FORMAT_FLOAT, "MFAudioFormat_Float"),
    (MF_AUDIO_FORMAT_DTS, "MFAudioFormat_DTS"),
    (MF_AUDIO_FORMAT_DOLBY_AC3_SPDIF, "MFAudioFormat_Dolby_AC3_SPDIF"),
    (MF_AUDIO_FORMAT_DRM, "MFAudioFormat_DRM"),
    (MF_AUDIO_FORMAT_WMAUDIO_V8, "MFAudioFormat_WMAudioV8"),
    (MF_AUDIO_FORMAT_WMAUDIO_V9, "MFAudioFormat_WMAudioV9"),
    (MF_AUDIO_FORMAT_WMAUDIO_LOSSLESS, "MFAudioFormat_WMAudio_Lossless"),
    (MF_AUDIO_FORMAT_WMASPDIF, "MFAudioFormat_WMASPDIF"),
    (MF_AUDIO_FORMAT_MSP1, "MFAudioFormat_MSP1"),
    (MF_AUDIO_FORMAT_MP3, "MFAudioFormat_MP3"),
    (MF_AUDIO_FORMAT_MPEG, "MFAudioFormat_MPEG"),
    (MF_AUDIO_FORMAT_AAC, "MFAudioFormat_AAC"),
    (MF_AUDIO_FORMAT_ADTS, "MFAudioFormat_ADTS"),
    // Video subtypes
    (MF_VIDEO_FORMAT_NV12, "MFVideoFormat_NV12"),
    (MF_VIDEO_FORMAT_YUY2, "MFVideoFormat_YUY2"),
    (MF_VIDEO_FORMAT_UYVY, "MFVideoFormat_UYVY"),
    (MF_VIDEO_FORMAT_RGB32, "MFVideoFormat_RGB32"),
    (MF_VIDEO_FORMAT_RGB24, "MFVideoFormat_RGB24"),
    (MF_VIDEO_FORMAT_IYUV, "MFVideoFormat_IYUV"),
    (MF_VIDEO_FORMAT_H264, "MFVideoFormat_H264"),
    (MF_VIDEO_FORMAT_WMV3, "MFVideoFormat_WMV3"),
    (MF_VIDEO_FORMAT_MJPG, "MFVideoFormat_MJPG"),
    // Major types
    (MF_MEDIA_TYPE_DEFAULT, "MFMediaType_Default"),
    (MF_MEDIA_TYPE_AUDIO, "MFMediaType_Audio"),
    (MF_MEDIA_TYPE_VIDEO, "MFMediaType_Video"),
];

/// Symbolic name of a known media GUID.
pub fn known_guid_name(value: u128) -> Option<&'static str> {
    NAMES
        .iter()
        .find(|(guid, _)| *guid == value)
        .map(|(_, name)| *name)
}

/// Registry form, `{XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX}`.
pub fn format_guid(value: u128) -> String {
    format!(
        "{{{:08X}-{:04X}-{:04X}-{:04X}-{:012X}}}",
        (value >> 96) as u32,
        (value >> 80) as u16,
        (value >> 64) as u16,
        (value >> 48) as u16,
        value & 0xffff_ffff_ffff
    )
}

/// Friendly name if known, otherwise the registry form.
pub fn friendly_guid_name(value: u128) -> String {
    known_guid_name(value)
        .map(str::to_string)
        .unwrap_or_else(|| format_guid(value))
}

#[cfg(windows)]
pub fn guid_name(guid: &windows::core::GUID) -> String {
    friendly_guid_name(guid.to_u128())
}
