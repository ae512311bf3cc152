//! Common types used across IPC messages.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Average encoder bitrate requested from the sink writer, in bits per second.
pub const TARGET_BIT_RATE: u32 = 240 * 1000;

/// Output file name used before the user picks one.
pub const DEFAULT_OUTPUT_FILE: &str = "capture.mp4";

/// Kind of capture device being recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    /// Audio capture endpoint (microphone, line-in).
    #[default]
    Audio,

    /// Video capture device (webcam, capture card).
    Video,
}

impl MediaKind {
    /// Returns the display name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which of the two container choices offered for a media kind is selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerSlot {
    /// WMA for audio, MP4 for video.
    #[default]
    Primary,

    /// MP3 for audio, WMV for video.
    Secondary,
}

/// Encoded container formats the capture session can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Windows Media Audio v8 in an ASF container.
    Wma,

    /// MPEG-1 Layer 3 audio.
    Mp3,

    /// H.264 video in an MP4 container.
    Mp4,

    /// Windows Media Video 9 in an ASF container.
    Wmv,
}

impl OutputFormat {
    /// Resolve the format for a media kind and container slot.
    pub fn for_selection(kind: MediaKind, slot: ContainerSlot) -> Self {
        match (kind, slot) {
            (MediaKind::Audio, ContainerSlot::Primary) => Self::Wma,
            (MediaKind::Audio, ContainerSlot::Secondary) => Self::Mp3,
            (MediaKind::Video, ContainerSlot::Primary) => Self::Mp4,
            (MediaKind::Video, ContainerSlot::Secondary) => Self::Wmv,
        }
    }

    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Wma => "wma",
            Self::Mp3 => "mp3",
            Self::Mp4 => "mp4",
            Self::Wmv => "wmv",
        }
    }

    /// Label shown on the container selector.
    pub fn label(self) -> &'static str {
        match self {
            Self::Wma => "WMA",
            Self::Mp3 => "MP3",
            Self::Mp4 => "MP4",
            Self::Wmv => "WMV",
        }
    }

    /// Media kind carried by this format.
    pub fn media_kind(self) -> MediaKind {
        match self {
            Self::Wma | Self::Mp3 => MediaKind::Audio,
            Self::Mp4 | Self::Wmv => MediaKind::Video,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Encoder settings handed to the sink writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingParameters {
    /// Target container/codec.
    pub format: OutputFormat,

    /// Average bitrate in bits per second.
    pub bitrate: u32,
}

impl EncodingParameters {
    /// Parameters for a format at the default target bitrate.
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            bitrate: TARGET_BIT_RATE,
        }
    }
}

/// A capture device reported by enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Position in the enumerated device list.
    pub index: usize,

    /// Friendly name for display.
    pub name: String,

    /// Audio endpoint id or video symbolic link. Used to detect removal.
    pub symbolic_link: Option<String>,

    /// Kind of device.
    pub kind: MediaKind,
}

impl DeviceInfo {
    /// Whether this device is the one identified by `link`.
    ///
    /// Symbolic links compare case-insensitively.
    pub fn matches_link(&self, link: &str) -> bool {
        self.symbolic_link
            .as_deref()
            .map(|own| own.eq_ignore_ascii_case(link))
            .unwrap_or(false)
    }
}

/// Configuration for starting a capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Kind of device to record.
    pub kind: MediaKind,

    /// Container choice for that kind.
    pub slot: ContainerSlot,

    /// Device index into the enumerated list (None keeps the current selection).
    pub device_index: Option<usize>,

    /// Output file path.
    pub output_path: String,

    /// Average encoder bitrate in bits per second.
    pub bitrate: u32,

    /// Stop automatically after this long (None records until stopped).
    pub max_duration: Option<Duration>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            kind: MediaKind::Audio,
            slot: ContainerSlot::Primary,
            device_index: None,
            output_path: DEFAULT_OUTPUT_FILE.to_string(),
            bitrate: TARGET_BIT_RATE,
            max_duration: None,
        }
    }
}

impl CaptureConfig {
    /// Encoder parameters implied by this configuration.
    pub fn encoding_parameters(&self) -> EncodingParameters {
        EncodingParameters {
            format: OutputFormat::for_selection(self.kind, self.slot),
            bitrate: self.bitrate,
        }
    }
}

/// Which front-end controls are usable in the current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    /// Caption of the capture toggle.
    pub capture_label: String,

    /// Capture toggle is usable.
    pub capture_enabled: bool,

    /// Device selector is usable.
    pub device_list_enabled: bool,

    /// Container selector is usable.
    pub container_enabled: bool,

    /// Audio/video selector is usable.
    pub media_kind_enabled: bool,

    /// Output path can be edited.
    pub output_path_enabled: bool,

    /// Labels of the two container choices for the current kind.
    pub container_labels: (String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_selection_matrix() {
        use ContainerSlot::*;
        use MediaKind::*;

        assert_eq!(OutputFormat::for_selection(Audio, Primary), OutputFormat::Wma);
        assert_eq!(OutputFormat::for_selection(Audio, Secondary), OutputFormat::Mp3);
        assert_eq!(OutputFormat::for_selection(Video, Primary), OutputFormat::Mp4);
        assert_eq!(OutputFormat::for_selection(Video, Secondary), OutputFormat::Wmv);
    }

    #[test]
    fn test_format_kind_is_consistent() {
        for kind in [MediaKind::Audio, MediaKind::Video] {
            for slot in [ContainerSlot::Primary, ContainerSlot::Secondary] {
                assert_eq!(OutputFormat::for_selection(kind, slot).media_kind(), kind);
            }
        }
    }

    #[test]
    fn test_default_config_targets_wma() {
        let config = CaptureConfig::default();
        let params = config.encoding_parameters();
        assert_eq!(params.format, OutputFormat::Wma);
        assert_eq!(params.bitrate, 240_000);
    }

    #[test]
    fn test_device_link_match_ignores_case() {
        let device = DeviceInfo {
            index: 0,
            name: "USB Camera".into(),
            symbolic_link: Some(r"\\?\USB#VID_046D&PID_0825".into()),
            kind: MediaKind::Video,
        };
        assert!(device.matches_link(r"\\?\usb#vid_046d&pid_0825"));
        assert!(!device.matches_link(r"\\?\usb#vid_046d&pid_0826"));

        let anonymous = DeviceInfo {
            symbolic_link: None,
            ..device
        };
        assert!(!anonymous.matches_link("anything"));
    }

    #[test]
    fn test_config_serializes() {
        let config = CaptureConfig {
            kind: MediaKind::Video,
            max_duration: Some(Duration::from_secs(5)),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: CaptureConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, MediaKind::Video);
        assert_eq!(back.max_duration, Some(Duration::from_secs(5)));
    }
}
