//! Command-line arguments.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use mfcapture_capture::DEFAULT_PROBE_DURATION_MS;
use mfcapture_ipc::{CaptureConfig, ContainerSlot, MediaKind, DEFAULT_OUTPUT_FILE, TARGET_BIT_RATE};

#[derive(Debug, Parser)]
#[command(name = "mfcapture", version, about = "Record capture devices with Media Foundation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List capture devices.
    Devices(DevicesArgs),

    /// Record one capture device to an encoded file.
    Record(RecordArgs),

    /// Enumerate audio devices, print their native types and record a test clip from each.
    Probe(ProbeArgs),
}

fn media_kind(video: bool) -> MediaKind {
    if video {
        MediaKind::Video
    } else {
        MediaKind::Audio
    }
}

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// List video devices instead of audio devices.
    #[arg(long)]
    pub video: bool,

    /// Print the list as JSON.
    #[arg(long)]
    pub json: bool,
}

impl DevicesArgs {
    pub fn kind(&self) -> MediaKind {
        media_kind(self.video)
    }
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Record a video device (MP4 or WMV) instead of audio (WMA or MP3).
    #[arg(long)]
    pub video: bool,

    /// Use the second container: MP3 for audio, WMV for video.
    #[arg(long)]
    pub alternate: bool,

    /// Device index from `mfcapture devices`.
    #[arg(long, short)]
    pub device: Option<usize>,

    /// Output file. The extension is replaced to match the container.
    #[arg(long, short)]
    pub output: Option<String>,

    /// Stop after this many seconds.
    #[arg(long)]
    pub duration: Option<u64>,

    /// Average encoder bitrate in bits per second.
    #[arg(long, default_value_t = TARGET_BIT_RATE)]
    pub bitrate: u32,
}

impl RecordArgs {
    pub fn to_config(&self) -> CaptureConfig {
        CaptureConfig {
            kind: media_kind(self.video),
            slot: if self.alternate {
                ContainerSlot::Secondary
            } else {
                ContainerSlot::Primary
            },
            device_index: self.device,
            output_path: self
                .output
                .clone()
                .unwrap_or_else(|| DEFAULT_OUTPUT_FILE.to_string()),
            bitrate: self.bitrate,
            max_duration: self.duration.map(Duration::from_secs),
        }
    }
}

/// File written for each device by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProbeFormat {
    /// 32-bit float WAVE.
    Wave,
    /// Windows Media Audio.
    Wma,
}

impl ProbeFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Wave => "wav",
            Self::Wma => "wma",
        }
    }
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Probe waveIn devices instead of Media Foundation.
    #[arg(long)]
    pub legacy: bool,

    /// Format of the Media Foundation test recording.
    #[arg(long, value_enum, default_value_t = ProbeFormat::Wma)]
    pub format: ProbeFormat,

    /// Length of the Media Foundation test recording.
    #[arg(long, default_value_t = DEFAULT_PROBE_DURATION_MS)]
    pub duration_ms: u32,
}
