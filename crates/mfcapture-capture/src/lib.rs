//! Media Foundation source-reader capture.
//!
//! This crate configures source readers, negotiates encoder output types
//! and runs the asynchronous [`CaptureSession`] that records a capture
//! device into an encoded container. It also provides the synchronous
//! recorders behind the console probe: float WAVE through
//! `mfcapture-wave`, and WMA/MP3 through a sink writer.

mod completion;
#[cfg(windows)]
mod encoded_audio;
#[cfg(windows)]
mod encoder;
mod error;
mod flags;
mod notice;
#[cfg(windows)]
mod reader;
#[cfg(windows)]
mod session;
mod subtypes;
mod timing;
#[cfg(windows)]
mod wave_file;

pub use completion::{complete_read, is_active_link, Completion, ReadTarget};
#[cfg(windows)]
pub use encoded_audio::{write_encoded_audio_file, EncodedRecording};
#[cfg(windows)]
pub use encoder::{build_target_type, register_color_converter};
pub use error::CaptureError;
pub use flags::{classify_read, ReadStatus};
pub use notice::{notice_channel, post_failure, CaptureFailure, NOTICE_CHANNEL_CAPACITY};
#[cfg(windows)]
pub use reader::{
    configure_float_reader, configure_source_reader, first_stream, ReaderSampleSource,
};
#[cfg(windows)]
pub use session::CaptureSession;
pub use subtypes::{
    encoder_subtype, negotiate_subtype, reader_subtypes, AUDIO_READER_SUBTYPES,
    VIDEO_READER_SUBTYPES,
};
pub use timing::{hns_to_duration, ms_to_hns, RecordingClock, TimestampRebaser, HNS_PER_MS};
#[cfg(windows)]
pub use wave_file::{wave_format_block, write_wave_file};

/// Recording length used by the console probe.
pub const DEFAULT_PROBE_DURATION_MS: u32 = 10_000;

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;
