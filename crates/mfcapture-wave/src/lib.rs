//! RIFF/WAVE writer with byte-budgeted streaming.
//!
//! The writer emits the RIFF, `fmt ` and `data` chunks with placeholder
//! sizes, streams decoded audio under a budget derived from the requested
//! duration, and patches both size fields once the data is in place.

mod error;
mod format;
mod level;
mod pipeline;
mod writer;

pub use error::WaveError;
pub use format::{
    FormatBlock, WaveFormat, WAVEFORMATEX_LEN, WAVE_FORMAT_IEEE_FLOAT, WAVE_FORMAT_PCM,
};
pub use level::{average_absolute_level, pcm16_bytes};
pub use pipeline::{
    record, write_wave_data, write_wave_file, ReadOutcome, Recording, SampleSource, StreamEnd,
};
pub use writer::{header_len, max_audio_data_size, WaveSummary, WaveWriter};

/// Result type for WAVE operations.
pub type WaveResult<T> = Result<T, WaveError>;
