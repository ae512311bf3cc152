//! Synchronous encoded audio recording (WMA/MP3).

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use windows::core::HSTRING;
use windows::Win32::Media::MediaFoundation::{
    IMFAttributes, IMFByteStream, IMFSourceReader, MFCreateSinkWriterFromURL,
};

use mfcapture_ipc::{EncodingParameters, MediaKind};
use mfcapture_wave::StreamEnd;

use crate::encoder::build_target_type;
use crate::error::CaptureError;
use crate::flags::ReadStatus;
use crate::reader::{configure_float_reader, ReaderSampleSource};
use crate::timing::RecordingClock;
use crate::CaptureResult;

/// Outcome of an encoded recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedRecording {
    pub samples: u64,
    /// Rebased time of the last sample written.
    pub duration: Duration,
    /// `BudgetReached` means the duration limit was hit.
    pub end: StreamEnd,
}

/// Record up to `duration_ms` of the reader's first audio stream through a
/// sink writer into `path`.
#[instrument(name = "capture_encoded_audio", skip(reader), fields(path = %path.as_ref().display()))]
pub fn write_encoded_audio_file(
    reader: &IMFSourceReader,
    path: impl AsRef<Path>,
    duration_ms: u32,
    params: EncodingParameters,
) -> CaptureResult<EncodedRecording> {
    if params.format.media_kind() != MediaKind::Audio {
        return Err(CaptureError::KindMismatch {
            device: MediaKind::Audio,
            format: params.format,
        });
    }

    let reader_type = configure_float_reader(reader)?;

    let url = HSTRING::from(path.as_ref().as_os_str());
    let writer = unsafe {
        MFCreateSinkWriterFromURL(&url, None::<&IMFByteStream>, None::<&IMFAttributes>)
    }
    .map_err(|e| CaptureError::api("MFCreateSinkWriterFromURL", e))?;

    let target = build_target_type(&params, &reader_type)?;
    let stream = unsafe { writer.AddStream(&target) }
        .map_err(|e| CaptureError::api("AddStream", e))?;
    unsafe { writer.SetInputMediaType(stream, &reader_type, None::<&IMFAttributes>) }
        .map_err(|e| CaptureError::api("SetInputMediaType", e))?;
    unsafe { writer.BeginWriting() }.map_err(|e| CaptureError::api("BeginWriting", e))?;

    let mut source = ReaderSampleSource::new(reader, MediaKind::Audio);
    let mut clock = RecordingClock::new(duration_ms);
    let mut samples = 0u64;

    let end = loop {
        let (status, timestamp, sample) = source
            .read_sample()
            .map_err(|e| CaptureError::api("ReadSample", e))?;

        match (status, sample) {
            (ReadStatus::StreamError, _) => return Err(CaptureError::StreamError),
            (ReadStatus::TypeChanged, _) => {
                warn!("Type change during encoded recording");
                break StreamEnd::FormatChanged;
            }
            (ReadStatus::EndOfStream, _) => {
                info!("End of input stream");
                break StreamEnd::EndOfStream;
            }
            (ReadStatus::Sample, Some(sample)) => {
                let Some(rebased) = clock.admit(timestamp) else {
                    break StreamEnd::BudgetReached;
                };
                unsafe {
                    sample.SetSampleTime(rebased)?;
                    writer
                        .WriteSample(stream, &sample)
                        .map_err(|e| CaptureError::api("WriteSample", e))?;
                }
                samples += 1;
            }
            _ => continue,
        }
    };

    unsafe { writer.Finalize() }.map_err(|e| CaptureError::api("Finalize", e))?;

    let recording = EncodedRecording {
        samples,
        duration: clock.elapsed(),
        end,
    };
    debug!(?recording, "Encoded recording finished");
    Ok(recording)
}
