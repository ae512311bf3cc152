//! Device audio to a WAVE file.

use std::path::Path;

use tracing::{info, instrument};
use windows::Win32::Media::Audio::WAVEFORMATEX;
use windows::Win32::Media::MediaFoundation::{
    IMFMediaType, IMFSourceReader, MFCreateWaveFormatExFromMFMediaType,
};
use windows::Win32::System::Com::CoTaskMemFree;

use mfcapture_ipc::MediaKind;
use mfcapture_wave::{FormatBlock, Recording};

use crate::error::CaptureError;
use crate::reader::{configure_float_reader, ReaderSampleSource};
use crate::CaptureResult;

/// Raw WAVEFORMATEX (or WAVEFORMATEXTENSIBLE) bytes for a media type.
pub fn wave_format_block(media_type: &IMFMediaType) -> CaptureResult<FormatBlock> {
    let mut format: *mut WAVEFORMATEX = std::ptr::null_mut();
    let mut len = 0u32;
    unsafe { MFCreateWaveFormatExFromMFMediaType(media_type, &mut format, Some(&mut len), 0) }
        .map_err(|e| CaptureError::api("MFCreateWaveFormatExFromMFMediaType", e))?;

    if format.is_null() {
        return Err(CaptureError::WindowsApi {
            message: "MFCreateWaveFormatExFromMFMediaType returned no format".to_string(),
            source: None,
        });
    }

    let bytes = unsafe { std::slice::from_raw_parts(format.cast::<u8>(), len as usize) }.to_vec();
    unsafe { CoTaskMemFree(Some(format.cast_const().cast())) };

    Ok(FormatBlock::from_raw(bytes)?)
}

/// Record up to `duration_ms` of the reader's first audio stream as float
/// WAVE at `path`.
#[instrument(name = "capture_wave_file", skip(reader), fields(path = %path.as_ref().display()))]
pub fn write_wave_file(
    reader: &IMFSourceReader,
    path: impl AsRef<Path>,
    duration_ms: u32,
) -> CaptureResult<Recording> {
    let audio_type = configure_float_reader(reader)?;
    let format = wave_format_block(&audio_type)?;

    let mut source = ReaderSampleSource::new(reader, MediaKind::Audio);
    let recording =
        mfcapture_wave::write_wave_file(path.as_ref(), &format, duration_ms, &mut source)?;

    info!(
        data_len = recording.wave.data_len,
        end = ?recording.end,
        "WAVE file written"
    );
    Ok(recording)
}
