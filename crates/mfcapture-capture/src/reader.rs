//! Source reader configuration and a synchronous sample source.

use bytes::Bytes;
use tracing::{debug, instrument, warn};
use windows::core::GUID;
use windows::Win32::Foundation::{FALSE, TRUE};
use windows::Win32::Media::MediaFoundation::{
    IMFMediaType, IMFSample, IMFSourceReader, MFCreateMediaType, MFMediaType_Audio,
    MFAudioFormat_Float, MF_E_TOPO_CODEC_NOT_FOUND, MF_MT_MAJOR_TYPE, MF_MT_SUBTYPE,
    MF_SOURCE_READER_ALL_STREAMS, MF_SOURCE_READER_FIRST_AUDIO_STREAM,
    MF_SOURCE_READER_FIRST_VIDEO_STREAM,
};

use mfcapture_ipc::MediaKind;
use mfcapture_wave::{ReadOutcome, SampleSource, WaveError, WaveResult};

use crate::error::CaptureError;
use crate::flags::{classify_read, ReadStatus};
use crate::subtypes::{negotiate_subtype, reader_subtypes};
use crate::CaptureResult;

/// Reader stream index for the first stream of `kind`.
pub fn first_stream(kind: MediaKind) -> u32 {
    match kind {
        MediaKind::Audio => MF_SOURCE_READER_FIRST_AUDIO_STREAM.0 as u32,
        MediaKind::Video => MF_SOURCE_READER_FIRST_VIDEO_STREAM.0 as u32,
    }
}

/// Select only the first audio stream and have the reader decode it to
/// 32-bit float. Returns the complete decoded type.
#[instrument(name = "configure_float_reader", skip_all)]
pub fn configure_float_reader(reader: &IMFSourceReader) -> CaptureResult<IMFMediaType> {
    let audio = first_stream(MediaKind::Audio);

    unsafe {
        reader
            .SetStreamSelection(MF_SOURCE_READER_ALL_STREAMS.0 as u32, FALSE)
            .map_err(|e| CaptureError::api("SetStreamSelection (all streams)", e))?;
        reader
            .SetStreamSelection(audio, TRUE)
            .map_err(|e| CaptureError::api("SetStreamSelection (audio)", e))?;
    }

    let partial = unsafe { MFCreateMediaType() }?;
    unsafe {
        partial.SetGUID(&MF_MT_MAJOR_TYPE, &MFMediaType_Audio)?;
        partial.SetGUID(&MF_MT_SUBTYPE, &MFAudioFormat_Float)?;
    }

    // The reader loads a decoder if the device does not deliver float.
    if let Err(e) = unsafe { reader.SetCurrentMediaType(audio, None, &partial) } {
        if e.code() == MF_E_TOPO_CODEC_NOT_FOUND {
            warn!("No decoder can deliver float audio for this device");
        }
        return Err(CaptureError::api("SetCurrentMediaType (float)", e));
    }

    let current = unsafe { reader.GetCurrentMediaType(audio) }
        .map_err(|e| CaptureError::api("GetCurrentMediaType", e))?;

    unsafe { reader.SetStreamSelection(audio, TRUE) }
        .map_err(|e| CaptureError::api("SetStreamSelection (audio)", e))?;

    debug!("Reader configured for float audio");
    Ok(current)
}

/// Set the reader output type for `kind`, preferring the device's native
/// type when it is already acceptable. Returns the chosen subtype.
#[instrument(name = "configure_source_reader", skip(reader))]
pub fn configure_source_reader(reader: &IMFSourceReader, kind: MediaKind) -> CaptureResult<u128> {
    let stream = first_stream(kind);

    let native = unsafe { reader.GetNativeMediaType(stream, 0) }
        .map_err(|e| CaptureError::api("GetNativeMediaType", e))?;
    let native_subtype = unsafe { native.GetGUID(&MF_MT_SUBTYPE) }
        .map_err(|e| CaptureError::api("GetGUID MF_MT_SUBTYPE", e))?;

    negotiate_subtype(native_subtype.to_u128(), reader_subtypes(kind), |candidate| unsafe {
        if let Some(subtype) = candidate {
            native.SetGUID(&MF_MT_SUBTYPE, &GUID::from_u128(subtype))?;
        }
        reader.SetCurrentMediaType(stream, None, &native)
    })
    .map_err(|e| CaptureError::api("Failed to set any acceptable subtype", e))
}

/// Pulls decoded blocks from a synchronous source reader.
pub struct ReaderSampleSource<'a> {
    reader: &'a IMFSourceReader,
    stream: u32,
}

impl<'a> ReaderSampleSource<'a> {
    pub fn new(reader: &'a IMFSourceReader, kind: MediaKind) -> Self {
        Self {
            reader,
            stream: first_stream(kind),
        }
    }

    /// One blocking `ReadSample`.
    pub fn read_sample(&mut self) -> windows::core::Result<(ReadStatus, i64, Option<IMFSample>)> {
        let mut flags = 0u32;
        let mut timestamp = 0i64;
        let mut sample: Option<IMFSample> = None;
        unsafe {
            self.reader.ReadSample(
                self.stream,
                0,
                None,
                Some(&mut flags),
                Some(&mut timestamp),
                Some(&mut sample),
            )?;
        }
        Ok((classify_read(flags, sample.is_some()), timestamp, sample))
    }
}

/// Copy the payload of a sample into one contiguous block.
pub fn sample_bytes(sample: &IMFSample) -> windows::core::Result<Bytes> {
    let buffer = unsafe { sample.ConvertToContiguousBuffer() }?;

    let mut data: *mut u8 = std::ptr::null_mut();
    let mut len = 0u32;
    unsafe { buffer.Lock(&mut data, None, Some(&mut len)) }?;
    let bytes = if data.is_null() || len == 0 {
        Bytes::new()
    } else {
        Bytes::copy_from_slice(unsafe { std::slice::from_raw_parts(data, len as usize) })
    };
    unsafe { buffer.Unlock() }?;

    Ok(bytes)
}

impl SampleSource for ReaderSampleSource<'_> {
    fn read(&mut self) -> WaveResult<ReadOutcome> {
        let (status, _, sample) = self.read_sample().map_err(WaveError::source)?;
        match (status, sample) {
            (ReadStatus::StreamError, _) => Err(WaveError::source(CaptureError::StreamError)),
            (ReadStatus::TypeChanged, _) => Ok(ReadOutcome::FormatChanged),
            (ReadStatus::EndOfStream, _) => Ok(ReadOutcome::EndOfStream),
            (ReadStatus::Sample, Some(sample)) => sample_bytes(&sample)
                .map(ReadOutcome::Block)
                .map_err(WaveError::source),
            _ => Ok(ReadOutcome::NoSample),
        }
    }
}
