//! Asynchronous capture session.
//!
//! The source reader runs in asynchronous mode: each `ReadSample` request
//! completes on a Media Foundation worker thread through
//! [`IMFSourceReaderCallback::OnReadSample`]. The callback rebases the
//! timestamp, hands the sample to the sink writer and asks for the next one.
//! One lock guards the reader, the writer and the rebasing state, so a stop
//! request from the owning thread and an in-flight completion never
//! interleave.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, trace, warn};
use windows::core::{implement, HSTRING, HRESULT};
use windows::Win32::Media::MediaFoundation::{
    IMFAttributes, IMFByteStream, IMFMediaEvent, IMFSample, IMFSinkWriter, IMFSourceReader,
    IMFSourceReaderCallback, IMFSourceReaderCallback_Impl, MFCreateSinkWriterFromURL,
};

use mfcapture_device::{create_reader, describe_hresult, DeviceList};
use mfcapture_ipc::{EncodingParameters, MediaKind};

use crate::completion::{complete_read, is_active_link, Completion, ReadTarget};
use crate::encoder::{build_target_type, register_color_converter};
use crate::error::CaptureError;
use crate::notice::{notice_channel, post_failure, CaptureFailure};
use crate::reader::{configure_source_reader, first_stream};
use crate::timing::TimestampRebaser;
use crate::CaptureResult;

/// State shared between the session and its read callback.
#[derive(Default)]
struct Shared {
    reader: Option<IMFSourceReader>,
    writer: Option<IMFSinkWriter>,
    sink_stream: u32,
    reader_stream: u32,
    rebaser: TimestampRebaser,
    symbolic_link: Option<String>,
    samples_written: u64,
}

impl Shared {
    fn is_capturing(&self) -> bool {
        self.writer.is_some()
    }

    /// Finalize the writer and drop everything. Returns the finalize result.
    fn release(&mut self) -> windows::core::Result<()> {
        let result = match self.writer.take() {
            Some(writer) => unsafe { writer.Finalize() },
            None => Ok(()),
        };
        self.reader = None;
        self.symbolic_link = None;
        result
    }
}

impl ReadTarget for Shared {
    type Sample = IMFSample;
    type Error = windows::core::Error;

    fn write(&mut self, timestamp: i64, sample: &IMFSample) -> windows::core::Result<()> {
        let rebased = self.rebaser.rebase(timestamp);
        unsafe { sample.SetSampleTime(rebased) }?;
        if let Some(writer) = &self.writer {
            unsafe { writer.WriteSample(self.sink_stream, sample) }?;
        }
        self.samples_written += 1;
        trace!(rebased, "Wrote sample");
        Ok(())
    }

    fn request_next(&mut self) -> windows::core::Result<()> {
        match &self.reader {
            Some(reader) => unsafe {
                reader.ReadSample(self.reader_stream, 0, None, None, None, None)
            },
            None => Ok(()),
        }
    }
}

#[implement(IMFSourceReaderCallback)]
struct ReadCallback {
    shared: Arc<Mutex<Shared>>,
    failures: Sender<CaptureFailure>,
}

impl IMFSourceReaderCallback_Impl for ReadCallback_Impl {
    fn OnReadSample(
        &self,
        hrstatus: HRESULT,
        _dwstreamindex: u32,
        _dwstreamflags: u32,
        lltimestamp: i64,
        psample: Option<&IMFSample>,
    ) -> windows::core::Result<()> {
        let mut shared = self.shared.lock();
        let capturing = shared.is_capturing();

        match complete_read(&mut *shared, capturing, hrstatus.ok(), lltimestamp, psample) {
            Completion::Ignored | Completion::Continued => Ok(()),
            Completion::Failed(e) => {
                let code = e.code().0 as u32;
                error!("Capture callback failed: 0x{code:08X}");
                post_failure(
                    &self.failures,
                    CaptureFailure {
                        code,
                        message: describe_hresult(code),
                    },
                );
                Err(e)
            }
        }
    }

    fn OnFlush(&self, _dwstreamindex: u32) -> windows::core::Result<()> {
        Ok(())
    }

    fn OnEvent(
        &self,
        _dwstreamindex: u32,
        _pevent: Option<&IMFMediaEvent>,
    ) -> windows::core::Result<()> {
        Ok(())
    }
}

/// Records one capture device into an encoded container.
pub struct CaptureSession {
    shared: Arc<Mutex<Shared>>,
    callback: IMFSourceReaderCallback,
    failures: Receiver<CaptureFailure>,
}

impl CaptureSession {
    pub fn new() -> Self {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let (tx, rx) = notice_channel();
        let callback: IMFSourceReaderCallback = ReadCallback {
            shared: Arc::clone(&shared),
            failures: tx,
        }
        .into();

        Self {
            shared,
            callback,
            failures: rx,
        }
    }

    /// Start recording device `index` of `devices` into `path`.
    ///
    /// On failure everything acquired so far is released and the session
    /// stays idle.
    #[instrument(
        name = "capture_session_start",
        skip(self, devices),
        fields(kind = %devices.kind())
    )]
    pub fn start(
        &self,
        devices: &DeviceList,
        index: usize,
        path: &str,
        params: EncodingParameters,
    ) -> CaptureResult<()> {
        let mut shared = self.shared.lock();
        if shared.is_capturing() {
            return Err(CaptureError::AlreadyCapturing);
        }

        let kind = devices.kind();
        if params.format.media_kind() != kind {
            return Err(CaptureError::KindMismatch {
                device: kind,
                format: params.format,
            });
        }

        let activate = devices.activate(index)?;
        let source = mfcapture_device::activate_source(&activate)?;
        let symbolic_link = devices.symbolic_link(index)?;
        debug!(%symbolic_link, "Activated capture device");

        let reader = create_reader(&source, Some(&self.callback))?;
        let writer = unsafe {
            MFCreateSinkWriterFromURL(
                &HSTRING::from(path),
                None::<&IMFByteStream>,
                None::<&IMFAttributes>,
            )
        }
        .map_err(|e| CaptureError::api("MFCreateSinkWriterFromURL", e))?;

        let sink_stream = configure_capture(&reader, &writer, kind, &params)?;

        *shared = Shared {
            reader: Some(reader),
            writer: Some(writer),
            sink_stream,
            reader_stream: first_stream(kind),
            rebaser: TimestampRebaser::new(),
            symbolic_link: Some(symbolic_link),
            samples_written: 0,
        };

        // The callback blocks on the lock until this returns.
        if let Err(e) = shared.request_next() {
            if let Err(finalize) = shared.release() {
                debug!(error = %finalize, "Finalize after failed start");
            }
            return Err(CaptureError::api("ReadSample", e));
        }

        while self.failures.try_recv().is_ok() {}
        info!(path, format = %params.format, "Capture started");
        Ok(())
    }

    /// Stop recording. Returns the result of finalizing the file.
    #[instrument(name = "capture_session_end", skip(self))]
    pub fn end(&self) -> CaptureResult<()> {
        let mut shared = self.shared.lock();
        let samples = shared.samples_written;
        let was_capturing = shared.is_capturing();

        shared
            .release()
            .map_err(|e| CaptureError::api("Finalize", e))?;

        if was_capturing {
            info!(samples, "Capture stopped");
        }
        Ok(())
    }

    pub fn is_capturing(&self) -> bool {
        self.shared.lock().is_capturing()
    }

    /// Whether `removed_link` names the device being recorded.
    pub fn check_device_lost(&self, removed_link: &str) -> bool {
        let shared = self.shared.lock();
        is_active_link(
            shared.is_capturing(),
            shared.symbolic_link.as_deref(),
            removed_link,
        )
    }

    /// Next failure reported by the read callback, if any.
    pub fn poll_failure(&self) -> Option<CaptureFailure> {
        self.failures.try_recv().ok()
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if let Err(e) = self.end() {
            warn!(error = %e, "Failed to finalize capture on drop");
        }
    }
}

/// Set the reader output type, add the encoded stream and begin writing.
/// Returns the sink stream index.
fn configure_capture(
    reader: &IMFSourceReader,
    writer: &IMFSinkWriter,
    kind: MediaKind,
    params: &EncodingParameters,
) -> CaptureResult<u32> {
    configure_source_reader(reader, kind)?;

    let current = unsafe { reader.GetCurrentMediaType(first_stream(kind)) }
        .map_err(|e| CaptureError::api("GetCurrentMediaType", e))?;

    let target = build_target_type(params, &current)?;
    let sink_stream = unsafe { writer.AddStream(&target) }
        .map_err(|e| CaptureError::api("AddStream", e))?;

    if kind == MediaKind::Video {
        register_color_converter()?;
    }

    unsafe { writer.SetInputMediaType(sink_stream, &current, None::<&IMFAttributes>) }
        .map_err(|e| CaptureError::api("SetInputMediaType", e))?;
    unsafe { writer.BeginWriting() }.map_err(|e| CaptureError::api("BeginWriting", e))?;

    Ok(sink_stream)
}
