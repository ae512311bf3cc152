//! Streaming decoded samples from a source into a WAVE writer.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use bytes::Bytes;
use tracing::{debug, info, instrument, warn};

use crate::format::FormatBlock;
use crate::writer::{header_len, max_audio_data_size, WaveSummary, WaveWriter};
use crate::WaveResult;

/// Result of one read from a [`SampleSource`].
#[derive(Debug, Clone)]
pub enum ReadOutcome {
    /// A block of decoded audio bytes.
    Block(Bytes),

    /// The read completed without a sample (a gap or a stream tick).
    NoSample,

    /// The source has no more data.
    EndOfStream,

    /// The source switched media type mid-stream.
    FormatChanged,
}

/// Anything that produces decoded audio blocks in the format of the header.
pub trait SampleSource {
    /// Read the next block.
    fn read(&mut self) -> WaveResult<ReadOutcome>;
}

impl<F> SampleSource for F
where
    F: FnMut() -> WaveResult<ReadOutcome>,
{
    fn read(&mut self) -> WaveResult<ReadOutcome> {
        self()
    }
}

/// Why the data loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The byte budget was reached.
    BudgetReached,

    /// The source ran out of data.
    EndOfStream,

    /// The source changed type, which WAVE cannot represent.
    FormatChanged,
}

/// Outcome of recording a WAVE file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recording {
    /// Sizes patched into the file.
    pub wave: WaveSummary,

    /// Data budget derived from the requested duration.
    pub budget: u32,

    /// Why recording ended.
    pub end: StreamEnd,
}

/// Pull blocks from `source` into `writer` until the budget or the stream ends.
///
/// A source error aborts the loop and is returned unchanged; the caller
/// decides whether the partially written file is kept.
pub fn write_wave_data<W, S>(writer: &mut WaveWriter<W>, source: &mut S) -> WaveResult<StreamEnd>
where
    W: Write + Seek,
    S: SampleSource + ?Sized,
{
    let end = loop {
        if writer.is_full() {
            break StreamEnd::BudgetReached;
        }

        match source.read()? {
            ReadOutcome::Block(block) => {
                writer.write_block(&block)?;
            }
            ReadOutcome::NoSample => continue,
            ReadOutcome::EndOfStream => {
                info!("End of input stream");
                break StreamEnd::EndOfStream;
            }
            ReadOutcome::FormatChanged => {
                warn!("Type change - not supported by WAVE file format");
                break StreamEnd::FormatChanged;
            }
        }
    };

    info!(bytes = writer.data_len(), "Wrote audio data");
    Ok(end)
}

/// Record at most `duration_ms` of audio from `source` into `path`.
///
/// The file is created (or truncated), the header is written with
/// placeholder sizes, data is streamed under the computed budget and the
/// sizes are patched.
#[instrument(
    name = "write_wave_file",
    skip(format, source),
    fields(path = %path.as_ref().display())
)]
pub fn write_wave_file<P, S>(
    path: P,
    format: &FormatBlock,
    duration_ms: u32,
    source: &mut S,
) -> WaveResult<Recording>
where
    P: AsRef<Path>,
    S: SampleSource + ?Sized,
{
    let file = BufWriter::new(File::create(path.as_ref())?);
    record(file, format, duration_ms, source)
}

/// Same as [`write_wave_file`] over an arbitrary seekable stream.
pub fn record<W, S>(
    out: W,
    format: &FormatBlock,
    duration_ms: u32,
    source: &mut S,
) -> WaveResult<Recording>
where
    W: Write + Seek,
    S: SampleSource + ?Sized,
{
    let mut writer = WaveWriter::create(out, &format.bytes)?;

    let budget = max_audio_data_size(
        format.avg_bytes_per_sec,
        format.block_align,
        writer.header_len(),
        duration_ms,
    )?;
    debug_assert_eq!(writer.header_len(), header_len(format.bytes.len() as u32));
    writer.limit_to(budget);
    debug!(budget, duration_ms, "Computed WAVE data budget");

    let end = write_wave_data(&mut writer, source)?;
    let wave = writer.finalize()?;

    Ok(Recording { wave, budget, end })
}
