//! RIFF/WAVE header layout and the size-patching writer.

use std::io::{Seek, SeekFrom, Write};

use tracing::{debug, instrument};

use crate::error::WaveError;
use crate::WaveResult;

/// `RIFF` + size + `WAVE`.
const RIFF_HEADER_LEN: u32 = 12;

/// A chunk id plus its 32-bit size.
const CHUNK_HEADER_LEN: u32 = 8;

/// Offset of the RIFF size field.
const RIFF_SIZE_OFFSET: u64 = 4;

/// Total header length for a `fmt ` payload of `fmt_len` bytes.
///
/// Covers the RIFF header, the whole `fmt ` chunk and the `data` chunk header.
pub fn header_len(fmt_len: u32) -> u32 {
    RIFF_HEADER_LEN + CHUNK_HEADER_LEN + fmt_len + CHUNK_HEADER_LEN
}

/// Largest amount of audio data to write for `duration_ms` of audio.
///
/// The clip size is `avg_bytes_per_sec * duration_ms / 1000`, rounded to
/// nearest, capped so that header plus data still fit a 32-bit RIFF size, and
/// rounded down to whole audio blocks.
pub fn max_audio_data_size(
    avg_bytes_per_sec: u32,
    block_align: u16,
    header_len: u32,
    duration_ms: u32,
) -> WaveResult<u32> {
    if block_align == 0 {
        return Err(WaveError::InvalidFormat("block alignment is zero".into()));
    }

    let clip = (u64::from(avg_bytes_per_sec) * u64::from(duration_ms) + 500) / 1000;
    let ceiling = u64::from(u32::MAX - header_len);
    let clip = clip.min(ceiling);

    let block = u64::from(block_align);
    Ok(((clip / block) * block) as u32)
}

/// Sizes recorded in a finalized file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveSummary {
    /// Bytes before the first audio byte.
    pub header_len: u32,

    /// Bytes in the `data` chunk.
    pub data_len: u32,
}

impl WaveSummary {
    /// Value stored in the RIFF size field.
    pub fn riff_size(&self) -> u32 {
        self.header_len + self.data_len - CHUNK_HEADER_LEN
    }
}

/// Writes a WAVE stream with placeholder sizes and patches them on finalize.
pub struct WaveWriter<W: Write + Seek> {
    inner: W,
    header_len: u32,
    budget: u32,
    data_len: u32,
}

impl<W: Write + Seek> WaveWriter<W> {
    /// Write the RIFF header, the `fmt ` chunk and the `data` chunk header.
    ///
    /// Both size fields are written as zero. The data budget starts at the
    /// largest size a 32-bit RIFF file can hold.
    #[instrument(name = "wave_writer_create", skip_all, fields(fmt_len = fmt.len()))]
    pub fn create(mut inner: W, fmt: &[u8]) -> WaveResult<Self> {
        let fmt_len = u32::try_from(fmt.len())
            .map_err(|_| WaveError::TooLarge(fmt.len() as u64))?;
        if fmt_len % 2 != 0 {
            return Err(WaveError::InvalidFormat(format!(
                "fmt chunk has odd length {fmt_len}"
            )));
        }

        inner.write_all(b"RIFF")?;
        inner.write_all(&0u32.to_le_bytes())?;
        inner.write_all(b"WAVE")?;
        inner.write_all(b"fmt ")?;
        inner.write_all(&fmt_len.to_le_bytes())?;
        inner.write_all(fmt)?;
        inner.write_all(b"data")?;
        inner.write_all(&0u32.to_le_bytes())?;

        let header_len = header_len(fmt_len);
        debug!(header_len, "Wrote WAVE header");

        Ok(Self {
            inner,
            header_len,
            budget: u32::MAX - header_len,
            data_len: 0,
        })
    }

    /// Cap the total amount of audio data.
    pub fn limit_to(&mut self, budget: u32) {
        self.budget = budget.min(u32::MAX - self.header_len);
    }

    /// Header length in bytes.
    pub fn header_len(&self) -> u32 {
        self.header_len
    }

    /// Audio bytes written so far.
    pub fn data_len(&self) -> u32 {
        self.data_len
    }

    /// Bytes that may still be written.
    pub fn remaining(&self) -> u32 {
        self.budget.saturating_sub(self.data_len)
    }

    /// Whether the data budget is used up.
    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Append audio bytes, truncated to the remaining budget.
    ///
    /// Returns how many bytes were written.
    pub fn write_block(&mut self, block: &[u8]) -> WaveResult<usize> {
        let take = block.len().min(self.remaining() as usize);
        if take > 0 {
            self.inner.write_all(&block[..take])?;
            self.data_len += take as u32;
        }
        Ok(take)
    }

    /// Patch the `data` and RIFF size fields and flush.
    pub fn finalize(&mut self) -> WaveResult<WaveSummary> {
        let summary = WaveSummary {
            header_len: self.header_len,
            data_len: self.data_len,
        };

        self.inner
            .seek(SeekFrom::Start(u64::from(self.header_len - 4)))?;
        self.inner.write_all(&summary.data_len.to_le_bytes())?;

        self.inner.seek(SeekFrom::Start(RIFF_SIZE_OFFSET))?;
        self.inner.write_all(&summary.riff_size().to_le_bytes())?;

        self.inner.seek(SeekFrom::End(0))?;
        self.inner.flush()?;

        debug!(
            header_len = summary.header_len,
            data_len = summary.data_len,
            "Patched WAVE chunk sizes"
        );
        Ok(summary)
    }

    /// Recover the underlying stream.
    pub fn into_inner(self) -> W {
        self.inner
    }
}
