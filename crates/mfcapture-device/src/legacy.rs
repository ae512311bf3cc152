//! waveIn device probe.
//!
//! Lists the multimedia-API input devices, reports how many of the standard
//! PCM formats each supports, and records a fixed-length 44.1 kHz mono clip.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use mfcapture_wave::{pcm16_bytes, WaveFormat, WaveSummary, WaveWriter};

use crate::DeviceResult;

/// Sample rate used for legacy recordings.
pub const LEGACY_SAMPLE_RATE: u32 = 44_100;

/// Length of a legacy recording.
pub const LEGACY_RECORD_SECONDS: u32 = 10;

/// The sixteen `WAVE_FORMAT_*` capability bits checked by the probe.
pub const STANDARD_FORMATS: [(u32, &str); 16] = [
    (0x0000_0001, "11.025 kHz, mono, 8-bit"),
    (0x0000_0004, "11.025 kHz, mono, 16-bit"),
    (0x0000_0002, "11.025 kHz, stereo, 8-bit"),
    (0x0000_0008, "11.025 kHz, stereo, 16-bit"),
    (0x0000_0010, "22.05 kHz, mono, 8-bit"),
    (0x0000_0040, "22.05 kHz, mono, 16-bit"),
    (0x0000_0020, "22.05 kHz, stereo, 8-bit"),
    (0x0000_0080, "22.05 kHz, stereo, 16-bit"),
    (0x0000_0100, "44.1 kHz, mono, 8-bit"),
    (0x0000_0400, "44.1 kHz, mono, 16-bit"),
    (0x0000_0200, "44.1 kHz, stereo, 8-bit"),
    (0x0000_0800, "44.1 kHz, stereo, 16-bit"),
    (0x0001_0000, "96 kHz, mono, 8-bit"),
    (0x0004_0000, "96 kHz, mono, 16-bit"),
    (0x0002_0000, "96 kHz, stereo, 8-bit"),
    (0x0008_0000, "96 kHz, stereo, 16-bit"),
];

/// A waveIn device as reported by `waveInGetDevCaps`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyDevice {
    pub index: usize,
    pub name: String,
    pub channels: u16,
    /// Raw `dwFormats` capability mask.
    pub formats: u32,
}

impl LegacyDevice {
    /// Names of the standard formats this device supports.
    pub fn supported_formats(&self) -> Vec<&'static str> {
        STANDARD_FORMATS
            .iter()
            .filter(|(bit, _)| self.formats & bit != 0)
            .map(|(_, name)| *name)
            .collect()
    }

    pub fn supported_format_count(&self) -> usize {
        self.supported_formats().len()
    }

    /// `MM-AudioTest-<name>.wav`, with path separators and other reserved
    /// characters replaced.
    pub fn recording_file_name(&self) -> String {
        let name: String = self
            .name
            .chars()
            .map(|c| match c {
                '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        format!("MM-AudioTest-{name}.wav")
    }
}

/// Write 16-bit mono samples at [`LEGACY_SAMPLE_RATE`] as a WAVE file.
pub fn write_pcm16_wave(path: impl AsRef<Path>, samples: &[i16]) -> DeviceResult<WaveSummary> {
    let format = WaveFormat::pcm(LEGACY_SAMPLE_RATE, 1, 16)?.to_bytes()?;
    let file = File::create(path.as_ref()).map_err(mfcapture_wave::WaveError::from)?;
    let file = BufWriter::new(file);

    let mut writer = WaveWriter::create(file, &format)?;
    writer.write_block(&pcm16_bytes(samples))?;
    Ok(writer.finalize()?)
}

#[cfg(windows)]
pub use platform::{legacy_input_devices, record_legacy};

#[cfg(windows)]
mod platform {
    use std::mem::size_of;
    use std::time::Duration;

    use tracing::{debug, instrument, warn};
    use windows::core::PSTR;
    use windows::Win32::Media::Audio::{
        waveInAddBuffer, waveInClose, waveInGetDevCapsW, waveInGetErrorTextW, waveInGetNumDevs,
        waveInOpen, waveInPrepareHeader, waveInReset, waveInStart, waveInUnprepareHeader,
        HWAVEIN, WAVEFORMATEX, WAVEHDR, WAVEINCAPSW, WAVE_FORMAT_DIRECT, WAVE_FORMAT_PCM,
    };

    use super::{LegacyDevice, LEGACY_SAMPLE_RATE};
    use crate::error::DeviceError;
    use crate::DeviceResult;

    const MMSYSERR_NOERROR: u32 = 0;
    const WAVERR_STILLPLAYING: u32 = 33;

    fn check(code: u32, context: &'static str, device: usize) -> DeviceResult<()> {
        if code == MMSYSERR_NOERROR {
            return Ok(());
        }
        let mut text = [0u16; 256];
        let message = if unsafe { waveInGetErrorTextW(code, &mut text) } == MMSYSERR_NOERROR {
            let end = text.iter().position(|&c| c == 0).unwrap_or(text.len());
            String::from_utf16_lossy(&text[..end])
        } else {
            "unknown error".to_string()
        };
        Err(DeviceError::Legacy {
            context,
            device,
            code,
            message,
        })
    }

    /// All waveIn devices. Devices whose capabilities cannot be read are
    /// skipped with a warning.
    #[instrument(name = "legacy_input_devices")]
    pub fn legacy_input_devices() -> DeviceResult<Vec<LegacyDevice>> {
        let count = unsafe { waveInGetNumDevs() } as usize;
        let mut devices = Vec::with_capacity(count);

        for index in 0..count {
            let mut caps = WAVEINCAPSW::default();
            let code =
                unsafe { waveInGetDevCapsW(index, &mut caps, size_of::<WAVEINCAPSW>() as u32) };
            if let Err(e) = check(code, "waveInGetDevCaps", index) {
                warn!(index, error = %e, "Error getting information for audio device");
                continue;
            }

            let pname = caps.szPname;
            let end = pname.iter().position(|&c| c == 0).unwrap_or(pname.len());
            devices.push(LegacyDevice {
                index,
                name: String::from_utf16_lossy(&pname[..end]),
                channels: caps.wChannels,
                formats: caps.dwFormats,
            });
        }

        debug!(count = devices.len(), "Enumerated waveIn devices");
        Ok(devices)
    }

    /// Record `seconds` of 44.1 kHz mono 16-bit audio from waveIn device `index`.
    #[instrument(name = "record_legacy")]
    pub fn record_legacy(index: usize, seconds: u32) -> DeviceResult<Vec<i16>> {
        let format = WAVEFORMATEX {
            wFormatTag: WAVE_FORMAT_PCM as u16,
            nChannels: 1,
            nSamplesPerSec: LEGACY_SAMPLE_RATE,
            nAvgBytesPerSec: LEGACY_SAMPLE_RATE * 2,
            nBlockAlign: 2,
            wBitsPerSample: 16,
            cbSize: 0,
        };

        let mut handle = HWAVEIN::default();
        let code = unsafe {
            waveInOpen(Some(&mut handle), index as u32, &format, 0, 0, WAVE_FORMAT_DIRECT)
        };
        check(code, "waveInOpen", index)?;

        let mut samples = vec![0i16; (LEGACY_SAMPLE_RATE * seconds) as usize];
        let mut header = WAVEHDR {
            lpData: PSTR(samples.as_mut_ptr().cast()),
            dwBufferLength: (samples.len() * 2) as u32,
            ..Default::default()
        };
        let header_size = size_of::<WAVEHDR>() as u32;

        let result = (|| {
            check(
                unsafe { waveInPrepareHeader(handle, &mut header, header_size) },
                "waveInPrepareHeader",
                index,
            )?;
            check(
                unsafe { waveInAddBuffer(handle, &mut header, header_size) },
                "waveInAddBuffer",
                index,
            )?;
            check(unsafe { waveInStart(handle) }, "waveInStart", index)?;

            // Unprepare keeps failing with WAVERR_STILLPLAYING until the buffer is full.
            loop {
                let code = unsafe { waveInUnprepareHeader(handle, &mut header, header_size) };
                if code != WAVERR_STILLPLAYING {
                    return check(code, "waveInUnprepareHeader", index);
                }
                std::thread::sleep(Duration::from_millis(50));
            }
        })();

        unsafe {
            if result.is_err() {
                waveInReset(handle);
                waveInUnprepareHeader(handle, &mut header, header_size);
            }
            waveInClose(handle);
        }
        result?;

        let recorded = (header.dwBytesRecorded / 2) as usize;
        samples.truncate(recorded);
        debug!(samples = samples.len(), "Legacy recording complete");
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str, formats: u32) -> LegacyDevice {
        LegacyDevice {
            index: 0,
            name: name.to_string(),
            channels: 2,
            formats,
        }
    }

    #[test]
    fn test_format_count_uses_mask() {
        assert_eq!(device("none", 0).supported_format_count(), 0);
        assert_eq!(device("all", 0x000f_0fff).supported_format_count(), 16);

        // 44.1 kHz mono/stereo 16-bit only; 48 kHz bits are not in the table.
        let dev = device("cd", 0x0000_0c00 | 0x0000_f000);
        assert_eq!(
            dev.supported_formats(),
            vec!["44.1 kHz, mono, 16-bit", "44.1 kHz, stereo, 16-bit"]
        );
    }

    #[test]
    fn test_format_bits_are_distinct() {
        let mask = STANDARD_FORMATS.iter().fold(0u32, |acc, (bit, _)| {
            assert_eq!(acc & bit, 0);
            acc | bit
        });
        assert_eq!(mask.count_ones(), 16);
    }

    #[test]
    fn test_recording_file_name_is_sanitized() {
        assert_eq!(
            device("Microphone (USB Audio)", 0).recording_file_name(),
            "MM-AudioTest-Microphone (USB Audio).wav"
        );
        assert_eq!(
            device("Line In: 1/2", 0).recording_file_name(),
            "MM-AudioTest-Line In_ 1_2.wav"
        );
    }

    #[test]
    fn test_write_pcm16_wave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.wav");
        let samples: Vec<i16> = (0..441).map(|i| (i * 70 - 15_000) as i16).collect();

        let summary = write_pcm16_wave(&path, &samples).unwrap();
        assert_eq!(summary.data_len, 882);

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, LEGACY_SAMPLE_RATE);
        assert_eq!(reader.spec().channels, 1);
        let decoded: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(decoded, samples);
    }
}
