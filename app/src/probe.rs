//! `mfcapture probe`: the console device probe.
//!
//! Media Foundation mode lists every audio capture device with its native
//! stream types and records a short test file from each. Legacy mode does
//! the same through waveIn and reports the recorded level.

use anyhow::Result;

use crate::cli::{ProbeArgs, ProbeFormat};

/// `WFAudioTest-DeviceNN.<ext>`.
pub fn probe_file_name(index: usize, format: ProbeFormat) -> String {
    format!("WFAudioTest-Device{index:02}.{}", format.extension())
}

/// Recording length as shown on the console: whole seconds when exact,
/// milliseconds otherwise.
pub fn duration_label(duration_ms: u32) -> String {
    if duration_ms % 1000 == 0 {
        format!("{} sec", duration_ms / 1000)
    } else {
        format!("{duration_ms} ms")
    }
}

/// Run the probe. Failures are printed; "All Done" always ends the output.
pub fn run(args: &ProbeArgs) -> Result<()> {
    let result = if args.legacy {
        platform::probe_legacy()
    } else {
        platform::probe_media_foundation(args)
    };
    if let Err(e) = result {
        println!("{e:#}");
    }
    println!("All Done");
    Ok(())
}

#[cfg(windows)]
mod platform {
    use anyhow::{Context, Result};
    use tracing::{debug, warn};

    use mfcapture_capture::{write_encoded_audio_file, write_wave_file};
    use mfcapture_device::{
        legacy_input_devices, native_media_types, record_legacy, write_pcm16_wave, DeviceList,
        MediaFoundation, LEGACY_RECORD_SECONDS, STANDARD_FORMATS,
    };
    use mfcapture_ipc::{EncodingParameters, MediaKind, OutputFormat};
    use mfcapture_wave::average_absolute_level;

    use super::{duration_label, probe_file_name};
    use crate::cli::{ProbeArgs, ProbeFormat};

    pub fn probe_media_foundation(args: &ProbeArgs) -> Result<()> {
        println!("MF Audio Info");
        let _runtime = MediaFoundation::startup().context("Failed to start Media Foundation")?;

        let mut devices = DeviceList::new();
        let count = devices
            .enumerate(MediaKind::Audio)
            .context("Error enumerating audio devices")?;
        println!("Number of devices: {count}");

        for index in 0..count {
            if let Err(e) = probe_device(&devices, index, args) {
                println!("{e:#}");
            }
        }
        Ok(())
    }

    fn probe_device(devices: &DeviceList, index: usize, args: &ProbeArgs) -> Result<()> {
        let name = devices
            .name(index)
            .with_context(|| format!("Error getting information for audio device {index}"))?;
        println!("{index} {name}");

        let reader = devices
            .create_source_reader(index, None)
            .with_context(|| format!("Error creating media source for device {index}"))?;

        match native_media_types(&reader) {
            Ok(streams) => streams.iter().for_each(|stream| print!("{stream}")),
            Err(e) => warn!(index, error = %e, "Failed to list native types"),
        }

        println!("  Trying to record for {}...", duration_label(args.duration_ms));
        let file = probe_file_name(index, args.format);
        match args.format {
            ProbeFormat::Wave => {
                let recording = write_wave_file(&reader, &file, args.duration_ms)
                    .with_context(|| format!("Error writing WAV file for device {index}"))?;
                debug!(?recording, "Probe recording");
            }
            ProbeFormat::Wma => {
                let params = EncodingParameters::new(OutputFormat::Wma);
                let recording =
                    write_encoded_audio_file(&reader, &file, args.duration_ms, params)
                        .with_context(|| {
                            format!("Error writing WMA file for device {index} for {file}")
                        })?;
                debug!(?recording, "Probe recording");
            }
        }
        println!("    Output is {file}");
        Ok(())
    }

    pub fn probe_legacy() -> Result<()> {
        println!("MM Audio Info");
        let devices = legacy_input_devices().context("Error listing waveIn devices")?;
        println!("Number of devices: {}", devices.len());

        for device in &devices {
            println!("{} {}", device.index, device.name);
            println!("  Channels: {}", device.channels);
            println!(
                "  Supports {} of {} standard formats",
                device.supported_format_count(),
                STANDARD_FORMATS.len()
            );
            println!("  Trying to record for {LEGACY_RECORD_SECONDS} sec...");

            let file = device.recording_file_name();
            let recorded = record_legacy(device.index, LEGACY_RECORD_SECONDS)
                .and_then(|samples| write_pcm16_wave(&file, &samples).map(|_| samples));
            match recorded {
                Ok(samples) => {
                    println!(
                        "  Can record, Average absolute level={:.2}",
                        average_absolute_level(&samples)
                    );
                    println!("    Output is {file}");
                }
                Err(e) => {
                    warn!(index = device.index, error = %e, "Legacy recording failed");
                    println!("  Cannot record");
                }
            }
        }
        Ok(())
    }
}

#[cfg(not(windows))]
mod platform {
    use anyhow::{bail, Result};

    use crate::cli::ProbeArgs;

    pub fn probe_media_foundation(_args: &ProbeArgs) -> Result<()> {
        bail!(crate::UNSUPPORTED)
    }

    pub fn probe_legacy() -> Result<()> {
        bail!(crate::UNSUPPORTED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_file_name() {
        assert_eq!(probe_file_name(0, ProbeFormat::Wma), "WFAudioTest-Device00.wma");
        assert_eq!(probe_file_name(7, ProbeFormat::Wave), "WFAudioTest-Device07.wav");
        assert_eq!(probe_file_name(12, ProbeFormat::Wma), "WFAudioTest-Device12.wma");
    }

    #[test]
    fn test_duration_label() {
        assert_eq!(duration_label(10_000), "10 sec");
        assert_eq!(duration_label(500), "500 ms");
        assert_eq!(duration_label(2_500), "2500 ms");
        assert_eq!(duration_label(0), "0 sec");
    }
}
