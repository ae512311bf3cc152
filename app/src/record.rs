//! `mfcapture record`: drives the engine from the console.

use anyhow::{bail, Result};

use mfcapture_ipc::EngineCommand;

use crate::cli::RecordArgs;

/// Commands that start the capture once the device list is known.
///
/// An empty list means there is nothing to record.
pub fn start_commands(requested: Option<usize>, available: usize) -> Result<Vec<EngineCommand>> {
    if available == 0 {
        return Ok(Vec::new());
    }
    let mut commands = Vec::with_capacity(2);
    if let Some(index) = requested {
        if index >= available {
            bail!("Device {index} does not exist ({available} available)");
        }
        commands.push(EngineCommand::SelectDevice(index));
    }
    commands.push(EngineCommand::StartCapture);
    Ok(commands)
}

/// Whether a console read should stop the capture.
///
/// Only a line typed by the user counts. A closed or unreadable stdin
/// leaves the capture running.
pub fn is_stop_request(read: std::io::Result<usize>) -> bool {
    matches!(read, Ok(n) if n > 0)
}

#[cfg(windows)]
pub fn run(args: &RecordArgs) -> Result<()> {
    use std::io::BufRead;
    use std::thread;

    use anyhow::{anyhow, Context};
    use tracing::{debug, info};

    use mfcapture_engine::create_engine;
    use mfcapture_ipc::{command_channel, event_channel, EngineEvent, EngineState};

    let config = args.to_config();
    let requested = args.device;

    let (command_tx, command_rx) = command_channel();
    let (event_tx, event_rx) = event_channel();

    // Media Foundation objects stay on the thread that created them.
    let engine_thread = thread::spawn(move || -> mfcapture_engine::EngineResult<()> {
        info!("Engine thread starting");
        let mut engine = create_engine(command_rx, event_tx, config)?;
        engine.run();
        info!("Engine thread stopped");
        Ok(())
    });

    let stop_tx = command_tx.clone();
    thread::spawn(move || {
        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line);
        if is_stop_request(read) {
            let _ = stop_tx.send(EngineCommand::StopCapture);
        } else {
            debug!("Console input closed, capture keeps running");
        }
    });

    let mut requested_start = false;
    let mut failed = false;

    for event in event_rx.iter() {
        match event {
            EngineEvent::Devices { devices, .. } if !requested_start => {
                requested_start = true;
                let commands = match start_commands(requested, devices.len()) {
                    Ok(commands) => commands,
                    Err(e) => {
                        eprintln!("{e}");
                        failed = true;
                        Vec::new()
                    }
                };
                if commands.is_empty() {
                    failed = true;
                    command_tx.send(EngineCommand::Shutdown)?;
                }
                for command in commands {
                    command_tx.send(command)?;
                }
            }
            EngineEvent::StateChanged { current, .. } => match *current {
                EngineState::Capturing { session } => println!(
                    "Recording '{}' to {} as {}. Press Enter to stop.",
                    session.device_name, session.output_path, session.format
                ),
                EngineState::Error { message, .. } => {
                    eprintln!("Could not start capture: {message}");
                    failed = true;
                    command_tx.send(EngineCommand::Shutdown)?;
                }
                other => debug!(state = other.name(), "Engine state"),
            },
            EngineEvent::Error { message, .. } => {
                eprintln!("Error: {message}");
                failed = true;
            }
            EngineEvent::DeviceLost => println!("The capture device was removed."),
            EngineEvent::CaptureFinished { path, reason } => {
                println!("{}. Output is {path}", reason.message());
                command_tx.send(EngineCommand::Shutdown)?;
            }
            EngineEvent::Shutdown => break,
            other => debug!(?other, "Engine event"),
        }
    }

    engine_thread
        .join()
        .map_err(|_| anyhow!("Engine thread panicked"))?
        .context("Failed to start the capture engine")?;

    if failed {
        bail!("Recording failed");
    }
    Ok(())
}

#[cfg(not(windows))]
pub fn run(_args: &RecordArgs) -> Result<()> {
    bail!(crate::UNSUPPORTED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_commands() {
        let commands = start_commands(None, 2).unwrap();
        assert!(matches!(commands.as_slice(), [EngineCommand::StartCapture]));

        let commands = start_commands(Some(1), 2).unwrap();
        assert!(matches!(
            commands.as_slice(),
            [EngineCommand::SelectDevice(1), EngineCommand::StartCapture]
        ));

        assert!(start_commands(Some(2), 2).is_err());
        assert!(start_commands(Some(0), 0).unwrap().is_empty());
    }

    #[test]
    fn test_stop_request_needs_a_line() {
        assert!(is_stop_request(Ok(1)));
        assert!(is_stop_request(Ok(2)));
        assert!(!is_stop_request(Ok(0)));
        assert!(!is_stop_request(Err(std::io::Error::from(
            std::io::ErrorKind::BrokenPipe
        ))));
    }
}
