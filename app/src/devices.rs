//! `mfcapture devices`.

use anyhow::Result;

use mfcapture_ipc::DeviceInfo;

use crate::cli::DevicesArgs;

/// `<index> <name>` as the probe prints it.
pub fn device_line(device: &DeviceInfo) -> String {
    format!("{} {}", device.index, device.name)
}

#[cfg(windows)]
pub fn run(args: &DevicesArgs) -> Result<()> {
    use anyhow::Context;
    use mfcapture_device::{DeviceList, MediaFoundation};

    let _runtime = MediaFoundation::startup().context("Failed to start Media Foundation")?;
    let mut list = DeviceList::new();
    list.enumerate(args.kind())
        .with_context(|| format!("Error enumerating {} devices", args.kind()))?;
    let devices = list.describe();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
    } else {
        println!("Number of devices: {}", devices.len());
        for device in &devices {
            println!("{}", device_line(device));
        }
    }
    Ok(())
}

#[cfg(not(windows))]
pub fn run(_args: &DevicesArgs) -> Result<()> {
    anyhow::bail!(crate::UNSUPPORTED)
}
