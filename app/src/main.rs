//! Command-line front end for mfcapture.

mod cli;
mod devices;
mod probe;
mod record;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};

/// Shown on platforms without Media Foundation.
#[cfg(not(windows))]
pub(crate) const UNSUPPORTED: &str = "mfcapture requires Windows Media Foundation";

/// Initialize logging. Logs go to stderr so stdout stays parseable.
fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "mfcapture=info,mfcapture_engine=debug,mfcapture_capture=info,mfcapture_device=info,mfcapture_wave=info".into()
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Command::Devices(args) => devices::run(&args),
        Command::Record(args) => record::run(&args),
        Command::Probe(args) => probe::run(&args),
    }
}
