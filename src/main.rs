//! jaggd - Atari Jaguar GameDrive upload utility
//!
//! Uploads programs into Jaguar RAM, starts them, writes files to the
//! GameDrive memory card and sets up EEPROM save files.
//!
//! # Architecture
//!
//! The command line is resolved into a `jaggd_core::Operation`, which is
//! turned into a fully validated `Plan` before any device is opened. Only
//! then is the selected transport opened and the plan sent:
//! - **usb** - A GameDrive cartridge on the USB bus
//! - **dummy** - An in-memory emulator, for trying things out without hardware

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::Cli;
use jaggd_core::{Operation, Plan};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logger; RUST_LOG still wins over -v
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(cli.verbose)),
    )
    .init();

    if cli.list {
        commands::list_devices(&cli.programmer)?;
    }

    let operation = Operation::from(&cli);
    if operation.is_empty() {
        return Ok(());
    }

    // Everything is loaded and checked before the device is touched
    let plan = Plan::prepare(&operation)?;

    programmers::with_transport(&cli.programmer, |transport| {
        commands::run_plan(transport, plan)
    })
}

/// Default log filter for a `-v` count
fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_sets_filter() {
        assert_eq!(log_filter(0), "info");
        assert_eq!(log_filter(1), "debug");
        assert_eq!(log_filter(2), "trace");
        assert_eq!(log_filter(5), "trace");
    }

    #[test]
    fn test_verbose_flag_reaches_filter() {
        let cli = Cli::try_parse_from(["jaggd", "-vv", "-r"]).unwrap();
        assert_eq!(log_filter(cli.verbose), "trace");

        let cli = Cli::try_parse_from(["jaggd", "-r"]).unwrap();
        assert_eq!(log_filter(cli.verbose), "info");
    }
}
