//! Transport registration and dispatch
//!
//! This module provides a centralized registry for the transports a GameDrive
//! can be reached through, with support for feature-gated inclusion.

use jaggd_core::Transport;

/// Information about a transport
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Short description
    pub description: &'static str,
}

/// Get information about all available transports (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "usb")]
    programmers.push(ProgrammerInfo {
        name: "usb",
        description: "GameDrive cartridge over USB (vid=<hex>,pid=<hex>,index=<n>)",
    });

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        description: "In-memory GameDrive emulator for testing",
    });

    programmers
}

/// Generate help text listing all available transports
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No transports available (recompile with transport features enabled)".to_string();
    }

    let mut help = String::from("Available transports:\n");
    for p in &programmers {
        help.push_str(&format!("  {:8} - {}\n", p.name, p.description));
    }
    help
}

/// Open the transport named by `programmer` and run `f` against it
///
/// The device is released when `f` returns.
#[allow(unused_variables)]
pub fn with_transport<F>(programmer: &str, f: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&mut dyn Transport) -> Result<(), Box<dyn std::error::Error>>,
{
    let (name, options) = parse_programmer_string(programmer);

    match name {
        #[cfg(feature = "usb")]
        "usb" => {
            use jaggd_usb::{parse_options, GameDrive};

            let config =
                parse_options(&options).map_err(|e| format!("Invalid USB parameters: {}", e))?;
            let mut drive = GameDrive::open_with_config(config)?;
            log::info!(
                "Connected to GameDrive at bus {} address {}",
                drive.bus(),
                drive.address()
            );
            f(&mut drive)
        }

        #[cfg(feature = "dummy")]
        "dummy" => {
            use jaggd_dummy::DummyGameDrive;

            let mut drive = DummyGameDrive::new_default();
            let result = f(&mut drive);
            for event in drive.events() {
                log::info!("dummy: {:?}", event);
            }
            result
        }

        _ => Err(unknown_programmer_error(name)),
    }
}

/// Parse a transport string into name and options
///
/// Format: `name` or `name:key=value,key=value`
pub fn parse_programmer_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

pub fn unknown_programmer_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown transport: {}\n\n", name);
    msg.push_str(&programmer_help());
    msg.into()
}
