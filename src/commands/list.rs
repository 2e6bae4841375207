//! List command implementation

use crate::programmers::{self, parse_programmer_string};

/// List the GameDrives reachable through `programmer`
#[allow(unused_variables)]
pub fn list_devices(programmer: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (name, options) = parse_programmer_string(programmer);

    match name {
        #[cfg(feature = "usb")]
        "usb" => {
            use jaggd_usb::{parse_options, GameDrive};

            let config =
                parse_options(&options).map_err(|e| format!("Invalid USB parameters: {}", e))?;
            let devices = GameDrive::list_devices(&config)?;

            if devices.is_empty() {
                println!(
                    "No GameDrive found (VID:{:04X} PID:{:04X})",
                    config.vendor_id, config.product_id
                );
                return Ok(());
            }

            println!("{:<6} {:<6} {:<8}", "Index", "Bus", "Address");
            println!("{}", "-".repeat(22));
            for (index, dev) in devices.iter().enumerate() {
                println!("{:<6} {:<6} {:<8}", index, dev.bus, dev.address);
            }
            Ok(())
        }

        #[cfg(feature = "dummy")]
        "dummy" => {
            println!("0      dummy  In-memory GameDrive emulator");
            Ok(())
        }

        _ => Err(programmers::unknown_programmer_error(name)),
    }
}
