//! jaggd-usb - USB transport for the Atari Jaguar GameDrive
//!
//! The GameDrive cartridge exposes a single vendor interface. Commands travel
//! as the data stage of vendor control transfers (request 1, value 0, index
//! 0); payload data goes to bulk OUT endpoint 2.
//!
//! # Example
//!
//! ```no_run
//! use jaggd_usb::GameDrive;
//!
//! let drive = GameDrive::open()?;
//! println!("GameDrive on bus {} address {}", drive.bus(), drive.address());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Configuration Options
//!
//! - `index=N`: Select the Nth matching device (0-indexed)
//! - `vid=XXXX`, `pid=XXXX`: Override the USB vendor/product id (hex)

mod device;
mod error;
mod protocol;

pub use device::{parse_options, GameDrive, GameDriveConfig, GameDriveDeviceInfo};
pub use error::{GameDriveError, Result};
pub use protocol::{GAMEDRIVE_USB_PRODUCT, GAMEDRIVE_USB_VENDOR};
