//! GameDrive device implementation
//!
//! This module provides the `GameDrive` struct, which owns the claimed USB
//! interface and implements [`Transport`] for the core orchestrator. Dropping
//! a `GameDrive` drops its nusb `Interface` and `Endpoint`, which releases the
//! claimed interface and closes the device.

use std::time::Duration;

use jaggd_core::transfer::Transport;
use nusb::transfer::{Buffer, Bulk, ControlOut, ControlType, Out, Recipient};
use nusb::{Endpoint, Interface, MaybeFuture};

use crate::error::{GameDriveError, Result};
use crate::protocol::*;

/// Configuration options for opening a GameDrive
#[derive(Debug, Clone)]
pub struct GameDriveConfig {
    /// Device index (when multiple devices are connected)
    pub device_index: usize,
    /// USB vendor id to match
    pub vendor_id: u16,
    /// USB product id to match
    pub product_id: u16,
}

impl Default for GameDriveConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            vendor_id: GAMEDRIVE_USB_VENDOR,
            product_id: GAMEDRIVE_USB_PRODUCT,
        }
    }
}

fn parse_hex_u16(key: &str, value: &str) -> Result<u16> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u16::from_str_radix(digits, 16)
        .map_err(|_| GameDriveError::InvalidParameter(format!("{}: {}", key, value)))
}

/// Parse options from key=value pairs
pub fn parse_options(options: &[(&str, &str)]) -> Result<GameDriveConfig> {
    let mut config = GameDriveConfig::default();

    for (key, value) in options {
        match *key {
            "index" | "device" => {
                config.device_index = value.parse().map_err(|_| {
                    GameDriveError::InvalidParameter(format!("index: {}", value))
                })?;
            }
            "vid" => config.vendor_id = parse_hex_u16(key, value)?,
            "pid" => config.product_id = parse_hex_u16(key, value)?,
            _ => {
                return Err(GameDriveError::InvalidParameter(format!(
                    "unknown option: {}",
                    key
                )));
            }
        }
    }

    Ok(config)
}

/// Bus location of a connected GameDrive
#[derive(Debug, Clone)]
pub struct GameDriveDeviceInfo {
    /// USB bus number
    pub bus: u8,
    /// Device address on the bus
    pub address: u8,
}

/// An open GameDrive cartridge
pub struct GameDrive {
    /// USB interface
    interface: Interface,
    /// Bulk OUT endpoint for payload data
    out_ep: Endpoint<Bulk, Out>,
    bus: u8,
    address: u8,
}

impl GameDrive {
    /// Open the first GameDrive found
    pub fn open() -> Result<Self> {
        Self::open_with_config(GameDriveConfig::default())
    }

    /// Open a GameDrive with the specified configuration
    pub fn open_with_config(config: GameDriveConfig) -> Result<Self> {
        let devices: Vec<_> = nusb::list_devices()
            .wait()
            .map_err(|e| GameDriveError::OpenFailed(e.to_string()))?
            .filter(|d| d.vendor_id() == config.vendor_id && d.product_id() == config.product_id)
            .collect();

        let device_info =
            devices
                .get(config.device_index)
                .ok_or(GameDriveError::DeviceNotFound {
                    vid: config.vendor_id,
                    pid: config.product_id,
                })?;

        log::info!(
            "Opening GameDrive at bus {} address {}",
            device_info.busnum(),
            device_info.device_address()
        );

        let device = device_info
            .open()
            .wait()
            .map_err(|e| GameDriveError::OpenFailed(e.to_string()))?;

        let interface = device
            .claim_interface(INTERFACE)
            .wait()
            .map_err(|e| GameDriveError::ClaimFailed(e.to_string()))?;

        let out_ep = interface
            .endpoint::<Bulk, Out>(BULK_OUT_EP)
            .map_err(|e| GameDriveError::ClaimFailed(e.to_string()))?;

        Ok(Self {
            interface,
            out_ep,
            bus: device_info.busnum(),
            address: device_info.device_address(),
        })
    }

    /// List all connected GameDrives matching `config`'s USB ids
    pub fn list_devices(config: &GameDriveConfig) -> Result<Vec<GameDriveDeviceInfo>> {
        let devices = nusb::list_devices()
            .wait()
            .map_err(|e| GameDriveError::OpenFailed(e.to_string()))?
            .filter(|d| d.vendor_id() == config.vendor_id && d.product_id() == config.product_id)
            .map(|d| GameDriveDeviceInfo {
                bus: d.busnum(),
                address: d.device_address(),
            })
            .collect();

        Ok(devices)
    }

    /// USB bus number
    pub fn bus(&self) -> u8 {
        self.bus
    }

    /// Device address on the bus
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Send a command packet as a vendor control OUT transfer
    fn control_write(&mut self, data: &[u8], timeout: Duration) -> Result<usize> {
        self.interface
            .control_out(
                ControlOut {
                    control_type: ControlType::Vendor,
                    recipient: Recipient::Device,
                    request: REQUEST_COMMAND,
                    value: 0,
                    index: 0,
                    data,
                },
                timeout,
            )
            .wait()
            .map_err(|e| GameDriveError::TransferFailed(e.to_string()))?;

        log::trace!("Control write {} bytes", data.len());
        Ok(data.len())
    }

    /// Bulk write, returning how many bytes the device accepted
    fn bulk_write(&mut self, data: &[u8], timeout: Duration) -> Result<usize> {
        let mut out_buf = Buffer::new(data.len());
        out_buf.extend_from_slice(data);

        let completion = self.out_ep.transfer_blocking(out_buf, timeout);
        completion
            .status
            .map_err(|e| GameDriveError::TransferFailed(e.to_string()))?;

        log::trace!("Bulk write {} of {} bytes", completion.actual_len, data.len());
        Ok(completion.actual_len)
    }
}

impl Transport for GameDrive {
    fn control_transfer(&mut self, packet: &[u8], timeout: Duration) -> jaggd_core::Result<usize> {
        Ok(self.control_write(packet, timeout)?)
    }

    fn bulk_transfer(&mut self, data: &[u8], timeout: Duration) -> jaggd_core::Result<usize> {
        Ok(self.bulk_write(data, timeout)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = parse_options(&[]).unwrap();
        assert_eq!(config.device_index, 0);
        assert_eq!(config.vendor_id, GAMEDRIVE_USB_VENDOR);
        assert_eq!(config.product_id, GAMEDRIVE_USB_PRODUCT);
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("index", "2"), ("vid", "0x1234"), ("pid", "abcd")]).unwrap();
        assert_eq!(config.device_index, 2);
        assert_eq!(config.vendor_id, 0x1234);
        assert_eq!(config.product_id, 0xABCD);
    }

    #[test]
    fn test_parse_options_rejects_garbage() {
        assert!(matches!(
            parse_options(&[("vid", "xyz")]),
            Err(GameDriveError::InvalidParameter(_))
        ));
        assert!(matches!(
            parse_options(&[("speed", "fast")]),
            Err(GameDriveError::InvalidParameter(_))
        ));
    }
}
