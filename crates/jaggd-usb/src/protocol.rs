//! GameDrive USB constants

// USB device identifiers
pub const GAMEDRIVE_USB_VENDOR: u16 = 0x03EB;
pub const GAMEDRIVE_USB_PRODUCT: u16 = 0x2423;

/// Vendor interface carrying both command and data traffic
pub const INTERFACE: u8 = 0;

/// Bulk OUT endpoint for payload data (EP2 OUT)
pub const BULK_OUT_EP: u8 = 0x02;

/// bRequest of every command control transfer
pub const REQUEST_COMMAND: u8 = 0x01;
