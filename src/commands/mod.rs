//! CLI command implementations
//!
//! ## Transfer
//!
//! The `transfer` module runs a prepared plan against an open transport and
//! draws a progress bar for each bulk payload.
//!
//! ## List
//!
//! Lists the GameDrives a transport can see.

mod list;
mod transfer;

pub use list::list_devices;
pub use transfer::run_plan;
