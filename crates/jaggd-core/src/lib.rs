//! jaggd-core - Image detection and command encoding for the Jaguar GameDrive
//!
//! This crate holds everything jaggd needs to talk to a GameDrive cartridge
//! except the USB plumbing itself:
//!
//! - [`image`] - loads a local file and works out where it belongs in Jaguar
//!   memory (ROM images, COFF, JAGR server executables, DRI ABS files, ...)
//! - [`protocol`] - encodes the fixed-layout vendor command packets
//! - [`transfer`] - sequences commands and bulk payloads against a
//!   [`transfer::Transport`]
//!
//! # Example
//!
//! ```ignore
//! use jaggd_core::transfer::{NoProgress, Orchestrator, Plan, TransferConfig, Transport};
//! use jaggd_core::Operation;
//!
//! fn upload<T: Transport>(transport: &mut T, op: &Operation) -> jaggd_core::Result<()> {
//!     let plan = Plan::prepare(op)?;
//!     Orchestrator::new(transport, TransferConfig::default()).run(plan, &mut NoProgress)
//! }
//! ```

#![warn(rust_2018_idioms)]

pub mod error;
pub mod image;
pub mod memory;
pub mod operation;
pub mod protocol;
pub mod transfer;

pub use error::{Error, Result};
pub use image::{ImageFormat, LayoutDescriptor};
pub use memory::{MemoryRange, RAM_WINDOW};
pub use operation::{
    EepromRequest, ExecuteMode, Operation, Overrides, UploadRequest, WriteFileRequest,
};
pub use transfer::{Orchestrator, Plan, Transport, TransferConfig};
