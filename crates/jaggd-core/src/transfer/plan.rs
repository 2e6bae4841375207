//! Operation planning and validation

use std::fs::File;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::image::LayoutDescriptor;
use crate::memory::RAM_WINDOW;
use crate::operation::{ExecuteMode, Operation};
use crate::protocol::{
    encode_enable_eeprom, encode_reset, encode_upload_execute, encode_write_file, CommandPacket,
    ResetMode, UploadExecute,
};

/// One step of a [`Plan`]
#[derive(Debug)]
pub enum Step {
    /// A bare command packet
    Command(CommandPacket),
    /// Write-file command followed by the file's contents
    WriteFile {
        packet: CommandPacket,
        path: PathBuf,
        source: File,
        size: u64,
    },
    /// Upload command followed by the descriptor's payload
    Upload {
        packet: CommandPacket,
        descriptor: LayoutDescriptor,
    },
}

impl Step {
    /// The command packet that opens this step
    pub fn packet(&self) -> &CommandPacket {
        match self {
            Step::Command(packet) => packet,
            Step::WriteFile { packet, .. } => packet,
            Step::Upload { packet, .. } => packet,
        }
    }
}

/// A fully validated, fully encoded operation
///
/// Owns the loaded upload file and the open write-file source; both are
/// released when the plan is dropped.
#[derive(Debug)]
pub struct Plan {
    steps: Vec<Step>,
}

impl Plan {
    /// Load, detect, validate and encode everything `op` asks for
    ///
    /// Nothing touches the device here. Any error leaves the device
    /// untouched.
    pub fn prepare(op: &Operation) -> Result<Self> {
        if op.is_empty() {
            return Err(Error::NothingToDo);
        }

        let mut steps = Vec::new();

        if let Some(mode) = op.reset {
            steps.push(Step::Command(encode_reset(mode)));
        }

        if let Some(eeprom) = &op.eeprom {
            log::info!(
                "Enabling EEPROM file '{}' (type {})",
                eeprom.name,
                eeprom.eeprom.code()
            );
            steps.push(Step::Command(encode_enable_eeprom(
                eeprom.eeprom,
                &eeprom.name,
            )?));
        }

        if let Some(write) = &op.write_file {
            let io_err = |source| Error::Io {
                path: write.source.clone(),
                source,
            };
            let source = File::open(&write.source).map_err(io_err)?;
            let size = source.metadata().map_err(io_err)?.len();
            let packet = encode_write_file(&write.dest_name, size)?;
            steps.push(Step::WriteFile {
                packet,
                path: write.source.clone(),
                source,
                size,
            });
        }

        match (&op.upload, op.execute) {
            (Some(upload), execute) => {
                let mut descriptor = LayoutDescriptor::load(&upload.path)?;
                log::info!(
                    "{}: {} (load 0x{:06X}, entry 0x{:06X}, 0x{:X} of 0x{:X} bytes from offset 0x{:X})",
                    upload.path.display(),
                    descriptor.format,
                    descriptor.base_addr,
                    descriptor.exec_addr,
                    descriptor.payload_size,
                    descriptor.file_length(),
                    descriptor.payload_offset
                );
                if !upload.overrides.is_empty() {
                    descriptor.apply_overrides(&upload.overrides);
                    log::debug!("Layout after overrides: {:x?}", upload.overrides);
                }

                descriptor.payload()?;
                RAM_WINDOW.check_span("Load", descriptor.base_addr, descriptor.payload_size)?;

                let exec_addr = match execute {
                    Some(ExecuteMode::Jump(addr)) => {
                        let exec = addr.unwrap_or(descriptor.exec_addr);
                        RAM_WINDOW.check("Entry", exec)?;
                        Some(exec)
                    }
                    Some(ExecuteMode::ViaReboot) | None => None,
                };

                let packet = encode_upload_execute(&UploadExecute::Upload {
                    base_addr: descriptor.base_addr,
                    size: descriptor.payload_size,
                    exec_addr,
                })?;
                steps.push(Step::Upload { packet, descriptor });

                if execute == Some(ExecuteMode::ViaReboot) {
                    steps.push(Step::Command(encode_reset(ResetMode::RebootKeepRom)));
                }
            }
            (None, Some(ExecuteMode::Jump(addr))) => {
                let exec_addr = addr.ok_or(Error::MissingExecAddress)?;
                RAM_WINDOW.check("Entry", exec_addr)?;
                steps.push(Step::Command(encode_upload_execute(
                    &UploadExecute::ExecuteOnly { exec_addr },
                )?));
            }
            (None, Some(ExecuteMode::ViaReboot)) => {
                steps.push(Step::Command(encode_reset(ResetMode::RebootKeepRom)));
            }
            (None, None) => {}
        }

        Ok(Self { steps })
    }

    /// Steps in the order they will be sent
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub(crate) fn into_steps(self) -> Vec<Step> {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{EepromRequest, Overrides, UploadRequest, WriteFileRequest};
    use crate::protocol::{CommandKind, EepromType};
    use std::path::Path;

    fn temp_file(tag: &str, data: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("jaggd-plan-{}-{}", std::process::id(), tag));
        std::fs::write(&path, data).unwrap();
        path
    }

    fn kinds(plan: &Plan) -> Vec<CommandKind> {
        plan.steps().iter().map(|s| s.packet().kind()).collect()
    }

    #[test]
    fn test_empty_operation() {
        assert!(matches!(
            Plan::prepare(&Operation::default()),
            Err(Error::NothingToDo)
        ));
    }

    #[test]
    fn test_step_order() {
        let upload = temp_file("order.rom", &[0x4E; 0x40]);
        let card = temp_file("order.bin", &[1, 2, 3]);
        let op = Operation {
            reset: Some(ResetMode::DebugStub),
            eeprom: Some(EepromRequest {
                name: "save.e2p".into(),
                eeprom: EepromType::Small,
            }),
            write_file: Some(WriteFileRequest {
                source: card.clone(),
                dest_name: "order.bin".into(),
            }),
            upload: Some(UploadRequest {
                path: upload.clone(),
                overrides: Overrides::default(),
            }),
            execute: Some(ExecuteMode::ViaReboot),
        };
        let plan = Plan::prepare(&op).unwrap();
        std::fs::remove_file(upload).ok();
        std::fs::remove_file(card).ok();

        assert_eq!(
            kinds(&plan),
            vec![
                CommandKind::Reset,
                CommandKind::EnableEeprom,
                CommandKind::WriteFile,
                CommandKind::UploadExecute,
                CommandKind::Reset,
            ]
        );
        assert_eq!(plan.steps()[4].packet().as_bytes(), &[0x02, 0x06]);
        match &plan.steps()[2] {
            Step::WriteFile { size, .. } => assert_eq!(*size, 3),
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_upload_uses_descriptor_entry() {
        let path = temp_file("entry.rom", &[0x4E; 0x40]);
        let op = Operation {
            upload: Some(UploadRequest {
                path: path.clone(),
                overrides: Overrides::default(),
            }),
            execute: Some(ExecuteMode::Jump(None)),
            ..Default::default()
        };
        let plan = Plan::prepare(&op).unwrap();
        std::fs::remove_file(path).ok();

        let bytes = plan.steps()[0].packet().as_bytes();
        assert_eq!(&bytes[0x08..0x0C], &[0x00, 0x80, 0x20, 0x00]);
        assert_eq!(&bytes[0x10..0x14], &[0x00, 0x80, 0x20, 0x00]);
    }

    #[test]
    fn test_base_below_window_rejected() {
        let path = temp_file("low.bin", &[0u8; 0x40]);
        let op = Operation {
            upload: Some(UploadRequest {
                path: path.clone(),
                overrides: Overrides {
                    base: Some(0x1000),
                    ..Default::default()
                },
            }),
            ..Default::default()
        };
        let err = Plan::prepare(&op).unwrap_err();
        std::fs::remove_file(path).ok();
        assert!(matches!(err, Error::AddressOutOfRange { addr: 0x1000, .. }));
    }

    #[test]
    fn test_entry_outside_window_rejected() {
        let path = temp_file("entry-high.bin", &[0u8; 0x40]);
        let op = Operation {
            upload: Some(UploadRequest {
                path: path.clone(),
                overrides: Overrides::default(),
            }),
            execute: Some(ExecuteMode::Jump(Some(0xE0_0000))),
            ..Default::default()
        };
        let err = Plan::prepare(&op).unwrap_err();
        std::fs::remove_file(path).ok();
        assert!(matches!(err, Error::AddressOutOfRange { .. }));
    }

    #[test]
    fn test_override_past_end_of_file() {
        let path = temp_file("short.bin", &[0u8; 0x40]);
        let op = Operation {
            upload: Some(UploadRequest {
                path: path.clone(),
                overrides: Overrides {
                    offset: Some(0x20),
                    size: Some(0x40),
                    ..Default::default()
                },
            }),
            ..Default::default()
        };
        let err = Plan::prepare(&op).unwrap_err();
        std::fs::remove_file(path).ok();
        assert!(matches!(err, Error::PayloadOutOfBounds { .. }));
    }

    #[test]
    fn test_execute_only() {
        let op = Operation {
            execute: Some(ExecuteMode::Jump(Some(0x80_2000))),
            ..Default::default()
        };
        let plan = Plan::prepare(&op).unwrap();
        assert_eq!(plan.steps().len(), 1);
        assert_eq!(&plan.steps()[0].packet().as_bytes()[0x06..0x08], &[0x06, 0x05]);

        let op = Operation {
            execute: Some(ExecuteMode::Jump(None)),
            ..Default::default()
        };
        assert!(matches!(
            Plan::prepare(&op),
            Err(Error::MissingExecAddress)
        ));
    }

    #[test]
    fn test_missing_upload_file() {
        let op = Operation {
            upload: Some(UploadRequest {
                path: Path::new("/nonexistent/jaggd.rom").to_path_buf(),
                overrides: Overrides::default(),
            }),
            ..Default::default()
        };
        assert!(matches!(Plan::prepare(&op), Err(Error::Io { .. })));
    }

    #[test]
    fn test_long_eeprom_name_rejected() {
        let op = Operation {
            reset: Some(ResetMode::Menu),
            eeprom: Some(EepromRequest {
                name: "x".repeat(60),
                eeprom: EepromType::Large,
            }),
            ..Default::default()
        };
        assert!(matches!(
            Plan::prepare(&op),
            Err(Error::FieldOverflow { .. })
        ));
    }
}
