//! Step sequencing against a [`Transport`]

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use super::{percent, Plan, Step, TransferConfig, TransferPhase, TransferProgress, Transport};
use crate::error::{Error, Result};
use crate::protocol::{CommandKind, CommandPacket};

/// Byte counter for one bulk payload
struct Counter {
    sent: u64,
    total: u64,
}

/// Runs a [`Plan`] step by step
///
/// Any transport failure ends the operation: the GameDrive protocol has no
/// way to resume a transfer.
pub struct Orchestrator<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
    config: TransferConfig,
}

impl<'a, T: Transport + ?Sized> Orchestrator<'a, T> {
    /// Create an orchestrator driving `transport`
    pub fn new(transport: &'a mut T, config: TransferConfig) -> Self {
        Self { transport, config }
    }

    /// Send every step of `plan` in order
    ///
    /// The plan, including the loaded file, is dropped on return whether
    /// or not the operation succeeded.
    pub fn run(&mut self, plan: Plan, progress: &mut dyn TransferProgress) -> Result<()> {
        let mut steps = plan.into_steps().into_iter().peekable();

        while let Some(step) = steps.next() {
            match step {
                Step::Command(packet) => {
                    self.send_command(&packet)?;
                    if packet.kind() == CommandKind::Reset && steps.peek().is_some() {
                        log::debug!(
                            "Waiting {:?} for the GameDrive to settle",
                            self.config.settle_delay
                        );
                        std::thread::sleep(self.config.settle_delay);
                    }
                }
                Step::WriteFile {
                    packet,
                    path,
                    mut source,
                    size,
                } => {
                    self.send_command(&packet)?;
                    self.stream_file(&path, &mut source, size, progress)?;
                }
                Step::Upload { packet, descriptor } => {
                    self.send_command(&packet)?;
                    let payload = descriptor.payload()?;
                    let timeout = self.config.upload_timeout;
                    let mut counter = Counter {
                        sent: 0,
                        total: payload.len() as u64,
                    };
                    progress.started(TransferPhase::Upload, counter.total);
                    self.send_bulk(payload, timeout, &mut counter, progress)?;
                    progress.finished(TransferPhase::Upload);
                    log::info!(
                        "Uploaded {} bytes to 0x{:06X}",
                        counter.sent,
                        descriptor.base_addr
                    );
                }
            }
        }

        Ok(())
    }

    fn send_command(&mut self, packet: &CommandPacket) -> Result<()> {
        let bytes = packet.as_bytes();
        log::debug!("Sending {} command: {:02X?}", packet.kind(), bytes);

        let sent = self
            .transport
            .control_transfer(bytes, self.config.control_timeout)?;
        if sent != bytes.len() {
            return Err(Error::Transport(format!(
                "{} command: sent {} of {} bytes",
                packet.kind(),
                sent,
                bytes.len()
            )));
        }
        Ok(())
    }

    /// Push `data` through the bulk endpoint in chunks, picking up after
    /// short transfers until everything is through
    fn send_bulk(
        &mut self,
        data: &[u8],
        timeout: Duration,
        counter: &mut Counter,
        progress: &mut dyn TransferProgress,
    ) -> Result<()> {
        let chunk_size = self.config.chunk_size();
        let mut offset = 0;

        while offset < data.len() {
            let len = (data.len() - offset).min(chunk_size);
            let sent = self
                .transport
                .bulk_transfer(&data[offset..offset + len], timeout)?
                .min(len);

            if sent == 0 {
                return Err(Error::Transport(format!(
                    "bulk transfer stalled after {} of {} bytes",
                    counter.sent, counter.total
                )));
            }
            if sent < len {
                log::trace!("Short bulk transfer: {} of {} bytes", sent, len);
            }

            offset += sent;
            counter.sent += sent as u64;
            progress.progress(counter.sent, percent(counter.sent, counter.total));
        }

        Ok(())
    }

    fn stream_file(
        &mut self,
        path: &Path,
        source: &mut impl Read,
        size: u64,
        progress: &mut dyn TransferProgress,
    ) -> Result<()> {
        let io_err = |source| Error::Io {
            path: path.to_path_buf(),
            source,
        };
        let timeout = self.config.write_file_timeout;
        let mut buf = vec![0u8; self.config.chunk_size()];
        let mut counter = Counter {
            sent: 0,
            total: size,
        };

        progress.started(TransferPhase::WriteFile, size);
        while counter.sent < size {
            let want = (size - counter.sent).min(buf.len() as u64) as usize;
            let got = source.read(&mut buf[..want]).map_err(io_err)?;
            if got == 0 {
                return Err(io_err(std::io::ErrorKind::UnexpectedEof.into()));
            }
            log::trace!("Read {} bytes from {}", got, path.display());
            self.send_bulk(&buf[..got], timeout, &mut counter, progress)?;
        }
        progress.finished(TransferPhase::WriteFile);

        log::info!("Wrote {} bytes from {}", counter.sent, path.display());
        Ok(())
    }
}
