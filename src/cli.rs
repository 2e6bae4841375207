//! CLI argument parsing

use clap::{Parser, ValueEnum};
use jaggd_core::protocol::{EepromType, ResetMode};
use jaggd_core::{
    EepromRequest, ExecuteMode, Operation, Overrides, UploadRequest, WriteFileRequest,
};
use std::path::PathBuf;

/// Parse a number: `$` or `0x` prefix for hex, decimal otherwise
pub fn parse_number(s: &str) -> Result<u32, String> {
    if let Some(hex) = s
        .strip_prefix('$')
        .or_else(|| s.strip_prefix("0x"))
        .or_else(|| s.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value '{}': {}", s, e))
    } else {
        s.parse::<u32>()
            .map_err(|e| format!("Invalid number '{}': {}", s, e))
    }
}

/// Parse `FILE[,a:ADDR][,s:SIZE][,o:OFFSET][,x:ENTRY]`
fn parse_upload_arg(s: &str) -> Result<UploadRequest, String> {
    let mut parts = s.split(',');
    let path = match parts.next() {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => return Err("Missing upload file name".into()),
    };

    let mut overrides = Overrides::default();
    for part in parts {
        let (key, value) = part
            .split_once(':')
            .ok_or_else(|| format!("Expected key:value, got '{}'", part))?;
        let value = parse_number(value)?;
        match key {
            "a" => overrides.base = Some(value),
            "s" => overrides.size = Some(value),
            "o" => overrides.offset = Some(value),
            "x" => overrides.exec = Some(value),
            _ => return Err(format!("Unknown upload option '{}' (use a, s, o or x)", key)),
        }
    }

    Ok(UploadRequest { path, overrides })
}

/// Parse `NAME[,SIZE]`
fn parse_eeprom_arg(s: &str) -> Result<EepromRequest, String> {
    let (name, eeprom) = match s.split_once(',') {
        Some((name, size)) => {
            let bytes = parse_number(size)?;
            let eeprom = EepromType::from_size(bytes).ok_or_else(|| {
                format!(
                    "Unsupported EEPROM size {} (use 128, 256, 512, 1024 or 2048)",
                    bytes
                )
            })?;
            (name, eeprom)
        }
        None => (s, EepromType::default()),
    };

    if name.is_empty() {
        return Err("Missing EEPROM file name".into());
    }

    Ok(EepromRequest {
        name: name.to_string(),
        eeprom,
    })
}

/// Parse `FILE[,DEST]`; DEST defaults to the file's base name
fn parse_write_arg(s: &str) -> Result<WriteFileRequest, String> {
    let (source, dest) = match s.split_once(',') {
        Some((source, dest)) => (PathBuf::from(source), Some(dest.to_string())),
        None => (PathBuf::from(s), None),
    };

    let dest_name = match dest {
        Some(dest) if !dest.is_empty() => dest,
        _ => source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| format!("Cannot derive a card file name from '{}'", s))?,
    };

    Ok(WriteFileRequest { source, dest_name })
}

/// Where a reboot lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RebootMode {
    /// GameDrive menu
    Menu,
    /// Debug stub, ready for uploads
    Debug,
    /// Boot the ROM currently in memory
    KeepRom,
}

impl From<RebootMode> for ResetMode {
    fn from(mode: RebootMode) -> Self {
        match mode {
            RebootMode::Menu => ResetMode::Menu,
            RebootMode::Debug => ResetMode::DebugStub,
            RebootMode::KeepRom => ResetMode::RebootKeepRom,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "jaggd")]
#[command(author, version, about = "Atari Jaguar GameDrive upload utility", long_about = None)]
#[command(group = clap::ArgGroup::new("action")
    .args(["reboot", "upload", "exec", "via_reboot", "eeprom", "write", "list"])
    .multiple(true)
    .required(true))]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Transport to use: usb[:vid=<hex>,pid=<hex>,index=<n>] or dummy
    #[arg(short, long, default_value = "usb")]
    pub programmer: String,

    /// Reboot first
    #[arg(short, long, value_enum, num_args = 0..=1, default_missing_value = "menu")]
    pub reboot: Option<RebootMode>,

    /// Upload a file: FILE[,a:ADDR][,s:SIZE][,o:OFFSET][,x:ENTRY]
    #[arg(short, long, value_name = "FILE", value_parser = parse_upload_arg)]
    pub upload: Option<UploadRequest>,

    /// Execute after the upload, or at ADDR without one
    #[arg(short = 'x', long, value_name = "ADDR", num_args = 0..=1, value_parser = parse_number)]
    pub exec: Option<Option<u32>>,

    /// Start uploaded code by rebooting with the ROM kept in memory
    #[arg(long, conflicts_with = "exec")]
    pub via_reboot: bool,

    /// Enable an EEPROM file on the memory card: NAME[,SIZE]
    #[arg(short, long, value_name = "NAME", value_parser = parse_eeprom_arg)]
    pub eeprom: Option<EepromRequest>,

    /// Write a file to the memory card: FILE[,DEST]
    #[arg(short, long, value_name = "FILE", value_parser = parse_write_arg)]
    pub write: Option<WriteFileRequest>,

    /// List connected GameDrives
    #[arg(long)]
    pub list: bool,
}

/// Everything the arguments ask the GameDrive to do
impl From<&Cli> for Operation {
    fn from(cli: &Cli) -> Self {
        let execute = if cli.via_reboot {
            Some(ExecuteMode::ViaReboot)
        } else {
            cli.exec.map(ExecuteMode::Jump)
        };

        Operation {
            reset: cli.reboot.map(ResetMode::from),
            eeprom: cli.eeprom.clone(),
            write_file: cli.write.clone(),
            upload: cli.upload.clone(),
            execute,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("jaggd").chain(args.iter().copied())).unwrap()
    }

    fn operation(args: &[&str]) -> Operation {
        Operation::from(&parse(args))
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("$4000"), Ok(0x4000));
        assert_eq!(parse_number("0x802000"), Ok(0x80_2000));
        assert_eq!(parse_number("0XFF"), Ok(0xFF));
        assert_eq!(parse_number("1024"), Ok(1024));
        assert!(parse_number("$").is_err());
        assert!(parse_number("12ab").is_err());
    }

    #[test]
    fn test_upload_arg() {
        let req = parse_upload_arg("game.bin,a:$5000,s:0x100,o:32,x:$5010").unwrap();
        assert_eq!(req.path, PathBuf::from("game.bin"));
        assert_eq!(
            req.overrides,
            Overrides {
                base: Some(0x5000),
                size: Some(0x100),
                offset: Some(32),
                exec: Some(0x5010),
            }
        );

        assert!(parse_upload_arg("game.bin").unwrap().overrides.is_empty());
        assert!(parse_upload_arg("game.bin,q:1").is_err());
        assert!(parse_upload_arg("game.bin,a").is_err());
        assert!(parse_upload_arg(",a:1").is_err());
    }

    #[test]
    fn test_eeprom_arg() {
        let req = parse_eeprom_arg("save.e2p").unwrap();
        assert_eq!(req.eeprom, EepromType::Small);
        assert_eq!(parse_eeprom_arg("save.e2p,512").unwrap().eeprom, EepromType::Medium);
        assert_eq!(parse_eeprom_arg("save.e2p,2048").unwrap().eeprom, EepromType::Large);
        assert!(parse_eeprom_arg("save.e2p,100").is_err());
        assert!(parse_eeprom_arg(",128").is_err());
    }

    #[test]
    fn test_write_arg() {
        let req = parse_write_arg("/tmp/dir/GAME.ROM").unwrap();
        assert_eq!(req.source, PathBuf::from("/tmp/dir/GAME.ROM"));
        assert_eq!(req.dest_name, "GAME.ROM");

        let req = parse_write_arg("local.bin,CARD.BIN").unwrap();
        assert_eq!(req.dest_name, "CARD.BIN");
    }

    #[test]
    fn test_upload_and_exec() {
        let cli = parse(&["-r", "debug", "-u", "game.rom", "-x"]);
        let op = Operation::from(&cli);
        assert_eq!(op.reset, Some(ResetMode::DebugStub));
        assert_eq!(op.execute, Some(ExecuteMode::Jump(None)));
        assert!(op.upload.is_some());
        assert_eq!(cli.programmer, "usb");
    }

    #[test]
    fn test_bare_reboot_is_menu() {
        let op = operation(&["-r"]);
        assert_eq!(op.reset, Some(ResetMode::Menu));
        assert_eq!(op.execute, None);
    }

    #[test]
    fn test_execute_only_address() {
        let op = operation(&["-x", "$802000"]);
        assert_eq!(op.execute, Some(ExecuteMode::Jump(Some(0x80_2000))));
        assert!(op.upload.is_none());
    }

    #[test]
    fn test_via_reboot() {
        let op = operation(&["-u", "game.rom", "--via-reboot"]);
        assert_eq!(op.execute, Some(ExecuteMode::ViaReboot));
        assert!(Cli::try_parse_from(["jaggd", "-x", "--via-reboot"]).is_err());
    }

    #[test]
    fn test_action_required() {
        assert!(Cli::try_parse_from(["jaggd"]).is_err());
        assert!(Cli::try_parse_from(["jaggd", "-v"]).is_err());
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;

        Cli::command().debug_assert();

        let mut page = Vec::new();
        clap_mangen::Man::new(Cli::command())
            .render(&mut page)
            .unwrap();
        let page = String::from_utf8(page).unwrap();
        assert!(page.contains("jaggd"));
        assert!(page.contains("GameDrive"));
    }
}
