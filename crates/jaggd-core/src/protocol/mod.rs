//! GameDrive command packets
//!
//! The GameDrive firmware takes its commands as the data stage of a vendor
//! control transfer. Every packet starts with its own length followed by a
//! command byte; the remaining fields sit at fixed offsets that were worked
//! out from USB captures of the vendor tool, so they are reproduced here byte
//! for byte, magic numbers included.
//!
//! | Command        | Length | Header        |
//! |----------------|--------|---------------|
//! | Reset          | 0x02   | `02 <mode>`   |
//! | Upload/execute | 0x14   | `14 02`       |
//! | Write file     | 0x36   | `36 05`       |
//! | Enable EEPROM  | 0x39   | `39 02`       |

mod commands;
mod fields;

pub use commands::*;
