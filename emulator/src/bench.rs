//! Virtual hardware for the emulator: inputs, screen, serial and EEPROM.

use std::fs;
use std::io;
use std::path::PathBuf;

use embedded_storage::{ReadStorage, Storage};
use rig_core::io::{DISPLAY_COLS, DISPLAY_ROWS, RigIo, SerialOut, TextDisplay};

/// Size of the EEPROM the log image lives in.
pub const EEPROM_SIZE: usize = 1_024;

/// Scroll divider reading with the switch centred.
pub const SCROLL_NEUTRAL: u16 = 512;
pub const SCROLL_UP: u16 = 0;
pub const SCROLL_DOWN: u16 = 1_023;

/// Sensor reading at zero pressure.
const PRESSURE_IDLE: u16 = 102;

/// Raw input levels, set by commands and sampled by the rig each tick.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VirtualIo {
    pub action: bool,
    pub scroll: u16,
    pub ig_ipa_valve: bool,
    pub ig_n2o_valve: bool,
    pub main_pressure: u16,
    pub ig_pressure: u16,
    pub spark: u16,
}

impl Default for VirtualIo {
    fn default() -> Self {
        Self {
            action: false,
            scroll: SCROLL_NEUTRAL,
            ig_ipa_valve: false,
            ig_n2o_valve: false,
            main_pressure: PRESSURE_IDLE,
            ig_pressure: PRESSURE_IDLE,
            spark: 0,
        }
    }
}

impl RigIo for VirtualIo {
    fn action_button(&mut self) -> bool {
        self.action
    }

    fn scroll_counts(&mut self) -> u16 {
        self.scroll
    }

    fn ig_ipa_valve(&mut self) -> bool {
        self.ig_ipa_valve
    }

    fn ig_n2o_valve(&mut self) -> bool {
        self.ig_n2o_valve
    }

    fn main_pressure_counts(&mut self) -> u16 {
        self.main_pressure
    }

    fn ig_pressure_counts(&mut self) -> u16 {
        self.ig_pressure
    }

    fn spark_counts(&mut self) -> u16 {
        self.spark
    }
}

const ROWS: usize = DISPLAY_ROWS as usize;
const COLS: usize = DISPLAY_COLS as usize;

/// 20x4 character screen.
#[derive(Clone, Debug)]
pub struct HostDisplay {
    cells: [[char; COLS]; ROWS],
}

impl Default for HostDisplay {
    fn default() -> Self {
        Self {
            cells: [[' '; COLS]; ROWS],
        }
    }
}

impl HostDisplay {
    pub fn row(&self, row: usize) -> String {
        self.cells.get(row).map_or_else(String::new, |cells| cells.iter().collect())
    }

    /// The screen framed for the console.
    pub fn framed(&self) -> Vec<String> {
        let border = format!("+{}+", "-".repeat(COLS));
        let mut lines = vec![border.clone()];
        lines.extend((0..ROWS).map(|row| format!("|{}|", self.row(row))));
        lines.push(border);
        lines
    }
}

impl TextDisplay for HostDisplay {
    fn clear(&mut self) {
        self.cells = [[' '; COLS]; ROWS];
    }

    fn print_at(&mut self, row: u8, col: u8, text: &str) {
        let Some(cells) = self.cells.get_mut(usize::from(row)) else {
            return;
        };
        for (cell, ch) in cells.iter_mut().skip(usize::from(col)).zip(text.chars()) {
            *cell = ch;
        }
    }
}

/// Serial port capture; drained by the `serial` command.
#[derive(Clone, Debug, Default)]
pub struct CapturedSerial {
    lines: Vec<String>,
}

impl CapturedSerial {
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }

    pub fn pending(&self) -> usize {
        self.lines.len()
    }
}

impl SerialOut for CapturedSerial {
    fn write_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EepromError {
    OutOfBounds,
    Io(io::ErrorKind),
}

/// EEPROM image, optionally mirrored to a file on every write.
#[derive(Debug)]
pub struct HostEeprom {
    bytes: Vec<u8>,
    backing: Option<PathBuf>,
}

impl HostEeprom {
    /// An erased in-memory EEPROM.
    pub fn blank() -> Self {
        Self {
            bytes: vec![0xFF; EEPROM_SIZE],
            backing: None,
        }
    }

    /// Opens `path`, starting erased when it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let mut bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err),
        };
        bytes.resize(EEPROM_SIZE, 0xFF);
        Ok(Self {
            bytes,
            backing: Some(path),
        })
    }

    fn span(&self, offset: u32, len: usize) -> Result<std::ops::Range<usize>, EepromError> {
        let start = usize::try_from(offset).map_err(|_| EepromError::OutOfBounds)?;
        let end = start.checked_add(len).ok_or(EepromError::OutOfBounds)?;
        if end > self.bytes.len() {
            return Err(EepromError::OutOfBounds);
        }
        Ok(start..end)
    }
}

impl ReadStorage for HostEeprom {
    type Error = EepromError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let span = self.span(offset, bytes.len())?;
        bytes.copy_from_slice(&self.bytes[span]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.bytes.len()
    }
}

impl Storage for HostEeprom {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let span = self.span(offset, bytes.len())?;
        self.bytes[span].copy_from_slice(bytes);
        if let Some(path) = &self.backing {
            fs::write(path, &self.bytes).map_err(|err| EepromError::Io(err.kind()))?;
        }
        Ok(())
    }
}
