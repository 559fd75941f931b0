#![allow(dead_code)]

use std::convert::Infallible;
use std::string::String;
use std::vec::Vec;

use embedded_storage::{ReadStorage, Storage};
use rig_core::clock::{Micros, Millis};
use rig_core::config::RigConfig;
use rig_core::event_log::LogStore;
use rig_core::io::{RigIo, SerialOut, TextDisplay};
use rig_core::rig::{Rig, RigPorts, TickReport};
use rig_core::servo::{ServoBank, ServoId};

pub const SCROLL_NEUTRAL: u16 = 512;
pub const SCROLL_UP: u16 = 0;
pub const SCROLL_DOWN: u16 = 1_023;

#[derive(Debug, Clone)]
pub struct BenchIo {
    pub action: bool,
    pub scroll: u16,
    pub ipa: bool,
    pub n2o: bool,
    pub main: u16,
    pub ig: u16,
    pub spark: u16,
}

impl Default for BenchIo {
    fn default() -> Self {
        Self {
            action: false,
            scroll: SCROLL_NEUTRAL,
            ipa: false,
            n2o: false,
            main: 102,
            ig: 102,
            spark: 0,
        }
    }
}

impl RigIo for BenchIo {
    fn action_button(&mut self) -> bool {
        self.action
    }
    fn scroll_counts(&mut self) -> u16 {
        self.scroll
    }
    fn ig_ipa_valve(&mut self) -> bool {
        self.ipa
    }
    fn ig_n2o_valve(&mut self) -> bool {
        self.n2o
    }
    fn main_pressure_counts(&mut self) -> u16 {
        self.main
    }
    fn ig_pressure_counts(&mut self) -> u16 {
        self.ig
    }
    fn spark_counts(&mut self) -> u16 {
        self.spark
    }
}

pub struct Lcd {
    rows: [[u8; 20]; 4],
}

impl Lcd {
    pub fn new() -> Self {
        Self {
            rows: [[b' '; 20]; 4],
        }
    }

    pub fn row(&self, row: usize) -> String {
        String::from_utf8_lossy(&self.rows[row]).into_owned()
    }
}

impl TextDisplay for Lcd {
    fn clear(&mut self) {
        self.rows = [[b' '; 20]; 4];
    }

    fn print_at(&mut self, row: u8, col: u8, text: &str) {
        let Some(cells) = self.rows.get_mut(usize::from(row)) else {
            return;
        };
        for (slot, byte) in cells.iter_mut().skip(usize::from(col)).zip(text.bytes()) {
            *slot = byte;
        }
    }
}

#[derive(Default)]
pub struct SerialCapture {
    pub lines: Vec<String>,
}

impl SerialOut for SerialCapture {
    fn write_line(&mut self, line: &str) {
        self.lines.push(line.to_owned());
    }
}

/// Byte-addressed EEPROM double, erased to 0xFF.
#[derive(Clone)]
pub struct Eeprom {
    pub bytes: Vec<u8>,
    pub fail_writes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EepromError {
    OutOfBounds,
    WriteFault,
}

impl Eeprom {
    pub fn blank(size: usize) -> Self {
        Self {
            bytes: vec![0xFF; size],
            fail_writes: false,
        }
    }
}

impl ReadStorage for Eeprom {
    type Error = EepromError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        let source = self
            .bytes
            .get(start..start + bytes.len())
            .ok_or(EepromError::OutOfBounds)?;
        bytes.copy_from_slice(source);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.bytes.len()
    }
}

impl Storage for Eeprom {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(EepromError::WriteFault);
        }
        let start = offset as usize;
        self.bytes
            .get_mut(start..start + bytes.len())
            .ok_or(EepromError::OutOfBounds)?
            .copy_from_slice(bytes);
        Ok(())
    }
}

/// Infallible RAM store for the pure log tests.
pub struct Ram(pub Vec<u8>);

impl ReadStorage for Ram {
    type Error = Infallible;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        bytes.copy_from_slice(&self.0[start..start + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.0.len()
    }
}

impl Storage for Ram {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        self.0[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

/// A rig on a virtual bench with a 1 ms tick.
pub struct Bench {
    pub rig: Rig,
    pub io: BenchIo,
    pub servos: ServoBank,
    pub lcd: Lcd,
    pub serial: SerialCapture,
    pub eeprom: Eeprom,
    pub now: u32,
    pub entered: Vec<rig_core::screens::Screen>,
    servo_widths: [Option<u32>; 2],
}

impl Bench {
    pub fn with_eeprom(eeprom: Eeprom) -> Self {
        Self::with_config(RigConfig::DEFAULT, eeprom)
    }

    pub fn with_config(config: RigConfig, eeprom: Eeprom) -> Self {
        let mut bench = Self {
            rig: Rig::with_config(config, LogStore::new(0)),
            io: BenchIo::default(),
            servos: config.servo_bank(),
            lcd: Lcd::new(),
            serial: SerialCapture::default(),
            eeprom,
            now: 0,
            entered: Vec::new(),
            servo_widths: [None, None],
        };
        bench.rig.boot(&mut bench.eeprom);
        bench
    }

    pub fn new() -> Self {
        Self::with_eeprom(Eeprom::blank(1_024))
    }

    /// Drives a servo with a pulse every 20 ms; `None` stops it.
    pub fn set_servo(&mut self, id: ServoId, width_us: Option<u32>) {
        self.servo_widths[id as usize] = width_us;
    }

    pub fn tick(&mut self) -> TickReport {
        self.now += 1;
        let now_us = self.now * 1_000;
        if self.now % 20 == 0 {
            for id in ServoId::ALL {
                if let Some(width) = self.servo_widths[id as usize] {
                    let channel = self.servos.channel(id);
                    channel.on_edge(true, Micros::new(now_us - width));
                    channel.on_edge(false, Micros::new(now_us));
                }
            }
        }

        let report = self.rig.tick(
            Millis::new(self.now),
            Micros::new(now_us),
            RigPorts {
                io: &mut self.io,
                servos: &self.servos,
                display: &mut self.lcd,
                serial: &mut self.serial,
                storage: &mut self.eeprom,
            },
        );
        if let Some(screen) = report.entered {
            self.entered.push(screen);
        }
        report
    }

    pub fn run(&mut self, ms: u32) {
        for _ in 0..ms {
            self.tick();
        }
    }

    /// A clean press and release of the action button.
    pub fn press(&mut self) {
        self.io.action = true;
        self.run(20);
        self.io.action = false;
        self.run(20);
    }

    pub fn scroll(&mut self, counts: u16) {
        self.io.scroll = counts;
        self.run(20);
        self.io.scroll = SCROLL_NEUTRAL;
        self.run(20);
    }

    pub fn screen(&self) -> Option<rig_core::screens::Screen> {
        self.rig.active_screen()
    }
}
