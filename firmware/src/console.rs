//! Operator-facing text output: the 20x4 screen and the log dump port.

use embassy_stm32::mode::Blocking;
use embassy_stm32::usart::UartTx;
use heapless::String;
use rig_core::io::{DISPLAY_COLS, DISPLAY_ROWS, SerialOut, TextDisplay};

const ROWS: usize = DISPLAY_ROWS as usize;
const COLS: usize = DISPLAY_COLS as usize;

/// Character buffer for the screen; rows that change are mirrored to the
/// defmt log on [`ScreenBuffer::flush`].
pub struct ScreenBuffer {
    cells: [[u8; COLS]; ROWS],
    dirty: [bool; ROWS],
}

impl ScreenBuffer {
    pub const fn new() -> Self {
        Self {
            cells: [[b' '; COLS]; ROWS],
            dirty: [false; ROWS],
        }
    }

    pub fn flush(&mut self) {
        for (row, dirty) in self.dirty.iter_mut().enumerate() {
            if core::mem::take(dirty) {
                let text = core::str::from_utf8(&self.cells[row]).unwrap_or("?");
                defmt::debug!("lcd[{}]: {=str}", row, text);
            }
        }
    }
}

impl TextDisplay for ScreenBuffer {
    fn clear(&mut self) {
        self.cells = [[b' '; COLS]; ROWS];
        self.dirty = [true; ROWS];
    }

    fn print_at(&mut self, row: u8, col: u8, text: &str) {
        let row = usize::from(row);
        let Some(cells) = self.cells.get_mut(row) else {
            return;
        };
        for (cell, byte) in cells.iter_mut().skip(usize::from(col)).zip(text.bytes()) {
            *cell = if byte.is_ascii() { byte } else { b'?' };
        }
        self.dirty[row] = true;
    }
}

/// Blocking UART transmitter for the log dump.
pub struct SerialPort<'d> {
    tx: UartTx<'d, Blocking>,
}

impl<'d> SerialPort<'d> {
    pub const fn new(tx: UartTx<'d, Blocking>) -> Self {
        Self { tx }
    }
}

impl SerialOut for SerialPort<'_> {
    fn write_line(&mut self, line: &str) {
        let mut framed: String<40> = String::new();
        if framed.push_str(line).is_err() || framed.push_str("\r\n").is_err() {
            defmt::warn!("serial: line too long ({} bytes)", line.len());
            return;
        }
        if self.tx.blocking_write(framed.as_bytes()).is_err() {
            defmt::warn!("serial: UART write error");
        }
    }
}
