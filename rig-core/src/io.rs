//! Hardware seams consumed by the controller.
//!
//! Firmware implements these against the MCU peripherals; the emulator
//! implements them against virtual state. Nothing in `rig-core` talks to a
//! pin directly.

/// Text rows on the operator display.
pub const DISPLAY_ROWS: u8 = 4;
/// Characters per display row.
pub const DISPLAY_COLS: u8 = 20;

/// Raw input levels sampled once per control tick.
pub trait RigIo {
    /// `true` while the action button is held down.
    fn action_button(&mut self) -> bool;

    /// Raw 10-bit reading of the centre-off scroll switch divider.
    fn scroll_counts(&mut self) -> u16;

    /// `true` while the igniter IPA solenoid is energised.
    fn ig_ipa_valve(&mut self) -> bool;

    /// `true` while the igniter N2O solenoid is energised.
    fn ig_n2o_valve(&mut self) -> bool;

    /// Raw 10-bit main chamber pressure reading.
    fn main_pressure_counts(&mut self) -> u16;

    /// Raw 10-bit igniter chamber pressure reading.
    fn ig_pressure_counts(&mut self) -> u16;

    /// Raw 10-bit spark sense reading.
    fn spark_counts(&mut self) -> u16;
}

/// Character display addressed by row and column.
pub trait TextDisplay {
    /// Blanks every row.
    fn clear(&mut self);

    /// Writes `text` starting at `(row, col)`; text past the row end is dropped.
    fn print_at(&mut self, row: u8, col: u8, text: &str);
}

/// Line-oriented diagnostic output used by the log dump screen.
pub trait SerialOut {
    fn write_line(&mut self, line: &str);
}

/// Serial sink that discards everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopSerial;

impl SerialOut for NoopSerial {
    fn write_line(&mut self, _: &str) {}
}
