//! Operator screens run by the state scheduler.
//!
//! Each screen is a plain function of the tick context and its own slice of
//! [`ScreenMemory`]. It returns the screen to switch to, if any; the
//! scheduler applies that on the next tick.

mod diagnostics;
mod full_run;
mod log_dump;
mod log_review;
mod menu;

pub use full_run::{FullRunPhase, FullRunState};
pub use log_dump::LogDumpState;
pub use log_review::LogReviewState;
pub use menu::{MENU_ITEMS, MenuState};

use embedded_storage::Storage;

use crate::clock::{Micros, Millis};
use crate::event_log::{EventLog, LogStore};
use crate::inputs::InputTracker;
use crate::io::{DISPLAY_COLS, SerialOut, TextDisplay};
use crate::led::StatusLed;
use crate::servo::ServoBank;
use crate::text::FieldLine;

/// Every screen the rig can show.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Screen {
    Menu,
    FullRun,
    LogReview,
    LogToSerial,
    SparkTest,
    IgValveTest,
    MainValveTest,
    IgPressureTest,
}

impl Screen {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Screen::Menu => "Menu",
            Screen::FullRun => "Full Run",
            Screen::LogReview => "Log Review",
            Screen::LogToSerial => "Log to Serial",
            Screen::SparkTest => "Spark Test",
            Screen::IgValveTest => "Ig Valve Test",
            Screen::MainValveTest => "Main Valve Test",
            Screen::IgPressureTest => "Ig Pressure Test",
        }
    }

    /// Runs one tick of this screen.
    pub fn run<const CAP: usize, D, W, S>(
        self,
        first_entry: bool,
        ctx: &mut ScreenContext<'_, CAP, D, W, S>,
        memory: &mut ScreenMemory,
    ) -> Option<Screen>
    where
        D: TextDisplay,
        W: SerialOut,
        S: Storage,
    {
        match self {
            Screen::Menu => menu::run(ctx, &mut memory.menu, first_entry),
            Screen::FullRun => full_run::run(ctx, &mut memory.full_run, first_entry),
            Screen::LogReview => log_review::run(ctx, &mut memory.log_review, first_entry),
            Screen::LogToSerial => log_dump::run(ctx, &mut memory.log_dump, first_entry),
            Screen::SparkTest => diagnostics::spark(ctx, &mut memory.refresh, first_entry),
            Screen::IgValveTest => diagnostics::ig_valves(ctx, &mut memory.refresh, first_entry),
            Screen::MainValveTest => {
                diagnostics::main_valves(ctx, &mut memory.refresh, first_entry)
            }
            Screen::IgPressureTest => {
                diagnostics::ig_pressure(ctx, &mut memory.refresh, first_entry)
            }
        }
    }
}

/// Screen-local state, kept for the life of the controller.
#[derive(Clone, Debug, Default)]
pub struct ScreenMemory {
    pub menu: MenuState,
    pub full_run: FullRunState,
    pub log_review: LogReviewState,
    pub log_dump: LogDumpState,
    /// Next redraw deadline shared by the periodic diagnostic screens.
    pub refresh: Millis,
}

/// Everything a screen may touch during one tick.
pub struct ScreenContext<'a, const CAP: usize, D, W, S> {
    pub now: Millis,
    pub now_us: Micros,
    pub inputs: &'a mut InputTracker,
    pub servos: &'a ServoBank,
    pub log: &'a mut EventLog<CAP>,
    pub store: &'a LogStore,
    pub led: &'a mut StatusLed,
    pub display: &'a mut D,
    pub serial: &'a mut W,
    pub storage: &'a mut S,
}

const ROW_WIDTH: usize = DISPLAY_COLS as usize;

/// A blank display row to fill with fields.
pub(crate) type Row = FieldLine<ROW_WIDTH>;

pub(crate) fn blank_row() -> Row {
    Row::blank(ROW_WIDTH)
}

pub(crate) fn print_row<D: TextDisplay>(display: &mut D, row: u8, line: Row) {
    display.print_at(row, 0, line.into_string().as_str());
}

/// Consumes an action press and asks for the menu.
pub(crate) fn exit_on_action(inputs: &mut InputTracker) -> Option<Screen> {
    inputs.take_action().then_some(Screen::Menu)
}
