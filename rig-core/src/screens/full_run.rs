//! Supervised run: the only screen that records to the event log.

use embedded_storage::Storage;

use super::{Screen, ScreenContext, blank_row, print_row};
use crate::clock::Millis;
use crate::event_log::LogOp;
use crate::io::{SerialOut, TextDisplay};
use crate::led::LedMode;
use crate::pressure::{ig_pressure_good, log_param, pressure_psi};

const REFRESH_MS: u32 = 100;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FullRunPhase {
    #[default]
    Running,
    /// The log could not be saved; waiting for the operator to acknowledge.
    SaveFailed,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FullRunState {
    phase: FullRunPhase,
    started: Millis,
    next_refresh: Millis,
    ig_good: bool,
    ig_good_seen: bool,
}

impl FullRunState {
    #[must_use]
    pub const fn phase(&self) -> FullRunPhase {
        self.phase
    }
}

pub(super) fn run<const CAP: usize, D, W, S>(
    ctx: &mut ScreenContext<'_, CAP, D, W, S>,
    state: &mut FullRunState,
    first_entry: bool,
) -> Option<Screen>
where
    D: TextDisplay,
    W: SerialOut,
    S: Storage,
{
    if first_entry {
        *state = FullRunState {
            started: ctx.now,
            next_refresh: ctx.now,
            ..FullRunState::default()
        };
        ctx.log.reset();
        ctx.log.enable();
        ctx.led.set_mode(LedMode::Blinking);

        ctx.display.clear();
        ctx.display.print_at(0, 0, "Full Run");
        ctx.display.print_at(3, 0, "Press to stop");
    }

    if state.phase == FullRunPhase::SaveFailed {
        return ctx.inputs.take_action().then_some(Screen::Menu);
    }

    if ctx.inputs.take_action() {
        return finish(ctx, state);
    }

    track_ig_pressure(ctx, state);

    if ctx.now.has_reached(state.next_refresh) {
        state.next_refresh = ctx.now.wrapping_add(REFRESH_MS);
        draw_status(ctx, state);
    }
    None
}

fn track_ig_pressure<const CAP: usize, D, W, S>(
    ctx: &mut ScreenContext<'_, CAP, D, W, S>,
    state: &mut FullRunState,
) {
    let counts = ctx.inputs.ig_pressure();
    let good = ig_pressure_good(counts);
    if good && !state.ig_good {
        let op = if state.ig_good_seen {
            LogOp::IgPressureGood
        } else {
            LogOp::IgPressureGood1
        };
        ctx.log.record(op, log_param(counts), ctx.now);
        state.ig_good_seen = true;
    }
    state.ig_good = good;
}

fn finish<const CAP: usize, D, W, S>(
    ctx: &mut ScreenContext<'_, CAP, D, W, S>,
    state: &mut FullRunState,
) -> Option<Screen>
where
    D: TextDisplay,
    S: Storage,
{
    ctx.log.disable();
    ctx.led.set_mode(LedMode::OneShot);

    if ctx.log.commit(ctx.store, ctx.storage).is_ok() {
        return Some(Screen::Menu);
    }

    state.phase = FullRunPhase::SaveFailed;
    ctx.display.clear();
    ctx.display.print_at(0, 0, "Log save failed");
    ctx.display.print_at(3, 0, "Press to continue");
    None
}

fn draw_status<const CAP: usize, D, W, S>(
    ctx: &mut ScreenContext<'_, CAP, D, W, S>,
    state: &FullRunState,
) where
    D: TextDisplay,
{
    let elapsed_ms = ctx.now.elapsed_since(state.started);

    let mut line = blank_row();
    line.put_str(0, "Time:");
    line.put_uint(6, 5, elapsed_ms / 1_000);
    line.put_char(11, b'.');
    line.put_uint(12, 1, elapsed_ms / 100 % 10);
    line.put_str(14, "Log");
    line.put_uint(17, 3, u32::try_from(ctx.log.len()).unwrap_or(u32::MAX));
    print_row(ctx.display, 1, line);

    let mut line = blank_row();
    line.put_str(0, "IG PSI:");
    line.put_uint(8, 3, u32::from(pressure_psi(ctx.inputs.ig_pressure())));
    line.put_str(12, "MN:");
    line.put_uint(16, 3, u32::from(pressure_psi(ctx.inputs.main_pressure())));
    print_row(ctx.display, 2, line);
}
