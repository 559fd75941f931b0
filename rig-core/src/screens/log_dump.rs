//! Streams the log to the serial port, one entry per tick.

use embedded_storage::Storage;

use super::{Screen, ScreenContext, exit_on_action};
use crate::io::{SerialOut, TextDisplay};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LogDumpState {
    next: usize,
}

pub(super) fn run<const CAP: usize, D, W, S>(
    ctx: &mut ScreenContext<'_, CAP, D, W, S>,
    state: &mut LogDumpState,
    first_entry: bool,
) -> Option<Screen>
where
    D: TextDisplay,
    W: SerialOut,
    S: Storage,
{
    if first_entry {
        state.next = 0;
        ctx.display.clear();
        ctx.display.print_at(0, 0, "Log to Serial");
        ctx.serial.write_line(&ctx.log.render_sequence());
    }

    if let Some(next) = exit_on_action(ctx.inputs) {
        return Some(next);
    }

    let line = ctx.log.render_long(state.next);
    if line.is_empty() {
        return Some(Screen::Menu);
    }
    ctx.serial.write_line(&line);
    state.next += 1;
    None
}
