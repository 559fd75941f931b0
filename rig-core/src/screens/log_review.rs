//! Scrollable view of the in-memory log.
//!
//! Line 0 of the virtual page is the sequence number; line `n` is entry
//! `n - 1`. The display shows four consecutive lines starting at `top`.

use embedded_storage::Storage;

use super::{Screen, ScreenContext, exit_on_action};
use crate::event_log::EventLog;
use crate::io::{DISPLAY_ROWS, SerialOut, TextDisplay};

const BLANK: &str = "                    ";

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LogReviewState {
    top: usize,
}

impl LogReviewState {
    #[must_use]
    pub const fn top(&self) -> usize {
        self.top
    }
}

pub(super) fn run<const CAP: usize, D, W, S>(
    ctx: &mut ScreenContext<'_, CAP, D, W, S>,
    state: &mut LogReviewState,
    first_entry: bool,
) -> Option<Screen>
where
    D: TextDisplay,
    W: SerialOut,
    S: Storage,
{
    if first_entry {
        state.top = 0;
    }

    if let Some(next) = exit_on_action(ctx.inputs) {
        return Some(next);
    }

    let mut redraw = first_entry;
    if ctx.inputs.take_scroll_up() && state.top > 0 {
        state.top -= 1;
        redraw = true;
    }
    // Only scroll while the row that would come into view has an entry.
    if ctx.inputs.take_scroll_down() && !ctx.log.render_short(state.top + 3).is_empty() {
        state.top += 1;
        redraw = true;
    }

    if redraw {
        draw(ctx.display, ctx.log, state.top);
    }
    None
}

fn draw<const CAP: usize, D: TextDisplay>(display: &mut D, log: &EventLog<CAP>, top: usize) {
    for (row, line) in (0..DISPLAY_ROWS).zip(top..) {
        display.print_at(row, 0, BLANK);
        if line == 0 {
            display.print_at(row, 0, &log.render_sequence());
        } else {
            display.print_at(row, 0, &log.render_short(line - 1));
        }
    }
}
