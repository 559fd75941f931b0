//! Top-level menu: pick a screen with the scroll switch, enter it with the
//! action button.

use embedded_storage::Storage;

use super::{Screen, ScreenContext, blank_row, print_row};
use crate::io::{DISPLAY_ROWS, SerialOut, TextDisplay};
use crate::led::LedMode;

/// Menu entries in display order.
pub const MENU_ITEMS: [(&str, Screen); 7] = [
    ("Full Run", Screen::FullRun),
    ("Log Review", Screen::LogReview),
    ("Log to Serial", Screen::LogToSerial),
    ("Spark Test", Screen::SparkTest),
    ("IG Valve Test", Screen::IgValveTest),
    ("Main Valve Test", Screen::MainValveTest),
    ("Ig Pressure Sensor", Screen::IgPressureTest),
];

const VISIBLE_ROWS: usize = DISPLAY_ROWS as usize;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct MenuState {
    selection: usize,
}

impl MenuState {
    #[must_use]
    pub const fn selection(&self) -> usize {
        self.selection
    }

    /// First item shown: one above the selection where possible, without
    /// leaving blank rows at the bottom.
    #[must_use]
    pub const fn first_visible(&self) -> usize {
        let top = self.selection.saturating_sub(1);
        let last_top = MENU_ITEMS.len().saturating_sub(VISIBLE_ROWS);
        if top > last_top { last_top } else { top }
    }
}

pub(super) fn run<const CAP: usize, D, W, S>(
    ctx: &mut ScreenContext<'_, CAP, D, W, S>,
    state: &mut MenuState,
    first_entry: bool,
) -> Option<Screen>
where
    D: TextDisplay,
    W: SerialOut,
    S: Storage,
{
    if ctx.inputs.take_action() {
        ctx.led.set_mode(LedMode::OneShot);
        return MENU_ITEMS.get(state.selection).map(|&(_, screen)| screen);
    }

    let mut redraw = first_entry;
    if ctx.inputs.take_scroll_up() && state.selection > 0 {
        state.selection -= 1;
        redraw = true;
    }
    if ctx.inputs.take_scroll_down() && state.selection + 1 < MENU_ITEMS.len() {
        state.selection += 1;
        redraw = true;
    }

    if redraw {
        draw(ctx.display, state);
    }
    None
}

fn draw<D: TextDisplay>(display: &mut D, state: &MenuState) {
    display.clear();
    let top = state.first_visible();
    let visible = MENU_ITEMS.iter().enumerate().skip(top).take(VISIBLE_ROWS);
    for (row, (index, (label, _))) in (0u8..).zip(visible) {
        let mut line = blank_row();
        if index == state.selection {
            line.put_char(0, b'*');
        }
        line.put_str(2, label);
        print_row(display, row, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_follows_selection() {
        let windows: [usize; 7] = core::array::from_fn(|selection| {
            MenuState { selection }.first_visible()
        });
        assert_eq!(windows, [0, 0, 1, 2, 3, 3, 3]);
    }

    #[test]
    fn labels_fit_beside_the_marker() {
        for (label, _) in MENU_ITEMS {
            assert!(label.len() <= 18, "{label}");
        }
    }
}
