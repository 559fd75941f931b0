//! Bench test screens for the individual inputs.
//!
//! All of them share one redraw deadline and leave on an action press.

use embedded_storage::Storage;

use super::{Row, Screen, ScreenContext, blank_row, exit_on_action, print_row};
use crate::clock::Millis;
use crate::io::{SerialOut, TextDisplay};
use crate::pressure::pressure_psi;
use crate::servo::{self, ServoId, ServoReading};

const REFRESH_MS: u32 = 100;
const MAIN_VALVE_REFRESH_MS: u32 = 200;
const VALUE_COL: usize = 13;

/// Common entry/exit handling. Returns `Err` with the screen's answer when
/// this tick should not redraw.
fn begin<const CAP: usize, D, W, S>(
    ctx: &mut ScreenContext<'_, CAP, D, W, S>,
    refresh: &mut Millis,
    first_entry: bool,
    title: &str,
    labels: [&str; 2],
    period_ms: u32,
) -> Result<(), Option<Screen>>
where
    D: TextDisplay,
{
    if first_entry {
        *refresh = ctx.now;
        ctx.display.clear();
        ctx.display.print_at(0, 0, title);
        ctx.display.print_at(2, 0, labels[0]);
        ctx.display.print_at(3, 0, labels[1]);
    }

    if let Some(next) = exit_on_action(ctx.inputs) {
        return Err(Some(next));
    }
    if !ctx.now.has_reached(*refresh) {
        return Err(None);
    }
    *refresh = ctx.now.wrapping_add(period_ms);
    Ok(())
}

fn print_value<D, F>(display: &mut D, row: u8, label: &str, fill: F)
where
    D: TextDisplay,
    F: FnOnce(&mut Row),
{
    let mut line = blank_row();
    line.put_str(0, label);
    fill(&mut line);
    print_row(display, row, line);
}

pub(super) fn spark<const CAP: usize, D, W, S>(
    ctx: &mut ScreenContext<'_, CAP, D, W, S>,
    refresh: &mut Millis,
    first_entry: bool,
) -> Option<Screen>
where
    D: TextDisplay,
    W: SerialOut,
    S: Storage,
{
    const LABELS: [&str; 2] = ["Spark Sense:", "Spark Value:"];
    if let Err(next) = begin(ctx, refresh, first_entry, "Spark Test", LABELS, REFRESH_MS) {
        return next;
    }

    let present = ctx.inputs.spark_present();
    print_value(ctx.display, 2, LABELS[0], |line| {
        line.put_str(VALUE_COL, if present { "PRESENT" } else { "ABSENT" });
    });
    let counts = ctx.inputs.spark_counts();
    print_value(ctx.display, 3, LABELS[1], |line| {
        line.put_uint(VALUE_COL, 4, u32::from(counts));
    });
    None
}

pub(super) fn ig_valves<const CAP: usize, D, W, S>(
    ctx: &mut ScreenContext<'_, CAP, D, W, S>,
    refresh: &mut Millis,
    first_entry: bool,
) -> Option<Screen>
where
    D: TextDisplay,
    W: SerialOut,
    S: Storage,
{
    const LABELS: [&str; 2] = ["IPA Valve:", "N2O Valve:"];
    if first_entry {
        // Drop openings latched before the screen was entered.
        ctx.inputs.take_ig_ipa_opened();
        ctx.inputs.take_ig_n2o_opened();
    }
    if let Err(next) = begin(ctx, refresh, first_entry, "Ig Valve Test", LABELS, REFRESH_MS) {
        return next;
    }

    let rows = [
        (ctx.inputs.ig_ipa_valve_open(), ctx.inputs.take_ig_ipa_opened()),
        (ctx.inputs.ig_n2o_valve_open(), ctx.inputs.take_ig_n2o_opened()),
    ];
    let labels = [(2, LABELS[0]), (3, LABELS[1])];
    for ((open, opened), (row, label)) in rows.into_iter().zip(labels) {
        print_value(ctx.display, row, label, |line| {
            line.put_str(VALUE_COL, if open { "OPEN" } else { "CLOSED" });
            if opened {
                line.put_char(19, b'!');
            }
        });
    }
    None
}

pub(super) fn main_valves<const CAP: usize, D, W, S>(
    ctx: &mut ScreenContext<'_, CAP, D, W, S>,
    refresh: &mut Millis,
    first_entry: bool,
) -> Option<Screen>
where
    D: TextDisplay,
    W: SerialOut,
    S: Storage,
{
    const LABELS: [&str; 2] = ["IPA Valve:", "N2O Valve:"];
    if let Err(next) = begin(
        ctx,
        refresh,
        first_entry,
        "Main Valve Test",
        LABELS,
        MAIN_VALVE_REFRESH_MS,
    ) {
        return next;
    }

    for (id, row, label) in [(ServoId::Ipa, 2, LABELS[0]), (ServoId::N2o, 3, LABELS[1])] {
        let channel = ctx.servos.channel(id);
        let snapshot = channel.snapshot();
        let width = snapshot.pulse_width_us;
        let reading = servo::decode(snapshot, ctx.now_us, channel.config());
        print_value(ctx.display, row, label, |line| match reading {
            ServoReading::NotConnected => line.put_str(VALUE_COL - 2, "N/C"),
            ServoReading::OutOfRange => line.put_str(VALUE_COL - 2, "error"),
            ServoReading::Angle(degrees) => {
                line.put_uint(VALUE_COL - 2, 4, width);
                line.put_uint(VALUE_COL + 4, 3, u32::from(degrees));
            }
        });
    }
    None
}

pub(super) fn ig_pressure<const CAP: usize, D, W, S>(
    ctx: &mut ScreenContext<'_, CAP, D, W, S>,
    refresh: &mut Millis,
    first_entry: bool,
) -> Option<Screen>
where
    D: TextDisplay,
    W: SerialOut,
    S: Storage,
{
    const LABELS: [&str; 2] = ["Raw Value:", "Pressure:"];
    if let Err(next) = begin(ctx, refresh, first_entry, "Ig Pressure Test", LABELS, REFRESH_MS) {
        return next;
    }

    let counts = ctx.inputs.ig_pressure();
    print_value(ctx.display, 2, LABELS[0], |line| {
        line.put_uint(VALUE_COL, 4, u32::from(counts));
    });
    print_value(ctx.display, 3, LABELS[1], |line| {
        line.put_uint(VALUE_COL - 1, 4, u32::from(pressure_psi(counts)));
        line.put_str(VALUE_COL + 4, "PSI");
    });
    None
}
