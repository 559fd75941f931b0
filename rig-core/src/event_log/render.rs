//! Fixed-width text forms of log entries.
//!
//! ```text
//! short (20):  TTTTT NNNNNNNNNN PPP
//! long  (30):  TTTTT NNNNNNNNNNNNNNNNNNNN PPP
//! sequence:    Log #: SSSSS
//! ```
//!
//! `TTTTT` is the entry time plus a bias for each preceding rollover marker:
//! a leading ten-thousands digit (`*` past nine, blank for none) followed by
//! four zero-padded digits, so the five columns read as elapsed
//! milliseconds. A zero parameter is left blank.

use heapless::String;

use super::EventLog;
use crate::config::ROLLOVER_DISPLAY_BIAS;
use crate::text::FieldLine;

pub const SHORT_LINE_WIDTH: usize = 20;
pub const LONG_LINE_WIDTH: usize = 30;
pub const SEQUENCE_LINE_WIDTH: usize = 12;

pub type ShortLine = String<SHORT_LINE_WIDTH>;
pub type LongLine = String<LONG_LINE_WIDTH>;
pub type SequenceLine = String<SEQUENCE_LINE_WIDTH>;

const NAME_COL: usize = 6;
const SHORT_PARAM_COL: usize = 17;
const LONG_PARAM_COL: usize = 27;
/// Range of the four low time digits.
const TIME_DIGITS_SPAN: u32 = 10_000;

impl<const CAP: usize> EventLog<CAP> {
    /// Entry `index` as a 20-column line, or an empty string past the end.
    #[must_use]
    pub fn render_short(&self, index: usize) -> ShortLine {
        self.render_line::<SHORT_LINE_WIDTH>(index, SHORT_PARAM_COL, false)
    }

    /// Entry `index` as a 30-column line, or an empty string past the end.
    #[must_use]
    pub fn render_long(&self, index: usize) -> LongLine {
        self.render_line::<LONG_LINE_WIDTH>(index, LONG_PARAM_COL, true)
    }

    #[must_use]
    pub fn render_sequence(&self) -> SequenceLine {
        let mut line = FieldLine::<SEQUENCE_LINE_WIDTH>::blank(SEQUENCE_LINE_WIDTH);
        line.put_str(0, "Log #:");
        line.put_uint(7, 5, u32::from(self.sequence()));
        line.into_string()
    }

    fn render_line<const N: usize>(&self, index: usize, param_col: usize, long: bool) -> String<N> {
        let Some(entry) = self.entry(index) else {
            return String::new();
        };

        let mut line = FieldLine::<N>::blank(N);
        let rollovers = u32::try_from(self.rollovers_before(index)).unwrap_or(u32::MAX);
        let elapsed = rollovers
            .saturating_mul(ROLLOVER_DISPLAY_BIAS)
            .saturating_add(u32::from(entry.timestamp));
        match elapsed / TIME_DIGITS_SPAN {
            0 => line.put_uint(1, 4, elapsed),
            lead @ 1..=9 => {
                line.put_uint(0, 1, lead);
                line.put_uint_padded(1, 4, elapsed % TIME_DIGITS_SPAN);
            }
            _ => {
                line.put_char(0, b'*');
                line.put_uint_padded(1, 4, elapsed % TIME_DIGITS_SPAN);
            }
        }

        let name = match entry.op() {
            Some(op) if long => op.long_name(),
            Some(op) => op.short_name(),
            None => "?",
        };
        line.put_str(NAME_COL, name);

        if entry.param != 0 {
            line.put_uint(param_col, 3, u32::from(entry.param));
        }
        line.into_string()
    }
}
