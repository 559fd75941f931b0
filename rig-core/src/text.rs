//! Fixed-width text fields for display and serial rendering.
//!
//! Lines are assembled column by column into a blank line of known width, the
//! way a character LCD is addressed. Only ASCII reaches the output; anything
//! else is replaced with `?`.

use heapless::String;

/// A line of exactly `width` characters (at most `N`) built from fields.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldLine<const N: usize> {
    bytes: [u8; N],
    width: usize,
}

impl<const N: usize> FieldLine<N> {
    /// A line of `width` spaces; `width` is clamped to `N`.
    #[must_use]
    pub const fn blank(width: usize) -> Self {
        Self {
            bytes: [b' '; N],
            width: if width > N { N } else { width },
        }
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Copies `text` starting at `col`, truncating at the line width.
    pub fn put_str(&mut self, col: usize, text: &str) {
        for (slot, ch) in (col..self.width).zip(text.chars()) {
            self.bytes[slot] = match u8::try_from(ch) {
                Ok(byte) if byte.is_ascii_graphic() || byte == b' ' => byte,
                _ => b'?',
            };
        }
    }

    /// Writes a single character at `col`.
    pub fn put_char(&mut self, col: usize, ch: u8) {
        if col < self.width {
            self.bytes[col] = if ch.is_ascii() { ch } else { b'?' };
        }
    }

    /// Right-aligns `value` in `width` columns starting at `col`, without
    /// leading zeros. Only the low `width` digits are kept.
    pub fn put_uint(&mut self, col: usize, width: usize, value: u32) {
        self.put_digits(col, width, value, false);
    }

    /// Like [`Self::put_uint`] but fills the whole field with zero padding.
    pub fn put_uint_padded(&mut self, col: usize, width: usize, value: u32) {
        self.put_digits(col, width, value, true);
    }

    fn put_digits(&mut self, col: usize, width: usize, mut value: u32, pad: bool) {
        for offset in (0..width).rev() {
            let slot = col + offset;
            let digit = b'0' + u8::try_from(value % 10).unwrap_or(0);
            if slot < self.width {
                self.bytes[slot] = digit;
            }
            value /= 10;
            if value == 0 && !pad {
                break;
            }
        }
    }

    /// Produces the rendered line.
    #[must_use]
    pub fn into_string(self) -> String<N> {
        core::str::from_utf8(&self.bytes[..self.width])
            .ok()
            .and_then(|text| String::try_from(text).ok())
            .unwrap_or_default()
    }
}
