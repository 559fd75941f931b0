//! Monotonic tick types used by the control loop and the servo decoder.
//!
//! Both counters are 32 bits wide and wrap; every comparison goes through
//! wrapping subtraction so a wrap in the middle of a debounce window or a
//! pulse measurement is harmless.

/// Millisecond timestamp taken from the rig's monotonic clock.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Millis(pub u32);

impl Millis {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`, correct across a counter wrap.
    #[must_use]
    pub const fn elapsed_since(self, earlier: Self) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    #[must_use]
    pub const fn wrapping_add(self, millis: u32) -> Self {
        Self(self.0.wrapping_add(millis))
    }

    /// Returns `true` once `deadline` is at or behind this instant.
    ///
    /// Deadlines more than half the counter range in the future read as
    /// already reached; the rig never schedules that far ahead.
    #[must_use]
    pub const fn has_reached(self, deadline: Self) -> bool {
        self.0.wrapping_sub(deadline.0) < (1 << 31)
    }
}

/// Microsecond timestamp used for pulse-width measurement.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Micros(pub u32);

impl Micros {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn elapsed_since(self, earlier: Self) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// True when `self` lies after `other` on the wrapping timeline.
    #[must_use]
    pub const fn is_after(self, other: Self) -> bool {
        let lead = self.0.wrapping_sub(other.0);
        lead != 0 && lead < (1 << 31)
    }

    #[must_use]
    pub const fn wrapping_add(self, micros: u32) -> Self {
        Self(self.0.wrapping_add(micros))
    }
}
