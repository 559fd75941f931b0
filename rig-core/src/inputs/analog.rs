//! Analog input filtering and level inputs without debounce.

/// Direction of a level change observed on one sample.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    #[default]
    None,
    Rising,
    Falling,
}

impl Edge {
    #[must_use]
    pub const fn between(old: bool, new: bool) -> Self {
        match (old, new) {
            (false, true) => Edge::Rising,
            (true, false) => Edge::Falling,
            _ => Edge::None,
        }
    }
}

/// Stored ADC value that only moves when the raw reading differs from it by
/// at least the hysteresis threshold.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct HysteresisFilter {
    value: u16,
}

impl HysteresisFilter {
    #[must_use]
    pub const fn new() -> Self {
        Self { value: 0 }
    }

    /// Feeds a raw reading; returns `true` when the stored value changed.
    pub fn update(&mut self, raw: u16, threshold: u16) -> bool {
        if raw.abs_diff(self.value) >= threshold {
            self.value = raw;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub const fn value(&self) -> u16 {
        self.value
    }
}

/// Solenoid valve position read straight off its drive line.
///
/// The level is not debounced; an opening edge latches an event that the
/// consumer clears, the same way the momentary controls do.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LevelInput {
    level: bool,
    opened: bool,
}

impl LevelInput {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            level: false,
            opened: false,
        }
    }

    pub fn sample(&mut self, raw: bool) -> Edge {
        let edge = Edge::between(self.level, raw);
        if edge == Edge::Rising {
            self.opened = true;
        }
        self.level = raw;
        edge
    }

    #[must_use]
    pub const fn level(&self) -> bool {
        self.level
    }

    #[must_use]
    pub const fn opened_pending(&self) -> bool {
        self.opened
    }

    pub fn take_opened(&mut self) -> bool {
        core::mem::take(&mut self.opened)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hysteresis_ignores_small_moves() {
        let mut filter = HysteresisFilter::new();
        assert!(filter.update(100, 3));
        assert_eq!(filter.value(), 100);

        for raw in [101, 99, 102, 98] {
            assert!(!filter.update(raw, 3));
            assert_eq!(filter.value(), 100);
        }

        assert!(filter.update(103, 3));
        assert_eq!(filter.value(), 103);
        assert!(filter.update(100, 3));
        assert_eq!(filter.value(), 100);
    }

    #[test]
    fn hysteresis_only_tracks_against_stored_value() {
        // A slow drift of 1 count per sample never accumulates past the
        // threshold relative to the previous *raw* sample, but it does
        // relative to the stored one.
        let mut filter = HysteresisFilter::new();
        filter.update(500, 3);
        let mut changes = 0;
        for raw in 501..=509 {
            if filter.update(raw, 3) {
                changes += 1;
            }
        }
        assert_eq!(changes, 3);
        assert_eq!(filter.value(), 509);
    }

    #[test]
    fn valve_open_edge_latches_until_taken() {
        let mut valve = LevelInput::new();
        assert_eq!(valve.sample(true), Edge::Rising);
        assert!(valve.level());
        assert_eq!(valve.sample(false), Edge::Falling);
        assert_eq!(valve.sample(true), Edge::Rising);

        assert!(valve.opened_pending());
        assert!(valve.take_opened());
        assert!(!valve.take_opened());
        assert_eq!(valve.sample(true), Edge::None);
    }
}
