//! Input event tracker.
//!
//! [`InputTracker::sample`] runs once per control tick. It turns raw levels
//! and ADC counts from [`RigIo`] into debounced press events, valve levels,
//! and hysteresis-filtered analog values.
//!
//! Every latched event stays set until its consumer clears it. A consumer
//! that forgets to clear an event silently absorbs every later occurrence of
//! it; screens rely on this at-most-one-pending behaviour.

pub mod analog;
pub mod debounce;

pub use analog::{Edge, HysteresisFilter, LevelInput};
pub use debounce::{DebouncedInput, EdgeDebouncer, ScrollDirection, ScrollPosition, TriStateSwitch};

use crate::clock::Millis;
use crate::config::InputConfig;
use crate::io::RigIo;

/// Level changes observed during one [`InputTracker::sample`] call.
///
/// The controller turns these into log entries; screens use the latched
/// events on the tracker instead.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputTransitions {
    pub ig_ipa_valve: Edge,
    pub ig_n2o_valve: Edge,
    pub spark: Edge,
    /// Filtered igniter pressure moved; carries the new value.
    pub ig_pressure: Option<u16>,
    /// Filtered main pressure moved; carries the new value.
    pub main_pressure: Option<u16>,
}

/// Debounced view of every rig input, owned by the control loop.
#[derive(Clone, Debug)]
pub struct InputTracker {
    config: InputConfig,
    action: DebouncedInput,
    scroll: TriStateSwitch,
    ig_ipa_valve: LevelInput,
    ig_n2o_valve: LevelInput,
    main_pressure: HysteresisFilter,
    ig_pressure: HysteresisFilter,
    spark: HysteresisFilter,
    spark_present: bool,
}

impl InputTracker {
    #[must_use]
    pub const fn new(config: InputConfig) -> Self {
        Self {
            config,
            action: DebouncedInput::new(),
            scroll: TriStateSwitch::new(),
            ig_ipa_valve: LevelInput::new(),
            ig_n2o_valve: LevelInput::new(),
            main_pressure: HysteresisFilter::new(),
            ig_pressure: HysteresisFilter::new(),
            spark: HysteresisFilter::new(),
            spark_present: false,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &InputConfig {
        &self.config
    }

    /// Reads every input once and updates the debounced state.
    pub fn sample<I: RigIo>(&mut self, io: &mut I, now: Millis) -> InputTransitions {
        let debounce = self.config.debounce_ms;
        let hysteresis = self.config.hysteresis_counts;

        self.action.sample(io.action_button(), now, debounce);
        let position = self.scroll_position(io.scroll_counts());
        self.scroll.sample(position, now, debounce);

        let ig_ipa_valve = self.ig_ipa_valve.sample(io.ig_ipa_valve());
        let ig_n2o_valve = self.ig_n2o_valve.sample(io.ig_n2o_valve());

        let main_pressure = self
            .main_pressure
            .update(io.main_pressure_counts(), hysteresis)
            .then(|| self.main_pressure.value());
        let ig_pressure = self
            .ig_pressure
            .update(io.ig_pressure_counts(), hysteresis)
            .then(|| self.ig_pressure.value());

        self.spark.update(io.spark_counts(), hysteresis);
        let counts = self.spark.value();
        let present = counts > self.config.spark_low && counts < self.config.spark_high;
        let spark = Edge::between(self.spark_present, present);
        self.spark_present = present;

        InputTransitions {
            ig_ipa_valve,
            ig_n2o_valve,
            spark,
            ig_pressure,
            main_pressure,
        }
    }

    fn scroll_position(&self, counts: u16) -> ScrollPosition {
        if counts < self.config.scroll_up_below {
            ScrollPosition::Up
        } else if counts > self.config.scroll_down_above {
            ScrollPosition::Down
        } else {
            ScrollPosition::Neutral
        }
    }

    /// Returns `true` while a confirmed action press is unconsumed.
    #[must_use]
    pub const fn action_pending(&self) -> bool {
        self.action.is_pending()
    }

    /// Consumes the pending action press.
    pub fn take_action(&mut self) -> bool {
        self.action.take()
    }

    #[must_use]
    pub const fn scroll_pending(&self) -> Option<ScrollDirection> {
        self.scroll.pending()
    }

    pub fn take_scroll(&mut self) -> Option<ScrollDirection> {
        self.scroll.take()
    }

    pub fn take_scroll_up(&mut self) -> bool {
        self.scroll.take_if(ScrollDirection::Up)
    }

    pub fn take_scroll_down(&mut self) -> bool {
        self.scroll.take_if(ScrollDirection::Down)
    }

    #[must_use]
    pub const fn ig_ipa_valve_open(&self) -> bool {
        self.ig_ipa_valve.level()
    }

    #[must_use]
    pub const fn ig_n2o_valve_open(&self) -> bool {
        self.ig_n2o_valve.level()
    }

    pub fn take_ig_ipa_opened(&mut self) -> bool {
        self.ig_ipa_valve.take_opened()
    }

    pub fn take_ig_n2o_opened(&mut self) -> bool {
        self.ig_n2o_valve.take_opened()
    }

    #[must_use]
    pub const fn main_pressure(&self) -> u16 {
        self.main_pressure.value()
    }

    #[must_use]
    pub const fn ig_pressure(&self) -> u16 {
        self.ig_pressure.value()
    }

    #[must_use]
    pub const fn spark_present(&self) -> bool {
        self.spark_present
    }

    /// Filtered spark sense ADC value.
    #[must_use]
    pub const fn spark_counts(&self) -> u16 {
        self.spark.value()
    }
}

impl Default for InputTracker {
    fn default() -> Self {
        Self::new(InputConfig::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scroll divider midpoint: neither direction.
    const SCROLL_NEUTRAL: u16 = 512;

    struct FakeIo {
        action: bool,
        scroll: u16,
        ipa: bool,
        n2o: bool,
        main: u16,
        ig: u16,
        spark: u16,
    }

    impl FakeIo {
        fn idle() -> Self {
            Self {
                action: false,
                scroll: SCROLL_NEUTRAL,
                ipa: false,
                n2o: false,
                main: 0,
                ig: 0,
                spark: 0,
            }
        }
    }

    impl RigIo for FakeIo {
        fn action_button(&mut self) -> bool {
            self.action
        }
        fn scroll_counts(&mut self) -> u16 {
            self.scroll
        }
        fn ig_ipa_valve(&mut self) -> bool {
            self.ipa
        }
        fn ig_n2o_valve(&mut self) -> bool {
            self.n2o
        }
        fn main_pressure_counts(&mut self) -> u16 {
            self.main
        }
        fn ig_pressure_counts(&mut self) -> u16 {
            self.ig
        }
        fn spark_counts(&mut self) -> u16 {
            self.spark
        }
    }

    fn run(tracker: &mut InputTracker, io: &mut FakeIo, from: u32, to: u32) {
        for t in from..to {
            tracker.sample(io, Millis::new(t));
        }
    }

    #[test]
    fn scroll_thresholds_map_to_directions() {
        let mut tracker = InputTracker::default();
        let mut io = FakeIo::idle();

        io.scroll = 9;
        run(&mut tracker, &mut io, 0, 20);
        assert!(tracker.take_scroll_up());

        io.scroll = 10;
        run(&mut tracker, &mut io, 20, 40);
        assert_eq!(tracker.scroll_pending(), None);

        io.scroll = 1_001;
        run(&mut tracker, &mut io, 40, 60);
        assert!(tracker.take_scroll_down());

        io.scroll = 1_000;
        run(&mut tracker, &mut io, 60, 80);
        assert_eq!(tracker.take_scroll(), None);
    }

    #[test]
    fn valves_report_edges_without_debounce() {
        let mut tracker = InputTracker::default();
        let mut io = FakeIo::idle();

        io.ipa = true;
        let report = tracker.sample(&mut io, Millis::new(0));
        assert_eq!(report.ig_ipa_valve, Edge::Rising);
        assert_eq!(report.ig_n2o_valve, Edge::None);
        assert!(tracker.ig_ipa_valve_open());
        assert!(tracker.take_ig_ipa_opened());

        io.ipa = false;
        let report = tracker.sample(&mut io, Millis::new(1));
        assert_eq!(report.ig_ipa_valve, Edge::Falling);
        assert!(!tracker.take_ig_ipa_opened());
    }

    #[test]
    fn spark_sense_window_is_exclusive() {
        let mut tracker = InputTracker::default();
        let mut io = FakeIo::idle();

        io.spark = 100;
        let report = tracker.sample(&mut io, Millis::new(0));
        assert_eq!(report.spark, Edge::None);
        assert!(!tracker.spark_present());

        io.spark = 450;
        let report = tracker.sample(&mut io, Millis::new(1));
        assert_eq!(report.spark, Edge::Rising);
        assert_eq!(tracker.spark_counts(), 450);

        io.spark = 900;
        let report = tracker.sample(&mut io, Millis::new(2));
        assert_eq!(report.spark, Edge::Falling);
    }

    #[test]
    fn pressure_changes_are_reported_through_hysteresis() {
        let mut tracker = InputTracker::default();
        let mut io = FakeIo::idle();

        io.ig = 300;
        io.main = 2;
        let report = tracker.sample(&mut io, Millis::new(0));
        assert_eq!(report.ig_pressure, Some(300));
        assert_eq!(report.main_pressure, None);

        io.ig = 302;
        let report = tracker.sample(&mut io, Millis::new(1));
        assert_eq!(report.ig_pressure, None);
        assert_eq!(tracker.ig_pressure(), 300);
    }
}
