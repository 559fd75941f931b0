//! Tunable parameters for the rig.
//!
//! Defaults match the bench hardware: 10-bit ADC inputs, hobby-servo PWM on
//! the main valve actuators, and a 1 kHz control loop. Each group can be
//! overridden at construction time through [`RigConfig`].

use crate::servo::ServoBank;

/// Number of entries the event log holds in memory and on storage.
///
/// Must stay below 255 so `capacity + 1` fits the persisted check byte.
pub const LOG_CAPACITY: usize = 100;

/// Slots held back from NORMAL-tier events for CRITICAL ones.
pub const NORMAL_TIER_RESERVE: usize = 10;

/// Slots held back from DETAIL-tier events for NORMAL and CRITICAL ones.
pub const DETAIL_TIER_RESERVE: usize = 20;

/// Log timestamps are rebased every time they would pass this many ms.
pub const ROLLOVER_WINDOW_MS: u32 = 10_000;

/// Display bias applied per rollover marker when rendering timestamps.
pub const ROLLOVER_DISPLAY_BIAS: u32 = 10_000;

/// Debounce and filtering parameters for the operator controls and sensors.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputConfig {
    /// How long a momentary input must stay asserted before it counts.
    pub debounce_ms: u32,
    /// Minimum ADC delta that replaces a stored analog reading.
    pub hysteresis_counts: u16,
    /// Scroll switch reads "up" below this many counts.
    pub scroll_up_below: u16,
    /// Scroll switch reads "down" above this many counts.
    pub scroll_down_above: u16,
    /// Spark is present while the sense input lies strictly between these.
    pub spark_low: u16,
    pub spark_high: u16,
}

impl InputConfig {
    pub const DEFAULT: Self = Self {
        debounce_ms: 10,
        hysteresis_counts: 3,
        scroll_up_below: 10,
        scroll_down_above: 1_000,
        spark_low: 100,
        spark_high: 900,
    };
}

impl Default for InputConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// PWM decode limits for the main valve servos.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoConfig {
    /// Pulse width mapped to 0 degrees.
    pub min_us: u32,
    /// Pulse width mapped to 180 degrees.
    pub max_us: u32,
    /// Slack outside `[min_us, max_us]` that is clamped instead of rejected.
    pub tolerance_us: u32,
    /// Width changes smaller than this are treated as jitter.
    pub min_change_us: u32,
    /// A channel with no accepted pulse for this long reads as disconnected.
    pub stale_after_us: u32,
}

impl ServoConfig {
    pub const DEFAULT: Self = Self {
        min_us: 544,
        max_us: 2_400,
        tolerance_us: 10,
        min_change_us: 8,
        stale_after_us: 50_000,
    };
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Status LED timing.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedConfig {
    pub one_shot_ms: u32,
    /// Full on+off period while blinking.
    pub blink_period_ms: u32,
}

impl LedConfig {
    pub const DEFAULT: Self = Self {
        one_shot_ms: 100,
        blink_period_ms: 500,
    };
}

impl Default for LedConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Aggregate configuration handed to [`crate::rig::Rig`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RigConfig {
    pub inputs: InputConfig,
    pub servo: ServoConfig,
    pub led: LedConfig,
}

impl RigConfig {
    pub const DEFAULT: Self = Self {
        inputs: InputConfig::DEFAULT,
        servo: ServoConfig::DEFAULT,
        led: LedConfig::DEFAULT,
    };

    /// Servo channels decoding with `self.servo`. The rig built from the
    /// same config must be ticked with this bank.
    #[must_use]
    pub const fn servo_bank(&self) -> ServoBank {
        ServoBank::new(self.servo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::servo::ServoId;

    #[test]
    fn servo_bank_follows_config() {
        let servo = ServoConfig {
            min_us: 1_000,
            max_us: 2_000,
            ..ServoConfig::DEFAULT
        };
        let config = RigConfig {
            servo,
            ..RigConfig::DEFAULT
        };
        let bank = config.servo_bank();
        for id in ServoId::ALL {
            assert_eq!(bank.channel(id).config(), &servo);
        }
    }
}
