//! Pressure transducer scaling.
//!
//! The sensors are 0.5-4.5 V ratiometric parts read through a 10-bit ADC, so
//! zero pressure sits a little above zero counts.

/// Counts at 0 PSI.
pub const SENSOR_ZERO: u16 = 102;
/// Counts at full scale.
pub const SENSOR_MAX: u16 = 922;
/// Full-scale pressure in PSI.
pub const PSI_RANGE: u16 = 500;

/// Igniter chamber reading that counts as a good light (~75 PSI).
pub const IG_PRESS_GOOD: u16 = 225;
/// Igniter chamber operating target (~150 PSI).
pub const IG_PRESSURE_TARGET: u16 = 348;
/// Main chamber ceiling (~200 PSI).
pub const MAX_MAIN_PRESSURE: u16 = 430;

/// Converts a raw reading to whole PSI, clamped to `0..=PSI_RANGE`.
#[must_use]
pub fn pressure_psi(counts: u16) -> u16 {
    let above_zero = u32::from(counts.clamp(SENSOR_ZERO, SENSOR_MAX) - SENSOR_ZERO);
    let span = u32::from(SENSOR_MAX - SENSOR_ZERO);
    let psi = above_zero * u32::from(PSI_RANGE) / span;
    u16::try_from(psi).unwrap_or(PSI_RANGE)
}

/// Log parameter for a 10-bit reading: its top eight bits.
#[must_use]
pub fn log_param(counts: u16) -> u8 {
    u8::try_from(counts >> 2).unwrap_or(u8::MAX)
}

/// `true` once the igniter is producing enough pressure to call it lit.
#[must_use]
pub const fn ig_pressure_good(counts: u16) -> bool {
    counts >= IG_PRESS_GOOD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_end_points() {
        assert_eq!(pressure_psi(SENSOR_ZERO), 0);
        assert_eq!(pressure_psi(SENSOR_MAX), PSI_RANGE);
        assert_eq!(pressure_psi(0), 0);
        assert_eq!(pressure_psi(1_023), PSI_RANGE);
    }

    #[test]
    fn thresholds_land_near_nominal_psi() {
        assert_eq!(pressure_psi(IG_PRESS_GOOD), 75);
        assert_eq!(pressure_psi(IG_PRESSURE_TARGET), 150);
        assert_eq!(pressure_psi(MAX_MAIN_PRESSURE), 200);
    }

    #[test]
    fn log_param_keeps_top_bits() {
        assert_eq!(log_param(1_023), 255);
        assert_eq!(log_param(IG_PRESS_GOOD), 56);
        assert_eq!(log_param(3), 0);
    }

    #[test]
    fn good_threshold_is_inclusive() {
        assert!(!ig_pressure_good(IG_PRESS_GOOD - 1));
        assert!(ig_pressure_good(IG_PRESS_GOOD));
    }
}
