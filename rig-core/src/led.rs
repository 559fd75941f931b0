//! Status LED sequencing.

use crate::clock::Millis;
use crate::config::LedConfig;

/// Requested LED behaviour.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedMode {
    #[default]
    Off,
    On,
    /// Light once for the configured duration, then turn off.
    OneShot,
    /// Toggle at half the configured period.
    Blinking,
    /// Internal: the tail of a one-shot, waiting for its deadline.
    Continue,
}

/// Drives the status LED from a mode and the loop clock.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StatusLed {
    config: LedConfig,
    mode: LedMode,
    lit: bool,
    deadline: Millis,
}

impl Default for StatusLed {
    fn default() -> Self {
        Self::new(LedConfig::DEFAULT)
    }
}

impl StatusLed {
    #[must_use]
    pub const fn new(config: LedConfig) -> Self {
        Self {
            config,
            mode: LedMode::Off,
            lit: false,
            deadline: Millis::ZERO,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> LedMode {
        self.mode
    }

    /// Selects a new mode; it takes effect on the next [`Self::update`].
    pub fn set_mode(&mut self, mode: LedMode) {
        self.mode = mode;
    }

    /// Advances the sequence and returns the pin level.
    pub fn update(&mut self, now: Millis) -> bool {
        match self.mode {
            LedMode::Off => self.lit = false,
            LedMode::On => self.lit = true,
            LedMode::OneShot => {
                self.lit = true;
                self.deadline = now.wrapping_add(self.config.one_shot_ms);
                self.mode = LedMode::Continue;
            }
            LedMode::Continue => {
                if now.has_reached(self.deadline) {
                    self.lit = false;
                    self.mode = LedMode::Off;
                }
            }
            LedMode::Blinking => {
                if now.has_reached(self.deadline) {
                    self.lit = !self.lit;
                    self.deadline = now.wrapping_add(self.config.blink_period_ms / 2);
                }
            }
        }
        self.lit
    }
}
