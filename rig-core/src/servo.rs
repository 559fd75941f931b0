//! Servo pulse-width decoder for the main valve actuators.
//!
//! Each channel is written from its pin-change interrupt and read from the
//! control loop. The interrupt side calls [`ServoChannel::on_edge`]; the loop
//! side only ever sees a [`ServoSnapshot`] copied out inside a critical
//! section, so the width and its timestamp always come from the same pulse.

use core::cell::Cell;

use critical_section::Mutex;

use crate::clock::Micros;
use crate::config::ServoConfig;

/// The two servo inputs on the rig.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoId {
    Ipa,
    N2o,
}

impl ServoId {
    pub const ALL: [ServoId; 2] = [ServoId::Ipa, ServoId::N2o];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ServoId::Ipa => "IPA",
            ServoId::N2o => "N2O",
        }
    }
}

/// Decoded servo position.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoReading {
    /// No pulse yet, or none within the staleness window.
    NotConnected,
    /// Last pulse was outside the accepted width band.
    OutOfRange,
    /// Position in degrees, `0..=180`.
    Angle(u8),
}

impl ServoReading {
    /// Sentinel form used by the display and log: -1, -2, or the angle.
    #[must_use]
    pub fn as_sentinel(self) -> i16 {
        match self {
            ServoReading::NotConnected => -1,
            ServoReading::OutOfRange => -2,
            ServoReading::Angle(degrees) => i16::from(degrees),
        }
    }

    #[must_use]
    pub const fn angle(self) -> Option<u8> {
        match self {
            ServoReading::Angle(degrees) => Some(degrees),
            _ => None,
        }
    }
}

/// Consistent copy of the interrupt-owned channel fields.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoSnapshot {
    /// Last published high time in microseconds.
    pub pulse_width_us: u32,
    /// Falling edge of the most recent accepted pulse.
    pub last_valid_at: Option<Micros>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct ChannelState {
    pulse_width_us: u32,
    last_valid_at: Option<Micros>,
    changed: bool,
    raised_at: Option<Micros>,
}

impl ChannelState {
    const IDLE: Self = Self {
        pulse_width_us: 0,
        last_valid_at: None,
        changed: false,
        raised_at: None,
    };

    fn on_edge(&mut self, high: bool, now: Micros, min_change_us: u32) {
        if high {
            self.raised_at = Some(now);
            return;
        }

        // Falling edge without a recorded rise: we came up mid-pulse.
        let Some(raised_at) = self.raised_at.take() else {
            return;
        };

        let width = now.elapsed_since(raised_at);
        if width == 0 {
            return;
        }

        let first_pulse = self.last_valid_at.is_none();
        self.last_valid_at = Some(now);

        if first_pulse || width.abs_diff(self.pulse_width_us) >= min_change_us {
            self.pulse_width_us = width;
            self.changed = true;
        }
    }
}

/// One interrupt-fed servo input.
pub struct ServoChannel {
    config: ServoConfig,
    state: Mutex<Cell<ChannelState>>,
}

impl ServoChannel {
    #[must_use]
    pub const fn new(config: ServoConfig) -> Self {
        Self {
            config,
            state: Mutex::new(Cell::new(ChannelState::IDLE)),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ServoConfig {
        &self.config
    }

    /// Interrupt entry point: `high` is the pin level after the change.
    pub fn on_edge(&self, high: bool, now: Micros) {
        let min_change_us = self.config.min_change_us;
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            state.on_edge(high, now, min_change_us);
            cell.set(state);
        });
    }

    /// Copies the published width and timestamp atomically.
    #[must_use]
    pub fn snapshot(&self) -> ServoSnapshot {
        critical_section::with(|cs| {
            let state = self.state.borrow(cs).get();
            ServoSnapshot {
                pulse_width_us: state.pulse_width_us,
                last_valid_at: state.last_valid_at,
            }
        })
    }

    /// Consumes the "width changed" flag set by the interrupt handler.
    pub fn take_changed(&self) -> bool {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            let changed = core::mem::take(&mut state.changed);
            cell.set(state);
            changed
        })
    }

    /// Snapshot plus decode, evaluated against `now`.
    #[must_use]
    pub fn read(&self, now: Micros) -> ServoReading {
        decode(self.snapshot(), now, &self.config)
    }
}

/// Both servo channels, allocated once for the life of the program.
pub struct ServoBank {
    ipa: ServoChannel,
    n2o: ServoChannel,
}

impl ServoBank {
    #[must_use]
    pub const fn new(config: ServoConfig) -> Self {
        Self {
            ipa: ServoChannel::new(config),
            n2o: ServoChannel::new(config),
        }
    }

    #[must_use]
    pub const fn channel(&self, id: ServoId) -> &ServoChannel {
        match id {
            ServoId::Ipa => &self.ipa,
            ServoId::N2o => &self.n2o,
        }
    }
}

/// Applies the staleness and range policy to a snapshot.
#[must_use]
pub fn decode(snapshot: ServoSnapshot, now: Micros, config: &ServoConfig) -> ServoReading {
    let Some(last_valid_at) = snapshot.last_valid_at else {
        return ServoReading::NotConnected;
    };
    // An edge stamped after `now` was sampled is as fresh as it gets.
    if !last_valid_at.is_after(now)
        && now.elapsed_since(last_valid_at) > config.stale_after_us
    {
        return ServoReading::NotConnected;
    }
    match pulse_to_angle(snapshot.pulse_width_us, config) {
        Some(degrees) => ServoReading::Angle(degrees),
        None => ServoReading::OutOfRange,
    }
}

/// Maps a pulse width onto `0..=180` degrees.
///
/// Widths within the tolerance band just outside `[min_us, max_us]` are
/// clamped; anything further out yields `None`.
#[must_use]
pub fn pulse_to_angle(width_us: u32, config: &ServoConfig) -> Option<u8> {
    let lower = config.min_us.saturating_sub(config.tolerance_us);
    let upper = config.max_us.saturating_add(config.tolerance_us);
    if width_us < lower || width_us > upper {
        return None;
    }

    let span = config.max_us.saturating_sub(config.min_us).max(1);
    let clamped = width_us.clamp(config.min_us, config.max_us);
    let degrees = (clamped - config.min_us) * 180 / span;
    u8::try_from(degrees).ok()
}
