//! Edge-triggered debouncing for momentary operator controls.

use crate::clock::Millis;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct PendingEdge<L> {
    level: L,
    since: Millis,
}

/// Debounces rising edges of a signal with one idle level and any number of
/// asserted levels.
///
/// A transition into a non-idle level starts a timer. The edge is confirmed
/// once the raw level has held for the debounce period; dropping back to idle
/// first discards it. Moving directly between two asserted levels counts as a
/// fresh rising edge of the new level.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EdgeDebouncer<L> {
    idle: L,
    old_level: L,
    pending: Option<PendingEdge<L>>,
}

impl<L: Copy + Eq> EdgeDebouncer<L> {
    #[must_use]
    pub const fn new(idle: L) -> Self {
        Self {
            idle,
            old_level: idle,
            pending: None,
        }
    }

    /// Feeds one raw sample; returns the level whose press was confirmed on
    /// this sample, if any.
    pub fn update(&mut self, raw: L, now: Millis, debounce_ms: u32) -> Option<L> {
        let mut confirmed = None;

        if raw != self.idle && raw != self.old_level {
            self.pending = Some(PendingEdge {
                level: raw,
                since: now,
            });
        } else if let Some(pending) = self.pending
            && pending.level == raw
            && now.elapsed_since(pending.since) >= debounce_ms
        {
            confirmed = Some(raw);
            self.pending = None;
        }

        if raw == self.idle {
            self.pending = None;
        }
        self.old_level = raw;
        confirmed
    }

    /// Returns `true` while a rising edge is waiting out its debounce period.
    #[must_use]
    pub fn is_debouncing(&self) -> bool {
        self.pending.is_some()
    }

    /// Level seen on the previous sample.
    #[must_use]
    pub fn last_level(&self) -> L {
        self.old_level
    }
}

/// Debounced momentary push button with a latched press event.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DebouncedInput {
    edge: EdgeDebouncer<bool>,
    event: bool,
}

impl DebouncedInput {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            edge: EdgeDebouncer::new(false),
            event: false,
        }
    }

    /// Feeds one raw sample (`true` == pressed).
    pub fn sample(&mut self, pressed: bool, now: Millis, debounce_ms: u32) {
        if self.edge.update(pressed, now, debounce_ms).is_some() {
            self.event = true;
        }
    }

    /// Returns `true` while a confirmed press has not been consumed.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.event
    }

    /// Consumes the pending press, if any.
    pub fn take(&mut self) -> bool {
        core::mem::take(&mut self.event)
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.edge.last_level()
    }
}

impl Default for DebouncedInput {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw position of the centre-off scroll switch.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScrollPosition {
    Neutral,
    Up,
    Down,
}

/// Confirmed scroll request.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Debounced three-position scroll switch.
///
/// Only one direction can be pending at a time; a confirmed press in either
/// direction is absorbed until the pending one is consumed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TriStateSwitch {
    edge: EdgeDebouncer<ScrollPosition>,
    event: Option<ScrollDirection>,
}

impl TriStateSwitch {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            edge: EdgeDebouncer::new(ScrollPosition::Neutral),
            event: None,
        }
    }

    pub fn sample(&mut self, position: ScrollPosition, now: Millis, debounce_ms: u32) {
        let direction = match self.edge.update(position, now, debounce_ms) {
            Some(ScrollPosition::Up) => ScrollDirection::Up,
            Some(ScrollPosition::Down) => ScrollDirection::Down,
            Some(ScrollPosition::Neutral) | None => return,
        };
        if self.event.is_none() {
            self.event = Some(direction);
        }
    }

    #[must_use]
    pub const fn pending(&self) -> Option<ScrollDirection> {
        self.event
    }

    /// Consumes whichever direction is pending.
    pub fn take(&mut self) -> Option<ScrollDirection> {
        self.event.take()
    }

    /// Consumes the pending event only if it matches `direction`.
    pub fn take_if(&mut self, direction: ScrollDirection) -> bool {
        if self.event == Some(direction) {
            self.event = None;
            true
        } else {
            false
        }
    }
}

impl Default for TriStateSwitch {
    fn default() -> Self {
        Self::new()
    }
}
