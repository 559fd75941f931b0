//! Cooperative single-state scheduler.
//!
//! Holds the active behaviour and a first-entry flag. Behaviours never call
//! back into the scheduler; they return the state they want next and the
//! scheduler applies it after the call, so a transition always takes effect
//! on the following tick.

/// Runs one behaviour per tick out of a closed set of states `S`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StateScheduler<S> {
    active: Option<S>,
    first_entry: bool,
}

impl<S> Default for StateScheduler<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateScheduler<S> {
    /// An idle scheduler; `tick` does nothing until a state is set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: None,
            first_entry: false,
        }
    }

    #[must_use]
    pub const fn first_entry_pending(&self) -> bool {
        self.first_entry
    }
}

impl<S: Copy + Eq> StateScheduler<S> {
    #[must_use]
    pub fn active(&self) -> Option<S> {
        self.active
    }

    /// Switches to `next` and arms first-entry for the next tick.
    ///
    /// Returns `false`, leaving everything untouched, when `next` is already
    /// active.
    pub fn transition_to(&mut self, next: S) -> bool {
        if self.active == Some(next) {
            return false;
        }
        self.active = Some(next);
        self.first_entry = true;
        true
    }

    /// Runs the active behaviour once.
    ///
    /// `behaviour` receives the active state and whether this is its first
    /// tick since being entered, and returns the state to switch to, if any.
    /// Returns `true` when a transition was applied.
    pub fn tick<F>(&mut self, behaviour: F) -> bool
    where
        F: FnOnce(S, bool) -> Option<S>,
    {
        let Some(state) = self.active else {
            return false;
        };
        let first_entry = core::mem::take(&mut self.first_entry);
        behaviour(state, first_entry).is_some_and(|next| self.transition_to(next))
    }
}
