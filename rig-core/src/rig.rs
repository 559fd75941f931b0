//! The controller: one cooperative tick at a time.
//!
//! A tick samples the inputs, turns input and servo changes into log
//! entries, runs the active screen, and advances the status LED. Hardware
//! stays outside; each tick borrows it through [`RigPorts`].

use embedded_storage::{ReadStorage, Storage};

use crate::clock::{Micros, Millis};
use crate::config::{LOG_CAPACITY, RigConfig};
use crate::event_log::{EventLog, LogOp, LogStore, RestoreOutcome};
use crate::inputs::{Edge, InputTracker, InputTransitions};
use crate::io::{RigIo, SerialOut, TextDisplay};
use crate::led::{LedMode, StatusLed};
use crate::pressure::log_param;
use crate::scheduler::StateScheduler;
use crate::screens::{FullRunPhase, Screen, ScreenContext, ScreenMemory};
use crate::servo::{ServoBank, ServoId};

/// Hardware borrowed for the duration of one tick.
pub struct RigPorts<'a, I, D, W, S> {
    pub io: &'a mut I,
    pub servos: &'a ServoBank,
    pub display: &'a mut D,
    pub serial: &'a mut W,
    pub storage: &'a mut S,
}

/// What happened during a tick.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    /// Status LED pin level.
    pub led_on: bool,
    /// Screen switched to; it runs its first tick next time.
    pub entered: Option<Screen>,
}

pub struct Rig<const CAP: usize = LOG_CAPACITY> {
    config: RigConfig,
    inputs: InputTracker,
    log: EventLog<CAP>,
    store: LogStore,
    led: StatusLed,
    scheduler: StateScheduler<Screen>,
    memory: ScreenMemory,
}

impl<const CAP: usize> Rig<CAP> {
    /// A controller with default tuning whose log image starts at `store`.
    #[must_use]
    pub fn new(store: LogStore) -> Self {
        Self::with_config(RigConfig::DEFAULT, store)
    }

    #[must_use]
    pub fn with_config(config: RigConfig, store: LogStore) -> Self {
        Self {
            config,
            inputs: InputTracker::new(config.inputs),
            log: EventLog::new(),
            store,
            led: StatusLed::new(config.led),
            scheduler: StateScheduler::new(),
            memory: ScreenMemory::default(),
        }
    }

    /// Restores the persisted log and shows the menu.
    pub fn boot<S: ReadStorage>(&mut self, storage: &mut S) -> RestoreOutcome {
        let outcome = self.log.init(&self.store, storage);
        self.scheduler.transition_to(Screen::Menu);
        outcome
    }

    /// Runs one control-loop tick.
    pub fn tick<I, D, W, S>(
        &mut self,
        now: Millis,
        now_us: Micros,
        ports: RigPorts<'_, I, D, W, S>,
    ) -> TickReport
    where
        I: RigIo,
        D: TextDisplay,
        W: SerialOut,
        S: Storage,
    {
        let transitions = self.inputs.sample(ports.io, now);
        self.record_inputs(&transitions, now);
        self.record_servos(ports.servos, now, now_us);

        let mut ctx = ScreenContext {
            now,
            now_us,
            inputs: &mut self.inputs,
            servos: ports.servos,
            log: &mut self.log,
            store: &self.store,
            led: &mut self.led,
            display: ports.display,
            serial: ports.serial,
            storage: ports.storage,
        };
        let memory = &mut self.memory;
        let switched = self
            .scheduler
            .tick(|screen, first_entry| screen.run(first_entry, &mut ctx, memory));

        TickReport {
            led_on: self.led.update(now),
            entered: if switched { self.scheduler.active() } else { None },
        }
    }

    fn record_inputs(&mut self, transitions: &InputTransitions, now: Millis) {
        let edges = [
            (transitions.ig_ipa_valve, LogOp::IgIpaOpen, LogOp::IgIpaClose),
            (transitions.ig_n2o_valve, LogOp::IgN2oOpen, LogOp::IgN2oClose),
            (transitions.spark, LogOp::SparkFirst, LogOp::SparkLast),
        ];
        for (edge, rising, falling) in edges {
            match edge {
                Edge::Rising => {
                    self.log.record(rising, 0, now);
                }
                Edge::Falling => {
                    self.log.record(falling, 0, now);
                }
                Edge::None => {}
            }
        }

        if let Some(counts) = transitions.ig_pressure {
            self.log
                .record(LogOp::IgPressureChange, log_param(counts), now);
        }
    }

    fn record_servos(&mut self, servos: &ServoBank, now: Millis, now_us: Micros) {
        for (id, op) in [
            (ServoId::Ipa, LogOp::MainIpaChange),
            (ServoId::N2o, LogOp::MainN2oChange),
        ] {
            let channel = servos.channel(id);
            if channel.take_changed() {
                let angle = channel.read(now_us).angle().unwrap_or(u8::MAX);
                self.log.record(op, angle, now);
            }
        }
    }

    #[must_use]
    pub const fn config(&self) -> &RigConfig {
        &self.config
    }

    #[must_use]
    pub const fn inputs(&self) -> &InputTracker {
        &self.inputs
    }

    #[must_use]
    pub const fn log(&self) -> &EventLog<CAP> {
        &self.log
    }

    #[must_use]
    pub const fn store(&self) -> &LogStore {
        &self.store
    }

    #[must_use]
    pub fn active_screen(&self) -> Option<Screen> {
        self.scheduler.active()
    }

    #[must_use]
    pub const fn led_mode(&self) -> LedMode {
        self.led.mode()
    }

    #[must_use]
    pub const fn full_run_phase(&self) -> FullRunPhase {
        self.memory.full_run.phase()
    }

    #[must_use]
    pub const fn menu_selection(&self) -> usize {
        self.memory.menu.selection()
    }
}
