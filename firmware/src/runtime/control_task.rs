use embassy_stm32::gpio::{Level, Output};
use embassy_time::{Duration, Instant, Ticker};
use rig_core::clock::{Micros, Millis};
use rig_core::event_log::RestoreOutcome;
use rig_core::rig::{Rig, RigPorts};
use rig_core::screens::FullRunPhase;

use super::SERVOS;
use crate::console::{ScreenBuffer, SerialPort};
use crate::hw::BoardIo;
use crate::hw::storage::LogFlash;

const TICK: Duration = Duration::from_millis(1);
const HEARTBEAT_MS: u32 = 10_000;

/// Peripherals owned by the control loop.
pub struct Hardware {
    pub io: BoardIo<'static>,
    pub display: ScreenBuffer,
    pub serial: SerialPort<'static>,
    pub flash: LogFlash,
    pub led: Output<'static>,
}

#[allow(clippy::cast_possible_truncation)]
pub fn now_us() -> Micros {
    Micros::new(Instant::now().as_micros() as u32)
}

#[allow(clippy::cast_possible_truncation)]
fn now_ms() -> Millis {
    Millis::new(Instant::now().as_millis() as u32)
}

#[embassy_executor::task]
pub async fn run(mut rig: Rig, mut hw: Hardware) -> ! {
    match rig.boot(&mut hw.flash) {
        RestoreOutcome::Restored { entries } => defmt::info!(
            "log: restored {} entries, sequence {}",
            entries,
            rig.log().sequence()
        ),
        RestoreOutcome::Empty => defmt::info!("log: empty, sequence {}", rig.log().sequence()),
        RestoreOutcome::Invalid => defmt::warn!("log: stored image invalid, starting empty"),
        RestoreOutcome::Unreadable => defmt::error!("log: flash unreadable, starting empty"),
    }

    let mut ticker = Ticker::every(TICK);
    let mut heartbeat = now_ms().wrapping_add(HEARTBEAT_MS);
    let mut phase = rig.full_run_phase();
    loop {
        ticker.next().await;
        let started = Instant::now();
        let now = now_ms();

        let report = rig.tick(
            now,
            now_us(),
            RigPorts {
                io: &mut hw.io,
                servos: &SERVOS,
                display: &mut hw.display,
                serial: &mut hw.serial,
                storage: &mut hw.flash,
            },
        );
        hw.led.set_level(Level::from(report.led_on));
        hw.display.flush();

        if let Some(screen) = report.entered {
            defmt::info!("screen: {}", screen);
        }
        let next_phase = rig.full_run_phase();
        if next_phase != phase {
            if next_phase == FullRunPhase::SaveFailed {
                defmt::error!("log: commit failed after {} entries", rig.log().len());
            }
            phase = next_phase;
        }

        if now.has_reached(heartbeat) {
            heartbeat = now.wrapping_add(HEARTBEAT_MS);
            defmt::debug!(
                "heartbeat: screen {}, log {} entries, recording {}",
                rig.active_screen(),
                rig.log().len(),
                rig.log().is_enabled()
            );
        }

        let elapsed = Instant::now() - started;
        if elapsed > TICK {
            defmt::warn!("control: tick overran by {} us", (elapsed - TICK).as_micros());
        }
    }
}
