use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32 as hal;
use embassy_stm32::adc::{Adc, AdcChannel};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::flash::Flash;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::usart::{Config as UartConfig, UartTx};
use rig_core::config::RigConfig;
use rig_core::rig::Rig;
use rig_core::servo::{ServoBank, ServoId};

use crate::console::{ScreenBuffer, SerialPort};
use crate::hw::{AnalogInputs, BoardIo, SERIAL_BAUD, storage};

mod control_task;
mod servo_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

/// Tuning for the control loop and the servo decoders.
const RIG_CONFIG: RigConfig = RigConfig::DEFAULT;

/// Servo channels shared between the edge tasks and the control loop.
pub(super) static SERVOS: ServoBank = RIG_CONFIG.servo_bank();

/// Runs the servo edge tasks above the thread-mode control loop.
static SERVO_EXECUTOR: InterruptExecutor = InterruptExecutor::new();

#[hal::interrupt]
unsafe fn USART3_4_5_6_LPUART1() {
    unsafe { SERVO_EXECUTOR.on_interrupt() }
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let p = hal::init(config);
    defmt::info!("rig: boot");

    hal::interrupt::USART3_4_5_6_LPUART1.set_priority(Priority::P1);
    let servo_spawner = SERVO_EXECUTOR.start(hal::interrupt::USART3_4_5_6_LPUART1);
    servo_spawner
        .spawn(servo_task::run(
            ServoId::Ipa,
            ExtiInput::new(p.PA8, p.EXTI8, Pull::Down),
        ))
        .expect("failed to spawn IPA servo task");
    servo_spawner
        .spawn(servo_task::run(
            ServoId::N2o,
            ExtiInput::new(p.PA9, p.EXTI9, Pull::Down),
        ))
        .expect("failed to spawn N2O servo task");

    let analog = AnalogInputs {
        scroll: p.PA0.degrade_adc(),
        main_pressure: p.PA1.degrade_adc(),
        ig_pressure: p.PA4.degrade_adc(),
        spark: p.PA6.degrade_adc(),
        adc: Adc::new(p.ADC1),
    };
    let io = BoardIo::new(
        Input::new(p.PC13, Pull::Up),
        Input::new(p.PB4, Pull::Down),
        Input::new(p.PB5, Pull::Down),
        analog,
    );

    let mut uart_config = UartConfig::default();
    uart_config.baudrate = SERIAL_BAUD;
    let serial = SerialPort::new(
        UartTx::new_blocking(p.USART2, p.PA2, uart_config).expect("failed to initialize USART2"),
    );

    let (flash, store) = storage::log_flash(Flash::new_blocking(p.FLASH));
    let led = Output::new(p.PA5, Level::Low, Speed::Low);

    let hardware = control_task::Hardware {
        io,
        display: ScreenBuffer::new(),
        serial,
        flash,
        led,
    };

    spawner
        .spawn(control_task::run(Rig::with_config(RIG_CONFIG, store), hardware))
        .expect("failed to spawn control task");

    core::future::pending::<()>().await;
}
