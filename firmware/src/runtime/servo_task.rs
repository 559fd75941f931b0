use embassy_stm32::exti::ExtiInput;
use rig_core::servo::ServoId;

use super::SERVOS;
use super::control_task::now_us;

/// Timestamps every edge on one servo PWM line.
#[embassy_executor::task(pool_size = 2)]
pub async fn run(id: ServoId, mut pin: ExtiInput<'static>) -> ! {
    let channel = SERVOS.channel(id);
    defmt::info!("servo: capturing {}", id.label());
    loop {
        pin.wait_for_any_edge().await;
        channel.on_edge(pin.is_high(), now_us());
    }
}
