//! Board wiring for the test stand controller on an STM32G0B1.
//!
//! Pin map:
//! - PC13: action button, active low with pull-up
//! - PB4 / PB5: igniter IPA / N2O valve sense, active high
//! - PA8 / PA9: IPA / N2O main valve servo PWM (EXTI8 / EXTI9)
//! - PA0: scroll switch divider
//! - PA1 / PA4: main / igniter pressure transducers
//! - PA6: spark sense
//! - PA5: status LED
//! - PA2: USART2 TX, log dump port

pub mod storage;

use embassy_stm32::adc::{Adc, AnyAdcChannel, SampleTime};
use embassy_stm32::gpio::Input;
use embassy_stm32::peripherals::ADC1;
use rig_core::io::RigIo;

/// Serial log dump baud rate.
pub const SERIAL_BAUD: u32 = 115_200;

/// The ADC converts at 12 bits; the controller expects 10-bit counts.
const ADC_TO_COUNTS_SHIFT: u32 = 2;

/// Analog inputs on ADC1.
pub struct AnalogInputs<'d> {
    pub scroll: AnyAdcChannel<ADC1>,
    pub main_pressure: AnyAdcChannel<ADC1>,
    pub ig_pressure: AnyAdcChannel<ADC1>,
    pub spark: AnyAdcChannel<ADC1>,
    pub adc: Adc<'d, ADC1>,
}

/// Raw board inputs sampled once per control tick.
pub struct BoardIo<'d> {
    action: Input<'d>,
    ig_ipa_valve: Input<'d>,
    ig_n2o_valve: Input<'d>,
    analog: AnalogInputs<'d>,
}

impl<'d> BoardIo<'d> {
    pub fn new(
        action: Input<'d>,
        ig_ipa_valve: Input<'d>,
        ig_n2o_valve: Input<'d>,
        mut analog: AnalogInputs<'d>,
    ) -> Self {
        analog.adc.set_sample_time(SampleTime::CYCLES79_5);
        Self {
            action,
            ig_ipa_valve,
            ig_n2o_valve,
            analog,
        }
    }

    fn read_counts(adc: &mut Adc<'d, ADC1>, channel: &mut AnyAdcChannel<ADC1>) -> u16 {
        adc.blocking_read(channel) >> ADC_TO_COUNTS_SHIFT
    }
}

impl RigIo for BoardIo<'_> {
    fn action_button(&mut self) -> bool {
        self.action.is_low()
    }

    fn scroll_counts(&mut self) -> u16 {
        Self::read_counts(&mut self.analog.adc, &mut self.analog.scroll)
    }

    fn ig_ipa_valve(&mut self) -> bool {
        self.ig_ipa_valve.is_high()
    }

    fn ig_n2o_valve(&mut self) -> bool {
        self.ig_n2o_valve.is_high()
    }

    fn main_pressure_counts(&mut self) -> u16 {
        Self::read_counts(&mut self.analog.adc, &mut self.analog.main_pressure)
    }

    fn ig_pressure_counts(&mut self) -> u16 {
        Self::read_counts(&mut self.analog.adc, &mut self.analog.ig_pressure)
    }

    fn spark_counts(&mut self) -> u16 {
        Self::read_counts(&mut self.analog.adc, &mut self.analog.spark)
    }
}
