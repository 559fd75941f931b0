#![no_std]

#[cfg(test)]
extern crate std;

// Shared logic for the motor test-stand controller.
//
// Everything here is portable between the STM32 firmware and the host
// emulator: no allocation, no standard library, and every collaborator that
// touches hardware sits behind a trait in `io`.

pub mod clock;
pub mod config;
pub mod event_log;
pub mod inputs;
pub mod io;
pub mod led;
pub mod pressure;
pub mod rig;
pub mod scheduler;
pub mod screens;
pub mod servo;
pub mod text;
