//! Hardware Abstraction Layer
//!
//! Provides safe abstractions over STM32F302 peripherals.
//! Each type here implements one of the audio core's port traits so
//! the core itself never touches a register.

pub mod adc;
pub mod dac;
pub mod gpio;
pub mod timer;
