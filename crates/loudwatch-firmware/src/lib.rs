//! ESP32-S3 firmware-specific modules for loudwatch
//!
//! This crate binds the collaborators of `loudwatch-core` to real peripherals:
//! the microphone ADC channel, the UART that feeds the Bluetooth modem, and
//! the detection LED. It cannot compile on desktop targets.

#![no_std]

pub mod hardware;
