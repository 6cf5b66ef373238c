//! ESP32-C3 firmware-specific modules for triplog-rs
//!
//! This crate contains hardware-specific code that cannot compile on
//! desktop targets: peripheral bring-up, the GPS UART reader feeding the
//! external NMEA decoder, the pulse-edge capture task, and the control
//! cycle task gluing the peripherals to the core engine.

#![no_std]

pub mod config;
pub mod control;
pub mod gps;
pub mod pulse;
pub mod sd;
