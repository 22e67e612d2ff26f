// Colorful Logger - platform/mod.rs
//
// Platform abstraction layer: config directories, files, serial ports and
// process interrupts.
// Dependencies: core (line source trait), util, directories, serialport,
// signal-hook.
// Must NOT depend on: app.

pub mod config;
pub mod fs;
pub mod interrupt;
pub mod serial;
