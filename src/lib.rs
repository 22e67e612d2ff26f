// Colorful Logger - lib.rs
//
// Library entry point, exposing all modules for integration testing and for
// front ends other than the bundled command line tool.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
