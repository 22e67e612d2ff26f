// Colorful Logger - app/mod.rs
//
// Application layer: the viewing session and the background source listener.
// Dependencies: core, util.
// Must NOT depend on: platform specifics.

pub mod listener;
pub mod session;
