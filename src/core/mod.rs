// Colorful Logger - core/mod.rs
//
// Core business logic layer: tagging, storing, filtering and searching lines.
// Dependencies: standard library plus regex/chrono/serde for pure logic.
// Must NOT depend on: app, platform, or open any file or device.

pub mod color;
pub mod filter;
pub mod matcher;
pub mod model;
pub mod search;
pub mod source;
pub mod store;
pub mod tags;
pub mod timestamp;
