//! Data structures the renderer draws.
//!
//! - `model` holds render objects, their vertex layout and draw helpers
//! - `texture` contains GPU texture wrapper and creation utilities

pub mod model;
pub mod texture;
