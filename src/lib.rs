//! flyby
//!
//! A small real-time scene viewer. A JSON settings document names a set of
//! textured models stored as `;`-delimited vertex files, a light-emitting sun
//! model and the WGSL programs to draw them with. The viewer loads everything
//! up front, then renders the scene every frame under an orbiting light while
//! the keyboard flies a free-look camera around.
//!
//! High-level modules
//! - `camera`: free-look camera, projection and keyboard controller
//! - `context`: window, GPU device/queue, surface and depth buffer
//! - `data_structures`: render objects, vertex layout and textures
//! - `error`: typed errors for each loading and rendering stage
//! - `flow`: application event loop and startup options
//! - `pipelines`: shader programs and the light uniform
//! - `resources`: async loaders for vertex files, textures and shaders
//! - `scene`: the configured objects, the sun and per-frame scene math
//! - `settings`: the settings document
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod pipelines;
pub mod resources;
pub mod scene;
pub mod settings;

pub use flow::{Options, run};
pub use resources::csv::NormalMode;
