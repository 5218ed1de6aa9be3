#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

//! Phase-driven hero visualizations.
//!
//! A single `phase` scalar in [0, 1] decides the opacity of every object in
//! the scene; per-frame systems (orbits, click pulses, ambient drift) run on
//! top of that. The core is plain Rust and runs on the host; the browser
//! shell under `wasm` is only compiled for wasm32.

pub mod ambient;
pub mod camera;
pub mod curve;
pub mod driver;
pub mod error;
pub mod orbit;
pub mod pick;
pub mod pulse;
pub mod readiness;
pub mod scene;
pub mod timeline;
pub mod variant;

pub use driver::{FrameDriver, GlyphSource, Renderer, SceneState, Tick};
pub use error::VizError;
pub use timeline::{PhaseReadout, TimelinePhase};
pub use variant::VariantConfig;

// Only compile wasm-specific code when targeting wasm32.
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{dispose, get_phase, is_supported, set_phase};
