//! Idle Web - browser entry point for the idle character viewer
//!
//! Exposes `GameCanvas` (mount/unmount a canvas in a container) and
//! `CharacterScene` (the controller bound to one canvas) to JavaScript.

mod controller;
pub mod deploy;
mod error;
mod host;

pub use controller::CharacterScene;
pub use error::SceneError;
pub use host::{GameCanvas, CANVAS_ID};

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging; wgpu is noisy below INFO
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::INFO)
            .build()
    );
}
