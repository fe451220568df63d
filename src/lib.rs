//! Pale Lady core crate.
//!
//! Two small browser horror games sharing one core: the side-scrolling manor
//! hunt (`ManorGame`) and the first-person chapel pursuit (`ChapelGame`). The
//! JS host owns rendering and input capture; it drives a game object once per
//! animation frame and reads the outputs back through getters. Everything with
//! actual behavior (the Lady's haunting cycle and the synthesized audio cues
//! that react to her) lives in the `haunt` and `audio` modules and runs the
//! same way on both variants.

use wasm_bindgen::prelude::*;

pub mod audio;
pub mod haunt;
pub mod quiz;

mod chapel;
mod manor;

pub use chapel::ChapelGame;
pub use manor::ManorGame;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Top-level run state shared by both variants. The host only ever constructs
/// a game in `Playing`; menus and end screens are its own concern.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GamePhase {
    Playing,
    Quiz,
    GameOver,
}

// Console logging that compiles away on native targets so the pure-logic
// integration tests can drive full game sessions under `cargo test`.
#[cfg(target_arch = "wasm32")]
pub(crate) fn log(msg: &str) {
    web_sys::console::log_1(&msg.into());
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn log(_msg: &str) {}
