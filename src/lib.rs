//! Ritual Pet kiosk core.
//!
//! A headless, single-threaded state machine for an interactive "virtual
//! pet" kiosk: sleep/wake lifecycle, a timed intro, three ordered minigames
//! (food, dress, ritual) and an ending sequence. The `kiosk` module is plain
//! Rust driven by a virtual clock; the `web` module (wasm32 only) wires it to
//! the DOM, a frame loop, audio and the hardware endpoint.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod kiosk;
pub mod logging;

#[cfg(target_arch = "wasm32")]
mod web;

pub use config::{ConfigStore, PageKind};
pub use error::{ConfigError, LoadError};
pub use kiosk::{Effect, Geometry, Kiosk, NotifyReason};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init();
}

/// Loads both configuration documents, builds the controller and starts the
/// frame loop. Resolves once the kiosk is running.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn start_kiosk() -> Result<(), JsValue> {
    web::start().await
}
