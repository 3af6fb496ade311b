//! WASM entry point.

use prorev_core::ServiceConfig;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub async fn run_wasm() {
    console_error_panic_hook::set_once();

    // A second init (hot reload) leaves the first logger in place.
    let _ = console_log::init_with_level(log::Level::Info);

    log::info!("Starting ProRev (WASM)");

    let services = ServiceConfig::from_location();
    if let Some(base) = &services.storage_base {
        log::info!("Storage from URL: {}", base);
    }

    if let Err(e) = crate::App::run(services).await {
        log::error!("ProRev stopped: {}", e);
    }
}
