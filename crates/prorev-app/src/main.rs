//! Main application entry point (native).

#[cfg(feature = "native")]
fn main() {
    env_logger::init();
    log::info!("Starting ProRev");

    let services = match prorev_core::ServiceConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Falling back to default configuration: {}", e);
            prorev_core::ServiceConfig::default()
        }
    };

    if let Err(e) = pollster::block_on(prorev_app::App::run(services)) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
