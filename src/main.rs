//! Stillpoint: a small editor for meditation environments.
//!
//! W/E/R pick move, rotate or scale. Click an object to select it, drag the
//! selected object to transform it. 1-4 place a tree, mountain, water or mat,
//! Delete removes the selection, L cycles lighting, M toggles ambient sound,
//! Ctrl+S / Ctrl+O save and load.

use stillpoint::config::EditorConfig;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("Stillpoint scene editor");
    log::info!("   Press ESC or close window to exit");

    let config = EditorConfig::from_env();
    if let Err(err) = stillpoint::app::run(config) {
        log::error!("event loop error: {err}");
        std::process::exit(1);
    }

    log::info!("Goodbye!");
}
