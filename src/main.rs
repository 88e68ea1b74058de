// Prevent console window in addition to Slint window in Windows release builds when, e.g., starting the app via file manager. Ignored on other platforms.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

slint::include_modules!();

mod attribution;
mod background_cache;
mod clock;
mod config;
mod error;
mod http_client;
mod image_fetcher;
mod image_loader;
mod services;
mod settings;
mod startup;
mod state;
mod storage;
#[cfg(test)]
mod test_support;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(debug_assertions)]
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .init();
    #[cfg(not(debug_assertions))]
    env_logger::init();

    let app = AppWindow::new()?;
    let app_state = state::AppState::new(&app)?;

    // Setup all UI event handlers
    ui::setup_handlers(&app, app_state.clone());
    startup::configure_startup(&app, &app_state);

    app.run()?;

    app_state.scheduler.stop();

    Ok(())
}
