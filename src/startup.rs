use slint::ComponentHandle;
use std::rc::Rc;

use crate::settings;
use crate::state::AppState;
use crate::ui::spawn_ui_task;

/// Shows the stored settings and runs the first refresh once the event loop
/// is running.
pub fn configure_startup(app: &crate::AppWindow, app_state: &Rc<AppState>) {
    let ui_handle = app.as_weak();
    let state = app_state.clone();

    spawn_ui_task(async move {
        let language = settings::language(state.store.as_ref()).await;
        let hours = settings::cache_duration_hours(state.store.as_ref()).await;
        log::info!("Starting with language {} and cache duration {} h", language, hours);
        if let Some(ui) = ui_handle.upgrade() {
            crate::ui::set_settings_choices(&ui, &language, hours);
        }

        state.start().await;
    });
}
