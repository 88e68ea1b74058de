//! Helper functions to set groups of BackdropState properties at once.

use crate::attribution::LANGUAGES;
use crate::config::CACHE_DURATION_CHOICES;
use slint::{ComponentHandle, ModelRc, SharedString, VecModel};

/// Sets the attribution text and its visibility together.
///
/// `None` or an empty text hides the attribution.
pub fn set_photo_info(ui: &crate::AppWindow, text: Option<&str>) {
    let state = ui.global::<crate::BackdropState>();
    match text {
        Some(text) if !text.is_empty() => {
            state.set_photo_info(text.into());
            state.set_photo_info_visible(true);
        }
        _ => {
            state.set_photo_info(SharedString::new());
            state.set_photo_info_visible(false);
        }
    }
}

/// Human readable label for a cache duration choice.
pub fn cache_duration_label(hours: f64) -> String {
    if hours < 1.0 {
        format!("{} min", (hours * 60.0).round())
    } else if hours >= 48.0 && hours % 24.0 == 0.0 {
        format!("{} days", hours / 24.0)
    } else if hours == 1.0 {
        "1 hour".to_string()
    } else {
        format!("{} hours", hours)
    }
}

/// Fills both selectors and selects the stored values.
///
/// Groups: language-names, language-index, cache-duration-labels,
/// cache-duration-index
pub fn set_settings_choices(ui: &crate::AppWindow, language: &str, cache_hours: f64) {
    let state = ui.global::<crate::BackdropState>();

    let languages: Vec<SharedString> = LANGUAGES
        .iter()
        .map(|code| code.to_uppercase().into())
        .collect();
    state.set_language_names(ModelRc::new(VecModel::from(languages)));
    let language_index = LANGUAGES.iter().position(|code| *code == language).unwrap_or(0);
    state.set_language_index(language_index as i32);

    let labels: Vec<SharedString> = CACHE_DURATION_CHOICES
        .iter()
        .map(|hours| cache_duration_label(*hours).into())
        .collect();
    state.set_cache_duration_labels(ModelRc::new(VecModel::from(labels)));
    state.set_cache_duration_index(closest_choice(cache_hours) as i32);
}

/// Index of the offered duration closest to `hours`.
fn closest_choice(hours: f64) -> usize {
    CACHE_DURATION_CHOICES
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - hours).abs().total_cmp(&(*b - hours).abs()))
        .map(|(index, _)| index)
        .unwrap_or(0)
}
