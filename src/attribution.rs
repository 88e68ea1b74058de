//! Photo attribution text shown under the background.

use crate::config::DEFAULT_LANGUAGE;
use crate::image_fetcher::{PhotoMetadata, PhotoSource};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Languages offered in the UI, in display order.
pub const LANGUAGES: [&str; 4] = ["it", "en", "fr", "de"];

static PHOTO_BY: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("it", "Foto di"),
        ("en", "Photo by"),
        ("fr", "Photo par"),
        ("de", "Foto von"),
    ])
});

/// Localized "Photo by" prefix. Unknown languages use the default language.
pub fn photo_by(language: &str) -> &'static str {
    PHOTO_BY
        .get(language)
        .or_else(|| PHOTO_BY.get(DEFAULT_LANGUAGE))
        .copied()
        .unwrap_or("Photo by")
}

/// The photo currently on screen, mirrored in storage so the attribution can
/// be re-rendered when the language changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPhoto {
    pub metadata: PhotoMetadata,
    pub source: PhotoSource,
    pub photo_id: String,
}

fn text_field(metadata: &PhotoMetadata, key: &str) -> Option<String> {
    match metadata.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Attribution line for `photo`, or `None` when there is nothing to credit.
pub fn attribution_text(photo: &CurrentPhoto, language: &str) -> Option<String> {
    if photo.metadata.is_empty() {
        return None;
    }
    let prefix = photo_by(language);

    match photo.source {
        PhotoSource::Primary => {
            let name = text_field(&photo.metadata, "Name")
                .or_else(|| text_field(&photo.metadata, "ID"))
                .unwrap_or_else(|| photo.photo_id.clone());
            Some(format!("{} {} • Codicepunto.it", prefix, name))
        }
        PhotoSource::Fallback => {
            let author = text_field(&photo.metadata, "author")?;
            let id = text_field(&photo.metadata, "id").unwrap_or_else(|| photo.photo_id.clone());
            Some(format!("{} {} • Picsum Photos ID: {}", prefix, author, id))
        }
    }
}
