//! Application configuration constants.

use std::time::Duration;

/// Directory name under the user's data directory.
pub const APP_DIR_NAME: &str = "daily-backdrop";
/// File holding every persisted key.
pub const STORAGE_FILE_NAME: &str = "storage.json";

/// Storage keys shared with the rest of the app.
pub mod keys {
    pub const CACHED_BACKGROUND: &str = "cachedBackground";
    pub const CACHE_DURATION: &str = "cacheDuration";
    pub const CURRENT_PHOTO: &str = "currentPhotoData";
    pub const LANGUAGE: &str = "quoteLang";
}

/// Cache duration used when the setting is missing or out of bounds.
pub const DEFAULT_CACHE_HOURS: f64 = 24.0;
/// Shortest accepted cache duration (about two minutes).
pub const MIN_CACHE_HOURS: f64 = 0.03;
/// Longest accepted cache duration (seven days).
pub const MAX_CACHE_HOURS: f64 = 168.0;
/// Choices offered in the settings selector.
pub const CACHE_DURATION_CHOICES: [f64; 5] = [0.25, 1.0, 6.0, 24.0, 168.0];

/// Scheduler refuses to arm a timer further out than this.
pub const MAX_TIMER_DELAY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// A cached image must be at least this large to be reused as-is.
pub const MIN_QUALITY_BYTES: usize = 150 * 1024;
/// A cached image older than this is refetched even if not expired.
pub const MAX_QUALITY_AGE_MINUTES: f64 = 15.0;

/// Crossfade length between two backgrounds.
pub const FADE_DURATION: Duration = Duration::from_millis(3000);

/// Primary photo host.
pub const PRIMARY_BASE_URL: &str =
    "https://raw.githubusercontent.com/bitawareunleashed/photo-storage/main/";
/// Primary photo ids are `DBE_001` ..= `DBE_{PRIMARY_POOL_SIZE}`.
pub const PRIMARY_ID_PREFIX: &str = "DBE_";
pub const PRIMARY_POOL_SIZE: u32 = 21;
/// Extensions tried in order for primary images.
pub const PRIMARY_IMAGE_EXTENSIONS: [&str; 2] = ["JPG", "jpg"];

/// Fallback public photo API.
pub const FALLBACK_BASE_URL: &str = "https://picsum.photos";
pub const FALLBACK_MAX_ID: u32 = 1000;
pub const FALLBACK_WIDTH: u32 = 1536;
pub const FALLBACK_HEIGHT: u32 = 864;

/// Language used when none is stored.
pub const DEFAULT_LANGUAGE: &str = "it";
