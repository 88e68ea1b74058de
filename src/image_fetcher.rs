//! Fetches candidate background photos from the remote photo sources.
//!
//! The primary host serves a small fixed pool of photos, each with a sibling
//! JSON metadata document. The fallback is a public photo API addressed by a
//! random numeric id, where metadata is optional.

use crate::config::{
    FALLBACK_BASE_URL, FALLBACK_HEIGHT, FALLBACK_MAX_ID, FALLBACK_WIDTH, PRIMARY_BASE_URL,
    PRIMARY_ID_PREFIX, PRIMARY_IMAGE_EXTENSIONS, PRIMARY_POOL_SIZE,
};
use crate::error::{AppError, Result};
use crate::http_client::{HttpClient, get_ok};
use crate::image_loader::ImageBytes;
use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::rc::Rc;

/// Photo metadata as published by the source. Schema depends on the source.
pub type PhotoMetadata = Map<String, Value>;

/// Where a photo came from; selects how its URL is rebuilt on reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoSource {
    Primary,
    Fallback,
}

/// A photo downloaded and ready to present.
#[derive(Clone)]
pub struct FetchedPhoto {
    pub bytes: ImageBytes,
    pub metadata: PhotoMetadata,
    pub photo_id: String,
    pub source: PhotoSource,
}

pub struct ImageFetcher {
    http: Rc<dyn HttpClient>,
}

/// Formats a pool number as a primary photo id, e.g. `7` -> `DBE_007`.
pub fn primary_photo_id(number: u32) -> String {
    format!("{}{:03}", PRIMARY_ID_PREFIX, number)
}

fn primary_image_url(photo_id: &str, extension: &str) -> String {
    format!("{}{}.{}", PRIMARY_BASE_URL, photo_id, extension)
}

fn primary_metadata_url(photo_id: &str) -> String {
    format!("{}{}.json", PRIMARY_BASE_URL, photo_id)
}

fn fallback_random_url(id: u32) -> String {
    format!(
        "{}/{}/{}?random={}",
        FALLBACK_BASE_URL, FALLBACK_WIDTH, FALLBACK_HEIGHT, id
    )
}

fn fallback_image_url(photo_id: &str) -> String {
    format!(
        "{}/id/{}/{}/{}",
        FALLBACK_BASE_URL, photo_id, FALLBACK_WIDTH, FALLBACK_HEIGHT
    )
}

fn fallback_metadata_url(id: u32) -> String {
    format!("{}/id/{}/info", FALLBACK_BASE_URL, id)
}

fn parse_metadata(body: &[u8]) -> Result<PhotoMetadata> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::Network(
            "photo metadata is not a JSON object".to_string(),
        )),
        Err(e) => Err(AppError::Network(format!("invalid photo metadata: {}", e))),
    }
}

impl ImageFetcher {
    pub fn new(http: Rc<dyn HttpClient>) -> Self {
        Self { http }
    }

    /// Fetches a random photo from the primary host's pool.
    pub async fn fetch_random_photo(&self) -> Result<FetchedPhoto> {
        let number = rand::thread_rng().gen_range(1..=PRIMARY_POOL_SIZE);
        self.fetch_primary(number).await
    }

    /// Fetches pool photo `number` and its metadata. Either failing fails the
    /// whole fetch.
    pub async fn fetch_primary(&self, number: u32) -> Result<FetchedPhoto> {
        let photo_id = primary_photo_id(number);
        let bytes = self.fetch_primary_image(&photo_id).await?;

        let body = get_ok(self.http.as_ref(), &primary_metadata_url(&photo_id)).await?;
        let metadata = parse_metadata(&body)?;

        info!("Fetched primary photo {}", photo_id);
        Ok(FetchedPhoto {
            bytes,
            metadata,
            photo_id,
            source: PhotoSource::Primary,
        })
    }

    /// Tries each known extension casing once.
    async fn fetch_primary_image(&self, photo_id: &str) -> Result<ImageBytes> {
        let mut last_error = None;
        for extension in PRIMARY_IMAGE_EXTENSIONS {
            let url = primary_image_url(photo_id, extension);
            match get_ok(self.http.as_ref(), &url).await {
                Ok(body) => return Ok(ImageBytes::from(body)),
                Err(e) => {
                    debug!("Primary image {} unavailable: {}", url, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| AppError::Network("no image extensions".to_string())))
    }

    /// Fetches a random photo from the fallback API.
    pub async fn fetch_fallback_photo(&self) -> Result<FetchedPhoto> {
        let id = rand::thread_rng().gen_range(1..=FALLBACK_MAX_ID);
        self.fetch_fallback(id).await
    }

    /// Fetches fallback photo `id`. Missing metadata is tolerated.
    pub async fn fetch_fallback(&self, id: u32) -> Result<FetchedPhoto> {
        let body = get_ok(self.http.as_ref(), &fallback_random_url(id)).await?;

        let metadata = match get_ok(self.http.as_ref(), &fallback_metadata_url(id)).await {
            Ok(body) => parse_metadata(&body).unwrap_or_else(|e| {
                warn!("Ignoring fallback photo metadata: {}", e);
                PhotoMetadata::new()
            }),
            Err(e) => {
                warn!("Failed to get fallback photo info: {}", e);
                PhotoMetadata::new()
            }
        };

        info!("Fetched fallback photo {}", id);
        Ok(FetchedPhoto {
            bytes: ImageBytes::from(body),
            metadata,
            photo_id: id.to_string(),
            source: PhotoSource::Fallback,
        })
    }

    /// Downloads the image of a previously cached photo.
    pub async fn refetch(&self, source: PhotoSource, photo_id: &str) -> Result<ImageBytes> {
        match source {
            PhotoSource::Primary => self.fetch_primary_image(photo_id).await,
            PhotoSource::Fallback => {
                let body = get_ok(self.http.as_ref(), &fallback_image_url(photo_id)).await?;
                Ok(ImageBytes::from(body))
            }
        }
    }
}
