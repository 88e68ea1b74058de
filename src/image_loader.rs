//! Image decoding and the data-URI encoding used for persisted backgrounds.

use crate::error::{AppError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::ImageReader;
use slint::{Image, Rgba8Pixel, SharedPixelBuffer};
use std::io::Cursor;
use std::sync::Arc;

/// Encoded image bytes as received from the network or a data URI.
pub type ImageBytes = Arc<[u8]>;

/// Decoded RGBA8 pixels ready for display.
#[derive(Clone)]
pub struct DecodedImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decodes encoded bytes into RGBA8 pixels.
pub fn decode_blocking(bytes: &[u8]) -> Result<DecodedImage> {
    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AppError::Decode(e.to_string()))?
        .decode()?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        rgba: rgba.into_raw(),
        width,
        height,
    })
}

/// Decodes on a blocking worker so the event loop stays responsive.
pub async fn decode(bytes: ImageBytes) -> Result<DecodedImage> {
    async_std::task::spawn_blocking(move || decode_blocking(&bytes)).await
}

/// Reads only the header to check the bytes describe a displayable image.
pub fn probe(bytes: &[u8]) -> Result<(u32, u32)> {
    let dimensions = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AppError::Decode(e.to_string()))?
        .into_dimensions()?;
    Ok(dimensions)
}

/// Encodes image bytes as `data:<mime>;base64,<payload>`.
pub fn to_data_uri(bytes: &[u8]) -> Result<String> {
    if bytes.is_empty() {
        return Err(AppError::Decode("empty image".to_string()));
    }
    let format = image::guess_format(bytes)?;
    Ok(format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        STANDARD.encode(bytes)
    ))
}

/// Extracts the bytes from a base64 data URI.
pub fn from_data_uri(uri: &str) -> Result<Vec<u8>> {
    let payload = base64_payload(uri)
        .ok_or_else(|| AppError::Decode("not a base64 data URI".to_string()))?;
    Ok(STANDARD.decode(payload)?)
}

/// Estimated decoded size of a data URI's payload in bytes.
pub fn estimated_size(uri: &str) -> usize {
    base64_payload(uri)
        .map(|payload| payload.len() * 3 / 4)
        .unwrap_or(0)
}

fn base64_payload(uri: &str) -> Option<&str> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    header.ends_with(";base64").then_some(payload)
}

/// Converts decoded pixels into a Slint image.
pub fn create_slint_image(decoded: &DecodedImage) -> Image {
    let buffer = SharedPixelBuffer::<Rgba8Pixel>::clone_from_slice(
        &decoded.rgba,
        decoded.width,
        decoded.height,
    );
    Image::from_rgba8(buffer)
}
