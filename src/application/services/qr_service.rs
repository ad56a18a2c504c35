//! QR code rendering for shortened URLs.

use image::{ExtendedColorType, ImageEncoder, Luma, codecs::png::PngEncoder};
use qrcode::{EcLevel, QrCode};
use serde_json::json;

use crate::error::AppError;

/// Default pixels per QR module.
pub const DEFAULT_MODULE_SIZE: u32 = 10;

/// Largest accepted pixels-per-module value.
pub const MAX_MODULE_SIZE: u32 = 40;

/// Renders QR codes as greyscale PNG images.
pub struct QrService {
    ec_level: EcLevel,
}

impl QrService {
    pub fn new() -> Self {
        Self { ec_level: EcLevel::Q }
    }

    /// Encodes `text` as a PNG QR code with `module_size` pixels per module.
    ///
    /// The image keeps the standard quiet zone.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `module_size` is outside
    /// `1..=MAX_MODULE_SIZE` or `text` does not fit in a QR code.
    /// Returns [`AppError::Internal`] if PNG encoding fails.
    pub fn render_png(&self, text: &str, module_size: u32) -> Result<Vec<u8>, AppError> {
        if !(1..=MAX_MODULE_SIZE).contains(&module_size) {
            return Err(AppError::bad_request(
                format!("Size must be between 1 and {MAX_MODULE_SIZE}"),
                json!({ "size": module_size }),
            ));
        }

        let code = QrCode::with_error_correction_level(text.as_bytes(), self.ec_level)
            .map_err(|e| {
                AppError::bad_request(
                    "Content cannot be encoded as a QR code",
                    json!({ "reason": e.to_string() }),
                )
            })?;

        let image = code
            .render::<Luma<u8>>()
            .module_dimensions(module_size, module_size)
            .build();

        let mut png_bytes = Vec::new();
        PngEncoder::new(&mut png_bytes)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::L8,
            )
            .map_err(|e| {
                AppError::internal("Failed to encode PNG", json!({ "reason": e.to_string() }))
            })?;

        Ok(png_bytes)
    }
}

impl Default for QrService {
    fn default() -> Self {
        Self::new()
    }
}
