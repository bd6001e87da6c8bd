//! Ticket QR payloads.
//!
//! A ticket carries a QR code naming the event and the purchaser, rendered as a
//! grayscale PNG and embedded as a `data:` URL so it can be stored and displayed
//! without a separate file. Encoder options are fixed so the same input always
//! produces the same bytes.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use thiserror::Error;

pub const DATA_URL_PREFIX: &str = "data:image/png;base64,";
const MIN_DIMENSION: u32 = 200;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("text cannot be encoded as a QR code: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("failed to write QR image: {0}")]
    Image(#[from] image::ImageError),
}

pub fn ticket_text(event_name: &str, purchaser: &str) -> String {
    format!("Event: {event_name}\nName: {purchaser}")
}

/// QR code for a ticket as a self-contained `data:image/png;base64,…` string.
pub fn ticket_qr_data_url(event_name: &str, purchaser: &str) -> Result<String, QrError> {
    let png = render_png(&ticket_text(event_name, purchaser))?;
    Ok(format!("{DATA_URL_PREFIX}{}", STANDARD.encode(png)))
}

fn render_png(text: &str) -> Result<Vec<u8>, QrError> {
    let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::M)?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_DIMENSION, MIN_DIMENSION)
        .quiet_zone(true)
        .build();

    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}
