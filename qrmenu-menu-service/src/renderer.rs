use std::io::Cursor;

use image::{imageops, DynamicImage, ImageBuffer, ImageFormat, Rgba};
use qrcode::QrCode;
use thiserror::Error;

/// Visual configuration of a rendered code.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QrStyle {
    /// Target side length of the square image in pixels.
    pub width: u32,
    /// Quiet zone in modules.
    pub margin: u32,
    pub dark: Rgba<u8>,
    pub light: Rgba<u8>,
}

pub const MENU_QR_STYLE: QrStyle = QrStyle {
    width: 400,
    margin: 2,
    dark: Rgba([0, 0, 0, 255]),
    light: Rgba([255, 255, 255, 255]),
};

pub const PNG_CONTENT_TYPE: &str = "image/png";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("payload is empty")]
    EmptyPayload,
    #[error("cannot encode payload: {0}")]
    Encode(String),
    #[error("cannot write image")]
    Image(#[from] image::ImageError),
}

/// Renders `payload` as a square PNG. Modules are whole pixels, so the code is
/// centred on a light canvas of `style.width` pixels (or larger if the code
/// does not fit).
pub fn render_png(payload: &str, style: &QrStyle) -> Result<Vec<u8>, RenderError> {
    if payload.is_empty() {
        return Err(RenderError::EmptyPayload);
    }
    let code = QrCode::new(payload.as_bytes()).map_err(|e| RenderError::Encode(e.to_string()))?;

    let modules = code.width() as u32;
    let module_px = (style.width / (modules + style.margin * 2)).max(1);
    let symbol = code
        .render::<Rgba<u8>>()
        .quiet_zone(false)
        .module_dimensions(module_px, module_px)
        .dark_color(style.dark)
        .light_color(style.light)
        .build();

    let side = style
        .width
        .max(symbol.width() + style.margin * module_px * 2);
    let mut canvas = ImageBuffer::from_pixel(side, side, style.light);
    let offset = i64::from((side - symbol.width()) / 2);
    imageops::overlay(&mut canvas, &symbol, offset, offset);

    let mut png = Vec::new();
    DynamicImage::ImageRgba8(canvas).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}
