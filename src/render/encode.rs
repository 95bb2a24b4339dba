use std::io::Cursor;

use anyhow::Context as _;

use crate::foundation::error::{CardError, CardResult};
use crate::render::surface::Surface;

/// Encode a surface as a straight-alpha RGBA8 PNG.
pub fn encode_png(surface: &Surface) -> CardResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(
        surface.width(),
        surface.height(),
        surface.to_straight_rgba8(),
    )
    .ok_or_else(|| CardError::render("surface buffer does not match its dimensions"))?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}
