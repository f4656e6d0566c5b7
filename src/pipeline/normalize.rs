//! Image normalisation: arbitrary encoded image → JPEG bytes.
//!
//! Paperless-NGX stores whatever it is given, and JPEG keeps handwriting
//! scans small. JPEG has no alpha channel, so transparent pixels are
//! composited onto white first (the same result a viewer shows) and every
//! other colour type is converted to 8-bit RGB.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageError, Rgb, RgbImage};
use tracing::debug;

/// JPEG quality used for every upload.
pub const JPEG_QUALITY: u8 = 95;

/// Decode `bytes` in any supported format and re-encode as JPEG.
///
/// Fails only when the input cannot be decoded.
pub fn to_jpeg(bytes: &[u8]) -> Result<Vec<u8>, ImageError> {
    let img = image::load_from_memory(bytes)?;
    encode_jpeg(&img)
}

/// Encode an already decoded image as JPEG at [`JPEG_QUALITY`].
pub fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>, ImageError> {
    let rgb = flatten_to_rgb(img);
    let mut buf = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY))?;
    debug!(
        "Encoded {}x{} {:?} image → {} bytes JPEG",
        img.width(),
        img.height(),
        img.color(),
        buf.len()
    );
    Ok(buf)
}

/// Drop alpha by compositing onto a white background.
fn flatten_to_rgb(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let alpha = u32::from(px[3]);
        let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }
    out
}
