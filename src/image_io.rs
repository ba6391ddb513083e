//! Decoding and encoding around [`crate::quantize_in_place`].
//!
//! Any format the `image` crate can read is accepted. Alpha is dropped on the
//! way in: the quantizer only sees RGB.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, RgbImage};

use crate::config::QuantizeConfig;
use crate::error::Result;
use crate::{Quantization, quantize_in_place};

fn quantize_image(img: &mut RgbImage, config: &QuantizeConfig) -> Result<Quantization> {
    let (w, h) = img.dimensions();
    let quantization = quantize_in_place(img, config)?;
    tracing::info!(
        width = w,
        height = h,
        rounds = quantization.report.round_count(),
        "image quantized"
    );
    Ok(quantization)
}

/// Decodes `input`, quantizes it and returns the result PNG-encoded.
pub fn quantize_image_bytes(
    input: &[u8],
    config: &QuantizeConfig,
) -> Result<(Vec<u8>, Quantization)> {
    let mut img = image::load_from_memory(input)?.to_rgb8();
    let quantization = quantize_image(&mut img, config)?;

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;

    Ok((buf, quantization))
}

/// Reads `input`, quantizes it and writes `output`. The output format follows
/// the extension of `output`.
pub fn quantize_file(input: &Path, output: &Path, config: &QuantizeConfig) -> Result<Quantization> {
    let mut img = image::open(input)?.to_rgb8();
    let quantization = quantize_image(&mut img, config)?;
    img.save(output)?;
    Ok(quantization)
}
