//! Image encoding for camera captures and upload previews.

use crate::renderer::RendererError;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use prorev_core::{CaptureError, Frame};

/// Quality used for camera captures.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Encode an RGBA frame as JPEG. Alpha is dropped.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, CaptureError> {
    let expected = frame.width as usize * frame.height as usize * 4;
    if frame.width == 0 || frame.height == 0 || frame.rgba.len() != expected {
        return Err(CaptureError::Encode(format!(
            "frame is {}x{} with {} bytes",
            frame.width,
            frame.height,
            frame.rgba.len()
        )));
    }

    let rgb: Vec<u8> = frame
        .rgba
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100))
        .write_image(&rgb, frame.width, frame.height, ExtendedColorType::Rgb8)
        .map_err(|e| CaptureError::Encode(e.to_string()))?;
    Ok(jpeg)
}

/// Decode a PNG or JPEG into RGBA pixels.
pub fn decode_rgba(bytes: &[u8]) -> Result<Frame, RendererError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| RendererError::RenderFailed(format!("decode failed: {}", e)))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Frame {
        width,
        height,
        rgba: rgba.into_vec(),
    })
}
