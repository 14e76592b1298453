// Poster-frame capture: the host decodes, this module sequences and encodes.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;

/// Forward seek applied before grabbing, so posters are not black leading
/// frames.
pub const POSTER_SEEK_SECS: f64 = 0.1;

/// JPEG quality for encoded posters.
pub const POSTER_JPEG_QUALITY: u8 = 70;

/// One decoded video frame, tightly packed RGBA8.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Host-side media pipeline that loads a URL and hands back an early frame:
/// load, wait for first data readiness, seek forward by
/// [`POSTER_SEEK_SECS`], grab the displayed frame. Implementations swallow
/// every failure (seek, cross-origin, decode) and return None — a missing
/// poster is a normal terminal state, never an error.
#[async_trait]
pub trait PosterSource: Send + Sync + 'static {
    async fn grab_frame(&self, url: &str) -> Option<RawFrame>;
}

/// Encode a grabbed frame as a `data:image/jpeg;base64,...` URL. Returns
/// None on any inconsistency; callers treat that as "no poster".
pub fn encode_poster(frame: &RawFrame) -> Option<String> {
    if frame.width == 0 || frame.height == 0 {
        return None;
    }

    let rgba = image::RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone())?;
    let rgb = image::DynamicImage::ImageRgba8(rgba).to_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, POSTER_JPEG_QUALITY)
        .encode_image(&rgb)
        .ok()?;

    Some(format!("data:image/jpeg;base64,{}", BASE64.encode(jpeg)))
}
