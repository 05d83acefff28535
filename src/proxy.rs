//! Privileged operation proxy.
//!
//! Some operations cannot run inside the page context: reading
//! rendered pixels of cross-origin content and saving files. They go
//! through an async message round-trip to a privileged collaborator,
//! abstracted here so tests can substitute canned screenshots.

use crate::dispatch::error::DispatchError;
use crate::mode::Mode;
use crate::transform::color::Rgb;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Mode invocation message delivered from menu, shortcut, or
/// quick-launch surfaces into the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum Invocation {
    #[serde(rename = "RUN_MODE")]
    RunMode { mode: Mode },
}

/// Liveness probe sent before attempting privileged re-injection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ping {
    pub ping: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pong {
    pub pong: bool,
}

/// Operations the core delegates across the privilege boundary.
#[async_trait]
pub trait PrivilegedProxy: Send + Sync {
    /// Screenshot of the visible area, as PNG bytes.
    async fn capture_visible_area(&self) -> Result<Vec<u8>, DispatchError>;

    /// Saves a URL to disk under the given filename.
    async fn download_url(&self, url: &str, filename: &str) -> Result<(), DispatchError>;

    /// Fetches an image URL, returning PNG bytes for clipboard use.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, DispatchError>;

    /// Health check round-trip.
    async fn ping(&self) -> Result<Pong, DispatchError> {
        Ok(Pong { pong: true })
    }
}

/// Reads one pixel out of a PNG screenshot.
///
/// `x`/`y` are page coordinates; `scale` is the device pixel ratio
/// relating them to screenshot pixels. Coordinates are clamped to the
/// image bounds, matching how a pick at the very edge should behave.
pub fn sample_pixel(png_bytes: &[u8], x: f64, y: f64, scale: f64) -> Result<Rgb, DispatchError> {
    let decoder = png::Decoder::new(png_bytes);
    let mut reader = decoder
        .read_info()
        .map_err(|e| DispatchError::Unknown(format!("Failed to decode screenshot: {}", e)))?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| DispatchError::Unknown(format!("Failed to decode screenshot: {}", e)))?;

    if info.bit_depth != png::BitDepth::Eight {
        return Err(DispatchError::Unknown(format!(
            "Unsupported screenshot bit depth: {:?}",
            info.bit_depth
        )));
    }
    let channels = match info.color_type {
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        other => {
            return Err(DispatchError::Unknown(format!(
                "Unsupported screenshot color type: {:?}",
                other
            )));
        }
    };

    let px = ((x * scale).round() as i64).clamp(0, info.width as i64 - 1) as usize;
    let py = ((y * scale).round() as i64).clamp(0, info.height as i64 - 1) as usize;
    let offset = (py * info.width as usize + px) * channels;
    let pixel = &buf[offset..offset + channels];
    Ok(Rgb::new(pixel[0], pixel[1], pixel[2]))
}
