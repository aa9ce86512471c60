//! QR rendering for pairing URLs: PNG for the host UI, unicode for terminals.

use anyhow::{Context, Result};
use image::Luma;
use qrcode::render::unicode;
use qrcode::QrCode;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Smallest side of the PNG, in pixels; phones struggle with tiny codes.
const MIN_QR_SIDE: u32 = 240;

/// Per-session image name, so a UI caching images by path never shows a stale code.
pub fn qr_file_name(prefix: &str, session_id: &str) -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let short: String = session_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect();
    format!("{prefix}_{secs}_{short}.png")
}

/// Encode `url` and write it as a PNG at `path`.
pub fn render_png(url: &str, path: &Path) -> Result<()> {
    let code = QrCode::new(url.as_bytes()).context("Failed to generate QR code")?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_QR_SIDE, MIN_QR_SIDE)
        .build();

    image
        .save(path)
        .with_context(|| format!("Failed to write QR image to {}", path.display()))?;
    Ok(())
}

/// Terminal rendering, two modules per character cell.
pub fn generate_qr(url: &str) -> Result<String> {
    let code = QrCode::new(url.as_bytes()).context("Failed to generate QR code")?;

    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .quiet_zone(true)
        .build())
}
