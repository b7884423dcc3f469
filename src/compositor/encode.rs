use std::path::Path;

use anyhow::Context;

use crate::{
    compositor::cpu::PageRGBA,
    foundation::error::{AlbumError, AlbumResult},
};

/// Encoded album page held in memory.
#[derive(Clone)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    pub format: image::ImageFormat,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

impl EncodedImage {
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Write the encoded bytes to `path`, creating parent directories.
    pub async fn write_to(&self, path: &Path) -> AlbumResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        tokio::fs::write(path, &self.bytes)
            .await
            .with_context(|| format!("write '{}'", path.display()))?;
        Ok(())
    }
}

/// Encode premultiplied page pixels as a baseline JPEG. `quality` is 1..=100.
pub fn encode_jpeg(page: &PageRGBA, quality: u8) -> AlbumResult<EncodedImage> {
    let expected = page.width as usize * page.height as usize * 4;
    if page.data.len() != expected {
        return Err(AlbumError::encode(format!(
            "page buffer holds {} bytes, expected {expected}",
            page.data.len()
        )));
    }

    let rgb = premul_rgba_to_rgb(&page.data);
    let mut bytes = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    encoder
        .encode(&rgb, page.width, page.height, image::ExtendedColorType::Rgb8)
        .map_err(|e| AlbumError::encode(format!("jpeg: {e}")))?;

    tracing::debug!(bytes = bytes.len(), quality, "page encoded");
    Ok(EncodedImage {
        width: page.width,
        height: page.height,
        format: image::ImageFormat::Jpeg,
        bytes,
    })
}

/// Drop alpha after un-premultiplying. JPEG has no alpha channel.
fn premul_rgba_to_rgb(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 4 * 3);
    for px in data.chunks_exact(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            out.extend_from_slice(&[0, 0, 0]);
            continue;
        }
        for &c in &px[..3] {
            out.push(((u16::from(c) * 255 + a / 2) / a).min(255) as u8);
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/encode.rs"]
mod tests;
