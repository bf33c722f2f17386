use std::io::Cursor;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use image::{DynamicImage, GenericImageView, ImageFormat};

/// Decoded RGBA8 pixels ready to upload as a texture.
#[derive(Debug, Clone)]
pub struct Preview {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Preview {
    /// Bytes per row of the RGBA buffer.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }
}

/// Opens an image, taking the first frame of animated GIFs.
pub fn open_image(path: &Path) -> Result<DynamicImage> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read image: {:?}", path))?;
    let format = image::guess_format(&bytes).ok();

    if format == Some(ImageFormat::Gif) {
        let decoder = GifDecoder::new(Cursor::new(bytes))
            .with_context(|| format!("Failed to decode GIF: {:?}", path))?;
        let mut frames = decoder.into_frames();
        if let Some(frame) = frames.next() {
            let frame = frame.context("Failed to decode GIF frame")?;
            return Ok(DynamicImage::ImageRgba8(frame.into_buffer()));
        }
        return Err(anyhow!("GIF has no frames: {:?}", path));
    }

    match format {
        Some(fmt) => image::load_from_memory_with_format(&bytes, fmt)
            .with_context(|| format!("Failed to decode image: {:?}", path)),
        None => image::load_from_memory(&bytes)
            .with_context(|| format!("Failed to decode image: {:?}", path)),
    }
}

/// Decodes `path` scaled down to fit within `max_edge` x `max_edge`.
pub fn decode_preview(path: &Path, max_edge: u32) -> Result<Preview> {
    let img = open_image(path)?;
    let max_edge = max_edge.max(1);
    let resized = if img.width() > max_edge || img.height() > max_edge {
        img.thumbnail(max_edge, max_edge)
    } else {
        img
    };
    let (width, height) = resized.dimensions();
    Ok(Preview {
        rgba: resized.to_rgba8().into_raw(),
        width: width.max(1),
        height: height.max(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use tempfile::tempdir;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(width, height, Rgba([200, 10, 10, 255]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_decode_preview_downscales() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.png");
        write_png(&path, 400, 100);

        let preview = decode_preview(&path, 200).unwrap();
        assert_eq!(preview.width, 200);
        assert_eq!(preview.height, 50);
        assert_eq!(preview.rgba.len(), preview.stride() * preview.height as usize);
    }

    #[test]
    fn test_decode_preview_keeps_small_images() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("small.png");
        write_png(&path, 10, 20);

        let preview = decode_preview(&path, 256).unwrap();
        assert_eq!((preview.width, preview.height), (10, 20));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fake.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();
        assert!(decode_preview(&path, 64).is_err());
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = tempdir().unwrap();
        assert!(open_image(&dir.path().join("nope.png")).is_err());
    }
}
