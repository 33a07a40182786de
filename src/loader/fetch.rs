use std::io::Cursor;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::resolve::Address;

/// Produces decoded pixels for an address. Runs off the frame thread.
pub trait ImageFetcher: Send + Sync + 'static {
    fn fetch(&self, address: &Address) -> Result<RgbaImage>;
}

/// Reads and decodes images from the local filesystem.
///
/// `file://` URLs are accepted; any other URL is a load failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFetcher;

impl ImageFetcher for FsFetcher {
    fn fetch(&self, address: &Address) -> Result<RgbaImage> {
        let path = match address {
            Address::File(path) => path.clone(),
            Address::Url(url) if url.scheme() == "file" => url
                .to_file_path()
                .map_err(|_| anyhow!("Unusable file URL: {}", url))?,
            Address::Url(url) => bail!("No fetcher for remote address: {}", url),
        };
        Ok(open_image(&path)?.to_rgba8())
    }
}

/// Decodes an image file. Animated GIFs yield their first frame.
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
