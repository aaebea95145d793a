//! Image compression, lossless unless a JPEG quality is configured.
//!
//! PNG and WebP are decoded and re-encoded losslessly; JPEG is re-encoded only
//! with an explicit quality. SVG is normalized through usvg unless it uses
//! features usvg would drop. The smaller of original and re-encoded bytes is
//! kept, so a file never grows. Formats without an encoder (GIF, ICO) pass
//! through.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageFormat};

use crate::asset::AssetFile;
use crate::error::StageError;

use super::Transform;

#[derive(Debug, Clone, Copy)]
pub struct ImageCompress {
    /// 0 disables compression, 1 is fastest, 3 and above is best.
    level: u8,
    /// `None` keeps JPEG bytes untouched.
    jpeg_quality: Option<u8>,
}

impl Default for ImageCompress {
    fn default() -> Self {
        Self::new(3, None)
    }
}

impl ImageCompress {
    pub fn new(level: u8, jpeg_quality: Option<u8>) -> Self {
        Self {
            level,
            jpeg_quality: jpeg_quality.map(|q| q.clamp(1, 100)),
        }
    }

    fn png_compression(&self) -> CompressionType {
        match self.level {
            1 => CompressionType::Fast,
            2 => CompressionType::Default,
            _ => CompressionType::Best,
        }
    }

    fn compress_raster(&self, data: &[u8], format: ImageFormat) -> Result<Option<Vec<u8>>, String> {
        let image = image::load_from_memory_with_format(data, format).map_err(|e| e.to_string())?;
        let mut out = Cursor::new(Vec::with_capacity(data.len()));

        match format {
            ImageFormat::Png => write(
                &image,
                PngEncoder::new_with_quality(&mut out, self.png_compression(), FilterType::Adaptive),
            )?,
            ImageFormat::Jpeg => match self.jpeg_quality {
                Some(quality) => write(&image, JpegEncoder::new_with_quality(&mut out, quality))?,
                None => return Ok(None),
            },
            ImageFormat::WebP => write(&image, WebPEncoder::new_lossless(&mut out))?,
            _ => return Ok(None),
        }
        Ok(Some(out.into_inner()))
    }

    fn compress_svg(data: &[u8]) -> Result<Option<Vec<u8>>, String> {
        if keeps_svg_verbatim(data) {
            return Ok(None);
        }
        let tree = usvg::Tree::from_data(data, &usvg::Options::default()).map_err(|e| e.to_string())?;
        let write_options = usvg::WriteOptions {
            indent: usvg::Indent::None,
            ..Default::default()
        };
        Ok(Some(tree.to_string(&write_options).into_bytes()))
    }
}

/// Elements usvg drops or flattens: text without fonts, animation, CSS rules,
/// scripts and embedded HTML.
const SVG_VERBATIM_TAGS: &[&[u8]] = &[
    b"<text",
    b"<animate",
    b"<set",
    b"<style",
    b"<script",
    b"<foreignObject",
];

fn keeps_svg_verbatim(data: &[u8]) -> bool {
    SVG_VERBATIM_TAGS
        .iter()
        .any(|tag| data.windows(tag.len()).any(|w| w == *tag))
}

fn write(image: &DynamicImage, encoder: impl image::ImageEncoder) -> Result<(), String> {
    image.write_with_encoder(encoder).map_err(|e| e.to_string())
}

impl Transform for ImageCompress {
    fn name(&self) -> &'static str {
        "image"
    }

    fn apply(&self, mut file: AssetFile) -> Result<AssetFile, StageError> {
        if self.level == 0 {
            return Ok(file);
        }

        let ext = file.extension().map(str::to_ascii_lowercase);
        let compressed = match ext.as_deref() {
            Some("svg") => Self::compress_svg(&file.contents),
            Some("png") => self.compress_raster(&file.contents, ImageFormat::Png),
            Some("jpg" | "jpeg") => self.compress_raster(&file.contents, ImageFormat::Jpeg),
            Some("webp") => self.compress_raster(&file.contents, ImageFormat::WebP),
            _ => Ok(None),
        }
        .map_err(|e| StageError::transform(self.name(), &file.source, e))?;

        if let Some(bytes) = compressed
            && bytes.len() < file.contents.len()
        {
            file.contents = bytes;
        }
        Ok(file)
    }
}
