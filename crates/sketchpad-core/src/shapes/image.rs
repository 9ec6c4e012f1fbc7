//! Image shape for embedding raster images.

use super::{ShapeId, ShapeStyle};
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::{BezPath, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Half-size of the square hit box around the resize handle.
pub const HANDLE_HALF_SIZE: f64 = 10.0;

/// Radius of the drawn resize handle.
pub const HANDLE_RADIUS: f64 = 10.0;

/// Images never shrink below this width or height.
pub const MIN_IMAGE_SIZE: f64 = 50.0;

/// Errors produced while embedding an image.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    Decode(#[from] ::image::ImageError),

    #[error("Image data is not valid base64")]
    InvalidData,
}

/// Image format for stored image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }

    fn codec(self) -> ::image::ImageFormat {
        match self {
            ImageFormat::Png => ::image::ImageFormat::Png,
            ImageFormat::Jpeg => ::image::ImageFormat::Jpeg,
            ImageFormat::WebP => ::image::ImageFormat::WebP,
        }
    }
}

/// A raster image placed on the surface.
///
/// The encoded bytes are kept as base64 so the shape list serializes to plain
/// JSON. Only `position`, `width` and `height` change after placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub(crate) id: ShapeId,
    /// Top-left corner position.
    pub position: Point,
    /// Display width.
    pub width: f64,
    /// Display height.
    pub height: f64,
    /// Intrinsic width in pixels.
    pub source_width: u32,
    /// Intrinsic height in pixels.
    pub source_height: u32,
    pub format: ImageFormat,
    pub data_base64: String,
    pub style: ShapeStyle,
}

impl Image {
    /// Decode `bytes`, sizing the shape to the image's intrinsic dimensions.
    pub fn decode(bytes: &[u8], position: Point) -> Result<Self, ImageError> {
        let format = ImageFormat::from_magic_bytes(bytes).ok_or(ImageError::UnsupportedFormat)?;
        let decoded = ::image::load_from_memory_with_format(bytes, format.codec())?;

        Ok(Self {
            id: Uuid::new_v4(),
            position,
            width: decoded.width() as f64,
            height: decoded.height() as f64,
            source_width: decoded.width(),
            source_height: decoded.height(),
            format,
            data_base64: STANDARD.encode(bytes),
            style: ShapeStyle::default(),
        })
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Raw encoded bytes.
    pub fn data(&self) -> Result<Vec<u8>, ImageError> {
        STANDARD
            .decode(&self.data_base64)
            .map_err(|_| ImageError::InvalidData)
    }

    /// Decoded pixels at intrinsic size.
    pub fn decode_rgba(&self) -> Result<::image::RgbaImage, ImageError> {
        let bytes = self.data()?;
        let decoded = ::image::load_from_memory_with_format(&bytes, self.format.codec())?;
        Ok(decoded.to_rgba8())
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }

    /// Inclusive bounding-box hit test.
    pub fn contains(&self, point: Point) -> bool {
        let rect = self.as_rect();
        point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
    }

    /// Bottom-right corner, where the resize handle sits.
    pub fn handle_center(&self) -> Point {
        Point::new(self.position.x + self.width, self.position.y + self.height)
    }

    /// Inclusive square hit test around the resize handle.
    pub fn handle_contains(&self, point: Point) -> bool {
        let center = self.handle_center();
        (point.x - center.x).abs() <= HANDLE_HALF_SIZE
            && (point.y - center.y).abs() <= HANDLE_HALF_SIZE
    }

    /// Display size that puts the bottom-right corner under `pointer`, never
    /// below `MIN_IMAGE_SIZE` on either axis.
    pub fn size_for_pointer(&self, pointer: Point) -> (f64, f64) {
        (
            (pointer.x - self.position.x).max(MIN_IMAGE_SIZE),
            (pointer.y - self.position.y).max(MIN_IMAGE_SIZE),
        )
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Bounding box as a closed path.
    pub fn frame_path(&self) -> BezPath {
        self.as_rect().to_path(0.1)
    }
}
