//! Shape definitions for the drawing surface.

mod anchored;
mod freehand;
mod image;

pub use anchored::Anchored;
pub use freehand::Freehand;
pub use self::image::{
    Image, ImageError, ImageFormat, HANDLE_HALF_SIZE, HANDLE_RADIUS, MIN_IMAGE_SIZE,
};

use kurbo::{BezPath, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Errors produced when parsing a color string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("Invalid hex color: {0:?}")]
    InvalidHex(String),
}

/// RGBA8 color, written as a `#rrggbb` (or `#rrggbbaa`) hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Result<Self, ColorError> {
        let invalid = || ColorError::InvalidHex(s.to_string());
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return Err(invalid());
        }

        let byte = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };

        match hex.len() {
            3 => {
                // #rgb -> #rrggbb
                let nibble = |i: usize| byte(i..i + 1).map(|v| v * 17);
                Ok(Self::new(nibble(0)?, nibble(1)?, nibble(2)?, 255))
            }
            6 => Ok(Self::new(byte(0..2)?, byte(2..4)?, byte(4..6)?, 255)),
            8 => Ok(Self::new(byte(0..2)?, byte(2..4)?, byte(4..6)?, byte(6..8)?)),
            _ => Err(invalid()),
        }
    }

    /// Lowercase hex representation; the alpha byte is omitted when opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Style properties shared by every shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Stroke color (also the fill color of arrowheads).
    pub color: Color,
    /// Stroke width in logical pixels.
    pub line_width: f64,
}

impl ShapeStyle {
    pub fn new(color: Color, line_width: f64) -> Self {
        Self { color, line_width }
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            color: Color::black(),
            line_width: 2.0,
        }
    }
}

/// Pixel blending rule used when a shape is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    /// Paint over existing pixels.
    Normal,
    /// Remove existing pixels (destination-out).
    Erase,
}

/// The kind of a shape, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Pencil,
    Eraser,
    Line,
    Arrow,
    Rectangle,
    Circle,
    Triangle,
    Star,
    Image,
}

impl ShapeKind {
    /// Kinds defined by a traced path of any length.
    pub fn is_path(self) -> bool {
        matches!(self, ShapeKind::Pencil | ShapeKind::Eraser)
    }

    /// Kinds defined by exactly two anchor points.
    pub fn is_two_point(self) -> bool {
        matches!(
            self,
            ShapeKind::Line
                | ShapeKind::Arrow
                | ShapeKind::Rectangle
                | ShapeKind::Circle
                | ShapeKind::Triangle
                | ShapeKind::Star
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Pencil => "pencil",
            ShapeKind::Eraser => "eraser",
            ShapeKind::Line => "line",
            ShapeKind::Arrow => "arrow",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Star => "star",
            ShapeKind::Image => "image",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A committed drawable unit on the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Pencil(Freehand),
    Eraser(Freehand),
    Line(Anchored),
    Arrow(Anchored),
    Rectangle(Anchored),
    Circle(Anchored),
    Triangle(Anchored),
    Star(Anchored),
    Image(Image),
}

impl Shape {
    pub fn id(&self) -> ShapeId {
        match self {
            Shape::Pencil(s) | Shape::Eraser(s) => s.id,
            Shape::Line(s)
            | Shape::Arrow(s)
            | Shape::Rectangle(s)
            | Shape::Circle(s)
            | Shape::Triangle(s)
            | Shape::Star(s) => s.id,
            Shape::Image(s) => s.id,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Pencil(_) => ShapeKind::Pencil,
            Shape::Eraser(_) => ShapeKind::Eraser,
            Shape::Line(_) => ShapeKind::Line,
            Shape::Arrow(_) => ShapeKind::Arrow,
            Shape::Rectangle(_) => ShapeKind::Rectangle,
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Triangle(_) => ShapeKind::Triangle,
            Shape::Star(_) => ShapeKind::Star,
            Shape::Image(_) => ShapeKind::Image,
        }
    }

    pub fn style(&self) -> &ShapeStyle {
        match self {
            Shape::Pencil(s) | Shape::Eraser(s) => &s.style,
            Shape::Line(s)
            | Shape::Arrow(s)
            | Shape::Rectangle(s)
            | Shape::Circle(s)
            | Shape::Triangle(s)
            | Shape::Star(s) => &s.style,
            Shape::Image(s) => &s.style,
        }
    }

    /// Anchor points of the shape: the traced path, the two anchors, or the
    /// top-left corner of an image.
    pub fn points(&self) -> Vec<Point> {
        match self {
            Shape::Pencil(s) | Shape::Eraser(s) => s.points.clone(),
            Shape::Line(s)
            | Shape::Arrow(s)
            | Shape::Rectangle(s)
            | Shape::Circle(s)
            | Shape::Triangle(s)
            | Shape::Star(s) => vec![s.anchor, s.end],
            Shape::Image(s) => vec![s.position],
        }
    }

    pub fn composite(&self) -> Composite {
        match self {
            Shape::Eraser(_) => Composite::Erase,
            _ => Composite::Normal,
        }
    }

    /// Outline to stroke. Images return their frame.
    pub fn to_path(&self) -> BezPath {
        match self {
            Shape::Pencil(s) | Shape::Eraser(s) => s.to_path(),
            Shape::Line(s) | Shape::Arrow(s) => s.line_path(),
            Shape::Rectangle(s) => s.rectangle_path(),
            Shape::Circle(s) => s.circle_path(),
            Shape::Triangle(s) => s.triangle_path(),
            Shape::Star(s) => s.star_path(),
            Shape::Image(s) => s.frame_path(),
        }
    }

    /// Region painted with the stroke color as a solid fill, if any.
    pub fn fill_path(&self) -> Option<BezPath> {
        match self {
            Shape::Arrow(s) => Some(s.arrowhead_path()),
            _ => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Shape::Image(_))
    }

    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Shape::Image(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut Image> {
        match self {
            Shape::Image(img) => Some(img),
            _ => None,
        }
    }
}
