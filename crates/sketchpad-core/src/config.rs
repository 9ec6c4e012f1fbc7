//! Engine configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! usable configuration. Out-of-range values are clamped by
//! [`EngineConfig::validate`] with a warning rather than rejected.

use crate::shapes::Color;
use kurbo::Point;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Smallest accepted line width.
pub const MIN_LINE_WIDTH: f64 = 1.0;

/// Largest accepted line width.
pub const MAX_LINE_WIDTH: f64 = 20.0;

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine the configuration directory")]
    NoConfigDir,

    #[error("Failed to read config from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Drawing tool defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingConfig {
    /// Initial paint color.
    #[serde(default = "default_color")]
    pub default_color: Color,

    /// Width restored when switching away from the eraser (1 - 20).
    #[serde(default = "default_line_width")]
    pub default_line_width: f64,

    /// Width forced when the eraser is selected (1 - 20).
    #[serde(default = "default_eraser_line_width")]
    pub eraser_line_width: f64,

    /// Pencil and eraser points closer than this to the previous point are
    /// skipped. `0` records every point.
    #[serde(default = "default_min_point_distance")]
    pub min_point_distance: f64,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            default_color: default_color(),
            default_line_width: default_line_width(),
            eraser_line_width: default_eraser_line_width(),
            min_point_distance: default_min_point_distance(),
        }
    }
}

/// Surface size and background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Fill behind exported sketches; also the eraser's paint color.
    #[serde(default = "default_background_color")]
    pub background_color: Color,

    /// Logical width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Logical height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Device pixel ratio.
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            background_color: default_background_color(),
            width: default_width(),
            height: default_height(),
            scale_factor: default_scale_factor(),
        }
    }
}

/// Placement of uploaded images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagesConfig {
    #[serde(default = "default_image_offset")]
    pub default_x: f64,

    #[serde(default = "default_image_offset")]
    pub default_y: f64,
}

impl ImagesConfig {
    pub fn default_origin(&self) -> Point {
        Point::new(self.default_x, self.default_y)
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            default_x: default_image_offset(),
            default_y: default_image_offset(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Suggested file name for PNG exports.
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: default_file_name(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub drawing: DrawingConfig,

    #[serde(default)]
    pub canvas: CanvasConfig,

    #[serde(default)]
    pub images: ImagesConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

impl EngineConfig {
    /// Parse a TOML document and clamp its values.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let mut config: EngineConfig = toml::from_str(s)?;
        config.validate();
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// `<config dir>/sketchpad/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("sketchpad").join("config.toml"))
    }

    /// Clamp out-of-range values to the nearest valid value.
    pub fn validate(&mut self) {
        let drawing = &mut self.drawing;
        for (name, width) in [
            ("default_line_width", &mut drawing.default_line_width),
            ("eraser_line_width", &mut drawing.eraser_line_width),
        ] {
            if !(MIN_LINE_WIDTH..=MAX_LINE_WIDTH).contains(&*width) {
                warn!("Invalid {name} {width:.1}, clamping to 1.0-20.0 range");
                *width = if width.is_nan() {
                    default_line_width()
                } else {
                    width.clamp(MIN_LINE_WIDTH, MAX_LINE_WIDTH)
                };
            }
        }

        if drawing.min_point_distance.is_nan() || drawing.min_point_distance < 0.0 {
            warn!(
                "Invalid min_point_distance {:.1}, disabling decimation",
                drawing.min_point_distance
            );
            drawing.min_point_distance = 0.0;
        }

        let canvas = &mut self.canvas;
        if canvas.width == 0 || canvas.height == 0 {
            warn!(
                "Invalid canvas size {}x{}, using {}x{}",
                canvas.width,
                canvas.height,
                default_width(),
                default_height()
            );
            canvas.width = default_width();
            canvas.height = default_height();
        }

        if !(canvas.scale_factor > 0.0 && canvas.scale_factor.is_finite()) {
            warn!("Invalid scale_factor {}, using 1.0", canvas.scale_factor);
            canvas.scale_factor = default_scale_factor();
        }

        if self.export.file_name.trim().is_empty() {
            warn!("Empty export file_name, using {}", default_file_name());
            self.export.file_name = default_file_name();
        }
    }
}

fn default_color() -> Color {
    Color::black()
}

fn default_line_width() -> f64 {
    2.0
}

fn default_eraser_line_width() -> f64 {
    20.0
}

fn default_min_point_distance() -> f64 {
    2.0
}

fn default_background_color() -> Color {
    Color::white()
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

fn default_scale_factor() -> f64 {
    1.0
}

fn default_image_offset() -> f64 {
    100.0
}

fn default_file_name() -> String {
    "sketch.png".to_string()
}
