//! Sketchpad Render Library
//!
//! Renderer abstraction and implementations for Sketchpad.
//! The default implementation rasterizes on the CPU with tiny-skia.

mod renderer;

#[cfg(feature = "raster-renderer")]
mod export;
#[cfg(feature = "raster-renderer")]
mod raster;

pub use renderer::{RenderContext, RenderResult, Renderer, RendererError};

#[cfg(feature = "raster-renderer")]
pub use export::{SketchError, encode_png, export_png, export_surface_png, load_sketch, save_sketch};
#[cfg(feature = "raster-renderer")]
pub use raster::RasterRenderer;
