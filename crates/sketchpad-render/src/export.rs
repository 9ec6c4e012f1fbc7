//! PNG export and sketch persistence.

use crate::raster::{RasterRenderer, demultiplied, skia_color};
use crate::renderer::{RenderContext, RenderResult, Renderer, RendererError};
use log::{info, warn};
use sketchpad_core::shapes::{Color, ImageError, ShapeId};
use sketchpad_core::storage::{IdentityToken, SavedSketch, SketchStore, StorageError};
use sketchpad_core::surface::DrawingSurface;
use thiserror::Error;
use tiny_skia::{Pixmap, PixmapPaint, Transform};

/// Errors from saving or loading a sketch.
#[derive(Debug, Error)]
pub enum SketchError {
    #[error(transparent)]
    Render(#[from] RendererError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Stored sketch is not a valid image: {0}")]
    Image(#[from] ImageError),
}

/// Encode straight RGBA8 pixels as PNG.
pub fn encode_png(rgba_data: &[u8], width: u32, height: u32) -> RenderResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| RendererError::Encode(format!("Failed to write PNG header: {e}")))?;
        writer
            .write_image_data(rgba_data)
            .map_err(|e| RendererError::Encode(format!("Failed to write PNG data: {e}")))?;
    }
    Ok(png_data)
}

/// Render `ctx`, composite it over `background` and encode the result.
pub fn export_png(
    renderer: &mut RasterRenderer,
    ctx: &RenderContext,
    background: Color,
) -> RenderResult<Vec<u8>> {
    renderer.render(ctx)?;

    let (width, height) = renderer.device_size();
    let mut flattened = Pixmap::new(width, height)
        .ok_or_else(|| RendererError::Surface(format!("Cannot allocate {width}x{height} pixmap")))?;
    flattened.fill(skia_color(background));
    flattened.draw_pixmap(
        0,
        0,
        renderer.pixmap().as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );

    let png = encode_png(&demultiplied(&flattened), width, height)?;
    info!("Exported {width}x{height} PNG ({} bytes)", png.len());
    Ok(png)
}

/// Export the committed shapes of `surface` over its background color.
///
/// The live preview and the resize handle are not part of the export.
pub fn export_surface_png(surface: &DrawingSurface) -> RenderResult<Vec<u8>> {
    let mut renderer = RasterRenderer::for_viewport(surface.viewport())?;
    export_png(
        &mut renderer,
        &RenderContext::new(surface.shapes()),
        surface.config().canvas.background_color,
    )
}

/// Export `surface` and store it under `title`.
///
/// The surface is never modified, whether or not the save succeeds.
pub async fn save_sketch(
    surface: &DrawingSurface,
    store: &dyn SketchStore,
    token: &IdentityToken,
    title: &str,
) -> Result<SavedSketch, SketchError> {
    let png = export_surface_png(surface)?;
    match store.save(token, title, &png).await {
        Ok(saved) => {
            info!("Saved sketch {:?} as {}", title, saved.id);
            Ok(saved)
        }
        Err(e) => {
            warn!("Failed to save sketch {:?}: {e}", title);
            Err(e.into())
        }
    }
}

/// Fetch a stored sketch and place it on a cleared surface at the origin.
pub async fn load_sketch(
    surface: &mut DrawingSurface,
    store: &dyn SketchStore,
    token: &IdentityToken,
    id: &str,
) -> Result<ShapeId, SketchError> {
    let png = store.load(token, id).await?;
    let shape = surface.load_raster(&png)?;
    info!("Loaded sketch {id}");
    Ok(shape)
}
