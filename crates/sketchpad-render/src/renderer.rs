//! Renderer trait abstraction.

use sketchpad_core::shapes::{Shape, ShapeId};
use sketchpad_core::surface::DrawingSurface;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Encode error: {0}")]
    Encode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Everything drawn in a single frame.
pub struct RenderContext<'a> {
    /// Committed shapes in z-order.
    pub shapes: &'a [Shape],
    /// In-progress shape, drawn on top of everything else.
    pub live_shape: Option<Shape>,
    /// Image that gets a resize handle.
    pub selected_image: Option<ShapeId>,
}

impl<'a> RenderContext<'a> {
    /// Create a context for the committed shapes only.
    pub fn new(shapes: &'a [Shape]) -> Self {
        Self {
            shapes,
            live_shape: None,
            selected_image: None,
        }
    }

    /// Full frame for a surface: shapes, live preview and selection handle.
    pub fn for_surface(surface: &'a DrawingSurface) -> Self {
        Self::new(surface.shapes())
            .with_live_shape(surface.live_shape())
            .with_selected_image(surface.selected_image())
    }

    pub fn with_live_shape(mut self, shape: Option<Shape>) -> Self {
        self.live_shape = shape;
        self
    }

    pub fn with_selected_image(mut self, id: Option<ShapeId>) -> Self {
        self.selected_image = id;
        self
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Clear the target and replay every shape in `ctx`.
    ///
    /// Rendering never mutates shapes, so rendering the same context twice
    /// produces identical output.
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<()>;

    /// Reallocate the target for a new logical size and pixel ratio.
    fn resize(&mut self, width: u32, height: u32, scale_factor: f64) -> RenderResult<()>;
}
