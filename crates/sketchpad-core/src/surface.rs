//! The drawing surface: shape list, tool settings and gesture state.

use crate::config::EngineConfig;
use crate::controller::{Effect, InteractionState, PointerEvent};
use crate::shapes::{ColorError, Image, ImageError, Shape, ShapeId};
use crate::tools::{ToolKind, ToolSettings};
use kurbo::{Point, Vec2};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Logical size and device pixel ratio of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scale_factor: f64,
}

impl Viewport {
    /// Raster size in device pixels.
    pub fn device_size(&self) -> (u32, u32) {
        (
            (self.width as f64 * self.scale_factor).round() as u32,
            (self.height as f64 * self.scale_factor).round() as u32,
        )
    }
}

/// What a pointer event changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerOutcome {
    /// The surface must be repainted.
    pub redraw: bool,
    /// Id of the shape committed by this event.
    pub committed: Option<ShapeId>,
}

/// Serialized form of the shape list.
#[derive(Debug, Serialize, Deserialize)]
struct ShapeDocument {
    shapes: Vec<Shape>,
}

/// Owns the ordered shape list and routes pointer input through the
/// gesture state machine.
#[derive(Debug, Clone)]
pub struct DrawingSurface {
    shapes: Vec<Shape>,
    tools: ToolSettings,
    state: InteractionState,
    selected_image: Option<ShapeId>,
    viewport: Viewport,
    config: EngineConfig,
}

impl Default for DrawingSurface {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl DrawingSurface {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            shapes: Vec::new(),
            tools: ToolSettings::from_config(&config),
            state: InteractionState::Idle,
            selected_image: None,
            viewport: Viewport {
                width: config.canvas.width,
                height: config.canvas.height,
                scale_factor: config.canvas.scale_factor,
            },
            config,
        }
    }

    /// Committed shapes in z-order (back to front).
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn get_shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id() == id)
    }

    pub fn tools(&self) -> &ToolSettings {
        &self.tools
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn selected_image(&self) -> Option<ShapeId> {
        self.selected_image
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Preview of the shape currently being drawn.
    pub fn live_shape(&self) -> Option<Shape> {
        self.state.live_shape()
    }

    /// Run one pointer event through the state machine and apply its effects.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> PointerOutcome {
        let state = std::mem::take(&mut self.state);
        let transition = state.on_pointer(event, &self.shapes, &self.tools);
        self.state = transition.state;

        let mut outcome = PointerOutcome::default();
        for effect in transition.effects {
            match effect {
                Effect::Select(id) => {
                    if self.selected_image != id {
                        self.selected_image = id;
                        outcome.redraw = true;
                    }
                }
                Effect::Resize { id, width, height } => {
                    if let Some(img) = self.image_mut(id) {
                        img.width = width;
                        img.height = height;
                    }
                }
                Effect::Commit(shape) => {
                    debug!("Committed {} {}", shape.kind(), shape.id());
                    outcome.committed = Some(shape.id());
                    self.shapes.push(shape);
                }
                Effect::Redraw => outcome.redraw = true,
            }
        }
        outcome
    }

    pub fn select_tool(&mut self, tool: ToolKind) {
        self.tools.select(tool);
    }

    /// Set the paint color from a `#rgb` or `#rrggbb` string.
    pub fn set_color(&mut self, hex: &str) -> Result<(), ColorError> {
        let color = hex.parse()?;
        self.tools.set_color(color);
        Ok(())
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.tools.set_line_width(width);
    }

    /// Remove every shape and the selection.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.selected_image = None;
        self.state = InteractionState::Idle;
        info!("Cleared surface");
    }

    /// Change the viewport. Any gesture in progress is discarded; recorded
    /// points are logical, so the committed shapes are unaffected.
    ///
    /// A zero width or height keeps the previous size.
    pub fn resize(&mut self, width: u32, height: u32, scale_factor: f64) {
        if !self.state.is_idle() {
            debug!("Discarding gesture on resize");
        }
        self.state = InteractionState::Idle;

        let (width, height) = if width == 0 || height == 0 {
            warn!(
                "Invalid viewport size {width}x{height}, keeping {}x{}",
                self.viewport.width, self.viewport.height
            );
            (self.viewport.width, self.viewport.height)
        } else {
            (width, height)
        };
        self.viewport = Viewport {
            width,
            height,
            scale_factor: if scale_factor > 0.0 && scale_factor.is_finite() {
                scale_factor
            } else {
                warn!("Invalid scale factor {scale_factor}, keeping {}", self.viewport.scale_factor);
                self.viewport.scale_factor
            },
        };
    }

    /// Decode and place an image on top of the stack, at `origin` or the
    /// configured default position.
    pub fn upload_image(&mut self, bytes: &[u8], origin: Option<Point>) -> Result<ShapeId, ImageError> {
        let origin = origin.unwrap_or_else(|| self.config.images.default_origin());
        let image = Image::decode(bytes, origin).inspect_err(|e| warn!("Image upload failed: {e}"))?;
        let id = image.id;
        info!(
            "Uploaded {}x{} {} image {id}",
            image.source_width,
            image.source_height,
            image.format.mime_type()
        );
        self.shapes.push(Shape::Image(image));
        Ok(id)
    }

    /// Replace everything with a single image at the origin, sized to the
    /// image's intrinsic dimensions.
    pub fn load_raster(&mut self, bytes: &[u8]) -> Result<ShapeId, ImageError> {
        let image = Image::decode(bytes, Point::ZERO)?;
        let id = image.id;
        self.clear();
        self.shapes.push(Shape::Image(image));
        Ok(id)
    }

    /// Translate an image. Returns `false` if `id` is not an image.
    pub fn move_image(&mut self, id: ShapeId, delta: Vec2) -> bool {
        match self.image_mut(id) {
            Some(img) => {
                img.translate(delta);
                true
            }
            None => false,
        }
    }

    /// Delete the selected image, if any.
    pub fn remove_selected_image(&mut self) -> Option<Shape> {
        let id = self.selected_image.take()?;
        if matches!(self.state, InteractionState::ResizingImage { image, .. } if image == id) {
            self.state = InteractionState::Idle;
        }
        let index = self.shapes.iter().position(|s| s.id() == id)?;
        Some(self.shapes.remove(index))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&ShapeDocument {
            shapes: self.shapes.clone(),
        })
    }

    /// Restore a shape list saved by [`to_json`](Self::to_json).
    ///
    /// Shapes that could not have been committed are dropped.
    pub fn from_json(config: EngineConfig, json: &str) -> Result<Self, serde_json::Error> {
        let document: ShapeDocument = serde_json::from_str(json)?;
        let mut surface = Self::new(config);
        surface.shapes = document
            .shapes
            .into_iter()
            .filter(|shape| {
                let valid = is_restorable(shape);
                if !valid {
                    warn!("Dropping invalid {} {} from document", shape.kind(), shape.id());
                }
                valid
            })
            .collect();
        Ok(surface)
    }

    fn image_mut(&mut self, id: ShapeId) -> Option<&mut Image> {
        self.shapes
            .iter_mut()
            .filter_map(Shape::as_image_mut)
            .find(|img| img.id == id)
    }
}

/// Paths need a point; images need a positive finite size. Images smaller
/// than the resize floor are valid, since uploads keep their intrinsic size.
fn is_restorable(shape: &Shape) -> bool {
    match shape {
        Shape::Pencil(path) | Shape::Eraser(path) => !path.is_empty(),
        Shape::Image(img) => {
            img.width.is_finite() && img.height.is_finite() && img.width > 0.0 && img.height > 0.0
        }
        _ => true,
    }
}
