//! JSON gesture scripts replayed against a drawing surface.

use anyhow::{Context, Result};
use kurbo::Point;
use log::{debug, info, warn};
use serde::Deserialize;
use sketchpad_core::controller::PointerEvent;
use sketchpad_core::surface::DrawingSurface;
use sketchpad_core::tools::ToolKind;
use sketchpad_render::{RasterRenderer, RenderContext, Renderer};
use std::fs;
use std::path::{Path, PathBuf};

/// One scripted input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Tool { tool: ToolKind },
    Color { color: String },
    LineWidth { width: f64 },
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    Leave,
    /// Upload an image file; relative paths resolve against the script.
    Image {
        path: PathBuf,
        #[serde(default)]
        x: Option<f64>,
        #[serde(default)]
        y: Option<f64>,
    },
    DeleteImage,
    Resize {
        width: u32,
        height: u32,
        #[serde(default = "default_scale_factor")]
        scale_factor: f64,
    },
    Clear,
}

fn default_scale_factor() -> f64 {
    1.0
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Script {
    pub actions: Vec<Action>,
    /// Directory image paths resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid gesture script")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        let mut script = Self::from_json(&json)
            .with_context(|| format!("Failed to parse script {}", path.display()))?;
        script.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(script)
    }
}

/// Counts reported after a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub actions: usize,
    pub committed: usize,
    pub redraws: usize,
}

/// Drives a surface and keeps a raster in sync with it, like an event loop.
pub struct Replayer {
    surface: DrawingSurface,
    renderer: RasterRenderer,
    summary: ReplaySummary,
}

impl Replayer {
    pub fn new(surface: DrawingSurface) -> Result<Self> {
        let renderer = RasterRenderer::for_viewport(surface.viewport())?;
        Ok(Self {
            surface,
            renderer,
            summary: ReplaySummary::default(),
        })
    }

    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    pub fn into_surface(self) -> DrawingSurface {
        self.surface
    }

    pub fn run(&mut self, script: &Script) -> Result<ReplaySummary> {
        for (index, action) in script.actions.iter().enumerate() {
            self.apply(action, &script.base_dir)
                .with_context(|| format!("Action {} ({action:?}) failed", index + 1))?;
        }
        info!(
            "Replayed {} actions: {} shapes committed, {} redraws",
            self.summary.actions, self.summary.committed, self.summary.redraws
        );
        Ok(self.summary)
    }

    fn apply(&mut self, action: &Action, base_dir: &Path) -> Result<()> {
        self.summary.actions += 1;
        let redraw = match action {
            Action::Tool { tool } => {
                self.surface.select_tool(*tool);
                false
            }
            Action::Color { color } => {
                self.surface.set_color(color)?;
                false
            }
            Action::LineWidth { width } => {
                self.surface.set_line_width(*width);
                false
            }
            Action::Down { x, y } => self.pointer(PointerEvent::Down(Point::new(*x, *y))),
            Action::Move { x, y } => self.pointer(PointerEvent::Move(Point::new(*x, *y))),
            Action::Up { x, y } => self.pointer(PointerEvent::Up(Point::new(*x, *y))),
            Action::Leave => self.pointer(PointerEvent::Leave),
            Action::Image { path, x, y } => {
                let path = base_dir.join(path);
                let bytes = fs::read(&path)
                    .with_context(|| format!("Failed to read image {}", path.display()))?;
                let origin = match (x, y) {
                    (Some(x), Some(y)) => Some(Point::new(*x, *y)),
                    (None, None) => None,
                    _ => {
                        warn!("Image action needs both x and y; using the default origin");
                        None
                    }
                };
                self.surface.upload_image(&bytes, origin)?;
                true
            }
            Action::DeleteImage => self.surface.remove_selected_image().is_some(),
            Action::Resize {
                width,
                height,
                scale_factor,
            } => {
                self.surface.resize(*width, *height, *scale_factor);
                let viewport = self.surface.viewport();
                self.renderer
                    .resize(viewport.width, viewport.height, viewport.scale_factor)?;
                true
            }
            Action::Clear => {
                self.surface.clear();
                true
            }
        };

        if redraw {
            self.renderer.render(&RenderContext::for_surface(&self.surface))?;
            self.summary.redraws += 1;
        }
        Ok(())
    }

    fn pointer(&mut self, event: PointerEvent) -> bool {
        let outcome = self.surface.handle_pointer(event);
        if let Some(id) = outcome.committed {
            debug!("Committed shape {id}");
            self.summary.committed += 1;
        }
        outcome.redraw
    }
}
