//! CPU rasterizer backed by tiny-skia.

use crate::renderer::{RenderContext, RenderResult, Renderer, RendererError};
use kurbo::{BezPath, PathEl};
use log::{debug, warn};
use sketchpad_core::shapes::{
    Color, Composite, HANDLE_RADIUS, Image, Shape, ShapeId, ShapeStyle,
};
use sketchpad_core::surface::Viewport;
use std::collections::HashMap;
use tiny_skia::{
    BlendMode, ColorU8, FillRule, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap,
    PixmapPaint, Stroke, Transform,
};

/// Renders shapes into an RGBA pixmap.
///
/// The pixmap is `logical size × scale factor` device pixels; shapes are
/// drawn through a scale transform, so they stay in logical coordinates.
pub struct RasterRenderer {
    pixmap: Pixmap,
    scale_factor: f64,
    /// Decoded image pixels per shape. `None` marks images that failed to decode.
    image_cache: HashMap<ShapeId, Option<Pixmap>>,
}

impl RasterRenderer {
    pub fn new(width: u32, height: u32, scale_factor: f64) -> RenderResult<Self> {
        Ok(Self {
            pixmap: allocate(width, height, scale_factor)?,
            scale_factor,
            image_cache: HashMap::new(),
        })
    }

    pub fn for_viewport(viewport: Viewport) -> RenderResult<Self> {
        Self::new(viewport.width, viewport.height, viewport.scale_factor)
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Size of the pixmap in device pixels.
    pub fn device_size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    /// Straight (non-premultiplied) RGBA of a device pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Straight RGBA bytes of the whole pixmap, row-major.
    pub fn to_rgba(&self) -> Vec<u8> {
        demultiplied(&self.pixmap)
    }

    fn base_transform(&self) -> Transform {
        let s = self.scale_factor as f32;
        Transform::from_scale(s, s)
    }

    fn render_shape(&mut self, shape: &Shape, selected: bool) {
        if let Shape::Image(image) = shape {
            self.render_image(image, selected);
            return;
        }

        let style = shape.style();
        let paint = stroke_paint(style, shape.composite());
        let transform = self.base_transform();

        if let Some(path) = to_skia_path(&shape.to_path()) {
            self.pixmap
                .stroke_path(&path, &paint, &stroke_for(style), transform, None);
        }
        if let Some(fill) = shape.fill_path().as_ref().and_then(to_skia_path) {
            self.pixmap
                .fill_path(&fill, &paint, FillRule::Winding, transform, None);
        }
    }

    fn render_image(&mut self, image: &Image, selected: bool) {
        let transform = self.base_transform();
        let cached = self
            .image_cache
            .entry(image.id())
            .or_insert_with(|| match image.decode_rgba() {
                Ok(rgba) => {
                    debug!("Decoded image {} ({}x{})", image.id(), rgba.width(), rgba.height());
                    pixmap_from_rgba(&rgba).ok()
                }
                Err(e) => {
                    warn!("Failed to decode image {}: {e}", image.id());
                    None
                }
            });

        if let Some(source) = cached {
            let sx = (image.width / source.width() as f64) as f32;
            let sy = (image.height / source.height() as f64) as f32;
            let placement = transform
                .pre_translate(image.position.x as f32, image.position.y as f32)
                .pre_scale(sx, sy);
            let paint = PixmapPaint {
                quality: FilterQuality::Bilinear,
                ..Default::default()
            };
            self.pixmap
                .draw_pixmap(0, 0, source.as_ref(), &paint, placement, None);
        } else {
            self.render_image_placeholder(image, transform);
        }

        if selected {
            self.render_resize_handle(image, transform);
        }
    }

    /// Gray frame for images that could not be decoded.
    fn render_image_placeholder(&mut self, image: &Image, transform: Transform) {
        let Some(path) = to_skia_path(&image.frame_path()) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color_rgba8(160, 160, 160, 255);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: 1.0,
            ..Default::default()
        };
        self.pixmap.stroke_path(&path, &paint, &stroke, transform, None);
    }

    fn render_resize_handle(&mut self, image: &Image, transform: Transform) {
        let center = image.handle_center();
        let Some(circle) =
            PathBuilder::from_circle(center.x as f32, center.y as f32, HANDLE_RADIUS as f32)
        else {
            return;
        };

        let mut fill = Paint::default();
        fill.set_color_rgba8(255, 255, 255, 255);
        fill.anti_alias = true;
        self.pixmap
            .fill_path(&circle, &fill, FillRule::Winding, transform, None);

        let mut outline = Paint::default();
        outline.set_color_rgba8(0, 0, 0, 255);
        outline.anti_alias = true;
        let stroke = Stroke {
            width: 2.0,
            ..Default::default()
        };
        self.pixmap
            .stroke_path(&circle, &outline, &stroke, transform, None);
    }
}

impl Renderer for RasterRenderer {
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<()> {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);

        // Drop decoded pixels of images that are gone.
        self.image_cache
            .retain(|id, _| ctx.shapes.iter().any(|s| s.is_image() && s.id() == *id));

        for shape in ctx.shapes {
            let selected = ctx.selected_image == Some(shape.id());
            self.render_shape(shape, selected);
        }
        if let Some(live) = &ctx.live_shape {
            self.render_shape(live, false);
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32, scale_factor: f64) -> RenderResult<()> {
        self.pixmap = allocate(width, height, scale_factor)?;
        self.scale_factor = scale_factor;
        debug!(
            "Resized raster to {}x{} (scale {scale_factor})",
            self.pixmap.width(),
            self.pixmap.height()
        );
        Ok(())
    }
}

fn allocate(width: u32, height: u32, scale_factor: f64) -> RenderResult<Pixmap> {
    let device_width = (width as f64 * scale_factor).round() as u32;
    let device_height = (height as f64 * scale_factor).round() as u32;
    Pixmap::new(device_width, device_height).ok_or_else(|| {
        RendererError::Surface(format!(
            "Cannot allocate {device_width}x{device_height} pixmap"
        ))
    })
}

pub(crate) fn skia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn stroke_paint(style: &ShapeStyle, composite: Composite) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.anti_alias = true;
    match composite {
        Composite::Normal => paint.set_color(skia_color(style.color)),
        Composite::Erase => {
            // Destination-out only reads source alpha.
            paint.set_color_rgba8(0, 0, 0, 255);
            paint.blend_mode = BlendMode::DestinationOut;
        }
    }
    paint
}

fn stroke_for(style: &ShapeStyle) -> Stroke {
    Stroke {
        width: style.line_width as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    }
}

/// Convert a kurbo path. Returns `None` for paths with no drawable segment.
fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => {
                pb.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32)
            }
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

fn pixmap_from_rgba(rgba: &image::RgbaImage) -> RenderResult<Pixmap> {
    let (width, height) = rgba.dimensions();
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| RendererError::Decode(format!("Invalid image size {width}x{height}")))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

pub(crate) fn demultiplied(pixmap: &Pixmap) -> Vec<u8> {
    pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect()
}
