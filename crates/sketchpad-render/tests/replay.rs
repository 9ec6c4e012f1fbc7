use image::{DynamicImage, Rgba, RgbaImage};
use kurbo::Point;
use sketchpad_core::controller::PointerEvent;
use sketchpad_core::tools::ToolKind;
use sketchpad_core::{DrawingSurface, EngineConfig, ShapeKind};
use sketchpad_render::{RasterRenderer, RenderContext, Renderer};
use std::io::Cursor;

fn surface(width: u32, height: u32) -> DrawingSurface {
    let mut config = EngineConfig::default();
    config.canvas.width = width;
    config.canvas.height = height;
    config.drawing.min_point_distance = 0.0;
    DrawingSurface::new(config)
}

fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)))
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn stroke(surface: &mut DrawingSurface, points: &[Point]) {
    surface.handle_pointer(PointerEvent::Down(points[0]));
    for p in &points[1..] {
        surface.handle_pointer(PointerEvent::Move(*p));
    }
    surface.handle_pointer(PointerEvent::Up(points[points.len() - 1]));
}

fn render(renderer: &mut RasterRenderer, surface: &DrawingSurface) -> Vec<u8> {
    renderer.render(&RenderContext::for_surface(surface)).unwrap();
    renderer.to_rgba()
}

#[test]
fn test_render_is_idempotent() {
    let mut surface = surface(120, 120);
    surface.upload_image(&solid_png(30, 20, [0, 128, 255, 255]), Some(Point::new(60.0, 60.0))).unwrap();
    for tool in [ToolKind::Star, ToolKind::Circle, ToolKind::Arrow, ToolKind::Triangle] {
        surface.select_tool(tool);
        stroke(&mut surface, &[Point::new(40.0, 40.0), Point::new(70.0, 55.0)]);
    }
    surface.select_tool(ToolKind::Eraser);
    stroke(&mut surface, &[Point::new(0.0, 0.0), Point::new(120.0, 120.0)]);
    // Select the image so the handle is drawn too.
    surface.handle_pointer(PointerEvent::Down(Point::new(65.0, 65.0)));
    assert!(surface.selected_image().is_some());

    let mut renderer = RasterRenderer::for_viewport(surface.viewport()).unwrap();
    let first = render(&mut renderer, &surface);
    let second = render(&mut renderer, &surface);
    assert_eq!(first, second);
    assert!(first.iter().any(|b| *b != 0));
}

#[test]
fn test_resize_replays_stroke_at_same_logical_points() {
    let mut surface = surface(100, 100);
    surface.set_color("#ff0000").unwrap();
    surface.set_line_width(4.0);
    let points = [
        Point::new(10.0, 50.0),
        Point::new(30.0, 50.0),
        Point::new(50.0, 50.0),
        Point::new(70.0, 50.0),
        Point::new(90.0, 50.0),
    ];
    stroke(&mut surface, &points);
    assert_eq!(surface.shapes()[0].points(), points.to_vec());

    let mut renderer = RasterRenderer::for_viewport(surface.viewport()).unwrap();
    render(&mut renderer, &surface);
    assert_eq!(renderer.pixel(50, 50), Some([255, 0, 0, 255]));

    surface.resize(100, 100, 2.0);
    let viewport = surface.viewport();
    renderer
        .resize(viewport.width, viewport.height, viewport.scale_factor)
        .unwrap();
    render(&mut renderer, &surface);

    // Same shape list, same logical coordinates.
    assert_eq!(surface.len(), 1);
    assert_eq!(surface.shapes()[0].points(), points.to_vec());
    assert_eq!(renderer.device_size(), (200, 200));
    for p in &points[1..4] {
        let (x, y) = ((p.x * 2.0) as u32, (p.y * 2.0) as u32);
        assert_eq!(renderer.pixel(x, y), Some([255, 0, 0, 255]), "missing stroke at {p:?}");
    }
    assert_eq!(renderer.pixel(100, 60).map(|p| p[3]), Some(0));
}

#[test]
fn test_image_drawn_at_display_size() {
    let mut surface = surface(200, 200);
    let id = surface
        .upload_image(&solid_png(20, 20, [0, 255, 0, 255]), Some(Point::new(10.0, 10.0)))
        .unwrap();

    // Drag the handle out to 60x60.
    stroke(&mut surface, &[Point::new(30.0, 30.0), Point::new(70.0, 70.0)]);
    let image = surface.get_shape(id).and_then(|s| s.as_image()).unwrap();
    assert_eq!((image.width, image.height), (60.0, 60.0));
    assert_eq!(surface.shapes().len(), 1);
    assert_eq!(surface.shapes()[0].kind(), ShapeKind::Image);

    let mut renderer = RasterRenderer::for_viewport(surface.viewport()).unwrap();
    render(&mut renderer, &surface);
    assert_eq!(renderer.pixel(40, 40), Some([0, 255, 0, 255]));
    // Selected: handle fill is white at the corner.
    assert_eq!(renderer.pixel(70, 70), Some([255, 255, 255, 255]));
    assert_eq!(renderer.pixel(100, 100).map(|p| p[3]), Some(0));
}
