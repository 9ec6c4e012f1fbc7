//! Tool selection and in-progress shape construction.

use crate::config::{EngineConfig, MAX_LINE_WIDTH, MIN_LINE_WIDTH};
use crate::geometry::distance;
use crate::shapes::{Anchored, Color, Freehand, Shape, ShapeId, ShapeKind, ShapeStyle};
use kurbo::Point;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Available drawing tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Pencil,
    Eraser,
    Line,
    Arrow,
    Rectangle,
    Circle,
    Triangle,
    Star,
}

impl ToolKind {
    pub const ALL: [ToolKind; 8] = [
        ToolKind::Pencil,
        ToolKind::Eraser,
        ToolKind::Line,
        ToolKind::Arrow,
        ToolKind::Rectangle,
        ToolKind::Circle,
        ToolKind::Triangle,
        ToolKind::Star,
    ];

    /// Kind of shape this tool produces.
    pub fn shape_kind(self) -> ShapeKind {
        match self {
            ToolKind::Pencil => ShapeKind::Pencil,
            ToolKind::Eraser => ShapeKind::Eraser,
            ToolKind::Line => ShapeKind::Line,
            ToolKind::Arrow => ShapeKind::Arrow,
            ToolKind::Rectangle => ShapeKind::Rectangle,
            ToolKind::Circle => ShapeKind::Circle,
            ToolKind::Triangle => ShapeKind::Triangle,
            ToolKind::Star => ShapeKind::Star,
        }
    }

    pub fn name(self) -> &'static str {
        self.shape_kind().name()
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown tool: {s}"))
    }
}

/// Current tool, color and line width.
///
/// Selecting the eraser stashes the paint color and paints with the
/// background color at the eraser width; leaving the eraser restores the
/// paint color and resets the width to the default.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    tool: ToolKind,
    color: Color,
    line_width: f64,
    /// Paint color stashed while the eraser is active.
    paint_color: Option<Color>,
    default_line_width: f64,
    eraser_line_width: f64,
    background: Color,
    min_point_distance: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ToolSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            tool: ToolKind::default(),
            color: config.drawing.default_color,
            line_width: config.drawing.default_line_width,
            paint_color: None,
            default_line_width: config.drawing.default_line_width,
            eraser_line_width: config.drawing.eraser_line_width,
            background: config.canvas.background_color,
            min_point_distance: config.drawing.min_point_distance,
        }
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    pub fn min_point_distance(&self) -> f64 {
        self.min_point_distance
    }

    /// Style applied to the next shape.
    pub fn style(&self) -> ShapeStyle {
        ShapeStyle::new(self.color, self.line_width)
    }

    /// Switch tools, applying the eraser presets.
    pub fn select(&mut self, tool: ToolKind) {
        if tool == self.tool {
            return;
        }

        if tool == ToolKind::Eraser {
            self.paint_color = Some(self.color);
            self.color = self.background;
            self.line_width = self.eraser_line_width;
        } else {
            if let Some(paint) = self.paint_color.take() {
                self.color = paint;
            }
            self.line_width = self.default_line_width;
        }
        self.tool = tool;
        debug!("Selected tool {tool} ({}, width {})", self.color, self.line_width);
    }

    /// Set the paint color. While erasing, the stashed paint color is updated
    /// instead so the eraser keeps the background color.
    pub fn set_color(&mut self, color: Color) {
        match self.paint_color.as_mut() {
            Some(paint) if self.tool == ToolKind::Eraser => *paint = color,
            _ => self.color = color,
        }
    }

    /// Set the line width, clamped to 1 - 20. Non-finite widths are ignored.
    pub fn set_line_width(&mut self, width: f64) {
        if !width.is_finite() {
            warn!("Ignoring non-finite line width {width}");
            return;
        }
        self.line_width = width.clamp(MIN_LINE_WIDTH, MAX_LINE_WIDTH);
    }

    /// Open a shape buffer at `anchor` with the current tool and style.
    pub fn begin_shape(&self, anchor: Point) -> InProgressShape {
        InProgressShape::begin(self.tool, anchor, self.style())
            .with_min_distance(self.min_point_distance)
    }
}

/// A shape being drawn by an active gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct InProgressShape {
    id: ShapeId,
    tool: ToolKind,
    points: Vec<Point>,
    style: ShapeStyle,
    min_distance: f64,
}

impl InProgressShape {
    /// Open a buffer holding just `anchor`.
    pub fn begin(tool: ToolKind, anchor: Point, style: ShapeStyle) -> Self {
        Self::from_points(tool, vec![anchor], style)
    }

    /// Buffer with arbitrary points, bypassing the gesture rules.
    pub fn from_points(tool: ToolKind, points: Vec<Point>, style: ShapeStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            tool,
            points,
            style,
            min_distance: 0.0,
        }
    }

    /// Skip path points closer than `distance` to the previous one.
    pub fn with_min_distance(mut self, distance: f64) -> Self {
        self.min_distance = distance.max(0.0);
        self
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Record a pointer position.
    ///
    /// Path tools append (subject to decimation); two-point tools set or
    /// replace the endpoint.
    pub fn extend(&mut self, point: Point) {
        if self.tool.shape_kind().is_path() {
            let too_close = self
                .points
                .last()
                .is_some_and(|last| distance(*last, point) < self.min_distance);
            if !too_close {
                self.points.push(point);
            }
        } else {
            self.points.truncate(1);
            self.points.push(point);
        }
    }

    /// The shape as it would render right now, if it is renderable.
    pub fn preview(&self) -> Option<Shape> {
        self.build()
    }

    /// Finish the gesture. Returns `None` when the point count is invalid.
    pub fn commit(self) -> Option<Shape> {
        let shape = self.build();
        if shape.is_none() {
            debug!(
                "Dropping {} with {} point(s)",
                self.tool,
                self.points.len()
            );
        }
        shape
    }

    fn build(&self) -> Option<Shape> {
        let freehand = |wrap: fn(Freehand) -> Shape| {
            if self.points.is_empty() {
                return None;
            }
            let mut path = Freehand::new(self.points.clone(), self.style);
            path.id = self.id;
            Some(wrap(path))
        };
        let two_point = |wrap: fn(Anchored) -> Shape| {
            let &[anchor, end] = self.points.as_slice() else {
                return None;
            };
            let mut shape = Anchored::new(anchor, end, self.style);
            shape.id = self.id;
            Some(wrap(shape))
        };

        match self.tool {
            ToolKind::Pencil => freehand(Shape::Pencil),
            ToolKind::Eraser => freehand(Shape::Eraser),
            ToolKind::Line => two_point(Shape::Line),
            ToolKind::Arrow => two_point(Shape::Arrow),
            ToolKind::Rectangle => two_point(Shape::Rectangle),
            ToolKind::Circle => two_point(Shape::Circle),
            ToolKind::Triangle => two_point(Shape::Triangle),
            ToolKind::Star => two_point(Shape::Star),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> ShapeStyle {
        ShapeStyle::new(Color::from_hex("#ff0000").unwrap(), 3.0)
    }

    #[test]
    fn test_tool_from_str() {
        assert_eq!("rectangle".parse::<ToolKind>(), Ok(ToolKind::Rectangle));
        assert_eq!("Star".parse::<ToolKind>(), Ok(ToolKind::Star));
        assert!("lasso".parse::<ToolKind>().is_err());
    }

    #[test]
    fn test_two_point_commit_requires_exactly_two_points() {
        for tool in ToolKind::ALL.into_iter().filter(|t| t.shape_kind().is_two_point()) {
            let one = InProgressShape::begin(tool, Point::new(1.0, 1.0), style());
            assert_eq!(one.commit(), None, "{tool} committed with one point");

            let none = InProgressShape::from_points(tool, Vec::new(), style());
            assert_eq!(none.commit(), None);

            let three = InProgressShape::from_points(
                tool,
                vec![Point::ZERO, Point::new(1.0, 1.0), Point::new(2.0, 2.0)],
                style(),
            );
            assert_eq!(three.commit(), None);

            let mut two = InProgressShape::begin(tool, Point::ZERO, style());
            two.extend(Point::new(5.0, 5.0));
            let shape = two.commit().unwrap();
            assert_eq!(shape.kind(), tool.shape_kind());
        }
    }

    #[test]
    fn test_path_commit_requires_a_point() {
        for tool in [ToolKind::Pencil, ToolKind::Eraser] {
            let empty = InProgressShape::from_points(tool, Vec::new(), style());
            assert_eq!(empty.commit(), None);

            let single = InProgressShape::begin(tool, Point::new(3.0, 3.0), style());
            let shape = single.commit().unwrap();
            assert_eq!(shape.kind(), tool.shape_kind());
            assert_eq!(shape.points(), vec![Point::new(3.0, 3.0)]);
        }
    }

    #[test]
    fn test_two_point_extend_replaces_endpoint() {
        let mut rect = InProgressShape::begin(ToolKind::Rectangle, Point::new(10.0, 10.0), style());
        rect.extend(Point::new(50.0, 10.0));
        rect.extend(Point::new(50.0, 50.0));
        assert_eq!(rect.points(), &[Point::new(10.0, 10.0), Point::new(50.0, 50.0)]);
    }

    #[test]
    fn test_pencil_decimation() {
        let mut stroke = InProgressShape::begin(ToolKind::Pencil, Point::ZERO, style())
            .with_min_distance(2.0);
        stroke.extend(Point::new(1.0, 0.0));
        stroke.extend(Point::new(2.0, 0.0));
        stroke.extend(Point::new(3.0, 0.0));
        stroke.extend(Point::new(5.0, 0.0));
        assert_eq!(
            stroke.points(),
            &[Point::ZERO, Point::new(2.0, 0.0), Point::new(5.0, 0.0)]
        );

        let mut raw = InProgressShape::begin(ToolKind::Pencil, Point::ZERO, style());
        raw.extend(Point::new(0.5, 0.0));
        raw.extend(Point::new(0.5, 0.0));
        assert_eq!(raw.points().len(), 3);
    }

    #[test]
    fn test_preview_keeps_identity_on_commit() {
        let mut line = InProgressShape::begin(ToolKind::Line, Point::ZERO, style());
        assert!(line.preview().is_none());
        line.extend(Point::new(4.0, 4.0));
        let preview = line.preview().unwrap();
        let committed = line.commit().unwrap();
        assert_eq!(preview, committed);
    }

    #[test]
    fn test_eraser_presets() {
        let mut tools = ToolSettings::default();
        tools.set_color(Color::from_hex("#ff0000").unwrap());
        tools.set_line_width(5.0);

        tools.select(ToolKind::Eraser);
        assert_eq!(tools.color(), Color::white());
        assert_eq!(tools.line_width(), 20.0);

        tools.select(ToolKind::Circle);
        assert_eq!(tools.color(), Color::from_hex("#ff0000").unwrap());
        assert_eq!(tools.line_width(), 2.0);
    }

    #[test]
    fn test_color_change_while_erasing_applies_after() {
        let mut tools = ToolSettings::default();
        tools.select(ToolKind::Eraser);
        tools.set_color(Color::from_hex("#00ff00").unwrap());
        assert_eq!(tools.color(), Color::white());

        tools.select(ToolKind::Pencil);
        assert_eq!(tools.color(), Color::from_hex("#00ff00").unwrap());
    }

    #[test]
    fn test_line_width_is_clamped() {
        let mut tools = ToolSettings::default();
        tools.set_line_width(0.0);
        assert_eq!(tools.line_width(), 1.0);
        tools.set_line_width(64.0);
        assert_eq!(tools.line_width(), 20.0);
        tools.set_line_width(f64::NAN);
        assert_eq!(tools.line_width(), 20.0);
    }

    #[test]
    fn test_begin_shape_uses_current_style() {
        let mut tools = ToolSettings::default();
        tools.select(ToolKind::Rectangle);
        tools.set_color(Color::from_hex("#ff0000").unwrap());
        tools.set_line_width(3.0);

        let shape = tools.begin_shape(Point::new(10.0, 10.0));
        assert_eq!(shape.tool(), ToolKind::Rectangle);
        assert_eq!(shape.style, style());
    }
}
