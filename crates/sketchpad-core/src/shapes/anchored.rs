//! Shapes defined by two anchor points (line, arrow, rectangle, circle,
//! triangle, star).

use super::{ShapeId, ShapeStyle};
use crate::geometry::{
    arrowhead, distance, star_vertices, triangle_from_bounding_corners, ARROWHEAD_LENGTH,
    STAR_INNER_RATIO, STAR_SPIKES,
};
use kurbo::{BezPath, Circle, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tolerance used when flattening curves into a path.
const PATH_TOLERANCE: f64 = 0.1;

/// A shape spanned by an anchor point and a drag endpoint.
///
/// The anchor is the origin (line start, rectangle corner) or the center
/// (circle, star); the end point defines size and orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchored {
    pub(crate) id: ShapeId,
    /// First recorded point.
    pub anchor: Point,
    /// Drag endpoint.
    pub end: Point,
    /// Style properties.
    pub style: ShapeStyle,
}

impl Anchored {
    pub fn new(anchor: Point, end: Point, style: ShapeStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            anchor,
            end,
            style,
        }
    }

    /// Distance from anchor to end (circle and star radius).
    pub fn radius(&self) -> f64 {
        distance(self.anchor, self.end)
    }

    /// Axis-aligned box spanned by both points, normalized so width and
    /// height are never negative.
    pub fn as_rect(&self) -> Rect {
        Rect::from_points(self.anchor, self.end)
    }

    pub fn line_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.anchor);
        path.line_to(self.end);
        path
    }

    pub fn rectangle_path(&self) -> BezPath {
        self.as_rect().to_path(PATH_TOLERANCE)
    }

    pub fn circle_path(&self) -> BezPath {
        Circle::new(self.anchor, self.radius()).to_path(PATH_TOLERANCE)
    }

    pub fn triangle_path(&self) -> BezPath {
        polygon(&triangle_from_bounding_corners(self.anchor, self.end))
    }

    pub fn star_path(&self) -> BezPath {
        let outer = self.radius();
        polygon(&star_vertices(
            self.anchor,
            outer,
            outer * STAR_INNER_RATIO,
            STAR_SPIKES,
        ))
    }

    /// Closed arrowhead at the end point.
    pub fn arrowhead_path(&self) -> BezPath {
        polygon(&arrowhead(self.anchor, self.end, ARROWHEAD_LENGTH))
    }
}

/// Closed polygon through the given vertices.
fn polygon(vertices: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let Some((first, rest)) = vertices.split_first() else {
        return path;
    };
    path.move_to(*first);
    for v in rest {
        path.line_to(*v);
    }
    path.close_path();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;

    fn anchored(x0: f64, y0: f64, x1: f64, y1: f64) -> Anchored {
        Anchored::new(Point::new(x0, y0), Point::new(x1, y1), ShapeStyle::default())
    }

    #[test]
    fn test_rect_normalizes_negative_extent() {
        let dragged_back = anchored(50.0, 50.0, 10.0, 20.0);
        let rect = dragged_back.as_rect();
        assert!((rect.x0 - 10.0).abs() < f64::EPSILON);
        assert!((rect.y0 - 20.0).abs() < f64::EPSILON);
        assert!((rect.width() - 40.0).abs() < f64::EPSILON);
        assert!((rect.height() - 30.0).abs() < f64::EPSILON);

        assert_eq!(
            dragged_back.rectangle_path().bounding_box(),
            anchored(10.0, 20.0, 50.0, 50.0).rectangle_path().bounding_box()
        );
    }

    #[test]
    fn test_circle_radius() {
        let circle = anchored(0.0, 0.0, 30.0, 40.0);
        assert!((circle.radius() - 50.0).abs() < f64::EPSILON);

        let bounds = circle.circle_path().bounding_box();
        assert!((bounds.width() - 100.0).abs() < 0.1);
        assert!((bounds.height() - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_triangle_path_is_closed() {
        let path = anchored(10.0, 10.0, 50.0, 40.0).triangle_path();
        let elements = path.elements();
        assert_eq!(elements.len(), 4);
        assert_eq!(elements[0], PathEl::MoveTo(Point::new(10.0, 40.0)));
        assert_eq!(elements[3], PathEl::ClosePath);
    }

    #[test]
    fn test_star_path_has_ten_vertices() {
        let path = anchored(0.0, 0.0, 10.0, 0.0).star_path();
        let vertices = path
            .elements()
            .iter()
            .filter(|el| matches!(el, PathEl::MoveTo(_) | PathEl::LineTo(_)))
            .count();
        assert_eq!(vertices, 10);
        assert_eq!(path.elements().last(), Some(&PathEl::ClosePath));
    }

    #[test]
    fn test_arrowhead_tip_at_end() {
        let arrow = anchored(0.0, 0.0, 100.0, 0.0);
        let path = arrow.arrowhead_path();
        assert_eq!(path.elements()[0], PathEl::MoveTo(Point::new(100.0, 0.0)));
    }
}
