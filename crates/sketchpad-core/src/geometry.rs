//! Geometry primitives used to build shape outlines.
//!
//! All functions are pure and operate in surface-local logical coordinates.

use kurbo::{Point, Vec2};
use std::f64::consts::PI;

/// Number of spikes on a star shape.
pub const STAR_SPIKES: usize = 5;

/// Inner radius of a star as a fraction of its outer radius.
pub const STAR_INNER_RATIO: f64 = 0.4;

/// Length of the arrowhead legs in pixels.
pub const ARROWHEAD_LENGTH: f64 = 20.0;

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    (b - a).hypot()
}

/// Angle of the vector from `a` to `b` in radians.
pub fn angle_of(a: Point, b: Point) -> f64 {
    (b.y - a.y).atan2(b.x - a.x)
}

/// Vertices of a star polygon.
///
/// Returns `2 * spike_count` points alternating between the outer and inner
/// radius, starting at angle 0 and stepping by `PI / spike_count`. The polygon
/// is closed implicitly, so the first point is not repeated.
///
/// Returns an empty list when `spike_count < 2`.
pub fn star_vertices(
    center: Point,
    outer_radius: f64,
    inner_radius: f64,
    spike_count: usize,
) -> Vec<Point> {
    if spike_count < 2 {
        return Vec::new();
    }

    let step = PI / spike_count as f64;
    (0..spike_count * 2)
        .map(|i| {
            let radius = if i % 2 == 0 { outer_radius } else { inner_radius };
            let angle = step * i as f64;
            center + Vec2::new(angle.cos() * radius, angle.sin() * radius)
        })
        .collect()
}

/// Isoceles triangle inscribed in the box spanned by two opposite corners.
///
/// The base runs along `p2.y` from `p1.x` to `p2.x`; the apex sits at `p1.y`,
/// centered horizontally between the two corners.
pub fn triangle_from_bounding_corners(p1: Point, p2: Point) -> [Point; 3] {
    [
        Point::new(p1.x, p2.y),
        Point::new(p2.x, p2.y),
        Point::new((p1.x + p2.x) / 2.0, p1.y),
    ]
}

/// V-shaped arrowhead at `end`, oriented along the segment `start -> end`.
///
/// Returns the tip followed by the two barb points, each `length` away from
/// the tip at +/-30 degrees from the segment.
pub fn arrowhead(start: Point, end: Point, length: f64) -> [Point; 3] {
    let angle = angle_of(start, end);
    let barb = |offset: f64| {
        Point::new(
            end.x - length * (angle + offset).cos(),
            end.y - length * (angle + offset).sin(),
        )
    };
    [end, barb(-PI / 6.0), barb(PI / 6.0)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_distance() {
        assert!(approx(distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 5.0));
        assert!(approx(distance(Point::new(2.0, 2.0), Point::new(2.0, 2.0)), 0.0));
    }

    #[test]
    fn test_angle_of() {
        assert!(approx(angle_of(Point::ZERO, Point::new(1.0, 0.0)), 0.0));
        assert!(approx(angle_of(Point::ZERO, Point::new(0.0, 1.0)), PI / 2.0));
        assert!(approx(angle_of(Point::ZERO, Point::new(-1.0, 0.0)), PI));
    }

    #[test]
    fn test_star_vertices_alternate() {
        let center = Point::new(50.0, 50.0);
        let vertices = star_vertices(center, 20.0, 8.0, 5);
        assert_eq!(vertices.len(), 10);

        for (i, v) in vertices.iter().enumerate() {
            let expected = if i % 2 == 0 { 20.0 } else { 8.0 };
            assert!(approx(distance(center, *v), expected));
        }

        // First vertex lies on the positive x axis.
        assert!(approx(vertices[0].x, 70.0));
        assert!(approx(vertices[0].y, 50.0));
    }

    #[test]
    fn test_star_vertices_rejects_degenerate_spike_count() {
        assert!(star_vertices(Point::ZERO, 10.0, 4.0, 1).is_empty());
        assert!(star_vertices(Point::ZERO, 10.0, 4.0, 0).is_empty());
        assert_eq!(star_vertices(Point::ZERO, 10.0, 4.0, 2).len(), 4);
    }

    #[test]
    fn test_triangle_from_bounding_corners() {
        let [a, b, c] = triangle_from_bounding_corners(Point::new(10.0, 10.0), Point::new(50.0, 40.0));
        assert_eq!(a, Point::new(10.0, 40.0));
        assert_eq!(b, Point::new(50.0, 40.0));
        assert_eq!(c, Point::new(30.0, 10.0));
    }

    #[test]
    fn test_arrowhead_points_back_along_segment() {
        let [tip, left, right] = arrowhead(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 20.0);
        assert_eq!(tip, Point::new(100.0, 0.0));
        // Both barbs sit behind the tip and mirror each other across the segment.
        assert!(left.x < 100.0 && right.x < 100.0);
        assert!(approx(left.y, -right.y));
        assert!(approx(distance(tip, left), 20.0));
        assert!(approx(distance(tip, right), 20.0));
    }
}
