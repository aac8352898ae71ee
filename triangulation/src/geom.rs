//! Planar geometry predicates used by the trapezoidation and the
//! simple-polygon check.
//!
//! Everything is built on the orientation sign of a point triple, with exact
//! comparisons. Ties (collinear triples, points with equal coordinates on one
//! axis) are resolved by the callers with symbolic perturbation, not here.

use crate::math::{point, Point, Rect, Vector};

/// Turn direction of the triple `(p1, p2, p3)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Orientation {
    Clockwise,
    CounterClockwise,
    Collinear,
}

/// Orientation of the point triple `(p1, p2, p3)`.
pub fn orientation(p1: Point, p2: Point, p3: Point) -> Orientation {
    let val = (p2.y - p1.y) * (p3.x - p2.x) - (p2.x - p1.x) * (p3.y - p2.y);

    if val == 0.0 {
        Orientation::Collinear
    } else if val > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

/// Whether `pt` lies inside the axis-aligned bounding box of `a` and `b`.
pub fn is_within_bounds(pt: Point, a: Point, b: Point) -> bool {
    let min_x = a.x.min(b.x);
    let max_x = a.x.max(b.x);
    let min_y = a.y.min(b.y);
    let max_y = a.y.max(b.y);

    pt.x >= min_x && pt.x <= max_x && pt.y >= min_y && pt.y <= max_y
}

/// Whether `pt` lies on the closed segment `[start, end]`.
pub fn is_point_on_segment(pt: Point, start: Point, end: Point) -> bool {
    orientation(start, end, pt) == Orientation::Collinear && is_within_bounds(pt, start, end)
}

/// The classic four-orientation segment intersection test, endpoints
/// included.
pub fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let or1 = orientation(a1, a2, b1);
    let or2 = orientation(a1, a2, b2);
    let or3 = orientation(b1, b2, a1);
    let or4 = orientation(b1, b2, a2);

    if or1 != or2 && or3 != or4 {
        return true;
    }

    if or1 == Orientation::Collinear && is_within_bounds(b1, a1, a2) {
        return true;
    }

    if or2 == Orientation::Collinear && is_within_bounds(b2, a1, a2) {
        return true;
    }

    if or3 == Orientation::Collinear && is_within_bounds(a1, b1, b2) {
        return true;
    }

    if or4 == Orientation::Collinear && is_within_bounds(a2, b1, b2) {
        return true;
    }

    false
}

/// Segment intersection test for segments that may legitimately share an
/// endpoint (consecutive outline edges).
///
/// Returns false when the segments touch only at a shared endpoint and
/// otherwise stay apart. Collinear segments sharing an endpoint still
/// intersect if they overlap past that endpoint.
pub fn segments_intersect_excluding_endpoints(
    a1: Point,
    a2: Point,
    b1: Point,
    b2: Point,
) -> bool {
    let or1 = orientation(a1, a2, b1);
    let or2 = orientation(a1, a2, b2);
    let or3 = orientation(b1, b2, a1);
    let or4 = orientation(b1, b2, a2);

    if or1 != or2 && or3 != or4 {
        if or1 == Orientation::Collinear {
            if b1 == a1 || b1 == a2 {
                return false;
            }
        } else if or2 == Orientation::Collinear {
            if b2 == a1 || b2 == a2 {
                return false;
            }
        }

        if or3 == Orientation::Collinear {
            if a1 == b1 || a1 == b2 {
                return false;
            }
        } else if or4 == Orientation::Collinear {
            if a2 == b1 || a2 == b2 {
                return false;
            }
        }

        return true;
    }

    if or1 == Orientation::Collinear && is_within_bounds(b1, a1, a2) {
        if or2 == Orientation::Collinear {
            // Both segments on the same line. They overlap if they extend in
            // the same direction away from the shared endpoint.
            if b1 == a1 && (a2 - a1).dot(b2 - a1) > 0.0 {
                return true;
            }
            if b1 == a2 && (a1 - a2).dot(b2 - a2) > 0.0 {
                return true;
            }
        } else if b1 != a1 && b1 != a2 {
            return true;
        }
    }

    if or2 == Orientation::Collinear && is_within_bounds(b2, a1, a2) {
        if or1 == Orientation::Collinear {
            if b2 == a1 && (a2 - a1).dot(b1 - a1) > 0.0 {
                return true;
            }
            if b2 == a2 && (a1 - a2).dot(b1 - a2) > 0.0 {
                return true;
            }
        } else if b2 != a1 && b2 != a2 {
            return true;
        }
    }

    if or3 == Orientation::Collinear && is_within_bounds(a1, b1, b2) {
        if or4 == Orientation::Collinear {
            if a1 == b1 && (b2 - b1).dot(a2 - b1) > 0.0 {
                return true;
            }
            if a1 == b2 && (b1 - b2).dot(a2 - b2) > 0.0 {
                return true;
            }
        } else if a1 != b1 && a1 != b2 {
            return true;
        }
    }

    if or4 == Orientation::Collinear && is_within_bounds(a2, b1, b2) {
        if or3 == Orientation::Collinear {
            if a2 == b1 && (b2 - b1).dot(a1 - b1) > 0.0 {
                return true;
            }
            if a2 == b2 && (b1 - b2).dot(a1 - b2) > 0.0 {
                return true;
            }
        } else if a2 != b1 && a2 != b2 {
            return true;
        }
    }

    false
}

/// Whether the segment `[p1, p2]` touches the rectangle.
pub fn segment_intersects_rect(p1: Point, p2: Point, rect: &Rect) -> bool {
    if rect.contains(p1) || rect.contains(p2) {
        return true;
    }

    let min = point(rect.min_x(), rect.min_y());
    let max = point(rect.max_x(), rect.max_y());

    segments_intersect(p1, p2, min, point(max.x, min.y))
        || segments_intersect(p1, p2, point(max.x, min.y), max)
        || segments_intersect(p1, p2, max, point(min.x, max.y))
        || segments_intersect(p1, p2, point(min.x, max.y), min)
}

/// Average of a point set.
pub fn centroid(points: &[Point]) -> Point {
    let mut result = point(0.0, 0.0);
    let n = points.len() as f32;

    for pt in points {
        result.x += pt.x / n;
        result.y += pt.y / n;
    }

    result
}

/// A line in implicit form `a*x + b*y + c = 0`.
///
/// `(a, b)` is the unit normal (the edge direction rotated 90° counter
/// clockwise), so the signed distance of a point to the line is simply
/// `a*x + b*y + c`, positive on the left side of the edge.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Line {
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl Line {
    /// Line through `p1` and `p2`, oriented from `p1` towards `p2`.
    pub fn from_points(p1: Point, p2: Point) -> Self {
        Self::from_point_and_direction(p1, p2 - p1)
    }

    /// Line through `p` with the given direction.
    pub fn from_point_and_direction(p: Point, dir: Vector) -> Self {
        let normal = vector_rotated_90_ccw(dir).normalize();
        Line {
            a: normal.x,
            b: normal.y,
            c: -(normal.x * p.x + normal.y * p.y),
        }
    }

    /// Signed distance from `p` to the line, positive on the left side.
    #[inline]
    pub fn signed_distance_to(&self, p: Point) -> f32 {
        self.a * p.x + self.b * p.y + self.c
    }

    /// Intersection of two lines, or `None` if they are parallel.
    pub fn intersection(&self, other: &Line) -> Option<Point> {
        let denom = self.b * other.a - other.b * self.a;
        if denom == 0.0 {
            return None;
        }

        Some(point(
            (self.c * other.b - other.c * self.b) / denom,
            (self.c * other.a - other.c * self.a) / -denom,
        ))
    }
}

#[inline]
fn vector_rotated_90_ccw(v: Vector) -> Vector {
    crate::math::vector(-v.y, v.x)
}

#[test]
fn test_orientation() {
    let a = point(0.0, 0.0);
    let b = point(1.0, 0.0);

    assert_eq!(
        orientation(a, b, point(2.0, 0.0)),
        Orientation::Collinear
    );
    assert_eq!(
        orientation(a, b, point(1.0, 1.0)),
        Orientation::CounterClockwise
    );
    assert_eq!(orientation(a, b, point(1.0, -1.0)), Orientation::Clockwise);
}

#[test]
fn test_segments_intersect() {
    // Crossing.
    assert!(segments_intersect(
        point(0.0, 0.0),
        point(2.0, 2.0),
        point(0.0, 2.0),
        point(2.0, 0.0),
    ));
    // Disjoint.
    assert!(!segments_intersect(
        point(0.0, 0.0),
        point(1.0, 0.0),
        point(0.0, 1.0),
        point(1.0, 1.0),
    ));
    // Touching at an endpoint counts for the inclusive test...
    assert!(segments_intersect(
        point(0.0, 0.0),
        point(1.0, 0.0),
        point(1.0, 0.0),
        point(2.0, 1.0),
    ));
    // ...but not for the adjacency-aware one.
    assert!(!segments_intersect_excluding_endpoints(
        point(0.0, 0.0),
        point(1.0, 0.0),
        point(1.0, 0.0),
        point(2.0, 1.0),
    ));
    // Collinear overlap past a shared endpoint is still an intersection.
    assert!(segments_intersect_excluding_endpoints(
        point(0.0, 0.0),
        point(2.0, 0.0),
        point(2.0, 0.0),
        point(1.0, 0.0),
    ));
    // Collinear continuation away from the shared endpoint is not.
    assert!(!segments_intersect_excluding_endpoints(
        point(0.0, 0.0),
        point(1.0, 0.0),
        point(1.0, 0.0),
        point(2.0, 0.0),
    ));
}

#[test]
fn test_point_on_segment() {
    let a = point(0.0, 0.0);
    let b = point(2.0, 2.0);

    assert!(is_point_on_segment(point(1.0, 1.0), a, b));
    assert!(is_point_on_segment(a, a, b));
    assert!(!is_point_on_segment(point(3.0, 3.0), a, b));
    assert!(!is_point_on_segment(point(1.0, 0.0), a, b));
}

#[test]
fn test_segment_rect_intersection() {
    let rect = Rect::new(point(0.0, 0.0), euclid::default::Size2D::new(2.0, 2.0));

    // Endpoint inside.
    assert!(segment_intersects_rect(point(1.0, 1.0), point(5.0, 5.0), &rect));
    // Crossing without an endpoint inside.
    assert!(segment_intersects_rect(point(-1.0, 1.0), point(3.0, 1.0), &rect));
    // Fully outside.
    assert!(!segment_intersects_rect(point(3.0, 3.0), point(5.0, 3.0), &rect));
}

#[test]
fn test_line() {
    let line = Line::from_points(point(0.0, 0.0), point(2.0, 0.0));
    assert!(line.signed_distance_to(point(1.0, 1.0)) > 0.0);
    assert!(line.signed_distance_to(point(1.0, -1.0)) < 0.0);
    assert_eq!(line.signed_distance_to(point(5.0, 0.0)), 0.0);

    let vertical = Line::from_point_and_direction(point(1.0, 0.0), crate::math::vector(0.0, 1.0));
    let crossing = line.intersection(&vertical).unwrap();
    assert_eq!(crossing, point(1.0, 0.0));

    assert!(vertical
        .intersection(&Line::from_point_and_direction(
            point(3.0, 0.0),
            crate::math::vector(0.0, 1.0),
        ))
        .is_none());
}

#[test]
fn test_centroid() {
    let pts = [
        point(0.0, 0.0),
        point(2.0, 0.0),
        point(2.0, 2.0),
        point(0.0, 2.0),
    ];
    assert_eq!(centroid(&pts), point(1.0, 1.0));
}
