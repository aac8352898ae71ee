//! The input model: outlines flattened into one point array, one segment per
//! outline edge, and per-point adjacency back into the segment list.

use crate::geom::Line;
use crate::math::Point;
use crate::store::NodeId;
use crate::{Outline, PointId, SegmentId, Winding};

/// Where a query point sits in the vertical order relative to another point.
///
/// Two points never compare equal: a tie on `y` is broken by `x`, so the
/// vertical order is a total order over distinct points. This symbolic
/// perturbation is what keeps horizontal edges from producing degenerate
/// trapezoids.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum VerticalRelation {
    Above,
    Below,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum HorizontalRelation {
    Left,
    Right,
}

pub(crate) fn vertical_relation(query: Point, in_relation_to: Point) -> VerticalRelation {
    if query.y < in_relation_to.y {
        VerticalRelation::Below
    } else if query.y > in_relation_to.y {
        VerticalRelation::Above
    } else if query.x < in_relation_to.x {
        VerticalRelation::Below
    } else {
        VerticalRelation::Above
    }
}

pub(crate) fn horizontal_relation(query: Point, in_relation_to: Point) -> HorizontalRelation {
    if query.x < in_relation_to.x {
        HorizontalRelation::Left
    } else if query.x > in_relation_to.x {
        HorizontalRelation::Right
    } else if query.y < in_relation_to.y {
        HorizontalRelation::Left
    } else {
        HorizontalRelation::Right
    }
}

/// One outline edge with its endpoints classified along both axes.
#[derive(Copy, Clone, Debug)]
pub struct Segment {
    /// Endpoint that is above the other in the vertical order.
    pub upper: PointId,
    pub lower: PointId,
    /// Endpoint that is left of the other in the horizontal order.
    pub left: PointId,
    pub right: PointId,
    /// Implicit line through the segment, oriented from `lower` to `upper`.
    pub line: Line,
    /// True when the outline traversal visits the lower endpoint first.
    pub upward: bool,
}

/// A point's reference to one of its two incident segments.
#[derive(Copy, Clone, Debug)]
pub(crate) struct PointSegment {
    pub segment: SegmentId,
    /// True when the point is the segment's left endpoint.
    pub left_end: bool,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct PointData {
    /// The two segments meeting at this point, in outline order.
    pub segments: [Option<PointSegment>; 2],
    /// The search-structure node holding this point once inserted.
    pub node: Option<NodeId>,
}

/// The flattened input polygon.
pub(crate) struct PolygonData {
    pub positions: Vec<Point>,
    pub points: Vec<PointData>,
    pub segments: Vec<Segment>,
    pub windings: Vec<Winding>,
    /// False when some outline has fewer than three vertices.
    pub valid: bool,
}

impl PolygonData {
    pub fn new(outlines: &[Outline]) -> Self {
        let mut positions = Vec::new();
        let mut valid = true;

        for outline in outlines {
            if outline.len() < 3 {
                valid = false;
            }
            positions.extend_from_slice(outline);
        }

        let num_points = positions.len();
        let mut points = vec![PointData::default(); num_points];
        let mut segments = Vec::with_capacity(num_points);
        let mut windings = Vec::with_capacity(outlines.len());

        let mut base = 0;
        for outline in outlines {
            let mut winding_sum = 0.0;

            for j in 0..outline.len() {
                let a = base + j;
                let b = base + (j + 1) % outline.len();
                let pt_a = positions[a];
                let pt_b = positions[b];

                winding_sum += (pt_b.x - pt_a.x) * (pt_b.y + pt_a.y);

                let (lower, upper, upward) =
                    if vertical_relation(pt_a, pt_b) == VerticalRelation::Below {
                        (a, b, true)
                    } else {
                        (b, a, false)
                    };

                let lower_left = horizontal_relation(positions[lower], positions[upper])
                    == HorizontalRelation::Left;
                let (left, right) = if lower_left {
                    (lower, upper)
                } else {
                    (upper, lower)
                };

                let segment_id = SegmentId(segments.len() as u32);
                segments.push(Segment {
                    upper: PointId(upper as u32),
                    lower: PointId(lower as u32),
                    left: PointId(left as u32),
                    right: PointId(right as u32),
                    line: Line::from_points(positions[lower], positions[upper]),
                    upward,
                });

                record_adjacency(&mut points[lower], segment_id, lower_left);
                record_adjacency(&mut points[upper], segment_id, !lower_left);
            }

            windings.push(if winding_sum > 0.0 {
                Winding::Cw
            } else {
                Winding::Ccw
            });

            base += outline.len();
        }

        PolygonData {
            positions,
            points,
            segments,
            windings,
            valid,
        }
    }
}

fn record_adjacency(point: &mut PointData, segment: SegmentId, left_end: bool) {
    let entry = PointSegment { segment, left_end };
    if point.segments[0].is_none() {
        point.segments[0] = Some(entry);
    } else {
        point.segments[1] = Some(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::point;

    #[test]
    fn vertical_relation_tie_break() {
        // Equal y: the point with the smaller x is below.
        assert_eq!(
            vertical_relation(point(0.0, 1.0), point(2.0, 1.0)),
            VerticalRelation::Below
        );
        assert_eq!(
            vertical_relation(point(2.0, 1.0), point(0.0, 1.0)),
            VerticalRelation::Above
        );
        assert_eq!(
            vertical_relation(point(0.0, 0.0), point(0.0, 1.0)),
            VerticalRelation::Below
        );
    }

    #[test]
    fn horizontal_relation_tie_break() {
        assert_eq!(
            horizontal_relation(point(1.0, 0.0), point(1.0, 2.0)),
            HorizontalRelation::Left
        );
        assert_eq!(
            horizontal_relation(point(1.0, 2.0), point(1.0, 0.0)),
            HorizontalRelation::Right
        );
    }

    #[test]
    fn outline_winding() {
        let ccw = vec![
            point(0.0, 0.0),
            point(1.0, 0.0),
            point(1.0, 1.0),
            point(0.0, 1.0),
        ];
        let mut cw = ccw.clone();
        cw.reverse();

        let data = PolygonData::new(&[ccw, cw]);
        assert!(data.valid);
        assert_eq!(data.windings, vec![Winding::Ccw, Winding::Cw]);
        assert_eq!(data.segments.len(), 8);
    }

    #[test]
    fn segment_classification() {
        let data = PolygonData::new(&[vec![
            point(0.0, 0.0),
            point(1.0, 0.0),
            point(0.0, 1.0),
        ]]);

        // First edge is horizontal: the tie-break makes (0, 0) the lower
        // endpoint.
        let seg = &data.segments[0];
        assert_eq!(seg.lower, PointId(0));
        assert_eq!(seg.upper, PointId(1));
        assert_eq!(seg.left, PointId(0));
        assert_eq!(seg.right, PointId(1));
        assert!(seg.upward);

        // Every point references exactly two segments.
        for pt in &data.points {
            assert!(pt.segments[0].is_some() && pt.segments[1].is_some());
        }

        assert!(!PolygonData::new(&[vec![point(0.0, 0.0), point(1.0, 0.0)]]).valid);
    }
}
