//! Simple-polygon check: a Shamos-Hoey sweep over the input segments.
//!
//! Events are the segment endpoints in left-to-right order; the status holds
//! the segments crossing the sweep line, ordered by the height at which they
//! meet it. Only segments that become neighbors in the status are tested
//! against each other, so the whole check runs in O(n log n).

use core::cmp::Ordering;

use log::debug;

use crate::geom::{segments_intersect, segments_intersect_excluding_endpoints, Line};
use crate::math::vector;
use crate::polygon::{
    horizontal_relation, vertical_relation, HorizontalRelation, PointSegment, VerticalRelation,
};
use crate::{PointId, SegmentId, Triangulator};

impl Triangulator {
    pub(crate) fn check_simple_polygon(&self) -> bool {
        // Two endpoint events per point, taken from the adjacency slots.
        let mut events: Vec<PointSegment> = Vec::with_capacity(self.points.len() * 2);
        for pt in &self.points {
            for slot in &pt.segments {
                match slot {
                    Some(ev) => events.push(*ev),
                    None => {
                        debug_assert!(false, "point with fewer than two incident segments");
                        return false;
                    }
                }
            }
        }

        events.sort_by(|a, b| self.compare_events(*a, *b));

        // No two distinct points may share coordinates. A point legitimately
        // appears twice (once per incident segment), so only pairs with
        // different indices count.
        for pair in events.windows(2) {
            let p1 = self.event_point(pair[0]);
            let p2 = self.event_point(pair[1]);
            if p1 != p2 && self.position(p1) == self.position(p2) {
                debug!("rejecting polygon: coincident points {:?} and {:?}", p1, p2);
                return false;
            }
        }

        let mut status: Vec<SegmentId> = Vec::new();

        for ev in &events {
            let seg_id = ev.segment;

            if ev.left_end {
                // The segment enters the sweep. Test it against the
                // segments that become its neighbors in the status.
                let idx = status.partition_point(|&other| self.status_is_below(other, seg_id));

                if idx > 0 && self.segments_conflict(seg_id, status[idx - 1]) {
                    return false;
                }
                if idx < status.len() && self.segments_conflict(seg_id, status[idx]) {
                    return false;
                }

                status.insert(idx, seg_id);
            } else {
                // The segment leaves the sweep; its former neighbors become
                // adjacent and need one test between themselves.
                match status.iter().position(|&s| s == seg_id) {
                    Some(idx) => {
                        if idx > 0
                            && idx + 1 < status.len()
                            && self.segments_conflict(status[idx - 1], status[idx + 1])
                        {
                            return false;
                        }
                        status.remove(idx);
                    }
                    None => {
                        debug_assert!(false, "leave event for a segment not in the status");
                        return false;
                    }
                }
            }
        }

        debug_assert!(status.is_empty());

        true
    }

    fn event_point(&self, ev: PointSegment) -> PointId {
        let seg = &self.segments[ev.segment.to_usize()];
        if ev.left_end {
            seg.left
        } else {
            seg.right
        }
    }

    fn compare_events(&self, a: PointSegment, b: PointSegment) -> Ordering {
        let pa = self.event_point(a);
        let pb = self.event_point(b);

        if pa == pb {
            // The shared endpoint of two adjacent segments: the leave event
            // is processed first.
            return match (a.left_end, b.left_end) {
                (false, true) => Ordering::Less,
                (true, false) => Ordering::Greater,
                _ => Ordering::Equal,
            };
        }

        let pos_a = self.position(pa);
        let pos_b = self.position(pb);

        if pos_a == pos_b {
            // Distinct points with the same coordinates. They make the
            // polygon invalid; order them by index so they stay adjacent
            // for the duplicate scan below.
            return pa.0.cmp(&pb.0);
        }

        if horizontal_relation(pos_a, pos_b) == HorizontalRelation::Left {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }

    /// Status order: whether `other` passes below the left endpoint of the
    /// segment being inserted.
    fn status_is_below(&self, other_id: SegmentId, new_id: SegmentId) -> bool {
        let new_seg = &self.segments[new_id.to_usize()];
        let other_seg = &self.segments[other_id.to_usize()];

        let left_event_pt = self.position(new_seg.left);

        // Height at which the incumbent meets the vertical sweep line. A
        // vertical incumbent has no single crossing; its left endpoint
        // stands in.
        let sweep = Line::from_point_and_direction(left_event_pt, vector(0.0, 1.0));
        let other_pt = match sweep.intersection(&other_seg.line) {
            Some(pt) => pt,
            None => self.position(other_seg.left),
        };

        if other_pt == left_event_pt {
            // Same crossing point: order the segments by their right
            // endpoints instead.
            vertical_relation(self.position(other_seg.right), self.position(new_seg.right))
                == VerticalRelation::Below
        } else {
            vertical_relation(other_pt, left_event_pt) == VerticalRelation::Below
        }
    }

    fn segments_conflict(&self, a: SegmentId, b: SegmentId) -> bool {
        let sa = &self.segments[a.to_usize()];
        let sb = &self.segments[b.to_usize()];

        let a1 = self.position(sa.lower);
        let a2 = self.position(sa.upper);
        let b1 = self.position(sb.lower);
        let b2 = self.position(sb.upper);

        // Consecutive outline segments share one endpoint; that touch is
        // not an intersection.
        let adjacent = sa.lower == sb.lower
            || sa.upper == sb.lower
            || sa.lower == sb.upper
            || sa.upper == sb.upper;

        let conflict = if adjacent {
            segments_intersect_excluding_endpoints(a1, a2, b1, b2)
        } else {
            segments_intersect(a1, a2, b1, b2)
        };

        if conflict {
            debug!("rejecting polygon: segments {:?} and {:?} intersect", a, b);
        }

        conflict
    }
}

#[cfg(test)]
mod tests {
    use crate::math::point;
    use crate::Triangulator;

    #[test]
    fn accepts_square() {
        let t = Triangulator::new(&[vec![
            point(0.0, 0.0),
            point(1.0, 0.0),
            point(1.0, 1.0),
            point(0.0, 1.0),
        ]]);
        assert!(t.is_simple_polygon());
    }

    #[test]
    fn accepts_nested_outlines() {
        let t = Triangulator::new(&[
            vec![
                point(0.0, 0.0),
                point(4.0, 0.0),
                point(4.0, 4.0),
                point(0.0, 4.0),
            ],
            vec![
                point(1.0, 1.0),
                point(1.0, 3.0),
                point(3.0, 3.0),
                point(3.0, 1.0),
            ],
        ]);
        assert!(t.is_simple_polygon());
    }

    #[test]
    fn rejects_bow_tie() {
        let t = Triangulator::new(&[vec![
            point(0.0, 0.0),
            point(2.0, 2.0),
            point(2.0, 0.0),
            point(0.0, 2.0),
        ]]);
        assert!(!t.is_simple_polygon());
    }

    #[test]
    fn rejects_coincident_points() {
        // Two outlines touching at a shared vertex.
        let t = Triangulator::new(&[
            vec![point(0.0, 0.0), point(2.0, 0.0), point(1.0, 1.0)],
            vec![point(1.0, 1.0), point(2.0, 2.0), point(0.0, 2.0)],
        ]);
        assert!(!t.is_simple_polygon());
    }

    #[test]
    fn rejects_short_outline() {
        let t = Triangulator::new(&[vec![point(0.0, 0.0), point(1.0, 0.0)]]);
        assert!(!t.is_simple_polygon());
    }

    #[test]
    fn rejects_crossing_outlines() {
        let t = Triangulator::new(&[
            vec![
                point(0.0, 0.0),
                point(2.0, 0.0),
                point(2.0, 2.0),
                point(0.0, 2.0),
            ],
            vec![
                point(1.0, 1.0),
                point(3.0, 1.0),
                point(3.0, 3.0),
                point(1.0, 3.0),
            ],
        ]);
        assert!(!t.is_simple_polygon());
    }

    #[test]
    fn accepts_collinear_horizontal_run() {
        let t = Triangulator::new(&[vec![
            point(0.0, 0.0),
            point(1.0, 0.0),
            point(2.0, 0.0),
            point(2.0, 1.0),
            point(0.0, 1.0),
        ]]);
        assert!(t.is_simple_polygon());
    }
}
