//! Construction of the trapezoidal map: point insertion, segment threading,
//! merging, and the interior classification pass.
//!
//! Segments are inserted one by one. For each segment both endpoints are
//! added to the search structure first (each splits a trapezoid
//! horizontally), then the segment is threaded from its upper endpoint
//! downwards, splitting every trapezoid it crosses into a left and a right
//! half and repairing the neighbor links around the cut. Halves stacked
//! vertically with identical lateral bounds merge back together, which keeps
//! the total number of trapezoids linear.

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{InternalError, TriangulationError, TriangulationResult};
use crate::math::Point;
use crate::polygon::{vertical_relation, VerticalRelation};
use crate::store::{NodeId, NodeKind, TrapezoidId};
use crate::{PointId, SegmentId, Side, StepBudget, TrapezoidationInfo, Triangulator};

/// Checkpoint of a step-wise trapezoidation.
///
/// Each variant names the unit of work the build performs next; a paused
/// build resumes exactly there.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum BuildState {
    /// No build in progress.
    Idle,
    /// Insert the upper endpoint of the segment at `position` in the
    /// insertion order.
    InsertUpperPoint { position: usize },
    /// Insert the lower endpoint. `first_trap` is the trapezoid below the
    /// upper endpoint when inserting it split one, and remains valid across
    /// the lower-point insertion because a split reuses the original
    /// trapezoid as the upper half.
    InsertLowerPoint {
        position: usize,
        first_trap: Option<TrapezoidId>,
    },
    /// Split the trapezoid under `node` and continue the thread below.
    Threading {
        position: usize,
        node: NodeId,
        prev_left: Option<NodeId>,
        prev_right: Option<NodeId>,
    },
    /// All segments are in; classify the trapezoids in one atomic step.
    Classify,
    /// The map is built and classified.
    Done,
}

impl Triangulator {
    /// Builds the trapezoidal map and the point-location structure over it,
    /// then classifies every trapezoid as inside or outside.
    ///
    /// With `info.max_steps > 0` the call performs at most that many units
    /// of work (one point insertion, one trapezoid split, or the final
    /// classification pass) and pauses; the next call picks up at the
    /// checkpoint. Once a build has completed (`info.completed`), a further
    /// call tears the map down and builds it again with the same
    /// `info.segment_order`.
    pub fn build_trapezoid_tree(&mut self, info: &mut TrapezoidationInfo) -> TriangulationResult {
        info.num_steps = 0;
        info.completed = false;
        info.upper_point = None;
        info.lower_point = None;
        info.threading_segment = None;
        info.threading_trapezoid = None;

        if !self.is_simple_polygon() {
            return Err(TriangulationError::NotSimplePolygon);
        }

        let fresh = match self.build {
            BuildState::Idle | BuildState::Done => true,
            _ => false,
        };

        if fresh {
            if self.root.is_some() {
                self.delete_trapezoid_tree();
            }

            if info.segment_order.is_empty() {
                info.segment_order = (0..self.segments.len() as u32).map(SegmentId).collect();
                if info.randomize_segments {
                    let mut rng = match info.seed {
                        Some(seed) => StdRng::seed_from_u64(seed),
                        None => StdRng::from_entropy(),
                    };
                    info.segment_order.shuffle(&mut rng);
                }
            }

            debug!(
                "building trapezoidal map over {} segments",
                info.segment_order.len()
            );

            self.segment_order = info.segment_order.clone();
            self.segments_added = 0;
            self.build = BuildState::InsertUpperPoint { position: 0 };
        }

        let mut budget = StepBudget::new(info.max_steps);

        loop {
            match self.build {
                BuildState::InsertUpperPoint { position } => {
                    if position == self.segment_order.len() {
                        self.build = BuildState::Classify;
                        continue;
                    }

                    let seg_id = self.segment_order[position];
                    trace!("inserting segment {:?}", seg_id);

                    let upper = self.segments[seg_id.to_usize()].upper;
                    let first_trap = if self.points[upper.to_usize()].node.is_none() {
                        Some(self.add_point(upper)?)
                    } else {
                        None
                    };

                    self.build = BuildState::InsertLowerPoint {
                        position,
                        first_trap,
                    };
                    if !budget.step() {
                        break;
                    }
                }

                BuildState::InsertLowerPoint {
                    position,
                    first_trap,
                } => {
                    let seg_id = self.segment_order[position];
                    let segment = self.segments[seg_id.to_usize()];

                    if self.points[segment.lower.to_usize()].node.is_none() {
                        self.add_point(segment.lower)?;
                    }

                    // Locate the trapezoid the thread starts in. If the
                    // upper endpoint was inserted just now, it is the lower
                    // half of that split; otherwise it has to be searched
                    // for below the existing upper endpoint.
                    let start = match first_trap {
                        Some(trap) => self.trapezoids[trap].node,
                        None => {
                            let upper_node = self.points[segment.upper.to_usize()]
                                .node
                                .ok_or(InternalError::SearchStructureCorrupt)?;
                            self.first_trapezoid_for_segment(upper_node, seg_id)?
                        }
                    };

                    self.build = BuildState::Threading {
                        position,
                        node: start,
                        prev_left: None,
                        prev_right: None,
                    };
                    if !budget.step() {
                        break;
                    }
                }

                BuildState::Threading {
                    position,
                    node,
                    prev_left,
                    prev_right,
                } => {
                    let seg_id = self.segment_order[position];
                    let lower = self.segments[seg_id.to_usize()].lower;

                    let trap = match self.nodes[node].kind {
                        NodeKind::Trapezoid(trap) => trap,
                        _ => {
                            debug_assert!(false, "thread stopped on a non-leaf node");
                            return Err(InternalError::SearchStructureCorrupt.into());
                        }
                    };

                    // The thread ends in the trapezoid hanging below the
                    // segment's lower endpoint.
                    if self.trapezoids[trap].upper_point == Some(lower) {
                        self.segments_added += 1;
                        self.build = BuildState::InsertUpperPoint {
                            position: position + 1,
                        };
                        continue;
                    }

                    let (next, left_node, right_node) = self.thread_segment(seg_id, node)?;

                    let prev_left = Some(self.merge_trapezoids(prev_left, left_node));
                    let prev_right = Some(self.merge_trapezoids(prev_right, right_node));

                    self.build = BuildState::Threading {
                        position,
                        node: next,
                        prev_left,
                        prev_right,
                    };
                    if !budget.step() {
                        break;
                    }
                }

                BuildState::Classify => {
                    self.classify_trapezoids(info.fill_rule)?;
                    self.build = BuildState::Done;
                    budget.step();
                    break;
                }

                BuildState::Idle | BuildState::Done => {
                    debug_assert!(false, "build driver entered a terminal state");
                    break;
                }
            }
        }

        info.num_steps = budget.taken;
        info.segments_added = self.segments_added;

        match self.build {
            BuildState::InsertLowerPoint { position, .. } => {
                let seg_id = self.segment_order[position];
                info.upper_point = Some(self.segments[seg_id.to_usize()].upper);
            }
            BuildState::Threading { position, node, .. } => {
                let seg_id = self.segment_order[position];
                let segment = &self.segments[seg_id.to_usize()];
                info.upper_point = Some(segment.upper);
                info.lower_point = Some(segment.lower);
                info.threading_segment = Some(seg_id);
                if let NodeKind::Trapezoid(trap) = self.nodes[node].kind {
                    info.threading_trapezoid = Some(trap);
                }
            }
            BuildState::Done => {
                info.completed = true;
            }
            _ => {}
        }

        Ok(())
    }

    /// Which side of the segment's line the point falls on.
    pub(crate) fn segment_side(&self, pt: Point, segment: SegmentId) -> Side {
        if self.segments[segment.to_usize()]
            .line
            .signed_distance_to(pt)
            > 0.0
        {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Adds a point to the search structure, splitting the trapezoid it
    /// falls in along the horizontal line through the point. Returns the
    /// lower of the two halves.
    fn add_point(&mut self, point_id: PointId) -> Result<TrapezoidId, InternalError> {
        let root = match self.root {
            Some(root) => root,
            None => {
                // First point: a root vertex node over the two half-planes.
                let root = self.nodes.allocate(NodeKind::Point(point_id));

                let upper_trap = self.trapezoids.allocate();
                let lower_trap = self.trapezoids.allocate();

                let right_child = self.nodes.allocate(NodeKind::Trapezoid(upper_trap));
                let left_child = self.nodes.allocate(NodeKind::Trapezoid(lower_trap));
                self.nodes[right_child].parent = Some(root);
                self.nodes[left_child].parent = Some(root);

                {
                    let node = &mut self.nodes[root];
                    node.left = Some(left_child);
                    node.right = Some(right_child);
                }

                {
                    let trap = &mut self.trapezoids[upper_trap];
                    trap.lower_point = Some(point_id);
                    trap.lower1 = Some(lower_trap);
                    trap.node = right_child;
                }
                {
                    let trap = &mut self.trapezoids[lower_trap];
                    trap.upper_point = Some(point_id);
                    trap.upper1 = Some(upper_trap);
                    trap.node = left_child;
                }

                self.points[point_id.to_usize()].node = Some(root);
                self.root = Some(root);

                return Ok(lower_trap);
            }
        };

        let position = self.position(point_id);
        let mut node_id = root;

        loop {
            match self.nodes[node_id].kind {
                NodeKind::Point(existing) => {
                    if existing == point_id {
                        debug_assert!(false, "point inserted twice");
                        return Err(InternalError::SearchStructureCorrupt);
                    }
                    let next = if vertical_relation(position, self.position(existing))
                        == VerticalRelation::Below
                    {
                        self.nodes[node_id].left
                    } else {
                        self.nodes[node_id].right
                    };
                    node_id = next.ok_or(InternalError::SearchStructureCorrupt)?;
                }

                NodeKind::Segment(segment) => {
                    let next = if self.segment_side(position, segment) == Side::Left {
                        self.nodes[node_id].left
                    } else {
                        self.nodes[node_id].right
                    };
                    node_id = next.ok_or(InternalError::SearchStructureCorrupt)?;
                }

                NodeKind::Trapezoid(old_trap) => {
                    // Split: the old trapezoid is reused as the upper half,
                    // a fresh one becomes the lower half, and the leaf turns
                    // into a vertex node over the two.
                    let new_trap = self.trapezoids.allocate();
                    let lower_node = self.nodes.allocate(NodeKind::Trapezoid(new_trap));
                    let upper_node = self.nodes.allocate(NodeKind::Trapezoid(old_trap));
                    self.nodes[lower_node].parent = Some(node_id);
                    self.nodes[upper_node].parent = Some(node_id);

                    let (old_lower_point, old_lower1, old_lower2, old_left, old_right) = {
                        let t = &self.trapezoids[old_trap];
                        (
                            t.lower_point,
                            t.lower1,
                            t.lower2,
                            t.left_segment,
                            t.right_segment,
                        )
                    };

                    {
                        let t = &mut self.trapezoids[new_trap];
                        t.upper_point = Some(point_id);
                        t.lower_point = old_lower_point;
                        t.upper1 = Some(old_trap);
                        t.lower1 = old_lower1;
                        t.lower2 = old_lower2;
                        t.left_segment = old_left;
                        t.right_segment = old_right;
                        t.node = lower_node;
                    }

                    // The trapezoids below now neighbor the lower half.
                    if let Some(l1) = old_lower1 {
                        let t = &mut self.trapezoids[l1];
                        if t.upper1 == Some(old_trap) {
                            t.upper1 = Some(new_trap);
                        } else if t.upper2 == Some(old_trap) {
                            t.upper2 = Some(new_trap);
                        }
                        debug_assert!(t.upper3.is_none());
                    }
                    if let Some(l2) = old_lower2 {
                        let t = &mut self.trapezoids[l2];
                        if t.upper1 == Some(old_trap) {
                            t.upper1 = Some(new_trap);
                        } else if t.upper2 == Some(old_trap) {
                            t.upper2 = Some(new_trap);
                        }
                        debug_assert!(t.upper3.is_none());
                    }

                    {
                        let t = &mut self.trapezoids[old_trap];
                        t.lower_point = Some(point_id);
                        t.lower1 = Some(new_trap);
                        t.lower2 = None;
                        t.node = upper_node;
                    }

                    {
                        let node = &mut self.nodes[node_id];
                        node.kind = NodeKind::Point(point_id);
                        node.left = Some(lower_node);
                        node.right = Some(upper_node);
                    }

                    self.points[point_id.to_usize()].node = Some(node_id);

                    return Ok(new_trap);
                }
            }
        }
    }

    /// Finds the leaf for the first trapezoid a new segment crosses, given
    /// the node of its (already inserted) upper endpoint.
    fn first_trapezoid_for_segment(
        &self,
        start: NodeId,
        segment_id: SegmentId,
    ) -> Result<NodeId, InternalError> {
        let segment = self.segments[segment_id.to_usize()];
        let mut node_id = start;

        loop {
            match self.nodes[node_id].kind {
                NodeKind::Point(existing) => {
                    if existing != segment.upper {
                        let next = if vertical_relation(
                            self.position(segment.upper),
                            self.position(existing),
                        ) == VerticalRelation::Below
                        {
                            self.nodes[node_id].left
                        } else {
                            self.nodes[node_id].right
                        };
                        node_id = next.ok_or(InternalError::SearchStructureCorrupt)?;
                        continue;
                    }

                    // Found the upper endpoint; the first trapezoid lies in
                    // the subtree below it.
                    let mut below = self.nodes[node_id]
                        .left
                        .ok_or(InternalError::SearchStructureCorrupt)?;

                    loop {
                        match self.nodes[below].kind {
                            NodeKind::Point(_) => {
                                // Any further vertex in this subtree is below
                                // the upper endpoint, so the trapezoid
                                // touching the endpoint is above it.
                                below = self.nodes[below]
                                    .right
                                    .ok_or(InternalError::SearchStructureCorrupt)?;
                            }

                            NodeKind::Trapezoid(_) => return Ok(below),

                            NodeKind::Segment(other_id) => {
                                let other = self.segments[other_id.to_usize()];

                                // Route towards the endpoint the two
                                // segments do not share.
                                let probe = if other.lower == segment.upper
                                    || other.upper == segment.upper
                                {
                                    segment.lower
                                } else if other.lower == segment.lower
                                    || other.upper == segment.lower
                                {
                                    segment.upper
                                } else {
                                    // No shared endpoint at all. The upper
                                    // endpoint is strictly off this
                                    // segment's line, so its side is a
                                    // sound routing key.
                                    debug_assert!(
                                        other
                                            .line
                                            .signed_distance_to(self.position(segment.upper))
                                            != 0.0,
                                        "routing by a point on the segment's own line"
                                    );
                                    segment.upper
                                };

                                let next =
                                    if self.segment_side(self.position(probe), other_id)
                                        == Side::Left
                                    {
                                        self.nodes[below].left
                                    } else {
                                        self.nodes[below].right
                                    };
                                below = next.ok_or(InternalError::SearchStructureCorrupt)?;
                            }
                        }
                    }
                }

                NodeKind::Segment(other_id) => {
                    let next = if self.segment_side(self.position(segment.upper), other_id)
                        == Side::Left
                    {
                        self.nodes[node_id].left
                    } else {
                        self.nodes[node_id].right
                    };
                    node_id = next.ok_or(InternalError::SearchStructureCorrupt)?;
                }

                // The upper endpoint has no node of its own yet; this is the
                // trapezoid it would land in.
                NodeKind::Trapezoid(_) => return Ok(node_id),
            }
        }
    }

    /// Splits the trapezoid under `trap_node` into a left and a right half
    /// along the segment and repairs the neighbor links. Returns the leaf of
    /// the next trapezoid to thread through plus the two halves' leaves.
    fn thread_segment(
        &mut self,
        segment_id: SegmentId,
        trap_node: NodeId,
    ) -> Result<(NodeId, NodeId, NodeId), InternalError> {
        let left_trap = match self.nodes[trap_node].kind {
            NodeKind::Trapezoid(trap) => trap,
            _ => {
                debug_assert!(false, "threading through a non-leaf node");
                return Err(InternalError::SearchStructureCorrupt);
            }
        };

        // The split reuses the trapezoid as the left half and allocates the
        // right half.
        let right_trap = self.trapezoids.allocate();
        let segment = self.segments[segment_id.to_usize()];

        let (u1, u2, u3, u3_side) = {
            let t = &self.trapezoids[left_trap];
            (t.upper1, t.upper2, t.upper3, t.upper3_side)
        };

        match (u1, u2) {
            (Some(u1), Some(u2)) => {
                // Two trapezoids above: the continuation of the thread.
                if let Some(u3) = u3 {
                    if u3_side == Side::Left {
                        self.trapezoids[u2].lower1 = Some(right_trap);
                        {
                            let t = &mut self.trapezoids[left_trap];
                            t.upper1 = Some(u3);
                            t.upper2 = Some(u1);
                            t.upper3 = None;
                        }
                        self.trapezoids[right_trap].upper1 = Some(u2);
                    } else {
                        self.trapezoids[u2].lower1 = Some(right_trap);
                        self.trapezoids[u3].lower1 = Some(right_trap);
                        {
                            let t = &mut self.trapezoids[left_trap];
                            t.upper2 = None;
                            t.upper3 = None;
                        }
                        {
                            let t = &mut self.trapezoids[right_trap];
                            t.upper1 = Some(u2);
                            t.upper2 = Some(u3);
                        }
                    }
                } else {
                    self.trapezoids[left_trap].upper2 = None;
                    self.trapezoids[right_trap].upper1 = Some(u2);
                    self.trapezoids[u2].lower1 = Some(right_trap);
                }
            }

            (Some(u1), None) => {
                // One trapezoid above: a fresh segment head or an upward
                // cusp.
                let (ul1, ul2) = {
                    let t = &self.trapezoids[u1];
                    (t.lower1, t.lower2)
                };

                if let (Some(ul1), Some(_)) = (ul1, ul2) {
                    // Upward cusp. Only the segment forming the cusp from
                    // the right side takes over the neighbor slot.
                    if let Some(right_seg) = self.trapezoids[ul1].right_segment {
                        if self.segment_side(self.position(segment.lower), right_seg)
                            == Side::Right
                        {
                            self.trapezoids[left_trap].upper1 = None;
                            self.trapezoids[right_trap].upper1 = Some(u1);
                            self.trapezoids[u1].lower2 = Some(right_trap);
                        }
                    }
                } else {
                    // Fresh segment head.
                    self.trapezoids[u1].lower2 = Some(right_trap);
                    self.trapezoids[right_trap].upper1 = Some(u1);
                }
            }

            _ => {
                debug_assert!(false, "trapezoid on the thread path has no upper neighbor");
                return Err(InternalError::MissingNeighbor);
            }
        }

        let (l1, l2) = {
            let t = &self.trapezoids[left_trap];
            (t.lower1, t.lower2)
        };

        let next_node;

        match (l1, l2) {
            (Some(l1), Some(l2)) => {
                debug_assert_eq!(
                    self.trapezoids[l1].upper_point,
                    self.trapezoids[l2].upper_point
                );

                if self.trapezoids[l1].upper_point == Some(segment.lower) {
                    // The segment ends on the vertex both lower neighbors
                    // share; the thread stops after this split.
                    next_node = self.trapezoids[l1].node;
                    self.trapezoids[left_trap].lower2 = None;
                    self.trapezoids[right_trap].lower1 = Some(l2);
                    self.trapezoids[l2].upper1 = Some(right_trap);
                } else {
                    // Route into whichever lower neighbor the segment cuts.
                    let shared = self.trapezoids[l1]
                        .upper_point
                        .ok_or(InternalError::MissingNeighbor)?;

                    if self.segment_side(self.position(shared), segment_id) == Side::Left {
                        next_node = self.trapezoids[l2].node;
                        self.trapezoids[right_trap].lower1 = Some(l2);
                        self.trapezoids[l2].upper2 = Some(right_trap);
                    } else {
                        next_node = self.trapezoids[l1].node;
                        self.trapezoids[left_trap].lower2 = None;
                        {
                            let t = &mut self.trapezoids[right_trap];
                            t.lower1 = Some(l1);
                            t.lower2 = Some(l2);
                        }
                        self.trapezoids[l1].upper2 = Some(right_trap);
                        self.trapezoids[l2].upper1 = Some(right_trap);
                    }
                }
            }

            (Some(l1), None) => {
                next_node = self.trapezoids[l1].node;

                let (lu1, lu2) = {
                    let t = &self.trapezoids[l1];
                    (t.upper1, t.upper2)
                };

                if let (Some(lu1), Some(lu2)) = (lu1, lu2) {
                    if self.trapezoids[l1].upper_point == Some(segment.lower) {
                        // Downward cusp. Only the segment forming the cusp
                        // from the right side takes over.
                        if let Some(right_seg) = self.trapezoids[lu1].right_segment {
                            if self.segment_side(self.position(segment.upper), right_seg)
                                == Side::Right
                            {
                                self.trapezoids[left_trap].lower1 = None;
                                self.trapezoids[right_trap].lower1 = Some(l1);
                                self.trapezoids[l1].upper2 = Some(right_trap);
                            }
                        }
                    } else {
                        // The split gives the lower neighbor a transient
                        // third upper neighbor on the side the cut does not
                        // touch; the next iteration resolves it.
                        if lu1 == left_trap {
                            {
                                let t = &mut self.trapezoids[l1];
                                t.upper2 = Some(right_trap);
                                t.upper3 = Some(lu2);
                                t.upper3_side = Side::Right;
                            }
                            self.trapezoids[right_trap].lower1 = Some(l1);
                        } else {
                            debug_assert_eq!(lu2, left_trap);
                            {
                                let t = &mut self.trapezoids[l1];
                                t.upper1 = Some(left_trap);
                                t.upper2 = Some(right_trap);
                                t.upper3 = Some(lu1);
                                t.upper3_side = Side::Left;
                            }
                            self.trapezoids[right_trap].lower1 = Some(l1);
                        }
                    }
                } else {
                    // Fresh segment tail.
                    self.trapezoids[right_trap].lower1 = Some(l1);
                    self.trapezoids[l1].upper2 = Some(right_trap);
                }
            }

            _ => {
                debug_assert!(false, "trapezoid on the thread path has no lower neighbor");
                return Err(InternalError::MissingNeighbor);
            }
        }

        let right_segment_before = self.trapezoids[left_trap].right_segment;

        let left_node = self.nodes.allocate(NodeKind::Trapezoid(left_trap));
        self.nodes[left_node].parent = Some(trap_node);
        {
            let t = &mut self.trapezoids[left_trap];
            t.node = left_node;
            t.right_segment = Some(segment_id);
        }

        let (upper_point, lower_point) = {
            let t = &self.trapezoids[left_trap];
            (t.upper_point, t.lower_point)
        };

        let right_node = self.nodes.allocate(NodeKind::Trapezoid(right_trap));
        self.nodes[right_node].parent = Some(trap_node);
        {
            let t = &mut self.trapezoids[right_trap];
            t.node = right_node;
            t.left_segment = Some(segment_id);
            t.right_segment = right_segment_before;
            t.upper_point = upper_point;
            t.lower_point = lower_point;
        }

        // The old leaf becomes the segment's branch node.
        {
            let node = &mut self.nodes[trap_node];
            node.kind = NodeKind::Segment(segment_id);
            node.left = Some(left_node);
            node.right = Some(right_node);
        }

        Ok((next_node, left_node, right_node))
    }

    /// Merges the freshly split half under `cur_node` into the previous
    /// iteration's half when both have identical lateral bounds. Returns the
    /// leaf that represents the (possibly merged) half from here on.
    fn merge_trapezoids(&mut self, prev_node: Option<NodeId>, cur_node: NodeId) -> NodeId {
        let prev_node = match prev_node {
            Some(node) => node,
            None => return cur_node,
        };

        let prev_trap = match self.nodes[prev_node].kind {
            NodeKind::Trapezoid(trap) => trap,
            _ => return cur_node,
        };
        let cur_trap = match self.nodes[cur_node].kind {
            NodeKind::Trapezoid(trap) => trap,
            _ => return cur_node,
        };

        {
            let prev = &self.trapezoids[prev_trap];
            let cur = &self.trapezoids[cur_trap];
            if prev.left_segment != cur.left_segment || prev.right_segment != cur.right_segment {
                return cur_node;
            }
        }

        let (l1, l2, lower_point) = {
            let t = &self.trapezoids[cur_trap];
            (t.lower1, t.lower2, t.lower_point)
        };

        {
            let t = &mut self.trapezoids[prev_trap];
            t.lower1 = l1;
            t.lower2 = l2;
            t.lower_point = lower_point;
        }

        for lower in [l1, l2].iter().copied() {
            if let Some(lower) = lower {
                let t = &mut self.trapezoids[lower];
                if t.upper1 == Some(cur_trap) {
                    t.upper1 = Some(prev_trap);
                } else if t.upper2 == Some(cur_trap) {
                    t.upper2 = Some(prev_trap);
                } else if t.upper3 == Some(cur_trap) {
                    t.upper3 = Some(prev_trap);
                }
            }
        }

        // Point the erased leaf's parent at the surviving leaf. The
        // surviving node now has two parents, which is what makes the
        // search structure a DAG.
        if let Some(parent) = self.nodes[cur_node].parent {
            let node = &mut self.nodes[parent];
            if node.left == Some(cur_node) {
                node.left = Some(prev_node);
            } else if node.right == Some(cur_node) {
                node.right = Some(prev_node);
            }
        }

        self.trapezoids.release(cur_trap);
        self.nodes.release(cur_node);

        prev_node
    }

    /// Marks every fully bounded trapezoid as inside or outside.
    ///
    /// For each candidate the walk first climbs from the trapezoid's leaf to
    /// the node of one of its bounding segments, which fixes the sweep
    /// direction, then repeatedly descends into the adjacent trapezoid on
    /// that side, counting signed segment crossings, until it escapes into
    /// an unbounded trapezoid. The accumulated crossing number feeds the
    /// fill rule.
    fn classify_trapezoids(&mut self, fill_rule: crate::FillRule) -> Result<(), InternalError> {
        let root = match self.root {
            Some(root) => root,
            None => return Ok(()),
        };

        let candidates: Vec<TrapezoidId> = self.trapezoids.live().map(|(id, _)| id).collect();

        for id in candidates {
            let (upper, lower, left_seg, right_seg, leaf) = {
                let t = &self.trapezoids[id];
                (
                    t.upper_point,
                    t.lower_point,
                    t.left_segment,
                    t.right_segment,
                    t.node,
                )
            };

            let (upper, lower, left_seg, right_seg) = match (upper, lower, left_seg, right_seg) {
                (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
                _ => continue,
            };

            let mut counter: i32 = 0;
            let mut node_id = leaf;
            let direction;

            // Climb to whichever bounding segment sits above this leaf.
            loop {
                node_id = self.nodes[node_id]
                    .parent
                    .ok_or(InternalError::SearchStructureCorrupt)?;
                if node_id == root {
                    debug_assert!(false, "no bounding segment above trapezoid leaf");
                    return Err(InternalError::SearchStructureCorrupt);
                }

                if let NodeKind::Segment(seg) = self.nodes[node_id].kind {
                    if seg == left_seg {
                        self.count_crossing(seg, &mut counter);
                        direction = Side::Left;
                        break;
                    } else if seg == right_seg {
                        self.count_crossing(seg, &mut counter);
                        direction = Side::Right;
                        break;
                    }
                }
            }

            let mut point_count = 0u32;
            node_id = self
                .child_on(node_id, direction)
                .ok_or(InternalError::SearchStructureCorrupt)?;

            // Hop from neighbor to neighbor towards the chosen side.
            loop {
                match self.nodes[node_id].kind {
                    NodeKind::Point(_) => {
                        point_count += 1;
                        let next = if point_count % 2 == 1 {
                            self.nodes[node_id].left
                        } else {
                            self.nodes[node_id].right
                        };
                        node_id = next.ok_or(InternalError::SearchStructureCorrupt)?;
                    }

                    NodeKind::Segment(_) => {
                        node_id = self
                            .child_on(node_id, direction.opposite())
                            .ok_or(InternalError::SearchStructureCorrupt)?;
                    }

                    NodeKind::Trapezoid(adjacent) => {
                        point_count = 0;

                        let (adj_left, adj_right) = {
                            let t = &self.trapezoids[adjacent];
                            (t.left_segment, t.right_segment)
                        };

                        if let (Some(adj_left), Some(adj_right)) = (adj_left, adj_right) {
                            // Still between two segments: climb to the one
                            // matching the sweep direction and cross it.
                            let wanted = if direction == Side::Left {
                                adj_left
                            } else {
                                adj_right
                            };

                            loop {
                                node_id = self.nodes[node_id]
                                    .parent
                                    .ok_or(InternalError::SearchStructureCorrupt)?;
                                if node_id == root {
                                    debug_assert!(
                                        false,
                                        "bounding segment missing on the classification walk"
                                    );
                                    return Err(InternalError::SearchStructureCorrupt);
                                }

                                if self.nodes[node_id].kind == NodeKind::Segment(wanted) {
                                    self.count_crossing(wanted, &mut counter);
                                    break;
                                }
                            }

                            node_id = self
                                .child_on(node_id, direction)
                                .ok_or(InternalError::SearchStructureCorrupt)?;
                        } else {
                            // Escaped to an unbounded trapezoid; the counter
                            // is final.
                            if fill_rule.is_in(counter) {
                                let has_diagonal =
                                    self.diagonal_exists(upper, lower, left_seg, right_seg);
                                let t = &mut self.trapezoids[id];
                                t.inside = true;
                                t.has_diagonal = has_diagonal;
                            }
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn child_on(&self, node: NodeId, side: Side) -> Option<NodeId> {
        if side == Side::Left {
            self.nodes[node].left
        } else {
            self.nodes[node].right
        }
    }

    fn count_crossing(&self, segment: SegmentId, counter: &mut i32) {
        if self.segments[segment.to_usize()].upward {
            *counter -= 1;
        } else {
            *counter += 1;
        }
    }

    /// A diagonal from the upper to the lower point exists when neither
    /// bounding segment already spans the two.
    fn diagonal_exists(
        &self,
        upper: PointId,
        lower: PointId,
        left_seg: SegmentId,
        right_seg: SegmentId,
    ) -> bool {
        let left = &self.segments[left_seg.to_usize()];
        let right = &self.segments[right_seg.to_usize()];

        (left.lower != lower || left.upper != upper)
            && (right.lower != lower || right.upper != upper)
    }
}
