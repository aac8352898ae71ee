//! Triangle emission: stitching interior trapezoids into y-monotone vertex
//! chains and clipping each chain into triangles.
//!
//! Every interior trapezoid with no lower neighbor starts a chain. The walk
//! climbs from there along one lateral side, emitting the vertices it
//! passes; whenever a trapezoid carries an interior diagonal the opposite
//! side is queued up for a later walk of its own. Each finished chain is a
//! y-monotone polygon and falls to the convex-vertex clipping loop.

use log::trace;

use crate::error::{InternalError, TriangulationError, TriangulationResult};
use crate::store::TrapezoidId;
use crate::{
    PointId, SegmentId, Side, StepBudget, TriangulateOutput, TriangulationInfo,
    TriangulationState, Triangulator, Winding,
};

/// Checkpoint of a step-wise triangulation.
pub(crate) struct TraversalState {
    /// A traversal is underway (paused or not). A finished or never-started
    /// traversal restarts from scratch on the next call.
    pub active: bool,
    /// Where the scan for unvisited bottom trapezoids resumes.
    pub scan_index: usize,
    /// Chain starts discovered behind diagonals, walked depth-first.
    pub pending: Vec<(TrapezoidId, Side)>,
    pub chain: Option<ChainWalk>,
    pub clip: Option<ClipState>,
}

impl TraversalState {
    pub fn new() -> Self {
        TraversalState {
            active: false,
            scan_index: 0,
            pending: Vec::new(),
            chain: None,
            clip: None,
        }
    }
}

/// A monotone chain walk in progress.
pub(crate) struct ChainWalk {
    trap: TrapezoidId,
    side: Side,
    /// The one segment bounding the whole chain on the far side.
    single_segment: SegmentId,
    chain: Vec<PointId>,
    recurse: Vec<TrapezoidId>,
}

/// An ear-clipping pass in progress.
pub(crate) struct ClipState {
    chain: Vec<PointId>,
    side: Side,
    ib: usize,
    recurse: Vec<TrapezoidId>,
}

impl Triangulator {
    /// Emits the triangulation of the interior of the current trapezoidal
    /// map.
    ///
    /// Appends triangles, diagonals and monotone chains to `output`. With
    /// `info.max_steps > 0` the call performs at most that many units of
    /// work (one emitted chain vertex or one emitted triangle) and pauses;
    /// the next call must be given the same `output` buffers and continues
    /// where this one stopped. `info.state` reports `FinishedAll` once the
    /// whole interior is triangulated, after which a further call starts
    /// over (clearing `output`).
    pub fn triangulate(
        &mut self,
        info: &mut TriangulationInfo,
        output: &mut TriangulateOutput,
    ) -> TriangulationResult {
        info.num_steps = 0;
        info.state = TriangulationState::Undefined;

        if self.root.is_none() {
            return Err(TriangulationError::NoTrapezoidTree);
        }

        if !self.traversal.active {
            output.clear();
            for (_, trap) in self.trapezoids.live_mut() {
                trap.visited = [false, false];
            }
            self.traversal = TraversalState::new();
            self.traversal.active = true;
        }

        let mut budget = StepBudget::new(info.max_steps);

        loop {
            // An ear-clipping pass has priority: it owns the current chain.
            if let Some(mut clip) = self.traversal.clip.take() {
                let finished = self.clip_step(&mut clip, info, output);

                if finished {
                    // Queue the walks recorded behind diagonals; reversed,
                    // so they pop in discovery order.
                    let other = clip.side.opposite();
                    for trap in clip.recurse.iter().rev() {
                        self.traversal.pending.push((*trap, other));
                    }
                } else {
                    self.traversal.clip = Some(clip);
                }

                let more = budget.step();
                info.num_steps = budget.taken;
                if !more {
                    return Ok(());
                }
                continue;
            }

            // Then the chain walk.
            if let Some(walk) = self.traversal.chain.take() {
                self.chain_step(walk, info, output)?;

                let more = budget.step();
                info.num_steps = budget.taken;
                if !more {
                    return Ok(());
                }
                continue;
            }

            // No active work: start the next queued walk...
            if let Some((trap, side)) = self.traversal.pending.pop() {
                self.traversal.chain = self.begin_chain(trap, side)?;
                continue;
            }

            // ...or scan for the next untouched bottom trapezoid.
            match self.next_chain_start()? {
                Some((trap, side)) => {
                    self.traversal.chain = self.begin_chain(trap, side)?;
                }
                None => {
                    budget.step();
                    info.num_steps = budget.taken;
                    info.state = TriangulationState::FinishedAll;
                    self.traversal.active = false;
                    return Ok(());
                }
            }
        }
    }

    /// Finds the next interior trapezoid with no lower neighbors that has
    /// not been walked on either side, and the side its chain runs on.
    fn next_chain_start(&mut self) -> Result<Option<(TrapezoidId, Side)>, InternalError> {
        let slot_count = self.trapezoids.slot_count();
        let mut index = self.traversal.scan_index;

        while index < slot_count {
            let found = match self.trapezoids.get(index) {
                Some(trap) => {
                    trap.inside
                        && !trap.visited[0]
                        && !trap.visited[1]
                        && trap.lower1.is_none()
                        && trap.lower2.is_none()
                }
                None => false,
            };

            if found {
                self.traversal.scan_index = index + 1;
                let id = TrapezoidId(index as u32);

                let (upper_point, left_segment) = {
                    let t = &self.trapezoids[id];
                    (t.upper_point, t.left_segment)
                };
                let left_segment = left_segment.ok_or(InternalError::MissingNeighbor)?;

                // When the left segment spans up to the trapezoid's upper
                // point, the chain climbs along the left side; otherwise
                // along the right.
                let side = if Some(self.segments[left_segment.to_usize()].upper) == upper_point {
                    Side::Left
                } else {
                    Side::Right
                };

                return Ok(Some((id, side)));
            }

            index += 1;
        }

        self.traversal.scan_index = slot_count;
        Ok(None)
    }

    /// Descends from `start` to the bottom trapezoid of its monotone
    /// polygon and opens the chain walk there. Returns `None` when that
    /// chain was already walked on this side.
    fn begin_chain(
        &mut self,
        start: TrapezoidId,
        side: Side,
    ) -> Result<Option<ChainWalk>, InternalError> {
        let single_segment = match side {
            Side::Left => self.trapezoids[start].right_segment,
            Side::Right => self.trapezoids[start].left_segment,
        }
        .ok_or(InternalError::MissingNeighbor)?;

        let single_lower = self.segments[single_segment.to_usize()].lower;

        let mut trap = start;
        while self.trapezoids[trap].lower_point != Some(single_lower) {
            let (l1, l2) = {
                let t = &self.trapezoids[trap];
                (t.lower1, t.lower2)
            };
            let next = if side == Side::Left && l2.is_some() { l2 } else { l1 };
            trap = next.ok_or(InternalError::MissingNeighbor)?;
        }

        if self.trapezoids[trap].visited[side.index()] {
            return Ok(None);
        }

        Ok(Some(ChainWalk {
            trap,
            side,
            single_segment,
            chain: Vec::new(),
            recurse: Vec::new(),
        }))
    }

    /// One chain-walk step: emits one vertex. Moves the walk into an
    /// ear-clipping pass when the chain tops out.
    fn chain_step(
        &mut self,
        mut walk: ChainWalk,
        info: &mut TriangulationInfo,
        output: &mut TriangulateOutput,
    ) -> Result<(), InternalError> {
        info.state = TriangulationState::AddingMonChainSegment;

        if walk.chain.is_empty() {
            // The chain opens on the bottom trapezoid's lower point.
            let lower = self.trapezoids[walk.trap]
                .lower_point
                .ok_or(InternalError::DegenerateMonotoneChain)?;
            walk.chain.push(lower);
            self.traversal.chain = Some(walk);
            return Ok(());
        }

        let (upper_point, upper1, upper2, has_diagonal, lower_point, visited) = {
            let t = &self.trapezoids[walk.trap];
            (
                t.upper_point,
                t.upper1,
                t.upper2,
                t.has_diagonal,
                t.lower_point,
                t.visited,
            )
        };

        let upper_point = upper_point.ok_or(InternalError::DegenerateMonotoneChain)?;
        let done = upper_point == self.segments[walk.single_segment.to_usize()].upper;
        walk.chain.push(upper_point);

        let vi = walk.side.index();
        let ovi = walk.side.opposite().index();
        if !visited[vi] {
            self.trapezoids[walk.trap].visited[vi] = true;

            // A diagonal splits another monotone polygon off on the far
            // side; remember it for a walk of its own.
            if has_diagonal && !visited[ovi] {
                let lower = lower_point.ok_or(InternalError::DegenerateMonotoneChain)?;
                output.diagonals.push(upper_point);
                output.diagonals.push(lower);
                walk.recurse.push(walk.trap);
            }
        }

        if done {
            if walk.chain.len() < 3 {
                debug_assert!(false, "monotone chain with fewer than three vertices");
                return Err(InternalError::DegenerateMonotoneChain);
            }

            trace!("monotone chain of {} vertices", walk.chain.len());
            output.monotone_chains.push(walk.chain.clone());

            self.traversal.clip = Some(ClipState {
                chain: walk.chain,
                side: walk.side,
                ib: 1,
                recurse: walk.recurse,
            });
        } else {
            let next = if upper2.is_some() {
                if walk.side == Side::Left {
                    upper2
                } else {
                    upper1
                }
            } else {
                upper1
            };
            walk.trap = next.ok_or(InternalError::MissingNeighbor)?;
            self.traversal.chain = Some(walk);
        }

        Ok(())
    }

    /// One ear-clipping step: emits one triangle. Returns true when the
    /// chain is used up.
    fn clip_step(
        &mut self,
        clip: &mut ClipState,
        info: &mut TriangulationInfo,
        output: &mut TriangulateOutput,
    ) -> bool {
        info.state = TriangulationState::AddingTriangle;

        // Walking direction around the chain depends on the side it was
        // collected on, so that a convex vertex is always a left turn.
        let (prev_offs, next_offs): (isize, isize) = match clip.side {
            Side::Left => (1, -1),
            Side::Right => (-1, 1),
        };

        if clip.chain.len() > 3 {
            loop {
                let ib = clip.ib;
                let ia = (ib as isize + prev_offs) as usize;
                let ic = (ib as isize + next_offs) as usize;

                let pa = self.position(clip.chain[ia]);
                let pb = self.position(clip.chain[ib]);
                let pc = self.position(clip.chain[ic]);

                if (pc - pb).cross(pa - pb) > 0.0 {
                    // Convex vertex: clip the ear.
                    let (mut ia, mut ic) = (ia, ic);
                    if info.winding == Winding::Cw {
                        core::mem::swap(&mut ia, &mut ic);
                    }

                    output.triangles.push(clip.chain[ia]);
                    output.triangles.push(clip.chain[ib]);
                    output.triangles.push(clip.chain[ic]);

                    output.diagonals.push(clip.chain[ia]);
                    output.diagonals.push(clip.chain[ic]);

                    clip.chain.remove(ib);

                    if clip.ib == clip.chain.len() - 1 {
                        clip.ib = 1;
                    }
                    return false;
                }

                clip.ib += 1;
                if clip.ib == clip.chain.len() - 1 {
                    clip.ib = 1;
                }
            }
        }

        // Three vertices left: the last triangle closes the chain. Its
        // orientation follows from the chain side and requested winding.
        let flipped = match (clip.side, info.winding) {
            (Side::Left, Winding::Cw) | (Side::Right, Winding::Ccw) => false,
            _ => true,
        };

        if flipped {
            output.triangles.push(clip.chain[2]);
            output.triangles.push(clip.chain[1]);
            output.triangles.push(clip.chain[0]);
        } else {
            output.triangles.push(clip.chain[0]);
            output.triangles.push(clip.chain[1]);
            output.triangles.push(clip.chain[2]);
        }

        true
    }
}
