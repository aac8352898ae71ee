#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![allow(clippy::float_cmp)]

//! Triangulation of planar polygons with Seidel's randomized trapezoidation
//! algorithm.
//!
//! The input is a list of closed outlines (several outlines describe a
//! multi-contour polygon, typically an outer boundary with holes). Segments
//! are inserted in random order into a point-location structure over a
//! trapezoidal decomposition of the plane; interior trapezoids are then
//! stitched into y-monotone polygons and each of those is triangulated.
//! The expected running time is O(n log* n).
//!
//! ## Overview
//!
//! The most interesting types of this crate are:
//!
//! * [`Triangulator`] - owns the input model, the trapezoidal map and the
//!   search structure, and drives the whole pipeline.
//! * [`TrapezoidationInfo`] / [`TriangulationInfo`] - in/out parameter blocks
//!   for the two stages, including the bounded-work fields used to run the
//!   algorithm step by step.
//! * [`TriangulateOutput`] - the emitted triangles, diagonals and monotone
//!   chains.
//!
//! Both stages can be executed in bounded slices by setting `max_steps`; the
//! triangulator checkpoints its position and the next call resumes where the
//! previous one stopped. This exists for interactive visualization and has no
//! overhead when `max_steps` is unlimited.
//!
//! ## Example
//!
//! ```
//! use seidel_triangulation::math::point;
//! use seidel_triangulation::{
//!     TrapezoidationInfo, TriangulateOutput, TriangulationInfo, Triangulator,
//! };
//!
//! let square = vec![
//!     point(0.0, 0.0),
//!     point(1.0, 0.0),
//!     point(1.0, 1.0),
//!     point(0.0, 1.0),
//! ];
//!
//! let mut triangulator = Triangulator::new(&[square]);
//! assert!(triangulator.is_simple_polygon());
//!
//! let mut trap_info = TrapezoidationInfo::default();
//! triangulator.build_trapezoid_tree(&mut trap_info).unwrap();
//!
//! let mut tri_info = TriangulationInfo::default();
//! let mut output = TriangulateOutput::new();
//! triangulator.triangulate(&mut tri_info, &mut output).unwrap();
//!
//! assert_eq!(output.triangle_count(), 2);
//! ```

use core::fmt;

mod error;
pub mod geom;
pub mod math;
mod polygon;
mod simple;
mod store;
mod trapezoidation;
mod triangulate;

#[cfg(test)]
mod seidel_tests;

use crate::math::Point;
use crate::polygon::{PointData, PolygonData};
use crate::store::{NodeStore, TrapezoidStore};
use crate::trapezoidation::BuildState;
use crate::triangulate::TraversalState;

#[doc(inline)]
pub use crate::error::*;

pub use crate::polygon::Segment;
pub use crate::store::{Node, NodeId, NodeKind, Trapezoid, TrapezoidId};

/// A closed outline, one entry of the input polygon.
///
/// The last point connects back to the first implicitly.
pub type Outline = Vec<Point>;

/// Index of a point in the concatenated input point array.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct PointId(pub u32);

impl PointId {
    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for PointId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "p#{}", self.0)
    }
}

/// Index of a segment in the input segment array.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct SegmentId(pub u32);

impl SegmentId {
    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "s#{}", self.0)
    }
}

/// The fill rule deciding which trapezoids are inside a multi-contour
/// polygon.
///
/// See the SVG specification.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum FillRule {
    EvenOdd,
    NonZero,
}

impl FillRule {
    #[inline]
    pub fn is_in(self, crossing_number: i32) -> bool {
        match self {
            FillRule::EvenOdd => crossing_number % 2 != 0,
            FillRule::NonZero => crossing_number != 0,
        }
    }

    #[inline]
    pub fn is_out(self, crossing_number: i32) -> bool {
        !self.is_in(crossing_number)
    }
}

/// Orientation of an outline or of the emitted triangles.
///
/// Clockwise corresponds to a positive signed area under the sum convention
/// `Σ (x₂ − x₁)(y₂ + y₁)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Winding {
    Cw,
    Ccw,
}

/// Left or Right. Used for lateral neighbor slots and monotone chain sides.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn is_left(self) -> bool {
        self == Side::Left
    }

    pub fn is_right(self) -> bool {
        self == Side::Right
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// In/out parameter block for [`Triangulator::build_trapezoid_tree`].
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct TrapezoidationInfo {
    /// Which trapezoids count as interior.
    pub fill_rule: FillRule,
    /// Shuffle the segment insertion order. Ignored when `segment_order` is
    /// supplied.
    pub randomize_segments: bool,
    /// Seed for the shuffle. `None` draws from the system entropy source.
    pub seed: Option<u64>,
    /// Insertion order of the segments. Left empty, it is generated (and
    /// written back) on the first call; supplying it makes a build fully
    /// reproducible.
    pub segment_order: Vec<SegmentId>,
    /// Bound on the work done by one call. Zero or negative means no bound.
    pub max_steps: i32,

    // Output data.
    /// Steps performed by this call.
    pub num_steps: u32,
    /// Segments fully threaded so far, across calls.
    pub segments_added: u32,
    /// True once the map is built and classified.
    pub completed: bool,
    /// Checkpoint: endpoints of the segment being inserted.
    pub upper_point: Option<PointId>,
    pub lower_point: Option<PointId>,
    /// Checkpoint: the segment currently being threaded, and the trapezoid
    /// the thread stopped in.
    pub threading_segment: Option<SegmentId>,
    pub threading_trapezoid: Option<TrapezoidId>,
}

impl Default for TrapezoidationInfo {
    fn default() -> Self {
        TrapezoidationInfo {
            fill_rule: FillRule::EvenOdd,
            randomize_segments: true,
            seed: None,
            segment_order: Vec::new(),
            max_steps: -1,
            num_steps: 0,
            segments_added: 0,
            completed: false,
            upper_point: None,
            lower_point: None,
            threading_segment: None,
            threading_trapezoid: None,
        }
    }
}

/// Where a step-wise triangulation currently is.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum TriangulationState {
    Undefined,
    AddingMonChainSegment,
    AddingTriangle,
    FinishedAll,
}

/// In/out parameter block for [`Triangulator::triangulate`].
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct TriangulationInfo {
    /// Requested orientation of the emitted triangles.
    pub winding: Winding,
    /// Bound on the work done by one call. Zero or negative means no bound.
    pub max_steps: i32,

    // Output data.
    /// Steps performed by this call.
    pub num_steps: u32,
    pub state: TriangulationState,
}

impl Default for TriangulationInfo {
    fn default() -> Self {
        TriangulationInfo {
            winding: Winding::Ccw,
            max_steps: -1,
            num_steps: 0,
            state: TriangulationState::Undefined,
        }
    }
}

/// Everything [`Triangulator::triangulate`] emits.
///
/// A step-wise run appends into the same buffers across calls; the buffers
/// are cleared when a fresh run starts.
#[derive(Clone, Debug, Default)]
pub struct TriangulateOutput {
    /// Triangle corners, three [`PointId`]s per triangle.
    pub triangles: Vec<PointId>,
    /// Diagonal endpoints, two [`PointId`]s per diagonal.
    pub diagonals: Vec<PointId>,
    /// The y-monotone vertex chains the triangles were clipped from.
    pub monotone_chains: Vec<Vec<PointId>>,
}

impl TriangulateOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.triangles.clear();
        self.diagonals.clear();
        self.monotone_chains.clear();
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn diagonal_count(&self) -> usize {
        self.diagonals.len() / 2
    }
}

/// Counts units of work against the `max_steps` bound of one call.
pub(crate) struct StepBudget {
    max: Option<u32>,
    pub taken: u32,
}

impl StepBudget {
    pub fn new(max_steps: i32) -> Self {
        StepBudget {
            max: if max_steps > 0 {
                Some(max_steps as u32)
            } else {
                None
            },
            taken: 0,
        }
    }

    /// Counts one unit of work; returns whether the driver may keep going.
    pub fn step(&mut self) -> bool {
        self.taken += 1;
        match self.max {
            Some(max) => self.taken < max,
            None => true,
        }
    }
}

/// Seidel triangulator for a multi-contour polygon.
///
/// Owns the flattened input model, the trapezoidal map, and the search
/// structure. An instance is single-threaded; independent instances are
/// fully isolated from each other.
pub struct Triangulator {
    pub(crate) positions: Vec<Point>,
    pub(crate) points: Vec<PointData>,
    pub(crate) segments: Vec<Segment>,
    windings: Vec<Winding>,

    pub(crate) nodes: NodeStore,
    pub(crate) trapezoids: TrapezoidStore,
    pub(crate) root: Option<NodeId>,

    is_simple: bool,

    // Step-wise checkpoints.
    pub(crate) build: BuildState,
    pub(crate) segments_added: u32,
    pub(crate) segment_order: Vec<SegmentId>,
    pub(crate) traversal: TraversalState,
}

impl Triangulator {
    /// Builds the input model from the outlines and runs the simple-polygon
    /// check.
    ///
    /// A rejected input still produces a triangulator (so the caller can
    /// inspect points and segments), but [`is_simple_polygon`] returns false
    /// and the build refuses to run.
    ///
    /// [`is_simple_polygon`]: Triangulator::is_simple_polygon
    pub fn new(outlines: &[Outline]) -> Self {
        let data = PolygonData::new(outlines);

        let mut triangulator = Triangulator {
            positions: data.positions,
            points: data.points,
            segments: data.segments,
            windings: data.windings,
            nodes: NodeStore::new(),
            trapezoids: TrapezoidStore::new(),
            root: None,
            is_simple: false,
            build: BuildState::Idle,
            segments_added: 0,
            segment_order: Vec::new(),
            traversal: TraversalState::new(),
        };

        triangulator.is_simple = data.valid && triangulator.check_simple_polygon();
        triangulator
    }

    /// Whether the input passed the simple-polygon check.
    pub fn is_simple_polygon(&self) -> bool {
        self.is_simple
    }

    /// Positions of the concatenated input points.
    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    pub fn position(&self, id: PointId) -> Point {
        self.positions[id.to_usize()]
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, id: SegmentId) -> &Segment {
        &self.segments[id.to_usize()]
    }

    /// Winding of each input outline, in input order.
    pub fn outline_windings(&self) -> &[Winding] {
        &self.windings
    }

    /// Root of the search structure, if a map has been built.
    pub fn tree_root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn trapezoid(&self, id: TrapezoidId) -> &Trapezoid {
        &self.trapezoids[id]
    }

    /// The live trapezoids of the current map.
    pub fn trapezoids(&self) -> impl Iterator<Item = (TrapezoidId, &Trapezoid)> {
        self.trapezoids.live()
    }

    pub fn trapezoid_count(&self) -> usize {
        self.trapezoids.live_count()
    }

    /// Tears the trapezoidal map down and resets all step-wise checkpoints.
    pub fn delete_trapezoid_tree(&mut self) {
        self.trapezoids.clear();
        self.nodes.clear();
        self.root = None;

        for pt in &mut self.points {
            pt.node = None;
        }

        self.build = BuildState::Idle;
        self.segments_added = 0;
        self.segment_order.clear();
        self.traversal = TraversalState::new();
    }
}
