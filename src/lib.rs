//! Polygon triangulation based on Seidel's trapezoidation algorithm.
//!
//! This meta-crate (`seidel`) reexports the `seidel_triangulation` crate for
//! convenience.
//!
//! ```ignore
//! use seidel::triangulation::Triangulator;
//! ```
//!
//! Is equivalent to:
//!
//! ```ignore
//! use seidel_triangulation::Triangulator;
//! ```
//!
//! See the [`triangulation`](crate::triangulation) module for the actual
//! documentation and examples.

pub use seidel_triangulation as triangulation;

pub use seidel_triangulation::math;

#[doc(inline)]
pub use seidel_triangulation::{
    FillRule, Node, NodeId, NodeKind, Outline, PointId, Segment, SegmentId, Side, Trapezoid,
    TrapezoidId, TrapezoidationInfo, TriangulateOutput, TriangulationError, TriangulationInfo,
    TriangulationResult, TriangulationState, Triangulator, Winding,
};
