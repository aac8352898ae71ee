use core::fmt;

/// The triangulator's result type.
pub type TriangulationResult = Result<(), TriangulationError>;

/// Describes an unexpected error happening while building the trapezoidal
/// map or triangulating.
///
/// These indicate a corrupted trapezoid graph and should be unreachable for
/// inputs that pass the simple-polygon check; in debug builds the offending
/// site also asserts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InternalError {
    /// A trapezoid lost its upper or lower neighbor mid-thread.
    MissingNeighbor,
    /// The search structure has no leaf where one was expected, or a parent
    /// chain ended before reaching the expected segment node.
    SearchStructureCorrupt,
    /// A monotone chain came out with fewer than three vertices.
    DegenerateMonotoneChain,
}

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InternalError::MissingNeighbor => {
                write!(f, "A trapezoid neighbor link is missing")
            }
            InternalError::SearchStructureCorrupt => {
                write!(f, "The search structure is corrupt")
            }
            InternalError::DegenerateMonotoneChain => {
                write!(f, "A monotone chain has fewer than three vertices")
            }
        }
    }
}

impl std::error::Error for InternalError {}

/// The triangulator's error enumeration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TriangulationError {
    /// The input failed the simple-polygon check: an outline with fewer than
    /// three vertices, coincident points, or intersecting segments.
    NotSimplePolygon,
    /// `triangulate` was called without a trapezoidal map to work on.
    NoTrapezoidTree,
    Internal(InternalError),
}

impl fmt::Display for TriangulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriangulationError::NotSimplePolygon => {
                write!(f, "The input is not a simple polygon")
            }
            TriangulationError::NoTrapezoidTree => {
                write!(f, "No trapezoidal map has been built")
            }
            TriangulationError::Internal(e) => {
                write!(f, "Internal error: {}", e)
            }
        }
    }
}

impl std::error::Error for TriangulationError {}

impl From<InternalError> for TriangulationError {
    fn from(value: InternalError) -> Self {
        TriangulationError::Internal(value)
    }
}
