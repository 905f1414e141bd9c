use crate::math::Real;
use crate::shape::ShapeType;

/// Errors raised when building a shape from invalid input.
#[derive(thiserror::Error, Copy, Clone, Debug, PartialEq)]
pub enum ShapeError {
    /// A polyhedron needs at least one point.
    #[error("a convex polyhedron must contain at least one point.")]
    EmptyPointCloud,
    /// One of the input points has a NaN or infinite coordinate.
    #[error("the point {0} has non-finite coordinates.")]
    NonFinitePoint(usize),
    /// Scaling factors must be strictly positive.
    #[error("invalid scaling factor {0}: scaling factors must be strictly positive.")]
    InvalidScaling(Real),
    /// Margins must be non-negative.
    #[error("invalid collision margin {0}: margins must be non-negative.")]
    InvalidMargin(Real),
    /// The margin of this shape is derived from its geometry and cannot be set.
    #[error("the margin of a {0:?} shape is derived from its geometry and cannot be set.")]
    DerivedMargin(ShapeType),
}
