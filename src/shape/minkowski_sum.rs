use crate::math::{Isometry, Point, Real, Vector};
use crate::shape::ConvexShape;

/// The Minkowski sum of two convex shapes, each with its own local placement.
///
/// Its support point toward `d` is the sum of the support points of both
/// operands toward `d`.
#[derive(Debug, Clone)]
pub struct MinkowskiSum {
    /// The first operand.
    pub shape_a: Box<ConvexShape>,
    /// The second operand.
    pub shape_b: Box<ConvexShape>,
    /// The placement of the first operand relative to the sum.
    pub transform_a: Isometry<Real>,
    /// The placement of the second operand relative to the sum.
    pub transform_b: Isometry<Real>,
}

impl MinkowskiSum {
    /// Creates the Minkowski sum of two shapes placed at the origin.
    pub fn new(shape_a: ConvexShape, shape_b: ConvexShape) -> Self {
        Self::with_transforms(
            shape_a,
            Isometry::identity(),
            shape_b,
            Isometry::identity(),
        )
    }

    /// Creates the Minkowski sum of two shapes with explicit placements.
    pub fn with_transforms(
        shape_a: ConvexShape,
        transform_a: Isometry<Real>,
        shape_b: ConvexShape,
        transform_b: Isometry<Real>,
    ) -> Self {
        MinkowskiSum {
            shape_a: Box::new(shape_a),
            shape_b: Box::new(shape_b),
            transform_a,
            transform_b,
        }
    }

    /// The margin-exclusive support point of this sum.
    pub(crate) fn local_support_point_without_margin(&self, dir: &Vector<Real>) -> Point<Real> {
        let dir_a = self.transform_a.inverse_transform_vector(dir);
        let dir_b = self.transform_b.inverse_transform_vector(dir);
        let pa = self.transform_a * self.shape_a.local_support_vertex_without_margin(&dir_a);
        let pb = self.transform_b * self.shape_b.local_support_vertex_without_margin(&dir_b);
        pa + pb.coords
    }

    /// The margin of the sum: the sum of the operand margins.
    pub fn margin(&self) -> Real {
        self.shape_a.margin() + self.shape_b.margin()
    }
}
