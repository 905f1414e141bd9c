use crate::math::{Point, Real, Vector};
use crate::shape::ConvexShape;

/// A convex shape uniformly scaled by a positive factor.
#[derive(Debug, Clone)]
pub struct UniformScaling {
    /// The shape being scaled.
    pub child: Box<ConvexShape>,
    /// The scaling factor.
    pub factor: Real,
}

impl UniformScaling {
    /// Scales `child` by `factor`.
    pub fn new(child: ConvexShape, factor: Real) -> Self {
        UniformScaling {
            child: Box::new(child),
            factor,
        }
    }

    pub(crate) fn local_support_point_without_margin(&self, dir: &Vector<Real>) -> Point<Real> {
        self.child.local_support_vertex_without_margin(dir) * self.factor
    }

    /// The margin of the scaled shape.
    pub fn margin(&self) -> Real {
        self.child.margin() * self.factor
    }
}
