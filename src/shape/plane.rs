use crate::math::{Point, Real, UnitVector, Vector};

/// An infinite static plane: the set of points `x` with `normal · x = constant`.
///
/// A plane is not a support-mapped shape. Convex casts handle it as a special
/// target with an analytic closest-point computation.
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct Plane {
    /// The outward normal of the plane.
    pub normal: UnitVector<Real>,
    /// The signed distance from the origin to the plane, along `normal`.
    pub constant: Real,
}

impl Plane {
    /// Creates a new plane.
    #[inline]
    pub fn new(normal: UnitVector<Real>, constant: Real) -> Self {
        Plane { normal, constant }
    }

    /// The signed distance from `pt` to this plane.
    #[inline]
    pub fn signed_distance(&self, pt: &Point<Real>) -> Real {
        self.normal.dot(&pt.coords) - self.constant
    }

    /// The projection of `pt` on this plane.
    #[inline]
    pub fn project_point(&self, pt: &Point<Real>) -> Point<Real> {
        pt - *self.normal * self.signed_distance(pt)
    }

    /// The point of this plane closest to the origin.
    #[inline]
    pub fn origin(&self) -> Point<Real> {
        Point::from(self.normal.into_inner() * self.constant)
    }

    /// The normal of this plane as a plain vector.
    #[inline]
    pub fn normal_vector(&self) -> Vector<Real> {
        self.normal.into_inner()
    }
}
