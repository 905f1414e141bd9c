use na::Unit;

use crate::math::{Isometry, Point, Real, Rotation, Vector};
use crate::shape::{ConvexShape, SupportMap};

/// The core of a [`ConvexShape`], i.e. the shape with its margin removed.
#[derive(Copy, Clone, Debug)]
pub struct CoreShape<'a>(pub &'a ConvexShape);

impl SupportMap for CoreShape<'_> {
    #[inline]
    fn local_support_point(&self, dir: &Vector<Real>) -> Point<Real> {
        self.0.local_support_vertex_without_margin(dir)
    }
}

/// The Minkowski difference `A - B` of two support-mapped shapes, expressed
/// in the local frame of `A`.
pub struct MinkowskiDiff<'a, G1: ?Sized, G2: ?Sized> {
    shape0: &'a G1,
    shape1: &'a G2,
    /// Rotates a direction from the frame of `A` to the frame of `B`.
    to_shape1: Rotation<Real>,
    /// Maps a point from the frame of `B` to the frame of `A`.
    to_shape0: Isometry<Real>,
}

impl<'a, G1, G2> MinkowskiDiff<'a, G1, G2>
where
    G1: ?Sized + SupportMap,
    G2: ?Sized + SupportMap,
{
    /// The Minkowski difference of `shape0` at `transform0` and `shape1` at `transform1`.
    pub fn new(
        shape0: &'a G1,
        transform0: &Isometry<Real>,
        shape1: &'a G2,
        transform1: &Isometry<Real>,
    ) -> Self {
        Self {
            shape0,
            shape1,
            to_shape1: transform1.rotation.inverse() * transform0.rotation,
            to_shape0: transform0.inv_mul(transform1),
        }
    }

    /// The support point of `A` toward `dir`, in the frame of `A`.
    #[inline]
    pub fn support0(&self, dir: &Vector<Real>) -> Point<Real> {
        self.shape0.local_support_point(dir)
    }

    /// The support point of `B` toward `dir`, in the frame of `A`.
    #[inline]
    pub fn support1(&self, dir: &Vector<Real>) -> Point<Real> {
        self.to_shape0 * self.shape1.local_support_point(&(self.to_shape1 * dir))
    }

    /// The support point of `A - B` toward `dir`.
    #[inline]
    pub fn support(&self, dir: &Vector<Real>) -> Vector<Real> {
        self.support0(dir) - self.support1(&-dir)
    }

    /// The support point of `A` (`index == 0`) or `B` (`index == 1`) toward `dir`.
    #[inline]
    pub fn support_of(&self, dir: &Vector<Real>, index: usize) -> Point<Real> {
        if index == 0 {
            self.support0(dir)
        } else {
            self.support1(dir)
        }
    }
}

impl<G1, G2> SupportMap for MinkowskiDiff<'_, G1, G2>
where
    G1: ?Sized + SupportMap,
    G2: ?Sized + SupportMap,
{
    #[inline]
    fn local_support_point(&self, dir: &Vector<Real>) -> Point<Real> {
        Point::from(self.support(dir))
    }

    #[inline]
    fn local_support_point_toward(&self, dir: &Unit<Vector<Real>>) -> Point<Real> {
        Point::from(self.support(dir))
    }
}
