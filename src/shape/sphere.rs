use crate::math::{Point, Real, Vector};
use crate::shape::SupportMap;

/// A sphere centered at the origin.
///
/// The whole radius of a sphere acts as its collision margin: its core shape,
/// as seen by the margin-exclusive support function, is a single point.
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct Sphere {
    /// The radius of the sphere.
    pub radius: Real,
}

impl Sphere {
    /// Creates a new sphere with the given radius.
    #[inline]
    pub fn new(radius: Real) -> Sphere {
        Sphere { radius }
    }
}

impl SupportMap for Sphere {
    #[inline]
    fn local_support_point(&self, dir: &Vector<Real>) -> Point<Real> {
        match dir.try_normalize(crate::math::DEFAULT_EPSILON) {
            Some(n) => Point::from(n * self.radius),
            None => Point::new(self.radius, 0.0, 0.0),
        }
    }
}
