use crate::math::{Point, Real, Vector};
use crate::shape::SupportMap;

/// An axis-aligned box centered at the origin.
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct BoxShape {
    /// The half-extents of the box, margin included.
    pub half_extents: Vector<Real>,
}

impl BoxShape {
    /// Creates a new box from its half-extents.
    #[inline]
    pub fn new(half_extents: Vector<Real>) -> BoxShape {
        BoxShape { half_extents }
    }

    /// The outward normals of the six faces of this box.
    pub fn face_normals() -> [Vector<Real>; 6] {
        [
            Vector::x(),
            -Vector::x(),
            Vector::y(),
            -Vector::y(),
            Vector::z(),
            -Vector::z(),
        ]
    }
}

impl SupportMap for BoxShape {
    #[inline]
    fn local_support_point(&self, dir: &Vector<Real>) -> Point<Real> {
        Point::new(
            self.half_extents.x.copysign(dir.x),
            self.half_extents.y.copysign(dir.y),
            self.half_extents.z.copysign(dir.z),
        )
    }
}

#[cfg(test)]
mod test {
    use crate::math::{Point, Vector};
    use crate::shape::{BoxShape, SupportMap};

    #[test]
    fn box_support_picks_the_corner_facing_the_direction() {
        let b = BoxShape::new(Vector::new(1.0, 2.0, 3.0));
        let pt = b.local_support_point(&Vector::new(-0.5, 1.0, -2.0));
        assert_eq!(pt, Point::new(-1.0, 2.0, -3.0));
    }
}
