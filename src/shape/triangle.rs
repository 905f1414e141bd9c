//! Definition of the triangle shape.

use crate::math::{Point, Real, Vector};
use crate::shape::SupportMap;

/// A triangle shape.
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct Triangle {
    /// The triangle first point.
    pub a: Point<Real>,
    /// The triangle second point.
    pub b: Point<Real>,
    /// The triangle third point.
    pub c: Point<Real>,
}

impl Triangle {
    /// Creates a triangle from three points.
    #[inline]
    pub fn new(a: Point<Real>, b: Point<Real>, c: Point<Real>) -> Triangle {
        Triangle { a, b, c }
    }

    /// Reference to an array containing the three vertices of this triangle.
    #[inline]
    pub fn vertices(&self) -> [Point<Real>; 3] {
        [self.a, self.b, self.c]
    }

    /// The unnormalized normal of this triangle, following the counter-clockwise winding `a, b, c`.
    #[inline]
    pub fn scaled_normal(&self) -> Vector<Real> {
        let ab = self.b - self.a;
        let ac = self.c - self.a;
        ab.cross(&ac)
    }

    /// The normal of this triangle, or `None` if it is degenerate.
    #[inline]
    pub fn normal(&self) -> Option<Vector<Real>> {
        self.scaled_normal()
            .try_normalize(crate::math::DEFAULT_EPSILON)
    }

    /// The area of this triangle.
    #[inline]
    pub fn area(&self) -> Real {
        self.scaled_normal().norm() * 0.5
    }

    /// The geometric center of this triangle.
    #[inline]
    pub fn center(&self) -> Point<Real> {
        Point::from((self.a.coords + self.b.coords + self.c.coords) / 3.0)
    }

    /// Tests if two vertices of this triangle are equal within `eps`.
    ///
    /// Such triangles are not able to provide a face normal.
    pub fn has_duplicate_vertices(&self, eps: Real) -> bool {
        let eps2 = eps * eps;
        (self.a - self.b).norm_squared() <= eps2
            || (self.b - self.c).norm_squared() <= eps2
            || (self.c - self.a).norm_squared() <= eps2
    }
}

impl SupportMap for Triangle {
    #[inline]
    fn local_support_point(&self, dir: &Vector<Real>) -> Point<Real> {
        let d1 = self.a.coords.dot(dir);
        let d2 = self.b.coords.dot(dir);
        let d3 = self.c.coords.dot(dir);

        if d1 > d2 {
            if d1 > d3 {
                self.a
            } else {
                self.c
            }
        } else if d2 > d3 {
            self.b
        } else {
            self.c
        }
    }
}

#[cfg(test)]
mod test {
    use crate::shape::Triangle;
    use na::Point3;

    #[test]
    fn test_triangle_area() {
        let pa = Point3::new(0.0, 5.0, 0.0);
        let pb = Point3::new(0.0, 0.0, 0.0);
        let pc = Point3::new(0.0, 0.0, 4.0);

        assert!(relative_eq!(Triangle::new(pa, pb, pc).area(), 10.0));
    }

    #[test]
    fn collapsed_triangle_has_no_normal() {
        let p = Point3::new(1.0, 1.0, 1.0);
        let tri = Triangle::new(p, p, Point3::new(2.0, 0.0, 0.0));
        assert!(tri.has_duplicate_vertices(1.0e-6));
        assert!(tri.normal().is_none());
    }
}
