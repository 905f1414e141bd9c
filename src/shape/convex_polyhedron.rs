use crate::math::{Point, Real, Vector};
use crate::shape::{ShapeError, SupportMap};
use crate::utils;

/// A convex polyhedron described by the point cloud it is the convex hull of.
///
/// The hull itself is never computed: the support function of a point cloud
/// is the support function of its convex hull.
#[derive(PartialEq, Debug, Clone)]
pub struct ConvexPolyhedron {
    points: Vec<Point<Real>>,
}

impl ConvexPolyhedron {
    /// Creates a convex polyhedron from the given points.
    ///
    /// Fails if `points` is empty or contains non-finite coordinates.
    pub fn try_new(points: Vec<Point<Real>>) -> Result<Self, ShapeError> {
        if points.is_empty() {
            return Err(ShapeError::EmptyPointCloud);
        }

        if let Some(i) = points
            .iter()
            .position(|pt| pt.coords.iter().any(|x| !x.is_finite()))
        {
            return Err(ShapeError::NonFinitePoint(i));
        }

        Ok(ConvexPolyhedron { points })
    }

    /// The points this polyhedron is the convex hull of.
    #[inline]
    pub fn points(&self) -> &[Point<Real>] {
        &self.points
    }
}

impl SupportMap for ConvexPolyhedron {
    #[inline]
    fn local_support_point(&self, dir: &Vector<Real>) -> Point<Real> {
        utils::point_cloud_support_point(dir, self.points())
    }
}

#[cfg(test)]
mod test {
    use crate::math::{Point, Vector};
    use crate::shape::{ConvexPolyhedron, ShapeError, SupportMap};

    #[test]
    fn rejects_empty_point_cloud() {
        assert_eq!(
            ConvexPolyhedron::try_new(vec![]),
            Err(ShapeError::EmptyPointCloud)
        );
    }

    #[test]
    fn support_of_tetrahedron() {
        let poly = ConvexPolyhedron::try_new(vec![
            Point::origin(),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
            Point::new(0.0, 0.0, 1.0),
        ])
        .unwrap();
        assert_eq!(
            poly.local_support_point(&Vector::new(0.1, 0.2, 1.0)),
            Point::new(0.0, 0.0, 1.0)
        );
    }
}
