//! Inputs and result sinks shared by the discrete collision detectors.

use crate::math::{Isometry, Point, Real, Vector, LARGE_FLOAT};

/// The input of a discrete closest-points query between two shapes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClosestPointInput {
    /// The world-space pose of the first shape.
    pub transform_a: Isometry<Real>,
    /// The world-space pose of the second shape.
    pub transform_b: Isometry<Real>,
    /// Pairs further apart than the square root of this value are reported as non-intersecting.
    pub maximum_distance_squared: Real,
}

impl Default for ClosestPointInput {
    fn default() -> Self {
        Self {
            transform_a: Isometry::identity(),
            transform_b: Isometry::identity(),
            maximum_distance_squared: LARGE_FLOAT,
        }
    }
}

impl ClosestPointInput {
    /// Creates an input for shapes at the given poses, with an unbounded maximum distance.
    pub fn new(transform_a: Isometry<Real>, transform_b: Isometry<Real>) -> Self {
        Self {
            transform_a,
            transform_b,
            ..Default::default()
        }
    }
}

/// A sink for the contact points found by a discrete collision detector.
pub trait ClosestPointsResult {
    /// Identifies the sub-parts of the first shape the next points belong to.
    fn set_shape_identifiers_a(&mut self, _part_id: i32, _index: i32) {}

    /// Identifies the sub-parts of the second shape the next points belong to.
    fn set_shape_identifiers_b(&mut self, _part_id: i32, _index: i32) {}

    /// Reports a contact point.
    ///
    /// `normal_on_b_in_world` points from the second shape toward the first.
    /// `depth` is negative when the shapes penetrate.
    fn add_contact_point(
        &mut self,
        normal_on_b_in_world: &Vector<Real>,
        point_in_world: &Point<Real>,
        depth: Real,
    );
}

/// A result sink keeping only the closest (or deepest) reported point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointCollector {
    /// The normal of the retained point, pointing from the second shape toward the first.
    pub normal_on_b_in_world: Vector<Real>,
    /// The retained point, on the second shape.
    pub point_in_world: Point<Real>,
    /// The signed distance of the retained point.
    pub distance: Real,
    /// Whether any point was reported.
    pub has_result: bool,
}

impl Default for PointCollector {
    fn default() -> Self {
        Self {
            normal_on_b_in_world: Vector::zeros(),
            point_in_world: Point::origin(),
            distance: LARGE_FLOAT,
            has_result: false,
        }
    }
}

impl PointCollector {
    /// The point on the first shape matching the retained point.
    pub fn point_on_a(&self) -> Point<Real> {
        self.point_in_world + self.normal_on_b_in_world * self.distance
    }
}

impl ClosestPointsResult for PointCollector {
    fn add_contact_point(
        &mut self,
        normal_on_b_in_world: &Vector<Real>,
        point_in_world: &Point<Real>,
        depth: Real,
    ) {
        if depth < self.distance {
            self.has_result = true;
            self.normal_on_b_in_world = *normal_on_b_in_world;
            self.point_in_world = *point_in_world;
            self.distance = depth;
        }
    }
}

/// An algorithm computing the closest points between two shapes at fixed poses.
pub trait DiscreteCollisionDetector {
    /// Computes the closest points between the two shapes and reports them to `output`.
    ///
    /// Nothing is reported if the shapes are further apart than allowed by the input.
    fn get_closest_points(
        &mut self,
        input: &ClosestPointInput,
        output: &mut dyn ClosestPointsResult,
    );
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn point_collector_keeps_the_deepest_point() {
        let mut collector = PointCollector::default();
        assert!(!collector.has_result);

        collector.add_contact_point(&Vector::x(), &Point::new(1.0, 0.0, 0.0), 0.5);
        collector.add_contact_point(&Vector::y(), &Point::new(0.0, 1.0, 0.0), -0.1);
        collector.add_contact_point(&Vector::z(), &Point::new(0.0, 0.0, 1.0), 0.2);

        assert!(collector.has_result);
        assert_eq!(collector.normal_on_b_in_world, Vector::y());
        assert_eq!(collector.distance, -0.1);
        assert_relative_eq!(collector.point_on_a(), Point::new(0.0, 0.9, 0.0));
    }
}
