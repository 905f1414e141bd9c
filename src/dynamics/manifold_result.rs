use crate::dynamics::{ManifoldPoint, PersistentManifold, RigidBody};
use crate::math::{Point, Real, Vector};
use crate::query::ClosestPointsResult;

/// The largest magnitude of a combined friction coefficient.
pub const MAX_FRICTION: Real = 10.0;

/// The friction coefficient of a contact between two bodies.
pub fn combined_friction(body_a: &RigidBody, body_b: &RigidBody) -> Real {
    (body_a.friction * body_b.friction).clamp(-MAX_FRICTION, MAX_FRICTION)
}

/// The restitution coefficient of a contact between two bodies.
pub fn combined_restitution(body_a: &RigidBody, body_b: &RigidBody) -> Real {
    body_a.restitution * body_b.restitution
}

/// The rolling friction coefficient of a contact between two bodies.
pub fn combined_rolling_friction(body_a: &RigidBody, body_b: &RigidBody) -> Real {
    (body_a.rolling_friction * body_b.friction + body_b.rolling_friction * body_a.friction)
        .clamp(-MAX_FRICTION, MAX_FRICTION)
}

/// The spinning friction coefficient of a contact between two bodies.
pub fn combined_spinning_friction(body_a: &RigidBody, body_b: &RigidBody) -> Real {
    (body_a.spinning_friction * body_b.friction + body_b.spinning_friction * body_a.friction)
        .clamp(-MAX_FRICTION, MAX_FRICTION)
}

/// A [`ClosestPointsResult`] feeding the points found by a collision detector
/// into a [`PersistentManifold`].
///
/// `body_a` and `body_b` must be the bodies of the manifold, in the same order.
pub struct ManifoldResult<'a> {
    manifold: &'a mut PersistentManifold,
    body_a: &'a RigidBody,
    body_b: &'a RigidBody,
    part_id0: i32,
    part_id1: i32,
    index0: i32,
    index1: i32,
}

impl<'a> ManifoldResult<'a> {
    /// Creates a result sink writing into `manifold`.
    pub fn new(
        manifold: &'a mut PersistentManifold,
        body_a: &'a RigidBody,
        body_b: &'a RigidBody,
    ) -> Self {
        Self {
            manifold,
            body_a,
            body_b,
            part_id0: -1,
            part_id1: -1,
            index0: -1,
            index1: -1,
        }
    }

    /// Drops the manifold points that are no longer valid for the current body poses.
    pub fn refresh_contact_points(&mut self) {
        self.manifold
            .refresh_contact_points(self.body_a.position(), self.body_b.position());
    }
}

impl<'a> ClosestPointsResult for ManifoldResult<'a> {
    fn set_shape_identifiers_a(&mut self, part_id: i32, index: i32) {
        self.part_id0 = part_id;
        self.index0 = index;
    }

    fn set_shape_identifiers_b(&mut self, part_id: i32, index: i32) {
        self.part_id1 = part_id;
        self.index1 = index;
    }

    fn add_contact_point(
        &mut self,
        normal_on_b_in_world: &Vector<Real>,
        point_in_world: &Point<Real>,
        depth: Real,
    ) {
        if depth > self.manifold.contact_breaking_threshold {
            return;
        }

        let point_a = point_in_world + normal_on_b_in_world * depth;
        let local_a = self.body_a.position().inverse_transform_point(&point_a);
        let local_b = self
            .body_b
            .position()
            .inverse_transform_point(point_in_world);

        let mut new_pt = ManifoldPoint::new(local_a, local_b, *normal_on_b_in_world, depth);
        new_pt.position_world_on_a = point_a;
        new_pt.position_world_on_b = *point_in_world;
        new_pt.combined_friction = combined_friction(self.body_a, self.body_b);
        new_pt.combined_restitution = combined_restitution(self.body_a, self.body_b);
        new_pt.combined_rolling_friction = combined_rolling_friction(self.body_a, self.body_b);
        new_pt.combined_spinning_friction = combined_spinning_friction(self.body_a, self.body_b);
        new_pt.part_id0 = self.part_id0;
        new_pt.part_id1 = self.part_id1;
        new_pt.index0 = self.index0;
        new_pt.index1 = self.index1;

        match self.manifold.get_cache_entry(&new_pt) {
            Some(index) => self.manifold.replace_contact_point(new_pt, index),
            None => {
                let _ = self.manifold.add_manifold_point(new_pt);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::RigidBodySet;
    use crate::math::Isometry;

    #[test]
    fn contact_points_are_combined_and_cached() {
        let mut bodies = RigidBodySet::new();
        let mut a = RigidBody::new_dynamic(
            Isometry::translation(0.0, 1.0, 0.0),
            1.0,
            Vector::repeat(1.0),
        );
        a.friction = 0.5;
        a.rolling_friction = 0.1;
        a.restitution = 0.5;
        let mut b = RigidBody::new_static(Isometry::identity());
        b.friction = 0.8;
        b.restitution = 0.2;

        let ha = bodies.insert(a.clone());
        let hb = bodies.insert(b.clone());
        let mut manifold = PersistentManifold::new(ha, hb);

        {
            let mut result = ManifoldResult::new(&mut manifold, &a, &b);
            result.add_contact_point(&Vector::y(), &Point::new(0.0, 0.01, 0.0), -0.01);
            // Too far, ignored.
            result.add_contact_point(&Vector::y(), &Point::new(2.0, 0.0, 0.0), 0.5);
            // Same contact, replaces the first one.
            result.add_contact_point(&Vector::y(), &Point::new(0.0, 0.015, 0.0), -0.015);
        }

        assert_eq!(manifold.num_contacts(), 1);
        let pt = &manifold.points()[0];
        assert_relative_eq!(pt.combined_friction, 0.4);
        assert_relative_eq!(pt.combined_restitution, 0.1);
        assert_relative_eq!(pt.combined_rolling_friction, 0.08);
        assert_relative_eq!(pt.distance, -0.015);
        assert_relative_eq!(pt.local_point_a, Point::new(0.0, -1.0, 0.0), epsilon = 1.0e-6);
    }
}
