use crate::dynamics::{ManifoldPoint, RigidBodyHandle};
use crate::math::{Isometry, Real, LARGE_FLOAT};
use arrayvec::ArrayVec;
use ordered_float::OrderedFloat;

/// The maximum number of points kept by a [`PersistentManifold`].
pub const MANIFOLD_CACHE_SIZE: usize = 4;

/// The default distance beyond which a contact point is dropped.
pub const DEFAULT_CONTACT_BREAKING_THRESHOLD: Real = 0.02;

/// A set of at most four contact points between two bodies, kept across steps.
///
/// New points close to an existing one replace it while keeping its
/// accumulated impulses, so that the solver can be warm-started.
#[derive(Clone, Debug)]
pub struct PersistentManifold {
    body_a: RigidBodyHandle,
    body_b: RigidBodyHandle,
    points: ArrayVec<ManifoldPoint, MANIFOLD_CACHE_SIZE>,
    /// Contacts further apart than this distance are removed.
    pub contact_breaking_threshold: Real,
    /// Contacts further apart than this distance are ignored by the solver.
    pub contact_processing_threshold: Real,
}

impl PersistentManifold {
    /// An empty manifold between two bodies.
    pub fn new(body_a: RigidBodyHandle, body_b: RigidBodyHandle) -> Self {
        Self {
            body_a,
            body_b,
            points: ArrayVec::new(),
            contact_breaking_threshold: DEFAULT_CONTACT_BREAKING_THRESHOLD,
            contact_processing_threshold: LARGE_FLOAT,
        }
    }

    /// The first body involved in this contact.
    #[inline]
    pub fn body_a(&self) -> RigidBodyHandle {
        self.body_a
    }

    /// The second body involved in this contact.
    #[inline]
    pub fn body_b(&self) -> RigidBodyHandle {
        self.body_b
    }

    /// The number of points of this manifold.
    #[inline]
    pub fn num_contacts(&self) -> usize {
        self.points.len()
    }

    /// The points of this manifold.
    #[inline]
    pub fn points(&self) -> &[ManifoldPoint] {
        &self.points
    }

    /// Mutable access to the points of this manifold.
    #[inline]
    pub fn points_mut(&mut self) -> &mut [ManifoldPoint] {
        &mut self.points
    }

    /// Removes every point.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Can `pt` be kept in this manifold?
    #[inline]
    pub fn valid_contact_distance(&self, pt: &ManifoldPoint) -> bool {
        pt.distance <= self.contact_breaking_threshold
    }

    /// The index of the point close enough to `new_point` to be considered the same contact.
    pub fn get_cache_entry(&self, new_point: &ManifoldPoint) -> Option<usize> {
        let mut shortest_dist = self.contact_breaking_threshold * self.contact_breaking_threshold;
        let mut nearest = None;

        for (i, pt) in self.points.iter().enumerate() {
            let dist = (pt.local_point_a - new_point.local_point_a).norm_squared();
            if dist < shortest_dist {
                shortest_dist = dist;
                nearest = Some(i);
            }
        }

        nearest
    }

    /// Selects the point replaced by `pt` when this manifold is full.
    ///
    /// The deepest point is always kept. Among the other candidates, the one
    /// whose replacement yields the largest contact area is chosen.
    fn sort_cached_points(&self, pt: &ManifoldPoint) -> usize {
        let mut deepest = None;
        let mut max_penetration = pt.distance;
        for (i, cached) in self.points.iter().enumerate() {
            if cached.distance < max_penetration {
                deepest = Some(i);
                max_penetration = cached.distance;
            }
        }

        let p = |i: usize| self.points[i].local_point_a;
        let new = pt.local_point_a;
        let area = |i: usize, a: usize, b: usize, c: usize| {
            if deepest == Some(i) {
                0.0
            } else {
                (new - p(a)).cross(&(p(b) - p(c))).norm_squared()
            }
        };

        let res = [
            area(0, 1, 3, 2),
            area(1, 0, 3, 2),
            area(2, 0, 3, 1),
            area(3, 0, 2, 1),
        ];

        // Ties resolve to the smallest index.
        (0..MANIFOLD_CACHE_SIZE)
            .rev()
            .max_by_key(|i| OrderedFloat(res[*i]))
            .unwrap_or(0)
    }

    /// Inserts a new point, evicting one if this manifold is full.
    ///
    /// Returns the index the point was stored at.
    pub fn add_manifold_point(&mut self, new_point: ManifoldPoint) -> usize {
        debug_assert!(self.valid_contact_distance(&new_point));

        if self.points.len() == MANIFOLD_CACHE_SIZE {
            let index = self.sort_cached_points(&new_point);
            self.points[index] = new_point;
            index
        } else {
            self.points.push(new_point);
            self.points.len() - 1
        }
    }

    /// Replaces the point at `index`, keeping its accumulated impulses and lifetime.
    pub fn replace_contact_point(&mut self, new_point: ManifoldPoint, index: usize) {
        let old = &self.points[index];
        let lifetime = old.lifetime;
        let applied_impulse = old.applied_impulse;
        let lateral1 = old.applied_impulse_lateral1;
        let lateral2 = old.applied_impulse_lateral2;

        let pt = &mut self.points[index];
        *pt = new_point;
        pt.applied_impulse = applied_impulse;
        pt.applied_impulse_lateral1 = lateral1;
        pt.applied_impulse_lateral2 = lateral2;
        pt.lifetime = lifetime;
    }

    /// Removes the point at `index`; the last point takes its place.
    pub fn remove_contact_point(&mut self, index: usize) {
        let _ = self.points.swap_remove(index);
    }

    /// Updates the world-space points and distances after both bodies moved,
    /// then removes the points that separated or slid too far.
    pub fn refresh_contact_points(&mut self, pos_a: &Isometry<Real>, pos_b: &Isometry<Real>) {
        for pt in self.points.iter_mut().rev() {
            pt.position_world_on_a = pos_a * pt.local_point_a;
            pt.position_world_on_b = pos_b * pt.local_point_b;
            pt.distance =
                (pt.position_world_on_a - pt.position_world_on_b).dot(&pt.normal_world_on_b);
            pt.lifetime += 1;
        }

        let threshold2 = self.contact_breaking_threshold * self.contact_breaking_threshold;

        for i in (0..self.points.len()).rev() {
            let pt = &self.points[i];

            if !self.valid_contact_distance(pt) {
                self.remove_contact_point(i);
            } else {
                let projected = pt.position_world_on_a - pt.normal_world_on_b * pt.distance;
                let dist_2d = (pt.position_world_on_b - projected).norm_squared();

                if dist_2d > threshold2 {
                    self.remove_contact_point(i);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::{RigidBody, RigidBodySet};
    use crate::math::{Point, Vector};

    fn manifold() -> PersistentManifold {
        let mut bodies = RigidBodySet::new();
        let a = bodies.insert(RigidBody::new_static(Isometry::identity()));
        let b = bodies.insert(RigidBody::new_static(Isometry::identity()));
        PersistentManifold::new(a, b)
    }

    fn point(x: Real, z: Real, distance: Real) -> ManifoldPoint {
        let p = Point::new(x, 0.0, z);
        ManifoldPoint::new(p, p, Vector::y(), distance)
    }

    #[test]
    fn nearby_points_share_a_cache_entry() {
        let mut m = manifold();
        let _ = m.add_manifold_point(point(0.0, 0.0, -0.01));
        let _ = m.add_manifold_point(point(1.0, 0.0, -0.01));

        assert_eq!(m.get_cache_entry(&point(1.001, 0.0, 0.0)), Some(1));
        assert_eq!(m.get_cache_entry(&point(0.5, 0.0, 0.0)), None);
    }

    #[test]
    fn replacement_keeps_impulses() {
        let mut m = manifold();
        let _ = m.add_manifold_point(point(0.0, 0.0, -0.01));
        m.points_mut()[0].applied_impulse = 3.0;
        m.points_mut()[0].lifetime = 7;

        m.replace_contact_point(point(0.001, 0.0, -0.02), 0);
        assert_eq!(m.points()[0].applied_impulse, 3.0);
        assert_eq!(m.points()[0].lifetime, 7);
        assert_eq!(m.points()[0].distance, -0.02);
    }

    #[test]
    fn full_manifold_keeps_the_deepest_point() {
        let mut m = manifold();
        let _ = m.add_manifold_point(point(-1.0, -1.0, -0.5));
        let _ = m.add_manifold_point(point(1.0, -1.0, -0.01));
        let _ = m.add_manifold_point(point(1.0, 1.0, -0.01));
        let _ = m.add_manifold_point(point(-1.0, 1.0, -0.01));

        let index = m.add_manifold_point(point(0.0, 0.0, -0.01));
        assert_ne!(index, 0);
        assert_eq!(m.num_contacts(), MANIFOLD_CACHE_SIZE);
        assert_eq!(m.points()[0].distance, -0.5);
    }

    #[test]
    fn refresh_drops_separated_points() {
        let mut m = manifold();
        let _ = m.add_manifold_point(point(0.0, 0.0, 0.0));
        let _ = m.add_manifold_point(point(1.0, 0.0, 0.0));

        // Body A moves away along the normal.
        let pos_a = Isometry::translation(0.0, 0.5, 0.0);
        m.refresh_contact_points(&pos_a, &Isometry::identity());
        assert_eq!(m.num_contacts(), 0);
    }

    #[test]
    fn refresh_drops_sliding_points() {
        let mut m = manifold();
        let _ = m.add_manifold_point(point(0.0, 0.0, 0.0));

        let pos_a = Isometry::translation(0.5, 0.0, 0.0);
        m.refresh_contact_points(&pos_a, &Isometry::identity());
        assert_eq!(m.num_contacts(), 0);

        let _ = m.add_manifold_point(point(0.0, 0.0, 0.0));
        m.refresh_contact_points(&Isometry::translation(0.0, -0.001, 0.0), &Isometry::identity());
        assert_eq!(m.num_contacts(), 1);
        assert_eq!(m.points()[0].lifetime, 1);
        assert_relative_eq!(m.points()[0].distance, -0.001, epsilon = 1.0e-6);
    }
}
