//! Integration of rigid motions over a time interval.

use crate::math::{Isometry, Point, Real, Translation, UnitQuaternion, Vector, DEFAULT_EPSILON};

/// The largest rotation angle applied by a single call to [`integrate_transform`].
///
/// Larger angular displacements are clamped to avoid the orientation
/// wrapping around within one step.
pub const ANGULAR_MOTION_THRESHOLD: Real = 0.785_398_2; // PI / 4

/// Integrates the pose `cur` under a constant linear and angular velocity for `dt`.
pub fn integrate_transform(
    cur: &Isometry<Real>,
    linvel: &Vector<Real>,
    angvel: &Vector<Real>,
    dt: Real,
) -> Isometry<Real> {
    let translation = Translation::from(cur.translation.vector + linvel * dt);
    let mut angle = angvel.norm();

    if angle * dt > ANGULAR_MOTION_THRESHOLD {
        angle = ANGULAR_MOTION_THRESHOLD / dt;
    }

    let rotation = match angvel.try_normalize(DEFAULT_EPSILON) {
        Some(axis) => UnitQuaternion::from_scaled_axis(axis * (angle * dt)) * cur.rotation,
        None => cur.rotation,
    };

    Isometry::from_parts(translation, rotation)
}

/// The constant linear and angular velocities moving `from` to `to` in `dt`.
///
/// The angular velocity follows the shortest arc between both orientations.
pub fn calculate_velocity(
    from: &Isometry<Real>,
    to: &Isometry<Real>,
    dt: Real,
) -> (Vector<Real>, Vector<Real>) {
    let linvel = (to.translation.vector - from.translation.vector) / dt;
    let drot = to.rotation * from.rotation.inverse();
    let angvel = drot.scaled_axis() / dt;
    (linvel, angvel)
}

/// Linearly interpolates the translations of `from` and `to`, keeping the
/// orientation of `from`.
pub fn interpolate_translation(
    from: &Isometry<Real>,
    to: &Isometry<Real>,
    t: Real,
) -> Isometry<Real> {
    let origin = from
        .translation
        .vector
        .lerp(&to.translation.vector, t);
    Isometry::from_parts(Translation::from(origin), from.rotation)
}

/// The radius of the sphere centered at the origin enclosing the box `[mins, maxs]`.
///
/// Bounds the displacement of any point of that box under a rotation about the origin.
pub fn angular_motion_disc(mins: &Point<Real>, maxs: &Point<Real>) -> Real {
    let center = na::center(mins, maxs);
    (maxs - mins).norm() * 0.5 + center.coords.norm()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn velocity_round_trips_through_integration() {
        let from = Isometry::new(Vector::new(1.0, 2.0, 3.0), Vector::new(0.1, 0.0, 0.0));
        let to = Isometry::new(Vector::new(2.0, 2.0, 1.0), Vector::new(0.1, 0.3, -0.2));
        let (linvel, angvel) = calculate_velocity(&from, &to, 1.0);
        let integrated = integrate_transform(&from, &linvel, &angvel, 1.0);

        assert_relative_eq!(
            integrated.translation.vector,
            to.translation.vector,
            epsilon = 1.0e-5
        );
        assert!(integrated.rotation.angle_to(&to.rotation) < 1.0e-4);
    }

    #[test]
    fn large_rotations_are_clamped() {
        let cur = Isometry::identity();
        let res = integrate_transform(&cur, &Vector::zeros(), &Vector::new(0.0, 0.0, 10.0), 1.0);
        assert_relative_eq!(res.rotation.angle(), ANGULAR_MOTION_THRESHOLD, epsilon = 1.0e-5);
    }

    #[test]
    fn motion_disc_of_centered_box() {
        let disc = angular_motion_disc(&Point::new(-1.0, -2.0, -2.0), &Point::new(1.0, 2.0, 2.0));
        assert_relative_eq!(disc, 3.0);
    }
}
