use super::joint_row::{rotation_from_basis, JointLimit, JointRows, RowParams};
use super::{ConstraintError, Generic6DofJoint};
use crate::dynamics::RigidBody;
use crate::math::{Isometry, Point, Real, Translation, Vector, DEFAULT_EPSILON};

const UNIVERSAL_EPS: Real = 0.01;

/// A joint where the first body rotates around `axis1` and the second one
/// around `axis2`, both axes crossing at a common anchor.
///
/// Internally a [`Generic6DofJoint`] whose frame `z` axis is `axis1` and `y`
/// axis is `axis2`: the rotation around `x` is locked, the one around `y`
/// is bounded to `±π/2` and the one around `z` to `±π`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UniversalJoint {
    joint: Generic6DofJoint,
}

impl UniversalJoint {
    /// A universal joint from a world-space anchor and two world-space axes,
    /// given the current poses of both bodies.
    ///
    /// Fails with [`ConstraintError::DegenerateAxis`] if the axes are null or parallel.
    pub fn new(
        pos_a: &Isometry<Real>,
        pos_b: &Isometry<Real>,
        anchor: Point<Real>,
        axis1: Vector<Real>,
        axis2: Vector<Real>,
    ) -> Result<Self, ConstraintError> {
        let z = axis1
            .try_normalize(DEFAULT_EPSILON)
            .ok_or(ConstraintError::DegenerateAxis)?;
        let x = axis2
            .cross(&z)
            .try_normalize(DEFAULT_EPSILON)
            .ok_or(ConstraintError::DegenerateAxis)?;
        let y = z.cross(&x);

        let frame = Isometry::from_parts(
            Translation::from(anchor.coords),
            rotation_from_basis(&x, &y, &z),
        );

        let mut joint = Generic6DofJoint::new(pos_a.inv_mul(&frame), pos_b.inv_mul(&frame));
        let half_pi = core::f64::consts::FRAC_PI_2 as Real;
        let pi = core::f64::consts::PI as Real;
        joint.angular_limits = [
            JointLimit::locked(0.0),
            JointLimit::new(-half_pi + UNIVERSAL_EPS, half_pi - UNIVERSAL_EPS),
            JointLimit::new(-pi + UNIVERSAL_EPS, pi - UNIVERSAL_EPS),
        ];

        Ok(Self { joint })
    }

    /// The underlying six degrees of freedom joint.
    pub fn joint(&self) -> &Generic6DofJoint {
        &self.joint
    }

    /// Sets the bounds of the rotations around both axes.
    pub fn set_limits(&mut self, axis1: JointLimit, axis2: JointLimit) {
        self.joint.angular_limits[2] = axis1;
        self.joint.angular_limits[1] = axis2;
    }

    pub(crate) fn append_rows(
        &self,
        body_a: &RigidBody,
        body_b: &RigidBody,
        params: &RowParams,
        rows: &mut JointRows,
    ) {
        self.joint.append_rows(body_a, body_b, params, rows)
    }
}
