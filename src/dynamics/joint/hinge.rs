use super::joint_row::{
    push_limit_motor_row, rotation_from_basis, JointFrames, JointLimit, JointMotor, JointRow,
    JointRows, RowParams,
};
use crate::dynamics::RigidBody;
use crate::math::{Isometry, Point, Real, Rotation, Translation, Vector, DIM};
use crate::utils::plane_space;

/// A joint allowing only the rotation around one axis.
///
/// The hinge axis is the `z` axis of both joint frames.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HingeJoint {
    /// The joint frame, in the local frame of the first body.
    pub frame_in_a: Isometry<Real>,
    /// The joint frame, in the local frame of the second body.
    pub frame_in_b: Isometry<Real>,
    /// The range of the hinge angle.
    pub limit: JointLimit,
    /// The motor driving the hinge angle.
    pub motor: Option<JointMotor>,
}

impl HingeJoint {
    /// A hinge between two joint frames.
    pub fn new(frame_in_a: Isometry<Real>, frame_in_b: Isometry<Real>) -> Self {
        Self {
            frame_in_a,
            frame_in_b,
            limit: JointLimit::FREE,
            motor: None,
        }
    }

    /// A hinge from a pivot and an axis expressed in each body's local frame.
    ///
    /// The reference directions of both frames are chosen so that the hinge
    /// angle is zero when both axes coincide.
    pub fn from_pivots_and_axes(
        pivot_in_a: Point<Real>,
        pivot_in_b: Point<Real>,
        axis_in_a: Vector<Real>,
        axis_in_b: Vector<Real>,
    ) -> Self {
        let axis_in_a = axis_in_a.normalize();
        let axis_in_b = axis_in_b.normalize();
        let (a1, a2) = plane_space(&axis_in_a);

        let arc = Rotation::rotation_between(&axis_in_a, &axis_in_b)
            .unwrap_or_else(|| Rotation::from_scaled_axis(a1 * core::f64::consts::PI as Real));
        let b1 = arc * a1;
        let b2 = axis_in_b.cross(&b1);

        let frame_in_a = Isometry::from_parts(
            Translation::from(pivot_in_a.coords),
            rotation_from_basis(&a1, &a2, &axis_in_a),
        );
        let frame_in_b = Isometry::from_parts(
            Translation::from(pivot_in_b.coords),
            rotation_from_basis(&b1, &b2, &axis_in_b),
        );
        Self::new(frame_in_a, frame_in_b)
    }

    /// The rotation angle of the second body relative to the first one around the hinge axis.
    pub fn hinge_angle(&self, body_a: &RigidBody, body_b: &RigidBody) -> Real {
        let frames = JointFrames::new(body_a, &self.frame_in_a, body_b, &self.frame_in_b);
        Self::angle(&frames)
    }

    fn angle(frames: &JointFrames) -> Real {
        let b_x = frames.axis_b(0);
        b_x.dot(&frames.axis_a(1)).atan2(b_x.dot(&frames.axis_a(0)))
    }

    pub(crate) fn append_rows(
        &self,
        body_a: &RigidBody,
        body_b: &RigidBody,
        params: &RowParams,
        rows: &mut JointRows,
    ) {
        let frames = JointFrames::new(body_a, &self.frame_in_a, body_b, &self.frame_in_b);

        for i in 0..DIM {
            frames.push_locked_linear_row(rows, &Vector::ith(i, 1.0), params, i);
        }

        let ax1 = frames.axis_a(2);
        let misalignment = ax1.cross(&frames.axis_b(2));

        for i in 0..2 {
            let perp = frames.axis_a(i);
            frames.push_locked_angular_row(rows, &perp, misalignment.dot(&perp), params, 3 + i);
        }

        push_limit_motor_row(
            rows,
            JointRow::angular(&ax1),
            Self::angle(&frames),
            &self.limit,
            self.motor.as_ref(),
            params,
            5,
            true,
        );
    }
}
