use super::joint_row::{JointFrames, JointRows, RowParams};
use crate::dynamics::RigidBody;
use crate::math::{Isometry, Real, Vector, DIM};

/// A joint removing every relative motion between two bodies.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FixedJoint {
    /// The joint frame, in the local frame of the first body.
    pub frame_in_a: Isometry<Real>,
    /// The joint frame, in the local frame of the second body.
    pub frame_in_b: Isometry<Real>,
}

impl FixedJoint {
    /// A joint keeping both frames coincident.
    pub fn new(frame_in_a: Isometry<Real>, frame_in_b: Isometry<Real>) -> Self {
        Self {
            frame_in_a,
            frame_in_b,
        }
    }

    /// A joint freezing the current relative pose of both bodies.
    pub fn from_current_poses(body_a: &RigidBody, body_b: &RigidBody) -> Self {
        Self::new(
            Isometry::identity(),
            body_b.position().inv_mul(body_a.position()),
        )
    }

    pub(crate) fn append_rows(
        &self,
        body_a: &RigidBody,
        body_b: &RigidBody,
        params: &RowParams,
        rows: &mut JointRows,
    ) {
        let frames = JointFrames::new(body_a, &self.frame_in_a, body_b, &self.frame_in_b);
        let angular_error = frames.angular_error();

        for i in 0..DIM {
            let axis = Vector::ith(i, 1.0);
            frames.push_locked_linear_row(rows, &axis, params, i);
        }

        for i in 0..DIM {
            let axis = Vector::ith(i, 1.0);
            frames.push_locked_angular_row(rows, &axis, angular_error[i], params, 3 + i);
        }
    }
}
