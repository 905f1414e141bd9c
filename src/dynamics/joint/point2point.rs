use super::joint_row::{JointFrames, JointRows, RowParams};
use crate::dynamics::RigidBody;
use crate::math::{Point, Real, Vector, DIM};

/// A ball-and-socket joint keeping two pivot points at the same location.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point2PointJoint {
    /// The pivot, in the local frame of the first body.
    pub pivot_in_a: Point<Real>,
    /// The pivot, in the local frame of the second body.
    pub pivot_in_b: Point<Real>,
    /// If positive, the largest impulse applied along each axis during one step.
    pub impulse_clamp: Real,
}

impl Point2PointJoint {
    /// A joint between two pivots given in each body's local frame.
    pub fn new(pivot_in_a: Point<Real>, pivot_in_b: Point<Real>) -> Self {
        Self {
            pivot_in_a,
            pivot_in_b,
            impulse_clamp: 0.0,
        }
    }

    pub(crate) fn append_rows(
        &self,
        body_a: &RigidBody,
        body_b: &RigidBody,
        params: &RowParams,
        rows: &mut JointRows,
    ) {
        let frames = JointFrames::from_pivots(body_a, &self.pivot_in_a, body_b, &self.pivot_in_b);

        for i in 0..DIM {
            frames.push_locked_linear_row(rows, &Vector::ith(i, 1.0), params, i);

            if self.impulse_clamp > 0.0 {
                if let Some(row) = rows.last_mut() {
                    row.lower_limit = -self.impulse_clamp;
                    row.upper_limit = self.impulse_clamp;
                }
            }
        }
    }
}
