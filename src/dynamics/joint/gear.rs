use super::joint_row::{JointRow, JointRows, RowParams};
use crate::dynamics::RigidBody;
use crate::math::{Real, Vector};

/// Couples the rotations of two bodies around one axis each.
///
/// The joint keeps `ω_a · axis_a + ratio * ω_b · axis_b` at zero.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GearJoint {
    /// The gear axis, in the local frame of the first body.
    pub axis_in_a: Vector<Real>,
    /// The gear axis, in the local frame of the second body.
    pub axis_in_b: Vector<Real>,
    /// The gear ratio.
    pub ratio: Real,
}

impl GearJoint {
    /// A gear between two local axes.
    pub fn new(axis_in_a: Vector<Real>, axis_in_b: Vector<Real>, ratio: Real) -> Self {
        Self {
            axis_in_a,
            axis_in_b,
            ratio,
        }
    }

    pub(crate) fn append_rows(
        &self,
        body_a: &RigidBody,
        body_b: &RigidBody,
        params: &RowParams,
        rows: &mut JointRows,
    ) {
        let mut row = JointRow::angular(&(body_a.position().rotation * self.axis_in_a));
        row.j2_angular = body_b.position().rotation * self.axis_in_b * self.ratio;
        row.cfm = params.cfm[0];
        rows.push(row);
    }
}
