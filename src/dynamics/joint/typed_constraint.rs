use super::joint_row::{JointRows, RowContext, RowParams};
use super::{
    ConeTwistJoint, FixedJoint, GearJoint, Generic6DofJoint, Generic6DofSpringJoint, HingeJoint,
    Point2PointJoint, SliderJoint, UniversalJoint,
};
use crate::dynamics::{RigidBody, RigidBodyHandle, RigidBodySet};
use crate::math::{Real, Vector};
use num_derive::FromPrimitive;

/// Errors raised while building or configuring a [`TypedConstraint`].
#[derive(thiserror::Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConstraintError {
    /// The handle does not refer to a body of the set.
    #[error("the rigid-body handle {0:?} does not belong to the body set")]
    UnknownBody(RigidBodyHandle),
    /// Both ends of the constraint are the same body.
    #[error("a constraint cannot attach a rigid-body to itself")]
    SameBody,
    /// The axis is out of range for the constraint kind.
    #[error("axis {axis} is out of range, this constraint has {num_axes} axes")]
    InvalidAxis {
        /// The rejected axis.
        axis: usize,
        /// The number of axes of the constraint.
        num_axes: usize,
    },
    /// A joint axis is null or parallel to another axis.
    #[error("the joint axes are degenerate")]
    DegenerateAxis,
}

/// A tunable parameter of a constraint.
#[derive(FromPrimitive, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConstraintParam {
    /// Error reduction of locked axes.
    Erp = 1,
    /// Error reduction of limits.
    StopErp = 2,
    /// Constraint force mixing of locked axes and motors.
    Cfm = 3,
    /// Constraint force mixing of limits.
    StopCfm = 4,
}

const NUM_PARAMS: usize = 4;
const MAX_AXES: usize = 6;

/// Forces and torques applied by a constraint during the last step.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct JointFeedback {
    /// The force applied to the first body.
    pub applied_force_body_a: Vector<Real>,
    /// The torque applied to the first body.
    pub applied_torque_body_a: Vector<Real>,
    /// The force applied to the second body.
    pub applied_force_body_b: Vector<Real>,
    /// The torque applied to the second body.
    pub applied_torque_body_b: Vector<Real>,
}

/// The kind of a constraint, with its kind-specific data.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ConstraintKind {
    /// A ball-and-socket joint.
    Point2Point(Point2PointJoint),
    /// A single-axis revolute joint.
    Hinge(HingeJoint),
    /// A ball-and-socket joint with swing and twist limits.
    ConeTwist(ConeTwistJoint),
    /// A joint with a limit and motor on each degree of freedom.
    Generic6Dof(Generic6DofJoint),
    /// A [`Generic6DofJoint`] with springs.
    Generic6DofSpring(Generic6DofSpringJoint),
    /// A prismatic joint.
    Slider(SliderJoint),
    /// A gear coupling two rotations.
    Gear(GearJoint),
    /// A weld.
    Fixed(FixedJoint),
    /// A Cardan joint.
    Universal(UniversalJoint),
}

impl ConstraintKind {
    /// The number of axes whose parameters can be tuned independently.
    ///
    /// Axes `0..3` are linear and `3..6` angular.
    pub fn num_axes(&self) -> usize {
        match self {
            ConstraintKind::Point2Point(_) => 3,
            ConstraintKind::Gear(_) => 1,
            _ => MAX_AXES,
        }
    }

    fn append_rows(
        &self,
        body_a: &RigidBody,
        body_b: &RigidBody,
        params: &RowParams,
        rows: &mut JointRows,
    ) {
        match self {
            ConstraintKind::Point2Point(j) => j.append_rows(body_a, body_b, params, rows),
            ConstraintKind::Hinge(j) => j.append_rows(body_a, body_b, params, rows),
            ConstraintKind::ConeTwist(j) => j.append_rows(body_a, body_b, params, rows),
            ConstraintKind::Generic6Dof(j) => j.append_rows(body_a, body_b, params, rows),
            ConstraintKind::Generic6DofSpring(j) => j.append_rows(body_a, body_b, params, rows),
            ConstraintKind::Slider(j) => j.append_rows(body_a, body_b, params, rows),
            ConstraintKind::Gear(j) => j.append_rows(body_a, body_b, params, rows),
            ConstraintKind::Fixed(j) => j.append_rows(body_a, body_b, params, rows),
            ConstraintKind::Universal(j) => j.append_rows(body_a, body_b, params, rows),
        }
    }
}

macro_rules! impl_from_joint(
    ($($Joint: ident => $Variant: ident),*) => {$(
        impl From<$Joint> for ConstraintKind {
            fn from(joint: $Joint) -> Self {
                ConstraintKind::$Variant(joint)
            }
        }
    )*}
);

impl_from_joint!(
    Point2PointJoint => Point2Point,
    HingeJoint => Hinge,
    ConeTwistJoint => ConeTwist,
    Generic6DofJoint => Generic6Dof,
    Generic6DofSpringJoint => Generic6DofSpring,
    SliderJoint => Slider,
    GearJoint => Gear,
    FixedJoint => Fixed,
    UniversalJoint => Universal
);

/// A joint between two rigid bodies, solved by the constraint solver.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedConstraint {
    kind: ConstraintKind,
    body_a: RigidBodyHandle,
    body_b: RigidBodyHandle,
    enabled: bool,
    feedback: Option<JointFeedback>,
    applied_impulse: Real,
    params: [[Option<Real>; MAX_AXES]; NUM_PARAMS],
    /// The constraint is disabled once a row needs an impulse at least this large.
    pub breaking_impulse_threshold: Real,
    /// If set, the number of solver iterations used for this constraint
    /// instead of the solver's.
    pub override_num_solver_iterations: Option<usize>,
}

impl TypedConstraint {
    /// Creates a constraint between `body_a` and `body_b`.
    ///
    /// If `body_b` is `None` the constraint attaches `body_a` to the world anchor of `bodies`.
    pub fn new(
        bodies: &RigidBodySet,
        body_a: RigidBodyHandle,
        body_b: Option<RigidBodyHandle>,
        kind: impl Into<ConstraintKind>,
    ) -> Result<Self, ConstraintError> {
        let body_b = body_b.unwrap_or_else(|| bodies.world_anchor());

        for handle in [body_a, body_b] {
            if !bodies.contains(handle) {
                return Err(ConstraintError::UnknownBody(handle));
            }
        }

        if body_a == body_b {
            return Err(ConstraintError::SameBody);
        }

        Ok(Self {
            kind: kind.into(),
            body_a,
            body_b,
            enabled: true,
            feedback: None,
            applied_impulse: 0.0,
            params: [[None; MAX_AXES]; NUM_PARAMS],
            breaking_impulse_threshold: Real::MAX,
            override_num_solver_iterations: None,
        })
    }

    /// The kind-specific data of this constraint.
    #[inline]
    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    /// Mutable access to the kind-specific data of this constraint.
    #[inline]
    pub fn kind_mut(&mut self) -> &mut ConstraintKind {
        &mut self.kind
    }

    /// The first body attached to this constraint.
    #[inline]
    pub fn body_a(&self) -> RigidBodyHandle {
        self.body_a
    }

    /// The second body attached to this constraint.
    #[inline]
    pub fn body_b(&self) -> RigidBodyHandle {
        self.body_b
    }

    /// Is this constraint taken into account by the solver?
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables this constraint.
    #[inline]
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Enables or disables the recording of applied forces.
    pub fn enable_feedback(&mut self, enabled: bool) {
        self.feedback = if enabled {
            Some(JointFeedback::default())
        } else {
            None
        };
    }

    /// The forces applied during the last step, if feedback is enabled.
    #[inline]
    pub fn joint_feedback(&self) -> Option<&JointFeedback> {
        self.feedback.as_ref()
    }

    /// The impulse applied by the last row solved for this constraint.
    #[inline]
    pub fn applied_impulse(&self) -> Real {
        self.applied_impulse
    }

    /// Sets a parameter on one axis, or on every axis if `axis` is `None`.
    pub fn set_param(
        &mut self,
        param: ConstraintParam,
        value: Real,
        axis: Option<usize>,
    ) -> Result<(), ConstraintError> {
        let values = &mut self.params[param as usize - 1];

        match axis {
            Some(axis) => {
                let num_axes = self.kind.num_axes();
                if axis >= num_axes {
                    return Err(ConstraintError::InvalidAxis { axis, num_axes });
                }
                values[axis] = Some(value);
            }
            None => values.iter_mut().for_each(|v| *v = Some(value)),
        }

        Ok(())
    }

    /// The value of a parameter on one axis, or on the first axis if `axis` is `None`.
    ///
    /// Returns `Ok(None)` if the parameter was never set, meaning the solver default applies.
    pub fn param(
        &self,
        param: ConstraintParam,
        axis: Option<usize>,
    ) -> Result<Option<Real>, ConstraintError> {
        let axis = axis.unwrap_or(0);
        let num_axes = self.kind.num_axes();
        if axis >= num_axes {
            return Err(ConstraintError::InvalidAxis { axis, num_axes });
        }

        Ok(self.params[param as usize - 1][axis])
    }

    fn row_params(&self, ctx: &RowContext) -> RowParams {
        let resolve = |param: ConstraintParam, default: Real| {
            let values = &self.params[param as usize - 1];
            core::array::from_fn(|i| values[i].unwrap_or(default))
        };

        RowParams {
            fps: ctx.fps,
            num_iterations: self
                .override_num_solver_iterations
                .unwrap_or(ctx.num_iterations),
            erp: resolve(ConstraintParam::Erp, ctx.erp),
            cfm: resolve(ConstraintParam::Cfm, ctx.cfm),
            stop_erp: resolve(ConstraintParam::StopErp, ctx.erp),
            stop_cfm: resolve(ConstraintParam::StopCfm, ctx.cfm),
        }
    }

    /// Appends the velocity constraint rows of this joint for the current body poses.
    pub(crate) fn append_rows(
        &self,
        body_a: &RigidBody,
        body_b: &RigidBody,
        ctx: &RowContext,
        rows: &mut JointRows,
    ) {
        if self.enabled {
            let params = self.row_params(ctx);
            self.kind.append_rows(body_a, body_b, &params, rows);
        }
    }

    pub(crate) fn reset_feedback(&mut self) {
        if let Some(feedback) = &mut self.feedback {
            *feedback = JointFeedback::default();
        }
    }

    pub(crate) fn feedback_mut(&mut self) -> Option<&mut JointFeedback> {
        self.feedback.as_mut()
    }

    pub(crate) fn set_applied_impulse(&mut self, impulse: Real) {
        self.applied_impulse = impulse;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::{Isometry, Point};
    use num::FromPrimitive;

    fn two_bodies() -> (RigidBodySet, RigidBodyHandle, RigidBodyHandle) {
        let mut bodies = RigidBodySet::new();
        let a = bodies.insert(RigidBody::new_dynamic(
            Isometry::identity(),
            1.0,
            Vector::repeat(1.0),
        ));
        let b = bodies.insert(RigidBody::new_dynamic(
            Isometry::translation(1.0, 0.0, 0.0),
            1.0,
            Vector::repeat(1.0),
        ));
        (bodies, a, b)
    }

    #[test]
    fn construction_errors() {
        let (mut bodies, a, b) = two_bodies();
        let joint = Point2PointJoint::new(Point::origin(), Point::origin());

        assert_eq!(
            TypedConstraint::new(&bodies, a, Some(a), joint),
            Err(ConstraintError::SameBody)
        );

        let _ = bodies.remove(b);
        assert_eq!(
            TypedConstraint::new(&bodies, a, Some(b), joint),
            Err(ConstraintError::UnknownBody(b))
        );

        let single = TypedConstraint::new(&bodies, a, None, joint).unwrap();
        assert_eq!(single.body_b(), bodies.world_anchor());
    }

    #[test]
    fn params_are_checked_per_axis() {
        let (bodies, a, b) = two_bodies();
        let joint = Point2PointJoint::new(Point::origin(), Point::origin());
        let mut constraint = TypedConstraint::new(&bodies, a, Some(b), joint).unwrap();

        assert_eq!(constraint.param(ConstraintParam::Erp, None), Ok(None));
        constraint.set_param(ConstraintParam::Erp, 0.5, Some(1)).unwrap();
        assert_eq!(constraint.param(ConstraintParam::Erp, Some(1)), Ok(Some(0.5)));
        assert_eq!(constraint.param(ConstraintParam::Erp, Some(0)), Ok(None));
        assert_eq!(
            constraint.set_param(ConstraintParam::Cfm, 0.1, Some(3)),
            Err(ConstraintError::InvalidAxis {
                axis: 3,
                num_axes: 3
            })
        );

        constraint.set_param(ConstraintParam::Cfm, 0.1, None).unwrap();
        assert_eq!(constraint.param(ConstraintParam::Cfm, Some(2)), Ok(Some(0.1)));
        assert_eq!(ConstraintParam::from_i32(2), Some(ConstraintParam::StopErp));
    }

    #[test]
    fn disabled_constraints_produce_no_rows() {
        let (bodies, a, b) = two_bodies();
        let joint = FixedJoint::from_current_poses(
            bodies.get(a).unwrap(),
            bodies.get(b).unwrap(),
        );
        let mut constraint = TypedConstraint::new(&bodies, a, Some(b), joint).unwrap();
        let ctx = RowContext {
            fps: 60.0,
            erp: 0.2,
            cfm: 0.0,
            num_iterations: 10,
        };

        let mut rows = JointRows::new();
        constraint.append_rows(bodies.get(a).unwrap(), bodies.get(b).unwrap(), &ctx, &mut rows);
        assert_eq!(rows.len(), 6);
        // The joint is satisfied by the current poses.
        assert!(rows.iter().all(|row| row.rhs.abs() < 1.0e-4));

        rows.clear();
        constraint.set_enabled(false);
        constraint.append_rows(bodies.get(a).unwrap(), bodies.get(b).unwrap(), &ctx, &mut rows);
        assert!(rows.is_empty());
    }
}
