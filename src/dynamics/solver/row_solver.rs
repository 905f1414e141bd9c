use super::{SolverBody, SolverConstraint};
use crate::math::{Real, Vector};
use na::Vector6;

/// The strategy used to apply one Gauss-Seidel update to a constraint row.
///
/// Both strategies compute the same update. `Batched` evaluates the
/// Jacobian products on stacked six-dimensional vectors and clamps without
/// branches, which vectorizes better.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RowSolver {
    /// Plain scalar evaluation.
    Generic,
    /// Evaluation on stacked vectors.
    Batched,
}

impl Default for RowSolver {
    fn default() -> Self {
        Self::detect()
    }
}

#[inline]
fn stack(a: &Vector<Real>, b: &Vector<Real>) -> Vector6<Real> {
    Vector6::new(a.x, a.y, a.z, b.x, b.y, b.z)
}

impl RowSolver {
    /// The strategy best suited to the target hardware.
    pub fn detect() -> Self {
        if cfg!(any(target_feature = "sse2", target_feature = "neon")) {
            RowSolver::Batched
        } else {
            RowSolver::Generic
        }
    }

    /// The velocity change along the row, caused by the accumulated delta velocities.
    #[inline]
    fn delta_velocity(self, a: &SolverBody, b: &SolverBody, c: &SolverConstraint) -> Real {
        match self {
            RowSolver::Generic => {
                c.contact_normal1.dot(&a.delta_linear_velocity)
                    + c.relpos1_cross_normal.dot(&a.delta_angular_velocity)
                    + c.contact_normal2.dot(&b.delta_linear_velocity)
                    + c.relpos2_cross_normal.dot(&b.delta_angular_velocity)
            }
            RowSolver::Batched => {
                stack(&c.contact_normal1, &c.relpos1_cross_normal)
                    .dot(&stack(&a.delta_linear_velocity, &a.delta_angular_velocity))
                    + stack(&c.contact_normal2, &c.relpos2_cross_normal)
                        .dot(&stack(&b.delta_linear_velocity, &b.delta_angular_velocity))
            }
        }
    }

    /// Clamps the accumulated impulse, returning the actual impulse change.
    #[inline]
    fn clamp(
        self,
        applied: &mut Real,
        delta_impulse: Real,
        lower_limit: Real,
        upper_limit: Real,
    ) -> Real {
        match self {
            RowSolver::Generic => {
                let sum = *applied + delta_impulse;
                if sum < lower_limit {
                    let delta = lower_limit - *applied;
                    *applied = lower_limit;
                    delta
                } else if sum > upper_limit {
                    let delta = upper_limit - *applied;
                    *applied = upper_limit;
                    delta
                } else {
                    *applied = sum;
                    delta_impulse
                }
            }
            RowSolver::Batched => {
                let sum = (*applied + delta_impulse).max(lower_limit).min(upper_limit);
                let delta = sum - *applied;
                *applied = sum;
                delta
            }
        }
    }

    #[inline]
    fn apply(a: &mut SolverBody, b: &mut SolverBody, c: &SolverConstraint, delta_impulse: Real) {
        a.internal_apply_impulse(
            &c.contact_normal1.component_mul(&a.inv_mass),
            &c.angular_component_a,
            delta_impulse,
        );
        b.internal_apply_impulse(
            &c.contact_normal2.component_mul(&b.inv_mass),
            &c.angular_component_b,
            delta_impulse,
        );
    }

    #[inline]
    fn residual(delta_impulse: Real, c: &SolverConstraint) -> Real {
        if c.jac_diag_ab_inv != 0.0 {
            delta_impulse / c.jac_diag_ab_inv
        } else {
            0.0
        }
    }

    /// Solves a row whose accumulated impulse is bounded on both sides.
    ///
    /// Returns the residual velocity error of the row.
    pub fn resolve_single_constraint_row_generic(
        self,
        a: &mut SolverBody,
        b: &mut SolverBody,
        c: &mut SolverConstraint,
    ) -> Real {
        let mut delta_impulse = c.rhs - c.applied_impulse * c.cfm;
        delta_impulse -= self.delta_velocity(a, b, c) * c.jac_diag_ab_inv;

        let delta_impulse = self.clamp(
            &mut c.applied_impulse,
            delta_impulse,
            c.lower_limit,
            c.upper_limit,
        );

        Self::apply(a, b, c, delta_impulse);
        Self::residual(delta_impulse, c)
    }

    /// Solves a row whose accumulated impulse is only bounded from below.
    ///
    /// Returns the residual velocity error of the row.
    pub fn resolve_single_constraint_row_lower_limit(
        self,
        a: &mut SolverBody,
        b: &mut SolverBody,
        c: &mut SolverConstraint,
    ) -> Real {
        let mut delta_impulse = c.rhs - c.applied_impulse * c.cfm;
        delta_impulse -= self.delta_velocity(a, b, c) * c.jac_diag_ab_inv;

        let delta_impulse =
            self.clamp(&mut c.applied_impulse, delta_impulse, c.lower_limit, Real::MAX);

        Self::apply(a, b, c, delta_impulse);
        Self::residual(delta_impulse, c)
    }

    /// Solves the split-impulse position correction of a contact row.
    ///
    /// Returns the residual pseudo-velocity error of the row.
    pub fn resolve_split_penetration_impulse(
        self,
        a: &mut SolverBody,
        b: &mut SolverBody,
        c: &mut SolverConstraint,
    ) -> Real {
        if c.rhs_penetration == 0.0 {
            return 0.0;
        }

        let delta_velocity = match self {
            RowSolver::Generic => {
                c.contact_normal1.dot(&a.push_velocity)
                    + c.relpos1_cross_normal.dot(&a.turn_velocity)
                    + c.contact_normal2.dot(&b.push_velocity)
                    + c.relpos2_cross_normal.dot(&b.turn_velocity)
            }
            RowSolver::Batched => {
                stack(&c.contact_normal1, &c.relpos1_cross_normal)
                    .dot(&stack(&a.push_velocity, &a.turn_velocity))
                    + stack(&c.contact_normal2, &c.relpos2_cross_normal)
                        .dot(&stack(&b.push_velocity, &b.turn_velocity))
            }
        };

        let mut delta_impulse = c.rhs_penetration - c.applied_push_impulse * c.cfm;
        delta_impulse -= delta_velocity * c.jac_diag_ab_inv;

        let delta_impulse = self.clamp(
            &mut c.applied_push_impulse,
            delta_impulse,
            c.lower_limit,
            Real::MAX,
        );

        a.internal_apply_push_impulse(
            &c.contact_normal1.component_mul(&a.inv_mass),
            &c.angular_component_a,
            delta_impulse,
        );
        b.internal_apply_push_impulse(
            &c.contact_normal2.component_mul(&b.inv_mass),
            &c.angular_component_b,
            delta_impulse,
        );

        Self::residual(delta_impulse, c)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::{RigidBody, RigidBodySet};
    use crate::math::Isometry;

    fn falling_contact() -> (SolverBody, SolverBody, SolverConstraint) {
        let mut bodies = RigidBodySet::new();
        let body = RigidBody::new_dynamic(Isometry::identity(), 2.0, Vector::repeat(1.0));
        let handle = bodies.insert(body.clone());
        let mut a = SolverBody::from_rigid_body(handle, &body, 1.0 / 60.0);
        a.linear_velocity = Vector::new(0.0, -1.0, 0.0);

        // A contact right below the center of mass, against the ground.
        let c = SolverConstraint {
            contact_normal1: Vector::y(),
            contact_normal2: -Vector::y(),
            jac_diag_ab_inv: 2.0,
            rhs: 2.0,
            lower_limit: 0.0,
            upper_limit: Real::MAX,
            ..SolverConstraint::default()
        };

        (a, SolverBody::fixed(), c)
    }

    #[test]
    fn both_strategies_agree() {
        for solver in [RowSolver::Generic, RowSolver::Batched] {
            let (mut a, mut b, mut c) = falling_contact();
            let _ = solver.resolve_single_constraint_row_lower_limit(&mut a, &mut b, &mut c);
            assert_relative_eq!(c.applied_impulse, 2.0);
            assert_relative_eq!(a.delta_linear_velocity, Vector::new(0.0, 1.0, 0.0));
            assert_eq!(b.delta_linear_velocity, Vector::zeros());

            // Already converged: no further change.
            let residual = solver.resolve_single_constraint_row_lower_limit(&mut a, &mut b, &mut c);
            assert_relative_eq!(residual, 0.0);
        }
    }

    #[test]
    fn impulses_are_clamped() {
        for solver in [RowSolver::Generic, RowSolver::Batched] {
            let (mut a, mut b, mut c) = falling_contact();
            c.rhs = -1.0;
            let _ = solver.resolve_single_constraint_row_lower_limit(&mut a, &mut b, &mut c);
            assert_eq!(c.applied_impulse, 0.0);

            c.rhs = 5.0;
            c.lower_limit = -1.0;
            c.upper_limit = 1.0;
            let _ = solver.resolve_single_constraint_row_generic(&mut a, &mut b, &mut c);
            assert_eq!(c.applied_impulse, 1.0);
        }
    }
}
