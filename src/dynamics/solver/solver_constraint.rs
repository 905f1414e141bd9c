use crate::math::{Real, Vector};

/// What a [`SolverConstraint`] was built from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConstraintOrigin {
    /// A friction or rolling friction row.
    None,
    /// The normal row of a manifold point.
    Contact {
        /// Index of the manifold in the solved slice.
        manifold: usize,
        /// Index of the point in the manifold.
        point: usize,
    },
    /// A row of the joint at this index in the solved slice.
    Joint(usize),
}

/// One scalar row solved by the sequential impulse solver.
///
/// The row measures the relative velocity
/// `contact_normal1·v_a + relpos1_cross_normal·ω_a + contact_normal2·v_b + relpos2_cross_normal·ω_b`.
#[repr(C, align(16))]
#[derive(Clone, Debug, PartialEq)]
pub struct SolverConstraint {
    /// Angular part of the Jacobian, for the first body.
    pub relpos1_cross_normal: Vector<Real>,
    /// Linear part of the Jacobian, for the first body.
    pub contact_normal1: Vector<Real>,
    /// Angular part of the Jacobian, for the second body.
    pub relpos2_cross_normal: Vector<Real>,
    /// Linear part of the Jacobian, for the second body.
    pub contact_normal2: Vector<Real>,
    /// Angular velocity change of the first body per unit impulse.
    pub angular_component_a: Vector<Real>,
    /// Angular velocity change of the second body per unit impulse.
    pub angular_component_b: Vector<Real>,
    /// Impulse accumulated by the split-impulse position correction.
    pub applied_push_impulse: Real,
    /// Impulse accumulated by the velocity solver.
    pub applied_impulse: Real,
    /// Friction coefficient of friction rows.
    pub friction: Real,
    /// Inverse of the effective mass of this row.
    pub jac_diag_ab_inv: Real,
    /// Target impulse of the velocity solver.
    pub rhs: Real,
    /// Constraint force mixing, scaled by `jac_diag_ab_inv`.
    pub cfm: Real,
    /// Smallest accumulated impulse.
    pub lower_limit: Real,
    /// Largest accumulated impulse.
    pub upper_limit: Real,
    /// Target impulse of the split-impulse position correction.
    pub rhs_penetration: Real,
    /// Index of the first body in the solver body pool.
    pub solver_body_id_a: usize,
    /// Index of the second body in the solver body pool.
    pub solver_body_id_b: usize,
    /// For contact rows, the index of their first friction row.
    /// For friction rows, the index of their contact row.
    pub friction_index: usize,
    /// Number of iterations this row takes part in.
    pub override_num_solver_iterations: usize,
    /// What this row was built from.
    pub origin: ConstraintOrigin,
}

impl Default for SolverConstraint {
    fn default() -> Self {
        Self {
            relpos1_cross_normal: Vector::zeros(),
            contact_normal1: Vector::zeros(),
            relpos2_cross_normal: Vector::zeros(),
            contact_normal2: Vector::zeros(),
            angular_component_a: Vector::zeros(),
            angular_component_b: Vector::zeros(),
            applied_push_impulse: 0.0,
            applied_impulse: 0.0,
            friction: 0.0,
            jac_diag_ab_inv: 0.0,
            rhs: 0.0,
            cfm: 0.0,
            lower_limit: 0.0,
            upper_limit: 0.0,
            rhs_penetration: 0.0,
            solver_body_id_a: 0,
            solver_body_id_b: 0,
            friction_index: 0,
            override_num_solver_iterations: 0,
            origin: ConstraintOrigin::None,
        }
    }
}
