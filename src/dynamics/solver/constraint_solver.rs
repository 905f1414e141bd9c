use super::SolverInfo;
use crate::dynamics::{PersistentManifold, RigidBodySet, TypedConstraint};
use crate::math::Real;

/// The algorithm implemented by a [`ConstraintSolver`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ConstraintSolverType {
    /// Projected Gauss-Seidel on velocity impulses.
    SequentialImpulse,
}

/// A solver computing the impulses that satisfy contacts and joints.
pub trait ConstraintSolver {
    /// Called once before the groups of a step are solved.
    fn prepare_solve(&mut self, _num_bodies: usize, _num_manifolds: usize) {}

    /// Solves one group of interacting bodies, updating their velocities and
    /// the impulses cached in the manifolds and joints.
    ///
    /// Returns the largest squared residual of the last iteration.
    fn solve_group(
        &mut self,
        bodies: &mut RigidBodySet,
        manifolds: &mut [PersistentManifold],
        constraints: &mut [TypedConstraint],
        info: &SolverInfo,
    ) -> Real;

    /// Called once after every group of a step was solved.
    fn all_solved(&mut self, _info: &SolverInfo) {}

    /// Clears the internal state so that the next solve behaves like on a fresh solver.
    fn reset(&mut self);

    /// The algorithm implemented by this solver.
    fn solver_type(&self) -> ConstraintSolverType;
}
