//! The sequential impulse constraint solver.

pub use self::constraint_solver::{ConstraintSolver, ConstraintSolverType};
pub use self::row_solver::RowSolver;
pub use self::sequential_impulse::SequentialImpulseConstraintSolver;
pub use self::solver_body::SolverBody;
pub use self::solver_constraint::{ConstraintOrigin, SolverConstraint};
pub use self::solver_info::{SolverInfo, SolverMode};

mod constraint_solver;
mod row_solver;
mod sequential_impulse;
mod solver_body;
mod solver_constraint;
mod solver_info;

static_assertions::const_assert_eq!(core::mem::align_of::<SolverBody>(), 16);
static_assertions::const_assert_eq!(core::mem::align_of::<SolverConstraint>(), 16);
