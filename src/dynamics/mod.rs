//! Rigid bodies, contact manifolds, joints and the sequential impulse solver.

pub use self::joint::{
    ConeTwistJoint, ConstraintError, ConstraintKind, ConstraintParam, FixedJoint, GearJoint,
    Generic6DofJoint, Generic6DofSpringJoint, HingeJoint, JointFeedback, JointLimit, JointMotor,
    JointSpring, Point2PointJoint, SliderJoint, TypedConstraint, UniversalJoint,
};
pub use self::manifold_point::{ContactPointFlags, ManifoldPoint};
pub use self::manifold_result::{
    combined_friction, combined_restitution, combined_rolling_friction,
    combined_spinning_friction, ManifoldResult, MAX_FRICTION,
};
pub use self::persistent_manifold::{
    PersistentManifold, DEFAULT_CONTACT_BREAKING_THRESHOLD, MANIFOLD_CACHE_SIZE,
};
pub use self::rigid_body::{RigidBody, RigidBodyHandle, RigidBodySet};
pub use self::solver::{
    ConstraintOrigin, ConstraintSolver, ConstraintSolverType, RowSolver,
    SequentialImpulseConstraintSolver, SolverBody, SolverConstraint, SolverInfo, SolverMode,
};

pub mod joint;
mod manifold_point;
mod manifold_result;
mod persistent_manifold;
mod rigid_body;
pub mod solver;
