//! Joints between rigid bodies.
//!
//! Every joint is turned into a set of scalar velocity rows each step. The
//! relative velocity measured by a row is the velocity of the first body
//! minus the velocity of the second one, projected on the row's axes.

pub use self::cone_twist::ConeTwistJoint;
pub use self::fixed::FixedJoint;
pub use self::gear::GearJoint;
pub use self::generic_6dof::{Generic6DofJoint, Generic6DofSpringJoint};
pub use self::hinge::HingeJoint;
pub use self::joint_row::{JointLimit, JointMotor, JointSpring};
pub(crate) use self::joint_row::{JointRow, JointRows, RowContext};
pub use self::point2point::Point2PointJoint;
pub use self::slider::SliderJoint;
pub use self::typed_constraint::{
    ConstraintError, ConstraintKind, ConstraintParam, JointFeedback, TypedConstraint,
};
pub use self::universal::UniversalJoint;

mod cone_twist;
mod fixed;
mod gear;
mod generic_6dof;
mod hinge;
mod joint_row;
mod point2point;
mod slider;
mod typed_constraint;
mod universal;
