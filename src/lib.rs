/*!
impact3d
========

**impact3d** is a narrow-phase collision detection and constraint solving
library written with the rust programming language.

It provides:

* support-mapped convex shapes ([`shape::ConvexShape`]),
* the GJK distance algorithm backed by a Voronoi simplex solver
  ([`query::gjk::GjkPairDetector`]),
* a self-contained GJK+EPA solver computing separation distances and
  penetration depths ([`query::gjk_epa`]),
* penetration depth estimators used as GJK fall-backs ([`query::penetration`]),
* time-of-impact computation between moving convex shapes ([`query::cast`]),
* a sequential impulse solver for contacts and joints ([`dynamics`]).

*/

#![deny(non_camel_case_types)]
#![deny(unused_parens)]
#![deny(non_upper_case_globals)]
#![deny(unused_results)]
#![warn(missing_docs)]
#![warn(unused_imports)]
#![allow(missing_copy_implementations)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::module_inception)]
#![allow(clippy::manual_range_contains)]

#[cfg(all(feature = "f32", feature = "f64"))]
core::compile_error!("The `f32` and `f64` features are mutually exclusive.");

#[cfg_attr(test, macro_use)]
extern crate approx;
extern crate num_traits as num;

pub extern crate nalgebra as na;

pub mod dynamics;
pub mod query;
pub mod shape;
pub mod utils;

mod real {
    /// The scalar type used throughout this crate.
    #[cfg(feature = "f64")]
    pub use f64 as Real;

    /// The scalar type used throughout this crate.
    #[cfg(feature = "f32")]
    pub use f32 as Real;
}

/// Compilation flags dependent aliases for mathematical types.
pub mod math {
    pub use super::real::*;
    pub use na::{Isometry3, Matrix3, Point3, Translation3, UnitQuaternion, UnitVector3, Vector3};

    /// The default tolerance used for geometric operations.
    pub const DEFAULT_EPSILON: Real = Real::EPSILON;

    /// A very large value, used as "infinite" distance by iterative algorithms.
    #[cfg(feature = "f32")]
    pub const LARGE_FLOAT: Real = 1.0e18;

    /// A very large value, used as "infinite" distance by iterative algorithms.
    #[cfg(feature = "f64")]
    pub const LARGE_FLOAT: Real = 1.0e30;

    /// The dimension of the space.
    pub const DIM: usize = 3;

    /// The point type.
    pub use Point3 as Point;

    /// The vector type.
    pub use Vector3 as Vector;

    /// The unit vector type.
    pub use UnitVector3 as UnitVector;

    /// The matrix type.
    pub use Matrix3 as Matrix;

    /// The transformation matrix type.
    pub use Isometry3 as Isometry;

    /// The rotation type.
    pub type Rotation<N> = UnitQuaternion<N>;

    /// The translation type.
    pub use Translation3 as Translation;
}
