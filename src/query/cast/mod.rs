//! Time of impact of convex shapes moving between two poses.
//!
//! Every cast sweeps the shapes from their `from` pose to their `to` pose and
//! reports the first contact as a fraction of that sweep.

pub use self::continuous_convex_collision::{CastTarget, ContinuousConvexCollision};
pub use self::gjk_convex_cast::GjkConvexCast;
pub use self::subsimplex_convex_cast::SubsimplexConvexCast;

use crate::math::{Isometry, Point, Real, Vector, LARGE_FLOAT};

mod continuous_convex_collision;
mod gjk_convex_cast;
mod subsimplex_convex_cast;

/// Distance under which the shapes are considered in contact by the
/// conservative advancement casts.
pub const CAST_CONTACT_RADIUS: Real = 0.001;

/// A visualisation hook notified of the progress of a cast.
///
/// Every method has an empty default implementation.
pub trait DebugDraw {
    /// Called with the current sweep fraction at each step.
    fn debug_draw(&mut self, _fraction: Real) {}

    /// Called with the interpolated pose of the first shape at each step.
    fn draw_coordinate_system(&mut self, _transform: &Isometry<Real>) {}

    /// Called when a cast gives up.
    ///
    /// `error` is `-1` if a closest-points query found nothing and `-2` if
    /// the iteration limit was exceeded.
    fn report_failure(&mut self, _error: i32, _num_iterations: usize) {}
}

/// Limits of a convex cast.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CastOptions {
    /// Maximum number of iterations of the sub-simplex and GJK casts.
    pub max_iterations: usize,
    /// Squared distance under which the sub-simplex cast considers the shapes in contact.
    pub epsilon: Real,
    /// Penetration tolerated before a hit is reported.
    pub allowed_penetration: Real,
}

impl Default for CastOptions {
    fn default() -> Self {
        Self {
            max_iterations: 32,
            epsilon: 1.0e-4,
            allowed_penetration: 0.0,
        }
    }
}

/// The output of a convex cast.
pub struct CastResult<'a> {
    /// The fraction of the sweep at the time of impact, in `[0, 1]`.
    pub fraction: Real,
    /// The contact normal at the time of impact, pointing from B toward A.
    pub normal: Vector<Real>,
    /// The contact point at the time of impact, on B.
    pub hit_point: Point<Real>,
    /// The pose of A at the time of impact.
    pub hit_transform_a: Isometry<Real>,
    /// The pose of B at the time of impact.
    pub hit_transform_b: Isometry<Real>,
    /// The limits of the cast.
    pub options: CastOptions,
    /// An optional visualisation hook.
    pub debug_drawer: Option<&'a mut dyn DebugDraw>,
}

impl Default for CastResult<'_> {
    fn default() -> Self {
        Self {
            fraction: LARGE_FLOAT,
            normal: Vector::zeros(),
            hit_point: Point::origin(),
            hit_transform_a: Isometry::identity(),
            hit_transform_b: Isometry::identity(),
            options: CastOptions::default(),
            debug_drawer: None,
        }
    }
}

impl<'a> CastResult<'a> {
    /// A cast result with custom limits.
    pub fn with_options(options: CastOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Attaches a visualisation hook.
    pub fn with_debug_drawer(mut self, drawer: &'a mut dyn DebugDraw) -> Self {
        self.debug_drawer = Some(drawer);
        self
    }

    pub(crate) fn debug_draw(&mut self, fraction: Real) {
        if let Some(drawer) = self.debug_drawer.as_deref_mut() {
            drawer.debug_draw(fraction);
        }
    }

    pub(crate) fn draw_coordinate_system(&mut self, transform: &Isometry<Real>) {
        if let Some(drawer) = self.debug_drawer.as_deref_mut() {
            drawer.draw_coordinate_system(transform);
        }
    }

    pub(crate) fn report_failure(&mut self, error: i32, num_iterations: usize) {
        log::debug!(
            "convex cast failed with code {} after {} iterations",
            error,
            num_iterations
        );

        if let Some(drawer) = self.debug_drawer.as_deref_mut() {
            drawer.report_failure(error, num_iterations);
        }
    }
}

/// An algorithm computing the time of impact of two moving convex shapes.
pub trait ConvexCast {
    /// Sweeps A from `from_a` to `to_a` and B from `from_b` to `to_b`.
    ///
    /// Returns `true` and fills `result` if the shapes hit during the sweep.
    /// Returns `false` if they never come closer than the allowed penetration,
    /// if they move apart, or if the cast gave up.
    fn calc_time_of_impact(
        &mut self,
        from_a: &Isometry<Real>,
        to_a: &Isometry<Real>,
        from_b: &Isometry<Real>,
        to_b: &Isometry<Real>,
        result: &mut CastResult<'_>,
    ) -> bool;
}
