//! Separation distance and penetration depth with GJK and the Expanding
//! Polytope Algorithm.
//!
//! The entry points taking [`ConvexShape`]s honor collision margins: distances
//! are computed between the shape cores, then the margins are subtracted, and
//! penetrations are computed on the full shapes. The `*_support_maps` entry
//! points accept any pair of [`SupportMap`]s and treat them as-is.
//!
//! All queries report their outcome through a [`GjkEpaResult`] and a boolean
//! or an `Option`. Failures are ordinary outcomes and are never propagated as
//! errors.

pub use self::epa::{
    Epa, EpaOptions, EpaSimplex, EpaStatus, EPA_ACCURACY, EPA_MAX_FACES, EPA_MAX_ITERATIONS,
    EPA_MAX_VERTICES, EPA_PLANE_EPS,
};
pub use self::gjk::{
    Gjk, GjkStatus, Simplex, SupportVertex, GJK_ACCURACY, GJK_DUPLICATED_EPS,
    GJK_MAX_ITERATIONS, GJK_MIN_DISTANCE,
};
pub use self::minkowski_diff::{CoreShape, MinkowskiDiff};

use crate::math::{Isometry, Point, Real, Vector, DEFAULT_EPSILON};
use crate::query::gjk::{ConstantOrigin, ConstantPoint};
use crate::shape::{ConvexShape, Sphere, SupportMap};

mod epa;
mod gjk;
mod minkowski_diff;

/// The outcome of a GJK+EPA query.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum GjkEpaStatus {
    /// The shapes are disjoint.
    #[default]
    Separated,
    /// The shapes overlap.
    Penetrating,
    /// GJK did not converge.
    GjkFailed,
    /// EPA did not produce usable geometry.
    EpaFailed,
}

/// The result of a GJK+EPA query.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GjkEpaResult {
    /// The outcome of the query.
    pub status: GjkEpaStatus,
    /// The witness points on the first and second shape, in world-space.
    pub witnesses: [Point<Real>; 2],
    /// The unit normal, in world-space, pointing from the second shape toward the first.
    pub normal: Vector<Real>,
    /// The signed distance. Negative values are penetration depths.
    pub distance: Real,
}

impl Default for GjkEpaResult {
    fn default() -> Self {
        Self {
            status: GjkEpaStatus::Separated,
            witnesses: [Point::origin(); 2],
            normal: Vector::zeros(),
            distance: 0.0,
        }
    }
}

impl GjkEpaResult {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Computes the distance between two separated support-mapped shapes.
///
/// Returns `false` if the shapes overlap (`status == Penetrating`) or if GJK
/// failed (`status == GjkFailed`).
pub fn distance_support_maps<G1, G2>(
    shape0: &G1,
    transform0: &Isometry<Real>,
    shape1: &G2,
    transform1: &Isometry<Real>,
    guess: &Vector<Real>,
    results: &mut GjkEpaResult,
) -> bool
where
    G1: ?Sized + SupportMap,
    G2: ?Sized + SupportMap,
{
    results.reset();
    let shape = MinkowskiDiff::new(shape0, transform0, shape1, transform1);
    let local_guess = transform0.inverse_transform_vector(guess);
    let mut gjk = Gjk::new();

    match gjk.evaluate(&shape, &local_guess) {
        GjkStatus::Valid => {
            let mut w0 = Vector::zeros();
            let mut w1 = Vector::zeros();
            let simplex = gjk.simplex();

            for i in 0..simplex.rank {
                let p = simplex.p[i];
                let d = gjk.vertex(simplex.c[i]).d;
                w0 += shape.support_of(&d, 0).coords * p;
                w1 += shape.support_of(&-d, 1).coords * p;
            }

            results.witnesses = [transform0 * Point::from(w0), transform0 * Point::from(w1)];
            let normal = w0 - w1;
            results.distance = normal.norm();
            results.normal = transform0.rotation
                * if results.distance > GJK_MIN_DISTANCE {
                    normal / results.distance
                } else {
                    normal
                };
            true
        }
        status => {
            results.status = if status == GjkStatus::Inside {
                GjkEpaStatus::Penetrating
            } else {
                GjkEpaStatus::GjkFailed
            };
            false
        }
    }
}

/// Computes the penetration depth of two overlapping support-mapped shapes.
///
/// `guess` is an approximation of the penetration direction, for example the
/// difference between the shape centers. Returns `false` if the shapes are
/// disjoint or if no usable geometry could be found (`status` is then
/// `GjkFailed` or `EpaFailed`).
pub fn penetration_support_maps<G1, G2>(
    shape0: &G1,
    transform0: &Isometry<Real>,
    shape1: &G2,
    transform1: &Isometry<Real>,
    guess: &Vector<Real>,
    options: &EpaOptions,
    results: &mut GjkEpaResult,
) -> bool
where
    G1: ?Sized + SupportMap,
    G2: ?Sized + SupportMap,
{
    results.reset();
    let shape = MinkowskiDiff::new(shape0, transform0, shape1, transform1);
    let local_guess = transform0.inverse_transform_vector(guess);
    let mut gjk = Gjk::new();

    match gjk.evaluate(&shape, &-local_guess) {
        GjkStatus::Inside => {
            let mut epa = Epa::new(*options);
            let epa_status = epa.evaluate(&mut gjk, &shape, &-local_guess);

            if epa_status.is_usable() {
                let result = epa.result();
                let mut w0 = Vector::zeros();

                for i in 0..result.rank {
                    w0 += shape.support_of(&result.c[i].d, 0).coords * result.p[i];
                }

                let w1 = w0 - epa.normal() * epa.depth();
                results.status = GjkEpaStatus::Penetrating;
                results.witnesses = [transform0 * Point::from(w0), transform0 * Point::from(w1)];
                results.normal = transform0.rotation * -epa.normal();
                results.distance = -epa.depth();
                return true;
            }

            log::debug!("EPA produced no usable geometry: {:?}", epa_status);
            results.status = GjkEpaStatus::EpaFailed;
        }
        GjkStatus::Failed => results.status = GjkEpaStatus::GjkFailed,
        GjkStatus::Valid => {}
    }

    false
}

/// Computes the distance between two separated convex shapes, margins excluded.
///
/// GJK runs on the shape cores and the margins are removed afterwards, so
/// the result is the distance between the full shapes. When the full shapes
/// overlap but their cores do not, the result has a negative distance and a
/// `Penetrating` status.
pub fn distance(
    shape0: &ConvexShape,
    transform0: &Isometry<Real>,
    shape1: &ConvexShape,
    transform1: &Isometry<Real>,
    guess: &Vector<Real>,
    results: &mut GjkEpaResult,
) -> bool {
    if !distance_support_maps(
        &CoreShape(shape0),
        transform0,
        &CoreShape(shape1),
        transform1,
        guess,
        results,
    ) {
        return false;
    }

    let margin0 = shape0.margin();
    let margin1 = shape1.margin();
    results.witnesses[0] -= results.normal * margin0;
    results.witnesses[1] += results.normal * margin1;
    results.distance -= margin0 + margin1;

    if results.distance < 0.0 {
        results.status = GjkEpaStatus::Penetrating;
    }

    true
}

/// Computes the penetration depth of two overlapping convex shapes.
///
/// With `use_margins`, the full shapes are used; otherwise only their cores.
pub fn penetration(
    shape0: &ConvexShape,
    transform0: &Isometry<Real>,
    shape1: &ConvexShape,
    transform1: &Isometry<Real>,
    guess: &Vector<Real>,
    results: &mut GjkEpaResult,
    use_margins: bool,
) -> bool {
    let options = EpaOptions::default();

    if use_margins {
        penetration_support_maps(shape0, transform0, shape1, transform1, guess, &options, results)
    } else {
        penetration_support_maps(
            &CoreShape(shape0),
            transform0,
            &CoreShape(shape1),
            transform1,
            guess,
            &options,
            results,
        )
    }
}

/// The signed distance from `position` to `shape0`, with `position` inflated
/// into a sphere of radius `margin`.
///
/// Positive outside, negative inside. Returns `Real::INFINITY` if neither GJK
/// nor EPA could conclude.
pub fn signed_distance_to_point(
    position: &Point<Real>,
    margin: Real,
    shape0: &ConvexShape,
    transform0: &Isometry<Real>,
    results: &mut GjkEpaResult,
) -> Real {
    results.reset();
    let point = ConstantPoint(*position);
    let core0 = CoreShape(shape0);
    let shape = MinkowskiDiff::new(&core0, transform0, &point, &Isometry::identity());
    let mut gjk = Gjk::new();

    match gjk.evaluate(&shape, &Vector::repeat(1.0)) {
        GjkStatus::Valid => {
            let mut w0 = Vector::zeros();
            let mut w1 = Vector::zeros();
            let simplex = gjk.simplex();

            for i in 0..simplex.rank {
                let p = simplex.p[i];
                let d = gjk.vertex(simplex.c[i]).d;
                w0 += shape.support_of(&d, 0).coords * p;
                w1 += shape.support_of(&-d, 1).coords * p;
            }

            let witness0 = transform0 * Point::from(w0);
            let witness1 = transform0 * Point::from(w1);
            let delta = witness1 - witness0;
            let total_margin = shape0.margin() + margin;
            let length = delta.norm();

            if length >= DEFAULT_EPSILON {
                results.normal = delta / length;
            }

            results.witnesses = [witness0 + results.normal * total_margin, witness1];
            results.distance = length - total_margin;
            results.distance
        }
        GjkStatus::Inside => {
            let transform1 = Isometry::translation(position.x, position.y, position.z);
            let guess = transform0.rotation * gjk.ray();
            let options = EpaOptions::default();

            let found = if margin > 0.0 {
                let sphere = Sphere::new(margin);
                penetration_support_maps(
                    shape0,
                    transform0,
                    &sphere,
                    &transform1,
                    &guess,
                    &options,
                    results,
                )
            } else {
                penetration_support_maps(
                    shape0,
                    transform0,
                    &ConstantOrigin,
                    &transform1,
                    &guess,
                    &options,
                    results,
                )
            };

            if found {
                let delta = results.witnesses[0] - results.witnesses[1];
                let length = delta.norm();

                if length >= DEFAULT_EPSILON {
                    results.normal = delta / length;
                }

                -length
            } else {
                Real::INFINITY
            }
        }
        GjkStatus::Failed => Real::INFINITY,
    }
}

/// The signed distance between two convex shapes.
///
/// Returns the separation distance if the shapes are disjoint, or the
/// penetration of their cores otherwise. Returns `None` if neither GJK nor
/// EPA could conclude.
pub fn signed_distance(
    shape0: &ConvexShape,
    transform0: &Isometry<Real>,
    shape1: &ConvexShape,
    transform1: &Isometry<Real>,
    guess: &Vector<Real>,
) -> Option<GjkEpaResult> {
    let mut results = GjkEpaResult::default();

    if distance(shape0, transform0, shape1, transform1, guess, &mut results)
        || penetration(shape0, transform0, shape1, transform1, guess, &mut results, false)
    {
        Some(results)
    } else {
        None
    }
}

/// Computes the penetration of two convex shapes, using the difference of
/// their positions as the initial guess.
///
/// Returns `None` if the shapes are disjoint or if EPA failed.
pub fn calc_penetration_depth(
    shape0: &ConvexShape,
    transform0: &Isometry<Real>,
    shape1: &ConvexShape,
    transform1: &Isometry<Real>,
) -> Option<GjkEpaResult> {
    let guess = transform1.translation.vector - transform0.translation.vector;
    let mut results = GjkEpaResult::default();

    if penetration(shape0, transform0, shape1, transform1, &guess, &mut results, true) {
        Some(results)
    } else {
        None
    }
}
