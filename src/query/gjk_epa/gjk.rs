use arrayvec::ArrayVec;

use super::MinkowskiDiff;
use crate::math::{Real, Vector};
use crate::shape::SupportMap;

/// Maximum number of GJK iterations.
pub const GJK_MAX_ITERATIONS: usize = 128;

/// Relative accuracy at which GJK stops refining the closest point.
#[cfg(feature = "f32")]
pub const GJK_ACCURACY: Real = 1.0e-4;
/// Relative accuracy at which GJK stops refining the closest point.
#[cfg(feature = "f64")]
pub const GJK_ACCURACY: Real = 1.0e-12;

/// Distance to the origin under which the origin is considered enclosed.
#[cfg(feature = "f32")]
pub const GJK_MIN_DISTANCE: Real = 1.0e-4;
/// Distance to the origin under which the origin is considered enclosed.
#[cfg(feature = "f64")]
pub const GJK_MIN_DISTANCE: Real = 1.0e-12;

/// Squared distance under which a new support point duplicates a recent one.
#[cfg(feature = "f32")]
pub const GJK_DUPLICATED_EPS: Real = 1.0e-4;
/// Squared distance under which a new support point duplicates a recent one.
#[cfg(feature = "f64")]
pub const GJK_DUPLICATED_EPS: Real = 1.0e-12;

const GJK_SIMPLEX2_EPS: Real = 0.0;
const GJK_SIMPLEX3_EPS: Real = 0.0;
const GJK_SIMPLEX4_EPS: Real = 0.0;

const IMD3: [usize; 3] = [1, 2, 0];

/// The status of a GJK evaluation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GjkStatus {
    /// The shapes are separated.
    Valid,
    /// The origin is enclosed by the Minkowski difference.
    Inside,
    /// GJK did not converge.
    Failed,
}

/// A vertex of the Minkowski difference with the direction it supports.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SupportVertex {
    /// The normalized search direction.
    pub d: Vector<Real>,
    /// The support point of the Minkowski difference toward `d`.
    pub w: Vector<Real>,
}

impl Default for SupportVertex {
    fn default() -> Self {
        Self {
            d: Vector::zeros(),
            w: Vector::zeros(),
        }
    }
}

/// A simplex referencing vertices of the [`Gjk`] vertex store.
#[derive(Copy, Clone, Debug, Default)]
pub struct Simplex {
    /// Indices of the vertices in the store.
    pub c: [usize; 4],
    /// Barycentric weights of the vertices.
    pub p: [Real; 4],
    /// The number of vertices.
    pub rank: usize,
}

/// Scalar triple product `a · (b × c)`, expanded.
pub(crate) fn det(a: &Vector<Real>, b: &Vector<Real>, c: &Vector<Real>) -> Real {
    a.y * b.z * c.x + a.z * b.x * c.y - a.x * b.z * c.y - a.y * b.x * c.z + a.x * b.y * c.z
        - a.z * b.y * c.x
}

/// The GJK stage of the GJK+EPA solver.
///
/// Unlike the [`VoronoiSimplexSolver`](crate::query::gjk::VoronoiSimplexSolver)
/// based detector, this variant keeps the final simplex around so EPA can
/// expand it into a polytope.
#[derive(Clone, Debug)]
pub struct Gjk {
    pub(crate) ray: Vector<Real>,
    pub(crate) distance: Real,
    pub(crate) simplices: [Simplex; 2],
    pub(crate) store: [SupportVertex; 4],
    free: ArrayVec<usize, 4>,
    current: usize,
    pub(crate) status: GjkStatus,
}

impl Default for Gjk {
    fn default() -> Self {
        Self::new()
    }
}

impl Gjk {
    /// Creates a GJK solver in the failed state.
    pub fn new() -> Self {
        Self {
            ray: Vector::zeros(),
            distance: 0.0,
            simplices: [Simplex::default(); 2],
            store: [SupportVertex::default(); 4],
            free: ArrayVec::new(),
            current: 0,
            status: GjkStatus::Failed,
        }
    }

    /// The simplex GJK terminated on.
    #[inline]
    pub fn simplex(&self) -> &Simplex {
        &self.simplices[self.current]
    }

    /// The last closest point of the simplex to the origin.
    #[inline]
    pub fn ray(&self) -> &Vector<Real> {
        &self.ray
    }

    /// The distance between the cores found by the last evaluation.
    #[inline]
    pub fn distance(&self) -> Real {
        self.distance
    }

    /// The store vertex referenced by `id`.
    #[inline]
    pub fn vertex(&self, id: usize) -> &SupportVertex {
        &self.store[id]
    }

    /// Runs GJK on `shape`, starting the search along `-guess`.
    pub fn evaluate<G1, G2>(&mut self, shape: &MinkowskiDiff<G1, G2>, guess: &Vector<Real>) -> GjkStatus
    where
        G1: ?Sized + SupportMap,
        G2: ?Sized + SupportMap,
    {
        let mut iterations = 0;
        let mut alpha: Real = 0.0;
        let mut lastw = [Vector::zeros(); 4];
        let mut clastw = 0;

        self.free.clear();
        self.free.extend(0..4);
        self.current = 0;
        self.status = GjkStatus::Valid;
        self.distance = 0.0;
        self.simplices[0].rank = 0;
        self.ray = *guess;

        let sqrl = self.ray.norm_squared();
        let first_dir = if sqrl > 0.0 { -self.ray } else { Vector::x() };
        self.append_vertex(shape, self.current, &first_dir);
        self.simplices[0].p[0] = 1.0;
        self.ray = self.store[self.simplices[0].c[0]].w;
        lastw.fill(self.ray);

        loop {
            let next = 1 - self.current;
            let rl = self.ray.norm();

            if rl < GJK_MIN_DISTANCE {
                self.status = GjkStatus::Inside;
                break;
            }

            let search_dir = -self.ray;
            self.append_vertex(shape, self.current, &search_dir);
            let cs = self.simplices[self.current];
            let w = self.store[cs.c[cs.rank - 1]].w;

            if lastw
                .iter()
                .any(|lw| (w - lw).norm_squared() < GJK_DUPLICATED_EPS)
            {
                self.remove_vertex(self.current);
                break;
            }

            clastw = (clastw + 1) & 3;
            lastw[clastw] = w;

            let omega = self.ray.dot(&w) / rl;
            alpha = omega.max(alpha);

            if (rl - alpha) - GJK_ACCURACY * rl <= 0.0 {
                self.remove_vertex(self.current);
                break;
            }

            let mut weights = [0.0; 4];
            let mut mask = 0;
            let pt = |i: usize| self.store[cs.c[i]].w;
            let sqdist = match cs.rank {
                2 => project_origin2(&pt(0), &pt(1), &mut weights, &mut mask),
                3 => project_origin3(&pt(0), &pt(1), &pt(2), &mut weights, &mut mask),
                4 => project_origin4(&pt(0), &pt(1), &pt(2), &pt(3), &mut weights, &mut mask),
                _ => -1.0,
            };

            if sqdist >= 0.0 {
                let mut ns = Simplex::default();
                self.ray = Vector::zeros();

                for i in 0..cs.rank {
                    if mask & (1 << i) != 0 {
                        ns.c[ns.rank] = cs.c[i];
                        ns.p[ns.rank] = weights[i];
                        ns.rank += 1;
                        self.ray += self.store[cs.c[i]].w * weights[i];
                    } else {
                        self.free.push(cs.c[i]);
                    }
                }

                self.simplices[next] = ns;
                self.current = next;

                if mask == 15 {
                    self.status = GjkStatus::Inside;
                }
            } else {
                self.remove_vertex(self.current);
                break;
            }

            iterations += 1;
            if iterations >= GJK_MAX_ITERATIONS {
                self.status = GjkStatus::Failed;
            }

            if self.status != GjkStatus::Valid {
                break;
            }
        }

        match self.status {
            GjkStatus::Valid => self.distance = self.ray.norm(),
            GjkStatus::Inside => self.distance = 0.0,
            GjkStatus::Failed => {
                log::debug!("GJK failed to converge after {} iterations", iterations)
            }
        }

        self.status
    }

    /// Grows the terminal simplex into a tetrahedron enclosing the origin.
    ///
    /// Returns `false` if no such tetrahedron could be built.
    pub fn enclose_origin<G1, G2>(&mut self, shape: &MinkowskiDiff<G1, G2>) -> bool
    where
        G1: ?Sized + SupportMap,
        G2: ?Sized + SupportMap,
    {
        let s = self.current;
        let simplex = self.simplices[s];
        let w = |i: usize| self.store[simplex.c[i]].w;

        match simplex.rank {
            1 => {
                for i in 0..3 {
                    let mut axis = Vector::zeros();
                    axis[i] = 1.0;

                    if self.try_enclose_along(shape, &axis) {
                        return true;
                    }
                }
            }
            2 => {
                let d = w(1) - w(0);

                for i in 0..3 {
                    let mut axis = Vector::zeros();
                    axis[i] = 1.0;
                    let p = d.cross(&axis);

                    if p.norm_squared() > 0.0 && self.try_enclose_along(shape, &p) {
                        return true;
                    }
                }
            }
            3 => {
                let n = (w(1) - w(0)).cross(&(w(2) - w(0)));

                if n.norm_squared() > 0.0 && self.try_enclose_along(shape, &n) {
                    return true;
                }
            }
            4 => {
                if det(&(w(0) - w(3)), &(w(1) - w(3)), &(w(2) - w(3))).abs() > 0.0 {
                    return true;
                }
            }
            _ => {}
        }

        false
    }

    fn try_enclose_along<G1, G2>(&mut self, shape: &MinkowskiDiff<G1, G2>, dir: &Vector<Real>) -> bool
    where
        G1: ?Sized + SupportMap,
        G2: ?Sized + SupportMap,
    {
        for d in [*dir, -*dir] {
            self.append_vertex(shape, self.current, &d);

            if self.enclose_origin(shape) {
                return true;
            }

            self.remove_vertex(self.current);
        }

        false
    }

    /// Computes the support vertex of `shape` toward `dir`.
    pub fn support<G1, G2>(shape: &MinkowskiDiff<G1, G2>, dir: &Vector<Real>) -> SupportVertex
    where
        G1: ?Sized + SupportMap,
        G2: ?Sized + SupportMap,
    {
        let d = dir / dir.norm();
        SupportVertex {
            d,
            w: shape.support(&d),
        }
    }

    fn remove_vertex(&mut self, simplex: usize) {
        let s = &mut self.simplices[simplex];
        s.rank -= 1;
        self.free.push(s.c[s.rank]);
    }

    fn append_vertex<G1, G2>(&mut self, shape: &MinkowskiDiff<G1, G2>, simplex: usize, dir: &Vector<Real>)
    where
        G1: ?Sized + SupportMap,
        G2: ?Sized + SupportMap,
    {
        let Some(id) = self.free.pop() else {
            debug_assert!(false, "GJK vertex store exhausted");
            return;
        };
        self.store[id] = Self::support(shape, dir);
        let s = &mut self.simplices[simplex];
        s.p[s.rank] = 0.0;
        s.c[s.rank] = id;
        s.rank += 1;
    }
}

fn project_origin2(a: &Vector<Real>, b: &Vector<Real>, w: &mut [Real], m: &mut u32) -> Real {
    let d = b - a;
    let l = d.norm_squared();

    if l > GJK_SIMPLEX2_EPS {
        let t = if l > 0.0 { -a.dot(&d) / l } else { 0.0 };

        if t >= 1.0 {
            w[0] = 0.0;
            w[1] = 1.0;
            *m = 2;
            b.norm_squared()
        } else if t <= 0.0 {
            w[0] = 1.0;
            w[1] = 0.0;
            *m = 1;
            a.norm_squared()
        } else {
            w[1] = t;
            w[0] = 1.0 - t;
            *m = 3;
            (a + d * t).norm_squared()
        }
    } else {
        -1.0
    }
}

fn project_origin3(
    a: &Vector<Real>,
    b: &Vector<Real>,
    c: &Vector<Real>,
    w: &mut [Real],
    m: &mut u32,
) -> Real {
    let vt = [a, b, c];
    let dl = [a - b, b - c, c - a];
    let n = dl[0].cross(&dl[1]);
    let l = n.norm_squared();

    if l <= GJK_SIMPLEX3_EPS {
        return -1.0;
    }

    let mut mindist = -1.0;
    let mut subw = [0.0; 2];
    let mut subm = 0;

    for i in 0..3 {
        if vt[i].dot(&dl[i].cross(&n)) > 0.0 {
            let j = IMD3[i];
            let subd = project_origin2(vt[i], vt[j], &mut subw, &mut subm);

            if mindist < 0.0 || subd < mindist {
                mindist = subd;
                *m = (if subm & 1 != 0 { 1 << i } else { 0 })
                    + (if subm & 2 != 0 { 1 << j } else { 0 });
                w[i] = subw[0];
                w[j] = subw[1];
                w[IMD3[j]] = 0.0;
            }
        }
    }

    if mindist < 0.0 {
        let d = a.dot(&n);
        let s = l.sqrt();
        let p = n * (d / l);
        mindist = p.norm_squared();
        *m = 7;
        w[0] = dl[1].cross(&(b - p)).norm() / s;
        w[1] = dl[2].cross(&(c - p)).norm() / s;
        w[2] = 1.0 - (w[0] + w[1]);
    }

    mindist
}

fn project_origin4(
    a: &Vector<Real>,
    b: &Vector<Real>,
    c: &Vector<Real>,
    d: &Vector<Real>,
    w: &mut [Real],
    m: &mut u32,
) -> Real {
    let vt = [a, b, c, d];
    let dl = [a - d, b - d, c - d];
    let vl = det(&dl[0], &dl[1], &dl[2]);
    let ng = (vl * a.dot(&(b - c).cross(&(a - b)))) <= 0.0;

    if !ng || vl.abs() <= GJK_SIMPLEX4_EPS {
        return -1.0;
    }

    let mut mindist = -1.0;
    let mut subw = [0.0; 3];
    let mut subm = 0;

    for i in 0..3 {
        let j = IMD3[i];
        let s = vl * d.dot(&dl[i].cross(&dl[j]));

        if s > 0.0 {
            let subd = project_origin3(vt[i], vt[j], d, &mut subw, &mut subm);

            if mindist < 0.0 || subd < mindist {
                mindist = subd;
                *m = (if subm & 1 != 0 { 1 << i } else { 0 })
                    + (if subm & 2 != 0 { 1 << j } else { 0 })
                    + (if subm & 4 != 0 { 8 } else { 0 });
                w[i] = subw[0];
                w[j] = subw[1];
                w[IMD3[j]] = 0.0;
                w[3] = subw[2];
            }
        }
    }

    if mindist < 0.0 {
        mindist = 0.0;
        *m = 15;
        w[0] = det(c, b, d) / vl;
        w[1] = det(a, c, d) / vl;
        w[2] = det(b, a, d) / vl;
        w[3] = 1.0 - (w[0] + w[1] + w[2]);
    }

    mindist
}
