use super::gjk::{det, Gjk, SupportVertex};
use super::MinkowskiDiff;
use crate::math::{Real, Vector};
use crate::shape::SupportMap;

/// Accuracy at which EPA stops expanding the polytope.
#[cfg(feature = "f32")]
pub const EPA_ACCURACY: Real = 1.0e-4;
/// Accuracy at which EPA stops expanding the polytope.
#[cfg(feature = "f64")]
pub const EPA_ACCURACY: Real = 1.0e-12;

/// Tolerance on the convexity of the polytope.
#[cfg(feature = "f32")]
pub const EPA_PLANE_EPS: Real = 1.0e-5;
/// Tolerance on the convexity of the polytope.
#[cfg(feature = "f64")]
pub const EPA_PLANE_EPS: Real = 1.0e-14;

/// Maximum number of EPA iterations.
pub const EPA_MAX_ITERATIONS: usize = 255;
/// Maximum number of vertices EPA may add to the polytope.
pub const EPA_MAX_VERTICES: usize = 128;
/// Maximum number of faces of the polytope.
pub const EPA_MAX_FACES: usize = EPA_MAX_VERTICES * 2;

const I1M3: [usize; 3] = [1, 2, 0];
const I2M3: [usize; 3] = [2, 0, 1];

/// Parameters of the Expanding Polytope Algorithm.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EpaOptions {
    /// Expansion stops once a new support point improves the depth by less than this.
    pub accuracy: Real,
    /// Maximum number of expansions.
    pub max_iterations: usize,
    /// Maximum number of vertices added to the polytope.
    pub max_vertices: usize,
    /// Maximum number of faces of the polytope.
    pub max_faces: usize,
    /// Tolerance on the convexity of the polytope.
    pub plane_eps: Real,
}

impl Default for EpaOptions {
    fn default() -> Self {
        Self {
            accuracy: EPA_ACCURACY,
            max_iterations: EPA_MAX_ITERATIONS,
            max_vertices: EPA_MAX_VERTICES,
            max_faces: EPA_MAX_FACES,
            plane_eps: EPA_PLANE_EPS,
        }
    }
}

/// The status of an EPA evaluation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EpaStatus {
    /// The expansion is in progress or ended normally.
    Valid,
    /// The shapes are touching.
    Touching,
    /// A face of the polytope degenerated.
    Degenerated,
    /// The polytope lost its convexity.
    NonConvex,
    /// The horizon could not be closed.
    InvalidHull,
    /// The face pool is exhausted.
    OutOfFaces,
    /// The vertex pool is exhausted.
    OutOfVertices,
    /// The requested accuracy was reached.
    AccuracyReached,
    /// GJK produced no usable simplex; the result is a guess.
    FallBack,
    /// EPA failed.
    Failed,
}

impl EpaStatus {
    /// Whether the result carries usable penetration geometry.
    ///
    /// [`EpaStatus::FallBack`] and [`EpaStatus::Failed`] do not.
    pub fn is_usable(self) -> bool {
        !matches!(self, EpaStatus::FallBack | EpaStatus::Failed)
    }
}

#[derive(Copy, Clone, Debug)]
struct Face {
    n: Vector<Real>,
    d: Real,
    c: [usize; 3],
    f: [usize; 3],
    l: [Option<usize>; 2],
    e: [usize; 3],
    pass: u32,
}

impl Default for Face {
    fn default() -> Self {
        Self {
            n: Vector::zeros(),
            d: 0.0,
            c: [0; 3],
            f: [0; 3],
            l: [None; 2],
            e: [0; 3],
            pass: 0,
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct FaceList {
    root: Option<usize>,
    count: usize,
}

#[derive(Copy, Clone, Debug, Default)]
struct Horizon {
    cf: Option<usize>,
    ff: Option<usize>,
    nf: usize,
}

/// The result simplex of EPA: the nearest face of the polytope.
#[derive(Copy, Clone, Debug, Default)]
pub struct EpaSimplex {
    /// The vertices of the face.
    pub c: [SupportVertex; 3],
    /// The barycentric coordinates of the projection of the origin on the face.
    pub p: [Real; 3],
    /// The number of meaningful vertices.
    pub rank: usize,
}

/// The Expanding Polytope Algorithm.
///
/// Faces and vertices live in fixed pools whose sizes are set by [`EpaOptions`].
/// Faces are linked either into the hull or into the free stock.
#[derive(Clone, Debug)]
pub struct Epa {
    options: EpaOptions,
    status: EpaStatus,
    result: EpaSimplex,
    normal: Vector<Real>,
    depth: Real,
    vertices: Vec<SupportVertex>,
    next_vertex: usize,
    faces: Vec<Face>,
    hull: FaceList,
    stock: FaceList,
}

impl Default for Epa {
    fn default() -> Self {
        Self::new(EpaOptions::default())
    }
}

impl Epa {
    /// Creates an EPA solver with the given pool sizes and tolerances.
    pub fn new(options: EpaOptions) -> Self {
        let mut epa = Self {
            options,
            status: EpaStatus::Failed,
            result: EpaSimplex::default(),
            normal: Vector::zeros(),
            depth: 0.0,
            vertices: Vec::with_capacity(options.max_vertices + 4),
            next_vertex: 0,
            faces: vec![Face::default(); options.max_faces],
            hull: FaceList::default(),
            stock: FaceList::default(),
        };

        for i in (0..options.max_faces).rev() {
            epa.append(Pool::Stock, i);
        }

        epa
    }

    /// The status of the last evaluation.
    #[inline]
    pub fn status(&self) -> EpaStatus {
        self.status
    }

    /// The penetration normal of `A - B` found by the last evaluation.
    #[inline]
    pub fn normal(&self) -> &Vector<Real> {
        &self.normal
    }

    /// The penetration depth found by the last evaluation.
    #[inline]
    pub fn depth(&self) -> Real {
        self.depth
    }

    /// The nearest face of the final polytope.
    #[inline]
    pub fn result(&self) -> &EpaSimplex {
        &self.result
    }

    /// Expands the terminal simplex of `gjk` until the face of the Minkowski
    /// difference nearest to the origin is found.
    pub fn evaluate<G1, G2>(
        &mut self,
        gjk: &mut Gjk,
        shape: &MinkowskiDiff<G1, G2>,
        guess: &Vector<Real>,
    ) -> EpaStatus
    where
        G1: ?Sized + SupportMap,
        G2: ?Sized + SupportMap,
    {
        if gjk.simplex().rank > 1 && gjk.enclose_origin(shape) {
            while let Some(f) = self.hull.root {
                self.remove(Pool::Hull, f);
                self.append(Pool::Stock, f);
            }

            self.status = EpaStatus::Valid;
            self.next_vertex = 0;
            self.vertices.clear();

            let simplex = *gjk.simplex();
            let mut c: [SupportVertex; 4] =
                [0, 1, 2, 3].map(|i| *gjk.vertex(simplex.c[i]));

            // Orient the simplex.
            if det(&(c[0].w - c[3].w), &(c[1].w - c[3].w), &(c[2].w - c[3].w)) < 0.0 {
                c.swap(0, 1);
            }

            self.vertices.extend_from_slice(&c);

            let tetra = [
                self.new_face(0, 1, 2, true),
                self.new_face(1, 0, 3, true),
                self.new_face(2, 1, 3, true),
                self.new_face(0, 2, 3, true),
            ];

            if self.hull.count == 4 {
                if let [Some(t0), Some(t1), Some(t2), Some(t3)] = tetra {
                    return self.expand_hull(shape, [t0, t1, t2, t3]);
                }
            }
        }

        // Fall-back: the nearest face cannot be found.
        self.status = EpaStatus::FallBack;
        self.normal = -*guess;
        let nl = self.normal.norm();
        if nl > 0.0 {
            self.normal /= nl;
        } else {
            self.normal = Vector::x();
        }
        self.depth = 0.0;
        let simplex = gjk.simplex();
        self.result.rank = 1;
        self.result.c[0] = *gjk.vertex(simplex.c[0]);
        self.result.p[0] = 1.0;
        self.status
    }

    fn expand_hull<G1, G2>(&mut self, shape: &MinkowskiDiff<G1, G2>, tetra: [usize; 4]) -> EpaStatus
    where
        G1: ?Sized + SupportMap,
        G2: ?Sized + SupportMap,
    {
        let [t0, t1, t2, t3] = tetra;
        let Some(mut best) = self.find_best() else {
            self.status = EpaStatus::Failed;
            return self.status;
        };
        let mut outer = self.faces[best];
        let mut pass = 0;

        self.bind(t0, 0, t1, 0);
        self.bind(t0, 1, t2, 0);
        self.bind(t0, 2, t3, 0);
        self.bind(t1, 1, t3, 2);
        self.bind(t1, 2, t2, 1);
        self.bind(t2, 2, t3, 1);
        self.status = EpaStatus::Valid;

        for _ in 0..self.options.max_iterations {
            if self.next_vertex >= self.options.max_vertices {
                self.status = EpaStatus::OutOfVertices;
                break;
            }

            let mut horizon = Horizon::default();
            pass += 1;
            self.faces[best].pass = pass;

            let w = Gjk::support(shape, &self.faces[best].n);
            let wid = self.vertices.len();
            self.vertices.push(w);
            self.next_vertex += 1;

            let wdist = self.faces[best].n.dot(&w.w) - self.faces[best].d;

            if wdist <= self.options.accuracy {
                self.status = EpaStatus::AccuracyReached;
                break;
            }

            let mut valid = true;
            for j in 0..3 {
                if !valid {
                    break;
                }
                let face = self.faces[best];
                valid &= self.expand(pass, wid, face.f[j], face.e[j], &mut horizon);
            }

            match (valid, horizon.cf, horizon.ff) {
                (true, Some(cf), Some(ff)) if horizon.nf >= 3 => {
                    self.bind(cf, 1, ff, 2);
                    self.remove(Pool::Hull, best);
                    self.append(Pool::Stock, best);

                    let Some(next_best) = self.find_best() else {
                        self.status = EpaStatus::InvalidHull;
                        break;
                    };
                    best = next_best;
                    outer = self.faces[best];
                }
                _ => {
                    self.status = EpaStatus::InvalidHull;
                    break;
                }
            }
        }

        if matches!(
            self.status,
            EpaStatus::OutOfVertices | EpaStatus::OutOfFaces | EpaStatus::InvalidHull
        ) {
            log::debug!("EPA stopped early: {:?}", self.status);
        }

        let projection = outer.n * outer.d;
        let cw = outer.c.map(|i| self.vertices[i].w - projection);
        self.normal = outer.n;
        self.depth = outer.d;
        self.result.rank = 3;
        self.result.c = outer.c.map(|i| self.vertices[i]);
        self.result.p = [
            cw[1].cross(&cw[2]).norm(),
            cw[2].cross(&cw[0]).norm(),
            cw[0].cross(&cw[1]).norm(),
        ];
        let sum: Real = self.result.p.iter().sum();
        for p in &mut self.result.p {
            *p /= sum;
        }

        self.status
    }

    fn bind(&mut self, fa: usize, ea: usize, fb: usize, eb: usize) {
        self.faces[fa].e[ea] = eb;
        self.faces[fa].f[ea] = fb;
        self.faces[fb].e[eb] = ea;
        self.faces[fb].f[eb] = fa;
    }

    fn list(&mut self, pool: Pool) -> &mut FaceList {
        match pool {
            Pool::Hull => &mut self.hull,
            Pool::Stock => &mut self.stock,
        }
    }

    fn append(&mut self, pool: Pool, face: usize) {
        let root = self.list(pool).root;
        self.faces[face].l = [None, root];
        if let Some(root) = root {
            self.faces[root].l[0] = Some(face);
        }
        let list = self.list(pool);
        list.root = Some(face);
        list.count += 1;
    }

    fn remove(&mut self, pool: Pool, face: usize) {
        let [prev, next] = self.faces[face].l;
        if let Some(next) = next {
            self.faces[next].l[0] = prev;
        }
        if let Some(prev) = prev {
            self.faces[prev].l[1] = next;
        }
        let list = self.list(pool);
        if list.root == Some(face) {
            list.root = next;
        }
        list.count -= 1;
    }

    /// Distance from the origin to the edge `ab` of `face`, if the origin
    /// projects outside of that edge.
    fn edge_dist(&self, face: usize, a: usize, b: usize) -> Option<Real> {
        let a = self.vertices[a].w;
        let b = self.vertices[b].w;
        let ba = b - a;
        let n_ab = ba.cross(&self.faces[face].n);

        if a.dot(&n_ab) < 0.0 {
            let a_dot_ba = a.dot(&ba);
            let b_dot_ba = b.dot(&ba);

            let dist = if a_dot_ba > 0.0 {
                a.norm()
            } else if b_dot_ba < 0.0 {
                b.norm()
            } else {
                let a_dot_b = a.dot(&b);
                ((a.norm_squared() * b.norm_squared() - a_dot_b * a_dot_b) / ba.norm_squared())
                    .max(0.0)
                    .sqrt()
            };

            Some(dist)
        } else {
            None
        }
    }

    fn new_face(&mut self, a: usize, b: usize, c: usize, forced: bool) -> Option<usize> {
        let Some(face) = self.stock.root else {
            self.status = EpaStatus::OutOfFaces;
            return None;
        };

        self.remove(Pool::Stock, face);
        self.append(Pool::Hull, face);

        let [wa, wb, wc] = [a, b, c].map(|i| self.vertices[i].w);
        let n = (wb - wa).cross(&(wc - wa));
        let l = n.norm();
        {
            let f = &mut self.faces[face];
            f.pass = 0;
            f.c = [a, b, c];
            f.n = n;
        }

        if l > self.options.accuracy {
            let d = self
                .edge_dist(face, a, b)
                .or_else(|| self.edge_dist(face, b, c))
                .or_else(|| self.edge_dist(face, c, a))
                // The origin projects inside the triangle.
                .unwrap_or_else(|| wa.dot(&n) / l);

            let f = &mut self.faces[face];
            f.d = d;
            f.n /= l;

            if forced || d >= -self.options.plane_eps {
                return Some(face);
            }

            self.status = EpaStatus::NonConvex;
        } else {
            self.status = EpaStatus::Degenerated;
        }

        self.remove(Pool::Hull, face);
        self.append(Pool::Stock, face);
        None
    }

    fn find_best(&self) -> Option<usize> {
        let mut best = self.hull.root?;
        let mut mind = self.faces[best].d * self.faces[best].d;
        let mut curr = self.faces[best].l[1];

        while let Some(f) = curr {
            let sqd = self.faces[f].d * self.faces[f].d;
            if sqd < mind {
                best = f;
                mind = sqd;
            }
            curr = self.faces[f].l[1];
        }

        Some(best)
    }

    fn expand(&mut self, pass: u32, w: usize, f: usize, e: usize, horizon: &mut Horizon) -> bool {
        if self.faces[f].pass == pass {
            return false;
        }

        let e1 = I1M3[e];
        let face = self.faces[f];

        if face.n.dot(&self.vertices[w].w) - face.d < -self.options.plane_eps {
            if let Some(nf) = self.new_face(face.c[e1], face.c[e], w, false) {
                self.bind(nf, 0, f, e);

                if let Some(cf) = horizon.cf {
                    self.bind(cf, 1, nf, 2);
                } else {
                    horizon.ff = Some(nf);
                }

                horizon.cf = Some(nf);
                horizon.nf += 1;
                return true;
            }
        } else {
            let e2 = I2M3[e];
            self.faces[f].pass = pass;

            if self.expand(pass, w, face.f[e1], face.e[e1], horizon)
                && self.expand(pass, w, face.f[e2], face.e[e2], horizon)
            {
                self.remove(Pool::Hull, f);
                self.append(Pool::Stock, f);
                return true;
            }
        }

        false
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Pool {
    Hull,
    Stock,
}
