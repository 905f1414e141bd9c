//! Incremental closest-point-to-origin solver over a simplex of up to four
//! vertices, using Voronoi region tests.

use arrayvec::ArrayVec;
use bitflags::bitflags;

use crate::math::{Point, Real, Vector, LARGE_FLOAT};

/// Default squared distance under which two simplex vertices are considered equal.
pub const EQUAL_VERTEX_THRESHOLD: Real = 1.0e-4;

/// Squared tolerance on the projection of a tetrahedron vertex onto the plane
/// of its opposite face. Below it the tetrahedron is flat.
const DEGENERATE_TETRAHEDRON_EPS: Real = 1.0e-4 * 1.0e-4;

bitflags! {
    /// The vertices of a simplex involved in the closest point to the origin.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct VertexUsage: u8 {
        /// The first vertex.
        const A = 1 << 0;
        /// The second vertex.
        const B = 1 << 1;
        /// The third vertex.
        const C = 1 << 2;
        /// The fourth vertex.
        const D = 1 << 3;
    }
}

/// The closest point of a (sub-)simplex to a query point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SubSimplexClosestResult {
    /// The closest point.
    pub closest_point: Point<Real>,
    /// The vertices the closest point is a convex combination of.
    pub used_vertices: VertexUsage,
    /// The barycentric coordinates of the closest point, one per vertex.
    pub barycentric_coords: [Real; 4],
    /// Set if the simplex was found to be flat.
    pub degenerate: bool,
}

impl Default for SubSimplexClosestResult {
    fn default() -> Self {
        Self {
            closest_point: Point::origin(),
            used_vertices: VertexUsage::empty(),
            barycentric_coords: [0.0; 4],
            degenerate: false,
        }
    }
}

impl SubSimplexClosestResult {
    /// Resets this result to a non-degenerate, empty state.
    pub fn reset(&mut self) {
        self.degenerate = false;
        self.barycentric_coords = [0.0; 4];
        self.used_vertices = VertexUsage::empty();
    }

    /// Whether the barycentric coordinates describe a point of the simplex.
    pub fn is_valid(&self) -> bool {
        self.barycentric_coords.iter().all(|c| *c >= 0.0)
    }

    fn set_barycentric_coordinates(&mut self, a: Real, b: Real, c: Real, d: Real) {
        self.barycentric_coords = [a, b, c, d];
    }
}

/// A vertex of the Minkowski difference, with its witnesses on both shapes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SimplexVertex {
    /// The vertex `p - q` of the Minkowski difference.
    pub w: Vector<Real>,
    /// The witness point on the first shape.
    pub p: Point<Real>,
    /// The witness point on the second shape.
    pub q: Point<Real>,
}

/// Incremental solver computing the point of a simplex closest to the origin.
///
/// The simplex lives in the Minkowski difference of two shapes. Vertices are
/// added one at a time by GJK, and vertices that do not contribute to the
/// closest point are dropped, so the simplex stays minimal.
///
/// The solver holds per-query state: call [`VoronoiSimplexSolver::reset`]
/// before every new pair query.
#[derive(Clone, Debug)]
pub struct VoronoiSimplexSolver {
    vertices: ArrayVec<SimplexVertex, 4>,
    cached_p1: Point<Real>,
    cached_p2: Point<Real>,
    cached_v: Vector<Real>,
    last_w: Vector<Real>,
    equal_vertex_threshold: Real,
    cached_valid_closest: bool,
    cached_bc: SubSimplexClosestResult,
    needs_update: bool,
}

impl Default for VoronoiSimplexSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl VoronoiSimplexSolver {
    /// Creates a new, empty, simplex solver.
    pub fn new() -> Self {
        VoronoiSimplexSolver {
            vertices: ArrayVec::new(),
            cached_p1: Point::origin(),
            cached_p2: Point::origin(),
            cached_v: Vector::zeros(),
            last_w: Vector::repeat(LARGE_FLOAT),
            equal_vertex_threshold: EQUAL_VERTEX_THRESHOLD,
            cached_valid_closest: false,
            cached_bc: SubSimplexClosestResult::default(),
            needs_update: true,
        }
    }

    /// Empties the simplex.
    pub fn reset(&mut self) {
        self.cached_valid_closest = false;
        self.vertices.clear();
        self.needs_update = true;
        self.last_w = Vector::repeat(LARGE_FLOAT);
        self.cached_bc.reset();
    }

    /// The squared distance under which two vertices are considered equal.
    pub fn equal_vertex_threshold(&self) -> Real {
        self.equal_vertex_threshold
    }

    /// Sets the squared distance under which two vertices are considered equal.
    pub fn set_equal_vertex_threshold(&mut self, threshold: Real) {
        self.equal_vertex_threshold = threshold;
    }

    /// The number of vertices of this simplex.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// The vertices of this simplex.
    #[inline]
    pub fn vertices(&self) -> &[SimplexVertex] {
        &self.vertices
    }

    /// Whether the simplex is empty.
    #[inline]
    pub fn empty_simplex(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Whether the simplex is a tetrahedron.
    #[inline]
    pub fn full_simplex(&self) -> bool {
        self.vertices.is_full()
    }

    /// The barycentric description of the last closest point computation.
    #[inline]
    pub fn closest_result(&self) -> &SubSimplexClosestResult {
        &self.cached_bc
    }

    /// Adds the vertex `w = p - q` to the simplex.
    ///
    /// The caller must not add a vertex to a full simplex, nor a vertex for
    /// which [`Self::in_simplex`] returns `true`.
    pub fn add_vertex(&mut self, w: Vector<Real>, p: Point<Real>, q: Point<Real>) {
        debug_assert!(!self.full_simplex(), "adding a vertex to a full simplex");
        self.last_w = w;
        self.needs_update = true;
        self.vertices.push(SimplexVertex { w, p, q });
    }

    /// Removes the `index`-th vertex, replacing it by the last one.
    pub fn remove_vertex(&mut self, index: usize) {
        debug_assert!(index < self.vertices.len());
        let _ = self.vertices.swap_remove(index);
    }

    /// Drops the vertices that are not part of `used`.
    pub fn reduce_vertices(&mut self, used: VertexUsage) {
        if self.num_vertices() >= 4 && !used.contains(VertexUsage::D) {
            self.remove_vertex(3);
        }
        if self.num_vertices() >= 3 && !used.contains(VertexUsage::C) {
            self.remove_vertex(2);
        }
        if self.num_vertices() >= 2 && !used.contains(VertexUsage::B) {
            self.remove_vertex(1);
        }
        if self.num_vertices() >= 1 && !used.contains(VertexUsage::A) {
            self.remove_vertex(0);
        }
    }

    /// Computes the closest point of the simplex to the origin and reduces the
    /// simplex to the vertices supporting it.
    ///
    /// Returns `false` if no valid closest point exists, which includes the
    /// case of a flat tetrahedron (see [`SubSimplexClosestResult::degenerate`]).
    pub fn update_closest_vector_and_points(&mut self) -> bool {
        if !self.needs_update {
            return self.cached_valid_closest;
        }

        self.cached_bc.reset();
        self.needs_update = false;

        match self.num_vertices() {
            0 => self.cached_valid_closest = false,
            1 => {
                let v = self.vertices[0];
                self.cached_p1 = v.p;
                self.cached_p2 = v.q;
                self.cached_v = v.p - v.q;
                self.cached_bc.set_barycentric_coordinates(1.0, 0.0, 0.0, 0.0);
                self.cached_bc.used_vertices = VertexUsage::A;
                self.cached_valid_closest = self.cached_bc.is_valid();
            }
            2 => {
                let [v0, v1] = [self.vertices[0], self.vertices[1]];
                let from = v0.w;
                let v = v1.w - from;
                let mut t = v.dot(&-from);

                if t > 0.0 {
                    let dot_vv = v.norm_squared();
                    if t < dot_vv {
                        t /= dot_vv;
                        self.cached_bc.used_vertices = VertexUsage::A | VertexUsage::B;
                    } else {
                        t = 1.0;
                        self.cached_bc.used_vertices = VertexUsage::B;
                    }
                } else {
                    t = 0.0;
                    self.cached_bc.used_vertices = VertexUsage::A;
                }

                self.cached_bc
                    .set_barycentric_coordinates(1.0 - t, t, 0.0, 0.0);
                self.cached_bc.closest_point = Point::from(from + v * t);
                self.cached_p1 = v0.p + (v1.p - v0.p) * t;
                self.cached_p2 = v0.q + (v1.q - v0.q) * t;
                self.cached_v = self.cached_p1 - self.cached_p2;
                self.reduce_vertices(self.cached_bc.used_vertices);
                self.cached_valid_closest = self.cached_bc.is_valid();
            }
            3 => {
                let [a, b, c] = [self.vertices[0], self.vertices[1], self.vertices[2]];
                let _ = closest_pt_point_triangle(
                    &Point::origin(),
                    &Point::from(a.w),
                    &Point::from(b.w),
                    &Point::from(c.w),
                    &mut self.cached_bc,
                );
                self.update_cached_points();
                self.reduce_vertices(self.cached_bc.used_vertices);
                self.cached_valid_closest = self.cached_bc.is_valid();
            }
            4 => {
                let [a, b, c, d] = [
                    self.vertices[0],
                    self.vertices[1],
                    self.vertices[2],
                    self.vertices[3],
                ];
                let has_separation = closest_pt_point_tetrahedron(
                    &Point::origin(),
                    &Point::from(a.w),
                    &Point::from(b.w),
                    &Point::from(c.w),
                    &Point::from(d.w),
                    &mut self.cached_bc,
                );

                if has_separation {
                    self.update_cached_points();
                    self.reduce_vertices(self.cached_bc.used_vertices);
                    self.cached_valid_closest = self.cached_bc.is_valid();
                } else if self.cached_bc.degenerate {
                    self.cached_valid_closest = false;
                } else {
                    // The origin is inside the tetrahedron.
                    self.cached_valid_closest = true;
                    self.cached_v = Vector::zeros();
                }
            }
            _ => unreachable!(),
        }

        self.cached_valid_closest
    }

    fn update_cached_points(&mut self) {
        let bc = &self.cached_bc.barycentric_coords;
        let mut p1 = Vector::zeros();
        let mut p2 = Vector::zeros();

        for (v, coord) in self.vertices.iter().zip(bc.iter()) {
            p1 += v.p.coords * *coord;
            p2 += v.q.coords * *coord;
        }

        self.cached_p1 = Point::from(p1);
        self.cached_p2 = Point::from(p2);
        self.cached_v = p1 - p2;
    }

    /// Computes the point of the simplex closest to the origin.
    ///
    /// Returns `None` if the simplex does not have a valid closest point.
    pub fn closest(&mut self) -> Option<Vector<Real>> {
        if self.update_closest_vector_and_points() {
            Some(self.cached_v)
        } else {
            None
        }
    }

    /// The last closest point computed, valid or not.
    #[inline]
    pub fn backup_closest(&self) -> Vector<Real> {
        self.cached_v
    }

    /// The squared norm of the largest vertex of the simplex.
    pub fn max_vertex(&self) -> Real {
        self.vertices
            .iter()
            .map(|v| v.w.norm_squared())
            .fold(0.0, Real::max)
    }

    /// Tests if `w` is already a vertex of this simplex.
    pub fn in_simplex(&self, w: &Vector<Real>) -> bool {
        if *w == self.last_w {
            return true;
        }

        self.vertices
            .iter()
            .any(|v| (v.w - w).norm_squared() <= self.equal_vertex_threshold)
    }

    /// The closest points on both shapes corresponding to the closest point of the simplex.
    pub fn compute_points(&mut self) -> (Point<Real>, Point<Real>) {
        let _ = self.update_closest_vector_and_points();
        (self.cached_p1, self.cached_p2)
    }
}

/// Computes the point of the triangle `abc` closest to `p`.
///
/// Always succeeds: degenerate triangles resolve to one of their edges or vertices.
pub fn closest_pt_point_triangle(
    p: &Point<Real>,
    a: &Point<Real>,
    b: &Point<Real>,
    c: &Point<Real>,
    result: &mut SubSimplexClosestResult,
) -> bool {
    result.used_vertices = VertexUsage::empty();

    // Vertex region A.
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);

    if d1 <= 0.0 && d2 <= 0.0 {
        result.closest_point = *a;
        result.used_vertices = VertexUsage::A;
        result.set_barycentric_coordinates(1.0, 0.0, 0.0, 0.0);
        return true;
    }

    // Vertex region B.
    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);

    if d3 >= 0.0 && d4 <= d3 {
        result.closest_point = *b;
        result.used_vertices = VertexUsage::B;
        result.set_barycentric_coordinates(0.0, 1.0, 0.0, 0.0);
        return true;
    }

    // Edge region AB.
    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        result.closest_point = a + ab * v;
        result.used_vertices = VertexUsage::A | VertexUsage::B;
        result.set_barycentric_coordinates(1.0 - v, v, 0.0, 0.0);
        return true;
    }

    // Vertex region C.
    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);

    if d6 >= 0.0 && d5 <= d6 {
        result.closest_point = *c;
        result.used_vertices = VertexUsage::C;
        result.set_barycentric_coordinates(0.0, 0.0, 1.0, 0.0);
        return true;
    }

    // Edge region AC.
    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        result.closest_point = a + ac * w;
        result.used_vertices = VertexUsage::A | VertexUsage::C;
        result.set_barycentric_coordinates(1.0 - w, 0.0, w, 0.0);
        return true;
    }

    // Edge region BC.
    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        result.closest_point = b + (c - b) * w;
        result.used_vertices = VertexUsage::B | VertexUsage::C;
        result.set_barycentric_coordinates(0.0, 1.0 - w, w, 0.0);
        return true;
    }

    // Face region.
    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;

    result.closest_point = a + ab * v + ac * w;
    result.used_vertices = VertexUsage::A | VertexUsage::B | VertexUsage::C;
    result.set_barycentric_coordinates(1.0 - v - w, v, w, 0.0);
    true
}

/// Tests on which side of the plane `abc` the point `p` lies, relative to `d`.
///
/// Returns `Some(true)` if `p` and `d` are on opposite sides, `Some(false)`
/// otherwise, and `None` if `d` lies on the plane (flat tetrahedron).
fn point_outside_of_plane(
    p: &Point<Real>,
    a: &Point<Real>,
    b: &Point<Real>,
    c: &Point<Real>,
    d: &Point<Real>,
) -> Option<bool> {
    let normal = (b - a).cross(&(c - a));
    let sign_p = (p - a).dot(&normal);
    let sign_d = (d - a).dot(&normal);

    if sign_d * sign_d < DEGENERATE_TETRAHEDRON_EPS {
        None
    } else {
        Some(sign_p * sign_d < 0.0)
    }
}

/// Computes the point of the tetrahedron `abcd` closest to `p`.
///
/// Returns `false` if `p` is inside the tetrahedron, or if the tetrahedron is
/// flat, in which case `final_result.degenerate` is set.
pub fn closest_pt_point_tetrahedron(
    p: &Point<Real>,
    a: &Point<Real>,
    b: &Point<Real>,
    c: &Point<Real>,
    d: &Point<Real>,
    final_result: &mut SubSimplexClosestResult,
) -> bool {
    let mut temp = SubSimplexClosestResult::default();

    final_result.closest_point = *p;
    final_result.used_vertices = VertexUsage::all();

    let sides = [
        point_outside_of_plane(p, a, b, c, d),
        point_outside_of_plane(p, a, c, d, b),
        point_outside_of_plane(p, a, d, b, c),
        point_outside_of_plane(p, b, d, c, a),
    ];

    if sides.iter().any(Option::is_none) {
        final_result.degenerate = true;
        return false;
    }

    let [outside_abc, outside_acd, outside_adb, outside_bdc] = sides.map(|s| s == Some(true));

    if !outside_abc && !outside_acd && !outside_adb && !outside_bdc {
        return false;
    }

    let mut best_sq_dist = Real::MAX;
    let mut consider = |tri: [&Point<Real>; 3],
                        usage: [VertexUsage; 3],
                        coords: fn([Real; 3]) -> [Real; 4],
                        final_result: &mut SubSimplexClosestResult| {
        let _ = closest_pt_point_triangle(p, tri[0], tri[1], tri[2], &mut temp);
        let q = temp.closest_point;
        let sq_dist = (q - p).norm_squared();

        if sq_dist < best_sq_dist {
            best_sq_dist = sq_dist;
            final_result.closest_point = q;
            final_result.used_vertices = VertexUsage::empty();
            for (flag, mapped) in [VertexUsage::A, VertexUsage::B, VertexUsage::C]
                .into_iter()
                .zip(usage)
            {
                if temp.used_vertices.contains(flag) {
                    final_result.used_vertices |= mapped;
                }
            }
            let bc = temp.barycentric_coords;
            final_result.barycentric_coords = coords([bc[0], bc[1], bc[2]]);
        }
    };

    if outside_abc {
        consider(
            [a, b, c],
            [VertexUsage::A, VertexUsage::B, VertexUsage::C],
            |t| [t[0], t[1], t[2], 0.0],
            final_result,
        );
    }

    if outside_acd {
        consider(
            [a, c, d],
            [VertexUsage::A, VertexUsage::C, VertexUsage::D],
            |t| [t[0], 0.0, t[1], t[2]],
            final_result,
        );
    }

    if outside_adb {
        consider(
            [a, d, b],
            [VertexUsage::A, VertexUsage::D, VertexUsage::B],
            |t| [t[0], t[2], 0.0, t[1]],
            final_result,
        );
    }

    if outside_bdc {
        consider(
            [b, d, c],
            [VertexUsage::B, VertexUsage::D, VertexUsage::C],
            |t| [0.0, t[0], t[2], t[1]],
            final_result,
        );
    }

    true
}

#[cfg(test)]
mod test {
    use super::*;

    fn add(solver: &mut VoronoiSimplexSolver, w: Vector<Real>) {
        solver.add_vertex(w, Point::from(w), Point::origin());
    }

    #[test]
    fn segment_closest_point() {
        let mut solver = VoronoiSimplexSolver::new();
        add(&mut solver, Vector::new(-1.0, 1.0, 0.0));
        add(&mut solver, Vector::new(1.0, 1.0, 0.0));

        let v = solver.closest().unwrap();
        assert_relative_eq!(v, Vector::new(0.0, 1.0, 0.0), epsilon = 1.0e-6);
        assert_eq!(solver.num_vertices(), 2);
    }

    #[test]
    fn segment_reduces_to_vertex() {
        let mut solver = VoronoiSimplexSolver::new();
        add(&mut solver, Vector::new(1.0, 1.0, 0.0));
        add(&mut solver, Vector::new(2.0, 1.0, 0.0));

        let v = solver.closest().unwrap();
        assert_relative_eq!(v, Vector::new(1.0, 1.0, 0.0), epsilon = 1.0e-6);
        assert_eq!(solver.num_vertices(), 1);
    }

    #[test]
    fn triangle_face_region() {
        let mut solver = VoronoiSimplexSolver::new();
        add(&mut solver, Vector::new(-1.0, -1.0, 2.0));
        add(&mut solver, Vector::new(1.0, -1.0, 2.0));
        add(&mut solver, Vector::new(0.0, 1.0, 2.0));

        let v = solver.closest().unwrap();
        assert_relative_eq!(v, Vector::new(0.0, 0.0, 2.0), epsilon = 1.0e-6);
        assert_eq!(solver.num_vertices(), 3);

        let bc = solver.closest_result().barycentric_coords;
        assert_relative_eq!(bc.iter().sum::<Real>(), 1.0, epsilon = 1.0e-6);
    }

    #[test]
    fn tetrahedron_containing_origin() {
        let mut solver = VoronoiSimplexSolver::new();
        add(&mut solver, Vector::new(1.0, 0.0, -1.0));
        add(&mut solver, Vector::new(-1.0, 1.0, -1.0));
        add(&mut solver, Vector::new(-1.0, -1.0, -1.0));
        add(&mut solver, Vector::new(0.0, 0.0, 1.0));

        let v = solver.closest().unwrap();
        assert_eq!(v, Vector::zeros());
        assert!(solver.full_simplex());
    }

    #[test]
    fn tetrahedron_separated_from_origin() {
        let mut solver = VoronoiSimplexSolver::new();
        add(&mut solver, Vector::new(1.0, 0.0, 1.0));
        add(&mut solver, Vector::new(-1.0, 1.0, 1.0));
        add(&mut solver, Vector::new(-1.0, -1.0, 1.0));
        add(&mut solver, Vector::new(0.0, 0.0, 3.0));

        let v = solver.closest().unwrap();
        assert_relative_eq!(v, Vector::new(0.0, 0.0, 1.0), epsilon = 1.0e-6);
        assert_eq!(solver.num_vertices(), 3);
    }

    #[test]
    fn flat_tetrahedron_is_degenerate() {
        let mut solver = VoronoiSimplexSolver::new();
        add(&mut solver, Vector::new(1.0, 0.0, 1.0));
        add(&mut solver, Vector::new(-1.0, 1.0, 1.0));
        add(&mut solver, Vector::new(-1.0, -1.0, 1.0));
        add(&mut solver, Vector::new(0.5, 0.5, 1.0));

        assert!(solver.closest().is_none());
        assert!(solver.closest_result().degenerate);
    }

    #[test]
    fn duplicate_vertices_are_detected() {
        let mut solver = VoronoiSimplexSolver::new();
        add(&mut solver, Vector::new(1.0, 2.0, 3.0));
        assert!(solver.in_simplex(&Vector::new(1.0, 2.0, 3.0)));
        assert!(solver.in_simplex(&Vector::new(1.005, 2.0, 3.0)));
        assert!(!solver.in_simplex(&Vector::new(1.5, 2.0, 3.0)));

        solver.reset();
        assert!(solver.empty_simplex());
        assert!(!solver.in_simplex(&Vector::new(1.0, 2.0, 3.0)));
    }
}
