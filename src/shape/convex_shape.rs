//! The closed set of convex shapes understood by the narrow-phase.

use arrayvec::ArrayVec;
use num_derive::FromPrimitive;

use crate::math::{Point, Real, Vector, DEFAULT_EPSILON};
use crate::shape::{
    BoxShape, ConvexPolyhedron, MinkowskiSum, ShapeError, Sphere, SupportMap, Triangle,
    UniformScaling,
};
use crate::utils::transform_util;

/// The default collision margin of every shape except spheres.
pub const CONVEX_DISTANCE_MARGIN: Real = 0.04;

/// The maximum number of preferred penetration directions a shape can expose.
pub const MAX_PREFERRED_PENETRATION_DIRECTIONS: usize = 10;

/// The type tag of a convex shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum ShapeType {
    /// A sphere.
    Sphere = 0,
    /// A box.
    Box,
    /// A triangle.
    Triangle,
    /// The Minkowski sum of two convex shapes.
    MinkowskiSum,
    /// A uniformly scaled convex shape.
    UniformScaling,
    /// A convex polyhedron.
    ConvexPolyhedron,
}

/// The geometric description of a convex shape.
#[derive(Debug, Clone)]
pub enum ShapeKind {
    /// A sphere.
    Sphere(Sphere),
    /// A box.
    Box(BoxShape),
    /// A triangle.
    Triangle(Triangle),
    /// The Minkowski sum of two convex shapes.
    MinkowskiSum(MinkowskiSum),
    /// A uniformly scaled convex shape.
    UniformScaling(UniformScaling),
    /// A convex polyhedron.
    ConvexPolyhedron(ConvexPolyhedron),
}

/// A convex shape with a collision margin and a local scaling.
///
/// The margin is a rounding radius added around the "core" shape: support
/// queries come in two flavors, with and without margin. GJK runs on the cores
/// and accounts for margins analytically, which keeps it well-conditioned
/// near contact.
#[derive(Debug, Clone)]
pub struct ConvexShape {
    kind: ShapeKind,
    margin: Real,
    local_scaling: Vector<Real>,
}

impl From<ShapeKind> for ConvexShape {
    fn from(kind: ShapeKind) -> Self {
        ConvexShape {
            kind,
            margin: CONVEX_DISTANCE_MARGIN,
            local_scaling: Vector::repeat(1.0),
        }
    }
}

impl ConvexShape {
    /// A sphere with the given radius.
    pub fn sphere(radius: Real) -> Self {
        ShapeKind::Sphere(Sphere::new(radius)).into()
    }

    /// A box with the given half-extents, margin included.
    pub fn cuboid(half_extents: Vector<Real>) -> Self {
        ShapeKind::Box(BoxShape::new(half_extents)).into()
    }

    /// A triangle.
    pub fn triangle(a: Point<Real>, b: Point<Real>, c: Point<Real>) -> Self {
        ShapeKind::Triangle(Triangle::new(a, b, c)).into()
    }

    /// The convex hull of the given points.
    pub fn convex_polyhedron(points: Vec<Point<Real>>) -> Result<Self, ShapeError> {
        Ok(ShapeKind::ConvexPolyhedron(ConvexPolyhedron::try_new(points)?).into())
    }

    /// The Minkowski sum of two shapes.
    pub fn minkowski_sum(a: ConvexShape, b: ConvexShape) -> Self {
        ShapeKind::MinkowskiSum(MinkowskiSum::new(a, b)).into()
    }

    /// The shape `child` uniformly scaled by `factor`.
    pub fn uniform_scaling(child: ConvexShape, factor: Real) -> Result<Self, ShapeError> {
        if factor <= 0.0 || !factor.is_finite() {
            return Err(ShapeError::InvalidScaling(factor));
        }
        Ok(ShapeKind::UniformScaling(UniformScaling::new(child, factor)).into())
    }

    /// The geometric description of this shape.
    #[inline]
    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    /// The type tag of this shape.
    pub fn shape_type(&self) -> ShapeType {
        match &self.kind {
            ShapeKind::Sphere(_) => ShapeType::Sphere,
            ShapeKind::Box(_) => ShapeType::Box,
            ShapeKind::Triangle(_) => ShapeType::Triangle,
            ShapeKind::MinkowskiSum(_) => ShapeType::MinkowskiSum,
            ShapeKind::UniformScaling(_) => ShapeType::UniformScaling,
            ShapeKind::ConvexPolyhedron(_) => ShapeType::ConvexPolyhedron,
        }
    }

    /// The collision margin of this shape.
    ///
    /// For spheres this is the scaled radius. Composite shapes derive their
    /// margin from their children.
    pub fn margin(&self) -> Real {
        match &self.kind {
            ShapeKind::Sphere(s) => s.radius * self.local_scaling.x,
            ShapeKind::MinkowskiSum(s) => s.margin(),
            ShapeKind::UniformScaling(s) => s.margin(),
            _ => self.margin,
        }
    }

    /// Sets the collision margin of this shape.
    ///
    /// Fails on spheres, Minkowski sums, and scaled shapes, whose margin is
    /// derived from their geometry.
    pub fn set_margin(&mut self, margin: Real) -> Result<(), ShapeError> {
        if margin < 0.0 || !margin.is_finite() {
            return Err(ShapeError::InvalidMargin(margin));
        }

        match &self.kind {
            ShapeKind::Sphere(_) | ShapeKind::MinkowskiSum(_) | ShapeKind::UniformScaling(_) => {
                return Err(ShapeError::DerivedMargin(self.shape_type()));
            }
            ShapeKind::Box(_) | ShapeKind::Triangle(_) | ShapeKind::ConvexPolyhedron(_) => {}
        }

        self.margin = margin;
        Ok(())
    }

    /// The per-axis scaling applied to this shape.
    #[inline]
    pub fn local_scaling(&self) -> &Vector<Real> {
        &self.local_scaling
    }

    /// Sets the per-axis scaling applied to this shape.
    pub fn set_local_scaling(&mut self, scaling: Vector<Real>) -> Result<(), ShapeError> {
        if let Some(bad) = scaling.iter().find(|s| **s <= 0.0 || !s.is_finite()) {
            return Err(ShapeError::InvalidScaling(*bad));
        }
        self.local_scaling = scaling;
        Ok(())
    }

    /// The support point of the core shape (i.e. without margin) toward `dir`.
    pub fn local_support_vertex_without_margin(&self, dir: &Vector<Real>) -> Point<Real> {
        let scale = &self.local_scaling;
        let scaled_dir = dir.component_mul(scale);
        let scaled = |pt: Point<Real>| Point::from(pt.coords.component_mul(scale));

        match &self.kind {
            ShapeKind::Sphere(_) => Point::origin(),
            ShapeKind::Box(b) => {
                let core = (b.half_extents.component_mul(scale) - Vector::repeat(self.margin))
                    .map(|e| e.max(0.0));
                BoxShape::new(core).local_support_point(dir)
            }
            ShapeKind::Triangle(t) => scaled(t.local_support_point(&scaled_dir)),
            ShapeKind::ConvexPolyhedron(p) => scaled(p.local_support_point(&scaled_dir)),
            ShapeKind::MinkowskiSum(s) => s.local_support_point_without_margin(dir),
            ShapeKind::UniformScaling(s) => s.local_support_point_without_margin(dir),
        }
    }

    /// The support point of the full shape (i.e. margin included) toward `dir`.
    pub fn local_support_vertex(&self, dir: &Vector<Real>) -> Point<Real> {
        let mut pt = self.local_support_vertex_without_margin(dir);
        let margin = self.margin();

        if margin != 0.0 {
            let n = dir
                .try_normalize(DEFAULT_EPSILON)
                .unwrap_or_else(|| Vector::repeat(-1.0).normalize());
            pt += n * margin;
        }

        pt
    }

    /// Computes the core support points toward each direction of `dirs`.
    ///
    /// `out` is cleared first.
    pub fn batched_support_vertices_without_margin(
        &self,
        dirs: &[Vector<Real>],
        out: &mut Vec<Point<Real>>,
    ) {
        out.clear();
        out.extend(
            dirs.iter()
                .map(|dir| self.local_support_vertex_without_margin(dir)),
        );
    }

    /// Directions, in local-space, along which this shape is likely to be
    /// separated from another one with the least displacement.
    pub fn preferred_penetration_directions(
        &self,
    ) -> ArrayVec<Vector<Real>, MAX_PREFERRED_PENETRATION_DIRECTIONS> {
        let mut result = ArrayVec::new();

        match &self.kind {
            ShapeKind::Box(_) => result.extend(BoxShape::face_normals()),
            ShapeKind::Triangle(t) => {
                if let Some(n) = t.normal() {
                    result.push(n);
                    result.push(-n);
                }
            }
            _ => {}
        }

        result
    }

    /// The local-space axis-aligned bounding box of this shape, margin included.
    pub fn local_aabb(&self) -> (Point<Real>, Point<Real>) {
        let mut mins = Point::origin();
        let mut maxs = Point::origin();

        for i in 0..3 {
            let mut dir = Vector::zeros();
            dir[i] = 1.0;
            maxs[i] = self.local_support_vertex(&dir)[i];
            dir[i] = -1.0;
            mins[i] = self.local_support_vertex(&dir)[i];
        }

        (mins, maxs)
    }

    /// The radius of the sphere centered at the local origin that encloses
    /// this shape regardless of its orientation.
    ///
    /// This bounds the displacement of any point of the shape caused by a
    /// rotation about the shape origin.
    pub fn angular_motion_disc(&self) -> Real {
        let (mins, maxs) = self.local_aabb();
        transform_util::angular_motion_disc(&mins, &maxs)
    }
}

impl SupportMap for ConvexShape {
    #[inline]
    fn local_support_point(&self, dir: &Vector<Real>) -> Point<Real> {
        self.local_support_vertex(dir)
    }
}

#[cfg(test)]
mod test {
    use crate::math::{Point, Vector};
    use crate::shape::{ConvexShape, ShapeError, ShapeType};
    use num::FromPrimitive;

    #[test]
    fn box_core_is_shrunk_by_its_margin() {
        let shape = ConvexShape::cuboid(Vector::new(0.5, 0.5, 0.5));
        let dir = Vector::new(1.0, 1.0, 1.0);
        let core = shape.local_support_vertex_without_margin(&dir);
        assert_relative_eq!(core, Point::new(0.46, 0.46, 0.46), epsilon = 1.0e-6);

        let full = shape.local_support_vertex(&Vector::x());
        assert_relative_eq!(full.x, 0.5, epsilon = 1.0e-6);
    }

    #[test]
    fn sphere_margin_is_its_radius() {
        let shape = ConvexShape::sphere(2.0);
        assert_eq!(shape.margin(), 2.0);
        assert_eq!(
            shape.local_support_vertex_without_margin(&Vector::y()),
            Point::origin()
        );
        assert_relative_eq!(
            shape.local_support_vertex(&Vector::y()),
            Point::new(0.0, 2.0, 0.0)
        );
    }

    #[test]
    fn scaled_box_support() {
        let mut shape = ConvexShape::cuboid(Vector::new(1.0, 1.0, 1.0));
        shape.set_margin(0.0).unwrap();
        shape
            .set_local_scaling(Vector::new(2.0, 1.0, 0.5))
            .unwrap();
        assert_relative_eq!(
            shape.local_support_vertex(&Vector::new(1.0, -1.0, 1.0)),
            Point::new(2.0, -1.0, 0.5)
        );
        assert!(matches!(
            shape.set_local_scaling(Vector::new(0.0, 1.0, 1.0)),
            Err(ShapeError::InvalidScaling(_))
        ));
    }

    #[test]
    fn composite_margins() {
        let sum = ConvexShape::minkowski_sum(ConvexShape::sphere(0.5), ConvexShape::sphere(0.25));
        assert_relative_eq!(sum.margin(), 0.75);

        let scaled = ConvexShape::uniform_scaling(ConvexShape::sphere(1.0), 3.0).unwrap();
        assert_relative_eq!(scaled.margin(), 3.0);
        assert_eq!(scaled.shape_type(), ShapeType::UniformScaling);
        assert_eq!(ShapeType::from_u8(1), Some(ShapeType::Box));
    }

    #[test]
    fn derived_margins_cannot_be_overridden() {
        let mut ball = ConvexShape::sphere(1.0);
        assert_eq!(
            ball.set_margin(0.1),
            Err(ShapeError::DerivedMargin(ShapeType::Sphere))
        );
        assert_eq!(ball.margin(), 1.0);

        let mut scaled = ConvexShape::uniform_scaling(ConvexShape::sphere(1.0), 2.0).unwrap();
        assert!(scaled.set_margin(0.1).is_err());
        assert_relative_eq!(scaled.margin(), 2.0);

        let mut cube = ConvexShape::cuboid(Vector::new(1.0, 1.0, 1.0));
        assert_eq!(cube.set_margin(0.1), Ok(()));
        assert_eq!(cube.margin(), 0.1);
        assert_eq!(
            cube.set_margin(-1.0),
            Err(ShapeError::InvalidMargin(-1.0))
        );
    }

    #[test]
    fn box_exposes_face_normals_as_penetration_hints() {
        let shape = ConvexShape::cuboid(Vector::new(1.0, 1.0, 1.0));
        assert_eq!(shape.preferred_penetration_directions().len(), 6);
        assert!(ConvexShape::sphere(1.0)
            .preferred_penetration_directions()
            .is_empty());
    }

    #[test]
    fn angular_motion_disc_of_offset_box() {
        let shape = ConvexShape::cuboid(Vector::new(1.0, 1.0, 1.0));
        assert_relative_eq!(
            shape.angular_motion_disc(),
            3.0f64.sqrt() as crate::math::Real,
            epsilon = 1.0e-5
        );
    }
}
