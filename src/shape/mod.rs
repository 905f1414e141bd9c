//! Shapes supported by impact3d.

pub use self::convex_polyhedron::ConvexPolyhedron;
pub use self::convex_shape::{
    ConvexShape, ShapeKind, ShapeType, CONVEX_DISTANCE_MARGIN,
    MAX_PREFERRED_PENETRATION_DIRECTIONS,
};
pub use self::cuboid::BoxShape;
pub use self::error::ShapeError;
pub use self::minkowski_sum::MinkowskiSum;
pub use self::plane::Plane;
pub use self::sphere::Sphere;
pub use self::support_map::SupportMap;
pub use self::triangle::Triangle;
pub use self::uniform_scaling::UniformScaling;

mod convex_polyhedron;
mod convex_shape;
mod cuboid;
mod error;
mod minkowski_sum;
mod plane;
mod sphere;
mod support_map;
mod triangle;
mod uniform_scaling;
