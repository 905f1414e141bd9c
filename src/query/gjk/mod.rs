//! The GJK algorithm for distance computation, built on a Voronoi simplex solver.

pub use self::gjk_pair_detector::{
    ClosestPointsMethod, DegenerateSimplex, GjkOptions, GjkPairDetector,
    GJK_EPA_PENETRATION_TOLERANCE, GJK_REL_ERROR2,
};
pub use self::special_support_maps::{ConstantOrigin, ConstantPoint};
pub use self::voronoi_simplex::{
    closest_pt_point_tetrahedron, closest_pt_point_triangle, SimplexVertex,
    SubSimplexClosestResult, VertexUsage, VoronoiSimplexSolver, EQUAL_VERTEX_THRESHOLD,
};

mod gjk_pair_detector;
mod special_support_maps;
mod voronoi_simplex;
