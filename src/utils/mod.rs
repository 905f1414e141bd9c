//! Various unsorted geometrical and logical operators.

pub use self::plane_space::plane_space;
pub use self::point_cloud_support_point::{
    point_cloud_support_point, point_cloud_support_point_id,
};
pub use self::unit_sphere::{unit_sphere_directions, NUM_UNIT_SPHERE_POINTS};

mod plane_space;
mod point_cloud_support_point;
pub mod transform_util;
mod unit_sphere;
