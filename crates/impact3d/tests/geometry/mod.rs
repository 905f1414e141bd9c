mod box_box_distance;
mod convex_cast;
mod sphere_sphere_penetration;
mod voronoi_simplex;
