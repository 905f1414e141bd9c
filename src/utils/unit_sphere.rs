use arrayvec::ArrayVec;

use crate::math::{Real, Vector};

/// The number of directions returned by [`unit_sphere_directions`].
pub const NUM_UNIT_SPHERE_POINTS: usize = 42;

/// A quasi-uniform sampling of the unit sphere.
///
/// The directions are the 12 vertices of a regular icosahedron followed by
/// the normalized midpoints of its 30 edges. The ordering is deterministic.
pub fn unit_sphere_directions() -> ArrayVec<Vector<Real>, NUM_UNIT_SPHERE_POINTS> {
    let phi: Real = (1.0 + (5.0 as Real).sqrt()) * 0.5;
    let mut vertices = ArrayVec::<Vector<Real>, 12>::new();

    for s1 in [-1.0, 1.0] {
        for s2 in [-phi, phi] {
            vertices.push(Vector::new(0.0, s1, s2));
            vertices.push(Vector::new(s1, s2, 0.0));
            vertices.push(Vector::new(s2, 0.0, s1));
        }
    }

    let mut result = ArrayVec::new();
    result.extend(vertices.iter().map(|v| v.normalize()));

    // Two icosahedron vertices are joined by an edge iff their distance is 2.
    for i in 0..vertices.len() {
        for j in i + 1..vertices.len() {
            if ((vertices[i] - vertices[j]).norm_squared() - 4.0).abs() < 1.0e-3 {
                result.push((vertices[i] + vertices[j]).normalize());
            }
        }
    }

    debug_assert_eq!(result.len(), NUM_UNIT_SPHERE_POINTS);
    result
}

#[cfg(test)]
mod test {
    use super::{unit_sphere_directions, NUM_UNIT_SPHERE_POINTS};

    #[test]
    fn unit_sphere_sampling_is_complete_and_normalized() {
        let dirs = unit_sphere_directions();
        assert_eq!(dirs.len(), NUM_UNIT_SPHERE_POINTS);
        for d in &dirs {
            assert_relative_eq!(d.norm(), 1.0, epsilon = 1.0e-5);
        }

        // Every direction is within ~37 degrees of a sample.
        for axis in [na::Vector3::x(), na::Vector3::new(1.0, 1.0, 1.0).normalize()] {
            let best = dirs.iter().map(|d| d.dot(&axis)).fold(-1.0, |a: crate::math::Real, b| a.max(b));
            assert!(best > 0.79);
        }
    }
}
