use crate::math::{Real, Vector};

/// Computes two unit vectors forming, together with the unit vector `n`, a
/// right-handed orthonormal basis.
pub fn plane_space(n: &Vector<Real>) -> (Vector<Real>, Vector<Real>) {
    const SQRT12: Real = 0.707_106_77;

    if n.z.abs() > SQRT12 {
        // Choose p in the y-z plane.
        let a = n.y * n.y + n.z * n.z;
        let k = 1.0 / a.sqrt();
        let p = Vector::new(0.0, -n.z * k, n.y * k);
        let q = Vector::new(a * k, -n.x * p.z, n.x * p.y);
        (p, q)
    } else {
        // Choose p in the x-y plane.
        let a = n.x * n.x + n.y * n.y;
        let k = 1.0 / a.sqrt();
        let p = Vector::new(-n.y * k, n.x * k, 0.0);
        let q = Vector::new(-n.z * p.y, n.z * p.x, a * k);
        (p, q)
    }
}

#[cfg(test)]
mod test {
    use super::plane_space;
    use crate::math::Vector;

    #[test]
    fn plane_space_is_orthonormal() {
        for n in [
            Vector::x(),
            Vector::z(),
            Vector::new(1.0, 2.0, 3.0).normalize(),
            Vector::new(-0.2, 0.1, -0.9).normalize(),
        ] {
            let (p, q) = plane_space(&n);
            assert_relative_eq!(p.norm(), 1.0, epsilon = 1.0e-5);
            assert_relative_eq!(q.norm(), 1.0, epsilon = 1.0e-5);
            assert_relative_eq!(p.dot(&n), 0.0, epsilon = 1.0e-5);
            assert_relative_eq!(q.dot(&n), 0.0, epsilon = 1.0e-5);
            assert_relative_eq!(p.dot(&q), 0.0, epsilon = 1.0e-5);
            assert_relative_eq!(p.cross(&q), n, epsilon = 1.0e-5);
        }
    }
}
