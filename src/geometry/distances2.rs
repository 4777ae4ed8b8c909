use ncollide2d::na::{Point2, RealField, Vector2};

/// Return the distance between two 2D points
pub fn dist<N: RealField + Copy>(a: &Point2<N>, b: &Point2<N>) -> N {
    (a - b).norm()
}

pub fn mid_point<N: RealField + Copy>(a: &Point2<N>, b: &Point2<N>) -> Point2<N> {
    Point2::from((a.coords + b.coords) * N::from_f64(0.5).unwrap())
}

pub fn signed_angle<N: RealField + Copy>(v1: &Vector2<N>, v2: &Vector2<N>) -> N {
    (v1.x * v2.y - v1.y * v2.x).atan2(v1.x * v2.x + v1.y * v2.y)
}

/// Distance of a test point from the segment between two anchor points, used
/// to decide whether a midpoint sample is already represented by its
/// neighbors.
pub fn deviation(a: &Point2<f64>, b: &Point2<f64>, test: &Point2<f64>) -> f64 {
    let ab = b - a;
    let l2 = ab.norm_squared();
    if l2 < f64::EPSILON {
        return dist(a, test);
    }

    let t = ((test - a).dot(&ab) / l2).clamp(0.0, 1.0);
    dist(&(a + ab * t), test)
}
