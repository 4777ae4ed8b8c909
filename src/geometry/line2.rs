use ncollide2d::na::{Point2, Vector2};
use ncollide2d::query::Ray;

/// Common interface for entities which act as a parameterized 2D line.
pub trait Line2 {
    fn origin(&self) -> Point2<f64>;
    fn dir(&self) -> Vector2<f64>;
    fn at(&self, t: f64) -> Point2<f64>;
}

impl Line2 for Ray<f64> {
    fn origin(&self) -> Point2<f64> {
        self.origin
    }

    fn dir(&self) -> Vector2<f64> {
        self.dir
    }

    fn at(&self, t: f64) -> Point2<f64> {
        self.point_at(t)
    }
}

/// Computes the intersection parameters (t0, t1) between two rays such that
/// r0.at(t0) == r1.at(t1), or None if the rays are parallel.
pub fn intersect_rays(r0: &Ray<f64>, r1: &Ray<f64>) -> Option<(f64, f64)> {
    let det = r1.dir.x * r0.dir.y - r1.dir.y * r0.dir.x;
    if det.abs() < f64::EPSILON {
        return None;
    }

    let dx = r1.origin.x - r0.origin.x;
    let dy = r1.origin.y - r0.origin.y;

    Some(((dy * r1.dir.x - dx * r1.dir.y) / det, (dy * r0.dir.x - dx * r0.dir.y) / det))
}

/// Intersection test between two finite segments, endpoints inclusive.
pub fn segments_cross(a0: &Point2<f64>, a1: &Point2<f64>, b0: &Point2<f64>, b1: &Point2<f64>) -> bool {
    let ra = Ray::new(*a0, a1 - a0);
    let rb = Ray::new(*b0, b1 - b0);
    if let Some((t0, t1)) = intersect_rays(&ra, &rb) {
        (0.0..=1.0).contains(&t0) && (0.0..=1.0).contains(&t1)
    } else {
        false
    }
}
