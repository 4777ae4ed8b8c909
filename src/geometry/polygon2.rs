use crate::geometry::line2::segments_cross;
use itertools::Itertools;
use ncollide2d::bounding_volume::{BoundingVolume, AABB};
use ncollide2d::na::Point2;

/// Shoelace area of a loop given without a repeated closing point. Positive
/// for counter-clockwise winding.
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    let mut sum = 0.0;
    for i in 0..points.len() {
        let a = &points[i];
        let b = &points[(i + 1) % points.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Even-odd containment test of a point against a closed loop.
pub fn point_in_loop(points: &[Point2<f64>], p: &Point2<f64>) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (pi, pj) = (&points[i], &points[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = pi.x + (p.y - pi.y) * (pj.x - pi.x) / (pj.y - pi.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Edge-against-edge crossing test between two closed loops. Naive pairwise
/// sweep, the loops involved stay in the hundreds of vertices.
pub fn loops_cross(a: &[Point2<f64>], b: &[Point2<f64>]) -> bool {
    for i in 0..a.len() {
        let (a0, a1) = (&a[i], &a[(i + 1) % a.len()]);
        for j in 0..b.len() {
            let (b0, b1) = (&b[j], &b[(j + 1) % b.len()]);
            if segments_cross(a0, a1, b0, b1) {
                return true;
            }
        }
    }
    false
}

pub fn aabb_of_points(points: &[Point2<f64>]) -> AABB<f64> {
    let (min_x, max_x) = points
        .iter()
        .map(|p| p.x)
        .minmax_by(|a, b| a.partial_cmp(b).unwrap())
        .into_option()
        .unwrap();
    let (min_y, max_y) = points
        .iter()
        .map(|p| p.y)
        .minmax_by(|a, b| a.partial_cmp(b).unwrap())
        .into_option()
        .unwrap();
    AABB::new(Point2::new(min_x, min_y), Point2::new(max_x, max_y))
}

pub fn aabbs_overlap(a: &AABB<f64>, b: &AABB<f64>) -> bool {
    a.intersects(b)
}

/// Farthest distance of any loop vertex from a reference point.
pub fn bounding_radius(points: &[Point2<f64>], center: &Point2<f64>) -> f64 {
    points
        .iter()
        .map(|p| (p - center).norm())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_case::test_case;

    fn unit_square() -> Vec<Point2<f64>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn test_signed_area_ccw() {
        assert_relative_eq!(1.0, signed_area(&unit_square()), epsilon = 1e-10);
    }

    #[test]
    fn test_signed_area_cw() {
        let mut pts = unit_square();
        pts.reverse();
        assert_relative_eq!(-1.0, signed_area(&pts), epsilon = 1e-10);
    }

    #[test_case((0.5, 0.5), true; "inside")]
    #[test_case((1.5, 0.5), false; "outside_right")]
    #[test_case((-0.5, 0.5), false; "outside_left")]
    #[test_case((0.5, -0.5), false; "outside_below")]
    fn test_point_in_loop(p: (f64, f64), e: bool) {
        assert_eq!(e, point_in_loop(&unit_square(), &Point2::new(p.0, p.1)));
    }

    #[test]
    fn test_loops_cross_detects_overlap() {
        let a = unit_square();
        let b: Vec<Point2<f64>> = unit_square()
            .iter()
            .map(|p| Point2::new(p.x + 0.5, p.y + 0.5))
            .collect();
        assert!(loops_cross(&a, &b));
    }

    #[test]
    fn test_loops_cross_disjoint() {
        let a = unit_square();
        let b: Vec<Point2<f64>> = unit_square()
            .iter()
            .map(|p| Point2::new(p.x + 5.0, p.y))
            .collect();
        assert!(!loops_cross(&a, &b));
    }

    #[test]
    fn test_bounding_radius() {
        let r = bounding_radius(&unit_square(), &Point2::new(0.0, 0.0));
        assert_relative_eq!(2.0_f64.sqrt(), r, epsilon = 1e-10);
    }

    #[test]
    fn test_aabb_of_points() {
        let b = aabb_of_points(&unit_square());
        assert_relative_eq!(0.0, b.mins.x, epsilon = 1e-10);
        assert_relative_eq!(1.0, b.maxs.y, epsilon = 1e-10);
    }
}
