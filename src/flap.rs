use crate::errors::{GeometryError, Result};
use crate::geometry::polygon2::{aabbs_overlap, aabb_of_points, loops_cross, point_in_loop};
use crate::profile::PointCloud;
use ncollide2d::na::Point2;

/// Positions a flap profile relative to the main profile by deflecting it
/// about a hinge point, then verifies the two loops stay disjoint. Positive
/// deflection follows the trailing-edge-down convention, so the cloud is
/// rotated clockwise. A zero deflection is an exact identity.
///
/// Interference between the deflected flap and the main profile is fatal:
/// this tool reports it rather than trying to resolve it.
pub fn attach_flap(
    main: &PointCloud,
    flap: &PointCloud,
    hinge_point: &Point2<f64>,
    deflection_angle: f64,
) -> Result<(PointCloud, PointCloud)> {
    let deflected = if deflection_angle == 0.0 {
        flap.clone()
    } else {
        flap.rotated(-deflection_angle, hinge_point)
    };

    check_disjoint(main, &deflected)?;
    Ok((main.clone(), deflected))
}

/// Coarse-to-fine overlap test between two closed loops: bounding boxes
/// first, then vertex containment both ways, then edge crossings.
pub fn check_disjoint(main: &PointCloud, flap: &PointCloud) -> Result<()> {
    let main_box = aabb_of_points(main.points());
    let flap_box = aabb_of_points(flap.points());
    if !aabbs_overlap(&main_box, &flap_box) {
        return Ok(());
    }

    let contained = flap
        .points()
        .iter()
        .any(|p| point_in_loop(main.points(), p))
        || main
            .points()
            .iter()
            .any(|p| point_in_loop(flap.points(), p));

    if contained || loops_cross(main.points(), flap.points()) {
        return Err(GeometryError::FlapInterference.into());
    }

    Ok(())
}
