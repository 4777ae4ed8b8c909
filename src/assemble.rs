use crate::boundary_layer::BoundaryLayerSchedule;
use crate::domain::Domain;
use crate::errors::{GeometryError, Result};
use crate::geometry::contour::Contour;
use crate::geometry::distances2::dist;
use crate::geometry::polygon2::{aabbs_overlap, loops_cross, point_in_loop};
use crate::session::{KernelSession, Tag};
use crate::structured::{Distribution, EdgePlan, GridPlan};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// How many points on each surface belong to the nose region when a profile
/// is split into front / upper-back / lower-back splines.
const FRONT_SPLIT_POINTS: usize = 10;

/// Point density multiplier for the transfinite refinement of the nose
/// spline, relative to the wall mesh size.
const FRONT_REFINEMENT: f64 = 3.5;
const FRONT_BUMP: f64 = 10.0;

/// A wall contour to subtract from the domain, with the name its physical
/// group will carry. The contour supplies both the vertex loop and the wall
/// mesh size.
pub struct Hole<'a> {
    pub name: &'a str,
    pub contour: &'a Contour,
}

/// A named boundary-condition tag over a set of kernel entities, created
/// once after the kernel has synchronized and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct PhysicalGroup {
    pub dim: u8,
    pub name: String,
    pub entities: Vec<Tag>,
}

/// The finished planar model: every surface registered with the kernel and
/// the physical groups the meshing engine will export.
#[derive(Debug, Serialize)]
pub struct TaggedModel {
    pub surfaces: Vec<Tag>,
    pub groups: Vec<PhysicalGroup>,
}

/// Curves the kernel holds for one wall contour.
struct HoleCurves {
    te_tag: Tag,
    wall_curves: Vec<Tag>,
    loop_tag: Tag,
    front_arc_length: f64,
    /// Only present when the profile was split for a C-type topology or a
    /// boundary layer: (front, upper_back, lower_back, le_upper, le_lower)
    split: Option<SplitCurves>,
}

struct SplitCurves {
    front: Tag,
    upper_back: Tag,
    lower_back: Tag,
    le_upper: Tag,
    le_lower: Tag,
}

/// Composes the outer boundary, hole contours, and the planned refinement
/// schedules into one tagged model inside the caller's kernel session.
///
/// Entity creation follows the fixed order the kernel requires: hole
/// profiles, outer boundary, surfaces, refinement fields, one synchronize,
/// then tagging. The session is only borrowed; its lifetime is the caller's
/// concern.
pub fn assemble(
    session: &mut dyn KernelSession,
    domain: &Domain,
    holes: &[Hole],
    bl: Option<&BoundaryLayerSchedule>,
    grid: Option<&GridPlan>,
) -> Result<TaggedModel> {
    check_hole_layout(domain, holes)?;

    if domain.is_structured() && grid.is_none() {
        return Err(GeometryError::MissingGridPlan.into());
    }

    if let Some(plan) = grid {
        if holes.len() != 1 {
            return Err(GeometryError::StructuredHoleCount(holes.len()).into());
        }
        return assemble_c_type(session, domain, &holes[0], plan);
    }

    let split_front = bl.is_some();
    let mut hole_curves = Vec::with_capacity(holes.len());
    for hole in holes {
        hole_curves.push(build_hole_curves(session, hole, split_front)?);
    }

    let outer = build_outer_boundary(session, domain)?;

    let mut surface_loops = vec![outer.loop_tag];
    surface_loops.extend(hole_curves.iter().map(|h| h.loop_tag));
    let surface = session.add_plane_surface(&surface_loops)?;

    if let Some(schedule) = bl {
        let mut wall: Vec<Tag> = Vec::new();
        let mut fans: Vec<Tag> = Vec::new();
        for hc in &hole_curves {
            wall.extend(&hc.wall_curves);
            fans.push(hc.te_tag);
        }
        session.add_boundary_layer(&wall, schedule, &fans)?;

        // Refine the nose spline, where the wall spacing alone leaves the
        // high-curvature region under-resolved
        for (hole, hc) in holes.iter().zip(&hole_curves) {
            if let Some(split) = &hc.split {
                let count =
                    (FRONT_REFINEMENT * hc.front_arc_length / hole.contour.mesh_size()) as u32;
                session.set_transfinite_curve(
                    split.front,
                    count.max(3),
                    Distribution::Bump(FRONT_BUMP),
                )?;
            }
        }
    }

    session.synchronize()?;

    let mut groups = Vec::new();
    for (hole, hc) in holes.iter().zip(&hole_curves) {
        groups.push(tag_group(session, 1, &hc.wall_curves, hole.name)?);
    }
    for (name, entities) in &outer.boundary_groups {
        groups.push(tag_group(session, 1, entities, name)?);
    }
    groups.push(tag_group(session, 2, &[surface], "fluid")?);

    Ok(TaggedModel {
        surfaces: vec![surface],
        groups,
    })
}

/// Re-checks the invariants enforced upstream as a final guard: holes must
/// be pairwise disjoint and strictly inside the outer boundary.
fn check_hole_layout(domain: &Domain, holes: &[Hole]) -> Result<()> {
    for i in 0..holes.len() {
        for j in (i + 1)..holes.len() {
            let a = holes[i].contour.points();
            let b = holes[j].contour.points();
            if aabbs_overlap(&holes[i].contour.aabb(), &holes[j].contour.aabb())
                && (loops_cross(a, b)
                    || b.iter().any(|p| point_in_loop(a, p))
                    || a.iter().any(|p| point_in_loop(b, p)))
            {
                return Err(GeometryError::OverlappingHoles.into());
            }
        }
    }

    let contours: Vec<&Contour> = holes.iter().map(|h| h.contour).collect();
    domain.validate_holes(&contours)
}

fn tag_group(
    session: &mut dyn KernelSession,
    dim: u8,
    entities: &[Tag],
    name: &str,
) -> Result<PhysicalGroup> {
    session.add_physical_group(dim, entities, name)?;
    Ok(PhysicalGroup {
        dim,
        name: name.to_string(),
        entities: entities.to_vec(),
    })
}

/// Registers the points of a canonical profile and fits its surface splines.
/// Without a front split the skin is one upper and one lower spline meeting
/// at the leading and trailing edges; with it the nose region becomes its
/// own spline so it can carry a refinement schedule.
fn build_hole_curves(
    session: &mut dyn KernelSession,
    hole: &Hole,
    split_front: bool,
) -> Result<HoleCurves> {
    let pts = hole.contour.points();
    let tags: Vec<Tag> = pts
        .iter()
        .map(|p| session.add_point(p.x, p.y, hole.contour.mesh_size()))
        .collect::<Result<_>>()?;

    // Canonical order puts the trailing edge first and the leading edge at
    // the minimum-x vertex
    let le = pts
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.x.partial_cmp(&b.x).unwrap())
        .map(|(i, _)| i)
        .unwrap();

    let k = FRONT_SPLIT_POINTS
        .min(le.saturating_sub(1))
        .min((pts.len() - le).saturating_sub(2));
    if !split_front || k == 0 {
        let upper: Vec<Tag> = tags[0..=le].to_vec();
        let mut lower: Vec<Tag> = tags[le..].to_vec();
        lower.push(tags[0]);

        let upper_tag = session.add_spline(&upper)?;
        let lower_tag = session.add_spline(&lower)?;
        let loop_tag = session.add_curve_loop(&[upper_tag, lower_tag])?;

        return Ok(HoleCurves {
            te_tag: tags[0],
            wall_curves: vec![upper_tag, lower_tag],
            loop_tag,
            front_arc_length: 0.0,
            split: None,
        });
    }

    // Upper surface runs from index 0 (trailing edge) to le, lower from le
    // onward; the front spline spans k points to either side of the nose
    let upper_back: Vec<Tag> = tags[0..=le - k].to_vec();
    let front: Vec<Tag> = (le - k..=le + k).rev().map(|i| tags[i]).collect();
    let mut lower_back: Vec<Tag> = tags[le + k..].to_vec();
    lower_back.push(tags[0]);

    let front_arc_length = dist(&pts[le - k], &pts[le]) + dist(&pts[le], &pts[le + k]);

    let upper_tag = session.add_spline(&upper_back)?;
    let front_tag = session.add_spline(&front)?;
    let lower_tag = session.add_spline(&lower_back)?;
    // The front spline runs lower-to-upper, reverse it inside the loop
    let loop_tag = session.add_curve_loop(&[upper_tag, -front_tag, lower_tag])?;

    Ok(HoleCurves {
        te_tag: tags[0],
        wall_curves: vec![upper_tag, front_tag, lower_tag],
        loop_tag,
        front_arc_length,
        split: Some(SplitCurves {
            front: front_tag,
            upper_back: upper_tag,
            lower_back: lower_tag,
            le_upper: tags[le - k],
            le_lower: tags[le + k],
        }),
    })
}

struct OuterBoundary {
    loop_tag: Tag,
    boundary_groups: Vec<(&'static str, Vec<Tag>)>,
}

fn build_outer_boundary(session: &mut dyn KernelSession, domain: &Domain) -> Result<OuterBoundary> {
    match domain {
        Domain::Circle {
            center,
            radius,
            mesh_size,
        } => {
            // Build the circle from arc segments sized to the target mesh
            // resolution, as the kernel meshes arcs by their endpoints
            let segments = ((2.0 * std::f64::consts::PI * radius / mesh_size) as usize).max(4);
            let center_tag = session.add_point(center.x, center.y, *mesh_size)?;
            let rim: Vec<Tag> = (0..segments)
                .map(|i| {
                    let theta = 2.0 * std::f64::consts::PI * i as f64 / segments as f64;
                    session.add_point(
                        center.x + radius * theta.cos(),
                        center.y + radius * theta.sin(),
                        *mesh_size,
                    )
                })
                .collect::<Result<_>>()?;

            let arcs: Vec<Tag> = (0..segments)
                .map(|i| session.add_circle_arc(rim[i], center_tag, rim[(i + 1) % segments]))
                .collect::<Result<_>>()?;

            let loop_tag = session.add_curve_loop(&arcs)?;
            Ok(OuterBoundary {
                loop_tag,
                boundary_groups: vec![("farfield", arcs)],
            })
        }
        Domain::Rectangle {
            center,
            length,
            width,
            mesh_size,
        } => {
            let (hx, hy) = (length / 2.0, width / 2.0);
            let corners = [
                (center.x - hx, center.y - hy),
                (center.x + hx, center.y - hy),
                (center.x + hx, center.y + hy),
                (center.x - hx, center.y + hy),
            ];
            let tags: Vec<Tag> = corners
                .iter()
                .map(|(x, y)| session.add_point(*x, *y, *mesh_size))
                .collect::<Result<_>>()?;

            let bottom = session.add_line(tags[0], tags[1])?;
            let right = session.add_line(tags[1], tags[2])?;
            let top = session.add_line(tags[2], tags[3])?;
            let left = session.add_line(tags[3], tags[0])?;

            let loop_tag = session.add_curve_loop(&[bottom, right, top, left])?;
            Ok(OuterBoundary {
                loop_tag,
                boundary_groups: vec![
                    ("inlet", vec![left]),
                    ("outlet", vec![right]),
                    ("symmetry", vec![bottom, top]),
                ],
            })
        }
        Domain::CTypeStructured { .. } => unreachable!("structured domains assemble as blocks"),
    }
}

/// Builds the five-block C-type topology: a rounded leading block wrapped
/// around the nose, one block over each surface, and two wake blocks behind
/// the trailing edge, every block transfinite and recombined into quads.
fn assemble_c_type(
    session: &mut dyn KernelSession,
    domain: &Domain,
    hole: &Hole,
    plan: &GridPlan,
) -> Result<TaggedModel> {
    let Domain::CTypeStructured {
        leading_offset,
        wake_length,
        height,
        mesh_size,
    } = domain
    else {
        return Err(GeometryError::StructuredDomainMismatch.into());
    };

    let hc = build_hole_curves(session, hole, true)?;
    // The split only degenerates when the profile has too few points to
    // carve a nose region out of
    let split = hc
        .split
        .as_ref()
        .ok_or(GeometryError::NotEnoughPoints(hole.contour.points().len()))?;

    // Canonical order puts the trailing edge first; the leading edge is the
    // minimum-x vertex
    let pts = hole.contour.points();
    let te = pts[0];
    let le = pts
        .iter()
        .min_by(|a, b| a.x.partial_cmp(&b.x).unwrap())
        .copied()
        .unwrap_or(te);
    let lead_x = le.x - leading_offset;
    let out_x = te.x + wake_length;
    let hy = height / 2.0;

    let pt = |session: &mut dyn KernelSession, x: f64, y: f64| session.add_point(x, y, *mesh_size);
    let arc_center = pt(session, 0.0, 0.0)?;
    let p1 = pt(session, lead_x, hy)?;
    let p2 = pt(session, te.x, hy)?;
    let p3 = pt(session, out_x, hy)?;
    let p4 = pt(session, out_x, te.y)?;
    let p5 = pt(session, out_x, -hy)?;
    let p6 = pt(session, te.x, -hy)?;
    let p7 = pt(session, lead_x, -hy)?;

    let l0 = session.add_line(split.le_upper, p1)?;
    let l1 = session.add_line(p1, p2)?;
    let l2 = session.add_line(p2, p3)?;
    let l3 = session.add_line(p3, p4)?;
    let l4 = session.add_line(p4, p5)?;
    let l5 = session.add_line(p5, p6)?;
    let l6 = session.add_line(p6, p7)?;
    let l7 = session.add_line(p7, split.le_lower)?;
    let l8 = session.add_line(hc.te_tag, p2)?;
    let l9 = session.add_line(hc.te_tag, p6)?;
    let l10 = session.add_line(p4, hc.te_tag)?;
    let arc = session.add_circle_arc(p7, arc_center, p1)?;

    // Subdivision schedules from the grid plan; edges whose parameterization
    // runs toward the wall get the reciprocal progression
    let [leading, upper, wake_upper, _, _] = plan_blocks(plan)?;
    let normal = leading.edges[1];
    let front_edge = leading.edges[0];
    let surf_edge = upper.edges[0];
    let wake_edge = wake_upper.edges[0];

    let tf = |session: &mut dyn KernelSession, tag: Tag, edge: EdgePlan, invert: bool| {
        let dist = match edge.distribution {
            Distribution::Progression(r) if invert => Distribution::Progression(1.0 / r),
            other => other,
        };
        session.set_transfinite_curve(tag, edge.count, dist)
    };

    tf(session, l7, normal, true)?;
    tf(session, l0, normal, false)?;
    tf(session, l8, normal, false)?;
    tf(session, l9, normal, false)?;
    tf(session, l3, normal, true)?;
    tf(session, l4, normal, false)?;

    tf(session, l2, wake_edge, true)?;
    tf(session, l10, wake_edge, false)?;
    tf(session, l5, wake_edge, false)?;

    tf(session, l1, EdgePlan::new(surf_edge.count, Distribution::Uniform), false)?;
    tf(session, l6, EdgePlan::new(surf_edge.count, Distribution::Uniform), false)?;
    tf(session, split.upper_back, surf_edge, false)?;
    tf(session, split.lower_back, surf_edge, false)?;

    tf(session, split.front, front_edge, false)?;
    tf(session, arc, front_edge, false)?;

    // Each loop walks its corners in order; the surface splines already run
    // trailing edge to nose on the upper side and nose to trailing edge on
    // the lower side, so they enter their loops unreversed
    let block_loops = [
        vec![l7, split.front, l0, -arc],
        vec![l0, l1, -l8, split.upper_back],
        vec![l8, l2, l3, l10],
        vec![-l9, -l10, l4, l5],
        vec![l7, split.lower_back, l9, l6],
    ];

    let mut surfaces = Vec::with_capacity(block_loops.len());
    for curves in &block_loops {
        let loop_tag = session.add_curve_loop(curves)?;
        let surface = session.add_plane_surface(&[loop_tag])?;
        session.set_transfinite_surface(surface)?;
        session.recombine_surface(surface)?;
        surfaces.push(surface);
    }

    session.synchronize()?;

    let groups = vec![
        tag_group(session, 1, &hc.wall_curves, hole.name)?,
        tag_group(session, 1, &[arc], "inlet")?,
        tag_group(session, 1, &[l3, l4], "outlet")?,
        tag_group(session, 1, &[l1, l2, l5, l6], "symmetry")?,
        tag_group(session, 2, &surfaces, "fluid")?,
    ];

    Ok(TaggedModel { surfaces, groups })
}

fn plan_blocks(plan: &GridPlan) -> Result<[&crate::structured::BlockPlan; 5]> {
    let b: Vec<&crate::structured::BlockPlan> = plan.blocks.iter().collect();
    if b.len() != 5 {
        return Err(GeometryError::WrongBlockCount(b.len()).into());
    }
    Ok([b[0], b[1], b[2], b[3], b[4]])
}

/// Output file name for the generated mesh, suffixed `_flap` when the model
/// carries one.
pub fn mesh_file_name(output: &Path, airfoil_name: &str, has_flap: bool, format: &str) -> PathBuf {
    let name = airfoil_name.trim_end_matches(".dat");
    if has_flap {
        output.join(format!("mesh_airfoil_{}_flap.{}", name, format))
    } else {
        output.join(format!("mesh_airfoil_{}.{}", name, format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary_layer::BoundaryLayerSpec;
    use crate::profile::{Naca4Digit, ProfileGenerator};
    use crate::session::RecordingSession;
    use crate::structured::{plan_c_type, CTypeDimensions};
    use ncollide2d::na::Point2;

    fn unit_airfoil() -> Contour {
        let cloud = Naca4Digit::from_code("0012").unwrap().generate(100).unwrap();
        Contour::from_points(cloud.points(), 0.01, 1e-9).unwrap()
    }

    fn small_flap(airfoil: &Contour) -> Vec<Point2<f64>> {
        airfoil
            .points()
            .iter()
            .map(|p| Point2::new(p.x * 0.3 + 1.05, p.y * 0.3))
            .collect()
    }

    fn group_names(model: &TaggedModel) -> Vec<&str> {
        model.groups.iter().map(|g| g.name.as_str()).collect()
    }

    #[test]
    fn test_assemble_circle_with_boundary_layer() {
        let airfoil = unit_airfoil();
        let domain = Domain::circle(Point2::new(0.5, 0.0), 10.0, 0.2).unwrap();
        let schedule = BoundaryLayerSpec::new(3e-5, 1.2, 35).plan(9.0, 0.01).unwrap();

        let mut session = RecordingSession::new();
        let holes = [Hole {
            name: "airfoil",
            contour: &airfoil,
        }];
        let model = assemble(&mut session, &domain, &holes, Some(&schedule), None).unwrap();

        assert_eq!(1, model.surfaces.len());
        assert_eq!(vec!["airfoil", "farfield", "fluid"], group_names(&model));
        assert_eq!(1, session.boundary_layers.len());
        assert_eq!(35, session.boundary_layers[0].1);
        // Nose spline got its bump refinement
        assert!(!session.transfinite_curves.is_empty());
    }

    #[test]
    fn test_assemble_rectangle_without_boundary_layer() {
        let airfoil = unit_airfoil();
        let domain = Domain::rectangle(Point2::new(0.5, 0.0), 12.0, 4.0, 0.2).unwrap();

        let mut session = RecordingSession::new();
        let holes = [Hole {
            name: "airfoil",
            contour: &airfoil,
        }];
        let model = assemble(&mut session, &domain, &holes, None, None).unwrap();

        assert_eq!(
            vec!["airfoil", "inlet", "outlet", "symmetry", "fluid"],
            group_names(&model)
        );
        assert!(session.boundary_layers.is_empty());
    }

    #[test]
    fn test_assemble_with_flap() {
        let airfoil = unit_airfoil();
        let flap_points = small_flap(&airfoil);
        let flap = Contour::from_points(&flap_points, 0.01, 1e-9).unwrap();

        let domain = Domain::rectangle(Point2::new(0.5, 0.0), 12.0, 4.0, 0.2).unwrap();
        let mut session = RecordingSession::new();
        let holes = [
            Hole {
                name: "airfoil",
                contour: &airfoil,
            },
            Hole {
                name: "flap",
                contour: &flap,
            },
        ];
        let model = assemble(&mut session, &domain, &holes, None, None).unwrap();

        let names = group_names(&model);
        assert!(names.contains(&"airfoil"));
        assert!(names.contains(&"flap"));
    }

    #[test]
    fn test_assemble_rejects_overlapping_holes() {
        let airfoil = unit_airfoil();
        let shifted: Vec<Point2<f64>> = airfoil
            .points()
            .iter()
            .map(|p| Point2::new(p.x + 0.3, p.y))
            .collect();
        let overlap = Contour::from_points(&shifted, 0.01, 1e-9).unwrap();

        let domain = Domain::rectangle(Point2::new(0.5, 0.0), 12.0, 4.0, 0.2).unwrap();
        let mut session = RecordingSession::new();
        let holes = [
            Hole {
                name: "airfoil",
                contour: &airfoil,
            },
            Hole {
                name: "flap",
                contour: &overlap,
            },
        ];
        let result = assemble(&mut session, &domain, &holes, None, None);
        assert!(matches!(
            result,
            Err(crate::errors::Error::Geometry(
                GeometryError::OverlappingHoles
            ))
        ));
    }

    #[test]
    fn test_assemble_rejects_escaping_hole() {
        let airfoil = unit_airfoil();
        let domain = Domain::rectangle(Point2::new(0.5, 0.0), 0.5, 4.0, 0.2).unwrap();
        let mut session = RecordingSession::new();
        let holes = [Hole {
            name: "airfoil",
            contour: &airfoil,
        }];
        assert!(assemble(&mut session, &domain, &holes, None, None).is_err());
    }

    #[test]
    fn test_assemble_c_type_blocks() {
        let airfoil = unit_airfoil();
        let dims = CTypeDimensions::parse("2x10x10").unwrap();
        let domain = Domain::c_type(2.0, 10.0, 10.0, 0.2).unwrap();
        let plan = plan_c_type(&dims, 0.2, 3e-5).unwrap();

        let mut session = RecordingSession::new();
        let holes = [Hole {
            name: "airfoil",
            contour: &airfoil,
        }];
        let model = assemble(&mut session, &domain, &holes, None, Some(&plan)).unwrap();

        assert_eq!(5, model.surfaces.len());
        assert_eq!(5, session.transfinite_surfaces.len());
        assert_eq!(5, session.recombined.len());
        let names = group_names(&model);
        assert_eq!(vec!["airfoil", "inlet", "outlet", "symmetry", "fluid"], names);
    }

    #[test]
    fn test_structured_rejects_flap() {
        let airfoil = unit_airfoil();
        let flap_points = small_flap(&airfoil);
        let flap = Contour::from_points(&flap_points, 0.01, 1e-9).unwrap();

        let dims = CTypeDimensions::parse("2x10x10").unwrap();
        let domain = Domain::c_type(2.0, 10.0, 10.0, 0.2).unwrap();
        let plan = plan_c_type(&dims, 0.2, 3e-5).unwrap();

        let mut session = RecordingSession::new();
        let holes = [
            Hole {
                name: "airfoil",
                contour: &airfoil,
            },
            Hole {
                name: "flap",
                contour: &flap,
            },
        ];
        let result = assemble(&mut session, &domain, &holes, None, Some(&plan));
        assert!(matches!(
            result,
            Err(crate::errors::Error::Geometry(
                GeometryError::StructuredHoleCount(2)
            ))
        ));
    }

    #[test]
    fn test_c_type_domain_requires_plan() {
        let airfoil = unit_airfoil();
        let domain = Domain::c_type(2.0, 10.0, 10.0, 0.2).unwrap();
        let mut session = RecordingSession::new();
        let holes = [Hole {
            name: "airfoil",
            contour: &airfoil,
        }];
        let result = assemble(&mut session, &domain, &holes, None, None);
        assert!(matches!(
            result,
            Err(crate::errors::Error::Geometry(
                GeometryError::MissingGridPlan
            ))
        ));
    }

    #[test]
    fn test_mesh_file_name() {
        let path = mesh_file_name(Path::new("out"), "naca0012", false, "su2");
        assert_eq!(Path::new("out/mesh_airfoil_naca0012.su2"), path);

        let path = mesh_file_name(Path::new("."), "e342.dat", true, "msh");
        assert_eq!(Path::new("./mesh_airfoil_e342_flap.msh"), path);
    }
}
