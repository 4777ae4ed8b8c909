use crate::errors::{GeometryError, Result, ValidationError};
use crate::geometry::contour::Contour;
use crate::geometry::polygon2::bounding_radius;
use ncollide2d::bounding_volume::{BoundingVolume, AABB};
use ncollide2d::na::Point2;

fn positive(name: &'static str, value: f64) -> Result<f64> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::NonPositiveDomainExtent { name, value }.into())
    }
}

/// The outer far-field boundary, chosen once at startup and immutable
/// afterwards. Each variant knows how far its boundary stays from a set of
/// hole contours, which is the clearance budget available to the boundary
/// layer planner.
pub enum Domain {
    /// Circular far-field of a given radius.
    Circle {
        center: Point2<f64>,
        radius: f64,
        mesh_size: f64,
    },

    /// Axis-aligned rectangular box.
    Rectangle {
        center: Point2<f64>,
        length: f64,
        width: f64,
        mesh_size: f64,
    },

    /// C-shaped structured far-field: a rounded leading region ahead of the
    /// airfoil joined to a rectangular wake block downstream, so the whole
    /// domain decomposes into transfinite quad blocks.
    CTypeStructured {
        leading_offset: f64,
        wake_length: f64,
        height: f64,
        mesh_size: f64,
    },
}

impl Domain {
    pub fn circle(center: Point2<f64>, radius: f64, mesh_size: f64) -> Result<Domain> {
        Ok(Domain::Circle {
            center,
            radius: positive("radius", radius)?,
            mesh_size: positive("mesh size", mesh_size)?,
        })
    }

    pub fn rectangle(
        center: Point2<f64>,
        length: f64,
        width: f64,
        mesh_size: f64,
    ) -> Result<Domain> {
        Ok(Domain::Rectangle {
            center,
            length: positive("length", length)?,
            width: positive("width", width)?,
            mesh_size: positive("mesh size", mesh_size)?,
        })
    }

    pub fn c_type(
        leading_offset: f64,
        wake_length: f64,
        height: f64,
        mesh_size: f64,
    ) -> Result<Domain> {
        Ok(Domain::CTypeStructured {
            leading_offset: positive("leading offset", leading_offset)?,
            wake_length: positive("wake length", wake_length)?,
            height: positive("height", height)?,
            mesh_size: positive("mesh size", mesh_size)?,
        })
    }

    pub fn mesh_size(&self) -> f64 {
        match self {
            Domain::Circle { mesh_size, .. } => *mesh_size,
            Domain::Rectangle { mesh_size, .. } => *mesh_size,
            Domain::CTypeStructured { mesh_size, .. } => *mesh_size,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Domain::CTypeStructured { .. })
    }

    /// Smallest gap between the hole contours and the outer boundary. A
    /// non-positive value means the holes touch or escape the domain.
    pub fn bounding_clearance(&self, holes: &[&Contour]) -> f64 {
        let boxes: Vec<AABB<f64>> = holes.iter().map(|h| h.aabb()).collect();
        let Some(first) = boxes.first() else {
            return f64::INFINITY;
        };
        let bbox = boxes.iter().skip(1).fold(first.clone(), |a, b| a.merged(b));

        match self {
            Domain::Circle { center, radius, .. } => {
                let mut farthest: f64 = 0.0;
                for hole in holes {
                    farthest = farthest.max(bounding_radius(hole.points(), center));
                }
                radius - farthest
            }
            Domain::Rectangle {
                center,
                length,
                width,
                ..
            } => {
                let gaps = [
                    bbox.mins.x - (center.x - length / 2.0),
                    (center.x + length / 2.0) - bbox.maxs.x,
                    bbox.mins.y - (center.y - width / 2.0),
                    (center.y + width / 2.0) - bbox.maxs.y,
                ];
                gaps.iter().fold(f64::INFINITY, |a, g| a.min(*g))
            }
            Domain::CTypeStructured {
                leading_offset,
                height,
                ..
            } => {
                // The leading arc sits leading_offset ahead of the profile
                // nose, the wake outlet is downstream of every hole, so the
                // binding gaps are the arc offset and the half height.
                let y_extent = bbox.maxs.y.abs().max(bbox.mins.y.abs());
                leading_offset.min(height / 2.0 - y_extent)
            }
        }
    }

    /// Checks that every hole lies strictly inside the boundary with positive
    /// clearance.
    pub fn validate_holes(&self, holes: &[&Contour]) -> Result<()> {
        let clearance = self.bounding_clearance(holes);
        if clearance <= 0.0 {
            return Err(GeometryError::HoleOutsideDomain(clearance).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Naca4Digit, ProfileGenerator};
    use approx::assert_relative_eq;
    use test_case::test_case;

    fn unit_airfoil() -> Contour {
        let cloud = Naca4Digit::from_code("0012").unwrap().generate(100).unwrap();
        Contour::from_points(cloud.points(), 0.01, 1e-9).unwrap()
    }

    #[test]
    fn test_rectangle_contains_unit_airfoil() {
        let airfoil = unit_airfoil();
        let domain = Domain::rectangle(Point2::new(0.5, 0.0), 12.0, 4.0, 0.2).unwrap();

        assert!(domain.validate_holes(&[&airfoil]).is_ok());
        let clearance = domain.bounding_clearance(&[&airfoil]);
        assert!(clearance > 0.0);
        // Binding side is the half width minus the max thickness
        assert_relative_eq!(2.0 - 0.06, clearance, epsilon = 1e-2);
    }

    #[test]
    fn test_rectangle_too_small() {
        let airfoil = unit_airfoil();
        let domain = Domain::rectangle(Point2::new(0.5, 0.0), 0.5, 4.0, 0.2).unwrap();
        assert!(matches!(
            domain.validate_holes(&[&airfoil]),
            Err(crate::errors::Error::Geometry(
                GeometryError::HoleOutsideDomain(_)
            ))
        ));
    }

    #[test]
    fn test_circle_clearance() {
        let airfoil = unit_airfoil();
        let domain = Domain::circle(Point2::new(0.5, 0.0), 10.0, 0.2).unwrap();
        let clearance = domain.bounding_clearance(&[&airfoil]);
        // The trailing edge is 0.5 from the center
        assert_relative_eq!(9.5, clearance, epsilon = 1e-2);
        assert!(domain.validate_holes(&[&airfoil]).is_ok());
    }

    #[test]
    fn test_circle_too_small() {
        let airfoil = unit_airfoil();
        let domain = Domain::circle(Point2::new(0.5, 0.0), 0.4, 0.2).unwrap();
        assert!(domain.validate_holes(&[&airfoil]).is_err());
    }

    #[test]
    fn test_c_type_clearance() {
        let airfoil = unit_airfoil();
        let domain = Domain::c_type(2.0, 10.0, 10.0, 0.01).unwrap();
        let clearance = domain.bounding_clearance(&[&airfoil]);
        assert_relative_eq!(2.0, clearance, epsilon = 1e-6);
    }

    #[test]
    fn test_c_type_height_too_small() {
        let airfoil = unit_airfoil();
        let domain = Domain::c_type(2.0, 10.0, 0.1, 0.01).unwrap();
        assert!(domain.validate_holes(&[&airfoil]).is_err());
    }

    #[test_case(0.0, 4.0, 0.2)]
    #[test_case(12.0, -4.0, 0.2)]
    #[test_case(12.0, 4.0, 0.0)]
    fn test_rectangle_rejects_non_positive(length: f64, width: f64, mesh: f64) {
        assert!(Domain::rectangle(Point2::new(0.5, 0.0), length, width, mesh).is_err());
    }

    #[test]
    fn test_circle_rejects_non_positive_radius() {
        assert!(Domain::circle(Point2::new(0.5, 0.0), -1.0, 0.2).is_err());
    }
}
