use crate::errors::{GeometryError, Result, ValidationError};
use serde::Serialize;

/// User-facing controls for the prismatic boundary layer stack.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BoundaryLayerSpec {
    pub first_layer_height: f64,
    pub growth_ratio: f64,
    pub layer_count: usize,
}

/// The planned layer stack: cumulative offsets of every layer interface from
/// the wall, plus the fan element count for the trailing edge. This is pure
/// numeric data; turning it into offset contours is the assembler's job, so
/// the schedule stays testable without a live kernel session.
#[derive(Debug, Clone, Serialize)]
pub struct BoundaryLayerSchedule {
    pub offsets: Vec<f64>,
    pub fan_elements: u32,
}

impl BoundaryLayerSchedule {
    pub fn total_thickness(&self) -> f64 {
        *self.offsets.last().unwrap()
    }
}

impl BoundaryLayerSpec {
    pub fn new(first_layer_height: f64, growth_ratio: f64, layer_count: usize) -> BoundaryLayerSpec {
        BoundaryLayerSpec {
            first_layer_height,
            growth_ratio,
            layer_count,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.first_layer_height <= 0.0 {
            return Err(ValidationError::NonPositiveFirstLayer(self.first_layer_height).into());
        }
        if self.growth_ratio <= 0.0 {
            return Err(ValidationError::NonPositiveRatio(self.growth_ratio).into());
        }
        if self.layer_count < 1 {
            return Err(ValidationError::ZeroLayerCount(self.layer_count).into());
        }
        Ok(())
    }

    /// Computes the cumulative offset of each layer interface from the wall.
    /// Layer i (1-based) ends at h0 * (r^i - 1) / (r - 1), the geometric
    /// series partial sum; a ratio of exactly 1 degenerates to the arithmetic
    /// schedule h0 * i. The total thickness must stay strictly below the
    /// clearance between the wall and the outer boundary.
    pub fn plan(&self, clearance: f64, wall_mesh_size: f64) -> Result<BoundaryLayerSchedule> {
        self.validate()?;

        let h0 = self.first_layer_height;
        let r = self.growth_ratio;
        let offsets: Vec<f64> = (1..=self.layer_count)
            .map(|i| {
                if r == 1.0 {
                    h0 * i as f64
                } else {
                    h0 * (r.powi(i as i32) - 1.0) / (r - 1.0)
                }
            })
            .collect();

        let schedule = BoundaryLayerSchedule {
            offsets,
            fan_elements: fan_element_count(wall_mesh_size),
        };
        let thickness = schedule.total_thickness();
        if thickness >= clearance {
            return Err(GeometryError::BoundaryLayerTooThick {
                thickness,
                clearance,
            }
            .into());
        }

        Ok(schedule)
    }
}

/// Number of fan elements around the trailing edge, scaled inversely with the
/// wall mesh size and clamped to a usable band.
fn fan_element_count(wall_mesh_size: f64) -> u32 {
    (15.0 * 0.01 / wall_mesh_size).clamp(10.0, 25.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_case::test_case;

    #[test]
    fn test_geometric_schedule() {
        let spec = BoundaryLayerSpec::new(1e-3, 1.2, 3);
        let schedule = spec.plan(1.0, 0.01).unwrap();
        let expected = [1e-3, 2.2e-3, 3.64e-3];

        assert_eq!(3, schedule.offsets.len());
        for (e, o) in expected.iter().zip(&schedule.offsets) {
            assert_relative_eq!(e, o, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_arithmetic_degenerate_schedule() {
        let spec = BoundaryLayerSpec::new(1e-3, 1.0, 4);
        let schedule = spec.plan(1.0, 0.01).unwrap();
        let expected = [1e-3, 2e-3, 3e-3, 4e-3];

        for (e, o) in expected.iter().zip(&schedule.offsets) {
            assert_relative_eq!(e, o, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_strictly_increasing() {
        let spec = BoundaryLayerSpec::new(3e-5, 1.2, 35);
        let schedule = spec.plan(10.0, 0.01).unwrap();
        for pair in schedule.offsets.windows(2) {
            assert!(pair[1] > pair[0]);
        }
        assert_eq!(35, schedule.offsets.len());
    }

    #[test_case(0.0, 1.2, 3)]
    #[test_case(-1e-3, 1.2, 3)]
    #[test_case(1e-3, 0.0, 3)]
    #[test_case(1e-3, -0.5, 3)]
    #[test_case(1e-3, 1.2, 0)]
    fn test_invalid_spec(h0: f64, r: f64, n: usize) {
        let spec = BoundaryLayerSpec::new(h0, r, n);
        assert!(matches!(
            spec.plan(1.0, 0.01),
            Err(crate::errors::Error::Validation(_))
        ));
    }

    #[test]
    fn test_thickness_exceeding_clearance() {
        let spec = BoundaryLayerSpec::new(0.1, 1.5, 10);
        let result = spec.plan(0.5, 0.01);
        assert!(matches!(
            result,
            Err(crate::errors::Error::Geometry(
                GeometryError::BoundaryLayerTooThick { .. }
            ))
        ));
    }

    #[test_case(0.01, 15)]
    #[test_case(0.1, 10)]
    #[test_case(0.001, 25)]
    fn test_fan_element_count(mesh_size: f64, e: u32) {
        assert_eq!(e, fan_element_count(mesh_size));
    }
}
