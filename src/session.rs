use crate::boundary_layer::BoundaryLayerSchedule;
use crate::errors::{EngineError, Result};
use crate::structured::Distribution;
use std::collections::HashMap;
use std::path::Path;

/// Identifier the kernel assigns to a created entity. Curve references may be
/// negated to reverse their orientation inside a loop, as the kernel's loop
/// builder expects.
pub type Tag = i64;

/// Explicit handle on the external geometric kernel, threaded by reference
/// through every component instead of living as process-global state. Entity
/// creation must happen in a fixed total order and identifiers are only
/// stable after `synchronize`, so tagging before a synchronize is an error.
///
/// The session is created and released by the caller; the assembler only
/// borrows it.
pub trait KernelSession {
    fn add_point(&mut self, x: f64, y: f64, mesh_size: f64) -> Result<Tag>;
    fn add_line(&mut self, start: Tag, end: Tag) -> Result<Tag>;
    fn add_spline(&mut self, through: &[Tag]) -> Result<Tag>;
    fn add_circle_arc(&mut self, start: Tag, center: Tag, end: Tag) -> Result<Tag>;
    fn add_curve_loop(&mut self, curves: &[Tag]) -> Result<Tag>;

    /// The first loop is the exterior boundary, any further loops are holes.
    fn add_plane_surface(&mut self, loops: &[Tag]) -> Result<Tag>;

    fn set_transfinite_curve(&mut self, curve: Tag, count: u32, dist: Distribution)
        -> Result<()>;
    fn set_transfinite_surface(&mut self, surface: Tag) -> Result<()>;
    fn recombine_surface(&mut self, surface: Tag) -> Result<()>;

    /// Registers a prismatic boundary-layer field over wall curves, with fan
    /// points at sharp trailing edges.
    fn add_boundary_layer(
        &mut self,
        curves: &[Tag],
        schedule: &BoundaryLayerSchedule,
        fan_points: &[Tag],
    ) -> Result<()>;

    /// Finalizes the kernel's topology state; tags are stable afterwards.
    fn synchronize(&mut self) -> Result<()>;

    fn add_physical_group(&mut self, dim: u8, entities: &[Tag], name: &str) -> Result<Tag>;

    fn generate_mesh(&mut self) -> Result<()>;
    fn write(&mut self, path: &Path) -> Result<()>;
}

/// A named physical group as recorded by the session.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedGroup {
    pub dim: u8,
    pub name: String,
    pub entities: Vec<Tag>,
}

/// In-memory session which validates the call protocol without a live
/// kernel: tags must reference existing entities, and physical groups are
/// rejected until the session has been synchronized. Doubles as the test
/// harness for the assembler.
#[derive(Default)]
pub struct RecordingSession {
    next_tag: Tag,
    points: HashMap<Tag, (f64, f64, f64)>,
    curves: HashMap<Tag, Vec<Tag>>,
    loops: HashMap<Tag, Vec<Tag>>,
    surfaces: HashMap<Tag, Vec<Tag>>,
    synchronized: bool,
    pub groups: Vec<RecordedGroup>,
    pub transfinite_curves: Vec<(Tag, u32, Distribution)>,
    pub transfinite_surfaces: Vec<Tag>,
    pub recombined: Vec<Tag>,
    pub boundary_layers: Vec<(Vec<Tag>, usize)>,
    pub meshed: bool,
    pub written: Vec<String>,
}

impl RecordingSession {
    pub fn new() -> RecordingSession {
        RecordingSession::default()
    }

    fn fresh_tag(&mut self) -> Tag {
        self.next_tag += 1;
        self.synchronized = false;
        self.next_tag
    }

    fn check_point(&self, tag: Tag) -> Result<()> {
        if self.points.contains_key(&tag) {
            Ok(())
        } else {
            Err(EngineError::UnknownEntity(tag).into())
        }
    }

    fn check_curve(&self, tag: Tag) -> Result<()> {
        if self.curves.contains_key(&tag.abs()) {
            Ok(())
        } else {
            Err(EngineError::UnknownEntity(tag).into())
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn curve_count(&self) -> usize {
        self.curves.len()
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }
}

impl KernelSession for RecordingSession {
    fn add_point(&mut self, x: f64, y: f64, mesh_size: f64) -> Result<Tag> {
        let tag = self.fresh_tag();
        self.points.insert(tag, (x, y, mesh_size));
        Ok(tag)
    }

    fn add_line(&mut self, start: Tag, end: Tag) -> Result<Tag> {
        self.check_point(start)?;
        self.check_point(end)?;
        let tag = self.fresh_tag();
        self.curves.insert(tag, vec![start, end]);
        Ok(tag)
    }

    fn add_spline(&mut self, through: &[Tag]) -> Result<Tag> {
        for t in through {
            self.check_point(*t)?;
        }
        let tag = self.fresh_tag();
        self.curves.insert(tag, through.to_vec());
        Ok(tag)
    }

    fn add_circle_arc(&mut self, start: Tag, center: Tag, end: Tag) -> Result<Tag> {
        self.check_point(start)?;
        self.check_point(center)?;
        self.check_point(end)?;
        let tag = self.fresh_tag();
        self.curves.insert(tag, vec![start, center, end]);
        Ok(tag)
    }

    fn add_curve_loop(&mut self, curves: &[Tag]) -> Result<Tag> {
        for c in curves {
            self.check_curve(*c)?;
        }
        let tag = self.fresh_tag();
        self.loops.insert(tag, curves.to_vec());
        Ok(tag)
    }

    fn add_plane_surface(&mut self, loops: &[Tag]) -> Result<Tag> {
        for l in loops {
            if !self.loops.contains_key(l) {
                return Err(EngineError::UnknownEntity(*l).into());
            }
        }
        let tag = self.fresh_tag();
        self.surfaces.insert(tag, loops.to_vec());
        Ok(tag)
    }

    fn set_transfinite_curve(
        &mut self,
        curve: Tag,
        count: u32,
        dist: Distribution,
    ) -> Result<()> {
        self.check_curve(curve)?;
        self.transfinite_curves.push((curve, count, dist));
        Ok(())
    }

    fn set_transfinite_surface(&mut self, surface: Tag) -> Result<()> {
        if !self.surfaces.contains_key(&surface) {
            return Err(EngineError::UnknownEntity(surface).into());
        }
        self.transfinite_surfaces.push(surface);
        Ok(())
    }

    fn recombine_surface(&mut self, surface: Tag) -> Result<()> {
        if !self.surfaces.contains_key(&surface) {
            return Err(EngineError::UnknownEntity(surface).into());
        }
        self.recombined.push(surface);
        Ok(())
    }

    fn add_boundary_layer(
        &mut self,
        curves: &[Tag],
        schedule: &BoundaryLayerSchedule,
        fan_points: &[Tag],
    ) -> Result<()> {
        for c in curves {
            self.check_curve(*c)?;
        }
        for p in fan_points {
            self.check_point(*p)?;
        }
        self.boundary_layers
            .push((curves.to_vec(), schedule.offsets.len()));
        Ok(())
    }

    fn synchronize(&mut self) -> Result<()> {
        self.synchronized = true;
        Ok(())
    }

    fn add_physical_group(&mut self, dim: u8, entities: &[Tag], name: &str) -> Result<Tag> {
        if !self.synchronized {
            return Err(EngineError::NotSynchronized.into());
        }
        for e in entities {
            let known = match dim {
                0 => self.points.contains_key(e),
                1 => self.curves.contains_key(&e.abs()),
                _ => self.surfaces.contains_key(e),
            };
            if !known {
                return Err(EngineError::UnknownEntity(*e).into());
            }
        }

        self.groups.push(RecordedGroup {
            dim,
            name: name.to_string(),
            entities: entities.to_vec(),
        });
        Ok(self.groups.len() as Tag)
    }

    fn generate_mesh(&mut self) -> Result<()> {
        if !self.synchronized {
            return Err(EngineError::NotSynchronized.into());
        }
        self.meshed = true;
        Ok(())
    }

    fn write(&mut self, path: &Path) -> Result<()> {
        if !self.meshed {
            return Err(EngineError::MeshingFailed("no mesh generated".to_string()).into());
        }
        self.written.push(path.display().to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary_layer::BoundaryLayerSpec;

    #[test]
    fn test_entity_references_checked() {
        let mut session = RecordingSession::new();
        let p0 = session.add_point(0.0, 0.0, 0.1).unwrap();
        assert!(session.add_line(p0, 99).is_err());

        let p1 = session.add_point(1.0, 0.0, 0.1).unwrap();
        let line = session.add_line(p0, p1).unwrap();
        assert!(session.add_curve_loop(&[line, 42]).is_err());
    }

    #[test]
    fn test_reversed_curve_reference_accepted() {
        let mut session = RecordingSession::new();
        let p0 = session.add_point(0.0, 0.0, 0.1).unwrap();
        let p1 = session.add_point(1.0, 0.0, 0.1).unwrap();
        let line = session.add_line(p0, p1).unwrap();
        assert!(session.add_curve_loop(&[-line]).is_ok());
    }

    #[test]
    fn test_physical_group_requires_synchronize() {
        let mut session = RecordingSession::new();
        let p0 = session.add_point(0.0, 0.0, 0.1).unwrap();
        let p1 = session.add_point(1.0, 0.0, 0.1).unwrap();
        let line = session.add_line(p0, p1).unwrap();

        let result = session.add_physical_group(1, &[line], "wall");
        assert!(matches!(
            result,
            Err(crate::errors::Error::Engine(EngineError::NotSynchronized))
        ));

        session.synchronize().unwrap();
        assert!(session.add_physical_group(1, &[line], "wall").is_ok());
    }

    #[test]
    fn test_new_entity_invalidates_synchronization() {
        let mut session = RecordingSession::new();
        let p0 = session.add_point(0.0, 0.0, 0.1).unwrap();
        session.synchronize().unwrap();

        let p1 = session.add_point(1.0, 0.0, 0.1).unwrap();
        let result = session.add_physical_group(0, &[p0, p1], "pts");
        assert!(result.is_err());
    }

    #[test]
    fn test_write_requires_mesh() {
        let mut session = RecordingSession::new();
        session.synchronize().unwrap();
        assert!(session.write(Path::new("out.su2")).is_err());

        session.generate_mesh().unwrap();
        assert!(session.write(Path::new("out.su2")).is_ok());
        assert_eq!(vec!["out.su2".to_string()], session.written);
    }

    #[test]
    fn test_boundary_layer_records_layer_count() {
        let mut session = RecordingSession::new();
        let p0 = session.add_point(0.0, 0.0, 0.1).unwrap();
        let p1 = session.add_point(1.0, 0.0, 0.1).unwrap();
        let line = session.add_line(p0, p1).unwrap();

        let schedule = BoundaryLayerSpec::new(1e-3, 1.2, 5).plan(1.0, 0.01).unwrap();
        session.add_boundary_layer(&[line], &schedule, &[p0]).unwrap();
        assert_eq!(1, session.boundary_layers.len());
        assert_eq!(5, session.boundary_layers[0].1);
    }
}
