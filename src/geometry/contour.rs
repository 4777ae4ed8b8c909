use crate::errors::{GeometryError, Result, ValidationError};
use crate::geometry::distances2::{dist, signed_angle};
use crate::geometry::polygon2::aabb_of_points;
use ncollide2d::bounding_volume::AABB;
use ncollide2d::math::Isometry;
use ncollide2d::na::{Point2, Unit, Vector2};

type UnitVec2 = Unit<Vector2<f64>>;

fn sym_unit_vec(a: &UnitVec2, b: &UnitVec2) -> UnitVec2 {
    let t = signed_angle(a, b) * 0.5;
    Isometry::rotation(t) * a
}

/// Index of the last entry in a sorted slice which is less than or equal to
/// the test value, 0 when the test value falls before the first entry.
fn preceding_index(values: &[f64], test_value: f64) -> usize {
    values.partition_point(|v| *v <= test_value).saturating_sub(1)
}

/// A Contour is a closed 2 dimensional polygonal chain tagged with the target
/// discretization size handed to the meshing engine. The vertex sequence is
/// stored without a repeated closing point; the closing edge from the last
/// vertex back to the first is implicit. This struct and its methods allow
/// for length parameterization, outward normals, and bounding queries.
pub struct Contour {
    points: Vec<Point2<f64>>,
    normals: Vec<UnitVec2>,
    lengths: Vec<f64>,
    mesh_size: f64,
    tol: f64,
}

impl Contour {
    pub fn from_points(points: &[Point2<f64>], mesh_size: f64, tol: f64) -> Result<Self> {
        if mesh_size <= 0.0 {
            return Err(ValidationError::NonPositiveMeshSize(mesh_size).into());
        }

        let mut pts = points.to_vec();
        pts.dedup_by(|a, b| dist(a, b) <= tol);
        if pts.len() > 1 && dist(&pts[0], pts.last().unwrap()) <= tol {
            pts.pop();
        }

        if pts.len() < 3 {
            return Err(GeometryError::NotEnoughPoints(pts.len()).into());
        }

        // Edge i joins vertex i with vertex (i + 1) % n. For a CCW loop the
        // outward edge normal is the edge direction rotated a quarter turn
        // clockwise.
        let mut normals = Vec::with_capacity(pts.len());
        let mut lengths: Vec<f64> = vec![0.0];
        for i in 0..pts.len() {
            let a = &pts[i];
            let b = &pts[(i + 1) % pts.len()];
            let d = b - a;
            normals.push(Unit::new_normalize(Vector2::new(d.y, -d.x)));
            lengths.push(dist(a, b) + lengths.last().unwrap_or(&0.0));
        }

        Ok(Contour {
            points: pts,
            normals,
            lengths,
            mesh_size,
            tol,
        })
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn mesh_size(&self) -> f64 {
        self.mesh_size
    }

    pub fn length(&self) -> f64 {
        *self.lengths.last().unwrap_or(&0.0)
    }

    pub fn edge_count(&self) -> usize {
        self.points.len()
    }

    pub fn aabb(&self) -> AABB<f64> {
        aabb_of_points(&self.points)
    }

    /// Finds the preceding edge index of the point at the given length along
    /// the contour, and the weighting of the preceding vertex needed to
    /// reconstruct the properties of the point at that length.
    fn at_length(&self, l: f64) -> (usize, f64) {
        let d = l.clamp(0.0, self.length());
        let index = preceding_index(&self.lengths, d).min(self.points.len() - 1);
        let span = self.lengths[index + 1] - self.lengths[index];
        let f = (d - self.lengths[index]) / span;
        (index, 1.0 - f)
    }

    pub fn point_at(&self, l: f64) -> Point2<f64> {
        let (i, f) = self.at_length(l);
        let p = self.points[i];
        let v = self.points[(i + 1) % self.points.len()] - p;
        p + (1.0 - f) * v
    }

    fn normal_at_vertex(&self, i: usize) -> UnitVec2 {
        let prev = (i + self.points.len() - 1) % self.points.len();
        sym_unit_vec(&self.normals[prev], &self.normals[i])
    }

    /// Outward normal at a length along the contour. Falls back to the
    /// symmetric vertex normal when the query lands on a vertex.
    pub fn normal_at(&self, l: f64) -> UnitVec2 {
        let (i, f) = self.at_length(l);

        if (f - 1.0).abs() <= self.tol {
            self.normal_at_vertex(i)
        } else if f.abs() <= self.tol {
            self.normal_at_vertex((i + 1) % self.points.len())
        } else {
            self.normals[i]
        }
    }
}
