use crate::errors::{GeometryError, ParseError, Result, ValidationError};
use crate::geometry::distances2::{deviation, dist};
use crate::geometry::polygon2::signed_area;
use ncollide2d::na::{Isometry2, Point2, Vector2};
use std::fs;
use std::path::Path;

const EPSILON: f64 = 1e-3;

/// One chordwise sample of an airfoil: the camber point and the two surface
/// points above and below it.
pub struct CamberStation {
    pub camber: Point2<f64>,
    pub upper: Point2<f64>,
    pub lower: Point2<f64>,
}

/// An ordered set of 2D points forming a closed loop. The closing edge from
/// the last point back to the first is implicit. Canonical form is
/// counter-clockwise with the trailing edge (max-x vertex) first, so the
/// sequence reads trailing edge, upper surface, leading edge, lower surface.
#[derive(Clone, Debug)]
pub struct PointCloud {
    points: Vec<Point2<f64>>,
}

impl PointCloud {
    /// Wraps a loop which is already in canonical order, as produced by an
    /// analytic generator.
    pub fn from_loop(points: Vec<Point2<f64>>) -> PointCloud {
        PointCloud { points }
    }

    /// Cleans and reorders an arbitrary loaded point loop into canonical
    /// form. Consecutive duplicates are dropped; fewer than 3 distinct points
    /// or a collinear set is a degenerate contour. When the trailing edge is
    /// ambiguous (two max-x vertices within tolerance, as on a blunt base)
    /// the given order is preserved and a warning is logged instead of
    /// guessing.
    pub fn canonicalize(raw_points: &[Point2<f64>], tol: f64) -> Result<PointCloud> {
        let mut pts = raw_points.to_vec();
        pts.dedup_by(|a, b| dist(a, b) <= tol);
        if pts.len() > 1 && dist(&pts[0], pts.last().unwrap()) <= tol {
            pts.pop();
        }

        if pts.len() < 3 {
            return Err(GeometryError::NotEnoughPoints(pts.len()).into());
        }

        if Self::is_collinear(&pts, tol) {
            return Err(GeometryError::CollinearPoints.into());
        }

        let (te_index, unique) = Self::trailing_edge_index(&pts, tol);
        if !unique {
            log::warn!(
                "trailing edge is ambiguous, preserving the source point order"
            );
            return Ok(PointCloud { points: pts });
        }

        pts.rotate_left(te_index);
        if signed_area(&pts) < 0.0 {
            // Flip winding while keeping the trailing edge first
            pts[1..].reverse();
        }

        Ok(PointCloud { points: pts })
    }

    fn is_collinear(pts: &[Point2<f64>], tol: f64) -> bool {
        let first = &pts[0];
        let far = pts
            .iter()
            .max_by(|a, b| dist(first, a).partial_cmp(&dist(first, b)).unwrap())
            .unwrap();
        pts.iter().all(|p| deviation(first, far, p) <= tol)
    }

    /// Index of the max-x vertex, and whether it is unique within tolerance.
    fn trailing_edge_index(pts: &[Point2<f64>], tol: f64) -> (usize, bool) {
        let mut index = 0;
        for (i, p) in pts.iter().enumerate() {
            if p.x > pts[index].x {
                index = i;
            }
        }

        let ties = pts
            .iter()
            .enumerate()
            .filter(|(i, p)| *i != index && (pts[index].x - p.x).abs() <= tol)
            .count();
        (index, ties == 0)
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the cloud rotated by an angle in radians about an origin
    /// point. Positive angles rotate counter-clockwise.
    pub fn rotated(&self, angle: f64, origin: &Point2<f64>) -> PointCloud {
        let iso = Isometry2::rotation(angle);
        let points = self
            .points
            .iter()
            .map(|p| origin + iso * (p - origin))
            .collect();
        PointCloud { points }
    }

    pub fn leading_edge(&self) -> Point2<f64> {
        *self
            .points
            .iter()
            .min_by(|a, b| a.x.partial_cmp(&b.x).unwrap())
            .unwrap()
    }

    pub fn trailing_edge(&self) -> Point2<f64> {
        *self
            .points
            .iter()
            .max_by(|a, b| a.x.partial_cmp(&b.x).unwrap())
            .unwrap()
    }
}

/// A ProfileGenerator is an entity which can produce the position of the mean
/// camber line and the airfoil thickness at fractions of the chord, which is
/// enough to synthesize the airfoil surfaces.
pub trait ProfileGenerator {
    /// Position of the camber line at a chord fraction from 0.0 to 1.0
    fn camber_line(&self, x: f64) -> Point2<f64>;

    /// Full thickness of the airfoil with respect to the camber line at a
    /// chord fraction from 0.0 to 1.0
    fn thickness(&self, x: f64) -> f64;

    fn station_at(&self, x: f64) -> CamberStation {
        let x0 = (x - EPSILON).max(0.0);
        let x1 = (x + EPSILON).min(1.0);

        let clx = self.camber_line(x);
        let d = (self.camber_line(x1) - self.camber_line(x0)).normalize();
        let n = Vector2::new(-d.y, d.x);
        let t = self.thickness(x);

        CamberStation {
            camber: clx,
            upper: clx + n * (t / 2.0),
            lower: clx - n * (t / 2.0),
        }
    }

    /// Generates the canonical closed loop for this profile with chordwise
    /// stations cosine-spaced over [0, 1], denser near the leading and
    /// trailing edges. The loop runs trailing edge, upper surface with
    /// decreasing x, leading edge, lower surface with increasing x.
    fn generate(&self, station_count: usize) -> Result<PointCloud> {
        if station_count < 2 {
            return Err(ValidationError::TooFewStations(station_count).into());
        }

        let stations: Vec<CamberStation> = (0..station_count)
            .map(|i| {
                let theta = std::f64::consts::PI * i as f64 / (station_count - 1) as f64;
                self.station_at(0.5 * (1.0 - theta.cos()))
            })
            .collect();

        let mut points: Vec<Point2<f64>> =
            stations.iter().rev().map(|s| s.upper).collect();
        // The leading edge is shared by both surfaces, skip its duplicate
        points.extend(stations.iter().skip(1).map(|s| s.lower));

        Ok(PointCloud::from_loop(points))
    }
}

/// A generator for a NACA 4-digit airfoil of the form MPTT, where M is the
/// maximum camber, P is the location of the maximum camber, and TT is the
/// maximum thickness of the airfoil as a percentage of the chord. For
/// example, a NACA 2412 airfoil has a 2% camber at 40% of the chord and a max
/// thickness which is 12% of the chord length.
pub struct Naca4Digit {
    t: f64,
    chord_len: f64,
    m: f64,
    p: f64,
}

impl Naca4Digit {
    /// Parses a 4-digit NACA code such as "0012" or "4412". Anything other
    /// than exactly four numeric digits is rejected.
    pub fn from_code(code: &str) -> Result<Naca4Digit> {
        if code.len() != 4 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::BadNacaCode(code.to_string()).into());
        }

        let digit = |i: usize| code.as_bytes()[i] - b'0';
        Ok(Naca4Digit {
            m: digit(0) as f64 / 100.0,
            p: digit(1) as f64 / 10.0,
            t: (digit(2) * 10 + digit(3)) as f64 / 100.0,
            chord_len: 1.0,
        })
    }

    pub fn new(t_max: f64, chord_len: f64, max_camber: f64, max_camber_chord: f64) -> Naca4Digit {
        Naca4Digit {
            t: t_max,
            chord_len,
            m: max_camber,
            p: max_camber_chord,
        }
    }
}

impl ProfileGenerator for Naca4Digit {
    fn camber_line(&self, x: f64) -> Point2<f64> {
        let y = if self.p < 1e-6 {
            0.0
        } else if x < self.p {
            (self.m / self.p.powi(2)) * (2.0 * self.p * x - x.powi(2))
        } else {
            (self.m / (1.0 - self.p).powi(2))
                * ((1.0 - 2.0 * self.p) + 2.0 * self.p * x - x.powi(2))
        };

        Point2::new(x * self.chord_len, y * self.chord_len)
    }

    fn thickness(&self, x: f64) -> f64 {
        (self.t / 0.2 * self.chord_len)
            * (0.2969 * x.sqrt()
                + -0.1260 * x
                + -0.3516 * x.powi(2)
                + 0.2843 * x.powi(3)
                + -0.1036 * x.powi(4))
            * 2.0
    }
}

/// Reads a two-column airfoil coordinate file. Title lines which do not parse
/// as two numbers are skipped. A leading line whose two values are both
/// greater than 1 is the Lednicer upper/lower count header, in which case the
/// lower surface block is stored back-to-front and gets reversed here.
pub fn read_profile_file(path: &Path) -> Result<Vec<Point2<f64>>> {
    let text = fs::read_to_string(path).map_err(|e| ParseError::UnreadableFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut points: Vec<Point2<f64>> = Vec::new();
    let mut upper_len: usize = 0;

    for line in text.lines() {
        let mut it = line.split_whitespace();
        let (Some(a), Some(b)) = (it.next(), it.next()) else {
            continue;
        };
        let (Ok(x), Ok(y)) = (a.parse::<f64>(), b.parse::<f64>()) else {
            continue;
        };

        if x > 1.0 && y > 1.0 && points.is_empty() {
            upper_len = x as usize;
            continue;
        }

        points.push(Point2::new(x, y));
    }

    if upper_len > 0 && upper_len < points.len() {
        points[upper_len..].reverse();
    }

    if points.len() < 3 {
        return Err(ParseError::EmptyCoordinateFile(path.display().to_string()).into());
    }

    Ok(points)
}
