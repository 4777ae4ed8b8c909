use crate::errors::{ParseError, Result, ValidationError};
use serde::Serialize;

/// Streamwise refinement toward the trailing edge in the wake blocks.
const WAKE_PROGRESSION: f64 = 0.98;

/// Growth of cell height along the wall-normal edges, away from the wall.
const NORMAL_PROGRESSION: f64 = 1.1;

/// Bump factor concentrating points near both ends of the airfoil surface
/// splines, where curvature accumulates.
const AIRFOIL_BUMP: f64 = 0.2;

/// Tangential counts along the airfoil surface and the leading arc.
const AIRFOIL_POINTS: u32 = 10;
const FRONT_POINTS: u32 = 20;

/// Node distribution law along one transfinite edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Distribution {
    Uniform,
    Progression(f64),
    Bump(f64),
}

/// Subdivision of a single transfinite edge.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EdgePlan {
    pub count: u32,
    pub distribution: Distribution,
}

impl EdgePlan {
    pub fn new(count: u32, distribution: Distribution) -> EdgePlan {
        EdgePlan {
            count: count.max(1),
            distribution,
        }
    }
}

/// One transfinite quad block. Edges are stored in cyclic order wall side,
/// downstream side, outer side, upstream side, so indices 0/2 and 1/3 are
/// the opposing pairs and must carry matching counts.
#[derive(Debug, Clone, Serialize)]
pub struct BlockPlan {
    pub name: &'static str,
    pub edges: [EdgePlan; 4],
}

impl BlockPlan {
    /// A mismatch between opposing edges here is a bug in the planner, not a
    /// user input problem.
    fn quad(name: &'static str, streamwise: EdgePlan, normal: EdgePlan) -> BlockPlan {
        let block = BlockPlan {
            name,
            edges: [streamwise, normal, streamwise, normal],
        };
        debug_assert_eq!(block.edges[0].count, block.edges[2].count);
        debug_assert_eq!(block.edges[1].count, block.edges[3].count);
        block
    }
}

/// Block subdivision plan for the five-block C-type topology, the only
/// domain variant assembled as a structured grid.
#[derive(Debug, Clone, Serialize)]
pub struct GridPlan {
    pub blocks: Vec<BlockPlan>,
}

/// Length and width of a rectangular domain parsed from an `LxW` dimension
/// string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxDimensions {
    pub length: f64,
    pub width: f64,
}

/// Leading offset, wake length, and total height parsed from an `LxLxL`
/// dimension string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CTypeDimensions {
    pub leading_offset: f64,
    pub wake_length: f64,
    pub height: f64,
}

/// Splits an `x`-separated dimension string into the expected number of
/// positive values.
pub fn parse_dimensions(given: &str, expected: usize) -> Result<Vec<f64>> {
    let tokens: Vec<&str> = given.split('x').collect();
    if tokens.len() != expected {
        return Err(ParseError::BadDimensionCount {
            given: given.to_string(),
            expected,
        }
        .into());
    }

    let mut values = Vec::with_capacity(expected);
    for token in tokens {
        let value: f64 = token
            .trim()
            .parse()
            .map_err(|_| ParseError::NonNumericDimension(given.to_string()))?;
        if value <= 0.0 {
            return Err(ParseError::NonPositiveDimension(given.to_string()).into());
        }
        values.push(value);
    }
    Ok(values)
}

impl BoxDimensions {
    pub fn parse(given: &str) -> Result<BoxDimensions> {
        let v = parse_dimensions(given, 2)?;
        Ok(BoxDimensions {
            length: v[0],
            width: v[1],
        })
    }
}

impl CTypeDimensions {
    pub fn parse(given: &str) -> Result<CTypeDimensions> {
        let v = parse_dimensions(given, 3)?;
        Ok(CTypeDimensions {
            leading_offset: v[0],
            wake_length: v[1],
            height: v[2],
        })
    }
}

/// Number of intervals a geometric progression starting at h0 with the given
/// ratio needs to cover a span. This ties the wall-adjacent structured edges
/// to the boundary-layer first cell height, so structured and unstructured
/// runs resolve the near-wall region comparably.
fn intervals_to_cover(span: f64, h0: f64, ratio: f64) -> u32 {
    let n = if ratio == 1.0 {
        (span / h0).ceil()
    } else {
        ((1.0 + span * (ratio - 1.0) / h0).ln() / ratio.ln()).ceil()
    };
    (n as u32).max(1)
}

fn validate(mesh_size: f64, first_layer: f64) -> Result<()> {
    if mesh_size <= 0.0 {
        return Err(ValidationError::NonPositiveMeshSize(mesh_size).into());
    }
    if first_layer <= 0.0 {
        return Err(ValidationError::NonPositiveFirstLayer(first_layer).into());
    }
    Ok(())
}

fn wake_edge(wake_length: f64, mesh_size: f64) -> EdgePlan {
    EdgePlan::new(
        (wake_length / mesh_size) as u32 + 1,
        Distribution::Progression(WAKE_PROGRESSION),
    )
}

/// Wall-normal edge: the count makes the first cell height at the wall land
/// near `first_layer` under the fixed normal progression.
fn normal_edge(half_height: f64, first_layer: f64) -> EdgePlan {
    EdgePlan::new(
        intervals_to_cover(half_height, first_layer, NORMAL_PROGRESSION) + 1,
        Distribution::Progression(NORMAL_PROGRESSION),
    )
}

fn surface_edge() -> EdgePlan {
    EdgePlan::new(AIRFOIL_POINTS, Distribution::Bump(AIRFOIL_BUMP))
}

/// Plans the five C-type blocks: the leading arc block wrapped around the
/// nose, upper and lower blocks over the surfaces, and the two wake blocks
/// behind the trailing edge.
pub fn plan_c_type(dims: &CTypeDimensions, mesh_size: f64, first_layer: f64) -> Result<GridPlan> {
    validate(mesh_size, first_layer)?;

    let normal = normal_edge(dims.height / 2.0, first_layer);
    let wake = wake_edge(dims.wake_length, mesh_size);
    let front = EdgePlan::new(FRONT_POINTS, Distribution::Uniform);

    Ok(GridPlan {
        blocks: vec![
            BlockPlan::quad("leading", front, normal),
            BlockPlan::quad("upper", surface_edge(), normal),
            BlockPlan::quad("wake-upper", wake, normal),
            BlockPlan::quad("wake-lower", wake, normal),
            BlockPlan::quad("lower", surface_edge(), normal),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_case::test_case;

    #[test]
    fn test_parse_box_dimensions() {
        let dims = BoxDimensions::parse("12x4").unwrap();
        assert_relative_eq!(12.0, dims.length, epsilon = 1e-12);
        assert_relative_eq!(4.0, dims.width, epsilon = 1e-12);
    }

    #[test]
    fn test_parse_c_type_dimensions() {
        let dims = CTypeDimensions::parse("2x10x8").unwrap();
        assert_relative_eq!(2.0, dims.leading_offset, epsilon = 1e-12);
        assert_relative_eq!(10.0, dims.wake_length, epsilon = 1e-12);
        assert_relative_eq!(8.0, dims.height, epsilon = 1e-12);
    }

    #[test_case("10")]
    #[test_case("10x10x10")]
    #[test_case("ax10")]
    #[test_case("0x10")]
    #[test_case("10x-4")]
    #[test_case("")]
    fn test_parse_box_rejected(given: &str) {
        assert!(BoxDimensions::parse(given).is_err());
    }

    #[test_case("10x10")]
    #[test_case("1x2x3x4")]
    #[test_case("2xbx8")]
    fn test_parse_c_type_rejected(given: &str) {
        assert!(CTypeDimensions::parse(given).is_err());
    }

    #[test_case(1.0, 0.1, 1.0, 10)]
    #[test_case(1.0, 0.3, 1.0, 4)]
    #[test_case(5.0, 3e-5, 1.1, 102)]
    fn test_intervals_to_cover(span: f64, h0: f64, r: f64, e: u32) {
        assert_eq!(e, intervals_to_cover(span, h0, r));
    }

    #[test]
    fn test_coverage_reaches_span() {
        let span = 5.0;
        let h0 = 3e-5;
        let r = 1.2;
        let n = intervals_to_cover(span, h0, r);
        let sum = h0 * (r.powi(n as i32) - 1.0) / (r - 1.0);
        let sum_prev = h0 * (r.powi(n as i32 - 1) - 1.0) / (r - 1.0);
        assert!(sum >= span);
        assert!(sum_prev < span);
    }

    #[test]
    fn test_c_type_plan_blocks() {
        let dims = CTypeDimensions::parse("2x10x10").unwrap();
        let plan = plan_c_type(&dims, 0.2, 3e-5).unwrap();
        assert_eq!(5, plan.blocks.len());

        for block in &plan.blocks {
            assert_eq!(block.edges[0].count, block.edges[2].count);
            assert_eq!(block.edges[1].count, block.edges[3].count);
        }
    }

    #[test]
    fn test_normal_edges_use_fixed_progression() {
        let dims = CTypeDimensions::parse("2x10x10").unwrap();
        let plan = plan_c_type(&dims, 0.2, 3e-5).unwrap();

        for block in &plan.blocks {
            assert_eq!(
                Distribution::Progression(NORMAL_PROGRESSION),
                block.edges[1].distribution
            );
        }
    }

    #[test]
    fn test_wake_count_follows_mesh_size() {
        let dims = CTypeDimensions::parse("2x10x10").unwrap();
        let plan = plan_c_type(&dims, 0.5, 3e-5).unwrap();
        let wake = &plan.blocks[2];
        assert_eq!(21, wake.edges[0].count);
        assert_eq!(
            Distribution::Progression(WAKE_PROGRESSION),
            wake.edges[0].distribution
        );
    }

    #[test]
    fn test_plan_rejects_bad_scalars() {
        let dims = CTypeDimensions::parse("2x10x10").unwrap();
        assert!(plan_c_type(&dims, 0.0, 3e-5).is_err());
        assert!(plan_c_type(&dims, 0.2, 0.0).is_err());
    }
}
