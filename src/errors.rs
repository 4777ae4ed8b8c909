use thiserror::Error;

/// Malformed or out-of-range scalar and flag values.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("NACA code '{0}' is not exactly 4 numeric digits")]
    BadNacaCode(String),

    #[error("mesh size must be positive, got {0}")]
    NonPositiveMeshSize(f64),

    #[error("first layer height must be positive, got {0}")]
    NonPositiveFirstLayer(f64),

    #[error("growth ratio must be positive, got {0}")]
    NonPositiveRatio(f64),

    #[error("layer count must be at least 1, got {0}")]
    ZeroLayerCount(usize),

    #[error("station count must be at least 2, got {0}")]
    TooFewStations(usize),

    #[error("domain {name} must be positive, got {value}")]
    NonPositiveDomainExtent { name: &'static str, value: f64 },

    #[error("more than one airfoil shape source was supplied")]
    MultipleShapeSources,

    #[error("no airfoil shape source was supplied")]
    NoShapeSource,
}

/// Malformed compound tokens: dimension strings, config lines, coordinate files.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("dimension string '{given}' must have {expected} 'x'-separated values")]
    BadDimensionCount { given: String, expected: usize },

    #[error("dimension string '{0}' contains a non-numeric value")]
    NonNumericDimension(String),

    #[error("dimension string '{0}' contains a non-positive value")]
    NonPositiveDimension(String),

    #[error("coordinate file '{0}' holds fewer than 3 usable points")]
    EmptyCoordinateFile(String),

    #[error("could not read '{path}': {reason}")]
    UnreadableFile { path: String, reason: String },

    #[error("could not write '{path}': {reason}")]
    UnwritableFile { path: String, reason: String },

    #[error("config line '{0}' is not a key=value pair")]
    BadConfigLine(String),

    #[error("'{0}' is not a boolean (expected true/false)")]
    BadBoolean(String),

    #[error("'{value}' is not a valid number for key '{key}'")]
    BadNumber { key: String, value: String },
}

/// Structurally invalid or ill-posed geometry.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("contour needs at least 3 distinct points, got {0}")]
    NotEnoughPoints(usize),

    #[error("contour points are collinear, no closed loop exists")]
    CollinearPoints,

    #[error("flap interferes with the main profile after deflection")]
    FlapInterference,

    #[error("hole contours overlap each other")]
    OverlappingHoles,

    #[error("a structured domain supports exactly one wall contour, got {0}")]
    StructuredHoleCount(usize),

    #[error("structured assembly needs a five-block plan, got {0} blocks")]
    WrongBlockCount(usize),

    #[error("a structured grid plan applies only to a C-type domain")]
    StructuredDomainMismatch,

    #[error("a C-type domain requires a structured grid plan")]
    MissingGridPlan,

    #[error("hole extends outside the outer domain boundary (clearance {0})")]
    HoleOutsideDomain(f64),

    #[error("boundary layer thickness {thickness} exceeds domain clearance {clearance}")]
    BoundaryLayerTooThick { thickness: f64, clearance: f64 },
}

/// Failure reported by the external geometric kernel or meshing engine.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("physical groups require a synchronized kernel session")]
    NotSynchronized,

    #[error("kernel rejected entity reference {0}")]
    UnknownEntity(i64),

    #[error("meshing engine failed: {0}")]
    MeshingFailed(String),
}

/// Top level error for the whole pipeline. Every category is fatal: the
/// pipeline is a deterministic function of its inputs, so a retry without
/// changed inputs cannot succeed.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type Result<T> = std::result::Result<T, Error>;
