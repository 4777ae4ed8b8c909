//! Planar geometric model construction for 2D airfoil meshing: analytic and
//! file-based airfoil contours, flap placement, far-field domain boundaries,
//! boundary-layer planning, and structured C-type block topologies, assembled
//! against an external geometric kernel through the `KernelSession` trait.

pub mod assemble;
pub mod boundary_layer;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flap;
pub mod geometry;
pub mod profile;
pub mod session;
pub mod structured;
