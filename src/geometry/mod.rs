pub mod contour;
pub mod distances2;
pub mod line2;
pub mod polygon2;
