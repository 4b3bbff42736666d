//! Landmark point sets, shared triangulation, and affine transforms.

pub mod affine;
pub mod delaunay;
pub mod point_set;

pub use affine::{affine_from_triangles, invert_affine, transform_point, Affine2x3};
pub use delaunay::{delaunay, TriangleIndices};
pub use point_set::{Point2, PointSet};
