//! Landmark point sets and interpolation.

use crate::foundation::core::FrameSize;
use crate::foundation::error::{MorphError, MorphResult};
use crate::foundation::math::lerp;

/// A 2D point in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point2 {
    /// X coordinate in pixels.
    pub x: f32,
    /// Y coordinate in pixels.
    pub y: f32,
}

impl Point2 {
    /// Create a point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An ordered set of landmark coordinates for one source image.
///
/// Immutable once produced by a correspondence provider. The two sets of a
/// morph job must have equal length before triangulation; that is a
/// precondition checked by [`PointSet::midpoint`] and
/// [`PointSet::interpolate`], not a runtime adjustment.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PointSet(Vec<Point2>);

impl PointSet {
    /// Wrap an ordered list of points.
    pub fn new(points: Vec<Point2>) -> Self {
        Self(points)
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `true` when the set holds no points.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the points in order.
    pub fn points(&self) -> &[Point2] {
        &self.0
    }

    /// Append the 8 fixed frame-boundary anchors (corners and edge midpoints).
    ///
    /// The anchors guarantee the triangulation covers the full frame so no
    /// edge region is left untextured. Order is fixed: top row left-to-right,
    /// middle sides, bottom row left-to-right.
    pub fn with_boundary(&self, size: FrameSize) -> PointSet {
        let w = (size.width - 1) as f32;
        let h = (size.height - 1) as f32;
        let (cx, cy) = ((size.width / 2) as f32, (size.height / 2) as f32);

        let mut points = self.0.clone();
        points.extend_from_slice(&[
            Point2::new(0.0, 0.0),
            Point2::new(cx, 0.0),
            Point2::new(w, 0.0),
            Point2::new(0.0, cy),
            Point2::new(w, cy),
            Point2::new(0.0, h),
            Point2::new(cx, h),
            Point2::new(w, h),
        ]);
        PointSet(points)
    }

    /// Per-index midpoint of two equal-length sets.
    ///
    /// This is the triangulation input: triangulating the averaged positions
    /// keeps one topology valid for both sets and every affine interpolation
    /// between them.
    pub fn midpoint(a: &PointSet, b: &PointSet) -> MorphResult<PointSet> {
        Self::interpolate(a, b, 0.5)
    }

    /// Per-index linear interpolation at parameter `t`.
    pub fn interpolate(a: &PointSet, b: &PointSet, t: f32) -> MorphResult<PointSet> {
        if a.len() != b.len() {
            return Err(MorphError::validation(format!(
                "point set length mismatch: {} vs {}",
                a.len(),
                b.len()
            )));
        }
        Ok(PointSet(
            a.0.iter()
                .zip(&b.0)
                .map(|(pa, pb)| Point2::new(lerp(pa.x, pb.x, t), lerp(pa.y, pb.y, t)))
                .collect(),
        ))
    }
}
