//! Frame sequencing and synthesis over the morph timeline.

use crate::foundation::core::{FramePlanes, FrameRgb};
use crate::foundation::error::{MorphError, MorphResult};
use crate::foundation::math::{lerp, step_parameter};
use crate::geometry::{PointSet, TriangleIndices};
use crate::job::progress::{ProgressObserver, Stage};
use crate::morph::warp::warp_triangle;

/// Synthesis mode, selected once per job during detection.
///
/// Serialized names are part of the job result contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MorphMode {
    /// Correspondence available on both sides: piecewise-affine warping.
    FaceLandmarkWarp,
    /// Fallback: pure per-pixel cross-dissolve.
    SimpleBlend,
}

/// Per-job synthesis plan produced by the detection stage.
pub enum MorphPlan {
    /// Warp both sources toward interpolated landmark positions each step.
    FaceWarp {
        /// Boundary-augmented landmarks of image A.
        points_a: PointSet,
        /// Boundary-augmented landmarks of image B.
        points_b: PointSet,
        /// Shared triangulation of the midpoint-averaged set.
        triangles: Vec<TriangleIndices>,
    },
    /// Cross-dissolve only.
    SimpleBlend,
}

impl MorphPlan {
    /// The mode this plan realizes.
    pub fn mode(&self) -> MorphMode {
        match self {
            MorphPlan::FaceWarp { .. } => MorphMode::FaceLandmarkWarp,
            MorphPlan::SimpleBlend => MorphMode::SimpleBlend,
        }
    }
}

/// Drive the warper (or the cross-dissolve) across `total_frames` steps.
///
/// Frame `i` uses `t = i/(N-1)` (`N == 1` is defined as `t = 0`). One
/// progress report is emitted per produced frame, stage `Morph`. The full
/// ordered sequence is returned; the caller owns encoding and the hand-off to
/// the analysis stage.
pub fn synthesize(
    a: &FrameRgb,
    b: &FrameRgb,
    plan: &MorphPlan,
    total_frames: usize,
    progress: &dyn ProgressObserver,
) -> MorphResult<Vec<FrameRgb>> {
    if total_frames == 0 {
        return Err(MorphError::validation("total_frames must be at least 1"));
    }
    if a.size() != b.size() {
        return Err(MorphError::validation(format!(
            "source frame sizes differ: {}x{} vs {}x{}",
            a.width, a.height, b.width, b.height
        )));
    }

    let planes_a = FramePlanes::from_frame(a);
    let planes_b = FramePlanes::from_frame(b);

    let mut frames = Vec::with_capacity(total_frames);
    for i in 0..total_frames {
        let t = step_parameter(i, total_frames);
        frames.push(synthesize_step(&planes_a, &planes_b, plan, t)?);
        progress.report((i + 1) as u64, total_frames as u64, Stage::Morph);
    }
    Ok(frames)
}

/// Produce the single frame at interpolation parameter `t`.
pub fn synthesize_frame(
    a: &FrameRgb,
    b: &FrameRgb,
    plan: &MorphPlan,
    t: f32,
) -> MorphResult<FrameRgb> {
    if a.size() != b.size() {
        return Err(MorphError::validation("source frame sizes differ"));
    }
    synthesize_step(
        &FramePlanes::from_frame(a),
        &FramePlanes::from_frame(b),
        plan,
        t,
    )
}

fn synthesize_step(
    planes_a: &FramePlanes,
    planes_b: &FramePlanes,
    plan: &MorphPlan,
    t: f32,
) -> MorphResult<FrameRgb> {
    match plan {
        MorphPlan::FaceWarp {
            points_a,
            points_b,
            triangles,
        } => face_warp_step(planes_a, planes_b, points_a, points_b, triangles, t),
        MorphPlan::SimpleBlend => Ok(blend_step(planes_a, planes_b, t)),
    }
}

/// One face-warp step: warp A's triangles and B's triangles independently
/// toward the interpolated positions, then blend the two fully-warped
/// surfaces with weights `(1-t, t)`.
///
/// The double-warp-then-blend order is load-bearing; blending first would
/// discard the geometric alignment the warp establishes.
fn face_warp_step(
    planes_a: &FramePlanes,
    planes_b: &FramePlanes,
    points_a: &PointSet,
    points_b: &PointSet,
    triangles: &[TriangleIndices],
    t: f32,
) -> MorphResult<FrameRgb> {
    let points_t = PointSet::interpolate(points_a, points_b, t)?;

    let size = crate::foundation::core::FrameSize {
        width: planes_a.width,
        height: planes_a.height,
    };
    let mut warped_a = FramePlanes::zeroed(size);
    let mut warped_b = FramePlanes::zeroed(size);

    for tri in triangles {
        let tri_a = triangle_of(points_a, tri)?;
        let tri_b = triangle_of(points_b, tri)?;
        let tri_t = triangle_of(&points_t, tri)?;

        warp_triangle(planes_a, &mut warped_a, &tri_a, &tri_t);
        warp_triangle(planes_b, &mut warped_b, &tri_b, &tri_t);
    }

    let mut blended = warped_a;
    for (dst, src) in blended.data.iter_mut().zip(&warped_b.data) {
        *dst = lerp(*dst, *src, t);
    }
    Ok(blended.to_frame())
}

fn blend_step(planes_a: &FramePlanes, planes_b: &FramePlanes, t: f32) -> FrameRgb {
    let mut out = planes_a.clone();
    for (dst, src) in out.data.iter_mut().zip(&planes_b.data) {
        *dst = lerp(*dst, *src, t);
    }
    out.to_frame()
}

fn triangle_of(
    points: &PointSet,
    indices: &TriangleIndices,
) -> MorphResult<[crate::geometry::Point2; 3]> {
    let pts = points.points();
    let get = |i: usize| {
        pts.get(i).copied().ok_or_else(|| {
            MorphError::geometry(format!(
                "triangle index {i} out of bounds for {} points",
                pts.len()
            ))
        })
    };
    Ok([get(indices[0])?, get(indices[1])?, get(indices[2])?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::FrameSize;
    use crate::geometry::{delaunay, Point2};
    use crate::job::progress::NoProgress;

    fn solid(size: FrameSize, rgb: [u8; 3]) -> FrameRgb {
        let mut data = Vec::with_capacity(size.pixel_count() * 3);
        for _ in 0..size.pixel_count() {
            data.extend_from_slice(&rgb);
        }
        FrameRgb::from_raw(size, data).unwrap()
    }

    fn face_plan(size: FrameSize) -> MorphPlan {
        let inner_a = PointSet::new(vec![
            Point2::new(10.0, 10.0),
            Point2::new(22.0, 12.0),
            Point2::new(16.0, 24.0),
        ]);
        let inner_b = PointSet::new(vec![
            Point2::new(12.0, 11.0),
            Point2::new(20.0, 10.0),
            Point2::new(15.0, 22.0),
        ]);
        let points_a = inner_a.with_boundary(size);
        let points_b = inner_b.with_boundary(size);
        let avg = PointSet::midpoint(&points_a, &points_b).unwrap();
        let triangles = delaunay(&avg).unwrap();
        MorphPlan::FaceWarp {
            points_a,
            points_b,
            triangles,
        }
    }

    #[test]
    fn frame_count_always_matches_request() {
        let size = FrameSize::new(8, 8).unwrap();
        let a = solid(size, [255, 0, 0]);
        let b = solid(size, [0, 0, 255]);
        for n in [1usize, 2, 7] {
            let frames = synthesize(&a, &b, &MorphPlan::SimpleBlend, n, &NoProgress).unwrap();
            assert_eq!(frames.len(), n);
        }
    }

    #[test]
    fn single_frame_sequence_reproduces_image_a() {
        let size = FrameSize::new(8, 8).unwrap();
        let a = solid(size, [200, 50, 10]);
        let b = solid(size, [0, 0, 255]);
        let frames = synthesize(&a, &b, &MorphPlan::SimpleBlend, 1, &NoProgress).unwrap();
        assert_eq!(frames[0], a);
    }

    #[test]
    fn simple_blend_endpoints_and_midpoint() {
        let size = FrameSize::new(4, 4).unwrap();
        let a = solid(size, [100, 0, 0]);
        let b = solid(size, [0, 0, 200]);
        let frames = synthesize(&a, &b, &MorphPlan::SimpleBlend, 3, &NoProgress).unwrap();
        assert_eq!(frames[0], a);
        assert_eq!(frames[2], b);
        assert_eq!(&frames[1].data[..3], &[50, 0, 100]);
    }

    #[test]
    fn face_warp_endpoints_reproject_the_sources() {
        let size = FrameSize::new(32, 32).unwrap();
        let a = solid(size, [180, 40, 20]);
        let b = solid(size, [10, 90, 240]);
        let plan = face_plan(size);
        let frames = synthesize(&a, &b, &plan, 2, &NoProgress).unwrap();

        // Solid sources warp onto themselves regardless of geometry: the
        // endpoint frames must match the inputs within tolerance. Pixels on
        // shared triangle edges carry slight anti-aliasing residue, so the
        // check is a mean error bound plus a majority-exact bound.
        for (frame, source) in [(&frames[0], &a), (&frames[1], &b)] {
            let mut abs_err_sum = 0u64;
            let mut exact = 0usize;
            for (&got, &want) in frame.data.iter().zip(&source.data) {
                let diff = (i32::from(got) - i32::from(want)).unsigned_abs() as u64;
                abs_err_sum += diff;
                if diff <= 1 {
                    exact += 1;
                }
            }
            let mae = abs_err_sum as f64 / frame.data.len() as f64;
            assert!(mae < 5.0, "mean abs error too high: {mae}");
            assert!(
                exact * 10 >= frame.data.len() * 7,
                "fewer than 70% of channels match: {exact}/{}",
                frame.data.len()
            );
        }
    }

    #[test]
    fn zero_frames_is_rejected() {
        let size = FrameSize::new(4, 4).unwrap();
        let a = solid(size, [0, 0, 0]);
        let b = solid(size, [255, 255, 255]);
        assert!(synthesize(&a, &b, &MorphPlan::SimpleBlend, 0, &NoProgress).is_err());
    }

    #[test]
    fn progress_is_reported_once_per_frame() {
        use std::sync::Mutex;
        struct Recorder(Mutex<Vec<(u64, u64, Stage)>>);
        impl ProgressObserver for Recorder {
            fn report(&self, current: u64, total: u64, stage: Stage) {
                self.0.lock().unwrap().push((current, total, stage));
            }
        }

        let size = FrameSize::new(4, 4).unwrap();
        let a = solid(size, [1, 2, 3]);
        let b = solid(size, [3, 2, 1]);
        let recorder = Recorder(Mutex::new(Vec::new()));
        synthesize(&a, &b, &MorphPlan::SimpleBlend, 5, &recorder).unwrap();

        let reports = recorder.0.into_inner().unwrap();
        assert_eq!(reports.len(), 5);
        for (i, &(current, total, stage)) in reports.iter().enumerate() {
            assert_eq!(current, (i + 1) as u64);
            assert_eq!(total, 5);
            assert_eq!(stage, Stage::Morph);
        }
    }
}
