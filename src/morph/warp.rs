//! Piecewise-affine triangle warping.

use crate::foundation::core::FramePlanes;
use crate::geometry::{affine_from_triangles, transform_point, Point2};

/// Subdivision factor for the anti-aliased coverage mask (4x4 subsamples per
/// pixel, 16 coverage levels at triangle edges).
const AA_GRID: u32 = 4;

/// Warp the content of one source triangle into a destination triangle.
///
/// The destination bounding rectangle is scanned; each pixel's coverage is
/// estimated by supersampled half-plane tests, its position inverse-mapped
/// into the source under the unique affine transform taking `tri_dst` to
/// `tri_src`, and the bilinearly sampled color composited over the existing
/// destination content:
///
/// `dst = dst * (1 - coverage) + sample * coverage`
///
/// Mask compositing (rather than additive accumulation) keeps shared edges
/// between adjacent triangles seam-free. Degenerate destination triangles
/// contribute nothing.
pub fn warp_triangle(
    src: &FramePlanes,
    dst: &mut FramePlanes,
    tri_src: &[Point2; 3],
    tri_dst: &[Point2; 3],
) {
    // Inverse map: destination pixel -> source position.
    let Some(to_src) = affine_from_triangles(tri_dst, tri_src) else {
        return;
    };

    let tri = orient_ccw(tri_dst);

    let min_x = tri.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
    let max_x = tri.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
    let min_y = tri.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    let max_y = tri.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);

    let x0 = (min_x.floor().max(0.0)) as u32;
    let y0 = (min_y.floor().max(0.0)) as u32;
    let x1 = (max_x.ceil() as i64).clamp(0, i64::from(dst.width) - 1) as u32;
    let y1 = (max_y.ceil() as i64).clamp(0, i64::from(dst.height) - 1) as u32;

    let clamp_max = ((dst.width - 1) as f32, (dst.height - 1) as f32);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let coverage = pixel_coverage(&tri, x as f32, y as f32, clamp_max);
            if coverage <= 0.0 {
                continue;
            }

            let (u, v) = transform_point(x as f32, y as f32, &to_src);
            let sample = sample_bilinear(src, u, v);

            let prev = dst.pixel(x, y);
            dst.set_pixel(
                x,
                y,
                [
                    prev[0] * (1.0 - coverage) + sample[0] * coverage,
                    prev[1] * (1.0 - coverage) + sample[1] * coverage,
                    prev[2] * (1.0 - coverage) + sample[2] * coverage,
                ],
            );
        }
    }
}

/// Fraction of a pixel (centered on `cx`, `cy`) covered by the triangle.
///
/// Subsamples are clamped into the frame domain before testing: the
/// triangulation tiles exactly `[0, w-1] x [0, h-1]`, so the part of a border
/// pixel that hangs outside the frame belongs to the triangle whose edge runs
/// along the border.
fn pixel_coverage(tri: &[Point2; 3], cx: f32, cy: f32, clamp_max: (f32, f32)) -> f32 {
    let step = 1.0 / AA_GRID as f32;
    let mut hits = 0u32;
    for sy in 0..AA_GRID {
        for sx in 0..AA_GRID {
            let px = (cx - 0.5 + (sx as f32 + 0.5) * step).clamp(0.0, clamp_max.0);
            let py = (cy - 0.5 + (sy as f32 + 0.5) * step).clamp(0.0, clamp_max.1);
            if point_in_ccw_triangle(tri, px, py) {
                hits += 1;
            }
        }
    }
    hits as f32 / (AA_GRID * AA_GRID) as f32
}

fn orient_ccw(tri: &[Point2; 3]) -> [Point2; 3] {
    let signed = (tri[1].x - tri[0].x) * (tri[2].y - tri[0].y)
        - (tri[2].x - tri[0].x) * (tri[1].y - tri[0].y);
    if signed < 0.0 {
        [tri[0], tri[2], tri[1]]
    } else {
        *tri
    }
}

fn point_in_ccw_triangle(tri: &[Point2; 3], px: f32, py: f32) -> bool {
    for i in 0..3 {
        let a = tri[i];
        let b = tri[(i + 1) % 3];
        if (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x) < 0.0 {
            return false;
        }
    }
    true
}

/// Bilinear sample with border-clamped coordinates.
fn sample_bilinear(src: &FramePlanes, u: f32, v: f32) -> [f32; 3] {
    let max_x = (src.width - 1) as f32;
    let max_y = (src.height - 1) as f32;
    let u = u.clamp(0.0, max_x);
    let v = v.clamp(0.0, max_y);

    let iu0 = u.floor() as u32;
    let iv0 = v.floor() as u32;
    let iu1 = (iu0 + 1).min(src.width - 1);
    let iv1 = (iv0 + 1).min(src.height - 1);

    let frac_u = u - iu0 as f32;
    let frac_v = v - iv0 as f32;

    let w00 = (1.0 - frac_u) * (1.0 - frac_v);
    let w01 = frac_u * (1.0 - frac_v);
    let w10 = (1.0 - frac_u) * frac_v;
    let w11 = frac_u * frac_v;

    let p00 = src.pixel(iu0, iv0);
    let p01 = src.pixel(iu1, iv0);
    let p10 = src.pixel(iu0, iv1);
    let p11 = src.pixel(iu1, iv1);

    [
        p00[0] * w00 + p01[0] * w01 + p10[0] * w10 + p11[0] * w11,
        p00[1] * w00 + p01[1] * w01 + p10[1] * w10 + p11[1] * w11,
        p00[2] * w00 + p01[2] * w01 + p10[2] * w10 + p11[2] * w11,
    ]
}
