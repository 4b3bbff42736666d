//! Affine transforms between triangles.

use crate::geometry::point_set::Point2;

/// A 2x3 affine transform `[a, b, c, d, e, f]` mapping
/// `(x, y) -> (a*x + b*y + c, d*x + e*y + f)`.
pub type Affine2x3 = [f32; 6];

/// Solve the unique affine transform taking `src[i]` to `dst[i]` for three
/// point pairs.
///
/// Returns `None` when the source triangle is degenerate (collinear points).
pub fn affine_from_triangles(src: &[Point2; 3], dst: &[Point2; 3]) -> Option<Affine2x3> {
    let det = (src[1].x - src[0].x) * (src[2].y - src[0].y)
        - (src[2].x - src[0].x) * (src[1].y - src[0].y);
    if det.abs() < 1e-8 {
        return None;
    }
    let inv_det = 1.0 / det;

    // Cramer's rule on the two row systems sharing the same source matrix.
    let (u0, u1, u2) = (dst[0].x, dst[1].x, dst[2].x);
    let (v0, v1, v2) = (dst[0].y, dst[1].y, dst[2].y);
    let (du1, du2) = (u1 - u0, u2 - u0);
    let (dv1, dv2) = (v1 - v0, v2 - v0);
    let (sx1, sx2) = (src[1].x - src[0].x, src[2].x - src[0].x);
    let (sy1, sy2) = (src[1].y - src[0].y, src[2].y - src[0].y);

    let a = (du1 * sy2 - du2 * sy1) * inv_det;
    let b = (du2 * sx1 - du1 * sx2) * inv_det;
    let c = u0 - a * src[0].x - b * src[0].y;
    let d = (dv1 * sy2 - dv2 * sy1) * inv_det;
    let e = (dv2 * sx1 - dv1 * sx2) * inv_det;
    let f = v0 - d * src[0].x - e * src[0].y;

    Some([a, b, c, d, e, f])
}

/// Invert a 2x3 affine transform.
///
/// A zero determinant yields the zero transform, matching the OpenCV
/// convention used by the affine warping it grounds.
pub fn invert_affine(m: &Affine2x3) -> Affine2x3 {
    let (a, b, c, d, e, f) = (m[0], m[1], m[2], m[3], m[4], m[5]);

    let determinant = a * e - b * d;
    let inv_determinant = if determinant != 0.0 {
        1.0 / determinant
    } else {
        0.0
    };

    let new_a = e * inv_determinant;
    let new_b = -b * inv_determinant;
    let new_d = -d * inv_determinant;
    let new_e = a * inv_determinant;
    let new_c = -(new_a * c + new_b * f);
    let new_f = -(new_d * c + new_e * f);

    [new_a, new_b, new_c, new_d, new_e, new_f]
}

/// Apply an affine transform to a point.
pub fn transform_point(x: f32, y: f32, m: &Affine2x3) -> (f32, f32) {
    let u = m[0] * x + m[1] * y + m[2];
    let v = m[3] * x + m[4] * y + m[5];
    (u, v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(points: [(f32, f32); 3]) -> [Point2; 3] {
        [
            Point2::new(points[0].0, points[0].1),
            Point2::new(points[1].0, points[1].1),
            Point2::new(points[2].0, points[2].1),
        ]
    }

    #[test]
    fn identity_when_triangles_match() {
        let t = tri([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
        let m = affine_from_triangles(&t, &t).unwrap();
        let (u, v) = transform_point(3.0, 7.0, &m);
        assert!((u - 3.0).abs() < 1e-4 && (v - 7.0).abs() < 1e-4);
    }

    #[test]
    fn maps_vertices_exactly() {
        let src = tri([(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)]);
        let dst = tri([(1.0, 2.0), (9.0, 3.0), (2.0, 10.0)]);
        let m = affine_from_triangles(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(&dst) {
            let (u, v) = transform_point(s.x, s.y, &m);
            assert!((u - d.x).abs() < 1e-3, "u={u} vs {}", d.x);
            assert!((v - d.y).abs() < 1e-3, "v={v} vs {}", d.y);
        }
    }

    #[test]
    fn degenerate_source_is_rejected() {
        let src = tri([(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        let dst = tri([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        assert!(affine_from_triangles(&src, &dst).is_none());
    }

    #[test]
    fn inverse_composes_to_identity() {
        let src = tri([(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)]);
        let dst = tri([(1.0, 2.0), (9.0, 3.0), (2.0, 10.0)]);
        let m = affine_from_triangles(&src, &dst).unwrap();
        let inv = invert_affine(&m);
        let (u, v) = transform_point(3.0, 1.0, &m);
        let (x, y) = transform_point(u, v, &inv);
        assert!((x - 3.0).abs() < 1e-3 && (y - 1.0).abs() < 1e-3);
    }
}
