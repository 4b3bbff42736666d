//! Delaunay triangulation over a point set.

use std::collections::HashMap;

use crate::foundation::error::{MorphError, MorphResult};
use crate::geometry::point_set::PointSet;

/// A triangle as an index triple into a point set.
pub type TriangleIndices = [usize; 3];

/// Delaunay triangulation of a point set (Bowyer–Watson insertion).
///
/// Computed once per morph job from the midpoint average of the two
/// boundary-augmented sets; the resulting index triples are reused for both
/// source images and every interpolation step, so triangle topology never
/// changes frame-to-frame.
///
/// Fails with a geometry error for fewer than 3 points or fully collinear
/// input.
pub fn delaunay(points: &PointSet) -> MorphResult<Vec<TriangleIndices>> {
    let pts = points.points();
    if pts.len() < 3 {
        return Err(MorphError::geometry(format!(
            "triangulation needs at least 3 points, got {}",
            pts.len()
        )));
    }

    let verts: Vec<(f64, f64)> = pts.iter().map(|p| (f64::from(p.x), f64::from(p.y))).collect();

    // Super-triangle comfortably enclosing all input points.
    let (min_x, max_x) = min_max(verts.iter().map(|v| v.0));
    let (min_y, max_y) = min_max(verts.iter().map(|v| v.1));
    let span = ((max_x - min_x).max(max_y - min_y)).max(1.0);
    let mid_x = (min_x + max_x) / 2.0;
    let mid_y = (min_y + max_y) / 2.0;

    let n = verts.len();
    let mut all = verts;
    all.push((mid_x - 20.0 * span, mid_y - span));
    all.push((mid_x, mid_y + 20.0 * span));
    all.push((mid_x + 20.0 * span, mid_y - span));

    let mut triangles: Vec<TriangleIndices> = vec![oriented(&all, [n, n + 1, n + 2])];

    for p in 0..n {
        // Skip exact duplicates of already-inserted points; re-inserting a
        // vertex would punch a hole in the triangulation.
        if (0..p).any(|q| all[q] == all[p]) {
            continue;
        }

        let (bad, keep): (Vec<_>, Vec<_>) = triangles
            .into_iter()
            .partition(|t| circumcircle_contains(&all, *t, all[p]));

        // The cavity boundary is every edge used by exactly one bad triangle.
        let mut edge_count: HashMap<(usize, usize), usize> = HashMap::new();
        for t in &bad {
            for e in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
                let key = (e.0.min(e.1), e.0.max(e.1));
                *edge_count.entry(key).or_insert(0) += 1;
            }
        }

        triangles = keep;
        for (&(a, b), &count) in &edge_count {
            if count == 1 && !is_collinear(&all, a, b, p) {
                triangles.push(oriented(&all, [a, b, p]));
            }
        }
    }

    // Drop everything still attached to the super-triangle.
    let result: Vec<TriangleIndices> = triangles
        .into_iter()
        .filter(|t| t.iter().all(|&i| i < n))
        .collect();

    if result.is_empty() {
        return Err(MorphError::geometry(
            "degenerate (collinear) point set produced no triangles",
        ));
    }
    Ok(result)
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn cross(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

fn is_collinear(all: &[(f64, f64)], a: usize, b: usize, c: usize) -> bool {
    cross(all[a], all[b], all[c]).abs() < 1e-9
}

/// Return the triangle with counter-clockwise vertex order.
fn oriented(all: &[(f64, f64)], t: TriangleIndices) -> TriangleIndices {
    if cross(all[t[0]], all[t[1]], all[t[2]]) < 0.0 {
        [t[0], t[2], t[1]]
    } else {
        t
    }
}

/// In-circumcircle predicate for a counter-clockwise triangle.
fn circumcircle_contains(all: &[(f64, f64)], t: TriangleIndices, p: (f64, f64)) -> bool {
    let (ax, ay) = (all[t[0]].0 - p.0, all[t[0]].1 - p.1);
    let (bx, by) = (all[t[1]].0 - p.0, all[t[1]].1 - p.1);
    let (cx, cy) = (all[t[2]].0 - p.0, all[t[2]].1 - p.1);

    let det = (ax * ax + ay * ay) * (bx * cy - cx * by)
        - (bx * bx + by * by) * (ax * cy - cx * ay)
        + (cx * cx + cy * cy) * (ax * by - bx * ay);
    det > 0.0
}
