//! Area of union and intersection of two polygons.
//!
//! Every vertex abscissa and every abscissa where two edges cross cuts the
//! plane into vertical slabs. Inside a slab no edge starts, ends, or crosses
//! another, so each polygon's cross-section is a fixed set of intervals whose
//! endpoints move linearly with `x`. The covered length is therefore linear
//! across the slab and its integral is the slab width times the length at the
//! slab's midline. Cross-sections use the even-odd rule, which also gives a
//! well-defined answer for self-intersecting tracings.

use std::cmp::Ordering;

use crate::point::Point2;
use crate::shape::Polygon;

type Edge = (Point2, Point2);

/// Union and intersection areas of a polygon pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlapAreas {
    pub union: f64,
    pub intersection: f64,
}

impl OverlapAreas {
    /// `union / intersection`, `None` when the polygons do not overlap.
    pub fn ratio(&self) -> Option<f64> {
        (self.intersection > 0.0).then(|| self.union / self.intersection)
    }
}

/// Compute the exact union and intersection areas of `a` and `b`.
///
/// The result is bit-for-bit symmetric in its arguments.
pub fn overlap_areas(a: &Polygon, b: &Polygon) -> OverlapAreas {
    let (a, b) = if canonical_order(a, b) == Ordering::Greater {
        (b, a)
    } else {
        (a, b)
    };
    let edges_a: Vec<Edge> = a.edges().collect();
    let edges_b: Vec<Edge> = b.edges().collect();

    let mut cuts: Vec<f64> = a
        .vertices()
        .iter()
        .chain(b.vertices())
        .map(|p| p.x)
        .collect();

    let all: Vec<Edge> = edges_a.iter().chain(&edges_b).copied().collect();
    for (i, e) in all.iter().enumerate() {
        for f in &all[i + 1..] {
            if let Some(x) = crossing_x(*e, *f) {
                cuts.push(x);
            }
        }
    }

    cuts.retain(|x| x.is_finite());
    cuts.sort_by(f64::total_cmp);
    cuts.dedup();

    let mut union = 0.0;
    let mut intersection = 0.0;
    let mut spans_a = Vec::new();
    let mut spans_b = Vec::new();

    for w in cuts.windows(2) {
        let width = w[1] - w[0];
        if width <= 0.0 {
            continue;
        }
        let mid = 0.5 * (w[0] + w[1]);
        cross_section(&edges_a, mid, &mut spans_a);
        cross_section(&edges_b, mid, &mut spans_b);

        let len_a = covered(&spans_a);
        let len_b = covered(&spans_b);
        let len_i = shared(&spans_a, &spans_b);

        intersection += width * len_i;
        union += width * (len_a + len_b - len_i);
    }

    OverlapAreas {
        union,
        intersection,
    }
}

/// Total order on vertex sequences so argument order never changes rounding.
fn canonical_order(a: &Polygon, b: &Polygon) -> Ordering {
    let key = |p: &Point2| (p.x, p.y);
    a.vertices()
        .iter()
        .map(key)
        .zip(b.vertices().iter().map(key))
        .map(|((ax, ay), (bx, by))| ax.total_cmp(&bx).then(ay.total_cmp(&by)))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.vertices().len().cmp(&b.vertices().len()))
}

/// Abscissa where two segments meet, if they do. Collinear overlaps are
/// skipped: their extent is bounded by vertices that are already cuts.
fn crossing_x((p, p2): Edge, (q, q2): Edge) -> Option<f64> {
    let r = p2 - p;
    let s = q2 - q;
    let denom = r.cross(s);
    if denom == 0.0 {
        return None;
    }
    let qp = q - p;
    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(p.x + t * r.x)
    } else {
        None
    }
}

/// Even-odd intervals of the vertical line `x = mid` inside the ring.
fn cross_section(edges: &[Edge], mid: f64, spans: &mut Vec<(f64, f64)>) {
    let mut ys: Vec<f64> = edges
        .iter()
        .filter(|(a, b)| (a.x > mid) != (b.x > mid))
        .map(|(a, b)| a.y + (mid - a.x) * (b.y - a.y) / (b.x - a.x))
        .collect();
    ys.sort_by(f64::total_cmp);

    spans.clear();
    spans.extend(ys.chunks_exact(2).map(|c| (c[0], c[1])));
}

fn covered(spans: &[(f64, f64)]) -> f64 {
    spans.iter().map(|(lo, hi)| hi - lo).sum()
}

/// Total length shared by two sorted, disjoint interval lists.
fn shared(a: &[(f64, f64)], b: &[(f64, f64)]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut total = 0.0;
    while i < a.len() && j < b.len() {
        let lo = a[i].0.max(b[j].0);
        let hi = a[i].1.min(b[j].1);
        if hi > lo {
            total += hi - lo;
        }
        if a[i].1 < b[j].1 {
            i += 1;
        } else {
            j += 1;
        }
    }
    total
}
