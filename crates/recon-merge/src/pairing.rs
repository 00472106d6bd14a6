//! Pairing same-named contours across two sides.
//!
//! Names are the matching key, but a record may hold several contours with
//! the same name. Within one name, copies are paired in three passes:
//! identical objects first, then the closest graded overlaps, then whatever
//! is left in declaration order.

use tracing::warn;

use recon_record::Contour;

/// Similarity score with a fallback for contours whose shape cannot be built.
///
/// Degenerate tracings have no area to compare, so they only match a copy
/// with exactly the same stored points and transform.
pub fn similarity(a: &Contour, b: &Contour, threshold: f64) -> f64 {
    match a.overlaps_with(b, threshold) {
        Ok(score) => score,
        Err(e) => {
            warn!(name = a.name(), error = %e, "no usable shape, comparing stored tracings");
            if a.same_trace(b) {
                1.0
            } else {
                0.0
            }
        }
    }
}

pub fn is_same(a: &Contour, b: &Contour, threshold: f64) -> bool {
    similarity(a, b, threshold) == 1.0
}

/// Result of pairing two lists of same-named contours.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pairing {
    /// `(index in a, index in b, score)`, ordered by the index in `a`.
    pub pairs: Vec<(usize, usize, f64)>,
    pub only_a: Vec<usize>,
    pub only_b: Vec<usize>,
}

pub fn pair(a: &[&Contour], b: &[&Contour], threshold: f64) -> Pairing {
    let scores: Vec<Vec<f64>> = a
        .iter()
        .map(|x| b.iter().map(|y| similarity(x, y, threshold)).collect())
        .collect();

    let mut used_a = vec![false; a.len()];
    let mut used_b = vec![false; b.len()];
    let mut pairs = Vec::new();

    for i in 0..a.len() {
        if let Some(j) = (0..b.len()).find(|&j| !used_b[j] && scores[i][j] == 1.0) {
            used_a[i] = true;
            used_b[j] = true;
            pairs.push((i, j, 1.0));
        }
    }

    let mut graded: Vec<(f64, usize, usize)> = Vec::new();
    for (i, row) in scores.iter().enumerate() {
        for (j, &s) in row.iter().enumerate() {
            if !used_a[i] && !used_b[j] && s > 1.0 {
                graded.push((s, i, j));
            }
        }
    }
    graded.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)).then(x.2.cmp(&y.2)));
    for (s, i, j) in graded {
        if !used_a[i] && !used_b[j] {
            used_a[i] = true;
            used_b[j] = true;
            pairs.push((i, j, s));
        }
    }

    let rest_a: Vec<usize> = (0..a.len()).filter(|&i| !used_a[i]).collect();
    let rest_b: Vec<usize> = (0..b.len()).filter(|&j| !used_b[j]).collect();
    let zipped = rest_a.len().min(rest_b.len());
    for (&i, &j) in rest_a.iter().zip(&rest_b) {
        pairs.push((i, j, scores[i][j]));
    }

    pairs.sort_by_key(|&(i, _, _)| i);
    Pairing {
        pairs,
        only_a: rest_a[zipped..].to_vec(),
        only_b: rest_b[zipped..].to_vec(),
    }
}
