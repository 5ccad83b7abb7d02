//! Exact cosine ranking over an [`EmbeddingMatrix`].

use locscout_common::{LocScoutError, Result};
use ndarray::{ArrayView1, Axis};
use serde::Serialize;
use std::cmp::Ordering;

use crate::store::EmbeddingMatrix;

/// A matrix row and its similarity to the query
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub index: usize,
    pub score: f32,
}

impl ScoredCandidate {
    pub fn new(index: usize, score: f32) -> Self {
        Self { index, score }
    }
}

/// Score descending, then row index ascending
fn rank_order(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.index.cmp(&b.index))
}

/// Cosine similarity; degenerate inputs (zero norm, non-finite result) score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    cosine_view(ArrayView1::from(a), ArrayView1::from(b))
}

fn cosine_view(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    finite_ratio(a.dot(&b), norm_a * norm_b)
}

fn finite_ratio(dot: f32, denom: f32) -> f32 {
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    let sim = dot / denom;
    if sim.is_finite() {
        // `+ 0.0` folds -0.0 into 0.0 so ties compare equal
        sim + 0.0
    } else {
        0.0
    }
}

/// Reject request limits no ranking can satisfy
pub fn check_limits(top_k: usize, threshold: f32) -> Result<()> {
    if top_k == 0 {
        return Err(LocScoutError::invalid_query("top_k must be at least 1"));
    }
    if !threshold.is_finite() || !(-1.0..=1.0).contains(&threshold) {
        return Err(LocScoutError::invalid_query(format!(
            "threshold {} is outside [-1, 1]",
            threshold
        )));
    }
    Ok(())
}

fn check_dimension(matrix: &EmbeddingMatrix, query: &[f32]) -> Result<()> {
    if query.len() != matrix.dim() {
        return Err(LocScoutError::invalid_query(format!(
            "Query dimension {} does not match category dimension {}",
            query.len(),
            matrix.dim()
        )));
    }
    Ok(())
}

/// Cosine score of every row, in row order
fn row_scores(matrix: &EmbeddingMatrix, query: &[f32]) -> Vec<f32> {
    let query = ArrayView1::from(query);
    let query_norm = query.dot(&query).sqrt();

    matrix
        .as_array()
        .axis_iter(Axis(0))
        .map(|row| {
            let row_norm = row.dot(&row).sqrt();
            finite_ratio(row.dot(&query), row_norm * query_norm)
        })
        .collect()
}

/// Keep the best `top_k`, ordered, then drop those below `threshold`
fn select(mut scored: Vec<ScoredCandidate>, top_k: usize, threshold: f32) -> Vec<ScoredCandidate> {
    if top_k < scored.len() {
        scored.select_nth_unstable_by(top_k - 1, rank_order);
        scored.truncate(top_k);
    }
    scored.sort_unstable_by(rank_order);
    scored.retain(|c| c.score >= threshold);
    scored
}

/// Rank every row of `matrix` against `query`
///
/// Selects the `top_k` best rows first and only then drops those scoring
/// below `threshold`, so the result is always a prefix-ordered subset of the
/// unfiltered top-k.
pub fn rank(
    matrix: &EmbeddingMatrix,
    query: &[f32],
    top_k: usize,
    threshold: f32,
) -> Result<Vec<ScoredCandidate>> {
    check_dimension(matrix, query)?;
    check_limits(top_k, threshold)?;

    let scored = row_scores(matrix, query)
        .into_iter()
        .enumerate()
        .map(|(index, score)| ScoredCandidate::new(index, score))
        .collect();

    Ok(select(scored, top_k, threshold))
}

/// Rank rows by a weighted sum of per-matrix cosine scores
///
/// Every matrix must share the query's dimension and the same row count.
/// Selection and threshold follow [`rank`].
pub fn rank_weighted(
    matrices: &[(&EmbeddingMatrix, f32)],
    query: &[f32],
    top_k: usize,
    threshold: f32,
) -> Result<Vec<ScoredCandidate>> {
    let Some((first, _)) = matrices.first() else {
        return Err(LocScoutError::invalid_query("No matrices to rank"));
    };
    for (matrix, weight) in matrices {
        check_dimension(matrix, query)?;
        if matrix.rows() != first.rows() {
            return Err(LocScoutError::internal(format!(
                "Weighted matrices disagree on rows: {} vs {}",
                matrix.rows(),
                first.rows()
            )));
        }
        if !weight.is_finite() {
            return Err(LocScoutError::invalid_query(format!("weight {} is not finite", weight)));
        }
    }
    check_limits(top_k, threshold)?;

    let mut combined = vec![0.0f32; first.rows()];
    for (matrix, weight) in matrices {
        for (total, score) in combined.iter_mut().zip(row_scores(matrix, query)) {
            *total += score * weight;
        }
    }

    let scored = combined
        .into_iter()
        .enumerate()
        .map(|(index, score)| ScoredCandidate::new(index, finite_ratio(score, 1.0)))
        .collect();

    Ok(select(scored, top_k, threshold))
}
