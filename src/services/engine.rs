use ndarray::Array1;

use crate::{
    error::{AppError, AppResult},
    models::{Dataset, RecommendationItem},
};

use super::model::EmbeddingRecommender;

/// Recommends titles similar to a seed title.
///
/// The seed is resolved by case-insensitive substring match (first match in
/// dataset order wins). Candidates are ranked by model score, the seed itself
/// is excluded by exact title, and at most `top_k` items are returned in
/// descending score order. A non-positive `top_k` yields an empty list.
pub fn recommend(
    dataset: &Dataset,
    model: &EmbeddingRecommender,
    seed_title: &str,
    top_k: i64,
) -> AppResult<Vec<RecommendationItem>> {
    let seed = dataset
        .find_by_title(seed_title)
        .ok_or_else(|| AppError::NotFound(seed_title.to_string()))?;

    if top_k <= 0 {
        return Ok(Vec::new());
    }
    let top_k = usize::try_from(top_k).unwrap_or(usize::MAX);

    let scores = model.predict(seed.features(), dataset.len())?;
    let ranked = top_indices(&scores, top_k.saturating_add(1));

    tracing::debug!(
        seed = %seed.title,
        content_id = seed.content_id,
        candidates = ranked.len(),
        "Ranked recommendation candidates"
    );

    let items = ranked
        .into_iter()
        .filter_map(|id| dataset.get(id))
        .filter(|record| record.title != seed.title)
        .take(top_k)
        .map(RecommendationItem::from)
        .collect();

    Ok(items)
}

/// Ids of the `k` highest scores, best first. Equal scores keep the lower id
/// first. Ordering is total, so a NaN score ranks above every number
/// instead of breaking the sort.
pub fn top_indices(scores: &Array1<f32>, k: usize) -> Vec<usize> {
    let mut ids: Vec<usize> = (0..scores.len()).collect();
    ids.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    ids.truncate(k);
    ids
}
