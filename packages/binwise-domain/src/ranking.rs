use std::{cmp::Ordering, collections::HashMap};

use serde::Serialize;
use uuid::Uuid;

use binwise_config::{
	DEFAULT_MIN_SIMILARITY, DEFAULT_RELEVANCE_WEIGHT, DEFAULT_SIMILARITY_WEIGHT,
	DEFAULT_SUGGESTION_LIMIT, Matching,
};

/// Raw per-item scores as produced by the storage layer.
#[derive(Clone, Debug, PartialEq)]
pub struct SimilarityCandidate {
	pub item_id: Uuid,
	pub label: String,
	/// Trigram similarity of the label against the query, in [0, 1].
	pub similarity: f32,
	/// Full-text relevance of title, description and key against the query.
	pub relevance: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankingParams {
	pub relevance_weight: f32,
	pub similarity_weight: f32,
	pub min_similarity: f32,
	pub limit: usize,
}
impl RankingParams {
	pub fn with_limit(self, limit: usize) -> Self {
		Self { limit, ..self }
	}
}
impl Default for RankingParams {
	fn default() -> Self {
		Self {
			relevance_weight: DEFAULT_RELEVANCE_WEIGHT,
			similarity_weight: DEFAULT_SIMILARITY_WEIGHT,
			min_similarity: DEFAULT_MIN_SIMILARITY,
			limit: DEFAULT_SUGGESTION_LIMIT as usize,
		}
	}
}
impl From<&Matching> for RankingParams {
	fn from(cfg: &Matching) -> Self {
		Self {
			relevance_weight: cfg.relevance_weight,
			similarity_weight: cfg.similarity_weight,
			min_similarity: cfg.min_similarity,
			limit: cfg.suggestion_limit as usize,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedSuggestion {
	pub item_id: Uuid,
	pub label: String,
	pub similarity: f32,
	pub score: f32,
}

pub fn fused_score(params: &RankingParams, relevance: f32, similarity: f32) -> f32 {
	params.relevance_weight * relevance + params.similarity_weight * similarity
}

pub fn rank_candidates(
	candidates: Vec<SimilarityCandidate>,
	params: &RankingParams,
) -> Vec<RankedSuggestion> {
	let mut best_by_item: HashMap<Uuid, RankedSuggestion> = HashMap::new();

	for candidate in candidates {
		if !candidate.relevance.is_finite() || !candidate.similarity.is_finite() {
			continue;
		}
		if candidate.relevance <= 0.0 && candidate.similarity <= params.min_similarity {
			continue;
		}

		let ranked = RankedSuggestion {
			item_id: candidate.item_id,
			score: fused_score(params, candidate.relevance, candidate.similarity),
			similarity: candidate.similarity,
			label: candidate.label,
		};

		let keep_current = best_by_item
			.get(&ranked.item_id)
			.is_some_and(|current| cmp_by_score(current, &ranked) != Ordering::Greater);

		if !keep_current {
			best_by_item.insert(ranked.item_id, ranked);
		}
	}

	let mut best_by_label: HashMap<String, RankedSuggestion> = HashMap::new();

	for ranked in best_by_item.into_values() {
		let label_key = ranked.label.to_lowercase();
		let keep_current = best_by_label
			.get(&label_key)
			.is_some_and(|current| cmp_by_similarity(current, &ranked) != Ordering::Greater);

		if !keep_current {
			best_by_label.insert(label_key, ranked);
		}
	}

	let mut out: Vec<RankedSuggestion> = best_by_label.into_values().collect();

	out.sort_by(cmp_by_score);
	out.truncate(params.limit);

	out
}

// Ascending order means "ranks first"; ties fall through to the item id.
fn cmp_by_score(a: &RankedSuggestion, b: &RankedSuggestion) -> Ordering {
	b.score
		.total_cmp(&a.score)
		.then_with(|| b.similarity.total_cmp(&a.similarity))
		.then_with(|| a.item_id.cmp(&b.item_id))
}

fn cmp_by_similarity(a: &RankedSuggestion, b: &RankedSuggestion) -> Ordering {
	b.similarity
		.total_cmp(&a.similarity)
		.then_with(|| b.score.total_cmp(&a.score))
		.then_with(|| a.item_id.cmp(&b.item_id))
}
