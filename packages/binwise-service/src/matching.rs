use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{Result, rules::RuleEntry};
use binwise_domain::{
	normalize::normalize,
	ranking::{self, RankedSuggestion, RankingParams, SimilarityCandidate},
};
use binwise_storage::{aliases, items};

/// A ranked alternative together with its own rules in the same city.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Suggestion {
	pub item_id: Uuid,
	pub label: String,
	pub similarity: f32,
	pub score: f32,
	pub categories: Vec<RuleEntry>,
	pub disposals: Vec<RuleEntry>,
}

/// Alias tier. Blank or all-punctuation text never matches.
pub async fn match_alias(
	executor: &mut PgConnection,
	text: &str,
	lang: &str,
	city_id: Uuid,
) -> Result<Option<Uuid>> {
	let alias_norm = normalize(text);

	if alias_norm.is_empty() {
		return Ok(None);
	}

	Ok(aliases::match_alias(executor, &alias_norm, lang, city_id).await?)
}

/// Tries each label in order and returns the first alias hit.
pub async fn match_any_alias(
	executor: &mut PgConnection,
	labels: &[String],
	lang: &str,
	city_id: Uuid,
) -> Result<Option<Uuid>> {
	for label in labels {
		if let Some(item_id) = match_alias(executor, label, lang, city_id).await? {
			return Ok(Some(item_id));
		}
	}

	Ok(None)
}

/// Name tier: exact case-insensitive title in `lang`, then canonical key.
pub async fn match_name(
	executor: &mut PgConnection,
	text: &str,
	lang: &str,
	city_id: Uuid,
) -> Result<Option<Uuid>> {
	let name = text.trim();

	if name.is_empty() {
		return Ok(None);
	}

	Ok(items::match_name(executor, name, lang, city_id).await?)
}

/// Alias tier first, then name tier.
pub async fn match_text(
	executor: &mut PgConnection,
	text: &str,
	lang: &str,
	city_id: Uuid,
) -> Result<Option<Uuid>> {
	if let Some(item_id) = match_alias(executor, text, lang, city_id).await? {
		return Ok(Some(item_id));
	}

	match_name(executor, text, lang, city_id).await
}

pub async fn rank_similar(
	executor: &mut PgConnection,
	params: &RankingParams,
	query: &str,
	lang: &str,
	city_id: Uuid,
	exclude_item_id: Option<Uuid>,
) -> Result<Vec<RankedSuggestion>> {
	let query = query.trim();

	if query.is_empty() || params.limit == 0 {
		return Ok(Vec::new());
	}

	let candidates = items::similarity_candidates(
		executor,
		query,
		lang,
		city_id,
		exclude_item_id,
		params.min_similarity,
	)
	.await?
	.into_iter()
	.map(|row| SimilarityCandidate {
		item_id: row.item_id,
		label: row.label,
		similarity: row.similarity,
		relevance: row.relevance,
	})
	.collect();

	Ok(ranking::rank_candidates(candidates, params))
}

/// [`rank_similar`] enriched with each suggestion's categories and disposals.
pub async fn suggest(
	executor: &mut PgConnection,
	params: &RankingParams,
	query: &str,
	lang: &str,
	city_id: Uuid,
	exclude_item_id: Option<Uuid>,
) -> Result<Vec<Suggestion>> {
	let ranked = rank_similar(executor, params, query, lang, city_id, exclude_item_id).await?;
	let mut out = Vec::with_capacity(ranked.len());

	for suggestion in ranked {
		let (categories, disposals) =
			crate::rules::load_labels(executor, city_id, suggestion.item_id, lang).await?;

		out.push(Suggestion {
			item_id: suggestion.item_id,
			label: suggestion.label,
			similarity: suggestion.similarity,
			score: suggestion.score,
			categories,
			disposals,
		});
	}

	Ok(out)
}
