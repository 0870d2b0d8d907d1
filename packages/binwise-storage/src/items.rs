use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
	Result,
	models::{Item, ItemTextOverride, SimilarityRow},
};

pub async fn get_by_id(executor: &mut PgConnection, item_id: Uuid) -> Result<Option<Item>> {
	let row = sqlx::query_as::<_, Item>(
		"\
SELECT item_id, canonical_key, title_key, desc_key, primary_image_id, is_active
FROM core.item
WHERE item_id = $1",
	)
	.bind(item_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn find_id_by_canonical_key(
	executor: &mut PgConnection,
	canonical_key: &str,
) -> Result<Option<Uuid>> {
	let item_id =
		sqlx::query_scalar::<_, Uuid>("SELECT item_id FROM core.item WHERE canonical_key = $1")
			.bind(canonical_key)
			.fetch_optional(&mut *executor)
			.await?;

	Ok(item_id)
}

pub async fn get_text_override(
	executor: &mut PgConnection,
	city_id: Uuid,
	item_id: Uuid,
) -> Result<Option<ItemTextOverride>> {
	let row = sqlx::query_as::<_, ItemTextOverride>(
		"\
SELECT title_key, desc_key
FROM core.item_city_text_override
WHERE city_id = $1 AND item_id = $2",
	)
	.bind(city_id)
	.bind(item_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

/// Case-insensitive exact match on the localized title first, then on the canonical key.
///
/// Only items with at least one category or disposal assignment in the city are eligible.
pub async fn match_name(
	executor: &mut PgConnection,
	name: &str,
	lang: &str,
	city_id: Uuid,
) -> Result<Option<Uuid>> {
	let item_id = sqlx::query_scalar::<_, Uuid>(
		"\
WITH candidates AS (
	SELECT i.item_id, 0 AS priority
	FROM core.item i
	JOIN core.i18n_translation t ON t.key = i.title_key AND t.lang = $2
	WHERE lower(t.text) = lower($1)
	UNION ALL
	SELECT i.item_id, 1 AS priority
	FROM core.item i
	WHERE lower(i.canonical_key) = lower($1)
)
SELECT c.item_id
FROM candidates c
WHERE EXISTS (
	SELECT 1 FROM core.item_city_category icc
	WHERE icc.item_id = c.item_id AND icc.city_id = $3
	UNION ALL
	SELECT 1 FROM core.item_city_disposal icd
	WHERE icd.item_id = c.item_id AND icd.city_id = $3
)
ORDER BY c.priority ASC, c.item_id ASC
LIMIT 1",
	)
	.bind(name.trim())
	.bind(lang)
	.bind(city_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(item_id)
}

pub async fn has_city_rules(executor: &mut PgConnection, city_id: Uuid, item_id: Uuid) -> Result<bool> {
	let exists = sqlx::query_scalar::<_, bool>(
		"\
SELECT EXISTS (
	SELECT 1 FROM core.item_city_category
	WHERE city_id = $1 AND item_id = $2
	UNION ALL
	SELECT 1 FROM core.item_city_disposal
	WHERE city_id = $1 AND item_id = $2
)",
	)
	.bind(city_id)
	.bind(item_id)
	.fetch_one(&mut *executor)
	.await?;

	Ok(exists)
}

/// Raw similarity and relevance scores for every item with rules in the city.
///
/// Rows with no relevance and similarity at or below `min_similarity` are dropped here; fusion,
/// deduplication and ordering happen in the domain ranker.
pub async fn similarity_candidates(
	executor: &mut PgConnection,
	query: &str,
	lang: &str,
	city_id: Uuid,
	exclude_item_id: Option<Uuid>,
	min_similarity: f32,
) -> Result<Vec<SimilarityRow>> {
	let rows = sqlx::query_as::<_, SimilarityRow>(
		"\
WITH candidates AS (
	SELECT
		i.item_id,
		COALESCE(tt.text, i.canonical_key) AS label,
		similarity(COALESCE(tt.text, i.canonical_key), $1) AS similarity,
		ts_rank(
			to_tsvector(
				'simple',
				concat_ws(' ', COALESCE(tt.text, ''), COALESCE(td.text, ''), i.canonical_key)
			),
			plainto_tsquery('simple', $1)
		) AS relevance
	FROM core.item i
	LEFT JOIN core.i18n_translation tt ON tt.key = i.title_key AND tt.lang = $2
	LEFT JOIN core.i18n_translation td ON td.key = i.desc_key AND td.lang = $2
	WHERE ($4::uuid IS NULL OR i.item_id <> $4)
		AND EXISTS (
			SELECT 1 FROM core.item_city_category icc
			WHERE icc.item_id = i.item_id AND icc.city_id = $3
			UNION ALL
			SELECT 1 FROM core.item_city_disposal icd
			WHERE icd.item_id = i.item_id AND icd.city_id = $3
		)
)
SELECT item_id, label, similarity, relevance
FROM candidates
WHERE relevance > 0 OR similarity > $5",
	)
	.bind(query)
	.bind(lang)
	.bind(city_id)
	.bind(exclude_item_id)
	.bind(min_similarity)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}
