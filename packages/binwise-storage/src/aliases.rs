use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
	Result,
	models::{ItemAlias, ItemTitle, NewItemAlias},
};

/// Resolves a normalized alias to an item that has rules in the city.
pub async fn match_alias(
	executor: &mut PgConnection,
	alias_norm: &str,
	lang: &str,
	city_id: Uuid,
) -> Result<Option<Uuid>> {
	let item_id = sqlx::query_scalar::<_, Uuid>(
		"\
SELECT i.item_id
FROM core.item_alias a
JOIN core.item i ON i.canonical_key = a.canonical_key
WHERE a.lang = $1
	AND a.alias_norm = $2
	AND EXISTS (
		SELECT 1 FROM core.item_city_category icc
		WHERE icc.item_id = i.item_id AND icc.city_id = $3
		UNION ALL
		SELECT 1 FROM core.item_city_disposal icd
		WHERE icd.item_id = i.item_id AND icd.city_id = $3
	)
LIMIT 1",
	)
	.bind(lang)
	.bind(alias_norm)
	.bind(city_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(item_id)
}

/// Returns `true` when the row was written, `false` when `(lang, alias_norm)` was already taken.
pub async fn insert_if_absent(executor: &mut PgConnection, alias: &NewItemAlias<'_>) -> Result<bool> {
	let inserted = sqlx::query_scalar::<_, i64>(
		"\
INSERT INTO core.item_alias (
	canonical_key,
	lang,
	alias_text,
	alias_norm,
	alias_type,
	source,
	confidence
)
VALUES ($1, $2, $3, $4, $5, $6, $7)
ON CONFLICT (lang, alias_norm) DO NOTHING
RETURNING alias_id",
	)
	.bind(alias.canonical_key)
	.bind(alias.lang)
	.bind(alias.alias_text)
	.bind(alias.alias_norm)
	.bind(alias.alias_type)
	.bind(alias.source)
	.bind(alias.confidence)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(inserted.is_some())
}

pub async fn get(
	executor: &mut PgConnection,
	lang: &str,
	alias_norm: &str,
) -> Result<Option<ItemAlias>> {
	let row = sqlx::query_as::<_, ItemAlias>(
		"\
SELECT alias_id, canonical_key, lang, alias_text, alias_norm, alias_type, source, confidence
FROM core.item_alias
WHERE lang = $1 AND alias_norm = $2",
	)
	.bind(lang)
	.bind(alias_norm)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

/// Every localized item title, optionally restricted to one language.
pub async fn list_item_titles(
	executor: &mut PgConnection,
	lang: Option<&str>,
) -> Result<Vec<ItemTitle>> {
	let rows = sqlx::query_as::<_, ItemTitle>(
		"\
SELECT i.canonical_key, t.lang, t.text AS title
FROM core.item i
JOIN core.i18n_translation t ON t.key = i.title_key
WHERE ($1::text IS NULL OR t.lang = $1)
ORDER BY i.canonical_key, t.lang",
	)
	.bind(lang)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}
