use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{NewProspect, Prospect},
};

pub const STATUS_PENDING: &str = "pending";

/// Writes a pending gap record unless one already exists for the same natural key.
///
/// Returns `true` only when this call created the row.
pub async fn insert_if_absent(executor: &mut PgConnection, prospect: &NewProspect<'_>) -> Result<bool> {
	if prospect.item_id.is_none() && prospect.search_norm.is_none_or(str::is_empty) {
		return Err(Error::ProspectWithoutKey);
	}

	let created = sqlx::query_scalar::<_, Uuid>(
		"\
INSERT INTO core.prospect (item_id, city_id, lang, status, reason, search_text, search_norm)
VALUES ($1, $2, $3, $4, $5, $6, $7)
ON CONFLICT DO NOTHING
RETURNING prospect_id",
	)
	.bind(prospect.item_id)
	.bind(prospect.city_id)
	.bind(prospect.lang)
	.bind(STATUS_PENDING)
	.bind(prospect.reason)
	.bind(prospect.search_text)
	.bind(prospect.search_norm)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(created.is_some())
}

pub async fn find_id_for_item(
	executor: &mut PgConnection,
	item_id: Uuid,
	city_id: Uuid,
	lang: &str,
) -> Result<Option<Uuid>> {
	let prospect_id = sqlx::query_scalar::<_, Uuid>(
		"\
SELECT prospect_id
FROM core.prospect
WHERE item_id = $1 AND city_id = $2 AND lang = $3",
	)
	.bind(item_id)
	.bind(city_id)
	.bind(lang)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(prospect_id)
}

pub async fn find_id_for_search(
	executor: &mut PgConnection,
	search_norm: &str,
	city_id: Uuid,
	lang: &str,
) -> Result<Option<Uuid>> {
	let prospect_id = sqlx::query_scalar::<_, Uuid>(
		"\
SELECT prospect_id
FROM core.prospect
WHERE item_id IS NULL AND search_norm = $1 AND city_id = $2 AND lang = $3",
	)
	.bind(search_norm)
	.bind(city_id)
	.bind(lang)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(prospect_id)
}

pub async fn list_for_city(
	executor: &mut PgConnection,
	city_id: Uuid,
	lang: &str,
) -> Result<Vec<Prospect>> {
	let rows = sqlx::query_as::<_, Prospect>(
		"\
SELECT
	prospect_id,
	item_id,
	city_id,
	lang,
	status,
	reason,
	search_text,
	search_norm,
	created_at
FROM core.prospect
WHERE city_id = $1 AND lang = $2
ORDER BY created_at ASC, prospect_id ASC",
	)
	.bind(city_id)
	.bind(lang)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}
