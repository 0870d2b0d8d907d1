//! Catalog rows for database tests. Every helper inserts exactly one row.

use sqlx::PgPool;
use uuid::Uuid;

use crate::Result;

pub async fn city(pool: &PgPool, code: &str, is_active: bool) -> Result<Uuid> {
	let city_id = sqlx::query_scalar::<_, Uuid>(
		"INSERT INTO core.city (code, name_key, is_active) VALUES ($1, $2, $3) RETURNING city_id",
	)
	.bind(code)
	.bind(format!("city.{code}"))
	.bind(is_active)
	.fetch_one(pool)
	.await?;

	Ok(city_id)
}

pub async fn translation(pool: &PgPool, key: &str, lang: &str, text: &str) -> Result<()> {
	sqlx::query("INSERT INTO core.i18n_translation (key, lang, text) VALUES ($1, $2, $3)")
		.bind(key)
		.bind(lang)
		.bind(text)
		.execute(pool)
		.await?;

	Ok(())
}

/// Inserts an item whose title key is `item.<canonical_key>.title`.
pub async fn item(pool: &PgPool, canonical_key: &str) -> Result<Uuid> {
	let item_id = sqlx::query_scalar::<_, Uuid>(
		"INSERT INTO core.item (canonical_key, title_key) VALUES ($1, $2) RETURNING item_id",
	)
	.bind(canonical_key)
	.bind(title_key(canonical_key))
	.fetch_one(pool)
	.await?;

	Ok(item_id)
}

pub fn title_key(canonical_key: &str) -> String {
	format!("item.{canonical_key}.title")
}

pub async fn category(pool: &PgPool, code: &str) -> Result<Uuid> {
	let category_id = sqlx::query_scalar::<_, Uuid>(
		"INSERT INTO core.category (code, name_key) VALUES ($1, $2) RETURNING category_id",
	)
	.bind(code)
	.bind(format!("category.{code}"))
	.fetch_one(pool)
	.await?;

	Ok(category_id)
}

pub async fn disposal(pool: &PgPool, code: &str) -> Result<Uuid> {
	let disposal_id = sqlx::query_scalar::<_, Uuid>(
		"INSERT INTO core.disposal_method (code, name_key) VALUES ($1, $2) RETURNING disposal_id",
	)
	.bind(code)
	.bind(format!("disposal.{code}"))
	.fetch_one(pool)
	.await?;

	Ok(disposal_id)
}

pub async fn warning(pool: &PgPool, code: &str, severity: i16) -> Result<Uuid> {
	let warning_id = sqlx::query_scalar::<_, Uuid>(
		"\
INSERT INTO core.warning (code, title_key, severity)
VALUES ($1, $2, $3)
RETURNING warning_id",
	)
	.bind(code)
	.bind(format!("warning.{code}.title"))
	.bind(severity)
	.fetch_one(pool)
	.await?;

	Ok(warning_id)
}

pub async fn assign_category(
	pool: &PgPool,
	city_id: Uuid,
	item_id: Uuid,
	category_id: Uuid,
	priority: i32,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO core.item_city_category (city_id, item_id, category_id, priority)
VALUES ($1, $2, $3, $4)",
	)
	.bind(city_id)
	.bind(item_id)
	.bind(category_id)
	.bind(priority)
	.execute(pool)
	.await?;

	Ok(())
}

pub async fn assign_disposal(
	pool: &PgPool,
	city_id: Uuid,
	item_id: Uuid,
	disposal_id: Uuid,
	priority: i32,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO core.item_city_disposal (city_id, item_id, disposal_id, priority)
VALUES ($1, $2, $3, $4)",
	)
	.bind(city_id)
	.bind(item_id)
	.bind(disposal_id)
	.bind(priority)
	.execute(pool)
	.await?;

	Ok(())
}

pub async fn assign_warning(
	pool: &PgPool,
	city_id: Uuid,
	item_id: Uuid,
	warning_id: Uuid,
	priority: i32,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO core.item_city_warning (city_id, item_id, warning_id, priority)
VALUES ($1, $2, $3, $4)",
	)
	.bind(city_id)
	.bind(item_id)
	.bind(warning_id)
	.bind(priority)
	.execute(pool)
	.await?;

	Ok(())
}

pub async fn text_override(
	pool: &PgPool,
	city_id: Uuid,
	item_id: Uuid,
	title_key: Option<&str>,
	desc_key: Option<&str>,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO core.item_city_text_override (city_id, item_id, title_key, desc_key)
VALUES ($1, $2, $3, $4)",
	)
	.bind(city_id)
	.bind(item_id)
	.bind(title_key)
	.bind(desc_key)
	.execute(pool)
	.await?;

	Ok(())
}

pub async fn alias(
	pool: &PgPool,
	canonical_key: &str,
	lang: &str,
	alias_text: &str,
	alias_norm: &str,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO core.item_alias (canonical_key, lang, alias_text, alias_norm, alias_type, confidence)
VALUES ($1, $2, $3, $4, 'primary', 1.0)",
	)
	.bind(canonical_key)
	.bind(lang)
	.bind(alias_text)
	.bind(alias_norm)
	.execute(pool)
	.await?;

	Ok(())
}

pub async fn count(pool: &PgPool, table: &str) -> Result<i64> {
	let sql = format!("SELECT count(*) FROM core.{table}");
	let count = sqlx::query_scalar::<_, i64>(sql.as_str()).fetch_one(pool).await?;

	Ok(count)
}
