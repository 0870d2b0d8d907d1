use sqlx::PgConnection;

use crate::{
	Error, Result,
	models::{NewVisionCacheEntry, VisionCacheEntry},
};

/// Returns the entry for `cache_key` unless it is missing or expired.
pub async fn get_live(
	executor: &mut PgConnection,
	cache_key: &str,
) -> Result<Option<VisionCacheEntry>> {
	let row = sqlx::query_as::<_, VisionCacheEntry>(
		"\
SELECT
	cache_key,
	image_id,
	canonical_key,
	confidence,
	labels,
	notes,
	created_at,
	expires_at
FROM core.vision_cache
WHERE cache_key = $1 AND expires_at > now()",
	)
	.bind(cache_key)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

/// Replaces the verdict for `cache_key`; an absent image id keeps the previously stored one.
pub async fn upsert(
	executor: &mut PgConnection,
	entry: &NewVisionCacheEntry<'_>,
	ttl_days: i64,
) -> Result<()> {
	if ttl_days <= 0 {
		return Err(Error::InvalidTtl { ttl_days });
	}

	sqlx::query(
		"\
INSERT INTO core.vision_cache (
	cache_key,
	image_id,
	canonical_key,
	confidence,
	labels,
	notes,
	created_at,
	expires_at
)
VALUES ($1, $2, $3, $4, $5, $6, now(), now() + make_interval(days => $7::int))
ON CONFLICT (cache_key) DO UPDATE
SET
	image_id = COALESCE(EXCLUDED.image_id, core.vision_cache.image_id),
	canonical_key = EXCLUDED.canonical_key,
	confidence = EXCLUDED.confidence,
	labels = EXCLUDED.labels,
	notes = EXCLUDED.notes,
	expires_at = EXCLUDED.expires_at",
	)
	.bind(entry.cache_key)
	.bind(entry.image_id)
	.bind(entry.canonical_key)
	.bind(entry.confidence)
	.bind(entry.labels)
	.bind(entry.notes)
	.bind(i32::try_from(ttl_days).unwrap_or(i32::MAX))
	.execute(&mut *executor)
	.await?;

	Ok(())
}
