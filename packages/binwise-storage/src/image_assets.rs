use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
	Result,
	models::{ImageAsset, NewImageAsset},
};

/// Registers an asset by content hash and returns its id; re-registering refreshes the storage key.
pub async fn upsert(executor: &mut PgConnection, asset: &NewImageAsset<'_>) -> Result<Uuid> {
	let image_id = sqlx::query_scalar::<_, Uuid>(
		"\
INSERT INTO core.image_asset (
	storage_key,
	normalized_sha256,
	content_type,
	byte_size,
	width,
	height,
	source
)
VALUES ($1, $2, $3, $4, $5, $6, $7)
ON CONFLICT (normalized_sha256) DO UPDATE
SET storage_key = EXCLUDED.storage_key
RETURNING image_id",
	)
	.bind(asset.storage_key)
	.bind(asset.normalized_sha256)
	.bind(asset.content_type)
	.bind(asset.byte_size)
	.bind(asset.width)
	.bind(asset.height)
	.bind(asset.source)
	.fetch_one(&mut *executor)
	.await?;

	Ok(image_id)
}

pub async fn get_by_sha256(
	executor: &mut PgConnection,
	normalized_sha256: &str,
) -> Result<Option<ImageAsset>> {
	let row = sqlx::query_as::<_, ImageAsset>(
		"\
SELECT
	image_id,
	storage_key,
	normalized_sha256,
	content_type,
	byte_size,
	width,
	height,
	source,
	created_at
FROM core.image_asset
WHERE normalized_sha256 = $1",
	)
	.bind(normalized_sha256)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}
