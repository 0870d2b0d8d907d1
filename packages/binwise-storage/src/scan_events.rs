use sqlx::PgConnection;
use uuid::Uuid;

use crate::{Result, models::NewScanEvent};

pub async fn insert(executor: &mut PgConnection, event: &NewScanEvent<'_>) -> Result<Uuid> {
	let scan_id = sqlx::query_scalar::<_, Uuid>(
		"\
INSERT INTO core.scan_event (
	image_id,
	cache_key,
	city_id,
	item_id,
	prospect_id,
	search_text,
	source
)
VALUES ($1, $2, $3, $4, $5, $6, $7)
RETURNING scan_id",
	)
	.bind(event.image_id)
	.bind(event.cache_key)
	.bind(event.city_id)
	.bind(event.item_id)
	.bind(event.prospect_id)
	.bind(event.search_text)
	.bind(event.source)
	.fetch_one(&mut *executor)
	.await?;

	Ok(scan_id)
}

pub async fn count_for_image(executor: &mut PgConnection, image_id: Uuid) -> Result<i64> {
	let count =
		sqlx::query_scalar::<_, i64>("SELECT count(*) FROM core.scan_event WHERE image_id = $1")
			.bind(image_id)
			.fetch_one(&mut *executor)
			.await?;

	Ok(count)
}
