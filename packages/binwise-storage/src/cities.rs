use sqlx::PgConnection;
use uuid::Uuid;

use crate::{Result, models::City};

pub async fn find_active_by_code(executor: &mut PgConnection, code: &str) -> Result<Option<City>> {
	let row = sqlx::query_as::<_, City>(
		"\
SELECT city_id, code, name_key, is_active, base_city_id
FROM core.city
WHERE code = $1 AND is_active",
	)
	.bind(code)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn list_active_except(executor: &mut PgConnection, city_id: Uuid) -> Result<Vec<City>> {
	let rows = sqlx::query_as::<_, City>(
		"\
SELECT city_id, code, name_key, is_active, base_city_id
FROM core.city
WHERE city_id <> $1 AND is_active
ORDER BY code",
	)
	.bind(city_id)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}
