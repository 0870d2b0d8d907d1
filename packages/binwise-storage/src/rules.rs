use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
	Result,
	models::{RuleLabel, WarningRule},
};

pub async fn list_categories(
	executor: &mut PgConnection,
	city_id: Uuid,
	item_id: Uuid,
	lang: &str,
) -> Result<Vec<RuleLabel>> {
	let rows = sqlx::query_as::<_, RuleLabel>(
		"\
SELECT c.code, t.text AS label
FROM core.item_city_category icc
JOIN core.category c ON c.category_id = icc.category_id
LEFT JOIN core.i18n_translation t ON t.key = c.name_key AND t.lang = $3
WHERE icc.city_id = $1 AND icc.item_id = $2
ORDER BY icc.priority ASC, c.code ASC",
	)
	.bind(city_id)
	.bind(item_id)
	.bind(lang)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

pub async fn list_disposals(
	executor: &mut PgConnection,
	city_id: Uuid,
	item_id: Uuid,
	lang: &str,
) -> Result<Vec<RuleLabel>> {
	let rows = sqlx::query_as::<_, RuleLabel>(
		"\
SELECT d.code, t.text AS label
FROM core.item_city_disposal icd
JOIN core.disposal_method d ON d.disposal_id = icd.disposal_id
LEFT JOIN core.i18n_translation t ON t.key = d.name_key AND t.lang = $3
WHERE icd.city_id = $1 AND icd.item_id = $2
ORDER BY icd.priority ASC, d.code ASC",
	)
	.bind(city_id)
	.bind(item_id)
	.bind(lang)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

pub async fn list_warnings(
	executor: &mut PgConnection,
	city_id: Uuid,
	item_id: Uuid,
	lang: &str,
) -> Result<Vec<WarningRule>> {
	let rows = sqlx::query_as::<_, WarningRule>(
		"\
SELECT w.code, tt.text AS title, tb.text AS body, w.severity
FROM core.item_city_warning icw
JOIN core.warning w ON w.warning_id = icw.warning_id
LEFT JOIN core.i18n_translation tt ON tt.key = w.title_key AND tt.lang = $3
LEFT JOIN core.i18n_translation tb ON tb.key = w.body_key AND tb.lang = $3
WHERE icw.city_id = $1 AND icw.item_id = $2
ORDER BY icw.priority ASC, w.code ASC",
	)
	.bind(city_id)
	.bind(item_id)
	.bind(lang)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}
