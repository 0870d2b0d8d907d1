use sqlx::PgConnection;

use crate::Result;

/// Looks up one translation. A missing row is `None`; other languages are never consulted.
pub async fn translate(executor: &mut PgConnection, key: &str, lang: &str) -> Result<Option<String>> {
	let text = sqlx::query_scalar::<_, String>(
		"SELECT text FROM core.i18n_translation WHERE key = $1 AND lang = $2",
	)
	.bind(key)
	.bind(lang)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(text)
}
