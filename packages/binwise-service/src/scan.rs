use sqlx::PgConnection;
use uuid::Uuid;

use crate::{BinwiseService, Result, gaps, recognize::SOURCE_SCAN};
use binwise_storage::{models::NewScanEvent, scan_events};

#[derive(Clone, Debug, Default)]
pub struct ScanEventInput {
	pub image_id: Option<Uuid>,
	pub cache_key: Option<String>,
	pub city_id: Option<Uuid>,
	pub item_id: Option<Uuid>,
	pub prospect_id: Option<Uuid>,
	pub search_text: Option<String>,
	/// Defaults to `scan` when blank.
	pub source: String,
}

impl BinwiseService {
	pub async fn record_scan_event(&self, input: &ScanEventInput) -> Result<Option<Uuid>> {
		let mut conn = self.db.pool.acquire().await?;

		record(&mut conn, input).await
	}

	pub async fn find_prospect_id(
		&self,
		city_id: Uuid,
		lang: &str,
		item_id: Option<Uuid>,
		search_text: Option<&str>,
	) -> Result<Option<Uuid>> {
		let mut conn = self.db.pool.acquire().await?;

		gaps::find_prospect_id(&mut conn, city_id, lang, item_id, search_text).await
	}
}

/// Appends one scan event. Without an image or a city there is nothing to link, so nothing is
/// written and `None` is returned.
pub async fn record(executor: &mut PgConnection, input: &ScanEventInput) -> Result<Option<Uuid>> {
	let (Some(image_id), Some(city_id)) = (input.image_id, input.city_id) else {
		return Ok(None);
	};
	let source = match input.source.trim() {
		"" => SOURCE_SCAN,
		source => source,
	};
	let scan_id = scan_events::insert(
		executor,
		&NewScanEvent {
			image_id,
			cache_key: input.cache_key.as_deref(),
			city_id,
			item_id: input.item_id,
			prospect_id: input.prospect_id,
			search_text: input.search_text.as_deref(),
			source,
		},
	)
	.await?;

	Ok(Some(scan_id))
}
