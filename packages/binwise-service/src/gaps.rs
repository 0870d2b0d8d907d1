use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::Result;
use binwise_domain::normalize::normalize;
use binwise_storage::{cities, items, models::NewProspect, prospects};

pub const REASON_UNKNOWN_ITEM: &str = "unknown_item";
pub const REASON_MISSING_CITY_RULES: &str = "missing_city_rules";
pub const REASON_MISSING_CITY_RULES_OTHER_CITY: &str = "missing_city_rules_other_city";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GapSummary {
	/// A new gap record was written by this call.
	pub created: bool,
	/// The resolution is incomplete and a gap record exists for it.
	pub needed: bool,
	pub missing_in_other_cities: Vec<OtherCityGap>,
}
impl GapSummary {
	pub fn recorded(created: bool) -> Self {
		Self { created, needed: true, missing_in_other_cities: Vec::new() }
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OtherCityGap {
	pub city: String,
	pub needed: bool,
	pub created: bool,
}

/// Natural key of a text-bound gap: the normalized text, or the lowercased raw text when
/// normalization leaves nothing.
pub fn search_norm(text: &str) -> Option<String> {
	let norm = normalize(text);

	if !norm.is_empty() {
		return Some(norm);
	}

	let trimmed = text.trim();

	(!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

pub async fn record_unknown_item(
	executor: &mut PgConnection,
	search_text: &str,
	city_id: Uuid,
	lang: &str,
) -> Result<bool> {
	let Some(norm) = search_norm(search_text) else {
		return Ok(false);
	};
	let created = prospects::insert_if_absent(
		executor,
		&NewProspect {
			item_id: None,
			city_id,
			lang,
			reason: REASON_UNKNOWN_ITEM,
			search_text: Some(search_text.trim()),
			search_norm: Some(&norm),
		},
	)
	.await?;

	if created {
		tracing::info!(
			reason = REASON_UNKNOWN_ITEM,
			%city_id,
			lang,
			search_norm = %norm,
			"Gap recorded."
		);
	}

	Ok(created)
}

pub async fn record_missing_rules(
	executor: &mut PgConnection,
	item_id: Uuid,
	city_id: Uuid,
	lang: &str,
) -> Result<bool> {
	record_item_gap(executor, item_id, city_id, lang, REASON_MISSING_CITY_RULES).await
}

/// Writes a gap for every other active city that has neither a category nor a disposal for
/// the item. Cities that already have a record are reported with `created == false`.
pub async fn backfill_other_cities(
	executor: &mut PgConnection,
	item_id: Uuid,
	city_id: Uuid,
	lang: &str,
) -> Result<Vec<OtherCityGap>> {
	let mut out = Vec::new();

	for city in cities::list_active_except(executor, city_id).await? {
		if items::has_city_rules(executor, city.city_id, item_id).await? {
			continue;
		}

		let created = record_item_gap(
			executor,
			item_id,
			city.city_id,
			lang,
			REASON_MISSING_CITY_RULES_OTHER_CITY,
		)
		.await?;

		out.push(OtherCityGap { city: city.code, needed: true, created });
	}

	Ok(out)
}

/// Gap record linked to a resolution: by item when item-bound, else by normalized search text.
pub async fn find_prospect_id(
	executor: &mut PgConnection,
	city_id: Uuid,
	lang: &str,
	item_id: Option<Uuid>,
	search_text: Option<&str>,
) -> Result<Option<Uuid>> {
	if let Some(item_id) = item_id {
		return Ok(prospects::find_id_for_item(executor, item_id, city_id, lang).await?);
	}

	let Some(norm) = search_text.and_then(search_norm) else {
		return Ok(None);
	};

	Ok(prospects::find_id_for_search(executor, &norm, city_id, lang).await?)
}

async fn record_item_gap(
	executor: &mut PgConnection,
	item_id: Uuid,
	city_id: Uuid,
	lang: &str,
	reason: &str,
) -> Result<bool> {
	let created = prospects::insert_if_absent(
		executor,
		&NewProspect {
			item_id: Some(item_id),
			city_id,
			lang,
			reason,
			search_text: None,
			search_norm: None,
		},
	)
	.await?;

	if created {
		tracing::info!(reason, %city_id, %item_id, lang, "Gap recorded.");
	}

	Ok(created)
}
