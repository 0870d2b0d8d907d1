use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
	BinwiseService, Error, Result, gaps, matching,
	recognize::{SOURCE_SCAN, VisionVerdict},
	resolve::{self, ERROR_ITEM_NOT_FOUND, Outcome, ResolveRequest},
	rules::WarningEntry,
	scan::{self, ScanEventInput},
};
use binwise_domain::ranking::RankingParams;
use binwise_storage::{cities, items};

pub const ERROR_VISION_UNAVAILABLE: &str = "vision_unavailable";
pub const VISION_UNAVAILABLE_SEVERITY: i16 = 2;

const ITEM_KEY_PREFIX: &str = "item.";

#[derive(Clone, Debug, Default)]
pub struct AnalyzeRequest {
	pub city: String,
	pub lang: String,
	pub image_bytes: Vec<u8>,
	pub search_text: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalyzeResponse {
	pub vision: VisionVerdict,
	/// Absent when the image could not be recognized or nothing was left to resolve.
	pub resolution: Option<Outcome>,
	pub warnings: Vec<WarningEntry>,
	pub error: Option<&'static str>,
	pub scan_id: Option<Uuid>,
}

impl BinwiseService {
	/// Recognizes an image, maps the verdict to an item, resolves it and logs a scan event.
	pub async fn analyze(&self, req: AnalyzeRequest) -> Result<AnalyzeResponse> {
		let city = req.city.trim();
		let lang = req.lang.trim();

		if city.is_empty() || lang.is_empty() {
			return Err(Error::InvalidRequest {
				message: "city and lang are required.".to_string(),
			});
		}

		tracing::info!(
			city,
			lang,
			has_search_text = req.search_text.is_some(),
			image_len = req.image_bytes.len(),
			"Analyze started."
		);

		let vision = self.recognize(&req.image_bytes, lang).await?;
		let params = RankingParams::from(&self.cfg.matching);
		let mut tx = self.db.pool.begin().await?;
		let response = analyze_with(&mut *tx, &params, city, lang, &req, vision).await?;

		tx.commit().await?;

		Ok(response)
	}
}

async fn analyze_with(
	executor: &mut PgConnection,
	params: &RankingParams,
	city: &str,
	lang: &str,
	req: &AnalyzeRequest,
	vision: VisionVerdict,
) -> Result<AnalyzeResponse> {
	let city_id = cities::find_active_by_code(executor, city).await?.map(|row| row.city_id);
	let mut item_id = match vision.verdict.canonical_key.as_deref() {
		Some(key) => find_item_by_key(executor, key).await?,
		None => None,
	};

	if item_id.is_none()
		&& let Some(city_id) = city_id
	{
		item_id = matching::match_any_alias(executor, &vision.verdict.labels, lang, city_id).await?;
	}

	let user_search = req
		.search_text
		.as_deref()
		.map(str::trim)
		.filter(|text| !text.is_empty())
		.map(str::to_string);
	let mut event = ScanEventInput {
		image_id: vision.image_id,
		cache_key: Some(vision.cache_key.clone()),
		city_id,
		item_id: None,
		prospect_id: None,
		search_text: user_search.clone(),
		source: SOURCE_SCAN.to_string(),
	};

	tracing::info!(
		canonical_key = ?vision.verdict.canonical_key,
		confidence = vision.verdict.confidence,
		labels = vision.verdict.labels.len(),
		notes = ?vision.verdict.notes,
		item_id = ?item_id,
		"Analyze vision verdict."
	);

	if vision.verdict.is_vision_failure() {
		let scan_id = scan::record(executor, &event).await?;

		tracing::info!("Vision unavailable. Skipping resolution.");

		return Ok(AnalyzeResponse {
			warnings: vec![vision_unavailable_warning(lang)],
			vision,
			resolution: None,
			error: Some(ERROR_VISION_UNAVAILABLE),
			scan_id,
		});
	}

	let search_text = match (&item_id, user_search) {
		(None, None) => vision.verdict.labels.first().cloned(),
		(_, user_search) => user_search,
	};

	if item_id.is_none() && search_text.is_none() {
		event.search_text = None;

		let scan_id = scan::record(executor, &event).await?;

		tracing::info!("No item and no search text. Returning item_not_found.");

		return Ok(AnalyzeResponse {
			vision,
			resolution: None,
			warnings: Vec::new(),
			error: Some(ERROR_ITEM_NOT_FOUND),
			scan_id,
		});
	}

	let resolve_req = ResolveRequest {
		city: city.to_string(),
		item_id: item_id.map(|id| id.to_string()),
		item_name: search_text.clone(),
		lang: lang.to_string(),
	};
	let outcome = resolve::resolve_with(executor, params, &resolve_req).await?;
	let resolved_item_id = outcome.item_id();
	let prospect_id = match (city_id, outcome.gap()) {
		(Some(city_id), Some(gap)) if gap.needed =>
			gaps::find_prospect_id(
				executor,
				city_id,
				lang,
				resolved_item_id,
				search_text.as_deref(),
			)
			.await?,
		_ => None,
	};

	event.item_id = resolved_item_id;
	event.prospect_id = prospect_id;
	event.search_text = search_text;

	let scan_id = scan::record(executor, &event).await?;
	let warnings =
		outcome.resolved_item().map(|resolved| resolved.warnings.clone()).unwrap_or_default();

	tracing::info!(
		item_id = ?resolved_item_id,
		error = ?outcome.error(),
		suggestions = outcome.suggestions().len(),
		prospect = prospect_id.is_some(),
		"Analyze resolved."
	);

	Ok(AnalyzeResponse {
		vision,
		error: outcome.error(),
		resolution: Some(outcome),
		warnings,
		scan_id,
	})
}

/// Exact canonical key, then the same key with the `item.` prefix toggled.
async fn find_item_by_key(
	executor: &mut PgConnection,
	canonical_key: &str,
) -> Result<Option<Uuid>> {
	if let Some(item_id) = items::find_id_by_canonical_key(executor, canonical_key).await? {
		return Ok(Some(item_id));
	}

	let alternate = match canonical_key.strip_prefix(ITEM_KEY_PREFIX) {
		Some(bare) => bare.to_string(),
		None => format!("{ITEM_KEY_PREFIX}{canonical_key}"),
	};

	Ok(items::find_id_by_canonical_key(executor, &alternate).await?)
}

fn vision_unavailable_warning(lang: &str) -> WarningEntry {
	let title = match lang {
		"de" => "Ihre Anfrage kann aktuell nicht verarbeitet werden.",
		"tr" => "İsteğinizi şu an gerçekleştiremiyoruz.",
		_ => "We can't process your request right now.",
	};

	WarningEntry {
		code: ERROR_VISION_UNAVAILABLE.to_string(),
		title: Some(title.to_string()),
		body: None,
		severity: VISION_UNAVAILABLE_SEVERITY,
	}
}
