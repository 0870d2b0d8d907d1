use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
	BinwiseService, Result,
	gaps::{self, GapSummary},
	matching::{self, Suggestion},
	rules::{self, RuleEntry, WarningEntry},
};
use binwise_domain::ranking::RankingParams;
use binwise_storage::{cities, i18n, items, models::Item};

pub const ERROR_UNKNOWN_CITY: &str = "unknown_city";
pub const ERROR_ITEM_ID_OR_NAME_REQUIRED: &str = "item_id_or_name_required";
pub const ERROR_UNKNOWN_ITEM: &str = "unknown_item";
pub const ERROR_ITEM_NOT_FOUND: &str = "item_not_found";

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ResolveRequest {
	pub city: String,
	pub item_id: Option<String>,
	pub item_name: Option<String>,
	pub lang: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ItemSummary {
	pub item_id: Uuid,
	pub canonical_key: String,
	pub title: Option<String>,
	pub description: Option<String>,
	pub primary_image_id: Option<Uuid>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedItem {
	pub city: String,
	pub item: ItemSummary,
	pub categories: Vec<RuleEntry>,
	pub disposals: Vec<RuleEntry>,
	pub warnings: Vec<WarningEntry>,
	pub suggestions: Vec<Suggestion>,
	pub gap: GapSummary,
}

/// Terminal state of one resolution.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
	Resolved(ResolvedItem),
	MissingRules(ResolvedItem),
	Unresolved { error: &'static str, suggestions: Vec<Suggestion>, gap: GapSummary },
	NotFound { error: &'static str, suggestions: Vec<Suggestion> },
	InvalidRequest { error: &'static str },
	UnknownCity { error: &'static str, city: String },
}
impl Outcome {
	pub fn error(&self) -> Option<&'static str> {
		match self {
			Self::Resolved(_) | Self::MissingRules(_) => None,
			Self::Unresolved { error, .. }
			| Self::NotFound { error, .. }
			| Self::InvalidRequest { error }
			| Self::UnknownCity { error, .. } => Some(*error),
		}
	}

	pub fn resolved_item(&self) -> Option<&ResolvedItem> {
		match self {
			Self::Resolved(resolved) | Self::MissingRules(resolved) => Some(resolved),
			_ => None,
		}
	}

	pub fn item_id(&self) -> Option<Uuid> {
		self.resolved_item().map(|resolved| resolved.item.item_id)
	}

	pub fn gap(&self) -> Option<&GapSummary> {
		match self {
			Self::Resolved(resolved) | Self::MissingRules(resolved) => Some(&resolved.gap),
			Self::Unresolved { gap, .. } => Some(gap),
			_ => None,
		}
	}

	pub fn suggestions(&self) -> &[Suggestion] {
		match self {
			Self::Resolved(resolved) | Self::MissingRules(resolved) => &resolved.suggestions,
			Self::Unresolved { suggestions, .. } | Self::NotFound { suggestions, .. } =>
				suggestions,
			Self::InvalidRequest { .. } | Self::UnknownCity { .. } => &[],
		}
	}
}

pub type ResolutionResult = Outcome;

impl BinwiseService {
	/// Resolves one request inside a single transaction.
	pub async fn resolve(&self, req: ResolveRequest) -> Result<ResolutionResult> {
		let params = RankingParams::from(&self.cfg.matching);
		let mut tx = self.db.pool.begin().await?;
		let outcome = resolve_with(&mut *tx, &params, &req).await?;

		tx.commit().await?;

		tracing::info!(
			city = %req.city,
			lang = %req.lang,
			outcome = outcome_name(&outcome),
			item_id = ?outcome.item_id(),
			suggestions = outcome.suggestions().len(),
			"Resolution finished."
		);

		Ok(outcome)
	}
}

pub(crate) async fn resolve_with(
	executor: &mut PgConnection,
	params: &RankingParams,
	req: &ResolveRequest,
) -> Result<Outcome> {
	let city_code = req.city.trim();
	let lang = req.lang.trim();
	let Some(city) = cities::find_active_by_code(executor, city_code).await? else {
		return Ok(Outcome::UnknownCity {
			error: ERROR_UNKNOWN_CITY,
			city: city_code.to_string(),
		});
	};
	let raw_item_id = non_blank(req.item_id.as_deref());
	let item_name = non_blank(req.item_name.as_deref());
	let item_id = match (raw_item_id, item_name) {
		(Some(raw), _) => Uuid::parse_str(raw).ok(),
		(None, Some(name)) => {
			let matched = matching::match_text(executor, name, lang, city.city_id).await?;

			if matched.is_none() {
				let suggestions =
					matching::suggest(executor, params, name, lang, city.city_id, None).await?;
				let created = gaps::record_unknown_item(executor, name, city.city_id, lang).await?;

				return Ok(Outcome::Unresolved {
					error: ERROR_UNKNOWN_ITEM,
					suggestions,
					gap: GapSummary::recorded(created),
				});
			}

			matched
		},
		(None, None) => {
			return Ok(Outcome::InvalidRequest { error: ERROR_ITEM_ID_OR_NAME_REQUIRED });
		},
	};
	let item = match item_id {
		Some(item_id) => items::get_by_id(executor, item_id).await?,
		None => None,
	};
	let Some(item) = item else {
		let query = item_name.or(raw_item_id).unwrap_or_default();
		let suggestions =
			matching::suggest(executor, params, query, lang, city.city_id, None).await?;

		return Ok(Outcome::NotFound { error: ERROR_ITEM_NOT_FOUND, suggestions });
	};
	let summary = summarize(executor, &item, city.city_id, lang).await?;
	let city_rules = rules::load_rules(executor, city.city_id, item.item_id, lang).await?;

	if city_rules.is_missing() {
		let query = summary.title.clone().unwrap_or_else(|| item.canonical_key.clone());
		let suggestions =
			matching::suggest(executor, params, &query, lang, city.city_id, Some(item.item_id))
				.await?;
		let created =
			gaps::record_missing_rules(executor, item.item_id, city.city_id, lang).await?;

		return Ok(Outcome::MissingRules(ResolvedItem {
			city: city.code,
			item: summary,
			categories: city_rules.categories,
			disposals: city_rules.disposals,
			warnings: city_rules.warnings,
			suggestions,
			gap: GapSummary::recorded(created),
		}));
	}

	let missing_in_other_cities =
		gaps::backfill_other_cities(executor, item.item_id, city.city_id, lang).await?;

	Ok(Outcome::Resolved(ResolvedItem {
		city: city.code,
		item: summary,
		categories: city_rules.categories,
		disposals: city_rules.disposals,
		warnings: city_rules.warnings,
		suggestions: Vec::new(),
		gap: GapSummary { created: false, needed: false, missing_in_other_cities },
	}))
}

/// Localized title and description, honoring the city text override.
async fn summarize(
	executor: &mut PgConnection,
	item: &Item,
	city_id: Uuid,
	lang: &str,
) -> Result<ItemSummary> {
	let text_override = items::get_text_override(executor, city_id, item.item_id).await?;
	let (override_title, override_desc) =
		text_override.map(|row| (row.title_key, row.desc_key)).unwrap_or_default();
	let title_key = override_title.unwrap_or_else(|| item.title_key.clone());
	let desc_key = override_desc.or_else(|| item.desc_key.clone());
	let title = i18n::translate(executor, &title_key, lang).await?;
	let description = match desc_key {
		Some(key) => i18n::translate(executor, &key, lang).await?,
		None => None,
	};

	Ok(ItemSummary {
		item_id: item.item_id,
		canonical_key: item.canonical_key.clone(),
		title,
		description,
		primary_image_id: item.primary_image_id,
	})
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|value| !value.is_empty())
}

fn outcome_name(outcome: &Outcome) -> &'static str {
	match outcome {
		Outcome::Resolved(_) => "resolved",
		Outcome::MissingRules(_) => "missing_rules",
		Outcome::Unresolved { .. } => "unresolved",
		Outcome::NotFound { .. } => "not_found",
		Outcome::InvalidRequest { .. } => "invalid_request",
		Outcome::UnknownCity { .. } => "unknown_city",
	}
}
