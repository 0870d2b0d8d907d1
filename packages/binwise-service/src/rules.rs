use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::Result;
use binwise_storage::{
	models::{RuleLabel, WarningRule},
	rules,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RuleEntry {
	pub code: String,
	/// Translation in the requested language; never another language's text.
	pub label: Option<String>,
}
impl From<RuleLabel> for RuleEntry {
	fn from(row: RuleLabel) -> Self {
		Self { code: row.code, label: row.label }
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WarningEntry {
	pub code: String,
	pub title: Option<String>,
	pub body: Option<String>,
	pub severity: i16,
}
impl From<WarningRule> for WarningEntry {
	fn from(row: WarningRule) -> Self {
		Self { code: row.code, title: row.title, body: row.body, severity: row.severity }
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CityRules {
	pub categories: Vec<RuleEntry>,
	pub disposals: Vec<RuleEntry>,
	pub warnings: Vec<WarningEntry>,
}
impl CityRules {
	/// No category and no disposal assignment for the item in this city.
	pub fn is_missing(&self) -> bool {
		self.categories.is_empty() && self.disposals.is_empty()
	}
}

pub async fn load_rules(
	executor: &mut PgConnection,
	city_id: Uuid,
	item_id: Uuid,
	lang: &str,
) -> Result<CityRules> {
	let (categories, disposals) = load_labels(executor, city_id, item_id, lang).await?;
	let warnings = rules::list_warnings(executor, city_id, item_id, lang)
		.await?
		.into_iter()
		.map(WarningEntry::from)
		.collect();

	Ok(CityRules { categories, disposals, warnings })
}

pub(crate) async fn load_labels(
	executor: &mut PgConnection,
	city_id: Uuid,
	item_id: Uuid,
	lang: &str,
) -> Result<(Vec<RuleEntry>, Vec<RuleEntry>)> {
	let categories = rules::list_categories(executor, city_id, item_id, lang)
		.await?
		.into_iter()
		.map(RuleEntry::from)
		.collect();
	let disposals = rules::list_disposals(executor, city_id, item_id, lang)
		.await?
		.into_iter()
		.map(RuleEntry::from)
		.collect();

	Ok((categories, disposals))
}
