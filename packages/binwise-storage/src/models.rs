use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct City {
	pub city_id: Uuid,
	pub code: String,
	pub name_key: String,
	pub is_active: bool,
	pub base_city_id: Option<Uuid>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Item {
	pub item_id: Uuid,
	pub canonical_key: String,
	pub title_key: String,
	pub desc_key: Option<String>,
	pub primary_image_id: Option<Uuid>,
	pub is_active: bool,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ItemTextOverride {
	pub title_key: Option<String>,
	pub desc_key: Option<String>,
}

/// A localized item title, the input of alias seeding.
#[derive(Debug, sqlx::FromRow)]
pub struct ItemTitle {
	pub canonical_key: String,
	pub lang: String,
	pub title: String,
}

#[derive(Debug)]
pub struct NewItemAlias<'a> {
	pub canonical_key: &'a str,
	pub lang: &'a str,
	pub alias_text: &'a str,
	pub alias_norm: &'a str,
	pub alias_type: &'a str,
	pub source: &'a str,
	pub confidence: f32,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ItemAlias {
	pub alias_id: i64,
	pub canonical_key: String,
	pub lang: String,
	pub alias_text: String,
	pub alias_norm: String,
	pub alias_type: String,
	pub source: String,
	pub confidence: f32,
}

/// A category or disposal assignment with its label in the requested language.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct RuleLabel {
	pub code: String,
	pub label: Option<String>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct WarningRule {
	pub code: String,
	pub title: Option<String>,
	pub body: Option<String>,
	pub severity: i16,
}

#[derive(Debug, sqlx::FromRow)]
pub struct SimilarityRow {
	pub item_id: Uuid,
	pub label: String,
	pub similarity: f32,
	pub relevance: f32,
}

#[derive(Debug)]
pub struct NewProspect<'a> {
	pub item_id: Option<Uuid>,
	pub city_id: Uuid,
	pub lang: &'a str,
	pub reason: &'a str,
	pub search_text: Option<&'a str>,
	pub search_norm: Option<&'a str>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct Prospect {
	pub prospect_id: Uuid,
	pub item_id: Option<Uuid>,
	pub city_id: Uuid,
	pub lang: String,
	pub status: String,
	pub reason: String,
	pub search_text: Option<String>,
	pub search_norm: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NewImageAsset<'a> {
	pub storage_key: &'a str,
	pub normalized_sha256: &'a str,
	pub content_type: &'a str,
	pub byte_size: i32,
	pub width: i32,
	pub height: i32,
	pub source: &'a str,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ImageAsset {
	pub image_id: Uuid,
	pub storage_key: String,
	pub normalized_sha256: String,
	pub content_type: Option<String>,
	pub byte_size: Option<i32>,
	pub width: Option<i32>,
	pub height: Option<i32>,
	pub source: String,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct VisionCacheEntry {
	pub cache_key: String,
	pub image_id: Option<Uuid>,
	pub canonical_key: Option<String>,
	pub confidence: f32,
	pub labels: Value,
	pub notes: Option<String>,
	pub created_at: OffsetDateTime,
	pub expires_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NewVisionCacheEntry<'a> {
	pub cache_key: &'a str,
	pub image_id: Option<Uuid>,
	pub canonical_key: Option<&'a str>,
	pub confidence: f32,
	pub labels: &'a Value,
	pub notes: Option<&'a str>,
}

#[derive(Debug)]
pub struct NewScanEvent<'a> {
	pub image_id: Uuid,
	pub cache_key: Option<&'a str>,
	pub city_id: Uuid,
	pub item_id: Option<Uuid>,
	pub prospect_id: Option<Uuid>,
	pub search_text: Option<&'a str>,
	pub source: &'a str,
}
