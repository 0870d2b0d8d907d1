use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

pub const DEFAULT_SUGGESTION_LIMIT: u32 = 3;
pub const DEFAULT_RELEVANCE_WEIGHT: f32 = 0.7;
pub const DEFAULT_SIMILARITY_WEIGHT: f32 = 0.3;
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.1;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub vision: Vision,
	#[serde(default)]
	pub matching: Matching,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub vision: VisionProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct VisionProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	/// Blank or missing keys switch recognition to the offline stub verdict.
	pub api_key: Option<String>,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default = "default_max_attempts")]
	pub max_attempts: u32,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Vision {
	pub max_image_side: u32,
	pub jpeg_quality: u8,
	pub cache_ttl_days: i64,
	#[serde(default = "default_true")]
	pub cache_enabled: bool,
	/// Directory receiving normalized image bytes, one `<sha256>.jpg` file per asset.
	pub image_dir: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Matching {
	pub suggestion_limit: u32,
	pub relevance_weight: f32,
	pub similarity_weight: f32,
	pub min_similarity: f32,
}
impl Default for Matching {
	fn default() -> Self {
		Self {
			suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
			relevance_weight: DEFAULT_RELEVANCE_WEIGHT,
			similarity_weight: DEFAULT_SIMILARITY_WEIGHT,
			min_similarity: DEFAULT_MIN_SIMILARITY,
		}
	}
}

fn default_max_attempts() -> u32 {
	2
}

fn default_true() -> bool {
	true
}
