mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, DEFAULT_MIN_SIMILARITY, DEFAULT_RELEVANCE_WEIGHT, DEFAULT_SIMILARITY_WEIGHT,
	DEFAULT_SUGGESTION_LIMIT, Matching, Postgres, Providers, Service, Storage, Vision,
	VisionProviderConfig,
};

use std::{fs, path::Path};

/// Retry ceiling for one vision call, counting the first attempt.
pub const MAX_VISION_ATTEMPTS: u32 = 2;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::Read { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::Parse { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	let vision_provider = &cfg.providers.vision;

	for (label, value) in [
		("providers.vision.provider_id", &vision_provider.provider_id),
		("providers.vision.api_base", &vision_provider.api_base),
		("providers.vision.model", &vision_provider.model),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	// The model id is the suffix of every vision cache key.
	if vision_provider.model.contains(char::is_whitespace) {
		return Err(Error::Validation {
			message: "providers.vision.model must not contain whitespace.".to_string(),
		});
	}
	if vision_provider.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.vision.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if !(1..=MAX_VISION_ATTEMPTS).contains(&vision_provider.max_attempts) {
		return Err(Error::Validation {
			message: format!(
				"providers.vision.max_attempts must be in the range 1-{MAX_VISION_ATTEMPTS}."
			),
		});
	}
	if vision_provider.max_tokens == 0 {
		return Err(Error::Validation {
			message: "providers.vision.max_tokens must be greater than zero.".to_string(),
		});
	}
	if !vision_provider.temperature.is_finite() || vision_provider.temperature < 0.0 {
		return Err(Error::Validation {
			message: "providers.vision.temperature must be a finite number, zero or greater."
				.to_string(),
		});
	}
	if cfg.vision.max_image_side == 0 {
		return Err(Error::Validation {
			message: "vision.max_image_side must be greater than zero.".to_string(),
		});
	}
	if !(1..=100).contains(&cfg.vision.jpeg_quality) {
		return Err(Error::Validation {
			message: "vision.jpeg_quality must be in the range 1-100.".to_string(),
		});
	}
	if cfg.vision.cache_ttl_days <= 0 {
		return Err(Error::Validation {
			message: "vision.cache_ttl_days must be greater than zero.".to_string(),
		});
	}
	if cfg.vision.image_dir.as_os_str().is_empty() {
		return Err(Error::Validation {
			message: "vision.image_dir must be non-empty.".to_string(),
		});
	}
	if cfg.matching.suggestion_limit == 0 {
		return Err(Error::Validation {
			message: "matching.suggestion_limit must be greater than zero.".to_string(),
		});
	}

	for (label, weight) in [
		("matching.relevance_weight", cfg.matching.relevance_weight),
		("matching.similarity_weight", cfg.matching.similarity_weight),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if weight < 0.0 {
			return Err(Error::Validation { message: format!("{label} must be zero or greater.") });
		}
	}

	if !(0.0..=1.0).contains(&cfg.matching.min_similarity) {
		return Err(Error::Validation {
			message: "matching.min_similarity must be in the range 0.0-1.0.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg
		.providers
		.vision
		.api_key
		.as_deref()
		.map(|key| key.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.providers.vision.api_key = None;
	}

	cfg.providers.vision.model = cfg.providers.vision.model.trim().to_string();
}
