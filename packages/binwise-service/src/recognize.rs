use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
	BinwiseService, Error, ImageStore, Result, VisionProvider, VisionStore,
	image::{self, NormalizedImage, StoredImage},
};
use binwise_config::{Vision, VisionProviderConfig};
use binwise_domain::verdict::{self, NOTES_CACHE_HIT, Verdict};
use binwise_providers::vision::VisionReply;

pub const SOURCE_SCAN: &str = "scan";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VisionVerdict {
	#[serde(flatten)]
	pub verdict: Verdict,
	pub image_id: Option<Uuid>,
	pub cache_key: String,
}

/// Image normalization, verdict caching and the provider call.
///
/// Holds no database handle of its own, so it also runs against [`crate::NoopVisionStore`].
pub struct Recognizer {
	provider_cfg: VisionProviderConfig,
	vision: Vision,
	provider: Arc<dyn VisionProvider>,
	store: Arc<dyn VisionStore>,
	images: Arc<dyn ImageStore>,
}
impl Recognizer {
	pub fn new(
		provider_cfg: VisionProviderConfig,
		vision: Vision,
		provider: Arc<dyn VisionProvider>,
		store: Arc<dyn VisionStore>,
		images: Arc<dyn ImageStore>,
	) -> Self {
		Self { provider_cfg, vision, provider, store, images }
	}

	pub async fn recognize(&self, image_bytes: &[u8], lang: &str) -> Result<VisionVerdict> {
		let image = image::normalize_image(
			image_bytes,
			self.vision.max_image_side,
			self.vision.jpeg_quality,
		)?;
		let cache_key = cache_key(&image.sha256, &self.provider_cfg.model);
		let image_id = self.register(&image, SOURCE_SCAN).await;

		if self.vision.cache_enabled {
			match self.store.get(&cache_key).await {
				Ok(Some(hit)) => {
					tracing::info!(
						cache_key_prefix = cache_key_prefix(&cache_key),
						hit = true,
						ttl_days = self.vision.cache_ttl_days,
						"Cache hit."
					);

					let mut verdict = hit.verdict;

					if verdict.notes.is_none() {
						verdict.notes = Some(NOTES_CACHE_HIT.to_string());
					}

					return Ok(VisionVerdict {
						verdict,
						image_id: image_id.or(hit.image_id),
						cache_key,
					});
				},
				Ok(None) => {
					tracing::info!(
						cache_key_prefix = cache_key_prefix(&cache_key),
						hit = false,
						ttl_days = self.vision.cache_ttl_days,
						"Cache miss."
					);
				},
				Err(err) => {
					tracing::warn!(
						error = %err,
						cache_key_prefix = cache_key_prefix(&cache_key),
						"Cache read failed."
					);
				},
			}
		}

		let verdict = self.ask_provider(&image, lang).await.sanitized();

		if self.vision.cache_enabled {
			match self.store.put(&cache_key, &verdict, image_id, self.vision.cache_ttl_days).await {
				Ok(()) => {
					tracing::info!(
						cache_key_prefix = cache_key_prefix(&cache_key),
						hit = false,
						ttl_days = self.vision.cache_ttl_days,
						"Cache stored."
					);
				},
				Err(err) => {
					tracing::warn!(
						error = %err,
						cache_key_prefix = cache_key_prefix(&cache_key),
						"Cache write failed."
					);
				},
			}
		}

		Ok(VisionVerdict { verdict, image_id, cache_key })
	}

	/// Normalizes and registers an image without asking the provider about it.
	pub async fn store_image(&self, image_bytes: &[u8], source: &str) -> Result<StoredImage> {
		let image = image::normalize_image(
			image_bytes,
			self.vision.max_image_side,
			self.vision.jpeg_quality,
		)?;
		let storage_key = self
			.images
			.put(&image)
			.await
			.map_err(|err| Error::ImageStoreFailed { message: err.to_string() })?;
		let image_id = self
			.store
			.register_image(&storage_key, &image, source)
			.await
			.map_err(|err| Error::ImageStoreFailed { message: err.to_string() })?
			.ok_or_else(|| Error::ImageStoreFailed {
				message: "No image registry is configured.".to_string(),
			})?;

		Ok(StoredImage { image_id, sha256: image.sha256, width: image.width, height: image.height })
	}

	async fn register(&self, image: &NormalizedImage, source: &str) -> Option<Uuid> {
		let storage_key = match self.images.put(image).await {
			Ok(key) => key,
			Err(err) => {
				tracing::warn!(error = %err, sha256 = %image.sha256, "Image blob write failed.");

				return None;
			},
		};

		match self.store.register_image(&storage_key, image, source).await {
			Ok(image_id) => image_id,
			Err(err) => {
				tracing::warn!(error = %err, sha256 = %image.sha256, "Image asset upsert failed.");

				None
			},
		}
	}

	async fn ask_provider(&self, image: &NormalizedImage, lang: &str) -> Verdict {
		if self.provider_cfg.api_key.is_none() {
			tracing::info!(
				provider_id = %self.provider_cfg.provider_id,
				"Vision provider key is not configured. Returning stub verdict."
			);

			return Verdict::stub();
		}

		match self.provider.describe(&self.provider_cfg, &image.jpeg, lang).await {
			Ok(VisionReply::Content(content)) => verdict::parse_completion(&content),
			Ok(VisionReply::Rejected { status, body }) => {
				tracing::warn!(status, "Vision provider rejected the request.");

				Verdict::http_error(status, &body)
			},
			Ok(VisionReply::Unavailable { attempts, last_error }) => {
				tracing::warn!(attempts, error = %last_error, "Vision provider is unavailable.");

				Verdict::attempts_exhausted()
			},
			Err(err) => {
				tracing::warn!(error = %err, "Vision provider call failed.");

				Verdict::attempts_exhausted()
			},
		}
	}
}

impl BinwiseService {
	pub async fn recognize(&self, image_bytes: &[u8], lang: &str) -> Result<VisionVerdict> {
		self.recognizer.recognize(image_bytes, lang).await
	}

	pub async fn store_image(&self, image_bytes: &[u8], source: &str) -> Result<StoredImage> {
		self.recognizer.store_image(image_bytes, source).await
	}
}

/// Cache key of a normalized image: its SHA-256 hex digest followed by the model id.
pub fn cache_key(sha256: &str, model: &str) -> String {
	format!("{sha256}:{model}")
}

fn cache_key_prefix(key: &str) -> &str {
	let len = key.len().min(12);

	&key[..len]
}
