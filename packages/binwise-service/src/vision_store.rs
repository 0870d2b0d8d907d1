use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
	BoxFuture, Error, Result,
	image::{JPEG_CONTENT_TYPE, NormalizedImage},
};
use binwise_domain::verdict::Verdict;
use binwise_storage::{
	image_assets,
	models::{NewImageAsset, NewVisionCacheEntry},
	vision_cache,
};

/// A live cache entry.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredVerdict {
	pub verdict: Verdict,
	pub image_id: Option<Uuid>,
}

/// Persistence behind recognition: the verdict cache and the image asset registry.
pub trait VisionStore
where
	Self: Send + Sync,
{
	fn get<'a>(&'a self, cache_key: &'a str) -> BoxFuture<'a, Result<Option<StoredVerdict>>>;

	fn put<'a>(
		&'a self,
		cache_key: &'a str,
		verdict: &'a Verdict,
		image_id: Option<Uuid>,
		ttl_days: i64,
	) -> BoxFuture<'a, Result<()>>;

	/// Upserts the asset row by content hash. `None` means there is no registry to write to.
	fn register_image<'a>(
		&'a self,
		storage_key: &'a str,
		image: &'a NormalizedImage,
		source: &'a str,
	) -> BoxFuture<'a, Result<Option<Uuid>>>;
}

pub struct PgVisionStore {
	pool: PgPool,
}
impl PgVisionStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	async fn fetch(&self, cache_key: &str) -> Result<Option<StoredVerdict>> {
		let mut conn = self.pool.acquire().await?;
		let Some(entry) = vision_cache::get_live(&mut conn, cache_key).await? else {
			return Ok(None);
		};
		let labels = serde_json::from_value::<Vec<String>>(entry.labels).unwrap_or_default();

		Ok(Some(StoredVerdict {
			verdict: Verdict {
				canonical_key: entry.canonical_key,
				confidence: entry.confidence,
				labels,
				notes: entry.notes,
			},
			image_id: entry.image_id,
		}))
	}

	async fn store(
		&self,
		cache_key: &str,
		verdict: &Verdict,
		image_id: Option<Uuid>,
		ttl_days: i64,
	) -> Result<()> {
		let labels = Value::from(verdict.labels.clone());
		let mut conn = self.pool.acquire().await?;

		vision_cache::upsert(
			&mut conn,
			&NewVisionCacheEntry {
				cache_key,
				image_id,
				canonical_key: verdict.canonical_key.as_deref(),
				confidence: verdict.confidence,
				labels: &labels,
				notes: verdict.notes.as_deref(),
			},
			ttl_days,
		)
		.await?;

		Ok(())
	}

	async fn register(
		&self,
		storage_key: &str,
		image: &NormalizedImage,
		source: &str,
	) -> Result<Option<Uuid>> {
		let asset = NewImageAsset {
			storage_key,
			normalized_sha256: &image.sha256,
			content_type: JPEG_CONTENT_TYPE,
			byte_size: to_i32(image.jpeg.len(), "byte_size")?,
			width: to_i32(image.width as usize, "width")?,
			height: to_i32(image.height as usize, "height")?,
			source,
		};
		let mut conn = self.pool.acquire().await?;
		let image_id = image_assets::upsert(&mut conn, &asset).await?;

		Ok(Some(image_id))
	}
}

impl VisionStore for PgVisionStore {
	fn get<'a>(&'a self, cache_key: &'a str) -> BoxFuture<'a, Result<Option<StoredVerdict>>> {
		Box::pin(self.fetch(cache_key))
	}

	fn put<'a>(
		&'a self,
		cache_key: &'a str,
		verdict: &'a Verdict,
		image_id: Option<Uuid>,
		ttl_days: i64,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.store(cache_key, verdict, image_id, ttl_days))
	}

	fn register_image<'a>(
		&'a self,
		storage_key: &'a str,
		image: &'a NormalizedImage,
		source: &'a str,
	) -> BoxFuture<'a, Result<Option<Uuid>>> {
		Box::pin(self.register(storage_key, image, source))
	}
}

/// Store used without a database: every lookup misses and every write is dropped.
pub struct NoopVisionStore;

impl VisionStore for NoopVisionStore {
	fn get<'a>(&'a self, _cache_key: &'a str) -> BoxFuture<'a, Result<Option<StoredVerdict>>> {
		Box::pin(async { Ok(None) })
	}

	fn put<'a>(
		&'a self,
		_cache_key: &'a str,
		_verdict: &'a Verdict,
		_image_id: Option<Uuid>,
		_ttl_days: i64,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async { Ok(()) })
	}

	fn register_image<'a>(
		&'a self,
		_storage_key: &'a str,
		_image: &'a NormalizedImage,
		_source: &'a str,
	) -> BoxFuture<'a, Result<Option<Uuid>>> {
		Box::pin(async { Ok(None) })
	}
}

fn to_i32(value: usize, field: &str) -> Result<i32> {
	i32::try_from(value)
		.map_err(|_| Error::InvalidRequest { message: format!("Image {field} is out of range.") })
}
