pub mod analyze;
pub mod gaps;
pub mod image;
pub mod matching;
pub mod recognize;
pub mod resolve;
pub mod rules;
pub mod scan;
pub mod seed;
pub mod vision_store;

mod error;

pub use crate::image::{FsImageStore, ImageStore, NormalizedImage, StoredImage};
pub use analyze::{AnalyzeRequest, AnalyzeResponse};
pub use error::{Error, Result};
pub use gaps::{GapSummary, OtherCityGap};
pub use matching::Suggestion;
pub use recognize::{Recognizer, VisionVerdict};
pub use resolve::{ItemSummary, Outcome, ResolutionResult, ResolveRequest, ResolvedItem};
pub use rules::{CityRules, RuleEntry, WarningEntry};
pub use scan::ScanEventInput;
pub use seed::SeedReport;
pub use vision_store::{NoopVisionStore, PgVisionStore, StoredVerdict, VisionStore};

use std::{future::Future, pin::Pin, sync::Arc};

use binwise_config::{Config, VisionProviderConfig};
use binwise_providers::vision::{self, VisionReply};
use binwise_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait VisionProvider
where
	Self: Send + Sync,
{
	fn describe<'a>(
		&'a self,
		cfg: &'a VisionProviderConfig,
		jpeg: &'a [u8],
		lang: &'a str,
	) -> BoxFuture<'a, Result<VisionReply>>;
}

#[derive(Clone)]
pub struct Providers {
	pub vision: Arc<dyn VisionProvider>,
}

pub struct BinwiseService {
	pub cfg: Config,
	pub db: Db,
	pub recognizer: Recognizer,
}

struct DefaultProviders;

impl VisionProvider for DefaultProviders {
	fn describe<'a>(
		&'a self,
		cfg: &'a VisionProviderConfig,
		jpeg: &'a [u8],
		lang: &'a str,
	) -> BoxFuture<'a, Result<VisionReply>> {
		Box::pin(async move { Ok(vision::describe_image(cfg, jpeg, lang).await?) })
	}
}

impl Providers {
	pub fn new(vision: Arc<dyn VisionProvider>) -> Self {
		Self { vision }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self { vision: Arc::new(DefaultProviders) }
	}
}

impl BinwiseService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self::with_providers(cfg, db, Providers::default())
	}

	/// Wires the Postgres-backed vision cache and the filesystem image store from `cfg`.
	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		let store: Arc<dyn VisionStore> = Arc::new(PgVisionStore::new(db.pool.clone()));
		let images: Arc<dyn ImageStore> = Arc::new(FsImageStore::new(cfg.vision.image_dir.clone()));

		Self::with_stores(cfg, db, providers, store, images)
	}

	pub fn with_stores(
		cfg: Config,
		db: Db,
		providers: Providers,
		store: Arc<dyn VisionStore>,
		images: Arc<dyn ImageStore>,
	) -> Self {
		let recognizer = Recognizer::new(
			cfg.providers.vision.clone(),
			cfg.vision.clone(),
			providers.vision,
			store,
			images,
		);

		Self { cfg, db, recognizer }
	}
}
