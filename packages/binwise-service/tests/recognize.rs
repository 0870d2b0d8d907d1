use std::{
	collections::HashMap,
	io::Cursor,
	path::PathBuf,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use image::{DynamicImage, ImageFormat};
use serde_json::Map;
use uuid::Uuid;

use binwise_config::{Vision, VisionProviderConfig};
use binwise_domain::verdict::Verdict;
use binwise_providers::vision::VisionReply;
use binwise_service::{
	BoxFuture, Error, ImageStore, NoopVisionStore, NormalizedImage, Recognizer, Result,
	StoredVerdict, VisionProvider, VisionStore, image::normalize_image, recognize::cache_key,
};

const MODEL: &str = "test-vision";
const IMAGE_ID: Uuid = Uuid::from_u128(0xfeed);

fn provider_cfg(api_key: Option<&str>) -> VisionProviderConfig {
	VisionProviderConfig {
		provider_id: "test".to_string(),
		api_base: "http://127.0.0.1:9".to_string(),
		api_key: api_key.map(str::to_string),
		path: "/v1/chat/completions".to_string(),
		model: MODEL.to_string(),
		temperature: 0.0,
		max_tokens: 120,
		timeout_ms: 1_000,
		max_attempts: 2,
		default_headers: Map::new(),
	}
}

fn vision_cfg() -> Vision {
	Vision {
		max_image_side: 768,
		jpeg_quality: 75,
		cache_ttl_days: 30,
		cache_enabled: true,
		image_dir: PathBuf::from("unused"),
	}
}

fn png(width: u32, height: u32) -> Vec<u8> {
	let mut buf = Cursor::new(Vec::new());

	DynamicImage::new_rgb8(width, height)
		.write_to(&mut buf, ImageFormat::Png)
		.expect("Failed to encode PNG.");

	buf.into_inner()
}

#[derive(Default)]
struct MemoryStore {
	entries: Mutex<HashMap<String, StoredVerdict>>,
	writes: AtomicUsize,
}
impl MemoryStore {
	fn write_count(&self) -> usize {
		self.writes.load(Ordering::SeqCst)
	}
}
impl VisionStore for MemoryStore {
	fn get<'a>(&'a self, cache_key: &'a str) -> BoxFuture<'a, Result<Option<StoredVerdict>>> {
		let hit = self.entries.lock().expect("Store lock poisoned.").get(cache_key).cloned();

		Box::pin(async move { Ok(hit) })
	}

	fn put<'a>(
		&'a self,
		cache_key: &'a str,
		verdict: &'a Verdict,
		image_id: Option<Uuid>,
		_ttl_days: i64,
	) -> BoxFuture<'a, Result<()>> {
		self.writes.fetch_add(1, Ordering::SeqCst);
		self.entries
			.lock()
			.expect("Store lock poisoned.")
			.insert(cache_key.to_string(), StoredVerdict { verdict: verdict.clone(), image_id });

		Box::pin(async move { Ok(()) })
	}

	fn register_image<'a>(
		&'a self,
		_storage_key: &'a str,
		_image: &'a NormalizedImage,
		_source: &'a str,
	) -> BoxFuture<'a, Result<Option<Uuid>>> {
		Box::pin(async move { Ok(Some(IMAGE_ID)) })
	}
}

struct BrokenStore;
impl VisionStore for BrokenStore {
	fn get<'a>(&'a self, _cache_key: &'a str) -> BoxFuture<'a, Result<Option<StoredVerdict>>> {
		Box::pin(async move { Err(Error::Storage { message: "connection refused".to_string() }) })
	}

	fn put<'a>(
		&'a self,
		_cache_key: &'a str,
		_verdict: &'a Verdict,
		_image_id: Option<Uuid>,
		_ttl_days: i64,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Err(Error::Storage { message: "connection refused".to_string() }) })
	}

	fn register_image<'a>(
		&'a self,
		_storage_key: &'a str,
		_image: &'a NormalizedImage,
		_source: &'a str,
	) -> BoxFuture<'a, Result<Option<Uuid>>> {
		Box::pin(async move { Err(Error::Storage { message: "connection refused".to_string() }) })
	}
}

#[derive(Default)]
struct MemoryImages {
	blobs: Mutex<HashMap<String, Vec<u8>>>,
}
impl ImageStore for MemoryImages {
	fn put<'a>(&'a self, image: &'a NormalizedImage) -> BoxFuture<'a, Result<String>> {
		let key = image.storage_key();

		self.blobs
			.lock()
			.expect("Blob lock poisoned.")
			.entry(key.clone())
			.or_insert_with(|| image.jpeg.clone());

		Box::pin(async move { Ok(key) })
	}
}

struct SpyVision {
	calls: Arc<AtomicUsize>,
	seen_sizes: Arc<Mutex<Vec<(u32, u32)>>>,
	reply: VisionReply,
}
impl SpyVision {
	fn new(reply: VisionReply) -> Self {
		Self { calls: Arc::new(AtomicUsize::new(0)), seen_sizes: Arc::default(), reply }
	}

	fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl VisionProvider for SpyVision {
	fn describe<'a>(
		&'a self,
		_cfg: &'a VisionProviderConfig,
		jpeg: &'a [u8],
		_lang: &'a str,
	) -> BoxFuture<'a, Result<VisionReply>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let decoded = image::load_from_memory(jpeg).expect("Provider received undecodable bytes.");

		self.seen_sizes
			.lock()
			.expect("Size lock poisoned.")
			.push((decoded.width(), decoded.height()));

		let reply = self.reply.clone();

		Box::pin(async move { Ok(reply) })
	}
}

struct PanicVision;
impl VisionProvider for PanicVision {
	fn describe<'a>(
		&'a self,
		_cfg: &'a VisionProviderConfig,
		_jpeg: &'a [u8],
		_lang: &'a str,
	) -> BoxFuture<'a, Result<VisionReply>> {
		panic!("Vision provider must not be called.");
	}
}

fn battery_reply() -> VisionReply {
	VisionReply::Content(
		r#"{"canonical_key":"Battery","confidence":0.82,"labels":["Battery","AA Cell"],"notes":null}"#
			.to_string(),
	)
}

fn recognizer(
	api_key: Option<&str>,
	provider: Arc<dyn VisionProvider>,
	store: Arc<dyn VisionStore>,
) -> Recognizer {
	Recognizer::new(
		provider_cfg(api_key),
		vision_cfg(),
		provider,
		store,
		Arc::new(MemoryImages::default()),
	)
}

#[tokio::test]
async fn cache_hit_never_calls_provider() {
	let input = png(64, 48);
	let normalized = normalize_image(&input, 768, 75).expect("Normalize failed.");
	let key = cache_key(&normalized.sha256, MODEL);
	let store = Arc::new(MemoryStore::default());
	let cached = Verdict {
		canonical_key: Some("glass_bottle".to_string()),
		confidence: 0.9,
		labels: vec!["bottle".to_string()],
		notes: None,
	};

	store.put(&key, &cached, None, 30).await.expect("Seeding the cache failed.");

	let recognizer = recognizer(Some("secret"), Arc::new(PanicVision), store.clone());
	let verdict = recognizer.recognize(&input, "de").await.expect("Recognize failed.");

	assert_eq!(verdict.cache_key, key);
	assert_eq!(verdict.verdict.canonical_key.as_deref(), Some("glass_bottle"));
	assert_eq!(verdict.verdict.notes.as_deref(), Some("cache_hit"));
	assert_eq!(verdict.image_id, Some(IMAGE_ID));
}

#[tokio::test]
async fn large_image_is_bounded_and_recognized_once() {
	let input = png(2_000, 2_000);
	let provider = Arc::new(SpyVision::new(battery_reply()));
	let store = Arc::new(MemoryStore::default());
	let recognizer = recognizer(Some("secret"), provider.clone(), store.clone());
	let first = recognizer.recognize(&input, "de").await.expect("Recognize failed.");

	assert_eq!(provider.count(), 1);

	let sizes = provider.seen_sizes.lock().expect("Size lock poisoned.").clone();

	assert_eq!(sizes.len(), 1);
	assert!(sizes[0].0 <= 768 && sizes[0].1 <= 768, "Unexpected size: {:?}", sizes[0]);
	assert_eq!(first.verdict.canonical_key.as_deref(), Some("battery"));
	assert_eq!(first.verdict.labels, vec!["battery".to_string(), "aa cell".to_string()]);
	assert!(first.cache_key.ends_with(":test-vision"));

	let second = recognizer.recognize(&input, "de").await.expect("Recognize failed.");

	assert_eq!(provider.count(), 1);
	assert_eq!(store.write_count(), 1);
	assert_eq!(second.cache_key, first.cache_key);
	assert_eq!(second.verdict.canonical_key.as_deref(), Some("battery"));
	assert_eq!(second.verdict.notes.as_deref(), Some("cache_hit"));
}

#[tokio::test]
async fn rejected_request_is_returned_as_data_and_cached() {
	let input = png(32, 32);
	let provider = Arc::new(SpyVision::new(VisionReply::Rejected {
		status: 503,
		body: "upstream overloaded".to_string(),
	}));
	let store = Arc::new(MemoryStore::default());
	let recognizer = recognizer(Some("secret"), provider.clone(), store.clone());
	let first = recognizer.recognize(&input, "en").await.expect("Recognize failed.");

	assert_eq!(
		first.verdict.notes.as_deref(),
		Some("vision_error: status=503 body=upstream overloaded")
	);
	assert!(first.verdict.canonical_key.is_none());
	assert_eq!(first.verdict.confidence, 0.0);

	let second = recognizer.recognize(&input, "en").await.expect("Recognize failed.");

	assert_eq!(second.verdict, first.verdict);
	assert_eq!(provider.count(), 1);
	assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn exhausted_attempts_become_timeout_verdict() {
	let provider = Arc::new(SpyVision::new(VisionReply::Unavailable {
		attempts: 2,
		last_error: "operation timed out".to_string(),
	}));
	let recognizer =
		recognizer(Some("secret"), provider.clone(), Arc::new(MemoryStore::default()));
	let verdict = recognizer.recognize(&png(16, 16), "en").await.expect("Recognize failed.");

	assert_eq!(verdict.verdict.notes.as_deref(), Some("vision_error: exception_or_timeout"));
	assert!(verdict.verdict.is_vision_failure());
}

#[tokio::test]
async fn unparseable_reply_is_parse_error_and_cached() {
	let provider =
		Arc::new(SpyVision::new(VisionReply::Content("I think it is a battery.".to_string())));
	let store = Arc::new(MemoryStore::default());
	let recognizer = recognizer(Some("secret"), provider.clone(), store.clone());
	let verdict = recognizer.recognize(&png(16, 16), "en").await.expect("Recognize failed.");

	assert_eq!(verdict.verdict.notes.as_deref(), Some("parse_error"));
	assert_eq!(provider.count(), 1);
	assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn missing_api_key_returns_stub_without_network() {
	let input = png(16, 16);
	let store = Arc::new(MemoryStore::default());
	let recognizer = recognizer(None, Arc::new(PanicVision), store.clone());
	let first = recognizer.recognize(&input, "de").await.expect("Recognize failed.");
	let second = recognizer.recognize(&input, "de").await.expect("Recognize failed.");

	assert_eq!(first.verdict, Verdict::stub());
	assert_eq!(second.verdict, Verdict::stub());
	assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn store_failures_degrade_to_a_miss() {
	let provider = Arc::new(SpyVision::new(battery_reply()));
	let recognizer = recognizer(Some("secret"), provider.clone(), Arc::new(BrokenStore));
	let verdict = recognizer.recognize(&png(40, 20), "de").await.expect("Recognize failed.");

	assert_eq!(provider.count(), 1);
	assert_eq!(verdict.verdict.canonical_key.as_deref(), Some("battery"));
	assert!(verdict.image_id.is_none());
}

#[tokio::test]
async fn noop_store_still_recognizes() {
	let provider = Arc::new(SpyVision::new(battery_reply()));
	let recognizer = recognizer(Some("secret"), provider.clone(), Arc::new(NoopVisionStore));
	let input = png(40, 20);

	recognizer.recognize(&input, "de").await.expect("Recognize failed.");
	recognizer.recognize(&input, "de").await.expect("Recognize failed.");

	assert_eq!(provider.count(), 2);
}

#[tokio::test]
async fn undecodable_bytes_are_rejected_before_the_provider() {
	let recognizer =
		recognizer(Some("secret"), Arc::new(PanicVision), Arc::new(MemoryStore::default()));
	let err = recognizer
		.recognize(b"not an image", "de")
		.await
		.expect_err("Expected invalid image.");

	assert!(matches!(err, Error::InvalidImage { .. }));
}

#[tokio::test]
async fn store_image_requires_a_registry() {
	let with_registry =
		recognizer(Some("secret"), Arc::new(PanicVision), Arc::new(MemoryStore::default()));
	let without_registry =
		recognizer(Some("secret"), Arc::new(PanicVision), Arc::new(NoopVisionStore));
	let input = png(1_000, 500);
	let stored = with_registry.store_image(&input, "admin").await.expect("Store failed.");

	assert_eq!(stored.image_id, IMAGE_ID);
	assert_eq!((stored.width, stored.height), (768, 384));
	assert_eq!(stored.sha256.len(), 64);

	let err = without_registry
		.store_image(&input, "admin")
		.await
		.expect_err("Expected store failure without a registry.");

	assert_eq!(err.code(), "image_store_failed");
}
