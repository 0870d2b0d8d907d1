use serde_json::json;

use binwise_config::Postgres;
use binwise_storage::{
	aliases, cities,
	db::Db,
	image_assets, items,
	models::{NewImageAsset, NewItemAlias, NewProspect, NewScanEvent, NewVisionCacheEntry},
	prospects, rules, scan_events, vision_cache,
};
use binwise_testkit::{TestDatabase, fixtures};

async fn setup(test_name: &str) -> Option<(TestDatabase, Db)> {
	let Some(base_dsn) = binwise_testkit::env_dsn() else {
		eprintln!("Skipping {test_name}; set BINWISE_PG_DSN to run this test.");

		return None;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	Some((test_db, db))
}

fn sample_asset(sha: &str) -> NewImageAsset<'_> {
	NewImageAsset {
		storage_key: "data/images/sample.jpg",
		normalized_sha256: sha,
		content_type: "image/jpeg",
		byte_size: 1_024,
		width: 32,
		height: 16,
		source: "scan",
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINWISE_PG_DSN to run."]
async fn schema_bootstrap_is_idempotent() {
	let Some((test_db, db)) = setup("schema_bootstrap_is_idempotent").await else {
		return;
	};

	db.ensure_schema().await.expect("Second bootstrap must succeed.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_schema = 'core'",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 15);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINWISE_PG_DSN to run."]
async fn alias_match_is_city_scoped() {
	let Some((test_db, db)) = setup("alias_match_is_city_scoped").await else {
		return;
	};
	let hannover = fixtures::city(&db.pool, "hannover", true).await.expect("city");
	let berlin = fixtures::city(&db.pool, "berlin", true).await.expect("city");
	let akkus = fixtures::item(&db.pool, "akkus").await.expect("item");
	let hazardous = fixtures::disposal(&db.pool, "hazardous_waste").await.expect("disposal");

	fixtures::assign_disposal(&db.pool, hannover, akkus, hazardous, 1).await.expect("assign");
	fixtures::alias(&db.pool, "akkus", "de", "Batterie", "batterie").await.expect("alias");

	let mut conn = db.pool.acquire().await.expect("Failed to acquire connection.");
	let found = aliases::match_alias(&mut conn, "batterie", "de", hannover)
		.await
		.expect("Alias lookup failed.");
	let other_city = aliases::match_alias(&mut conn, "batterie", "de", berlin)
		.await
		.expect("Alias lookup failed.");
	let other_lang = aliases::match_alias(&mut conn, "batterie", "en", hannover)
		.await
		.expect("Alias lookup failed.");

	assert_eq!(found, Some(akkus));
	assert_eq!(other_city, None);
	assert_eq!(other_lang, None);

	drop(conn);
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINWISE_PG_DSN to run."]
async fn alias_insert_keeps_first_row() {
	let Some((test_db, db)) = setup("alias_insert_keeps_first_row").await else {
		return;
	};

	fixtures::item(&db.pool, "bottle").await.expect("item");
	fixtures::item(&db.pool, "glass").await.expect("item");

	let mut conn = db.pool.acquire().await.expect("Failed to acquire connection.");
	let first = NewItemAlias {
		canonical_key: "bottle",
		lang: "de",
		alias_text: "Flasche",
		alias_norm: "flasche",
		alias_type: "primary",
		source: "seed",
		confidence: 1.0,
	};
	let second = NewItemAlias { canonical_key: "glass", ..first };

	assert!(aliases::insert_if_absent(&mut conn, &first).await.expect("insert"));
	assert!(!aliases::insert_if_absent(&mut conn, &second).await.expect("insert"));

	let stored = aliases::get(&mut conn, "de", "flasche").await.expect("get").expect("alias");

	assert_eq!(stored.canonical_key, "bottle");

	drop(conn);
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINWISE_PG_DSN to run."]
async fn name_match_prefers_title_and_rules_are_ordered() {
	let Some((test_db, db)) = setup("name_match_prefers_title_and_rules_are_ordered").await else {
		return;
	};
	let city = fixtures::city(&db.pool, "hannover", true).await.expect("city");
	let glas = fixtures::item(&db.pool, "glas").await.expect("item");
	let jar = fixtures::item(&db.pool, "jar").await.expect("item");
	let container = fixtures::category(&db.pool, "container").await.expect("category");
	let altglas = fixtures::category(&db.pool, "altglas").await.expect("category");
	let sharp = fixtures::warning(&db.pool, "sharp", 2).await.expect("warning");

	fixtures::translation(&db.pool, &fixtures::title_key("jar"), "de", "Glas")
		.await
		.expect("translation");
	fixtures::translation(&db.pool, "category.altglas", "de", "Altglas").await.expect("translation");
	fixtures::assign_category(&db.pool, city, glas, altglas, 1).await.expect("assign");
	fixtures::assign_category(&db.pool, city, jar, container, 5).await.expect("assign");
	fixtures::assign_category(&db.pool, city, jar, altglas, 5).await.expect("assign");
	fixtures::assign_warning(&db.pool, city, jar, sharp, 1).await.expect("assign");

	let mut conn = db.pool.acquire().await.expect("Failed to acquire connection.");
	// "Glas" is both the German title of jar and the canonical key of glas; titles win.
	let matched = items::match_name(&mut conn, " GLAS ", "de", city).await.expect("match");

	assert_eq!(matched, Some(jar));

	let categories = rules::list_categories(&mut conn, city, jar, "de").await.expect("categories");
	let codes: Vec<&str> = categories.iter().map(|rule| rule.code.as_str()).collect();

	assert_eq!(codes, vec!["altglas", "container"]);
	assert_eq!(categories[0].label.as_deref(), Some("Altglas"));
	assert_eq!(categories[1].label, None);

	let warnings = rules::list_warnings(&mut conn, city, jar, "en").await.expect("warnings");

	assert_eq!(warnings.len(), 1);
	assert_eq!(warnings[0].severity, 2);
	assert_eq!(warnings[0].title, None);

	drop(conn);
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINWISE_PG_DSN to run."]
async fn inactive_cities_are_invisible() {
	let Some((test_db, db)) = setup("inactive_cities_are_invisible").await else {
		return;
	};
	let hannover = fixtures::city(&db.pool, "hannover", true).await.expect("city");

	fixtures::city(&db.pool, "berlin", true).await.expect("city");
	fixtures::city(&db.pool, "paused", false).await.expect("city");

	let mut conn = db.pool.acquire().await.expect("Failed to acquire connection.");

	assert!(cities::find_active_by_code(&mut conn, "paused").await.expect("lookup").is_none());

	let others = cities::list_active_except(&mut conn, hannover).await.expect("list");
	let codes: Vec<&str> = others.iter().map(|city| city.code.as_str()).collect();

	assert_eq!(codes, vec!["berlin"]);

	drop(conn);
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINWISE_PG_DSN to run."]
async fn prospects_are_written_once_per_natural_key() {
	let Some((test_db, db)) = setup("prospects_are_written_once_per_natural_key").await else {
		return;
	};
	let city = fixtures::city(&db.pool, "hannover", true).await.expect("city");
	let item = fixtures::item(&db.pool, "sofa").await.expect("item");
	let mut conn = db.pool.acquire().await.expect("Failed to acquire connection.");
	let by_item = NewProspect {
		item_id: Some(item),
		city_id: city,
		lang: "de",
		reason: "missing_city_rules",
		search_text: None,
		search_norm: None,
	};
	let by_text = NewProspect {
		item_id: None,
		city_id: city,
		lang: "de",
		reason: "unknown_item",
		search_text: Some("Blumen-Topf"),
		search_norm: Some("blumen topf"),
	};

	assert!(prospects::insert_if_absent(&mut conn, &by_item).await.expect("insert"));
	assert!(!prospects::insert_if_absent(&mut conn, &by_item).await.expect("insert"));
	assert!(prospects::insert_if_absent(&mut conn, &by_text).await.expect("insert"));
	assert!(
		!prospects::insert_if_absent(
			&mut conn,
			&NewProspect { search_text: Some("blumen topf"), ..by_text }
		)
		.await
		.expect("insert")
	);

	let item_prospect = prospects::find_id_for_item(&mut conn, item, city, "de").await.expect("find");
	let text_prospect =
		prospects::find_id_for_search(&mut conn, "blumen topf", city, "de").await.expect("find");
	let listed = prospects::list_for_city(&mut conn, city, "de").await.expect("list");

	assert!(item_prospect.is_some());
	assert!(text_prospect.is_some());
	assert_eq!(listed.len(), 2);
	assert!(listed.iter().all(|prospect| prospect.status == "pending"));

	let empty = NewProspect { search_norm: Some(""), ..by_text };

	assert!(matches!(
		prospects::insert_if_absent(&mut conn, &empty).await,
		Err(binwise_storage::Error::ProspectWithoutKey)
	));

	drop(conn);
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINWISE_PG_DSN to run."]
async fn vision_cache_upsert_keeps_image_reference() {
	let Some((test_db, db)) = setup("vision_cache_upsert_keeps_image_reference").await else {
		return;
	};
	let mut conn = db.pool.acquire().await.expect("Failed to acquire connection.");
	let image_id =
		image_assets::upsert(&mut conn, &sample_asset("abc123")).await.expect("asset upsert");
	let labels = json!(["battery"]);
	let first = NewVisionCacheEntry {
		cache_key: "abc123:gpt-4o-mini",
		image_id: Some(image_id),
		canonical_key: Some("battery"),
		confidence: 0.8,
		labels: &labels,
		notes: None,
	};

	vision_cache::upsert(&mut conn, &first, 30).await.expect("cache upsert");

	let second =
		NewVisionCacheEntry { image_id: None, canonical_key: None, confidence: 0.2, ..first };

	vision_cache::upsert(&mut conn, &second, 30).await.expect("cache upsert");

	let entry = vision_cache::get_live(&mut conn, "abc123:gpt-4o-mini")
		.await
		.expect("cache get")
		.expect("Expected live cache entry.");

	assert_eq!(entry.image_id, Some(image_id));
	assert_eq!(entry.canonical_key, None);
	assert!((entry.confidence - 0.2).abs() < 1e-6);
	assert_eq!(entry.labels, labels);

	sqlx::query("UPDATE core.vision_cache SET expires_at = now() - interval '1 minute'")
		.execute(&mut *conn)
		.await
		.expect("Failed to expire cache entry.");

	assert!(
		vision_cache::get_live(&mut conn, "abc123:gpt-4o-mini").await.expect("cache get").is_none()
	);
	assert!(vision_cache::upsert(&mut conn, &first, 0).await.is_err());

	drop(conn);
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINWISE_PG_DSN to run."]
async fn image_assets_and_scan_events_link_by_hash() {
	let Some((test_db, db)) = setup("image_assets_and_scan_events_link_by_hash").await else {
		return;
	};
	let city = fixtures::city(&db.pool, "hannover", true).await.expect("city");
	let mut conn = db.pool.acquire().await.expect("Failed to acquire connection.");
	let first = image_assets::upsert(&mut conn, &sample_asset("feed")).await.expect("upsert");
	let again = image_assets::upsert(
		&mut conn,
		&NewImageAsset { storage_key: "data/images/moved.jpg", ..sample_asset("feed") },
	)
	.await
	.expect("upsert");

	assert_eq!(first, again);

	let asset = image_assets::get_by_sha256(&mut conn, "feed")
		.await
		.expect("get")
		.expect("Expected image asset.");

	assert_eq!(asset.storage_key, "data/images/moved.jpg");
	assert_eq!(asset.width, Some(32));

	scan_events::insert(
		&mut conn,
		&NewScanEvent {
			image_id: first,
			cache_key: Some("feed:gpt-4o-mini"),
			city_id: city,
			item_id: None,
			prospect_id: None,
			search_text: Some("Batterie"),
			source: "scan",
		},
	)
	.await
	.expect("scan insert");

	assert_eq!(scan_events::count_for_image(&mut conn, first).await.expect("count"), 1);

	drop(conn);
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
