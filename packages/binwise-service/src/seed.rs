use serde::Serialize;
use sqlx::PgConnection;

use crate::{BinwiseService, Result};
use binwise_domain::alias_seed::{self, AliasCollision, AliasSeed};
use binwise_storage::{aliases, models::NewItemAlias};

pub const ALIAS_SOURCE_SEED: &str = "seed";

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SeedReport {
	pub titles: usize,
	pub rows: usize,
	pub inserted: usize,
	/// Rows whose `(lang, alias_norm)` already existed in the table.
	pub skipped: usize,
	pub collisions: Vec<AliasCollision>,
	pub dry_run: bool,
}

impl BinwiseService {
	/// Generates aliases from every item title translation and inserts the ones not yet present.
	pub async fn seed_aliases(&self, lang: Option<&str>, dry_run: bool) -> Result<SeedReport> {
		let mut tx = self.db.pool.begin().await?;
		let report = seed_with(&mut *tx, lang, dry_run).await?;

		tx.commit().await?;

		tracing::info!(
			titles = report.titles,
			rows = report.rows,
			inserted = report.inserted,
			skipped = report.skipped,
			collisions = report.collisions.len(),
			dry_run,
			"Alias seeding finished."
		);

		for collision in &report.collisions {
			tracing::warn!(
				lang = %collision.lang,
				alias_norm = %collision.alias_norm,
				winner = %collision.winner,
				loser = %collision.loser,
				"Alias collision."
			);
		}

		Ok(report)
	}
}

pub async fn seed_with(
	executor: &mut PgConnection,
	lang: Option<&str>,
	dry_run: bool,
) -> Result<SeedReport> {
	let titles = aliases::list_item_titles(executor, lang).await?;
	let mut seed = AliasSeed::new();

	for title in &titles {
		seed.extend(alias_seed::generate_aliases(&title.canonical_key, &title.lang, &title.title));
	}

	let (rows, collisions) = seed.into_parts();
	let mut report = SeedReport {
		titles: titles.len(),
		rows: rows.len(),
		collisions,
		dry_run,
		..SeedReport::default()
	};

	if dry_run {
		return Ok(report);
	}

	for row in &rows {
		let inserted = aliases::insert_if_absent(
			executor,
			&NewItemAlias {
				canonical_key: &row.canonical_key,
				lang: &row.lang,
				alias_text: &row.alias_text,
				alias_norm: &row.alias_norm,
				alias_type: row.alias_type.as_str(),
				source: ALIAS_SOURCE_SEED,
				confidence: row.confidence,
			},
		)
		.await?;

		if inserted {
			report.inserted += 1;
		} else {
			report.skipped += 1;
		}
	}

	Ok(report)
}
