use std::{
	path::{Path, PathBuf},
	sync::Arc,
};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{self, WrapErr};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use binwise_config::Config;
use binwise_service::{
	AnalyzeRequest, BinwiseService, FsImageStore, NoopVisionStore, Providers, Recognizer,
	ResolveRequest, VisionVerdict,
};
use binwise_storage::db::Db;

const DEFAULT_LANG: &str = "de";

#[derive(Debug, Parser)]
#[command(
	version = binwise_cli::VERSION,
	rename_all = "kebab",
	styles = binwise_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Create or upgrade the database schema.
	InitSchema,
	/// Resolve an item id or free-text name against a city's rules.
	Resolve {
		#[arg(long)]
		city: String,
		#[arg(long, value_name = "UUID", required_unless_present = "item_name")]
		item_id: Option<String>,
		#[arg(long, value_name = "TEXT")]
		item_name: Option<String>,
		#[arg(long, default_value = DEFAULT_LANG)]
		lang: String,
	},
	/// Recognize a photo through the vision cache.
	Recognize {
		#[arg(long, short = 'i', value_name = "FILE")]
		image: PathBuf,
		#[arg(long, default_value = DEFAULT_LANG)]
		lang: String,
	},
	/// Recognize a photo, resolve the result and log a scan event.
	Analyze {
		#[arg(long)]
		city: String,
		#[arg(long, short = 'i', value_name = "FILE")]
		image: PathBuf,
		#[arg(long, default_value = DEFAULT_LANG)]
		lang: String,
		#[arg(long, value_name = "TEXT")]
		search_text: Option<String>,
	},
	/// Generate aliases from item titles.
	SeedAliases {
		/// Only seed titles in this language.
		#[arg(long)]
		lang: Option<String>,
		#[arg(long)]
		dry_run: bool,
	},
}

#[derive(Debug, Serialize)]
struct SchemaReady {
	schema: &'static str,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = binwise_config::load(&args.config)?;

	init_tracing(&config)?;

	match args.command {
		Command::Recognize { image, lang } => {
			let bytes = read_image(&image).await?;
			let verdict = recognize_image(config, &bytes, &lang).await?;

			print_json(&verdict)
		},
		command => {
			let db = connect(&config).await?;

			execute(&BinwiseService::new(config, db), command).await
		},
	}
}

/// Recognizes through the Postgres-backed cache, or without any cache when Postgres is
/// unreachable.
pub async fn recognize_image(
	config: Config,
	image_bytes: &[u8],
	lang: &str,
) -> color_eyre::Result<VisionVerdict> {
	let verdict = match connect(&config).await {
		Ok(db) => BinwiseService::new(config, db).recognize(image_bytes, lang).await?,
		Err(err) => {
			tracing::warn!(error = %err, "Postgres is unavailable. Recognizing without the cache.");

			uncached_recognizer(&config).recognize(image_bytes, lang).await?
		},
	};

	Ok(verdict)
}

async fn execute(service: &BinwiseService, command: Command) -> color_eyre::Result<()> {
	match command {
		Command::InitSchema => print_json(&SchemaReady { schema: "ready" }),
		Command::Resolve { city, item_id, item_name, lang } => {
			let outcome =
				service.resolve(ResolveRequest { city, item_id, item_name, lang }).await?;

			print_json(&outcome)
		},
		Command::Recognize { image, lang } => {
			let bytes = read_image(&image).await?;
			let verdict = service.recognize(&bytes, &lang).await?;

			print_json(&verdict)
		},
		Command::Analyze { city, image, lang, search_text } => {
			let image_bytes = read_image(&image).await?;
			let response = service
				.analyze(AnalyzeRequest { city, lang, image_bytes, search_text })
				.await?;

			print_json(&response)
		},
		Command::SeedAliases { lang, dry_run } => {
			let report = service.seed_aliases(lang.as_deref(), dry_run).await?;

			print_json(&report)
		},
	}
}

async fn connect(config: &Config) -> color_eyre::Result<Db> {
	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	Ok(db)
}

fn uncached_recognizer(config: &Config) -> Recognizer {
	Recognizer::new(
		config.providers.vision.clone(),
		config.vision.clone(),
		Providers::default().vision,
		Arc::new(NoopVisionStore),
		Arc::new(FsImageStore::new(config.vision.image_dir.clone())),
	)
}

fn init_tracing(config: &Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}

async fn read_image(path: &Path) -> color_eyre::Result<Vec<u8>> {
	let bytes = tokio::fs::read(path)
		.await
		.wrap_err_with(|| format!("Failed to read image {}.", path.display()))?;

	if bytes.is_empty() {
		return Err(eyre::eyre!("Image file {} is empty.", path.display()));
	}

	Ok(bytes)
}

fn print_json<T>(value: &T) -> color_eyre::Result<()>
where
	T: Serialize,
{
	let json = serde_json::to_string_pretty(value)?;

	println!("{json}");

	Ok(())
}
