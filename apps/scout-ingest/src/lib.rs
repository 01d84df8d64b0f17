pub mod catalog;
pub mod ingest;

mod error;

pub use error::{Error, Result};

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use scout_cli::ConfigArgs;
use scout_storage::{db::Db, qdrant::QdrantStore};

use crate::ingest::{IngestOptions, Ingestor};

#[derive(Debug, Parser)]
#[command(
	version = scout_cli::VERSION,
	rename_all = "kebab",
	styles = scout_cli::styles(),
)]
pub struct Args {
	#[command(flatten)]
	pub config: ConfigArgs,
	/// Catalog export in the `movies_metadata.csv` layout.
	#[arg(long, value_name = "FILE")]
	pub csv: PathBuf,
	#[arg(long, default_value_t = 100)]
	pub batch_size: usize,
	/// Only rows whose `original_language` matches are ingested.
	#[arg(long, default_value = "en")]
	pub language: String,
	/// Pause between successful batches.
	#[arg(long, default_value_t = 1_000)]
	pub pause_ms: u64,
	/// Pause after a failed batch before moving on.
	#[arg(long, default_value_t = 5_000)]
	pub cooldown_ms: u64,
	/// Stop after this many accepted rows.
	#[arg(long)]
	pub limit: Option<usize>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = scout_config::load(&args.config.config)?;

	scout_cli::init_tracing(&config.service.log_level);

	if args.batch_size == 0 {
		return Err(color_eyre::eyre::eyre!("--batch-size must be greater than zero."));
	}

	let mut movies = catalog::read_catalog_file(&args.csv, &args.language)?;

	if let Some(limit) = args.limit {
		movies.records.truncate(limit);
	}

	tracing::info!(
		accepted = movies.records.len(),
		skipped = movies.skipped,
		path = %args.csv.display(),
		"Catalog loaded."
	);

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let qdrant = QdrantStore::new(&config.storage.qdrant)?;

	if qdrant.ensure_collection().await? {
		tracing::info!(collection = %qdrant.collection, "Created vector collection.");
	}

	let ingestor = Ingestor {
		db,
		qdrant,
		http: scout_providers::http_client()?,
		embedding: config.providers.embedding,
		options: IngestOptions {
			batch_size: args.batch_size,
			pause: Duration::from_millis(args.pause_ms),
			cooldown: Duration::from_millis(args.cooldown_ms),
		},
	};
	let report = ingestor.run(&movies.records).await;

	ingestor.db.close().await;

	tracing::info!(
		ingested = report.ingested,
		batches = report.batches,
		failed_batches = report.failed_batches,
		"Ingestion finished."
	);

	Ok(())
}
