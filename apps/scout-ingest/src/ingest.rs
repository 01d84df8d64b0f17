use std::{collections::HashMap, time::Duration};

use qdrant_client::{
	Payload,
	qdrant::{PointStruct, UpsertPointsBuilder, Vector},
};
use reqwest::Client;
use tokio::time;

use scout_config::EmbeddingProviderConfig;
use scout_providers::embedding;
use scout_storage::{
	db::Db,
	models::MovieRecord,
	movies,
	qdrant::{self, DENSE_VECTOR_NAME, MOVIE_ID_PAYLOAD_KEY, QdrantStore},
};

use crate::{Error, Result, catalog};

const MAX_PAYLOAD_OVERVIEW_CHARS: usize = 500;

pub struct IngestOptions {
	pub batch_size: usize,
	pub pause: Duration,
	pub cooldown: Duration,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
	pub batches: usize,
	pub failed_batches: usize,
	pub ingested: usize,
}

pub struct Ingestor {
	pub db: Db,
	pub qdrant: QdrantStore,
	pub http: Client,
	pub embedding: EmbeddingProviderConfig,
	pub options: IngestOptions,
}
impl Ingestor {
	/// Embeds and stores `records` batch by batch.
	///
	/// A failed batch is logged and skipped after the cool-down so one bad batch cannot stop a
	/// long import.
	pub async fn run(&self, records: &[MovieRecord]) -> IngestReport {
		let mut report = IngestReport::default();
		let total = records.len().div_ceil(self.options.batch_size);

		for (index, batch) in records.chunks(self.options.batch_size).enumerate() {
			report.batches += 1;

			match self.ingest_batch(batch).await {
				Ok(()) => {
					report.ingested += batch.len();

					tracing::info!(batch = index + 1, total, size = batch.len(), "Batch ingested.");

					time::sleep(self.options.pause).await;
				},
				Err(err) => {
					report.failed_batches += 1;

					tracing::error!(
						batch = index + 1,
						first_movie_id = %batch[0].movie_id,
						error = %err,
						"Batch failed. Cooling down."
					);

					time::sleep(self.options.cooldown).await;
				},
			}
		}

		report
	}

	async fn ingest_batch(&self, batch: &[MovieRecord]) -> Result<()> {
		let texts: Vec<String> = batch.iter().map(catalog::embedding_text).collect();
		let vectors = embedding::embed(&self.http, &self.embedding, &texts).await?;

		for vector in &vectors {
			validate_vector_dim(vector, self.qdrant.vector_dim)?;
		}

		let mut tx = self.db.pool.begin().await?;

		movies::upsert_movies(&mut tx, batch).await?;
		tx.commit().await?;

		let points = batch.iter().zip(vectors).map(|(record, vector)| movie_point(record, vector));
		let upsert =
			UpsertPointsBuilder::new(self.qdrant.collection.clone(), points.collect::<Vec<_>>())
				.wait(true);

		self.qdrant.client.upsert_points(upsert).await?;

		Ok(())
	}
}

fn validate_vector_dim(vector: &[f32], expected_dim: u32) -> Result<()> {
	if vector.len() != expected_dim as usize {
		return Err(Error::Validation(format!(
			"Embedding dimension mismatch: got {}, expected {expected_dim}.",
			vector.len()
		)));
	}
	if vector.iter().any(|value| !value.is_finite()) {
		return Err(Error::Validation("Embedding contains a non-finite value.".to_string()));
	}

	Ok(())
}

fn movie_point(record: &MovieRecord, vector: Vec<f32>) -> PointStruct {
	let mut payload = Payload::new();

	payload.insert(MOVIE_ID_PAYLOAD_KEY, record.movie_id.clone());
	payload.insert("title", record.title.clone());
	payload.insert("overview", truncate_chars(&record.overview, MAX_PAYLOAD_OVERVIEW_CHARS));

	let vectors = HashMap::from([(DENSE_VECTOR_NAME.to_string(), Vector::from(vector))]);

	PointStruct::new(qdrant::point_id_for(&record.movie_id), vectors, payload)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
	match text.char_indices().nth(max_chars) {
		Some((end, _)) => text[..end].to_string(),
		None => text.to_string(),
	}
}
