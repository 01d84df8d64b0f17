use std::{collections::HashMap, time::Duration};

use serde::Serialize;
use tokio::time;

use scout_domain::{candidate::Candidate, poster};
use scout_storage::models::MovieRecord;

use crate::{Error, MetadataStore, Result};

/// A retrieval hit joined with its display record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedCandidate {
	pub id: String,
	pub score: f32,
	pub title: String,
	pub overview: String,
	pub poster_url: Option<String>,
	pub genre: Option<String>,
	pub release_date: Option<String>,
}
impl EnrichedCandidate {
	pub fn from_record(candidate: &Candidate, record: MovieRecord, poster_base_url: &str) -> Self {
		Self {
			id: candidate.id.clone(),
			score: candidate.score,
			poster_url: poster::poster_url(record.poster_path.as_deref(), poster_base_url),
			title: record.title,
			overview: record.overview,
			genre: record.genre,
			release_date: record.release_date.map(|date| date.to_string()),
		}
	}
}

#[derive(Debug, Default)]
pub struct Hydrated {
	/// Hydrated candidates in retrieval order.
	pub enriched: Vec<EnrichedCandidate>,
	/// Candidate ids without a metadata row. They are not part of the response.
	pub missing: Vec<String>,
}

/// Resolves the candidate set against the metadata store through a single session.
///
/// Partial misses are reported in `missing`; only an unreachable store fails the call.
pub async fn hydrate(
	metadata: &dyn MetadataStore,
	candidates: &[Candidate],
	poster_base_url: &str,
	timeout: Duration,
) -> Result<Hydrated> {
	if candidates.is_empty() {
		return Ok(Hydrated::default());
	}

	let ids: Vec<String> = candidates.iter().map(|candidate| candidate.id.clone()).collect();
	let rows = time::timeout(timeout, async {
		let mut session = metadata.session().await?;

		session.fetch_many(&ids).await
	})
	.await
	.map_err(|_| Error::HydrationService {
		message: format!("Metadata lookup exceeded {} ms.", timeout.as_millis()),
	})?
	.map_err(|err| Error::HydrationService { message: err.message })?;
	let mut by_id: HashMap<String, MovieRecord> =
		rows.into_iter().map(|row| (row.movie_id.clone(), row)).collect();
	let mut hydrated = Hydrated::default();

	for candidate in candidates {
		match by_id.remove(&candidate.id) {
			Some(record) => hydrated.enriched.push(EnrichedCandidate::from_record(
				candidate,
				record,
				poster_base_url,
			)),
			None => hydrated.missing.push(candidate.id.clone()),
		}
	}

	if !hydrated.missing.is_empty() {
		tracing::warn!(
			missing = hydrated.missing.len(),
			hydrated = hydrated.enriched.len(),
			"Dropping candidates without metadata."
		);
	}

	Ok(hydrated)
}
