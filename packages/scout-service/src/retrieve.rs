use std::{collections::HashMap, time::Duration};

use qdrant_client::qdrant::{
	Query, QueryPointsBuilder, ScoredPoint, Value, point_id::PointIdOptions, value::Kind,
};
use tokio::time;

use scout_domain::candidate::{self, Candidate};
use scout_storage::qdrant::{DENSE_VECTOR_NAME, MOVIE_ID_PAYLOAD_KEY, QdrantStore};

use crate::{BoxFuture, Error, Result, UpstreamError, UpstreamResult, VectorIndex};

/// Fetches up to `k` candidates, best first.
///
/// The index output is re-ordered by descending score (stable, so ties keep the index's order) and
/// duplicate ids are collapsed. An empty result is not an error.
pub async fn retrieve(
	index: &dyn VectorIndex,
	vector: &[f32],
	k: u32,
	namespace: Option<&str>,
	timeout: Duration,
) -> Result<Vec<Candidate>> {
	let raw = time::timeout(timeout, index.query(vector, k, namespace))
		.await
		.map_err(|_| Error::RetrievalService {
			message: format!("Vector index query exceeded {} ms.", timeout.as_millis()),
		})?
		.map_err(|err| Error::RetrievalService { message: err.message })?;
	let returned = raw.len();
	let candidates = candidate::order_candidates(raw, k);

	if candidates.len() < returned.min(k as usize) {
		tracing::debug!(
			returned,
			kept = candidates.len(),
			"Dropped duplicate or invalid index hits."
		);
	}

	Ok(candidates)
}

impl VectorIndex for QdrantStore {
	fn query<'a>(
		&'a self,
		vector: &'a [f32],
		k: u32,
		namespace: Option<&'a str>,
	) -> BoxFuture<'a, UpstreamResult<Vec<Candidate>>> {
		Box::pin(async move {
			let collection = namespace.unwrap_or(self.collection.as_str());
			let search = QueryPointsBuilder::new(collection.to_string())
				.query(Query::new_nearest(vector.to_vec()))
				.using(DENSE_VECTOR_NAME)
				.limit(u64::from(k))
				.with_payload(true);
			let response = self
				.client
				.query(search)
				.await
				.map_err(|err| UpstreamError::permanent(err.to_string()))?;

			Ok(response.result.into_iter().filter_map(candidate_from_point).collect())
		})
	}
}

fn candidate_from_point(point: ScoredPoint) -> Option<Candidate> {
	let id = payload_string(&point.payload, MOVIE_ID_PAYLOAD_KEY)
		.or_else(|| match point.id.and_then(|id| id.point_id_options) {
			Some(PointIdOptions::Num(num)) => Some(num.to_string()),
			Some(PointIdOptions::Uuid(uuid)) => Some(uuid),
			None => None,
		})?;

	Some(Candidate { id, score: point.score })
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) if !text.trim().is_empty() => Some(text.to_string()),
		Some(Kind::IntegerValue(num)) => Some(num.to_string()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use qdrant_client::qdrant::PointId;

	use super::*;

	fn point(id: PointId, payload: HashMap<String, Value>, score: f32) -> ScoredPoint {
		ScoredPoint { id: Some(id), payload, score, ..Default::default() }
	}

	#[test]
	fn payload_movie_id_wins_over_point_id() {
		let payload = HashMap::from([(MOVIE_ID_PAYLOAD_KEY.to_string(), Value::from("tt42"))]);
		let candidate =
			candidate_from_point(point(PointId::from(7_u64), payload, 0.8)).expect("Expected id.");

		assert_eq!(candidate, Candidate { id: "tt42".to_string(), score: 0.8 });
	}

	#[test]
	fn numeric_point_id_is_used_without_payload() {
		let candidate = candidate_from_point(point(PointId::from(862_u64), HashMap::new(), 0.5))
			.expect("Expected id.");

		assert_eq!(candidate.id, "862");
	}
}
