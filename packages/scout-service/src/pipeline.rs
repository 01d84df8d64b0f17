use std::{collections::HashMap, time::Duration};

use serde::{Deserialize, Serialize};

use scout_domain::query;

use crate::{
	EnrichedCandidate, Error, ErrorKind, Result, ScoutService, augment, embed, hydrate,
	reason::{self, Reasoned, ReasoningStatus},
	retrieve,
};

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendRequest {
	pub query: String,
	#[serde(default)]
	pub selected_movie_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedMovie {
	pub id: String,
	pub title: String,
	pub overview: String,
	pub poster_url: Option<String>,
	pub score: f32,
	pub rank: u32,
	/// Empty when reasoning degraded.
	pub explanation: String,
	pub genre: Option<String>,
	pub release_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendResponse {
	pub ai_reasoning: String,
	pub movies: Vec<RecommendedMovie>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
	Received,
	Augmented,
	Embedded,
	Retrieved,
	Hydrated,
	Reasoned,
	Completed,
	Failed(ErrorKind),
}

/// A completed recommendation plus how it got there.
#[derive(Debug, Clone)]
pub struct RecommendOutcome {
	pub response: RecommendResponse,
	pub stages: Vec<PipelineStage>,
	pub reasoning: ReasoningStatus,
	/// Candidates dropped for lack of metadata.
	pub missing: Vec<String>,
}

struct StageTrace {
	stages: Vec<PipelineStage>,
}
impl StageTrace {
	fn start() -> Self {
		tracing::debug!(stage = ?PipelineStage::Received, "Pipeline stage reached.");

		Self { stages: vec![PipelineStage::Received] }
	}

	fn enter(&mut self, stage: PipelineStage) {
		tracing::debug!(stage = ?stage, "Pipeline stage reached.");

		self.stages.push(stage);
	}

	fn fail(&mut self, err: Error) -> Error {
		let after = self.stages.last().copied().unwrap_or(PipelineStage::Received);
		let kind = err.kind();

		match kind {
			ErrorKind::InvalidInput => {
				tracing::info!(after = ?after, error = %err, "Recommendation rejected.")
			},
			_ => {
				tracing::error!(after = ?after, kind = ?kind, error = %err, "Recommendation failed.")
			},
		}

		self.stages.push(PipelineStage::Failed(kind));

		err
	}
}

impl ScoutService {
	pub async fn recommend(&self, req: RecommendRequest) -> Result<RecommendResponse> {
		Ok(self.recommend_traced(req).await?.response)
	}

	/// Runs the pipeline strictly in stage order.
	///
	/// Invalid input, embedding, retrieval, and total metadata failures end the request with an
	/// error and no response. Reasoning problems degrade to score order instead.
	pub async fn recommend_traced(&self, req: RecommendRequest) -> Result<RecommendOutcome> {
		let mut trace = StageTrace::start();
		let recommend = &self.cfg.recommend;
		let query = query::validate_query(&req.query, recommend.max_query_chars)
			.map_err(|err| trace.fail(err.into()))?;
		let augmented = augment::augment_query(
			self.stores.metadata.as_ref(),
			query,
			&req.selected_movie_ids,
			recommend.max_prior_selections,
			Duration::from_millis(self.cfg.storage.postgres.query_timeout_ms),
		)
		.await;

		trace.enter(PipelineStage::Augmented);

		let vector = embed::embed_query(
			self.providers.embedding.as_ref(),
			&self.cfg.providers.embedding,
			&augmented.text,
			Duration::from_millis(recommend.embedding_retry_backoff_ms),
		)
		.await
		.map_err(|err| trace.fail(err))?;

		trace.enter(PipelineStage::Embedded);

		let candidates = retrieve::retrieve(
			self.stores.index.as_ref(),
			&vector,
			recommend.candidate_k,
			recommend.namespace.as_deref(),
			Duration::from_millis(self.cfg.storage.qdrant.timeout_ms),
		)
		.await
		.map_err(|err| trace.fail(err))?;

		trace.enter(PipelineStage::Retrieved);

		let hydrated = hydrate::hydrate(
			self.stores.metadata.as_ref(),
			&candidates,
			&self.cfg.catalog.poster_base_url,
			Duration::from_millis(self.cfg.storage.postgres.query_timeout_ms),
		)
		.await
		.map_err(|err| trace.fail(err))?;

		trace.enter(PipelineStage::Hydrated);

		let reasoned =
			self.reason_or_degrade(query, &augmented.liked_titles, &hydrated.enriched).await;

		trace.enter(PipelineStage::Reasoned);

		let response = assemble(&reasoned, &hydrated.enriched);

		trace.enter(PipelineStage::Completed);
		tracing::info!(
			candidates = candidates.len(),
			hydrated = hydrated.enriched.len(),
			returned = response.movies.len(),
			degraded = reasoned.status.is_degraded(),
			"Recommendation completed."
		);

		Ok(RecommendOutcome {
			response,
			stages: trace.stages,
			reasoning: reasoned.status,
			missing: hydrated.missing,
		})
	}

	async fn reason_or_degrade(
		&self,
		query: &str,
		liked_titles: &[String],
		candidates: &[EnrichedCandidate],
	) -> Reasoned {
		let top_n = self.cfg.recommend.top_n;

		match reason::rank_candidates(
			self.providers.reasoning.as_ref(),
			&self.cfg.providers.llm_reasoner,
			query,
			liked_titles,
			candidates,
			top_n,
		)
		.await
		{
			Ok(reasoned) => reasoned,
			Err(err) => {
				tracing::warn!(
					provider_id = %self.cfg.providers.llm_reasoner.provider_id,
					error = %err,
					"Reasoning unavailable. Falling back to score order."
				);

				reason::fallback(candidates, top_n, ReasoningStatus::ServiceFailed)
			},
		}
	}
}

fn assemble(reasoned: &Reasoned, candidates: &[EnrichedCandidate]) -> RecommendResponse {
	let by_id: HashMap<&str, &EnrichedCandidate> =
		candidates.iter().map(|candidate| (candidate.id.as_str(), candidate)).collect();
	let movies = reasoned
		.picks
		.iter()
		.filter_map(|pick| {
			let candidate = by_id.get(pick.id.as_str())?;

			Some(RecommendedMovie {
				id: candidate.id.clone(),
				title: candidate.title.clone(),
				overview: candidate.overview.clone(),
				poster_url: candidate.poster_url.clone(),
				score: candidate.score,
				rank: pick.rank,
				explanation: pick.explanation.clone(),
				genre: candidate.genre.clone(),
				release_date: candidate.release_date.clone(),
			})
		})
		.collect();

	RecommendResponse { ai_reasoning: reasoned.ai_reasoning.clone(), movies }
}
