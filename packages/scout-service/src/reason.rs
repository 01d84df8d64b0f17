use std::{collections::HashSet, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time;

use scout_config::LlmProviderConfig;
use scout_domain::picks::{self, DiscardReason, ModelPick, RankedExplanation};
use scout_providers::reasoning;

use crate::{EnrichedCandidate, Error, ReasoningProvider, Result};

pub const NO_MATCHES_REASONING: &str = "I couldn't find any matches. Try a broader search.";
pub const DEGRADED_REASONING: &str = "Here are the most relevant movies from our catalog.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningStatus {
	/// The model's picks were used.
	Complete,
	/// There was nothing to reason over.
	NoCandidates,
	/// The reasoning call failed or timed out.
	ServiceFailed,
	/// The reply was not the expected JSON object.
	Unparseable,
	/// The reply parsed but none of its picks survived validation.
	NoValidPicks,
}
impl ReasoningStatus {
	pub fn is_degraded(self) -> bool {
		matches!(self, Self::ServiceFailed | Self::Unparseable | Self::NoValidPicks)
	}
}

#[derive(Debug, Clone)]
pub struct Reasoned {
	pub ai_reasoning: String,
	/// Ranks are exactly `1..=picks.len()` and every id belongs to the input candidates.
	pub picks: Vec<RankedExplanation>,
	pub status: ReasoningStatus,
}

#[derive(Debug, Deserialize)]
struct ModelReply {
	#[serde(default)]
	reasoning: Option<String>,
	picks: Vec<ModelPick>,
}

/// Asks the reasoning model to pick and explain up to `top_n` candidates.
///
/// Malformed or fully hallucinated replies degrade to [`fallback`]. Only a failed call is an error,
/// and the caller is expected to degrade on it as well.
pub async fn rank_candidates(
	provider: &dyn ReasoningProvider,
	cfg: &LlmProviderConfig,
	query: &str,
	liked_titles: &[String],
	candidates: &[EnrichedCandidate],
	top_n: u32,
) -> Result<Reasoned> {
	if candidates.is_empty() {
		return Ok(Reasoned {
			ai_reasoning: NO_MATCHES_REASONING.to_string(),
			picks: Vec::new(),
			status: ReasoningStatus::NoCandidates,
		});
	}

	let messages = build_messages(query, liked_titles, candidates, top_n);
	let content =
		time::timeout(Duration::from_millis(cfg.timeout_ms), provider.complete(cfg, &messages))
			.await
			.map_err(|_| Error::ReasoningService {
				message: format!(
					"{}: Reasoning call exceeded {} ms.",
					cfg.provider_id, cfg.timeout_ms
				),
			})?
			.map_err(|err| Error::ReasoningService {
				message: format!("{}: {}", cfg.provider_id, err.message),
			})?;

	Ok(parse_reply(&content, candidates, top_n))
}

/// Validates the model reply against the candidate set.
pub fn parse_reply(content: &str, candidates: &[EnrichedCandidate], top_n: u32) -> Reasoned {
	let reply = reasoning::strip_to_json_object(content)
		.and_then(|json| serde_json::from_str::<ModelReply>(json).ok());
	let Some(reply) = reply else {
		tracing::warn!(chars = content.len(), "Reasoning reply is not valid JSON. Degrading.");

		return fallback(candidates, top_n, ReasoningStatus::Unparseable);
	};
	let known: HashSet<&str> = candidates.iter().map(|candidate| candidate.id.as_str()).collect();
	let selection = picks::select_picks(reply.picks, &known, top_n as usize);

	for (id, reason) in &selection.discarded {
		match reason {
			DiscardReason::UnknownId => {
				tracing::warn!(movie_id = %id, "Discarding pick outside the candidate set.")
			},
			DiscardReason::DuplicateId | DiscardReason::EmptyExplanation => {
				tracing::debug!(movie_id = %id, reason = ?reason, "Discarding invalid pick.")
			},
		}
	}

	if selection.ranked.is_empty() {
		tracing::warn!(
			discarded = selection.discarded.len(),
			"No valid picks in reasoning reply. Degrading."
		);

		return fallback(candidates, top_n, ReasoningStatus::NoValidPicks);
	}

	let reasoning = reply.reasoning.as_deref().unwrap_or_default().trim();

	Reasoned {
		ai_reasoning: if reasoning.is_empty() {
			DEGRADED_REASONING.to_string()
		} else {
			reasoning.to_string()
		},
		picks: selection.ranked,
		status: ReasoningStatus::Complete,
	}
}

/// Top `top_n` candidates by retrieval score with empty explanations.
pub fn fallback(
	candidates: &[EnrichedCandidate],
	top_n: u32,
	status: ReasoningStatus,
) -> Reasoned {
	let mut ordered: Vec<&EnrichedCandidate> = candidates.iter().collect();

	ordered.sort_by(|a, b| b.score.total_cmp(&a.score));

	let picks = ordered
		.into_iter()
		.take(top_n as usize)
		.enumerate()
		.map(|(index, candidate)| RankedExplanation {
			id: candidate.id.clone(),
			rank: index as u32 + 1,
			explanation: String::new(),
		})
		.collect();
	let ai_reasoning =
		if candidates.is_empty() { NO_MATCHES_REASONING } else { DEGRADED_REASONING };

	Reasoned { ai_reasoning: ai_reasoning.to_string(), picks, status }
}

/// Builds the chat messages. Retrieval scores are deliberately left out of the prompt.
pub fn build_messages(
	query: &str,
	liked_titles: &[String],
	candidates: &[EnrichedCandidate],
	top_n: u32,
) -> Vec<Value> {
	let schema = serde_json::json!({
		"reasoning": "string",
		"picks": [
			{ "id": "string", "rank": 1, "explanation": "string" }
		]
	});
	let system_prompt = "You are a film curator for a movie discovery service. \
Output must be valid JSON only and must match the provided schema exactly. \
Choose at most TOP_N movies from the candidate list that best match the viewer's request. \
Only use ids that appear in the candidate list. \
Rank picks from 1, best match first, without gaps or repeated ranks. \
Each explanation is one or two sentences on why the movie fits the request. \
The reasoning field is a short note addressed to the viewer about the selection as a whole.";
	let candidate_json: Vec<Value> = candidates
		.iter()
		.map(|candidate| {
			serde_json::json!({
				"id": candidate.id,
				"title": candidate.title,
				"overview": candidate.overview,
				"genre": candidate.genre,
				"release_date": candidate.release_date,
			})
		})
		.collect();
	let request = serde_json::json!({
		"query": query,
		"liked_titles": liked_titles,
		"candidates": candidate_json,
	});
	let user_prompt = format!(
		"Return JSON matching this exact schema:\n{schema}\nConstraints:\n- TOP_N = {top_n}\nHere is the request as JSON:\n{request}"
	);

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}
